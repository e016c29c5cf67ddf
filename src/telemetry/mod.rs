//! Interaction telemetry.
//!
//! Every gesture in the curation grid is recorded as a [`TelemetryEvent`] and
//! handed to the [`TelemetryBatcher`], which delivers the first event of an
//! accumulation window immediately and the rest as one batch when the window
//! closes. Delivery is fire-and-forget.

mod batcher;
mod event;
mod sink;

pub use batcher::{BatcherState, TelemetryBatcher};
pub use event::{SessionClock, SessionId, TelemetryEvent, TelemetryKind};
pub use sink::{HttpTelemetrySink, QueueSink, TelemetrySink};
