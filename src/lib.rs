//! BallCurator - curation grid for circular ball-location annotations
//!
//! Each grid cell shows a square crop of a camera frame centred on one
//! annotated circle. Operators redraw circles by dragging a diameter, flag
//! entries as removed, and long-press a cell to inspect the full frame.
//! Edits are persisted to the image/annotation server and interactions are
//! reported as batched telemetry.
//!
//! The host drives a [`CurationSession`] with [`Message`]s and carries out the
//! [`Effect`]s it returns.

pub mod annotation;
pub mod config;
pub mod constants;
pub mod coords;
pub mod editor;
pub mod grid;
pub mod keybindings;
pub mod maximize;
pub mod message;
pub mod remote;
pub mod session;
pub mod telemetry;

pub use annotation::{AnnotationStore, Circle, CircleRecord, CorpusError};
pub use config::AppConfig;
pub use message::{Effect, Message};
pub use session::{CurationSession, execute};
