//! Windowed telemetry batching.

use std::time::Duration;

use web_time::Instant;

use super::event::TelemetryEvent;
use super::sink::TelemetrySink;

/// Queue and in-flight window of a [`TelemetryBatcher`].
#[derive(Debug, Default)]
pub struct BatcherState {
    /// Events recorded while a window is open
    pub queue: Vec<TelemetryEvent>,
    /// End of the open accumulation window, if any
    pub window_closes_at: Option<Instant>,
}

impl BatcherState {
    pub fn in_flight(&self) -> bool {
        self.window_closes_at.is_some()
    }
}

/// Delivers the first event of a window immediately and everything recorded
/// during the window as a single batch once it closes.
///
/// Closing a window with a non-empty queue does not open a new one, so the
/// next recorded event is again sent on its own.
pub struct TelemetryBatcher<S: TelemetrySink> {
    state: BatcherState,
    window: Duration,
    enabled: bool,
    sink: S,
}

impl<S: TelemetrySink> TelemetryBatcher<S> {
    pub fn new(sink: S, window: Duration) -> Self {
        Self {
            state: BatcherState::default(),
            window,
            enabled: true,
            sink,
        }
    }

    /// Drop every recorded event without delivering it.
    pub fn disabled(sink: S) -> Self {
        Self {
            enabled: false,
            ..Self::new(sink, Duration::ZERO)
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn state(&self) -> &BatcherState {
        &self.state
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// When the host should next call [`poll`](Self::poll).
    pub fn next_deadline(&self) -> Option<Instant> {
        self.state.window_closes_at
    }

    pub fn record(&mut self, event: TelemetryEvent, now: Instant) {
        if !self.enabled {
            return;
        }
        // A window that has already elapsed is closed first so queued events
        // are delivered ahead of this one.
        self.poll(now);

        if self.state.in_flight() {
            log::trace!("Queueing telemetry event {}", event.type_name());
            self.state.queue.push(event);
        } else {
            log::trace!("Sending telemetry event {} immediately", event.type_name());
            self.sink.deliver(vec![event]);
            self.state.window_closes_at = Some(now + self.window);
        }
    }

    /// Close the accumulation window if it has elapsed.
    pub fn poll(&mut self, now: Instant) {
        let Some(closes_at) = self.state.window_closes_at else {
            return;
        };
        if now < closes_at {
            return;
        }
        self.state.window_closes_at = None;
        if !self.state.queue.is_empty() {
            let batch = std::mem::take(&mut self.state.queue);
            log::debug!("Flushing {} queued telemetry events", batch.len());
            self.sink.deliver(batch);
        }
    }

    /// Deliver anything still queued, regardless of the window.
    pub fn flush(&mut self) {
        self.state.window_closes_at = None;
        if !self.state.queue.is_empty() {
            let batch = std::mem::take(&mut self.state.queue);
            self.sink.deliver(batch);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::{QueueSink, TelemetryKind};

    const WINDOW: Duration = Duration::from_millis(1000);

    fn event(n: u64) -> TelemetryEvent {
        TelemetryEvent::for_cell(
            n,
            n as usize,
            format!("img{}", n),
            TelemetryKind::CellVisibility { visible: true },
        )
    }

    fn timestamps(batch: &[TelemetryEvent]) -> Vec<u64> {
        batch.iter().map(|e| e.timestamp).collect()
    }

    #[test]
    fn test_first_event_sent_alone_rest_batched() {
        let sink = QueueSink::new();
        let mut batcher = TelemetryBatcher::new(sink.clone(), WINDOW);
        let t0 = Instant::now();

        for n in 0..6 {
            batcher.record(event(n), t0 + Duration::from_millis(n * 100));
        }
        assert_eq!(sink.len(), 1);

        batcher.poll(t0 + WINDOW);
        let batches = sink.drain();
        assert_eq!(batches.len(), 2);
        assert_eq!(timestamps(&batches[0]), vec![0]);
        assert_eq!(timestamps(&batches[1]), vec![1, 2, 3, 4, 5]);
        assert!(!batcher.state().in_flight());
    }

    #[test]
    fn test_poll_before_window_does_nothing() {
        let sink = QueueSink::new();
        let mut batcher = TelemetryBatcher::new(sink.clone(), WINDOW);
        let t0 = Instant::now();
        batcher.record(event(0), t0);
        batcher.record(event(1), t0);
        batcher.poll(t0 + Duration::from_millis(999));
        assert_eq!(sink.len(), 1);
        assert_eq!(batcher.state().queue.len(), 1);
    }

    #[test]
    fn test_empty_window_closes_quietly() {
        let sink = QueueSink::new();
        let mut batcher = TelemetryBatcher::new(sink.clone(), WINDOW);
        let t0 = Instant::now();
        batcher.record(event(0), t0);
        batcher.poll(t0 + WINDOW);
        assert_eq!(sink.len(), 1);
        assert!(batcher.next_deadline().is_none());

        batcher.record(event(1), t0 + WINDOW * 2);
        let batches = sink.drain();
        assert_eq!(batches.len(), 2);
        assert_eq!(timestamps(&batches[1]), vec![1]);
    }

    #[test]
    fn test_flushed_batch_does_not_reopen_window() {
        let sink = QueueSink::new();
        let mut batcher = TelemetryBatcher::new(sink.clone(), WINDOW);
        let t0 = Instant::now();
        batcher.record(event(0), t0);
        batcher.record(event(1), t0);
        batcher.poll(t0 + WINDOW);
        assert!(!batcher.state().in_flight());

        // Next event goes out on its own straight away.
        batcher.record(event(2), t0 + WINDOW);
        let batches = sink.drain();
        assert_eq!(batches.len(), 3);
        assert_eq!(timestamps(&batches[2]), vec![2]);
    }

    #[test]
    fn test_record_after_elapsed_window_keeps_order() {
        let sink = QueueSink::new();
        let mut batcher = TelemetryBatcher::new(sink.clone(), WINDOW);
        let t0 = Instant::now();
        batcher.record(event(0), t0);
        batcher.record(event(1), t0);
        // No poll in between: the stale window is closed by `record`.
        batcher.record(event(2), t0 + WINDOW * 3);
        let batches = sink.drain();
        assert_eq!(
            batches.iter().map(|b| timestamps(b)).collect::<Vec<_>>(),
            vec![vec![0], vec![1], vec![2]]
        );
    }

    #[test]
    fn test_disabled_batcher_drops_events() {
        let sink = QueueSink::new();
        let mut batcher = TelemetryBatcher::disabled(sink.clone());
        batcher.record(event(0), Instant::now());
        assert!(sink.is_empty());
        assert!(!batcher.is_enabled());
    }

    #[test]
    fn test_flush_delivers_queue() {
        let sink = QueueSink::new();
        let mut batcher = TelemetryBatcher::new(sink.clone(), WINDOW);
        let t0 = Instant::now();
        batcher.record(event(0), t0);
        batcher.record(event(1), t0);
        batcher.flush();
        assert_eq!(sink.len(), 2);
        assert!(batcher.state().queue.is_empty());
    }
}
