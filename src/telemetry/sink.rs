//! Telemetry delivery targets.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use reqwest::blocking::Client;
use url::Url;

use super::event::{SessionId, TelemetryEvent};

/// Somewhere a batch of telemetry events can be handed off to.
///
/// Delivery is fire-and-forget: implementations must not block the caller on
/// network I/O and never report failures back.
pub trait TelemetrySink {
    fn deliver(&self, batch: Vec<TelemetryEvent>);
}

impl<T: TelemetrySink + ?Sized> TelemetrySink for Box<T> {
    fn deliver(&self, batch: Vec<TelemetryEvent>) {
        (**self).deliver(batch);
    }
}

/// Posts each batch as a JSON array to the backend's telemetry endpoint.
///
/// Batches are queued to one background thread and posted in order.
/// Dropping the sink delivers whatever is still queued, then stops the
/// thread.
#[derive(Debug)]
pub struct HttpTelemetrySink {
    url: Url,
    session: SessionId,
    sender: Option<Sender<Vec<TelemetryEvent>>>,
    worker: Option<JoinHandle<()>>,
}

impl HttpTelemetrySink {
    pub fn new(client: Client, url: Url, session: SessionId) -> Self {
        log::info!("Telemetry for session {} goes to {}", session, url);
        let (sender, receiver) = mpsc::channel::<Vec<TelemetryEvent>>();
        let target = url.clone();

        let spawned = thread::Builder::new()
            .name("telemetry".to_string())
            .spawn(move || Self::post_loop(&client, &target, receiver));

        let (sender, worker) = match spawned {
            Ok(handle) => (Some(sender), Some(handle)),
            Err(err) => {
                log::warn!("Could not start telemetry thread: {}; events will be dropped", err);
                (None, None)
            }
        };

        Self {
            url,
            session,
            sender,
            worker,
        }
    }

    pub fn session(&self) -> &SessionId {
        &self.session
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    fn post_loop(client: &Client, url: &Url, receiver: Receiver<Vec<TelemetryEvent>>) {
        for batch in receiver {
            let count = batch.len();
            match client.post(url.clone()).json(&batch).send() {
                Ok(resp) if resp.status().is_success() => {
                    log::trace!("Delivered {} telemetry events", count);
                }
                Ok(resp) => {
                    log::warn!("Telemetry endpoint answered {}", resp.status());
                }
                Err(err) => {
                    log::warn!("Failed to deliver {} telemetry events: {}", count, err);
                }
            }
        }
        log::debug!("Telemetry thread exiting");
    }
}

impl TelemetrySink for HttpTelemetrySink {
    fn deliver(&self, batch: Vec<TelemetryEvent>) {
        let Some(sender) = &self.sender else {
            log::debug!("No telemetry thread; dropping {} events", batch.len());
            return;
        };
        if let Err(err) = sender.send(batch) {
            log::warn!("Telemetry thread gone; dropping {} events", err.0.len());
        }
    }
}

impl Drop for HttpTelemetrySink {
    fn drop(&mut self) {
        drop(self.sender.take());
        if let Some(handle) = self.worker.take() {
            if let Err(e) = handle.join() {
                log::warn!("Telemetry thread panicked: {:?}", e);
            }
        }
    }
}

/// Collects delivered batches in memory. Clones share the same queue.
#[derive(Debug, Clone, Default)]
pub struct QueueSink {
    batches: Rc<RefCell<Vec<Vec<TelemetryEvent>>>>,
}

impl QueueSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of batches delivered and not yet drained.
    pub fn len(&self) -> usize {
        self.batches.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.borrow().is_empty()
    }

    /// Take every delivered batch, oldest first.
    pub fn drain(&self) -> Vec<Vec<TelemetryEvent>> {
        std::mem::take(&mut *self.batches.borrow_mut())
    }

    /// All delivered events flattened in delivery order, without draining.
    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.batches.borrow().iter().flatten().cloned().collect()
    }
}

impl TelemetrySink for QueueSink {
    fn deliver(&self, batch: Vec<TelemetryEvent>) {
        self.batches.borrow_mut().push(batch);
    }
}
