//! Telemetry event payloads and session identity.

use std::fmt;
use std::time::UNIX_EPOCH;

use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};
use web_time::{Instant, SystemTime};

use crate::annotation::ImageId;
use crate::constants::SESSION_ID_LENGTH;

/// Random identifier naming one curation session in the telemetry sink.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh random alphanumeric identifier.
    pub fn generate() -> Self {
        let id: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(SESSION_ID_LENGTH)
            .map(char::from)
            .collect();
        Self(id)
    }

    /// Use a caller-provided identifier.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Maps monotonic instants to wall-clock milliseconds since the Unix epoch.
///
/// Interaction code works with `Instant`s; events carry wall-clock
/// timestamps so that batches from different sessions can be correlated.
#[derive(Debug, Clone, Copy)]
pub struct SessionClock {
    origin: Instant,
    origin_epoch_ms: u64,
}

impl SessionClock {
    /// Anchor the clock at `now` using the current wall-clock time.
    pub fn start(now: Instant) -> Self {
        let origin_epoch_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self::with_origin(now, origin_epoch_ms)
    }

    /// Anchor the clock at `now` with an explicit epoch timestamp.
    pub fn with_origin(now: Instant, origin_epoch_ms: u64) -> Self {
        Self {
            origin: now,
            origin_epoch_ms,
        }
    }

    /// Epoch milliseconds corresponding to `instant`.
    pub fn epoch_ms(&self, instant: Instant) -> u64 {
        if instant >= self.origin {
            self.origin_epoch_ms + instant.duration_since(self.origin).as_millis() as u64
        } else {
            self.origin_epoch_ms
                .saturating_sub(self.origin.duration_since(instant).as_millis() as u64)
        }
    }
}

/// Type-specific part of a telemetry event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TelemetryKind {
    /// A grid cell entered or left the pre-fetch viewport.
    CellVisibility { visible: bool },
    /// A circle edit was committed.
    #[serde(rename_all = "camelCase")]
    SetCircle {
        press_time: u64,
        release_time: u64,
        /// "drawn", "cleared" or "grown"
        edit: String,
        center_x: Option<f32>,
        center_y: Option<f32>,
        radius: Option<f32>,
    },
    /// A cell was opened in the full-resolution inspector.
    Maximize,
    /// The inspector was closed back into the grid.
    Minimize,
    /// The removal flag of a circle was flipped.
    ToggleRemoved { removed: bool },
    /// The jump shortcut was used.
    #[serde(rename_all = "camelCase")]
    JumpToLast {
        target: String,
        found_index: Option<usize>,
    },
}

/// One recorded interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryEvent {
    /// Wall-clock milliseconds since the Unix epoch
    pub timestamp: u64,
    /// Grid position of the cell involved
    pub cell_id: Option<usize>,
    /// Image shown by that cell
    pub image: Option<ImageId>,
    #[serde(flatten)]
    pub kind: TelemetryKind,
}

impl TelemetryEvent {
    /// An event about one grid cell.
    pub fn for_cell(timestamp: u64, cell_id: usize, image: ImageId, kind: TelemetryKind) -> Self {
        Self {
            timestamp,
            cell_id: Some(cell_id),
            image: Some(image),
            kind,
        }
    }

    /// An event not tied to a cell.
    pub fn global(timestamp: u64, kind: TelemetryKind) -> Self {
        Self {
            timestamp,
            cell_id: None,
            image: None,
            kind,
        }
    }

    /// The serialized `type` tag, for logging.
    pub fn type_name(&self) -> &'static str {
        match self.kind {
            TelemetryKind::CellVisibility { .. } => "cellVisibility",
            TelemetryKind::SetCircle { .. } => "setCircle",
            TelemetryKind::Maximize => "maximize",
            TelemetryKind::Minimize => "minimize",
            TelemetryKind::ToggleRemoved { .. } => "toggleRemoved",
            TelemetryKind::JumpToLast { .. } => "jumpToLast",
        }
    }
}
