//! Session message types.
//!
//! Input events and backend completions reach the session as [`Message`]s in
//! the Elm architecture style. The session answers with [`Effect`]s, which
//! the host carries out (network calls, scrolling, rendering) and whose
//! results come back as further messages.

use ballcurator_ui::{KeyCode, KeyModifiers, Point, Rectangle, Size};

use crate::annotation::CircleRecord;
use crate::remote::{ImageRequest, PersistResponse};

/// Messages that drive a [`CurationSession`](crate::session::CurationSession).
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    // Grid
    /// Scroll position or viewport size changed. `viewport` is the visible
    /// area in grid content coordinates.
    Scrolled { viewport: Rectangle },
    /// Pointer-down on a thumbnail, `position` relative to the thumbnail
    PointerPressed {
        index: usize,
        position: Point,
        modifiers: KeyModifiers,
    },
    /// Pointer-move while over a thumbnail
    PointerMoved {
        index: usize,
        position: Point,
        modifiers: KeyModifiers,
    },
    /// Pointer-up on a thumbnail
    PointerReleased {
        index: usize,
        position: Point,
        modifiers: KeyModifiers,
    },
    KeyPressed { key: KeyCode, modifiers: KeyModifiers },
    /// Flip the removal flag of a cell
    ToggleRemoved { index: usize },

    // Backend completions
    /// Persistence of edit `seq` on `index` finished
    PersistCompleted {
        index: usize,
        seq: u64,
        result: Result<PersistResponse, String>,
    },
    /// Removal toggle finished with the stored value
    RemovedToggled {
        index: usize,
        result: Result<bool, String>,
    },
    /// The full frame for a maximize request arrived
    FullImageLoaded { index: usize, size: Size },
    /// The full frame for a maximize request could not be fetched
    FullImageFailed { index: usize, error: String },

    // Inspector overlay
    /// Pointer-down inside the maximized overlay
    OverlayPressed,
    /// Pointer-up inside the maximized overlay
    OverlayReleased,
    /// Close the overlay
    Dismiss,
}

/// Work the host must carry out on behalf of the session.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Fetch (or re-fetch) the thumbnail of a mounted cell
    FetchThumbnail { index: usize, request: ImageRequest },
    /// The cell was unmounted; its thumbnail can be dropped
    ReleaseThumbnail { index: usize },
    /// Fetch the full frame for the inspector, answer with
    /// [`Message::FullImageLoaded`] or [`Message::FullImageFailed`]
    FetchFullImage { index: usize, request: ImageRequest },
    /// Persist the record, answer with [`Message::PersistCompleted`]
    Persist {
        index: usize,
        seq: u64,
        record: CircleRecord,
    },
    /// Toggle the stored removal flag, answer with
    /// [`Message::RemovedToggled`]
    ToggleRemoved { index: usize },
    /// Scroll the grid so that `index` is at the top
    ScrollTo { index: usize, offset: f32 },
    /// Show a short message to the operator
    Notice(String),
}
