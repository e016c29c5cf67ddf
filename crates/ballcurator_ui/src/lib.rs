//! ballcurator_ui - host-agnostic UI primitives for the curation grid
//!
//! This crate holds the pieces of the interface that do not depend on a
//! particular windowing or browser backend: screen-space geometry, key
//! codes, viewport visibility tracking and cancelable transitions.

mod event;
mod layout;
mod transition;
mod visibility;

pub use event::{KeyCode, KeyModifiers};
pub use layout::{Point, Rectangle, Size};
pub use transition::{Easing, Keyframes, Transition};
pub use visibility::{ScrollObserver, VisibilityChange, VisibilityObserver};

