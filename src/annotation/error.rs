//! Error types for loading the annotation corpus.

use thiserror::Error;

/// Errors that can occur while building an [`AnnotationStore`](super::AnnotationStore).
///
/// Every variant is fatal: a grid built over a corpus whose index cannot be
/// resolved would address the wrong circles.
#[derive(Error, Debug)]
pub enum CorpusError {
    /// I/O error while reading a corpus document
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Index entry references an image that has no annotation list
    #[error("Index entry {position} references unknown image '{image}'")]
    UnknownImage {
        /// Position of the entry in the flattened index
        position: usize,
        /// The missing image identifier
        image: String,
    },

    /// Index entry references a circle past the end of the image's list
    #[error(
        "Index entry {position} references circle {circle_index} of image '{image}', which has {available} circles"
    )]
    CircleOutOfRange {
        /// Position of the entry in the flattened index
        position: usize,
        /// The image identifier
        image: String,
        /// The requested circle index
        circle_index: usize,
        /// Number of circles recorded for the image
        available: usize,
    },

    /// The same image appears with two different frame indices
    #[error(
        "Index entry {position} gives image '{image}' frame index {found}, but an earlier entry gave {expected}"
    )]
    ImageIndexMismatch {
        /// Position of the entry in the flattened index
        position: usize,
        /// The image identifier
        image: String,
        /// Frame index seen first
        expected: usize,
        /// Conflicting frame index
        found: usize,
    },
}
