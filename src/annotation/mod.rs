//! Circle annotation data model and the in-memory corpus.
//!
//! - [`CircleRecord`]: one circle as stored and persisted (geometry may be null)
//! - [`AnnotationIndexEntry`]: stable grid position -> (image, circle) key
//! - [`AnnotationStore`]: validated corpus with the flattened grid index

mod error;
mod record;
mod store;

pub use error::CorpusError;
pub use record::{AnnotationIndexEntry, Circle, CircleRecord, ImageId};
pub use store::{AnnotationStore, CorpusStats};
