//! In-memory annotation corpus.
//!
//! The corpus arrives as two JSON documents: a map from image identifier to
//! its ordered circle list, and the flattened index that fixes the grid's
//! iteration order. Both are validated once at load; afterwards grid position
//! `i` always resolves to the same `(image, circle_index)` pair.

use std::collections::HashMap;
use std::path::Path;

use super::error::CorpusError;
use super::record::{AnnotationIndexEntry, Circle, CircleRecord, ImageId};

/// Summary counts over the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CorpusStats {
    /// Number of grid entries
    pub entries: usize,
    /// Number of distinct images
    pub images: usize,
    /// Entries flagged as removed
    pub removed: usize,
    /// Entries with null geometry
    pub cleared: usize,
}

/// Image id -> circle list, plus the flattened grid index.
#[derive(Debug, Clone, Default)]
pub struct AnnotationStore {
    /// Circle records per image, in the order they were loaded
    images: HashMap<ImageId, Vec<CircleRecord>>,
    /// Flattened index; position in this list is the grid position
    entries: Vec<AnnotationIndexEntry>,
    /// Last non-null geometry seen for each grid position
    last_good: HashMap<usize, Circle>,
}

impl AnnotationStore {
    /// Build a store, rejecting any index entry that cannot be resolved.
    pub fn new(
        images: HashMap<ImageId, Vec<CircleRecord>>,
        entries: Vec<AnnotationIndexEntry>,
    ) -> Result<Self, CorpusError> {
        let mut frame_indices: HashMap<&str, usize> = HashMap::new();

        for (position, entry) in entries.iter().enumerate() {
            let Some(circles) = images.get(&entry.image) else {
                return Err(CorpusError::UnknownImage {
                    position,
                    image: entry.image.clone(),
                });
            };

            if entry.circle_index >= circles.len() {
                return Err(CorpusError::CircleOutOfRange {
                    position,
                    image: entry.image.clone(),
                    circle_index: entry.circle_index,
                    available: circles.len(),
                });
            }

            match frame_indices.get(entry.image.as_str()) {
                Some(&expected) if expected != entry.image_index => {
                    return Err(CorpusError::ImageIndexMismatch {
                        position,
                        image: entry.image.clone(),
                        expected,
                        found: entry.image_index,
                    });
                }
                Some(_) => {}
                None => {
                    frame_indices.insert(entry.image.as_str(), entry.image_index);
                }
            }
        }

        let last_good = entries
            .iter()
            .enumerate()
            .filter_map(|(position, entry)| {
                images
                    .get(&entry.image)
                    .and_then(|circles| circles.get(entry.circle_index))
                    .and_then(CircleRecord::circle)
                    .map(|circle| (position, circle))
            })
            .collect();

        log::info!(
            "Loaded annotation corpus: {} images, {} grid entries",
            images.len(),
            entries.len()
        );

        Ok(Self {
            images,
            entries,
            last_good,
        })
    }

    /// Parse both corpus documents from JSON text.
    pub fn from_json(annotations_json: &str, index_json: &str) -> Result<Self, CorpusError> {
        let images: HashMap<ImageId, Vec<CircleRecord>> = serde_json::from_str(annotations_json)?;
        let entries: Vec<AnnotationIndexEntry> = serde_json::from_str(index_json)?;
        Self::new(images, entries)
    }

    /// Read and parse both corpus documents from disk.
    pub fn load(annotations_path: &Path, index_path: &Path) -> Result<Self, CorpusError> {
        log::debug!(
            "Reading corpus from {:?} and {:?}",
            annotations_path,
            index_path
        );
        let annotations_json = std::fs::read_to_string(annotations_path)?;
        let index_json = std::fs::read_to_string(index_path)?;
        Self::from_json(&annotations_json, &index_json)
    }

    /// Number of grid entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The addressing key at grid position `index`.
    pub fn entry(&self, index: usize) -> Option<&AnnotationIndexEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[AnnotationIndexEntry] {
        &self.entries
    }

    /// The record addressed by grid position `index`.
    pub fn record(&self, index: usize) -> Option<&CircleRecord> {
        let entry = self.entries.get(index)?;
        self.images.get(&entry.image)?.get(entry.circle_index)
    }

    fn record_mut(&mut self, index: usize) -> Option<&mut CircleRecord> {
        let entry = self.entries.get(index)?;
        self.images.get_mut(&entry.image)?.get_mut(entry.circle_index)
    }

    /// Current geometry at `index`, `None` when cleared.
    pub fn circle(&self, index: usize) -> Option<Circle> {
        self.record(index).and_then(CircleRecord::circle)
    }

    /// Geometry to render at `index`: the current circle, or the last
    /// non-null circle when the current one has been cleared.
    pub fn display_circle(&self, index: usize) -> Option<Circle> {
        self.circle(index)
            .or_else(|| self.last_good.get(&index).copied())
    }

    /// Replace the record at `index`. Returns false for an unknown index.
    pub fn set_record(&mut self, index: usize, record: CircleRecord) -> bool {
        let Some(slot) = self.record_mut(index) else {
            log::warn!("Ignoring update for unknown grid index {}", index);
            return false;
        };
        let circle = record.circle();
        *slot = record;
        if let Some(circle) = circle {
            self.last_good.insert(index, circle);
        }
        true
    }

    /// Set the removal flag at `index`. Returns false for an unknown index.
    pub fn set_removed(&mut self, index: usize, removed: bool) -> bool {
        let Some(slot) = self.record_mut(index) else {
            log::warn!("Ignoring removal flag for unknown grid index {}", index);
            return false;
        };
        slot.removed = Some(removed);
        true
    }

    /// Flip the removal flag at `index` and return the new value.
    pub fn toggle_removed(&mut self, index: usize) -> Option<bool> {
        let slot = self.record_mut(index)?;
        let removed = !slot.is_removed();
        slot.removed = Some(removed);
        Some(removed)
    }

    /// Highest grid position whose record satisfies `predicate`.
    pub fn last_matching<F>(&self, predicate: F) -> Option<usize>
    where
        F: Fn(&CircleRecord) -> bool,
    {
        (0..self.entries.len())
            .rev()
            .find(|&index| self.record(index).is_some_and(&predicate))
    }

    /// Count entries, images, removed and cleared records.
    pub fn stats(&self) -> CorpusStats {
        let mut stats = CorpusStats {
            entries: self.entries.len(),
            images: self.images.len(),
            ..Default::default()
        };
        for index in 0..self.entries.len() {
            if let Some(record) = self.record(index) {
                if record.is_removed() {
                    stats.removed += 1;
                }
                if record.is_cleared() {
                    stats.cleared += 1;
                }
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANNOTATIONS: &str = r#"{
        "cam1_0001": [{"centerX": 100.0, "centerY": 100.0, "radius": 20.0}],
        "cam1_0002": [
            {"centerX": 10.0, "centerY": 20.0, "radius": 5.0},
            {"centerX": null, "centerY": null, "radius": null, "removed": true}
        ]
    }"#;

    const INDEX: &str = r#"[
        {"image": "cam1_0001", "imageIndex": 0, "circleIndex": 0},
        {"image": "cam1_0002", "imageIndex": 1, "circleIndex": 0},
        {"image": "cam1_0002", "imageIndex": 1, "circleIndex": 1}
    ]"#;

    fn store() -> AnnotationStore {
        AnnotationStore::from_json(ANNOTATIONS, INDEX).unwrap()
    }

    #[test]
    fn test_index_addresses_circles() {
        let store = store();
        assert_eq!(store.len(), 3);
        assert_eq!(store.circle(0), Some(Circle::new(100.0, 100.0, 20.0)));
        assert_eq!(store.circle(1), Some(Circle::new(10.0, 20.0, 5.0)));
        assert_eq!(store.circle(2), None);
        assert!(store.record(3).is_none());
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().expect("temp dir");
        let annotations = dir.path().join("annotations.json");
        let index = dir.path().join("index.json");
        std::fs::write(&annotations, ANNOTATIONS).expect("write annotations");
        std::fs::write(&index, INDEX).expect("write index");

        let loaded = AnnotationStore::load(&annotations, &index).expect("load corpus");
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.entry(2).map(|e| e.image.as_str()), Some("cam1_0002"));
        assert_eq!(loaded.circle(0), store().circle(0));
        assert!(loaded.record(2).is_some_and(CircleRecord::is_removed));
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let dir = tempfile::tempdir().expect("temp dir");
        let index = dir.path().join("index.json");
        std::fs::write(&index, INDEX).expect("write index");

        let err = AnnotationStore::load(&dir.path().join("absent.json"), &index).unwrap_err();
        assert!(matches!(err, CorpusError::Io(_)));
    }

    #[test]
    fn test_unknown_image_is_fatal() {
        let index = r#"[{"image": "missing", "imageIndex": 0, "circleIndex": 0}]"#;
        let err = AnnotationStore::from_json(ANNOTATIONS, index).unwrap_err();
        assert!(matches!(err, CorpusError::UnknownImage { position: 0, .. }));
    }

    #[test]
    fn test_circle_out_of_range_is_fatal() {
        let index = r#"[
            {"image": "cam1_0001", "imageIndex": 0, "circleIndex": 0},
            {"image": "cam1_0001", "imageIndex": 0, "circleIndex": 3}
        ]"#;
        let err = AnnotationStore::from_json(ANNOTATIONS, index).unwrap_err();
        assert!(matches!(
            err,
            CorpusError::CircleOutOfRange {
                position: 1,
                circle_index: 3,
                available: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_conflicting_frame_index_is_fatal() {
        let index = r#"[
            {"image": "cam1_0002", "imageIndex": 1, "circleIndex": 0},
            {"image": "cam1_0002", "imageIndex": 7, "circleIndex": 1}
        ]"#;
        let err = AnnotationStore::from_json(ANNOTATIONS, index).unwrap_err();
        assert!(matches!(err, CorpusError::ImageIndexMismatch { expected: 1, found: 7, .. }));
    }

    #[test]
    fn test_malformed_json_is_fatal() {
        assert!(matches!(
            AnnotationStore::from_json("{", INDEX),
            Err(CorpusError::Json(_))
        ));
    }

    #[test]
    fn test_cleared_circle_keeps_last_good_geometry() {
        let mut store = store();
        assert!(store.set_record(0, CircleRecord::cleared(None)));
        assert_eq!(store.circle(0), None);
        assert_eq!(store.display_circle(0), Some(Circle::new(100.0, 100.0, 20.0)));

        store.set_record(0, CircleRecord::from_circle(Circle::new(1.0, 2.0, 3.0), None));
        assert_eq!(store.display_circle(0), Some(Circle::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn test_update_unknown_index_is_ignored() {
        let mut store = store();
        assert!(!store.set_record(99, CircleRecord::default()));
        assert!(!store.set_removed(99, true));
        assert_eq!(store.toggle_removed(99), None);
    }

    #[test]
    fn test_toggle_and_last_matching() {
        let mut store = store();
        assert_eq!(store.last_matching(CircleRecord::is_removed), Some(2));
        assert_eq!(store.toggle_removed(2), Some(false));
        assert_eq!(store.last_matching(CircleRecord::is_removed), None);
        assert_eq!(store.toggle_removed(0), Some(true));
        assert_eq!(store.last_matching(CircleRecord::is_removed), Some(0));
    }

    #[test]
    fn test_stats() {
        let stats = store().stats();
        assert_eq!(
            stats,
            CorpusStats {
                entries: 3,
                images: 2,
                removed: 1,
                cleared: 1,
            }
        );
    }
}
