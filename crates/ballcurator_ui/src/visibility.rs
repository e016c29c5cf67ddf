//! Viewport visibility tracking.
//!
//! The curation grid only keeps rendering resources alive for cells near the
//! viewport. [`VisibilityObserver`] is the capability the grid depends on;
//! [`ScrollObserver`] implements it by diffing the observed slot rectangles
//! against the scroll viewport each time the host reports a scroll or resize.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::Rectangle;

/// A visibility transition for one observed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityChange<K> {
    pub key: K,
    pub visible: bool,
}

impl<K> VisibilityChange<K> {
    pub fn entered(key: K) -> Self {
        Self { key, visible: true }
    }

    pub fn exited(key: K) -> Self {
        Self {
            key,
            visible: false,
        }
    }
}

/// Observes items and reports when they enter or leave the (margin-extended)
/// viewport.
///
/// Implementations must report at most one transition per key per update,
/// and must report every exit of an update before any enter so that a host
/// can release resources before it allocates new ones.
pub trait VisibilityObserver<K> {
    /// Start observing `key`, laid out at `bounds` in content coordinates.
    fn observe(&mut self, key: K, bounds: Rectangle);

    /// Stop observing `key`. No exit transition is reported.
    fn unobserve(&mut self, key: K);

    /// Recompute visibility for a new viewport and return the transitions.
    fn update(&mut self, viewport: Rectangle) -> Vec<VisibilityChange<K>>;

    /// Whether `key` was inside the extended viewport at the last update.
    fn is_visible(&self, key: &K) -> bool;
}

/// Layout-aware observer driven by scroll/resize notifications.
#[derive(Debug, Clone)]
pub struct ScrollObserver<K> {
    /// Pre-fetch margin as a fraction of the viewport size on every side
    root_margin: f32,
    /// Observed items in observation order
    entries: Vec<(K, Rectangle)>,
    /// Position of each key in `entries`
    positions: HashMap<K, usize>,
    /// Keys currently inside the extended viewport
    visible: HashSet<K>,
}

impl<K: Copy + Eq + Hash> ScrollObserver<K> {
    /// Create an observer with the given pre-fetch margin
    /// (1.0 extends the viewport by its own width/height in each direction).
    pub fn new(root_margin: f32) -> Self {
        Self {
            root_margin: root_margin.max(0.0),
            entries: Vec::new(),
            positions: HashMap::new(),
            visible: HashSet::new(),
        }
    }

    pub fn root_margin(&self) -> f32 {
        self.root_margin
    }

    /// Number of observed items.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of items currently reported visible.
    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    /// The viewport extended by the pre-fetch margin.
    pub fn extended_viewport(&self, viewport: Rectangle) -> Rectangle {
        viewport.expand(
            viewport.width * self.root_margin,
            viewport.height * self.root_margin,
        )
    }
}

impl<K: Copy + Eq + Hash> VisibilityObserver<K> for ScrollObserver<K> {
    fn observe(&mut self, key: K, bounds: Rectangle) {
        if let Some(&position) = self.positions.get(&key) {
            self.entries[position].1 = bounds;
        } else {
            self.positions.insert(key, self.entries.len());
            self.entries.push((key, bounds));
        }
    }

    fn unobserve(&mut self, key: K) {
        if self.positions.remove(&key).is_none() {
            return;
        }
        self.entries.retain(|(k, _)| *k != key);
        self.positions = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, (k, _))| (*k, position))
            .collect();
        self.visible.remove(&key);
    }

    fn update(&mut self, viewport: Rectangle) -> Vec<VisibilityChange<K>> {
        let area = self.extended_viewport(viewport);

        let mut exits = Vec::new();
        let mut enters = Vec::new();
        for (key, bounds) in &self.entries {
            let inside = bounds.intersects(&area);
            let was_visible = self.visible.contains(key);
            if inside && !was_visible {
                enters.push(VisibilityChange::entered(*key));
            } else if !inside && was_visible {
                exits.push(VisibilityChange::exited(*key));
            }
        }

        for change in &exits {
            self.visible.remove(&change.key);
        }
        for change in &enters {
            self.visible.insert(change.key);
        }

        if !exits.is_empty() || !enters.is_empty() {
            log::trace!(
                "Visibility update: {} entered, {} exited, {} visible",
                enters.len(),
                exits.len(),
                self.visible.len()
            );
        }

        exits.extend(enters);
        exits
    }

    fn is_visible(&self, key: &K) -> bool {
        self.visible.contains(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A single column of 100x100 slots with no gap.
    fn column_observer(count: usize, margin: f32) -> ScrollObserver<usize> {
        let mut observer = ScrollObserver::new(margin);
        for i in 0..count {
            observer.observe(i, Rectangle::new(0.0, i as f32 * 100.0, 100.0, 100.0));
        }
        observer
    }

    #[test]
    fn test_initial_update_reports_enters_only() {
        let mut observer = column_observer(10, 0.0);
        let changes = observer.update(Rectangle::new(0.0, 0.0, 100.0, 250.0));
        assert!(changes.iter().all(|c| c.visible));
        let keys: Vec<usize> = changes.iter().map(|c| c.key).collect();
        assert_eq!(keys, vec![0, 1, 2]);
    }

    #[test]
    fn test_margin_prefetches_beyond_viewport() {
        let mut observer = column_observer(20, 1.0);
        // Viewport covers 500..700; a 100% margin extends it to 300..900.
        observer.update(Rectangle::new(0.0, 500.0, 100.0, 200.0));
        assert!(observer.is_visible(&3));
        assert!(observer.is_visible(&9));
        assert!(!observer.is_visible(&10));
        assert!(!observer.is_visible(&1));
    }

    #[test]
    fn test_exits_are_reported_before_enters() {
        let mut observer = column_observer(10, 0.0);
        observer.update(Rectangle::new(0.0, 0.0, 100.0, 150.0));
        let changes = observer.update(Rectangle::new(0.0, 550.0, 100.0, 140.0));
        let first_enter = changes.iter().position(|c| c.visible).unwrap();
        assert!(changes[..first_enter].iter().all(|c| !c.visible));
        assert!(changes[first_enter..].iter().all(|c| c.visible));
        assert_eq!(observer.visible_count(), 2);
    }

    #[test]
    fn test_no_changes_when_viewport_is_stable() {
        let mut observer = column_observer(5, 0.5);
        observer.update(Rectangle::new(0.0, 0.0, 100.0, 100.0));
        assert!(observer.update(Rectangle::new(0.0, 0.0, 100.0, 100.0)).is_empty());
    }

    #[test]
    fn test_unobserve_drops_visibility_silently() {
        let mut observer = column_observer(3, 0.0);
        observer.update(Rectangle::new(0.0, 0.0, 100.0, 300.0));
        observer.unobserve(1);
        assert!(!observer.is_visible(&1));
        assert_eq!(observer.len(), 2);
        let changes = observer.update(Rectangle::new(0.0, 1000.0, 100.0, 100.0));
        assert_eq!(changes.len(), 2);
    }
}
