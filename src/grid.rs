//! Virtualized annotation grid.
//!
//! Every grid position is laid out and observed up front, but per-cell state
//! (an editor or marker overlay, and a thumbnail request) only exists while
//! the cell is inside the pre-fetch viewport. Leaving the viewport tears the
//! cell down completely; coming back rebuilds it from the store, so geometry
//! is identical across remounts.

use std::collections::HashMap;

use ballcurator_ui::{Point, Rectangle, VisibilityObserver};

use crate::annotation::{AnnotationStore, Circle};
use crate::coords::CropTransform;
use crate::editor::{CircleEditor, EditorSettings};
use crate::remote::ImageRequest;

/// Fixed-column grid geometry in content coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub columns: usize,
    pub cell_size: f32,
    pub gap: f32,
}

impl GridLayout {
    pub fn new(columns: usize, cell_size: f32, gap: f32) -> Self {
        Self {
            columns: columns.max(1),
            cell_size,
            gap,
        }
    }

    fn pitch(&self) -> f32 {
        self.cell_size + self.gap
    }

    /// Bounds of the slot at grid position `index`.
    pub fn slot_bounds(&self, index: usize) -> Rectangle {
        let column = index % self.columns;
        let row = index / self.columns;
        Rectangle::new(
            column as f32 * self.pitch(),
            row as f32 * self.pitch(),
            self.cell_size,
            self.cell_size,
        )
    }

    /// Total height of a grid with `count` slots.
    pub fn content_height(&self, count: usize) -> f32 {
        if count == 0 {
            return 0.0;
        }
        let rows = count.div_ceil(self.columns);
        rows as f32 * self.pitch() - self.gap
    }

    /// Grid position under `point`, ignoring gaps and positions past `count`.
    pub fn slot_at(&self, point: Point, count: usize) -> Option<usize> {
        if point.x < 0.0 || point.y < 0.0 {
            return None;
        }
        let column = (point.x / self.pitch()) as usize;
        let row = (point.y / self.pitch()) as usize;
        if column >= self.columns {
            return None;
        }
        let index = row * self.columns + column;
        (index < count && self.slot_bounds(index).contains(point)).then_some(index)
    }

    /// Scroll offset that brings `index` to the top of the viewport.
    pub fn scroll_offset_for(&self, index: usize) -> f32 {
        self.slot_bounds(index).y
    }
}

/// Whether mounted cells accept edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridMode {
    #[default]
    Editable,
    /// Cells show a static marker and ignore pointer input
    ReadOnly,
}

/// Static circle marker for read-only viewers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerOverlay {
    transform: CropTransform,
}

impl MarkerOverlay {
    pub fn new(transform: CropTransform) -> Self {
        Self { transform }
    }

    /// Screen-space center and radius of `circle` in a thumbnail cropped
    /// around `view`.
    pub fn marker(&self, circle: Option<Circle>, view: &Circle) -> Option<(Point, f32)> {
        circle.map(|c| self.transform.circle_to_screen(&c, view))
    }
}

/// Interactive part of a mounted cell.
#[derive(Debug, Clone)]
pub enum CellContent {
    Editor(CircleEditor),
    Viewer(MarkerOverlay),
}

/// A cell that is currently inside the pre-fetch viewport.
#[derive(Debug, Clone)]
pub struct GridCell {
    /// Grid position
    pub index: usize,
    pub content: CellContent,
    /// Circle the thumbnail is cropped around. `None` when the record has
    /// never had geometry; such cells show the whole frame.
    pub view: Option<Circle>,
    /// Image request backing the thumbnail
    pub thumbnail: ImageRequest,
}

impl GridCell {
    pub fn editor(&self) -> Option<&CircleEditor> {
        match &self.content {
            CellContent::Editor(editor) => Some(editor),
            CellContent::Viewer(_) => None,
        }
    }

    pub fn editor_mut(&mut self) -> Option<&mut CircleEditor> {
        match &mut self.content {
            CellContent::Editor(editor) => Some(editor),
            CellContent::Viewer(_) => None,
        }
    }

    /// Screen-space marker to draw, given the committed geometry.
    pub fn overlay_marker(&self, committed: Option<Circle>) -> Option<(Point, f32)> {
        let view = self.view?;
        match &self.content {
            CellContent::Editor(editor) => {
                let circle = editor.overlay(committed)?;
                Some(editor.settings().transform.circle_to_screen(&circle, &view))
            }
            CellContent::Viewer(overlay) => overlay.marker(committed, &view),
        }
    }
}

/// Mount/unmount notification produced by a viewport change.
#[derive(Debug, Clone, PartialEq)]
pub enum GridEvent {
    Mounted { index: usize, request: ImageRequest },
    Unmounted { index: usize },
}

/// Grid over the whole corpus that keeps state only for visible cells.
pub struct VirtualizedGrid<O: VisibilityObserver<usize>> {
    layout: GridLayout,
    mode: GridMode,
    settings: EditorSettings,
    observer: O,
    cells: HashMap<usize, GridCell>,
    /// Latest edit sequence number per grid position
    edit_seqs: Vec<u64>,
}

impl<O: VisibilityObserver<usize>> VirtualizedGrid<O> {
    /// Lay out and observe one slot per store entry. Nothing is mounted until
    /// the first viewport update.
    pub fn build(
        store: &AnnotationStore,
        layout: GridLayout,
        mode: GridMode,
        settings: EditorSettings,
        mut observer: O,
    ) -> Self {
        for index in 0..store.len() {
            observer.observe(index, layout.slot_bounds(index));
        }
        log::debug!(
            "Grid observes {} slots in {} columns",
            store.len(),
            layout.columns
        );
        Self {
            layout,
            mode,
            settings,
            observer,
            cells: HashMap::new(),
            edit_seqs: vec![0; store.len()],
        }
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    pub fn mode(&self) -> GridMode {
        self.mode
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.edit_seqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edit_seqs.is_empty()
    }

    pub fn content_height(&self) -> f32 {
        self.layout.content_height(self.len())
    }

    /// Apply a scroll or resize. Unmounts are returned before mounts.
    pub fn on_viewport(&mut self, viewport: Rectangle, store: &AnnotationStore) -> Vec<GridEvent> {
        let changes = self.observer.update(viewport);
        let mut events = Vec::with_capacity(changes.len());

        for change in changes {
            if change.visible {
                if let Some(request) = self.mount(change.key, store) {
                    events.push(GridEvent::Mounted {
                        index: change.key,
                        request,
                    });
                }
            } else if self.unmount(change.key) {
                events.push(GridEvent::Unmounted { index: change.key });
            }
        }

        events
    }

    fn mount(&mut self, index: usize, store: &AnnotationStore) -> Option<ImageRequest> {
        let Some(entry) = store.entry(index) else {
            log::warn!("Visibility reported for unknown grid index {}", index);
            return None;
        };

        let view = store.display_circle(index);
        let thumbnail = match &view {
            Some(circle) => ImageRequest::cropped(entry.image_index, circle, &self.settings.transform),
            None => ImageRequest::full(entry.image_index),
        };
        let content = match self.mode {
            GridMode::Editable => CellContent::Editor(CircleEditor::new(self.settings)),
            GridMode::ReadOnly => CellContent::Viewer(MarkerOverlay::new(self.settings.transform)),
        };

        log::trace!("Mounting cell {} ({})", index, entry.image);
        self.cells.insert(
            index,
            GridCell {
                index,
                content,
                view,
                thumbnail,
            },
        );
        Some(thumbnail)
    }

    fn unmount(&mut self, index: usize) -> bool {
        let removed = self.cells.remove(&index);
        if let Some(cell) = &removed {
            if cell.editor().is_some_and(CircleEditor::is_dragging) {
                log::debug!("Cell {} unmounted mid-drag; gesture dropped", index);
            }
            log::trace!("Unmounted cell {}", index);
        }
        removed.is_some()
    }

    /// Recompute the crop of a mounted cell after its record changed.
    /// Returns the new thumbnail request, or `None` if the cell is not
    /// mounted.
    pub fn refresh(&mut self, index: usize, store: &AnnotationStore) -> Option<ImageRequest> {
        let entry = store.entry(index)?;
        let transform = self.settings.transform;
        let cell = self.cells.get_mut(&index)?;
        cell.view = store.display_circle(index);
        cell.thumbnail = match &cell.view {
            Some(circle) => ImageRequest::cropped(entry.image_index, circle, &transform),
            None => ImageRequest::full(entry.image_index),
        };
        Some(cell.thumbnail)
    }

    pub fn cell(&self, index: usize) -> Option<&GridCell> {
        self.cells.get(&index)
    }

    pub fn cell_mut(&mut self, index: usize) -> Option<&mut GridCell> {
        self.cells.get_mut(&index)
    }

    pub fn is_mounted(&self, index: usize) -> bool {
        self.cells.contains_key(&index)
    }

    pub fn mounted_count(&self) -> usize {
        self.cells.len()
    }

    /// Mounted grid positions in ascending order.
    pub fn mounted_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self.cells.keys().copied().collect();
        indices.sort_unstable();
        indices
    }

    /// Screen rectangle of slot `index` for a viewport scrolled to
    /// `viewport`.
    pub fn slot_on_screen(&self, index: usize, viewport: &Rectangle) -> Rectangle {
        self.layout
            .slot_bounds(index)
            .translate(-viewport.x, -viewport.y)
    }

    /// Allocate the next edit sequence number for `index`.
    pub fn next_edit_seq(&mut self, index: usize) -> Option<u64> {
        let seq = self.edit_seqs.get_mut(index)?;
        *seq += 1;
        Some(*seq)
    }

    /// Whether `seq` is still the latest edit issued for `index`.
    pub fn is_current_edit(&self, index: usize, seq: u64) -> bool {
        self.edit_seqs.get(index) == Some(&seq)
    }
}

#[cfg(test)]
mod tests {
    use ballcurator_ui::ScrollObserver;

    use super::*;
    use crate::annotation::CircleRecord;

    fn store_with(count: usize) -> AnnotationStore {
        let annotations: Vec<String> = (0..count)
            .map(|i| {
                format!(
                    r#""img{}": [{{"centerX": {}, "centerY": 100.0, "radius": 20.0}}]"#,
                    i,
                    100 + i
                )
            })
            .collect();
        let index: Vec<String> = (0..count)
            .map(|i| format!(r#"{{"image": "img{}", "imageIndex": {}, "circleIndex": 0}}"#, i, i))
            .collect();
        AnnotationStore::from_json(
            &format!("{{{}}}", annotations.join(",")),
            &format!("[{}]", index.join(",")),
        )
        .unwrap()
    }

    fn settings() -> EditorSettings {
        EditorSettings::new(CropTransform::new(2.0, 100.0))
    }

    fn grid(store: &AnnotationStore, mode: GridMode) -> VirtualizedGrid<ScrollObserver<usize>> {
        VirtualizedGrid::build(
            store,
            GridLayout::new(2, 100.0, 0.0),
            mode,
            settings(),
            ScrollObserver::new(0.0),
        )
    }

    // First row only; touching the second row's top edge would count.
    const FIRST_ROW: Rectangle = Rectangle {
        x: 0.0,
        y: 0.0,
        width: 200.0,
        height: 99.0,
    };

    #[test]
    fn test_layout_slot_bounds() {
        let layout = GridLayout::new(3, 100.0, 10.0);
        assert_eq!(layout.slot_bounds(0), Rectangle::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(layout.slot_bounds(4), Rectangle::new(110.0, 110.0, 100.0, 100.0));
        assert_eq!(layout.content_height(7), 320.0);
        assert_eq!(layout.content_height(0), 0.0);
    }

    #[test]
    fn test_layout_slot_at() {
        let layout = GridLayout::new(3, 100.0, 10.0);
        assert_eq!(layout.slot_at(Point::new(150.0, 150.0), 10), Some(4));
        // gap
        assert_eq!(layout.slot_at(Point::new(105.0, 50.0), 10), None);
        // past the last slot
        assert_eq!(layout.slot_at(Point::new(50.0, 350.0), 7), None);
    }

    #[test]
    fn test_nothing_mounted_before_first_viewport() {
        let store = store_with(6);
        let grid = grid(&store, GridMode::Editable);
        assert_eq!(grid.len(), 6);
        assert_eq!(grid.mounted_count(), 0);
    }

    #[test]
    fn test_viewport_mounts_visible_cells() {
        let store = store_with(6);
        let mut grid = grid(&store, GridMode::Editable);
        let events = grid.on_viewport(FIRST_ROW, &store);

        assert_eq!(events.len(), 2);
        assert_eq!(grid.mounted_indices(), vec![0, 1]);
        match &events[1] {
            GridEvent::Mounted { index, request } => {
                assert_eq!(*index, 1);
                assert_eq!(request.image_index, 1);
                let crop = request.crop.unwrap();
                assert_eq!(crop.center_x, 101.0);
                assert_eq!(crop.width, 100);
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert!(grid.cell(0).unwrap().editor().is_some());
    }

    #[test]
    fn test_scrolling_unmounts_before_mounting() {
        let store = store_with(6);
        let mut grid = grid(&store, GridMode::Editable);
        grid.on_viewport(FIRST_ROW, &store);

        let events = grid.on_viewport(FIRST_ROW.translate(0.0, 201.0), &store);
        assert_eq!(
            events,
            vec![
                GridEvent::Unmounted { index: 0 },
                GridEvent::Unmounted { index: 1 },
                GridEvent::Mounted {
                    index: 4,
                    request: grid.cell(4).unwrap().thumbnail
                },
                GridEvent::Mounted {
                    index: 5,
                    request: grid.cell(5).unwrap().thumbnail
                },
            ]
        );
        assert!(grid.cell(0).is_none());
    }

    #[test]
    fn test_remount_reproduces_geometry() {
        let store = store_with(4);
        let mut grid = grid(&store, GridMode::Editable);
        grid.on_viewport(FIRST_ROW, &store);
        let before = grid.cell(0).unwrap().thumbnail;
        let view_before = grid.cell(0).unwrap().view;

        grid.on_viewport(FIRST_ROW.translate(0.0, 1000.0), &store);
        assert!(!grid.is_mounted(0));
        grid.on_viewport(FIRST_ROW, &store);

        assert_eq!(grid.cell(0).unwrap().thumbnail, before);
        assert_eq!(grid.cell(0).unwrap().view, view_before);
    }

    #[test]
    fn test_unmount_drops_drag_state() {
        let store = store_with(2);
        let mut grid = grid(&store, GridMode::Editable);
        grid.on_viewport(FIRST_ROW, &store);
        let view = grid.cell(0).unwrap().view.unwrap();
        grid.cell_mut(0)
            .unwrap()
            .editor_mut()
            .unwrap()
            .press(Point::new(10.0, 10.0), Default::default(), view, web_time::Instant::now());

        grid.on_viewport(FIRST_ROW.translate(0.0, 1000.0), &store);
        grid.on_viewport(FIRST_ROW, &store);
        assert!(!grid.cell(0).unwrap().editor().unwrap().is_dragging());
    }

    #[test]
    fn test_read_only_mode_mounts_markers() {
        let store = store_with(2);
        let mut grid = grid(&store, GridMode::ReadOnly);
        grid.on_viewport(FIRST_ROW, &store);
        let cell = grid.cell(0).unwrap();
        assert!(cell.editor().is_none());
        let (center, radius) = cell.overlay_marker(store.circle(0)).unwrap();
        assert!((center.x - 50.0).abs() < 0.001);
        assert!((radius - 25.0).abs() < 0.001);
    }

    #[test]
    fn test_cleared_cell_crops_around_last_good() {
        let mut store = store_with(2);
        store.set_record(0, CircleRecord::cleared(None));
        let mut grid = grid(&store, GridMode::Editable);
        grid.on_viewport(FIRST_ROW, &store);
        let crop = grid.cell(0).unwrap().thumbnail.crop.unwrap();
        assert_eq!(crop.center_x, 100.0);
        assert_eq!(crop.radius, 20.0);
    }

    #[test]
    fn test_refresh_follows_store() {
        let mut store = store_with(2);
        let mut grid = grid(&store, GridMode::Editable);
        grid.on_viewport(FIRST_ROW, &store);
        store.set_record(1, CircleRecord::from_circle(Circle::new(5.0, 6.0, 7.0), None));

        let request = grid.refresh(1, &store).unwrap();
        assert_eq!(request.crop.unwrap().center_x, 5.0);
        assert_eq!(grid.cell(1).unwrap().view, Some(Circle::new(5.0, 6.0, 7.0)));
        assert!(grid.refresh(1, &store_with(0)).is_none());
    }

    #[test]
    fn test_edit_sequence_numbers() {
        let store = store_with(2);
        let mut grid = grid(&store, GridMode::Editable);
        let first = grid.next_edit_seq(0).unwrap();
        let second = grid.next_edit_seq(0).unwrap();
        assert!(second > first);
        assert!(!grid.is_current_edit(0, first));
        assert!(grid.is_current_edit(0, second));
        assert_eq!(grid.next_edit_seq(9), None);
    }
}
