//! The curation session: one logical thread of control over the store, the
//! grid, the inspector overlay and telemetry.
//!
//! The host feeds input events and backend completions in as [`Message`]s,
//! calls [`CurationSession::tick`] from its timer, and carries out the
//! returned [`Effect`]s. Nothing inside the session blocks or runs
//! concurrently; network I/O happens in the host (see [`execute`]).

use ballcurator_ui::{KeyModifiers, Point, Rectangle, ScrollObserver, VisibilityObserver};
use web_time::Instant;

use crate::annotation::{AnnotationStore, CircleRecord};
use crate::config::AppConfig;
use crate::editor::CommittedEdit;
use crate::grid::{GridCell, GridEvent, GridMode, VirtualizedGrid};
use crate::keybindings::{JumpTarget, KeyAction, KeyBindings};
use crate::maximize::{MaximizeController, MaximizeEvent, OverlayFrame};
use crate::message::{Effect, Message};
use crate::remote::{AnnotationBackend, ImageRequest, PersistResponse, decode_dimensions};
use crate::telemetry::{SessionClock, TelemetryBatcher, TelemetryEvent, TelemetryKind, TelemetrySink};

/// Dispatcher wiring the curation components together.
pub struct CurationSession<O: VisibilityObserver<usize>, S: TelemetrySink> {
    store: AnnotationStore,
    grid: VirtualizedGrid<O>,
    maximize: MaximizeController,
    telemetry: TelemetryBatcher<S>,
    clock: SessionClock,
    keybindings: KeyBindings,
    /// Cell that received the current pointer-down
    pressed: Option<usize>,
    /// Last viewport in grid content coordinates
    viewport: Rectangle,
}

impl<S: TelemetrySink> CurationSession<ScrollObserver<usize>, S> {
    /// Session over a scroll-driven grid using the configured pre-fetch
    /// margin.
    pub fn scrolling(store: AnnotationStore, config: &AppConfig, sink: S, now: Instant) -> Self {
        let observer = ScrollObserver::new(config.grid.prefetch_margin);
        Self::new(store, config, observer, sink, now)
    }
}

impl<O: VisibilityObserver<usize>, S: TelemetrySink> CurationSession<O, S> {
    pub fn new(store: AnnotationStore, config: &AppConfig, observer: O, sink: S, now: Instant) -> Self {
        let grid = VirtualizedGrid::build(
            &store,
            config.grid.layout(config.editor.render_size),
            config.grid.mode(),
            config.editor.settings(),
            observer,
        );
        let telemetry = if config.telemetry.enabled {
            TelemetryBatcher::new(sink, config.telemetry.flush_window())
        } else {
            log::info!("Telemetry disabled");
            TelemetryBatcher::disabled(sink)
        };
        let empty = Rectangle::new(0.0, 0.0, 0.0, 0.0);

        Self {
            store,
            grid,
            maximize: MaximizeController::new(config.maximize.settings(), empty),
            telemetry,
            clock: SessionClock::start(now),
            keybindings: config.keybindings.to_keybindings(),
            pressed: None,
            viewport: empty,
        }
    }

    /// Use a fixed clock for telemetry timestamps.
    pub fn with_clock(mut self, clock: SessionClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn grid(&self) -> &VirtualizedGrid<O> {
        &self.grid
    }

    pub fn maximize(&self) -> &MaximizeController {
        &self.maximize
    }

    pub fn telemetry(&self) -> &TelemetryBatcher<S> {
        &self.telemetry
    }

    /// Overlay rectangles to draw at `now`.
    pub fn frame(&self, now: Instant) -> Option<OverlayFrame> {
        self.maximize.frame(now)
    }

    /// Earliest instant at which [`tick`](Self::tick) has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.telemetry.next_deadline(), self.maximize.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Deliver any queued telemetry.
    pub fn shutdown(&mut self) {
        self.telemetry.flush();
    }

    pub fn update(&mut self, message: Message, now: Instant) -> Vec<Effect> {
        match message {
            Message::Scrolled { viewport } => self.on_scrolled(viewport, now),
            Message::PointerPressed {
                index,
                position,
                modifiers,
            } => {
                self.on_pointer_pressed(index, position, modifiers, now);
                Vec::new()
            }
            Message::PointerMoved {
                index,
                position,
                modifiers,
            } => {
                self.on_pointer_moved(index, position, modifiers);
                Vec::new()
            }
            Message::PointerReleased { index, position, .. } => {
                self.on_pointer_released(index, position, now)
            }
            Message::KeyPressed { key, modifiers } => {
                match self.keybindings.action_for_key(key, modifiers) {
                    Some(KeyAction::Jump(target)) => self.jump_to_last(target, now),
                    Some(KeyAction::Dismiss) => self.dismiss(now),
                    None => Vec::new(),
                }
            }
            Message::ToggleRemoved { index } => self.toggle_removed(index, now),
            Message::PersistCompleted { index, seq, result } => {
                self.on_persist_completed(index, seq, result)
            }
            Message::RemovedToggled { index, result } => {
                match result {
                    Ok(removed) => {
                        self.store.set_removed(index, removed);
                    }
                    Err(e) => {
                        log::warn!("Toggling removal of cell {} failed: {}; reverting", index, e);
                        self.store.toggle_removed(index);
                    }
                }
                Vec::new()
            }
            Message::FullImageLoaded { index, size } => {
                self.maximize.image_loaded(index, size, now);
                Vec::new()
            }
            Message::FullImageFailed { index, error } => {
                if self.maximize.image_failed(index) {
                    self.record_cell(index, TelemetryKind::Minimize, now);
                    vec![Effect::Notice(format!("Could not load full frame: {}", error))]
                } else {
                    Vec::new()
                }
            }
            Message::OverlayPressed => {
                self.maximize.overlay_pressed(now);
                Vec::new()
            }
            Message::OverlayReleased => {
                if let Some(index) = self.maximize.overlay_released(now) {
                    self.record_cell(index, TelemetryKind::Minimize, now);
                }
                Vec::new()
            }
            Message::Dismiss => self.dismiss(now),
        }
    }

    /// Advance timers: close telemetry windows, detect long presses and
    /// finish overlay transitions.
    pub fn tick(&mut self, now: Instant) -> Vec<Effect> {
        self.telemetry.poll(now);

        let mut effects = Vec::new();
        for event in self.maximize.tick(now) {
            match event {
                MaximizeEvent::LongPress { index, needs_image } => {
                    if let Some(editor) = self.grid.cell_mut(index).and_then(GridCell::editor_mut) {
                        if editor.abort() {
                            log::debug!("Drag on cell {} dropped by maximize", index);
                        }
                    }
                    self.record_cell(index, TelemetryKind::Maximize, now);
                    if needs_image {
                        if let Some(entry) = self.store.entry(index) {
                            effects.push(Effect::FetchFullImage {
                                index,
                                request: ImageRequest::full(entry.image_index),
                            });
                        }
                    }
                }
                MaximizeEvent::Hidden { index } => {
                    log::trace!("Overlay for cell {} closed", index);
                }
            }
        }
        effects
    }

    fn record_cell(&mut self, index: usize, kind: TelemetryKind, now: Instant) {
        let Some(entry) = self.store.entry(index) else {
            return;
        };
        let event = TelemetryEvent::for_cell(self.clock.epoch_ms(now), index, entry.image.clone(), kind);
        self.telemetry.record(event, now);
    }

    fn on_scrolled(&mut self, viewport: Rectangle, now: Instant) -> Vec<Effect> {
        self.viewport = viewport;
        self.maximize
            .set_viewport(Rectangle::new(0.0, 0.0, viewport.width, viewport.height));

        let events = self.grid.on_viewport(viewport, &self.store);
        let mut effects = Vec::with_capacity(events.len());
        for event in events {
            match event {
                GridEvent::Mounted { index, request } => {
                    self.record_cell(index, TelemetryKind::CellVisibility { visible: true }, now);
                    effects.push(Effect::FetchThumbnail { index, request });
                }
                GridEvent::Unmounted { index } => {
                    if self.maximize.pending_index() == Some(index) {
                        self.maximize.release();
                    }
                    if self.pressed == Some(index) {
                        self.pressed = None;
                    }
                    self.record_cell(index, TelemetryKind::CellVisibility { visible: false }, now);
                    effects.push(Effect::ReleaseThumbnail { index });
                }
            }
        }
        effects
    }

    fn on_pointer_pressed(&mut self, index: usize, position: Point, modifiers: KeyModifiers, now: Instant) {
        if self.maximize.is_maximized() {
            return;
        }

        let thumbnail = self.grid.slot_on_screen(index, &self.viewport);
        let transform = self.grid.settings().transform;
        let Some(cell) = self.grid.cell_mut(index) else {
            log::warn!("Pointer-down on unmounted cell {}", index);
            return;
        };
        let Some(view) = cell.view else {
            log::debug!("Cell {} has no geometry to crop around; press ignored", index);
            return;
        };
        if let Some(editor) = cell.editor_mut() {
            editor.press(position, modifiers, view, now);
        }
        self.pressed = Some(index);
        self.maximize
            .press(index, position, thumbnail, transform.crop_rect(&view), now);
    }

    /// Moves and releases belong to the cell that was pressed, wherever the
    /// pointer is now. Positions reported against another cell are shifted
    /// into the pressed cell's space.
    fn to_pressed_cell(&self, from: usize, pressed: usize, position: Point) -> Point {
        if from == pressed {
            return position;
        }
        let layout = self.grid.layout();
        let source = layout.slot_bounds(from);
        let target = layout.slot_bounds(pressed);
        Point::new(
            position.x + source.x - target.x,
            position.y + source.y - target.y,
        )
    }

    fn on_pointer_moved(&mut self, index: usize, position: Point, modifiers: KeyModifiers) {
        let Some(pressed) = self.pressed else {
            return;
        };
        let position = self.to_pressed_cell(index, pressed, position);
        if let Some(editor) = self.grid.cell_mut(pressed).and_then(GridCell::editor_mut) {
            editor.drag_to(position, modifiers);
        }
        self.maximize.pointer_moved(position);
    }

    fn on_pointer_released(&mut self, index: usize, position: Point, now: Instant) -> Vec<Effect> {
        self.maximize.release();

        let Some(pressed) = self.pressed.take() else {
            return Vec::new();
        };
        let position = self.to_pressed_cell(index, pressed, position);
        let current = self.store.circle(pressed);
        let Some(editor) = self.grid.cell_mut(pressed).and_then(GridCell::editor_mut) else {
            return Vec::new();
        };
        match editor.release(position, current, now) {
            Some(edit) => self.commit(pressed, edit, now),
            None => Vec::new(),
        }
    }

    fn commit(&mut self, index: usize, edit: CommittedEdit, now: Instant) -> Vec<Effect> {
        let removed = self.store.record(index).and_then(|record| record.removed);
        let record = match edit.geometry {
            Some(circle) => CircleRecord::from_circle(circle, removed),
            None => CircleRecord::cleared(removed),
        };
        if !self.store.set_record(index, record.clone()) {
            return Vec::new();
        }
        let Some(seq) = self.grid.next_edit_seq(index) else {
            return Vec::new();
        };
        log::debug!("Cell {} {} (edit {})", index, edit.kind.name(), seq);

        let kind = TelemetryKind::SetCircle {
            press_time: self.clock.epoch_ms(edit.pressed_at),
            release_time: self.clock.epoch_ms(edit.released_at),
            edit: edit.kind.name().to_string(),
            center_x: record.center_x,
            center_y: record.center_y,
            radius: record.radius,
        };
        self.record_cell(index, kind, now);

        vec![Effect::Persist { index, seq, record }]
    }

    fn on_persist_completed(
        &mut self,
        index: usize,
        seq: u64,
        result: Result<PersistResponse, String>,
    ) -> Vec<Effect> {
        if !self.grid.is_current_edit(index, seq) {
            log::debug!("Discarding stale persistence response for cell {} (edit {})", index, seq);
            return Vec::new();
        }

        match result {
            Ok(response) => {
                if let Some(removed) = response.removed {
                    self.store.set_removed(index, removed);
                }
            }
            Err(e) => log::warn!("Persisting cell {} failed: {}", index, e),
        }

        self.grid
            .refresh(index, &self.store)
            .map(|request| Effect::FetchThumbnail { index, request })
            .into_iter()
            .collect()
    }

    fn toggle_removed(&mut self, index: usize, now: Instant) -> Vec<Effect> {
        if self.grid.mode() == GridMode::ReadOnly {
            log::debug!("Read-only grid; removal toggle on cell {} ignored", index);
            return Vec::new();
        }
        let Some(removed) = self.store.toggle_removed(index) else {
            log::warn!("Removal toggle for unknown grid index {}", index);
            return Vec::new();
        };
        self.record_cell(index, TelemetryKind::ToggleRemoved { removed }, now);
        vec![Effect::ToggleRemoved { index }]
    }

    fn jump_to_last(&mut self, target: JumpTarget, now: Instant) -> Vec<Effect> {
        let found = self.store.last_matching(|record| target.matches(record));
        let event = TelemetryEvent::global(
            self.clock.epoch_ms(now),
            TelemetryKind::JumpToLast {
                target: target.name().to_string(),
                found_index: found,
            },
        );
        self.telemetry.record(event, now);

        match found {
            Some(index) => vec![Effect::ScrollTo {
                index,
                offset: self.grid.layout().scroll_offset_for(index),
            }],
            None => vec![Effect::Notice(format!("No {} entries", target.name()))],
        }
    }

    fn dismiss(&mut self, now: Instant) -> Vec<Effect> {
        if let Some(index) = self.maximize.minimize(now) {
            self.record_cell(index, TelemetryKind::Minimize, now);
        }
        Vec::new()
    }
}

/// Run the backend call behind `effect` and return the completion message.
///
/// Effects that only concern rendering (thumbnails, scrolling, notices)
/// yield `None`; the host handles those itself.
pub fn execute<B: AnnotationBackend + ?Sized>(backend: &B, effect: &Effect) -> Option<Message> {
    match effect {
        Effect::Persist { index, seq, record } => Some(Message::PersistCompleted {
            index: *index,
            seq: *seq,
            result: backend.persist(*index, record).map_err(|e| e.to_string()),
        }),
        Effect::ToggleRemoved { index } => Some(Message::RemovedToggled {
            index: *index,
            result: backend.toggle_removed(*index).map_err(|e| e.to_string()),
        }),
        Effect::FetchFullImage { index, request } => {
            let loaded = backend
                .fetch_image(request)
                .and_then(|bytes| decode_dimensions(&bytes));
            Some(match loaded {
                Ok(size) => Message::FullImageLoaded {
                    index: *index,
                    size,
                },
                Err(e) => Message::FullImageFailed {
                    index: *index,
                    error: e.to_string(),
                },
            })
        }
        Effect::FetchThumbnail { .. }
        | Effect::ReleaseThumbnail { .. }
        | Effect::ScrollTo { .. }
        | Effect::Notice(_) => None,
    }
}
