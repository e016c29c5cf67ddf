//! Per-cell circle editing.
//!
//! A [`CircleEditor`] turns pointer gestures on one thumbnail into circle
//! edits:
//! - press, drag, release: the drag vector becomes the circle's diameter
//! - a release whose radius is at or below the commit threshold clears the circle
//! - modifier-press and release without movement grows the existing radius
//!
//! Pointer positions arrive in thumbnail screen space and are mapped to
//! crop-local coordinates through [`CropTransform`], using the crop anchor
//! captured at press time for the whole gesture.

use std::time::Duration;

use ballcurator_ui::{KeyModifiers, Point};
use web_time::Instant;

use crate::annotation::Circle;
use crate::constants::{CLICK_SLOP, DEFAULT_GROWTH_FACTOR, DEFAULT_MIN_COMMIT_RADIUS};
use crate::coords::CropTransform;

/// Tunables for circle editing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditorSettings {
    /// Screen <-> crop mapping shared with the grid
    pub transform: CropTransform,
    /// Radius (crop-local units) at or below which a drag clears the circle
    pub min_commit_radius: f32,
    /// Radius multiplier for a modifier-click
    pub growth_factor: f32,
    /// Screen-space travel below which a modifier-click counts as stationary
    pub click_slop: f32,
}

impl EditorSettings {
    pub fn new(transform: CropTransform) -> Self {
        Self {
            transform,
            min_commit_radius: DEFAULT_MIN_COMMIT_RADIUS,
            growth_factor: DEFAULT_GROWTH_FACTOR,
            click_slop: CLICK_SLOP,
        }
    }
}

/// Transient state between a pointer-down and the matching pointer-up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragState {
    /// Press position in crop-local coordinates
    pub anchor: Point,
    /// Press position in thumbnail screen coordinates
    pub anchor_screen: Point,
    /// Crop the thumbnail was showing at press time
    pub view: Circle,
    /// When the press happened
    pub started_at: Instant,
    /// Whether the modifier key was held at press time
    pub modifier: bool,
    /// Whether the pointer travelled beyond the click slop
    pub moved: bool,
}

/// What a completed gesture did to the circle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    /// A new circle drawn by dragging
    Drawn,
    /// A drag too small to keep; geometry becomes null
    Cleared,
    /// Radius grown by a modifier-click
    Grown,
}

impl EditKind {
    pub fn name(&self) -> &'static str {
        match self {
            EditKind::Drawn => "drawn",
            EditKind::Cleared => "cleared",
            EditKind::Grown => "grown",
        }
    }
}

/// A gesture that must be committed to the store and persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommittedEdit {
    /// New geometry, `None` when the circle is cleared
    pub geometry: Option<Circle>,
    pub kind: EditKind,
    pub pressed_at: Instant,
    pub released_at: Instant,
}

impl CommittedEdit {
    /// How long the pointer was held.
    pub fn duration(&self) -> Duration {
        self.released_at.saturating_duration_since(self.pressed_at)
    }
}

/// Pointer-interaction state machine for one grid cell.
#[derive(Debug, Clone)]
pub struct CircleEditor {
    settings: EditorSettings,
    drag: Option<DragState>,
    /// Live geometry while a plain drag is in progress
    preview: Option<Circle>,
}

impl CircleEditor {
    pub fn new(settings: EditorSettings) -> Self {
        Self {
            settings,
            drag: None,
            preview: None,
        }
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn drag(&self) -> Option<&DragState> {
        self.drag.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Pointer-down at `position` (thumbnail screen space) on a thumbnail
    /// cropped around `view`.
    pub fn press(&mut self, position: Point, modifiers: KeyModifiers, view: Circle, now: Instant) {
        if self.drag.is_some() {
            log::debug!("Pointer-down during an active drag; restarting gesture");
        }

        let anchor = self
            .settings
            .transform
            .screen_to_crop(position.x, position.y, &view);
        let modifier = modifiers.shift;

        self.drag = Some(DragState {
            anchor,
            anchor_screen: position,
            view,
            started_at: now,
            modifier,
            moved: false,
        });

        // A plain press starts a new circle and discards whatever was drawn.
        self.preview = if modifier {
            None
        } else {
            Some(Circle {
                center: anchor,
                radius: 0.0,
            })
        };
    }

    /// Pointer-move while pressed.
    pub fn drag_to(&mut self, position: Point, modifiers: KeyModifiers) {
        let Some(drag) = self.drag.as_mut() else {
            return;
        };

        if position.distance_to(drag.anchor_screen) > self.settings.click_slop {
            drag.moved = true;
        }

        if drag.modifier || modifiers.shift {
            return;
        }

        let current = self
            .settings
            .transform
            .screen_to_crop(position.x, position.y, &drag.view);
        self.preview = Some(Circle::from_diameter(drag.anchor, current));
    }

    /// Pointer-up. Clears the drag state unconditionally and returns the edit
    /// to commit, if the gesture produced one.
    ///
    /// `current` is the committed geometry of the cell, used by the
    /// modifier-click growth path.
    pub fn release(
        &mut self,
        position: Point,
        current: Option<Circle>,
        now: Instant,
    ) -> Option<CommittedEdit> {
        let drag = self.drag.take()?;
        self.preview = None;

        let moved =
            drag.moved || position.distance_to(drag.anchor_screen) > self.settings.click_slop;

        if drag.modifier {
            if moved {
                return None;
            }
            let Some(circle) = current else {
                log::debug!("Modifier-click on a cleared circle ignored");
                return None;
            };
            return Some(CommittedEdit {
                geometry: Some(circle.grown(self.settings.growth_factor)),
                kind: EditKind::Grown,
                pressed_at: drag.started_at,
                released_at: now,
            });
        }

        let end = self
            .settings
            .transform
            .screen_to_crop(position.x, position.y, &drag.view);
        let circle = Circle::from_diameter(drag.anchor, end);
        Some(self.commit_drawn(circle, drag.started_at, now))
    }

    fn commit_drawn(&self, circle: Circle, pressed_at: Instant, released_at: Instant) -> CommittedEdit {
        if circle.radius <= self.settings.min_commit_radius {
            log::debug!(
                "Drag radius {:.2} at or below {:.2}; clearing circle",
                circle.radius,
                self.settings.min_commit_radius
            );
            CommittedEdit {
                geometry: None,
                kind: EditKind::Cleared,
                pressed_at,
                released_at,
            }
        } else {
            CommittedEdit {
                geometry: Some(circle),
                kind: EditKind::Drawn,
                pressed_at,
                released_at,
            }
        }
    }

    /// Drop any in-progress gesture without committing.
    pub fn abort(&mut self) -> bool {
        self.preview = None;
        self.drag.take().is_some()
    }

    /// Circle to draw over the thumbnail: the live drag geometry while a
    /// plain drag is in progress, otherwise `committed`.
    pub fn overlay(&self, committed: Option<Circle>) -> Option<Circle> {
        match (&self.drag, self.preview) {
            (Some(drag), Some(preview)) if !drag.modifier => Some(preview),
            _ => committed,
        }
    }
}
