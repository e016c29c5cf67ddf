//! Maximize/minimize transition between a grid thumbnail and a full-frame
//! inspector.
//!
//! A long press on a thumbnail requests the full frame. Once its size is
//! known the controller captures a [`ViewportGeometry`] and runs two
//! coordinated transitions: the container grows from the thumbnail's screen
//! rectangle to the viewport, and the full image moves from where the crop
//! would place it (so the first frame matches the thumbnail exactly) to an
//! aspect-preserving fit inside the viewport.
//!
//! Starting a transition always cancels the one in flight and continues from
//! its current rectangle.

use std::time::Duration;

use ballcurator_ui::{Easing, Keyframes, Point, Rectangle, Size, Transition};
use web_time::Instant;

use crate::constants::{DEFAULT_LONG_PRESS_MS, DEFAULT_MAXIMIZE_DURATION_MS, LONG_PRESS_SLOP};
use crate::coords::{fit_centered, map_rect};

/// Timing parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaximizeSettings {
    /// Hold time that turns a press into a maximize
    pub long_press: Duration,
    /// Pointer travel (screen pixels) that cancels a pending long press
    pub long_press_slop: f32,
    /// Length of each transition
    pub duration: Duration,
    pub easing: Easing,
}

impl Default for MaximizeSettings {
    fn default() -> Self {
        Self {
            long_press: Duration::from_millis(DEFAULT_LONG_PRESS_MS),
            long_press_slop: LONG_PRESS_SLOP,
            duration: Duration::from_millis(DEFAULT_MAXIMIZE_DURATION_MS),
            easing: Easing::default(),
        }
    }
}

/// Geometry captured for one maximize/minimize cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportGeometry {
    /// Screen rectangle of the source thumbnail
    pub thumbnail: Rectangle,
    /// Screen rectangle of the inspector
    pub viewport: Rectangle,
    /// The thumbnail's crop window in full-image pixels
    pub crop_in_image: Rectangle,
    /// Native size of the full frame
    pub image_size: Size,
    /// Screen rectangle of the full image when minimized, such that the crop
    /// window coincides with the thumbnail
    pub image_minimized: Rectangle,
    /// Screen rectangle of the full image when maximized
    pub image_maximized: Rectangle,
}

impl ViewportGeometry {
    pub fn capture(thumbnail: Rectangle, viewport: Rectangle, crop_in_image: Rectangle, image_size: Size) -> Self {
        let image_bounds = Rectangle::new(0.0, 0.0, image_size.width, image_size.height);
        Self {
            thumbnail,
            viewport,
            crop_in_image,
            image_size,
            image_minimized: map_rect(&image_bounds, &crop_in_image, &thumbnail),
            image_maximized: fit_centered(image_size, &viewport),
        }
    }

    /// Where the crop window sits on screen once maximized.
    pub fn crop_maximized(&self) -> Rectangle {
        let image_bounds = Rectangle::new(0.0, 0.0, self.image_size.width, self.image_size.height);
        map_rect(&self.crop_in_image, &image_bounds, &self.image_maximized)
    }

    fn container_keyframes(&self) -> Keyframes {
        Keyframes::new(self.thumbnail, self.viewport)
    }

    fn image_keyframes(&self) -> Keyframes {
        Keyframes::new(self.image_minimized, self.image_maximized)
    }
}

/// Rectangles to draw the overlay with at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayFrame {
    pub index: usize,
    pub container: Rectangle,
    pub image: Rectangle,
}

/// Outcome of [`MaximizeController::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaximizeEvent {
    /// A long press completed on `index`. The full frame is needed unless the
    /// press reversed a running minimize.
    LongPress { index: usize, needs_image: bool },
    /// The overlay finished minimizing and is no longer drawn.
    Hidden { index: usize },
}

#[derive(Debug, Clone, Copy)]
struct PendingPress {
    index: usize,
    position: Point,
    pressed_at: Instant,
    thumbnail: Rectangle,
    crop_in_image: Rectangle,
}

#[derive(Debug, Clone, Copy)]
enum MaximizeState {
    Minimized,
    AwaitingImage {
        index: usize,
        thumbnail: Rectangle,
        crop_in_image: Rectangle,
    },
    Maximized {
        index: usize,
        geometry: ViewportGeometry,
        container: Transition,
        image: Transition,
    },
    Minimizing {
        index: usize,
        geometry: ViewportGeometry,
        container: Transition,
        image: Transition,
    },
}

/// Two-state (minimized/maximized) controller with animated transitions.
#[derive(Debug, Clone)]
pub struct MaximizeController {
    settings: MaximizeSettings,
    viewport: Rectangle,
    state: MaximizeState,
    pending: Option<PendingPress>,
    overlay_pressed_at: Option<Instant>,
}

impl MaximizeController {
    pub fn new(settings: MaximizeSettings, viewport: Rectangle) -> Self {
        Self {
            settings,
            viewport,
            state: MaximizeState::Minimized,
            pending: None,
            overlay_pressed_at: None,
        }
    }

    pub fn settings(&self) -> &MaximizeSettings {
        &self.settings
    }

    /// Update the inspector's screen rectangle. Takes effect on the next
    /// maximize.
    pub fn set_viewport(&mut self, viewport: Rectangle) {
        self.viewport = viewport;
    }

    /// Grid position shown in the overlay, if any.
    pub fn active_index(&self) -> Option<usize> {
        match self.state {
            MaximizeState::Minimized => None,
            MaximizeState::AwaitingImage { index, .. }
            | MaximizeState::Maximized { index, .. }
            | MaximizeState::Minimizing { index, .. } => Some(index),
        }
    }

    /// Whether the overlay is maximized or on its way there.
    pub fn is_maximized(&self) -> bool {
        matches!(
            self.state,
            MaximizeState::AwaitingImage { .. } | MaximizeState::Maximized { .. }
        )
    }

    pub fn geometry(&self) -> Option<&ViewportGeometry> {
        match &self.state {
            MaximizeState::Maximized { geometry, .. } | MaximizeState::Minimizing { geometry, .. } => {
                Some(geometry)
            }
            _ => None,
        }
    }

    /// Pointer-down on grid cell `index`. Starts the long-press timer.
    pub fn press(
        &mut self,
        index: usize,
        position: Point,
        thumbnail: Rectangle,
        crop_in_image: Rectangle,
        now: Instant,
    ) {
        if self.is_maximized() {
            return;
        }
        self.pending = Some(PendingPress {
            index,
            position,
            pressed_at: now,
            thumbnail,
            crop_in_image,
        });
    }

    /// Pointer-move on the grid. Leaving the slop radius cancels the pending
    /// long press.
    pub fn pointer_moved(&mut self, position: Point) {
        if let Some(pending) = self.pending {
            if position.distance_to(pending.position) > self.settings.long_press_slop {
                log::trace!("Long press on cell {} cancelled by movement", pending.index);
                self.pending = None;
            }
        }
    }

    /// Cell with a long press in progress.
    pub fn pending_index(&self) -> Option<usize> {
        self.pending.map(|p| p.index)
    }

    /// Pointer-up on the grid.
    pub fn release(&mut self) {
        self.pending = None;
    }

    /// Advance timers: detect long presses and finish minimizing.
    pub fn tick(&mut self, now: Instant) -> Vec<MaximizeEvent> {
        let mut events = Vec::new();

        if let MaximizeState::Minimizing { index, container, image, .. } = self.state {
            if container.is_finished(now) && image.is_finished(now) {
                log::debug!("Overlay for cell {} hidden", index);
                self.state = MaximizeState::Minimized;
                events.push(MaximizeEvent::Hidden { index });
            }
        }

        if let Some(pending) = self.pending {
            if now.saturating_duration_since(pending.pressed_at) >= self.settings.long_press {
                self.pending = None;
                events.push(self.begin_maximize(pending, now));
            }
        }

        events
    }

    fn begin_maximize(&mut self, press: PendingPress, now: Instant) -> MaximizeEvent {
        if let MaximizeState::Minimizing {
            index,
            geometry,
            container,
            image,
        } = self.state
        {
            if index == press.index {
                // Reverse in place: the current rectangles become the start.
                let container = self.start(container.cancel(now), geometry.viewport, now);
                let image = self.start(image.cancel(now), geometry.image_maximized, now);
                self.state = MaximizeState::Maximized {
                    index,
                    geometry,
                    container,
                    image,
                };
                log::debug!("Minimize of cell {} reversed", index);
                return MaximizeEvent::LongPress {
                    index,
                    needs_image: false,
                };
            }
        }

        log::debug!("Long press on cell {}; requesting full frame", press.index);
        self.state = MaximizeState::AwaitingImage {
            index: press.index,
            thumbnail: press.thumbnail,
            crop_in_image: press.crop_in_image,
        };
        MaximizeEvent::LongPress {
            index: press.index,
            needs_image: true,
        }
    }

    fn start(&self, from: Rectangle, to: Rectangle, now: Instant) -> Transition {
        Transition::start(Keyframes::new(from, to), self.settings.duration, now)
            .with_easing(self.settings.easing)
    }

    /// The full frame for `index` arrived; start the maximize animation.
    /// Returns false if no maximize of `index` is waiting.
    pub fn image_loaded(&mut self, index: usize, image_size: Size, now: Instant) -> bool {
        let MaximizeState::AwaitingImage {
            index: waiting,
            thumbnail,
            crop_in_image,
        } = self.state
        else {
            return false;
        };
        if waiting != index {
            log::debug!("Ignoring full frame for cell {}; waiting for {}", index, waiting);
            return false;
        }

        let geometry = ViewportGeometry::capture(thumbnail, self.viewport, crop_in_image, image_size);
        let container = Transition::start(geometry.container_keyframes(), self.settings.duration, now)
            .with_easing(self.settings.easing);
        let image = Transition::start(geometry.image_keyframes(), self.settings.duration, now)
            .with_easing(self.settings.easing);
        self.state = MaximizeState::Maximized {
            index,
            geometry,
            container,
            image,
        };
        true
    }

    /// The full frame for `index` could not be loaded; stay in the grid.
    pub fn image_failed(&mut self, index: usize) -> bool {
        match self.state {
            MaximizeState::AwaitingImage { index: waiting, .. } if waiting == index => {
                log::warn!("Full frame for cell {} failed to load; not maximizing", index);
                self.state = MaximizeState::Minimized;
                true
            }
            _ => false,
        }
    }

    /// Start minimizing. Returns the grid position being minimized.
    pub fn minimize(&mut self, now: Instant) -> Option<usize> {
        self.overlay_pressed_at = None;
        match self.state {
            MaximizeState::AwaitingImage { index, .. } => {
                self.state = MaximizeState::Minimized;
                Some(index)
            }
            MaximizeState::Maximized {
                index,
                geometry,
                container,
                image,
            } => {
                let container = self.start(container.cancel(now), geometry.thumbnail, now);
                let image = self.start(image.cancel(now), geometry.image_minimized, now);
                self.state = MaximizeState::Minimizing {
                    index,
                    geometry,
                    container,
                    image,
                };
                Some(index)
            }
            MaximizeState::Minimized | MaximizeState::Minimizing { .. } => None,
        }
    }

    /// Pointer-down inside the maximized overlay.
    pub fn overlay_pressed(&mut self, now: Instant) {
        if self.is_maximized() {
            self.overlay_pressed_at = Some(now);
        }
    }

    /// Pointer-up inside the maximized overlay. A short press minimizes.
    pub fn overlay_released(&mut self, now: Instant) -> Option<usize> {
        let pressed_at = self.overlay_pressed_at.take()?;
        if now.saturating_duration_since(pressed_at) < self.settings.long_press {
            self.minimize(now)
        } else {
            None
        }
    }

    /// Rectangles to draw at `now`, or `None` when nothing is shown.
    pub fn frame(&self, now: Instant) -> Option<OverlayFrame> {
        match &self.state {
            MaximizeState::Maximized {
                index,
                container,
                image,
                ..
            }
            | MaximizeState::Minimizing {
                index,
                container,
                image,
                ..
            } => Some(OverlayFrame {
                index: *index,
                container: container.sample(now),
                image: image.sample(now),
            }),
            _ => None,
        }
    }

    /// Earliest instant at which [`tick`](Self::tick) has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        let press = self.pending.map(|p| p.pressed_at + self.settings.long_press);
        let hide = match &self.state {
            MaximizeState::Minimizing { container, .. } => Some(container.ends_at()),
            _ => None,
        };
        match (press, hide) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}
