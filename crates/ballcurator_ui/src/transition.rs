//! Cancelable rectangle transitions.
//!
//! A [`Transition`] interpolates between two rectangles over a fixed
//! duration. Transitions are sampled with an explicit timestamp so that the
//! host's frame clock drives them. Cancelling a transition yields the
//! rectangle it had reached, which lets a reverse transition start exactly
//! where the interrupted one stopped.

use std::time::Duration;
use web_time::Instant;

use crate::Rectangle;

/// Timing curve applied to linear progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    Linear,
    /// Cubic ease-in-out
    #[default]
    EaseInOut,
    /// Cubic ease-out
    EaseOut,
}

impl Easing {
    /// Map linear progress `t` (clamped to 0..=1) to eased progress.
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let f = -2.0 * t + 2.0;
                    1.0 - f * f * f / 2.0
                }
            }
            Easing::EaseOut => {
                let f = 1.0 - t;
                1.0 - f * f * f
            }
        }
    }
}

/// Start and end rectangles of a transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframes {
    pub from: Rectangle,
    pub to: Rectangle,
}

impl Keyframes {
    pub fn new(from: Rectangle, to: Rectangle) -> Self {
        Self { from, to }
    }
}

/// A running transition between two rectangles.
#[derive(Debug, Clone, Copy)]
pub struct Transition {
    keyframes: Keyframes,
    started_at: Instant,
    duration: Duration,
    easing: Easing,
}

impl Transition {
    /// Start a transition at `now`.
    pub fn start(keyframes: Keyframes, duration: Duration, now: Instant) -> Self {
        Self {
            keyframes,
            started_at: now,
            duration,
            easing: Easing::default(),
        }
    }

    /// Use a different timing curve.
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn keyframes(&self) -> Keyframes {
        self.keyframes
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Instant at which the transition reaches its end keyframe.
    pub fn ends_at(&self) -> Instant {
        self.started_at + self.duration
    }

    /// Linear progress in 0..=1.
    pub fn progress(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started_at);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }

    /// Interpolated rectangle at `now`.
    pub fn sample(&self, now: Instant) -> Rectangle {
        let t = self.easing.apply(self.progress(now));
        self.keyframes.from.lerp(&self.keyframes.to, t)
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        self.progress(now) >= 1.0
    }

    /// Stop the transition and return the rectangle it had reached.
    pub fn cancel(self, now: Instant) -> Rectangle {
        let reached = self.sample(now);
        log::trace!(
            "Transition cancelled at {:.0}% progress",
            self.progress(now) * 100.0
        );
        reached
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 0.0001;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn keyframes() -> Keyframes {
        Keyframes::new(
            Rectangle::new(0.0, 0.0, 100.0, 100.0),
            Rectangle::new(0.0, 0.0, 1000.0, 800.0),
        )
    }

    #[test]
    fn test_easing_endpoints() {
        for easing in [Easing::Linear, Easing::EaseInOut, Easing::EaseOut] {
            assert!(approx_eq(easing.apply(0.0), 0.0));
            assert!(approx_eq(easing.apply(1.0), 1.0));
        }
        assert!(approx_eq(Easing::EaseInOut.apply(0.5), 0.5));
    }

    #[test]
    fn test_sample_linear_midpoint() {
        let now = Instant::now();
        let t = Transition::start(keyframes(), Duration::from_millis(200), now)
            .with_easing(Easing::Linear);
        let mid = t.sample(now + Duration::from_millis(100));
        assert!(approx_eq(mid.width, 550.0));
        assert!(approx_eq(mid.height, 450.0));
        assert!(!t.is_finished(now + Duration::from_millis(100)));
        assert!(t.is_finished(now + Duration::from_millis(200)));
    }

    #[test]
    fn test_sample_clamps_after_end() {
        let now = Instant::now();
        let t = Transition::start(keyframes(), Duration::from_millis(50), now);
        assert_eq!(t.sample(now + Duration::from_secs(5)), keyframes().to);
    }

    #[test]
    fn test_zero_duration_is_finished_immediately() {
        let now = Instant::now();
        let t = Transition::start(keyframes(), Duration::ZERO, now);
        assert!(t.is_finished(now));
        assert_eq!(t.sample(now), keyframes().to);
    }

    #[test]
    fn test_cancel_returns_reached_rectangle() {
        let now = Instant::now();
        let t = Transition::start(keyframes(), Duration::from_millis(400), now);
        let at = now + Duration::from_millis(100);
        let expected = t.sample(at);
        assert_eq!(t.cancel(at), expected);
    }
}
