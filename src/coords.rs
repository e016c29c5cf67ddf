//! Coordinate mapping between screen, crop and full-image space.
//!
//! A grid thumbnail shows a square crop of the frame centered on the cell's
//! circle, extending `radius * scale_factor` in every direction, scaled to
//! `render_size` on screen. Pointer positions inside the thumbnail are mapped
//! to crop-local coordinates, which share units and origin with full-image
//! pixel coordinates.

use ballcurator_ui::{Point, Rectangle, Size};

use crate::annotation::Circle;

/// Affine interpolation of `value` from `[src_start, src_end]` onto
/// `[dst_start, dst_end]`.
///
/// A degenerate source range maps everything to `dst_start`.
pub fn linear_map(value: f32, src_start: f32, src_end: f32, dst_start: f32, dst_end: f32) -> f32 {
    let span = src_end - src_start;
    if span == 0.0 {
        return dst_start;
    }
    dst_start + (value - src_start) / span * (dst_end - dst_start)
}

/// Map all four edges of `rect` from the `src` frame onto the `dst` frame.
pub fn map_rect(rect: &Rectangle, src: &Rectangle, dst: &Rectangle) -> Rectangle {
    Rectangle::from_edges(
        linear_map(rect.x, src.x, src.right(), dst.x, dst.right()),
        linear_map(rect.y, src.y, src.bottom(), dst.y, dst.bottom()),
        linear_map(rect.right(), src.x, src.right(), dst.x, dst.right()),
        linear_map(rect.bottom(), src.y, src.bottom(), dst.y, dst.bottom()),
    )
}

/// Largest rectangle with the aspect ratio of `content` that fits inside
/// `frame`, centered along the axis with spare room.
pub fn fit_centered(content: Size, frame: &Rectangle) -> Rectangle {
    if content.width <= 0.0 || content.height <= 0.0 {
        return *frame;
    }
    let scale = (frame.width / content.width).min(frame.height / content.height);
    let width = content.width * scale;
    let height = content.height * scale;
    Rectangle::new(
        frame.x + (frame.width - width) / 2.0,
        frame.y + (frame.height - height) / 2.0,
        width,
        height,
    )
}

/// Thumbnail <-> crop mapping for one crop scale and render size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropTransform {
    /// Crop half-extent as a multiple of the circle radius
    pub scale_factor: f32,
    /// Edge length of the rendered thumbnail in screen pixels
    pub render_size: f32,
    /// Lower bound on the crop half-extent, so tiny circles stay redrawable
    pub min_half_extent: f32,
}

impl CropTransform {
    pub fn new(scale_factor: f32, render_size: f32) -> Self {
        Self {
            scale_factor,
            render_size,
            min_half_extent: 0.0,
        }
    }

    pub fn with_min_half_extent(mut self, min_half_extent: f32) -> Self {
        self.min_half_extent = min_half_extent;
        self
    }

    /// Half the crop's edge length in image pixels.
    pub fn half_extent(&self, circle: &Circle) -> f32 {
        (circle.radius * self.scale_factor).max(self.min_half_extent)
    }

    /// Radius that, scaled by `scale_factor`, yields the crop actually shown
    /// for `circle`.
    pub fn crop_radius(&self, circle: &Circle) -> f32 {
        if self.scale_factor > 0.0 {
            self.half_extent(circle) / self.scale_factor
        } else {
            circle.radius
        }
    }

    /// The crop window in full-image coordinates.
    pub fn crop_rect(&self, circle: &Circle) -> Rectangle {
        let half = self.half_extent(circle);
        Rectangle::new(
            circle.center.x - half,
            circle.center.y - half,
            half * 2.0,
            half * 2.0,
        )
    }

    /// Map a pointer offset inside the thumbnail (`0..=render_size`) into
    /// crop-local coordinates of a crop centered on `circle`.
    pub fn screen_to_crop(&self, x: f32, y: f32, circle: &Circle) -> Point {
        let half = self.half_extent(circle);
        Point::new(
            (x / self.render_size) * 2.0 * half + circle.center.x - half,
            (y / self.render_size) * 2.0 * half + circle.center.y - half,
        )
    }

    /// Inverse of [`screen_to_crop`](Self::screen_to_crop).
    pub fn crop_to_screen(&self, point: Point, circle: &Circle) -> Point {
        let crop = self.crop_rect(circle);
        Point::new(
            linear_map(point.x, crop.x, crop.right(), 0.0, self.render_size),
            linear_map(point.y, crop.y, crop.bottom(), 0.0, self.render_size),
        )
    }

    /// Where `target` is drawn inside a thumbnail cropped around `anchor`,
    /// as a screen-space center and radius.
    pub fn circle_to_screen(&self, target: &Circle, anchor: &Circle) -> (Point, f32) {
        let center = self.crop_to_screen(target.center, anchor);
        let half = self.half_extent(anchor);
        let radius = if half > 0.0 {
            target.radius / (2.0 * half) * self.render_size
        } else {
            0.0
        };
        (center, radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 0.001;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn transform() -> CropTransform {
        CropTransform::new(2.0, 200.0)
    }

    #[test]
    fn test_linear_map_basic() {
        assert!(approx_eq(linear_map(5.0, 0.0, 10.0, 100.0, 200.0), 150.0));
        assert!(approx_eq(linear_map(0.0, 0.0, 10.0, 100.0, 200.0), 100.0));
        assert!(approx_eq(linear_map(10.0, 0.0, 10.0, 200.0, 100.0), 100.0));
        assert!(approx_eq(linear_map(-5.0, 0.0, 10.0, 0.0, 1.0), -0.5));
    }

    #[test]
    fn test_linear_map_degenerate_source() {
        assert_eq!(linear_map(3.0, 1.0, 1.0, 7.0, 9.0), 7.0);
    }

    #[test]
    fn test_linear_map_round_trip() {
        for i in 0..=20 {
            let v = i as f32 * 13.7 - 40.0;
            let there = linear_map(v, -40.0, 250.0, 12.0, 900.0);
            let back = linear_map(there, 12.0, 900.0, -40.0, 250.0);
            assert!(approx_eq(v, back), "{} -> {} -> {}", v, there, back);
        }
    }

    #[test]
    fn test_screen_to_crop_corners() {
        let circle = Circle::new(100.0, 100.0, 20.0);
        let t = transform();
        assert_eq!(t.screen_to_crop(0.0, 0.0, &circle), Point::new(60.0, 60.0));
        assert_eq!(t.screen_to_crop(200.0, 200.0, &circle), Point::new(140.0, 140.0));
        assert_eq!(t.screen_to_crop(100.0, 100.0, &circle), Point::new(100.0, 100.0));
    }

    #[test]
    fn test_screen_crop_round_trip() {
        let circle = Circle::new(731.5, 402.25, 17.3);
        let t = transform();
        for xi in 0..=10 {
            for yi in 0..=10 {
                let x = xi as f32 * 20.0;
                let y = yi as f32 * 20.0;
                let crop = t.screen_to_crop(x, y, &circle);
                let back = t.crop_to_screen(crop, &circle);
                assert!(approx_eq(back.x, x), "x {} -> {}", x, back.x);
                assert!(approx_eq(back.y, y), "y {} -> {}", y, back.y);
            }
        }
    }

    #[test]
    fn test_crop_rect() {
        let rect = transform().crop_rect(&Circle::new(100.0, 50.0, 10.0));
        assert_eq!(rect, Rectangle::new(80.0, 30.0, 40.0, 40.0));
    }

    #[test]
    fn test_tiny_circle_crop_is_floored() {
        let t = transform().with_min_half_extent(8.0);
        let dot = Circle::new(50.0, 50.0, 0.0);
        assert_eq!(t.crop_rect(&dot), Rectangle::new(42.0, 42.0, 16.0, 16.0));
        assert_eq!(t.crop_radius(&dot), 4.0);
        assert_eq!(t.screen_to_crop(200.0, 200.0, &dot), Point::new(58.0, 58.0));

        // circles larger than the floor are untouched
        let ball = Circle::new(100.0, 50.0, 10.0);
        assert_eq!(t.crop_rect(&ball), transform().crop_rect(&ball));
        assert_eq!(t.crop_radius(&ball), 10.0);
    }

    #[test]
    fn test_circle_to_screen_of_anchor_is_centered() {
        let anchor = Circle::new(100.0, 100.0, 20.0);
        let (center, radius) = transform().circle_to_screen(&anchor, &anchor);
        assert!(approx_eq(center.x, 100.0));
        assert!(approx_eq(center.y, 100.0));
        // radius 20 in an 80px crop drawn at 200px
        assert!(approx_eq(radius, 50.0));
    }

    #[test]
    fn test_map_rect() {
        let src = Rectangle::new(0.0, 0.0, 100.0, 100.0);
        let dst = Rectangle::new(10.0, 20.0, 200.0, 400.0);
        let mapped = map_rect(&Rectangle::new(25.0, 50.0, 50.0, 25.0), &src, &dst);
        assert!(approx_eq(mapped.x, 60.0));
        assert!(approx_eq(mapped.y, 220.0));
        assert!(approx_eq(mapped.width, 100.0));
        assert!(approx_eq(mapped.height, 100.0));
    }

    #[test]
    fn test_fit_centered_landscape_in_square() {
        let frame = Rectangle::new(0.0, 0.0, 1000.0, 1000.0);
        let fitted = fit_centered(Size::new(1920.0, 1080.0), &frame);
        assert!(approx_eq(fitted.width, 1000.0));
        assert!(approx_eq(fitted.height, 562.5));
        assert!(approx_eq(fitted.x, 0.0));
        assert!(approx_eq(fitted.y, 218.75));
    }

    #[test]
    fn test_fit_centered_portrait_in_wide_frame() {
        let frame = Rectangle::new(100.0, 0.0, 1600.0, 900.0);
        let fitted = fit_centered(Size::new(900.0, 1800.0), &frame);
        assert!(approx_eq(fitted.height, 900.0));
        assert!(approx_eq(fitted.width, 450.0));
        assert!(approx_eq(fitted.x, 100.0 + 575.0));
    }
}
