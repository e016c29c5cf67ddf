//! Circle annotation records and their addressing keys.

use ballcurator_ui::Point;
use serde::{Deserialize, Serialize};

/// Identifier of a camera frame in the corpus.
pub type ImageId = String;

/// A circle in full-image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: Point,
    pub radius: f32,
}

impl Circle {
    pub fn new(center_x: f32, center_y: f32, radius: f32) -> Self {
        Self {
            center: Point::new(center_x, center_y),
            radius,
        }
    }

    /// The circle whose diameter is the segment from `a` to `b`.
    pub fn from_diameter(a: Point, b: Point) -> Self {
        let center = a.midpoint(b);
        Self {
            center,
            radius: center.distance_to(a),
        }
    }

    /// Same center, radius multiplied by `factor`.
    pub fn grown(&self, factor: f32) -> Self {
        Self {
            center: self.center,
            radius: self.radius * factor,
        }
    }
}

/// One circle annotation as stored and persisted.
///
/// A cleared circle keeps its record (and its position in the grid) with
/// null geometry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircleRecord {
    pub center_x: Option<f32>,
    pub center_y: Option<f32>,
    pub radius: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed: Option<bool>,
}

impl CircleRecord {
    /// A record holding `circle`, keeping the given removal flag.
    pub fn from_circle(circle: Circle, removed: Option<bool>) -> Self {
        Self {
            center_x: Some(circle.center.x),
            center_y: Some(circle.center.y),
            radius: Some(circle.radius),
            removed,
        }
    }

    /// A record with null geometry, keeping the given removal flag.
    pub fn cleared(removed: Option<bool>) -> Self {
        Self {
            center_x: None,
            center_y: None,
            radius: None,
            removed,
        }
    }

    /// The circle, if all three geometry fields are present and finite.
    pub fn circle(&self) -> Option<Circle> {
        match (self.center_x, self.center_y, self.radius) {
            (Some(x), Some(y), Some(r)) if x.is_finite() && y.is_finite() && r.is_finite() => {
                Some(Circle::new(x, y, r))
            }
            _ => None,
        }
    }

    /// Whether the geometry has been cleared.
    pub fn is_cleared(&self) -> bool {
        self.circle().is_none()
    }

    pub fn is_removed(&self) -> bool {
        self.removed.unwrap_or(false)
    }
}

/// Stable addressing key from a grid position to one circle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationIndexEntry {
    pub image: ImageId,
    pub image_index: usize,
    pub circle_index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_diameter() {
        let c = Circle::from_diameter(Point::new(140.0, 140.0), Point::new(180.0, 180.0));
        assert_eq!(c.center, Point::new(160.0, 160.0));
        assert!((c.radius - 28.284_271).abs() < 1e-4);
    }

    #[test]
    fn test_record_json_uses_camel_case() {
        let record = CircleRecord::from_circle(Circle::new(100.0, 50.0, 20.0), None);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["centerX"], 100.0);
        assert_eq!(json["centerY"], 50.0);
        assert_eq!(json["radius"], 20.0);
        assert!(json.get("removed").is_none());
    }

    #[test]
    fn test_cleared_record_serializes_nulls() {
        let record = CircleRecord::cleared(Some(true));
        let json = serde_json::to_value(&record).unwrap();
        assert!(json["centerX"].is_null());
        assert!(json["radius"].is_null());
        assert_eq!(json["removed"], true);
        assert!(record.is_cleared());
        assert!(record.is_removed());
    }

    #[test]
    fn test_record_parses_missing_fields_as_cleared() {
        let record: CircleRecord = serde_json::from_str(r#"{"centerX": 3.0}"#).unwrap();
        assert!(record.circle().is_none());
        assert!(!record.is_removed());
    }

    #[test]
    fn test_index_entry_json() {
        let entry: AnnotationIndexEntry =
            serde_json::from_str(r#"{"image": "cam1_000123", "imageIndex": 4, "circleIndex": 1}"#)
                .unwrap();
        assert_eq!(entry.image, "cam1_000123");
        assert_eq!(entry.image_index, 4);
        assert_eq!(entry.circle_index, 1);
    }
}
