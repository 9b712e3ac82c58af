//! Freehand strokes.

use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};

/// A freehand stroke. `points` are flat pairs relative to the item position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draw {
    pub size: Size,
    pub points: Vec<f64>,
}

impl Draw {
    /// Build a stroke from absolute points, returning the stroke and the
    /// origin it is relative to.
    pub fn from_points(points: &[Point]) -> (Point, Self) {
        let min_x = points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let min_y = points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let max_x = points.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
        let max_y = points.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
        if points.is_empty() {
            return (Point::ZERO, Self { size: Size::ZERO, points: Vec::new() });
        }
        let origin = Point::new(min_x, min_y);
        let flat = points
            .iter()
            .flat_map(|p| [p.x - origin.x, p.y - origin.y])
            .collect();
        (
            origin,
            Self {
                size: Size::new(max_x - min_x, max_y - min_y),
                points: flat,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points_is_relative_to_min_corner() {
        let (origin, draw) = Draw::from_points(&[Point::new(10.0, 20.0), Point::new(30.0, 5.0)]);
        assert_eq!(origin, Point::new(10.0, 5.0));
        assert_eq!(draw.points, vec![0.0, 15.0, 20.0, 0.0]);
        assert!((draw.size.width - 20.0).abs() < f64::EPSILON);
        assert!((draw.size.height - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_from_no_points() {
        let (origin, draw) = Draw::from_points(&[]);
        assert_eq!(origin, Point::ZERO);
        assert!(draw.points.is_empty());
    }
}
