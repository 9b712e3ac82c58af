//! Grid snapping for gesture positions.

use kurbo::Point;

/// Result of a snap operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapResult {
    /// The snapped point.
    pub point: Point,
    /// Whether the X coordinate was moved.
    pub snapped_x: bool,
    /// Whether the Y coordinate was moved.
    pub snapped_y: bool,
}

impl SnapResult {
    /// Create a result with no snapping.
    pub fn none(point: Point) -> Self {
        Self {
            point,
            snapped_x: false,
            snapped_y: false,
        }
    }

    /// Check if any snapping occurred.
    pub fn is_snapped(&self) -> bool {
        self.snapped_x || self.snapped_y
    }
}

/// Round each axis independently to the nearest multiple of `increment`.
///
/// A non-positive (or non-finite) increment leaves the point untouched.
pub fn snap_to_grid(point: Point, increment: f64) -> SnapResult {
    if !(increment.is_finite() && increment > 0.0) {
        return SnapResult::none(point);
    }
    let x = (point.x / increment).round() * increment;
    let y = (point.y / increment).round() * increment;
    SnapResult {
        point: Point::new(x, y),
        snapped_x: x != point.x,
        snapped_y: y != point.y,
    }
}

/// Snap when `enabled`, otherwise pass the point through.
pub fn snap_point(point: Point, enabled: bool, increment: f64) -> SnapResult {
    if enabled {
        snap_to_grid(point, increment)
    } else {
        SnapResult::none(point)
    }
}
