//! Boundary geometry for connector endpoints.
//!
//! Pure functions: given a shape's box and the connector's *other*
//! endpoint (the origin), find where the connector should meet the
//! shape's silhouette. All of them intersect the origin→center line with
//! the silhouette and keep the hit nearest the origin.

use crate::items::Silhouette;
use kurbo::{Point, Rect, Vec2};

/// Gap between a silhouette and the connector endpoint placed on it.
pub const CONNECTOR_OFFSET: f64 = 7.0;
/// How far an attachment zone extends beyond a shape's drawn bounds.
pub const ATTACHMENT_ZONE_MARGIN: f64 = 15.0;
/// Side length of the box hit-tested around a dropped anchor.
pub const ANCHOR_HIT_SIZE: f64 = 4.0;

const EPSILON: f64 = 1e-9;

/// Intersect the infinite line through `a` and `b` with segment `p`-`q`.
///
/// Returns `None` for parallel (or degenerate) lines and for hits outside
/// the segment.
fn line_segment_intersection(a: Point, b: Point, p: Point, q: Point) -> Option<Point> {
    let a1 = b.y - a.y;
    let b1 = a.x - b.x;
    let c1 = a1 * a.x + b1 * a.y;
    let a2 = q.y - p.y;
    let b2 = p.x - q.x;
    let c2 = a2 * p.x + b2 * p.y;

    let det = a1 * b2 - a2 * b1;
    if det.abs() < EPSILON {
        return None;
    }
    let x = (b2 * c1 - b1 * c2) / det;
    let y = (a1 * c2 - a2 * c1) / det;

    let (min_x, max_x) = (p.x.min(q.x), p.x.max(q.x));
    let (min_y, max_y) = (p.y.min(q.y), p.y.max(q.y));
    let tol = EPSILON * (1.0 + max_x.abs().max(max_y.abs()));
    if x < min_x - tol || x > max_x + tol || y < min_y - tol || y > max_y + tol {
        return None;
    }
    // Rounding can leave the hit a hair off an axis-aligned edge.
    Some(Point::new(x.clamp(min_x, max_x), y.clamp(min_y, max_y)))
}

/// Nearest hit (to `origin`) of the origin→center line against `edges`.
fn nearest_edge_hit(edges: &[(Point, Point)], origin: Point, center: Point) -> Option<Point> {
    edges
        .iter()
        .filter_map(|&(p, q)| line_segment_intersection(origin, center, p, q))
        .min_by(|h1, h2| {
            h1.distance(origin)
                .partial_cmp(&h2.distance(origin))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
}

fn rect_edges(r: Rect) -> [(Point, Point); 4] {
    let tl = Point::new(r.x0, r.y0);
    let tr = Point::new(r.x1, r.y0);
    let br = Point::new(r.x1, r.y1);
    let bl = Point::new(r.x0, r.y1);
    [(bl, tl), (tr, br), (tl, tr), (br, bl)]
}

fn diamond_edges(r: Rect) -> [(Point, Point); 4] {
    let c = r.center();
    let top = Point::new(c.x, r.y0);
    let right = Point::new(r.x1, c.y);
    let bottom = Point::new(c.x, r.y1);
    let left = Point::new(r.x0, c.y);
    [(top, right), (right, bottom), (bottom, left), (left, top)]
}

/// Point on the rectangle's boundary where the origin→center line enters it.
pub fn rect_boundary_point(target: Rect, origin: Point) -> Option<Point> {
    let target = target.abs();
    nearest_edge_hit(&rect_edges(target), origin, target.center())
}

/// Connector point for a rectangle: the boundary hit pulled inward by
/// [`CONNECTOR_OFFSET`] along the origin→center direction.
///
/// `None` when no edge yields a hit (e.g. origin at the center); callers
/// keep the endpoint's previous coordinates in that case.
pub fn rect_connector_point(target: Rect, origin: Point) -> Option<Point> {
    let target = target.abs();
    let hit = rect_boundary_point(target, origin)?;
    let dir = target.center() - origin;
    let len = dir.hypot();
    if len < EPSILON {
        return None;
    }
    Some(hit + dir * (CONNECTOR_OFFSET / len))
}

/// Point on the ellipse inscribed in `target` at the center→origin angle.
pub fn ellipse_boundary_point(target: Rect, origin: Point) -> Point {
    let target = target.abs();
    let center = target.center();
    let angle = (origin.y - center.y).atan2(origin.x - center.x);
    Point::new(
        center.x + target.width() / 2.0 * angle.cos(),
        center.y + target.height() / 2.0 * angle.sin(),
    )
}

/// Connector point for an ellipse: the boundary point pushed *outward* by
/// [`CONNECTOR_OFFSET`] along the center→origin angle.
pub fn ellipse_connector_point(target: Rect, origin: Point) -> Point {
    let target = target.abs();
    let center = target.center();
    let angle = (origin.y - center.y).atan2(origin.x - center.x);
    ellipse_boundary_point(target, origin) + Vec2::from_angle(angle) * CONNECTOR_OFFSET
}

/// Point on the diamond inscribed in `target` nearest the origin along the
/// origin→center line.
pub fn diamond_boundary_point(target: Rect, origin: Point) -> Option<Point> {
    let target = target.abs();
    nearest_edge_hit(&diamond_edges(target), origin, target.center())
}

/// Connector point for a diamond: the boundary hit pushed outward (toward
/// the origin) by [`CONNECTOR_OFFSET`]. Falls back to the box center when
/// no edge is hit.
pub fn diamond_connector_point(target: Rect, origin: Point) -> Point {
    let target = target.abs();
    match diamond_boundary_point(target, origin) {
        Some(hit) => {
            let angle = (hit.y - origin.y).atan2(hit.x - origin.x);
            hit - Vec2::from_angle(angle) * CONNECTOR_OFFSET
        }
        None => target.center(),
    }
}

/// Dispatch to the connector function matching `silhouette`.
pub fn connector_point(silhouette: Silhouette, target: Rect, origin: Point) -> Option<Point> {
    match silhouette {
        Silhouette::Rectangle => rect_connector_point(target, origin),
        Silhouette::Ellipse => Some(ellipse_connector_point(target, origin)),
        Silhouette::Diamond => Some(diamond_connector_point(target, origin)),
    }
}

/// Strict axis-aligned overlap: boxes that only share an edge do not overlap.
pub fn rect_overlap(a: Rect, b: Rect) -> bool {
    let (a, b) = (a.abs(), b.abs());
    a.x0 < b.x1 && b.x0 < a.x1 && a.y0 < b.y1 && b.y0 < a.y1
}

/// The small box hit-tested against attachment zones when an anchor drops.
pub fn anchor_hit_box(point: Point) -> Rect {
    Rect::from_origin_size(point, (ANCHOR_HIT_SIZE, ANCHOR_HIT_SIZE))
}
