//! Item definitions for the board.
//!
//! An [`Item`] carries the fields every variant shares (id, position,
//! version, style, attachments) and an [`ItemKind`] holding the
//! variant-specific payload. On the wire the two are flattened into one
//! JSON object discriminated by `"type"`.

mod area;
mod connector;
mod draw;
mod style;

pub use area::{
    Circle, Custom, FontDecoration, FontEffect, Image, LibraryImage, Rectangle, Text, TextAlign,
    TooltipLine,
};
pub use connector::{Connector, ConnectorRef, Endpoint};
pub use draw::Draw;
pub use style::{ItemColor, ItemStyle, StrokeStyle};

use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for items.
pub type ItemId = Uuid;

/// Held on a shape: "connector X has an endpoint fixed to me".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attachment {
    pub connector: ItemId,
}

/// Variant-specific payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ItemKind {
    Rectangle(Rectangle),
    Diamond(Rectangle),
    Circle(Circle),
    Text(Text),
    Image(Image),
    Line(Connector),
    Arrow(Connector),
    Draw(Draw),
    Custom(Custom),
}

/// Boundary silhouette used to place connector endpoints on a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Silhouette {
    Rectangle,
    Ellipse,
    Diamond,
}

/// A board item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub(crate) id: ItemId,
    /// Top-left corner (area items) or origin of `points` (lines, arrows, strokes).
    pub position: Point,
    #[serde(default = "initial_version")]
    pub(crate) version: u64,
    #[serde(flatten)]
    pub style: ItemStyle,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(flatten)]
    pub kind: ItemKind,
}

fn initial_version() -> u64 {
    1
}

impl Item {
    /// Create a new item at version 1 with a fresh id.
    pub fn new(position: Point, kind: ItemKind) -> Self {
        let mut style = ItemStyle::default();
        match &kind {
            ItemKind::Image(_) | ItemKind::Custom(_) => {
                style.is_strokeable = false;
                style.is_fillable = false;
            }
            ItemKind::Text(_) => {
                style.is_stroke_enabled = false;
                style.is_fill_enabled = true;
                style.fill_color = ItemColor::black();
            }
            _ => {}
        }
        Self {
            id: Uuid::new_v4(),
            position,
            version: initial_version(),
            style,
            attachments: Vec::new(),
            kind,
        }
    }

    /// Reconstruct an item with a specific id (for storage and tests).
    pub fn with_id(id: ItemId, position: Point, kind: ItemKind) -> Self {
        Self {
            id,
            ..Self::new(position, kind)
        }
    }

    pub fn rectangle(position: Point, size: Size) -> Self {
        Self::new(position, ItemKind::Rectangle(Rectangle::new(size)))
    }

    pub fn diamond(position: Point, size: Size) -> Self {
        Self::new(position, ItemKind::Diamond(Rectangle::new(size)))
    }

    pub fn circle(position: Point, size: Size) -> Self {
        Self::new(position, ItemKind::Circle(Circle { size }))
    }

    pub fn text(position: Point, size: Size, text: impl Into<String>) -> Self {
        Self::new(position, ItemKind::Text(Text::new(size, text)))
    }

    /// A line between two absolute points; the line's position is `tail`.
    pub fn line(tail: Point, head: Point) -> Self {
        Self::new(tail, ItemKind::Line(Connector::new(Point::ZERO, (head - tail).to_point())))
    }

    /// An arrow between two absolute points, pointing at `head`.
    pub fn arrow(tail: Point, head: Point) -> Self {
        let mut connector = Connector::new(Point::ZERO, (head - tail).to_point());
        connector.has_arrow_head = true;
        Self::new(tail, ItemKind::Arrow(connector))
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn bump_version(&mut self) {
        self.version += 1;
    }

    /// Give the item a new identity (paste/duplicate).
    pub(crate) fn regenerate_id(&mut self) {
        self.id = Uuid::new_v4();
    }

    /// Wire name of the variant.
    pub fn type_name(&self) -> &'static str {
        match &self.kind {
            ItemKind::Rectangle(_) => "rectangle",
            ItemKind::Diamond(_) => "diamond",
            ItemKind::Circle(_) => "circle",
            ItemKind::Text(_) => "text",
            ItemKind::Image(_) => "image",
            ItemKind::Line(_) => "line",
            ItemKind::Arrow(_) => "arrow",
            ItemKind::Draw(_) => "draw",
            ItemKind::Custom(_) => "custom",
        }
    }

    /// Own box size, for every variant that has one.
    pub fn size(&self) -> Option<Size> {
        match &self.kind {
            ItemKind::Rectangle(r) | ItemKind::Diamond(r) => Some(r.size),
            ItemKind::Circle(c) => Some(c.size),
            ItemKind::Text(t) => Some(t.size),
            ItemKind::Image(i) => Some(i.size),
            ItemKind::Draw(d) => Some(d.size),
            ItemKind::Custom(c) => Some(c.size),
            ItemKind::Line(_) | ItemKind::Arrow(_) => None,
        }
    }

    /// Resize; returns false for variants without a box.
    pub fn set_size(&mut self, size: Size) -> bool {
        let slot = match &mut self.kind {
            ItemKind::Rectangle(r) | ItemKind::Diamond(r) => &mut r.size,
            ItemKind::Circle(c) => &mut c.size,
            ItemKind::Text(t) => &mut t.size,
            ItemKind::Image(i) => &mut i.size,
            ItemKind::Draw(d) => &mut d.size,
            ItemKind::Custom(c) => &mut c.size,
            ItemKind::Line(_) | ItemKind::Arrow(_) => return false,
        };
        *slot = size;
        true
    }

    /// Silhouette that connectors attach to. `None` for items that cannot
    /// be attached to (lines, arrows, freehand strokes).
    pub fn silhouette(&self) -> Option<Silhouette> {
        match &self.kind {
            ItemKind::Rectangle(_) | ItemKind::Text(_) | ItemKind::Image(_) | ItemKind::Custom(_) => {
                Some(Silhouette::Rectangle)
            }
            ItemKind::Circle(_) => Some(Silhouette::Ellipse),
            ItemKind::Diamond(_) => Some(Silhouette::Diamond),
            ItemKind::Line(_) | ItemKind::Arrow(_) | ItemKind::Draw(_) => None,
        }
    }

    /// Drawn bounds of an area item at its current position.
    pub fn bounds(&self) -> Option<Rect> {
        self.bounds_at(self.position)
    }

    /// Drawn bounds as if the item were placed at `position`.
    pub fn bounds_at(&self, position: Point) -> Option<Rect> {
        self.size().map(|size| Rect::from_origin_size(position, size))
    }

    /// Hit-test rectangle for anchor drops: own bounds grown by `margin`.
    pub fn attachment_zone(&self, margin: f64) -> Option<Rect> {
        self.silhouette()?;
        self.bounds().map(|b| b.inflate(margin, margin))
    }

    pub fn is_connector(&self) -> bool {
        matches!(self.kind, ItemKind::Line(_) | ItemKind::Arrow(_))
    }

    pub fn as_connector(&self) -> Option<&Connector> {
        match &self.kind {
            ItemKind::Line(c) | ItemKind::Arrow(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_connector_mut(&mut self) -> Option<&mut Connector> {
        match &mut self.kind {
            ItemKind::Line(c) | ItemKind::Arrow(c) => Some(c),
            _ => None,
        }
    }

    /// Absolute coordinates of a connector endpoint.
    pub fn endpoint_position(&self, end: Endpoint) -> Option<Point> {
        let rel = self.as_connector()?.endpoint(end)?;
        Some(Point::new(rel.x + self.position.x, rel.y + self.position.y))
    }

    /// Write a connector endpoint from absolute coordinates.
    pub fn set_endpoint_position(&mut self, end: Endpoint, absolute: Point) -> bool {
        let origin = self.position;
        match self.as_connector_mut() {
            Some(c) => c.set_endpoint(end, Point::new(absolute.x - origin.x, absolute.y - origin.y)),
            None => false,
        }
    }

    pub fn has_attachment(&self, connector: ItemId) -> bool {
        self.attachments.iter().any(|a| a.connector == connector)
    }

    /// Record that `connector` is fixed to this item. Idempotent.
    pub fn add_attachment(&mut self, connector: ItemId) {
        if !self.has_attachment(connector) {
            self.attachments.push(Attachment { connector });
        }
    }

    pub fn remove_attachment(&mut self, connector: ItemId) {
        self.attachments.retain(|a| a.connector != connector);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_item_starts_at_version_one() {
        let item = Item::rectangle(Point::new(0.0, 0.0), Size::new(10.0, 10.0));
        assert_eq!(item.version(), 1);
        assert!(item.attachments.is_empty());
    }

    #[test]
    fn test_silhouette_per_variant() {
        let p = Point::ZERO;
        let s = Size::new(10.0, 10.0);
        assert_eq!(Item::rectangle(p, s).silhouette(), Some(Silhouette::Rectangle));
        assert_eq!(Item::circle(p, s).silhouette(), Some(Silhouette::Ellipse));
        assert_eq!(Item::diamond(p, s).silhouette(), Some(Silhouette::Diamond));
        assert_eq!(Item::text(p, s, "hi").silhouette(), Some(Silhouette::Rectangle));
        assert_eq!(Item::arrow(p, Point::new(5.0, 5.0)).silhouette(), None);
        let (origin, draw) = Draw::from_points(&[p, Point::new(3.0, 3.0)]);
        assert_eq!(Item::new(origin, ItemKind::Draw(draw)).silhouette(), None);
    }

    #[test]
    fn test_attachment_zone_is_inflated_bounds() {
        let item = Item::rectangle(Point::new(0.0, 0.0), Size::new(100.0, 100.0));
        let zone = item.attachment_zone(15.0).unwrap();
        assert_eq!(zone, Rect::new(-15.0, -15.0, 115.0, 115.0));
        assert!(Item::line(Point::ZERO, Point::new(1.0, 0.0)).attachment_zone(15.0).is_none());
    }

    #[test]
    fn test_endpoint_positions_are_absolute() {
        let mut arrow = Item::arrow(Point::new(200.0, 50.0), Point::new(300.0, 50.0));
        assert_eq!(arrow.endpoint_position(Endpoint::Tail), Some(Point::new(200.0, 50.0)));
        assert_eq!(arrow.endpoint_position(Endpoint::Head), Some(Point::new(300.0, 50.0)));

        assert!(arrow.set_endpoint_position(Endpoint::Tail, Point::new(190.0, 40.0)));
        assert_eq!(arrow.as_connector().unwrap().points[..2], [-10.0, -10.0]);
    }

    #[test]
    fn test_attachments_are_deduplicated() {
        let mut rect = Item::rectangle(Point::ZERO, Size::new(1.0, 1.0));
        let c = Uuid::new_v4();
        rect.add_attachment(c);
        rect.add_attachment(c);
        assert_eq!(rect.attachments.len(), 1);
        rect.remove_attachment(c);
        assert!(!rect.has_attachment(c));
    }

    #[test]
    fn test_json_shape() {
        let mut arrow = Item::arrow(Point::new(1.0, 2.0), Point::new(3.0, 4.0));
        let target = Uuid::new_v4();
        arrow.as_connector_mut().unwrap().set_reference(Endpoint::Tail, Some(target));

        let value = serde_json::to_value(&arrow).unwrap();
        assert_eq!(value["type"], "arrow");
        assert_eq!(value["position"]["x"], 1.0);
        assert_eq!(value["version"], 1);
        assert_eq!(value["points"], serde_json::json!([0.0, 0.0, 2.0, 2.0]));
        assert_eq!(value["tailConnector"]["connectedItemId"], target.to_string());
        assert!(value.get("headConnector").is_none());
        assert_eq!(value["strokeColor"], "#000000");

        let back: Item = serde_json::from_value(value).unwrap();
        assert_eq!(back, arrow);
    }

    #[test]
    fn test_rectangle_json_has_size() {
        let rect = Item::rectangle(Point::ZERO, Size::new(100.0, 50.0));
        let value = serde_json::to_value(&rect).unwrap();
        assert_eq!(value["type"], "rectangle");
        assert_eq!(value["size"]["width"], 100.0);
        assert_eq!(value["size"]["height"], 50.0);
    }
}
