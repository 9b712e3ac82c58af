//! Connector payload shared by lines and arrows.

use super::ItemId;
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// One end of a connector.
///
/// The tail is the first coordinate pair of `points`, the head the last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    Tail,
    Head,
}

impl Endpoint {
    /// Map an anchor handle index (0 = tail, 1 = head).
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Endpoint::Tail),
            1 => Some(Endpoint::Head),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Endpoint::Tail => 0,
            Endpoint::Head => 1,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Endpoint::Tail => Endpoint::Head,
            Endpoint::Head => Endpoint::Tail,
        }
    }
}

/// Reference from a connector endpoint to the shape it is fixed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorRef {
    pub connected_item_id: ItemId,
}

/// A line or arrow.
///
/// `points` is a flat `[x0, y0, x1, y1, ...]` list relative to the
/// item's position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connector {
    pub points: Vec<f64>,
    #[serde(default)]
    pub has_arrow_tail: bool,
    #[serde(default)]
    pub has_arrow_head: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_connector: Option<ConnectorRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tail_connector: Option<ConnectorRef>,
}

impl Connector {
    /// A straight connector from `tail` to `head` (relative coordinates).
    pub fn new(tail: Point, head: Point) -> Self {
        Self {
            points: vec![tail.x, tail.y, head.x, head.y],
            has_arrow_tail: false,
            has_arrow_head: false,
            head_connector: None,
            tail_connector: None,
        }
    }

    fn offset(&self, end: Endpoint) -> Option<usize> {
        if self.points.len() < 4 {
            return None;
        }
        Some(match end {
            Endpoint::Tail => 0,
            Endpoint::Head => self.points.len() - 2 - self.points.len() % 2,
        })
    }

    /// Endpoint coordinates relative to the connector's position.
    pub fn endpoint(&self, end: Endpoint) -> Option<Point> {
        let i = self.offset(end)?;
        Some(Point::new(self.points[i], self.points[i + 1]))
    }

    /// Overwrite an endpoint (relative coordinates). Returns false when
    /// the point list is too short to hold both ends.
    pub fn set_endpoint(&mut self, end: Endpoint, point: Point) -> bool {
        match self.offset(end) {
            Some(i) => {
                self.points[i] = point.x;
                self.points[i + 1] = point.y;
                true
            }
            None => false,
        }
    }

    /// Id of the shape the given end is fixed to.
    pub fn reference(&self, end: Endpoint) -> Option<ItemId> {
        let slot = match end {
            Endpoint::Tail => &self.tail_connector,
            Endpoint::Head => &self.head_connector,
        };
        slot.map(|r| r.connected_item_id)
    }

    pub fn set_reference(&mut self, end: Endpoint, target: Option<ItemId>) {
        let slot = match end {
            Endpoint::Tail => &mut self.tail_connector,
            Endpoint::Head => &mut self.head_connector,
        };
        *slot = target.map(|connected_item_id| ConnectorRef { connected_item_id });
    }

    /// Which end (if any) is fixed to `shape`. The head wins when both are.
    pub fn endpoint_fixed_to(&self, shape: ItemId) -> Option<Endpoint> {
        if self.reference(Endpoint::Head) == Some(shape) {
            Some(Endpoint::Head)
        } else if self.reference(Endpoint::Tail) == Some(shape) {
            Some(Endpoint::Tail)
        } else {
            None
        }
    }

    /// Whether either end references `shape`.
    pub fn references(&self, shape: ItemId) -> bool {
        self.reference(Endpoint::Head) == Some(shape) || self.reference(Endpoint::Tail) == Some(shape)
    }

    pub fn clear_references(&mut self) {
        self.head_connector = None;
        self.tail_connector = None;
    }
}
