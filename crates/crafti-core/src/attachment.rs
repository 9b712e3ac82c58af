//! Bidirectional links between connectors and the shapes they attach to.
//!
//! A connector endpoint references a shape through its head/tail
//! [`ConnectorRef`](crate::items::ConnectorRef); the shape mirrors that with
//! an [`Attachment`](crate::items::Attachment) naming the connector. Both
//! sides are plain ids into the item store.

use crate::geometry::{self, ATTACHMENT_ZONE_MARGIN};
use crate::items::{Endpoint, Item, ItemId};
use crate::store::ItemStore;
use kurbo::Point;
use std::collections::HashMap;

/// Recompute the endpoints of every connector attached to `shape`, as if
/// the shape stood at `new_position` (with its current size).
///
/// `connectors` is the working set to rewrite, keyed by id. Attachments
/// naming a connector outside the set, or one that does not actually
/// reference `shape`, are skipped. Returns the ids of rewritten connectors.
pub fn on_shape_moved(
    shape: &Item,
    new_position: Point,
    connectors: &mut HashMap<ItemId, Item>,
) -> Vec<ItemId> {
    let (Some(silhouette), Some(bounds)) = (shape.silhouette(), shape.bounds_at(new_position)) else {
        return Vec::new();
    };

    let mut updated = Vec::new();
    for attachment in &shape.attachments {
        let Some(connector) = connectors.get_mut(&attachment.connector) else {
            log::debug!("Attachment {} on {} has no connector", attachment.connector, shape.id());
            continue;
        };
        let Some(end) = connector.as_connector().and_then(|c| c.endpoint_fixed_to(shape.id())) else {
            log::warn!("Stale attachment: {} does not reference {}", connector.id(), shape.id());
            continue;
        };
        let Some(origin) = connector.endpoint_position(end.opposite()) else {
            continue;
        };
        match geometry::connector_point(silhouette, bounds, origin) {
            Some(point) => {
                connector.set_endpoint_position(end, point);
                updated.push(connector.id());
            }
            None => {
                log::warn!(
                    "No boundary intersection for {} on {}, keeping previous endpoint",
                    connector.id(),
                    shape.id()
                );
            }
        }
    }
    updated
}

/// The shape whose attachment zone the anchor at `point` falls in.
///
/// When several zones overlap the anchor box, the shape whose center is
/// nearest `point` wins; equal distances go to the topmost item.
pub fn zone_under(point: Point, exclude: ItemId, store: &ItemStore) -> Option<&Item> {
    let hit = geometry::anchor_hit_box(point);
    let mut best: Option<(&Item, f64)> = None;
    for item in store.iter() {
        if item.id() == exclude {
            continue;
        }
        let Some(zone) = item.attachment_zone(ATTACHMENT_ZONE_MARGIN) else {
            continue;
        };
        if !geometry::rect_overlap(zone, hit) {
            continue;
        }
        let distance = zone.center().distance(point);
        // Later items are painted on top, so they win ties.
        if best.is_none_or(|(_, d)| distance <= d) {
            best = Some((item, distance));
        }
    }
    best.map(|(item, _)| item)
}

/// What an anchor drop did to the connector's link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorTransition {
    Attached(ItemId),
    Detached(ItemId),
    Unchanged,
}

/// Result of [`on_anchor_drag_end`]: the items to commit together.
#[derive(Debug, Clone)]
pub struct AnchorDrop {
    /// The connector with its final endpoint and updated reference.
    pub connector: Item,
    /// `(previous, current)` for the shape gaining or losing an attachment.
    pub shape: Option<(Item, Item)>,
    pub transition: AnchorTransition,
}

/// Resolve an anchor drop: attach to the zone under the anchor, detach
/// from the previous shape, or leave the link alone.
///
/// `connector` is the dragged connector with its endpoint already at
/// `final_position`. Nothing in `store` is modified; the caller commits
/// the returned items as one update. A link to an item that is no longer
/// in the store is released before the drop is resolved.
pub fn on_anchor_drag_end(
    connector: &Item,
    end: Endpoint,
    final_position: Point,
    store: &ItemStore,
) -> AnchorDrop {
    let mut connector = connector.clone();
    let mut current = connector.as_connector().and_then(|c| c.reference(end));
    let mut released = None;
    if let Some(old) = current.filter(|old| !store.contains(*old)) {
        log::warn!("Releasing {:?} of {} from missing item {}", end, connector.id(), old);
        if let Some(c) = connector.as_connector_mut() {
            c.set_reference(end, None);
        }
        current = None;
        released = Some(old);
    }
    let target = zone_under(final_position, connector.id(), store);

    match (current, target) {
        (None, Some(shape)) => {
            if let Some(c) = connector.as_connector_mut() {
                c.set_reference(end, Some(shape.id()));
            }
            // The other end may already hold this shape's attachment.
            let shape_update = (!shape.has_attachment(connector.id())).then(|| {
                let mut attached = shape.clone();
                attached.add_attachment(connector.id());
                (shape.clone(), attached)
            });
            log::debug!("Attached {:?} of {} to {}", end, connector.id(), shape.id());
            AnchorDrop {
                connector,
                shape: shape_update,
                transition: AnchorTransition::Attached(shape.id()),
            }
        }
        (Some(old), None) => {
            if let Some(c) = connector.as_connector_mut() {
                c.set_reference(end, None);
            }
            // Keep the attachment while the other end still references the shape.
            let still_linked = connector.as_connector().is_some_and(|c| c.references(old));
            let shape = store
                .get(old)
                .filter(|shape| !still_linked && shape.has_attachment(connector.id()))
                .map(|shape| {
                    let mut detached = shape.clone();
                    detached.remove_attachment(connector.id());
                    (shape.clone(), detached)
                });
            log::debug!("Detached {:?} of {} from {}", end, connector.id(), old);
            AnchorDrop {
                connector,
                shape,
                transition: AnchorTransition::Detached(old),
            }
        }
        (None, None) => AnchorDrop {
            connector,
            shape: None,
            transition: released.map_or(AnchorTransition::Unchanged, AnchorTransition::Detached),
        },
        (Some(_), Some(_)) => AnchorDrop {
            connector,
            shape: None,
            transition: AnchorTransition::Unchanged,
        },
    }
}

/// Connectors reachable from `shape` through its attachments.
pub fn attached_connectors<'a>(shape: &Item, store: &'a ItemStore) -> Vec<&'a Item> {
    shape
        .attachments
        .iter()
        .filter_map(|a| store.get(a.connector))
        .filter(|c| c.is_connector())
        .collect()
}

/// A broken half of a shape/connector link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymmetryViolation {
    /// The shape lists the connector, but neither end references the shape.
    MissingReference { shape: ItemId, connector: ItemId },
    /// A connector end references the shape, which does not list it.
    MissingAttachment { connector: ItemId, shape: ItemId },
}

/// Outcome of [`check_symmetry`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymmetryReport {
    pub violations: Vec<SymmetryViolation>,
    /// `(holder, missing)` pairs: links naming items that are not in the store.
    pub dangling: Vec<(ItemId, ItemId)>,
}

impl SymmetryReport {
    pub fn is_consistent(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Verify that shape S lists connector C iff C's head or tail references S.
pub fn check_symmetry(store: &ItemStore) -> SymmetryReport {
    let mut report = SymmetryReport::default();
    for item in store.iter() {
        for attachment in &item.attachments {
            match store.get(attachment.connector) {
                None => report.dangling.push((item.id(), attachment.connector)),
                Some(connector) => {
                    let linked = connector.as_connector().is_some_and(|c| c.references(item.id()));
                    if !linked {
                        report.violations.push(SymmetryViolation::MissingReference {
                            shape: item.id(),
                            connector: connector.id(),
                        });
                    }
                }
            }
        }

        let Some(connector) = item.as_connector() else {
            continue;
        };
        for end in [Endpoint::Tail, Endpoint::Head] {
            let Some(target) = connector.reference(end) else {
                continue;
            };
            match store.get(target) {
                None => report.dangling.push((item.id(), target)),
                Some(shape) if !shape.has_attachment(item.id()) => {
                    report.violations.push(SymmetryViolation::MissingAttachment {
                        connector: item.id(),
                        shape: target,
                    });
                }
                Some(_) => {}
            }
        }
    }
    report
}
