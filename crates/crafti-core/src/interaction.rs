//! Gesture state machine: live preview on a shadow copy, one atomic
//! commit at the end.
//!
//! ```text
//! Idle --start--> Dragging(Move | Transform | Anchor) --end--> Idle
//! ```
//!
//! The item store is only read while a gesture is live. Everything the
//! render layer sees move during the drag lives in the shadow, and
//! [`Interaction::end`] writes the final state back as a single update.

use crate::attachment::{self, AnchorTransition};
use crate::board::BoardSettings;
use crate::history::{History, HistoryAction};
use crate::items::{Endpoint, Item, ItemId};
use crate::store::ItemStore;
use crate::throttle::{Duration, Instant, Throttle};
use kurbo::{Point, Size};
use std::collections::HashMap;

/// What a gesture manipulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    /// Drag a whole item.
    Move,
    /// Resize (and possibly reposition) an area item.
    Transform,
    /// Drag one endpoint of a line or arrow.
    Anchor(Endpoint),
}

/// Current state of the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionState {
    Idle,
    Dragging { item: ItemId, kind: GestureKind },
}

/// Geometry reported by the render layer during a gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LiveUpdate {
    Move(Point),
    Transform { position: Point, size: Size },
    /// Absolute position of the dragged endpoint.
    Anchor(Point),
}

#[derive(Debug, Clone)]
struct Gesture {
    kind: GestureKind,
    shadow: Item,
    /// Shadows of connectors attached to the item (move/transform only).
    connectors: HashMap<ItemId, Item>,
    /// Store snapshots taken at start; the item first, then its connectors.
    previous: Vec<Item>,
    hovered: Option<ItemId>,
}

/// Drives one gesture at a time.
#[derive(Debug, Clone)]
pub struct Interaction {
    gesture: Option<Gesture>,
    throttle: Throttle<LiveUpdate>,
}

impl Default for Interaction {
    fn default() -> Self {
        Self {
            gesture: None,
            throttle: Throttle::default(),
        }
    }
}

impl Interaction {
    /// A machine applying at most one live update per `interval`.
    pub fn new(interval: Duration) -> Self {
        Self {
            gesture: None,
            throttle: Throttle::new(interval),
        }
    }

    pub fn state(&self) -> InteractionState {
        match &self.gesture {
            None => InteractionState::Idle,
            Some(g) => InteractionState::Dragging {
                item: g.shadow.id(),
                kind: g.kind,
            },
        }
    }

    pub fn is_idle(&self) -> bool {
        self.gesture.is_none()
    }

    /// Begin a gesture on `id`, snapshotting it and every connector
    /// reachable through its attachments.
    ///
    /// Returns false if a gesture is already live, the item is missing, or
    /// the gesture does not apply to the item.
    pub fn start(&mut self, id: ItemId, kind: GestureKind, store: &ItemStore) -> bool {
        if let Some(g) = &self.gesture {
            log::warn!("Gesture on {} ignored, {} is still being dragged", id, g.shadow.id());
            return false;
        }
        let Some(item) = store.get(id) else {
            log::warn!("Cannot start gesture on missing item {}", id);
            return false;
        };
        let applicable = match kind {
            GestureKind::Move => true,
            GestureKind::Transform => item.size().is_some(),
            GestureKind::Anchor(end) => item.endpoint_position(end).is_some(),
        };
        if !applicable {
            log::warn!("{:?} does not apply to {} {}", kind, item.type_name(), id);
            return false;
        }

        let mut previous = vec![item.clone()];
        let mut connectors = HashMap::new();
        if !matches!(kind, GestureKind::Anchor(_)) {
            for connector in attachment::attached_connectors(item, store) {
                if connectors.insert(connector.id(), connector.clone()).is_none() {
                    previous.push(connector.clone());
                }
            }
        }

        log::debug!("Start {:?} on {} ({} connectors)", kind, id, connectors.len());
        self.throttle.reset();
        self.gesture = Some(Gesture {
            kind,
            shadow: item.clone(),
            connectors,
            previous,
            hovered: None,
        });
        true
    }

    /// The item as currently previewed.
    pub fn shadow(&self) -> Option<&Item> {
        self.gesture.as_ref().map(|g| &g.shadow)
    }

    /// Previewed state of the connectors tracking the dragged item.
    pub fn connector_shadows(&self) -> impl Iterator<Item = &Item> {
        self.gesture.iter().flat_map(|g| g.connectors.values())
    }

    /// The shape whose attachment zone the dragged anchor currently overlaps.
    pub fn hovered_zone(&self) -> Option<ItemId> {
        self.gesture.as_ref().and_then(|g| g.hovered)
    }

    /// Feed a live update at `now`. The first update in a throttle window is
    /// applied at once; later ones in the same window coalesce into a
    /// trailing update released by [`poll`](Self::poll) or [`end`](Self::end).
    /// Returns whether the shadow changed.
    pub fn live_update(
        &mut self,
        update: LiveUpdate,
        now: Instant,
        store: &ItemStore,
        settings: &BoardSettings,
    ) -> bool {
        if self.gesture.is_none() {
            return false;
        }
        match self.throttle.offer(update, now) {
            Some(update) => self.apply(update, store, settings),
            None => false,
        }
    }

    /// [`live_update`](Self::live_update) stamped with the current time.
    pub fn live_update_now(&mut self, update: LiveUpdate, store: &ItemStore, settings: &BoardSettings) -> bool {
        self.live_update(update, Instant::now(), store, settings)
    }

    /// Apply the trailing update once its throttle window has passed.
    pub fn poll(&mut self, now: Instant, store: &ItemStore, settings: &BoardSettings) -> bool {
        if self.gesture.is_none() {
            return false;
        }
        match self.throttle.poll(now) {
            Some(update) => self.apply(update, store, settings),
            None => false,
        }
    }

    fn apply(&mut self, update: LiveUpdate, store: &ItemStore, settings: &BoardSettings) -> bool {
        let Some(g) = self.gesture.as_mut() else {
            return false;
        };
        match (g.kind, update) {
            (GestureKind::Move, LiveUpdate::Move(position)) => {
                g.shadow.position = settings.snap(position);
            }
            (GestureKind::Transform, LiveUpdate::Transform { position, size }) => {
                g.shadow.position = settings.snap(position);
                g.shadow.set_size(size);
            }
            (GestureKind::Anchor(end), LiveUpdate::Anchor(point)) => {
                let point = settings.snap(point);
                g.shadow.set_endpoint_position(end, point);
                g.hovered = attachment::zone_under(point, g.shadow.id(), store).map(Item::id);
                return true;
            }
            (kind, update) => {
                log::warn!("Ignoring {:?} during {:?}", update, kind);
                return false;
            }
        }
        attachment::on_shape_moved(&g.shadow, g.shadow.position, &mut g.connectors);
        true
    }

    /// Drop the live gesture without committing. The store was never
    /// touched; the start snapshots are returned for callers that mirrored
    /// the preview elsewhere.
    pub fn abandon(&mut self) -> Vec<Item> {
        self.throttle.reset();
        self.gesture.take().map(|g| g.previous).unwrap_or_default()
    }

    /// Commit the gesture: flush the trailing update, snap, bump versions,
    /// write the item and its connectors to the store and append one update
    /// action to `history`.
    ///
    /// Returns the committed items, or `None` when no gesture was live.
    pub fn end(
        &mut self,
        store: &mut ItemStore,
        history: &mut History,
        settings: &BoardSettings,
    ) -> Option<Vec<Item>> {
        if self.gesture.is_none() {
            return None;
        }
        if let Some(update) = self.throttle.flush() {
            self.apply(update, store, settings);
        }
        self.throttle.reset();
        let Gesture {
            kind,
            mut shadow,
            mut connectors,
            previous,
            ..
        } = self.gesture.take()?;

        let mut pairs: Vec<(Item, Item)> = Vec::with_capacity(previous.len() + 1);
        match kind {
            GestureKind::Move | GestureKind::Transform => {
                let snapped = settings.snap(shadow.position);
                if snapped != shadow.position {
                    shadow.position = snapped;
                    attachment::on_shape_moved(&shadow, snapped, &mut connectors);
                }
                let mut previous = previous.into_iter();
                if let Some(prev) = previous.next() {
                    pairs.push((prev, shadow));
                }
                for prev in previous {
                    if let Some(current) = connectors.remove(&prev.id()) {
                        pairs.push((prev, current));
                    }
                }
            }
            GestureKind::Anchor(end) => {
                let Some(point) = shadow.endpoint_position(end) else {
                    return None;
                };
                let point = settings.snap(point);
                shadow.set_endpoint_position(end, point);
                let outcome = attachment::on_anchor_drag_end(&shadow, end, point, store);
                if let AnchorTransition::Attached(shape) | AnchorTransition::Detached(shape) = outcome.transition {
                    log::debug!("Anchor commit on {} changed link with {}", shadow.id(), shape);
                }
                if let Some(prev) = previous.into_iter().next() {
                    pairs.push((prev, outcome.connector));
                }
                if let Some(shape) = outcome.shape {
                    pairs.push(shape);
                }
            }
        }

        pairs.retain(|(prev, _)| {
            let present = store.contains(prev.id());
            if !present {
                log::warn!("Item {} vanished during gesture, not committing it", prev.id());
            }
            present
        });
        if pairs.is_empty() {
            return None;
        }
        for (_, current) in pairs.iter_mut() {
            current.bump_version();
        }

        let committed: Vec<Item> = pairs.iter().map(|(_, current)| current.clone()).collect();
        for item in &committed {
            store.replace(item.clone());
        }
        history.append(HistoryAction::update(pairs));
        log::debug!("Committed {:?}: {} items", kind, committed.len());
        Some(committed)
    }
}
