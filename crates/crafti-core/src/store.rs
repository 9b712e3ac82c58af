//! Canonical keyed collection of board items.

use crate::items::{Item, ItemId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The canonical item collection.
///
/// Items live in one id-keyed table; `z_order` records paint order (back to
/// front). Serialized as a flat JSON array in z-order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Item>", into = "Vec<Item>")]
pub struct ItemStore {
    items: HashMap<ItemId, Item>,
    z_order: Vec<ItemId>,
}

impl From<Vec<Item>> for ItemStore {
    fn from(items: Vec<Item>) -> Self {
        let mut store = Self::new();
        for item in items {
            store.insert(item);
        }
        store
    }
}

impl From<ItemStore> for Vec<Item> {
    fn from(mut store: ItemStore) -> Self {
        store
            .z_order
            .iter()
            .filter_map(|id| store.items.remove(id))
            .collect()
    }
}

impl ItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an item on top, or replace it in place if the id exists.
    pub fn insert(&mut self, item: Item) {
        let id = item.id();
        if self.items.insert(id, item).is_none() {
            self.z_order.push(id);
        }
    }

    /// Insert an item at paint position `index` (clamped to the top), or
    /// replace it in place if the id exists.
    pub fn insert_at(&mut self, item: Item, index: usize) {
        let id = item.id();
        if self.items.insert(id, item).is_none() {
            let index = index.min(self.z_order.len());
            self.z_order.insert(index, id);
        }
    }

    /// Replace an item only if its id is already present.
    /// Returns false (and stores nothing) for unknown ids.
    pub fn replace(&mut self, item: Item) -> bool {
        match self.items.get_mut(&item.id()) {
            Some(slot) => {
                *slot = item;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: ItemId) -> Option<Item> {
        self.z_order.retain(|&other| other != id);
        self.items.remove(&id)
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.get_mut(&id)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in z-order (back to front).
    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.z_order.iter().filter_map(|id| self.items.get(id))
    }

    /// Snapshot of every item in z-order.
    pub fn to_vec(&self) -> Vec<Item> {
        self.iter().cloned().collect()
    }

    /// Position in paint order (0 = bottom).
    pub fn z_index(&self, id: ItemId) -> Option<usize> {
        self.z_order.iter().position(|&other| other == id)
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.z_order.clear();
    }

    /// Serialize all items to a JSON array.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load items from a JSON array.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::{Point, Size};

    fn rect(x: f64) -> Item {
        Item::rectangle(Point::new(x, 0.0), Size::new(10.0, 10.0))
    }

    #[test]
    fn test_insert_and_remove() {
        let mut store = ItemStore::new();
        let a = rect(0.0);
        let id = a.id();
        store.insert(a);
        assert!(store.contains(id));
        assert_eq!(store.len(), 1);

        assert!(store.remove(id).is_some());
        assert!(store.is_empty());
        assert!(store.remove(id).is_none());
    }

    #[test]
    fn test_insert_existing_keeps_z_position() {
        let mut store = ItemStore::new();
        let a = rect(0.0);
        let b = rect(20.0);
        let (a_id, b_id) = (a.id(), b.id());
        store.insert(a.clone());
        store.insert(b);

        let mut moved = a;
        moved.position = Point::new(99.0, 0.0);
        store.insert(moved);

        assert_eq!(store.z_index(a_id), Some(0));
        assert_eq!(store.z_index(b_id), Some(1));
        assert_eq!(store.get(a_id).unwrap().position.x, 99.0);
    }

    #[test]
    fn test_insert_at_places_in_paint_order() {
        let mut store = ItemStore::new();
        let (a, b, c) = (rect(0.0), rect(10.0), rect(20.0));
        store.insert(a.clone());
        store.insert(c.clone());
        store.insert_at(b.clone(), 1);
        assert_eq!(store.z_index(b.id()), Some(1));
        assert_eq!(store.z_index(c.id()), Some(2));

        let d = rect(30.0);
        store.insert_at(d.clone(), 99);
        assert_eq!(store.z_index(d.id()), Some(3));

        store.insert_at(a.clone(), 3);
        assert_eq!(store.z_index(a.id()), Some(0));
    }

    #[test]
    fn test_replace_ignores_unknown_ids() {
        let mut store = ItemStore::new();
        assert!(!store.replace(rect(0.0)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_json_round_trip_preserves_order() {
        let mut store = ItemStore::new();
        let ids: Vec<_> = (0..3)
            .map(|i| {
                let item = rect(i as f64 * 20.0);
                let id = item.id();
                store.insert(item);
                id
            })
            .collect();

        let json = store.to_json().unwrap();
        let loaded = ItemStore::from_json(&json).unwrap();
        let loaded_ids: Vec<_> = loaded.iter().map(|i| i.id()).collect();
        assert_eq!(loaded_ids, ids);
        assert_eq!(loaded, store);
    }
}
