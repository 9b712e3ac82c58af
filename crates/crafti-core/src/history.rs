//! Linear undo/redo history.
//!
//! The history is a list of [`HistoryAction`]s plus the index of the last
//! applied one. Appending after an undo discards the redo branch; there is
//! no history tree.

use crate::items::{Item, ItemId};
use crate::store::ItemStore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use thiserror::Error;

/// Problems found in history read from outside the engine.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("History action has no snapshots")]
    EmptySnapshots,
    #[error("Update has {previous} previous but {current} current snapshots")]
    LengthMismatch { previous: usize, current: usize },
    #[error("Delete has {snapshots} snapshots but {indices} z-indices")]
    ZIndexMismatch { snapshots: usize, indices: usize },
    #[error("Update snapshot {0} has no counterpart")]
    Unpaired(ItemId),
    #[error("History index {index} out of range for {len} actions")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("Invalid history JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One undoable step.
///
/// `Create` carries only current snapshots, `Delete` only previous ones,
/// `Update` both, paired by id. `Delete` may also record where each item
/// sat in paint order so undo puts it back there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HistoryAction {
    Create {
        #[serde(rename = "currentSnapshots")]
        current: Vec<Item>,
    },
    Update {
        #[serde(rename = "previousSnapshots")]
        previous: Vec<Item>,
        #[serde(rename = "currentSnapshots")]
        current: Vec<Item>,
    },
    Delete {
        #[serde(rename = "previousSnapshots")]
        previous: Vec<Item>,
        #[serde(rename = "zIndices", default, skip_serializing_if = "Vec::is_empty")]
        z_indices: Vec<usize>,
    },
}

impl HistoryAction {
    pub fn create(items: Vec<Item>) -> Self {
        HistoryAction::Create { current: items }
    }

    pub fn delete(items: Vec<Item>) -> Self {
        HistoryAction::Delete {
            previous: items,
            z_indices: Vec::new(),
        }
    }

    /// A delete that remembers each item's z-index at removal time.
    pub fn delete_at(entries: impl IntoIterator<Item = (Item, usize)>) -> Self {
        let (previous, z_indices) = entries.into_iter().unzip();
        HistoryAction::Delete { previous, z_indices }
    }

    /// Build an update from `(previous, current)` pairs. Pairs whose ids
    /// differ are dropped.
    pub fn update(pairs: impl IntoIterator<Item = (Item, Item)>) -> Self {
        let (previous, current) = pairs
            .into_iter()
            .filter(|(prev, cur)| {
                let same = prev.id() == cur.id();
                if !same {
                    log::warn!("Dropping unpaired update snapshot {} -> {}", prev.id(), cur.id());
                }
                same
            })
            .unzip();
        HistoryAction::Update { previous, current }
    }

    /// Check the snapshot shape invariants.
    pub fn validate(&self) -> Result<(), HistoryError> {
        match self {
            HistoryAction::Create { current } => {
                if current.is_empty() {
                    return Err(HistoryError::EmptySnapshots);
                }
            }
            HistoryAction::Delete { previous, z_indices } => {
                if previous.is_empty() {
                    return Err(HistoryError::EmptySnapshots);
                }
                if !z_indices.is_empty() && z_indices.len() != previous.len() {
                    return Err(HistoryError::ZIndexMismatch {
                        snapshots: previous.len(),
                        indices: z_indices.len(),
                    });
                }
            }
            HistoryAction::Update { previous, current } => {
                if previous.is_empty() {
                    return Err(HistoryError::EmptySnapshots);
                }
                if previous.len() != current.len() {
                    return Err(HistoryError::LengthMismatch {
                        previous: previous.len(),
                        current: current.len(),
                    });
                }
                let before: HashSet<ItemId> = previous.iter().map(Item::id).collect();
                if let Some(stray) = current.iter().find(|c| !before.contains(&c.id())) {
                    return Err(HistoryError::Unpaired(stray.id()));
                }
            }
        }
        Ok(())
    }

    fn apply_undo(&self, store: &mut ItemStore) {
        match self {
            HistoryAction::Create { current } => {
                for item in current {
                    store.remove(item.id());
                }
            }
            HistoryAction::Update { previous, .. } => {
                for item in previous {
                    if !store.replace(item.clone()) {
                        log::warn!("Undo skipped missing item {}", item.id());
                    }
                }
            }
            HistoryAction::Delete { previous, z_indices } if z_indices.len() == previous.len() => {
                // Lowest slot first so each index is valid when it is used.
                let mut slots: Vec<(usize, &Item)> = z_indices.iter().copied().zip(previous).collect();
                slots.sort_by_key(|(index, _)| *index);
                for (index, item) in slots {
                    store.insert_at(item.clone(), index);
                }
            }
            HistoryAction::Delete { previous, .. } => {
                for item in previous {
                    store.insert(item.clone());
                }
            }
        }
    }

    fn apply_redo(&self, store: &mut ItemStore) {
        match self {
            HistoryAction::Create { current } => {
                for item in current {
                    store.insert(item.clone());
                }
            }
            HistoryAction::Update { current, .. } => {
                for item in current {
                    if !store.replace(item.clone()) {
                        log::warn!("Redo skipped missing item {}", item.id());
                    }
                }
            }
            HistoryAction::Delete { previous, .. } => {
                for item in previous {
                    store.remove(item.id());
                }
            }
        }
    }
}

/// The history index on the wire: `-1` when nothing is applied.
mod wire_index {
    use super::{Deserialize, Deserializer, Serializer};
    use serde::de;

    pub fn serialize<S: Serializer>(index: &Option<usize>, serializer: S) -> Result<S::Ok, S::Error> {
        match index {
            Some(i) => serializer.serialize_u64(*i as u64),
            None => serializer.serialize_i64(-1),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<usize>, D::Error> {
        match Option::<i64>::deserialize(deserializer)? {
            None | Some(-1) => Ok(None),
            Some(i) => usize::try_from(i)
                .map(Some)
                .map_err(|_| de::Error::custom(format!("invalid history index {}", i))),
        }
    }
}

/// Linear, truncating action log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    actions: Vec<HistoryAction>,
    /// Index of the last applied action (`None` = nothing applied).
    #[serde(default, with = "wire_index")]
    index: Option<usize>,
    /// Maximum number of actions kept (`None` = unbounded).
    #[serde(skip)]
    limit: Option<usize>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// A history that drops its oldest actions beyond `limit`.
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            limit: limit.filter(|&l| l > 0),
            ..Self::default()
        }
    }

    /// Append an action, discarding everything past the current index first.
    pub fn append(&mut self, action: HistoryAction) {
        let keep = self.index.map_or(0, |i| i + 1);
        if keep < self.actions.len() {
            log::debug!("Discarding {} redo actions", self.actions.len() - keep);
            self.actions.truncate(keep);
        }
        self.actions.push(action);

        if let Some(limit) = self.limit {
            if self.actions.len() > limit {
                let excess = self.actions.len() - limit;
                self.actions.drain(..excess);
            }
        }
        self.index = Some(self.actions.len() - 1);
    }

    /// Revert the action at the current index. Returns false when there is
    /// nothing to undo.
    pub fn undo(&mut self, store: &mut ItemStore) -> bool {
        let Some(index) = self.index else {
            return false;
        };
        let Some(action) = self.actions.get(index) else {
            return false;
        };
        action.apply_undo(store);
        self.index = index.checked_sub(1);
        log::debug!("Undo: index now {:?}", self.index);
        true
    }

    /// Re-apply the action after the current index. Returns false when
    /// already at the newest action.
    pub fn redo(&mut self, store: &mut ItemStore) -> bool {
        let next = self.index.map_or(0, |i| i + 1);
        let Some(action) = self.actions.get(next) else {
            return false;
        };
        action.apply_redo(store);
        self.index = Some(next);
        log::debug!("Redo: index now {:?}", self.index);
        true
    }

    pub fn can_undo(&self) -> bool {
        self.index.is_some()
    }

    pub fn can_redo(&self) -> bool {
        self.index.map_or(0, |i| i + 1) < self.actions.len()
    }

    /// Index of the last applied action.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn actions(&self) -> &[HistoryAction] {
        &self.actions
    }

    pub fn clear(&mut self) {
        self.actions.clear();
        self.index = None;
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Load and validate a persisted history.
    pub fn from_json(json: &str) -> Result<Self, HistoryError> {
        let history: History = serde_json::from_str(json)?;
        for action in &history.actions {
            action.validate()?;
        }
        if let Some(index) = history.index {
            if index >= history.actions.len() {
                return Err(HistoryError::IndexOutOfRange {
                    index,
                    len: history.actions.len(),
                });
            }
        }
        Ok(history)
    }
}
