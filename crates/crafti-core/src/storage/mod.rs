//! Persistence collaborator: the editor hands over item and board saves
//! and is told once, through a callback, whether each save succeeded.

mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod file;

pub use memory::MemorySaver;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileSaver;

use crate::board::BoardInfo;
use crate::items::Item;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Completion callback for a save request. Called exactly once with the
/// outcome; failures are reported, never retried.
pub type SaveCallback = Box<dyn FnOnce(bool) + Send + 'static>;

/// Status shown to the user for outstanding saves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveStatus {
    #[default]
    Saved,
    Pending,
    Failure,
}

/// Persistence backend. Implementations may complete synchronously or on
/// another thread.
pub trait Persistence: Send + Sync {
    /// Persist the given items (created, updated or deleted by one commit).
    fn request_item_save(&self, items: Vec<Item>, done: SaveCallback);

    /// Persist board settings.
    fn request_board_save(&self, board: BoardInfo, done: SaveCallback);
}

#[derive(Debug, Default)]
struct SaveState {
    status: SaveStatus,
    in_flight: usize,
}

/// Tracks the aggregate status of save requests.
#[derive(Debug, Clone, Default)]
pub struct SaveTracker {
    state: Arc<Mutex<SaveState>>,
}

impl SaveTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> SaveStatus {
        self.state
            .lock()
            .map(|s| s.status)
            .unwrap_or(SaveStatus::Failure)
    }

    pub fn in_flight(&self) -> usize {
        self.state.lock().map(|s| s.in_flight).unwrap_or(0)
    }

    /// Mark a save as started and return the callback that completes it.
    pub fn begin(&self, what: &'static str) -> SaveCallback {
        if let Ok(mut state) = self.state.lock() {
            state.in_flight += 1;
            // A failure stays visible until acknowledged.
            if state.status != SaveStatus::Failure {
                state.status = SaveStatus::Pending;
            }
        }
        let state = Arc::clone(&self.state);
        Box::new(move |ok| {
            let Ok(mut state) = state.lock() else {
                log::error!("Save status lock poisoned");
                return;
            };
            state.in_flight = state.in_flight.saturating_sub(1);
            if ok {
                log::debug!("{} save finished", what);
                if state.in_flight == 0 && state.status != SaveStatus::Failure {
                    state.status = SaveStatus::Saved;
                }
            } else {
                log::error!("{} save failed", what);
                state.status = SaveStatus::Failure;
            }
        })
    }

    /// Clear a sticky failure once the user has seen it.
    pub fn acknowledge(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.status = if state.in_flight > 0 {
                SaveStatus::Pending
            } else {
                SaveStatus::Saved
            };
        }
    }
}
