//! In-memory persistence for tests and ephemeral boards.

use super::{Persistence, SaveCallback};
use crate::board::BoardInfo;
use crate::items::Item;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// Records every save request and completes it synchronously.
#[derive(Debug, Default)]
pub struct MemorySaver {
    item_saves: RwLock<Vec<Vec<Item>>>,
    board_saves: RwLock<Vec<BoardInfo>>,
    fail: AtomicBool,
}

impl MemorySaver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent saves report failure.
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn item_saves(&self) -> Vec<Vec<Item>> {
        self.item_saves.read().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn board_saves(&self) -> Vec<BoardInfo> {
        self.board_saves.read().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut saves) = self.item_saves.write() {
            saves.clear();
        }
        if let Ok(mut saves) = self.board_saves.write() {
            saves.clear();
        }
    }
}

impl Persistence for MemorySaver {
    fn request_item_save(&self, items: Vec<Item>, done: SaveCallback) {
        if self.fail.load(Ordering::SeqCst) {
            done(false);
            return;
        }
        let ok = match self.item_saves.write() {
            Ok(mut saves) => {
                saves.push(items);
                true
            }
            Err(_) => false,
        };
        done(ok);
    }

    fn request_board_save(&self, board: BoardInfo, done: SaveCallback) {
        if self.fail.load(Ordering::SeqCst) {
            done(false);
            return;
        }
        let ok = match self.board_saves.write() {
            Ok(mut saves) => {
                saves.push(board);
                true
            }
            Err(_) => false,
        };
        done(ok);
    }
}
