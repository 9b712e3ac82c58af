//! Crafti Core Library
//!
//! Item graph and interaction engine for the Crafti diagram editor: the
//! item model, connector geometry, shape/connector attachments, gesture
//! handling and linear undo/redo.

pub mod attachment;
pub mod board;
pub mod config;
pub mod editor;
pub mod geometry;
pub mod history;
pub mod interaction;
pub mod items;
pub mod snap;
pub mod storage;
pub mod store;
pub mod throttle;

pub use attachment::{AnchorDrop, AnchorTransition, SymmetryReport, SymmetryViolation, check_symmetry};
pub use board::{BoardInfo, BoardMode, BoardSettings, Theme};
pub use config::{ConfigError, EngineConfig};
pub use editor::{Editor, PASTE_OFFSET};
pub use history::{History, HistoryAction, HistoryError};
pub use interaction::{GestureKind, Interaction, InteractionState, LiveUpdate};
pub use items::{Attachment, Connector, ConnectorRef, Endpoint, Item, ItemId, ItemKind, Silhouette};
pub use snap::{SnapResult, snap_point, snap_to_grid};
pub use storage::{MemorySaver, Persistence, SaveCallback, SaveStatus, SaveTracker, StorageError, StorageResult};
pub use store::ItemStore;
pub use throttle::Throttle;

#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileSaver;
