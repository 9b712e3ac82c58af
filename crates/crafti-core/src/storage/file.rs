//! File-backed persistence for native platforms.
//!
//! Writes happen on a background thread so the caller never blocks on I/O.

use super::{Persistence, SaveCallback, StorageError, StorageResult};
use crate::board::BoardInfo;
use crate::items::Item;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::mpsc::{Sender, channel};
use std::thread::{self, JoinHandle};

const ITEMS_FILE: &str = "items.json";
const BOARD_FILE: &str = "board.json";

/// Commands sent to the writer thread.
enum SaveCommand {
    Items(Vec<Item>, SaveCallback),
    Board(BoardInfo, SaveCallback),
    Flush(Sender<()>),
    Shutdown,
}

/// Persists items and board settings as JSON files in one directory.
pub struct FileSaver {
    base_path: PathBuf,
    cmd_tx: Mutex<Sender<SaveCommand>>,
    thread: Option<JoinHandle<()>>,
}

impl FileSaver {
    /// Create a saver writing into `base_path`, creating the directory if needed.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("Failed to create storage directory: {}", e))
            })?;
        }

        let (cmd_tx, cmd_rx) = channel::<SaveCommand>();
        let dir = base_path.clone();
        let handle = thread::Builder::new()
            .name("crafti-saver".to_string())
            .spawn(move || {
                log::debug!("Saver thread writing to {}", dir.display());
                while let Ok(cmd) = cmd_rx.recv() {
                    match cmd {
                        SaveCommand::Items(items, done) => {
                            let result = serialize(&items)
                                .and_then(|json| write_atomic(&dir.join(ITEMS_FILE), &json));
                            report(result, "items", done);
                        }
                        SaveCommand::Board(board, done) => {
                            let result = serialize(&board)
                                .and_then(|json| write_atomic(&dir.join(BOARD_FILE), &json));
                            report(result, "board", done);
                        }
                        SaveCommand::Flush(ack) => {
                            let _ = ack.send(());
                        }
                        SaveCommand::Shutdown => break,
                    }
                }
                log::debug!("Saver thread exiting");
            })
            .map_err(|e| StorageError::Other(format!("Failed to spawn saver thread: {}", e)))?;

        Ok(Self {
            base_path,
            cmd_tx: Mutex::new(cmd_tx),
            thread: Some(handle),
        })
    }

    /// Create a saver in the default location.
    ///
    /// On Unix: `~/.local/share/crafti/boards/`
    /// On Windows: `%LOCALAPPDATA%\crafti\boards\`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;
        Self::new(base.join("crafti").join("boards"))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Block until every write queued so far has finished.
    pub fn flush(&self) -> StorageResult<()> {
        let (ack_tx, ack_rx) = channel();
        self.send(SaveCommand::Flush(ack_tx))
            .map_err(|_| StorageError::Other("Saver thread is gone".to_string()))?;
        ack_rx
            .recv()
            .map_err(|_| StorageError::Other("Saver thread is gone".to_string()))
    }

    /// Read back the last saved item set.
    pub fn load_items(&self) -> StorageResult<Vec<Item>> {
        let json = read(&self.base_path.join(ITEMS_FILE))?;
        serde_json::from_str(&json).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    /// Read back the last saved board info.
    pub fn load_board(&self) -> StorageResult<BoardInfo> {
        let json = read(&self.base_path.join(BOARD_FILE))?;
        serde_json::from_str(&json).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    /// Hand a command to the writer thread, giving it back if the thread is gone.
    fn send(&self, cmd: SaveCommand) -> Result<(), SaveCommand> {
        match self.cmd_tx.lock() {
            Ok(tx) => tx.send(cmd).map_err(|e| e.0),
            Err(_) => Err(cmd),
        }
    }

    fn fail(cmd: SaveCommand) {
        log::error!("Saver thread is not running");
        match cmd {
            SaveCommand::Items(_, done) | SaveCommand::Board(_, done) => done(false),
            SaveCommand::Flush(_) | SaveCommand::Shutdown => {}
        }
    }
}

impl Persistence for FileSaver {
    fn request_item_save(&self, items: Vec<Item>, done: SaveCallback) {
        if let Err(cmd) = self.send(SaveCommand::Items(items, done)) {
            Self::fail(cmd);
        }
    }

    fn request_board_save(&self, board: BoardInfo, done: SaveCallback) {
        if let Err(cmd) = self.send(SaveCommand::Board(board, done)) {
            Self::fail(cmd);
        }
    }
}

impl Drop for FileSaver {
    fn drop(&mut self) {
        let _ = self.send(SaveCommand::Shutdown);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

fn serialize<T: serde::Serialize>(value: &T) -> StorageResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| StorageError::Serialization(e.to_string()))
}

/// Write through a temp file so readers never see a half-written file.
fn write_atomic(path: &Path, contents: &str) -> StorageResult<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, contents)
        .map_err(|e| StorageError::Io(format!("Failed to write {}: {}", tmp.display(), e)))?;
    fs::rename(&tmp, path)
        .map_err(|e| StorageError::Io(format!("Failed to replace {}: {}", path.display(), e)))
}

fn read(path: &Path) -> StorageResult<String> {
    if !path.exists() {
        return Err(StorageError::NotFound(path.display().to_string()));
    }
    fs::read_to_string(path)
        .map_err(|e| StorageError::Io(format!("Failed to read {}: {}", path.display(), e)))
}

fn report(result: StorageResult<()>, what: &str, done: SaveCallback) {
    match result {
        Ok(()) => done(true),
        Err(e) => {
            log::error!("Failed to save {}: {}", what, e);
            done(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{BoardMode, BoardSettings};
    use kurbo::{Point, Size};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    #[test]
    fn test_file_saver_items_round_trip() {
        let dir = tempdir().unwrap();
        let saver = FileSaver::new(dir.path().to_path_buf()).unwrap();

        let items = vec![
            Item::rectangle(Point::new(0.0, 0.0), Size::new(100.0, 100.0)),
            Item::arrow(Point::new(200.0, 50.0), Point::new(300.0, 50.0)),
        ];
        let ok = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ok);
        saver.request_item_save(
            items.clone(),
            Box::new(move |success| {
                if success {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
            }),
        );
        saver.flush().unwrap();

        assert_eq!(ok.load(Ordering::SeqCst), 1);
        assert_eq!(saver.load_items().unwrap(), items);
    }

    #[test]
    fn test_file_saver_board_round_trip() {
        let dir = tempdir().unwrap();
        let saver = FileSaver::new(dir.path().to_path_buf()).unwrap();

        let mut board = BoardSettings::default();
        board.snap_to_grid = true;
        let info = BoardInfo {
            board,
            mode: BoardMode::Editor,
            items: None,
        };
        saver.request_board_save(info.clone(), Box::new(|ok| assert!(ok)));
        saver.flush().unwrap();

        assert_eq!(saver.load_board().unwrap(), info);
    }

    #[test]
    fn test_file_saver_not_found() {
        let dir = tempdir().unwrap();
        let saver = FileSaver::new(dir.path().join("nested")).unwrap();
        assert!(saver.base_path().exists());
        assert!(matches!(saver.load_items(), Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_file_saver_later_save_wins() {
        let dir = tempdir().unwrap();
        let saver = FileSaver::new(dir.path().to_path_buf()).unwrap();

        let first = vec![Item::circle(Point::ZERO, Size::new(10.0, 10.0))];
        saver.request_item_save(first, Box::new(|_| {}));
        saver.request_item_save(vec![], Box::new(|_| {}));
        saver.flush().unwrap();

        assert!(saver.load_items().unwrap().is_empty());
    }
}
