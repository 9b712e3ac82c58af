//! Editor facade: the item store, history, gesture machine and
//! persistence collaborator behind one set of operations.
//!
//! Every operation that changes items appends exactly one history action
//! and then hands the full item set to the persistence collaborator. The
//! save runs fire-and-forget; its outcome only updates [`SaveStatus`].

use crate::attachment::{self, SymmetryReport};
use crate::board::{BoardInfo, BoardMode, BoardSettings};
use crate::config::EngineConfig;
use crate::history::{History, HistoryAction};
use crate::interaction::{GestureKind, Interaction, InteractionState, LiveUpdate};
use crate::items::{Endpoint, Item, ItemId};
use crate::storage::{Persistence, SaveStatus, SaveTracker};
use crate::store::ItemStore;
use crate::throttle::Instant;
use kurbo::Vec2;

/// Default paste offset from the copied item.
pub const PASTE_OFFSET: Vec2 = Vec2::new(20.0, 20.0);

pub struct Editor<P: Persistence> {
    store: ItemStore,
    history: History,
    interaction: Interaction,
    board: BoardSettings,
    mode: BoardMode,
    clipboard: Option<Item>,
    selection: Option<ItemId>,
    saves: SaveTracker,
    persistence: P,
}

impl<P: Persistence> Editor<P> {
    pub fn new(persistence: P, config: &EngineConfig) -> Self {
        Self {
            store: ItemStore::new(),
            history: History::with_limit(config.history_limit),
            interaction: Interaction::new(config.live_update_interval()),
            board: BoardSettings::default(),
            mode: BoardMode::default(),
            clipboard: None,
            selection: None,
            saves: SaveTracker::new(),
            persistence,
        }
    }

    /// Replace the board contents with already-validated items. Clears
    /// history and selection; nothing is persisted.
    pub fn load(&mut self, items: Vec<Item>, board: BoardSettings) {
        self.interaction.abandon();
        self.store.clear();
        for item in items {
            self.store.insert(item);
        }
        self.history.clear();
        self.selection = None;
        self.board = board;
        log::debug!("Loaded board {:?} with {} items", self.board.name, self.store.len());
    }

    pub fn store(&self) -> &ItemStore {
        &self.store
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn board(&self) -> &BoardSettings {
        &self.board
    }

    pub fn mode(&self) -> BoardMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: BoardMode) {
        self.mode = mode;
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    pub fn save_status(&self) -> SaveStatus {
        self.saves.status()
    }

    pub fn selection(&self) -> Option<ItemId> {
        self.selection
    }

    /// Select an item. Unknown ids clear the selection.
    pub fn select(&mut self, id: Option<ItemId>) {
        self.selection = id.filter(|id| self.store.contains(*id));
    }

    pub fn clipboard(&self) -> Option<&Item> {
        self.clipboard.as_ref()
    }

    fn editable(&self, op: &str) -> bool {
        if self.mode != BoardMode::Editor {
            log::warn!("{} ignored in {:?} mode", op, self.mode);
            return false;
        }
        if !self.interaction.is_idle() {
            log::warn!("{} ignored while a gesture is live", op);
            return false;
        }
        true
    }

    fn persist_items(&self) {
        let done = self.saves.begin("Item");
        self.persistence.request_item_save(self.store.to_vec(), done);
    }

    fn forget_missing_selection(&mut self) {
        if self.selection.is_some_and(|id| !self.store.contains(id)) {
            self.selection = None;
        }
    }

    /// Place a new item at version 1. Returns its id.
    pub fn create(&mut self, mut item: Item) -> Option<ItemId> {
        if !self.editable("Create") {
            return None;
        }
        if self.store.contains(item.id()) {
            log::warn!("Item {} already exists", item.id());
            return None;
        }
        item.version = 1;
        let id = item.id();
        self.store.insert(item.clone());
        self.history.append(HistoryAction::create(vec![item]));
        self.persist_items();
        Some(id)
    }

    /// Delete an item. Links other items hold to it are left in place and
    /// become inert until the delete is undone.
    pub fn remove(&mut self, id: ItemId) -> Option<Item> {
        if !self.editable("Remove") {
            return None;
        }
        let z_index = self.store.z_index(id)?;
        let item = self.store.remove(id)?;
        self.history.append(HistoryAction::delete_at([(item.clone(), z_index)]));
        self.selection = None;
        self.persist_items();
        Some(item)
    }

    /// Copy an item to the clipboard.
    pub fn copy(&mut self, id: ItemId) -> bool {
        match self.store.get(id) {
            Some(item) => {
                self.clipboard = Some(item.clone());
                true
            }
            None => false,
        }
    }

    /// Copy, then delete as an undoable action.
    pub fn cut(&mut self, id: ItemId) -> Option<Item> {
        if !self.editable("Cut") || !self.copy(id) {
            return None;
        }
        self.remove(id)
    }

    /// Paste the clipboard as a new, unlinked item shifted by `offset`.
    pub fn paste(&mut self, offset: Vec2) -> Option<ItemId> {
        if !self.editable("Paste") {
            return None;
        }
        let mut item = self.clipboard.clone()?;
        item.regenerate_id();
        item.version = 1;
        item.position += offset;
        item.attachments.clear();
        if let Some(connector) = item.as_connector_mut() {
            connector.clear_references();
        }

        let id = item.id();
        self.store.insert(item.clone());
        self.history.append(HistoryAction::create(vec![item]));
        self.selection = Some(id);
        self.persist_items();
        Some(id)
    }

    /// Commit an edit made outside a gesture (style, text, ...).
    ///
    /// Attachments and connector references are kept from the stored item;
    /// only anchor drags change links.
    pub fn update_item(&mut self, mut current: Item) -> bool {
        if !self.editable("Update") {
            return false;
        }
        let Some(previous) = self.store.get(current.id()).cloned() else {
            log::warn!("Cannot update missing item {}", current.id());
            return false;
        };
        current.version = previous.version() + 1;
        current.attachments = previous.attachments.clone();
        if let (Some(links), Some(connector)) = (previous.as_connector(), current.as_connector_mut()) {
            for end in [Endpoint::Tail, Endpoint::Head] {
                connector.set_reference(end, links.reference(end));
            }
        }

        self.store.replace(current.clone());
        self.history.append(HistoryAction::update([(previous, current)]));
        self.persist_items();
        true
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo(&mut self) -> bool {
        if !self.editable("Undo") || !self.history.undo(&mut self.store) {
            return false;
        }
        self.forget_missing_selection();
        self.persist_items();
        true
    }

    pub fn redo(&mut self) -> bool {
        if !self.editable("Redo") || !self.history.redo(&mut self.store) {
            return false;
        }
        self.forget_missing_selection();
        self.persist_items();
        true
    }

    /// Replace the board settings and persist them.
    pub fn update_board(&mut self, settings: BoardSettings) {
        self.board = settings;
        let done = self.saves.begin("Board");
        self.persistence.request_board_save(self.board_info(), done);
    }

    pub fn board_info(&self) -> BoardInfo {
        BoardInfo {
            board: self.board.clone(),
            mode: self.mode,
            items: None,
        }
    }

    /// Clear a reported save failure.
    pub fn acknowledge_save_failure(&self) {
        self.saves.acknowledge();
    }

    pub fn check_symmetry(&self) -> SymmetryReport {
        attachment::check_symmetry(&self.store)
    }

    pub fn gesture_state(&self) -> InteractionState {
        self.interaction.state()
    }

    /// Start dragging, transforming or anchor-dragging an item.
    pub fn start_gesture(&mut self, id: ItemId, kind: GestureKind) -> bool {
        if self.mode != BoardMode::Editor {
            return false;
        }
        self.interaction.start(id, kind, &self.store)
    }

    pub fn live_update(&mut self, update: LiveUpdate, now: Instant) -> bool {
        self.interaction.live_update(update, now, &self.store, &self.board)
    }

    pub fn poll_gesture(&mut self, now: Instant) -> bool {
        self.interaction.poll(now, &self.store, &self.board)
    }

    /// Commit the live gesture and persist. Returns the committed items.
    pub fn end_gesture(&mut self) -> Option<Vec<Item>> {
        let committed = self
            .interaction
            .end(&mut self.store, &mut self.history, &self.board)?;
        self.persist_items();
        Some(committed)
    }

    /// Drop the live gesture. The store never saw the preview.
    pub fn abandon_gesture(&mut self) {
        self.interaction.abandon();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemorySaver;
    use kurbo::{Point, Size};

    const EPS: f64 = 1e-9;

    fn editor() -> Editor<MemorySaver> {
        Editor::new(MemorySaver::new(), &EngineConfig::default())
    }

    fn assert_symmetric(editor: &Editor<MemorySaver>) {
        let report = editor.check_symmetry();
        assert!(report.is_consistent(), "{:?}", report.violations);
    }

    fn drag(editor: &mut Editor<MemorySaver>, id: ItemId, kind: GestureKind, update: LiveUpdate) -> Vec<Item> {
        assert!(editor.start_gesture(id, kind));
        editor.live_update(update, Instant::now());
        let committed = editor.end_gesture().unwrap();
        assert_symmetric(editor);
        committed
    }

    #[test]
    fn test_create_persists_and_records() {
        let mut editor = editor();
        let id = editor
            .create(Item::rectangle(Point::ZERO, Size::new(100.0, 100.0)))
            .unwrap();

        assert!(editor.store().contains(id));
        assert_eq!(editor.history().len(), 1);
        assert_eq!(editor.persistence().item_saves().len(), 1);
        assert_eq!(editor.save_status(), SaveStatus::Saved);
    }

    #[test]
    fn test_failed_save_only_flips_status() {
        let mut editor = editor();
        editor.persistence().set_failing(true);
        let id = editor
            .create(Item::circle(Point::ZERO, Size::new(10.0, 10.0)))
            .unwrap();

        assert_eq!(editor.save_status(), SaveStatus::Failure);
        assert!(editor.store().contains(id));
        assert_eq!(editor.history().len(), 1);

        editor.persistence().set_failing(false);
        editor.acknowledge_save_failure();
        assert_eq!(editor.save_status(), SaveStatus::Saved);
    }

    #[test]
    fn test_attach_then_move_scenario() {
        let mut editor = editor();
        let rect = editor
            .create(Item::rectangle(Point::ZERO, Size::new(100.0, 100.0)))
            .unwrap();
        let arrow = editor
            .create(Item::arrow(Point::new(200.0, 50.0), Point::new(300.0, 50.0)))
            .unwrap();

        drag(
            &mut editor,
            arrow,
            GestureKind::Anchor(Endpoint::Tail),
            LiveUpdate::Anchor(Point::new(105.0, 50.0)),
        );
        let a = editor.store().get(arrow).unwrap();
        assert_eq!(a.as_connector().unwrap().reference(Endpoint::Tail), Some(rect));
        assert!(editor.store().get(rect).unwrap().has_attachment(arrow));

        let before = editor.history().len();
        let committed = drag(&mut editor, rect, GestureKind::Move, LiveUpdate::Move(Point::new(50.0, 0.0)));
        assert_eq!(committed.len(), 2);
        assert_eq!(editor.history().len(), before + 1);

        let tail = editor
            .store()
            .get(arrow)
            .unwrap()
            .endpoint_position(Endpoint::Tail)
            .unwrap();
        assert!((tail.x - 143.0).abs() < EPS);
        assert!((tail.y - 50.0).abs() < EPS);
    }

    #[test]
    fn test_detach_scenario() {
        let mut editor = editor();
        let rect = editor
            .create(Item::rectangle(Point::ZERO, Size::new(100.0, 100.0)))
            .unwrap();
        let arrow = editor
            .create(Item::arrow(Point::new(200.0, 50.0), Point::new(300.0, 50.0)))
            .unwrap();
        let tail = GestureKind::Anchor(Endpoint::Tail);
        drag(&mut editor, arrow, tail, LiveUpdate::Anchor(Point::new(105.0, 50.0)));
        drag(&mut editor, arrow, tail, LiveUpdate::Anchor(Point::new(200.0, 200.0)));

        let a = editor.store().get(arrow).unwrap();
        assert_eq!(a.as_connector().unwrap().reference(Endpoint::Tail), None);
        assert!(!editor.store().get(rect).unwrap().has_attachment(arrow));
    }

    #[test]
    fn test_create_update_delete_undo_redo() {
        let mut editor = editor();
        let id = editor
            .create(Item::rectangle(Point::ZERO, Size::new(100.0, 100.0)))
            .unwrap();
        let mut edited = editor.store().get(id).unwrap().clone();
        edited.style.stroke_width = 4.0;
        assert!(editor.update_item(edited));
        let pre_delete = editor.store().get(id).unwrap().clone();
        assert_eq!(pre_delete.version(), 2);
        editor.remove(id).unwrap();
        assert_eq!(editor.history().index(), Some(2));

        for _ in 0..3 {
            assert!(editor.undo());
        }
        assert!(editor.store().is_empty());
        assert!(!editor.can_undo());
        assert!(!editor.undo());
        assert!(editor.can_redo());

        for _ in 0..3 {
            assert!(editor.redo());
        }
        assert!(!editor.can_redo());
        assert!(editor.store().is_empty());
        assert!(editor.undo());
        assert_eq!(editor.store().get(id), Some(&pre_delete));
        assert_eq!(editor.history().index(), Some(1));
    }

    #[test]
    fn test_undo_remove_restores_paint_order() {
        let mut editor = editor();
        let ids: Vec<ItemId> = (0..3)
            .filter_map(|i| editor.create(Item::rectangle(Point::new(i as f64 * 20.0, 0.0), Size::new(10.0, 10.0))))
            .collect();
        editor.remove(ids[0]).unwrap();
        assert!(editor.undo());
        let order: Vec<ItemId> = editor.store().iter().map(Item::id).collect();
        assert_eq!(order, ids);
    }

    #[test]
    fn test_undo_redo_persist_full_set() {
        let mut editor = editor();
        editor.create(Item::rectangle(Point::ZERO, Size::new(10.0, 10.0)));
        editor.create(Item::circle(Point::ZERO, Size::new(10.0, 10.0)));
        editor.persistence().clear();

        assert!(editor.undo());
        assert!(editor.redo());
        let saves = editor.persistence().item_saves();
        assert_eq!(saves.len(), 2);
        assert_eq!(saves[0].len(), 1);
        assert_eq!(saves[1].len(), 2);
    }

    #[test]
    fn test_append_after_undo_truncates() {
        let mut editor = editor();
        for i in 0..4 {
            editor.create(Item::rectangle(Point::new(i as f64, 0.0), Size::new(10.0, 10.0)));
        }
        editor.undo();
        editor.undo();
        editor.create(Item::circle(Point::ZERO, Size::new(5.0, 5.0)));
        assert_eq!(editor.history().len(), 4 - 2 + 1);
        assert!(!editor.redo());
    }

    #[test]
    fn test_cut_and_paste_clears_links() {
        let mut editor = editor();
        let rect = editor
            .create(Item::rectangle(Point::ZERO, Size::new(100.0, 100.0)))
            .unwrap();
        let arrow = editor
            .create(Item::arrow(Point::new(200.0, 50.0), Point::new(300.0, 50.0)))
            .unwrap();
        drag(
            &mut editor,
            arrow,
            GestureKind::Anchor(Endpoint::Tail),
            LiveUpdate::Anchor(Point::new(105.0, 50.0)),
        );

        assert!(editor.copy(rect));
        let pasted = editor.paste(PASTE_OFFSET).unwrap();
        let copy = editor.store().get(pasted).unwrap();
        assert_ne!(pasted, rect);
        assert!(copy.attachments.is_empty());
        assert_eq!(copy.version(), 1);
        assert_eq!(copy.position, Point::new(20.0, 20.0));
        assert_eq!(editor.selection(), Some(pasted));
        assert_symmetric(&editor);

        let cut = editor.cut(arrow).unwrap();
        assert_eq!(cut.id(), arrow);
        assert!(!editor.store().contains(arrow));
        let pasted_arrow = editor.paste(Vec2::ZERO).unwrap();
        let links = editor.store().get(pasted_arrow).unwrap().as_connector().unwrap().clone();
        assert_eq!(links.reference(Endpoint::Tail), None);

        // The cut arrow is still listed on the rectangle; it is dangling, not broken.
        let report = editor.check_symmetry();
        assert!(report.is_consistent());
        assert_eq!(report.dangling, vec![(rect, arrow)]);

        assert!(editor.undo());
        assert!(editor.undo());
        assert!(editor.store().contains(arrow));
        assert!(editor.check_symmetry().dangling.is_empty());
    }

    #[test]
    fn test_update_item_keeps_links() {
        let mut editor = editor();
        let rect = editor
            .create(Item::rectangle(Point::ZERO, Size::new(100.0, 100.0)))
            .unwrap();
        let arrow = editor
            .create(Item::arrow(Point::new(200.0, 50.0), Point::new(300.0, 50.0)))
            .unwrap();
        drag(
            &mut editor,
            arrow,
            GestureKind::Anchor(Endpoint::Tail),
            LiveUpdate::Anchor(Point::new(105.0, 50.0)),
        );

        let mut edited = editor.store().get(rect).unwrap().clone();
        edited.attachments.clear();
        assert!(editor.update_item(edited));
        assert!(editor.store().get(rect).unwrap().has_attachment(arrow));
        assert_symmetric(&editor);
    }

    #[test]
    fn test_operations_blocked_during_gesture() {
        let mut editor = editor();
        let id = editor
            .create(Item::rectangle(Point::ZERO, Size::new(10.0, 10.0)))
            .unwrap();
        assert!(editor.start_gesture(id, GestureKind::Move));
        assert!(editor.remove(id).is_none());
        assert!(!editor.undo());
        editor.abandon_gesture();
        assert!(editor.remove(id).is_some());
    }

    #[test]
    fn test_viewer_mode_is_read_only() {
        let mut editor = editor();
        editor.set_mode(BoardMode::Viewer);
        assert!(editor.create(Item::rectangle(Point::ZERO, Size::new(10.0, 10.0))).is_none());
        assert!(editor.store().is_empty());
    }

    #[test]
    fn test_update_board_persists() {
        let mut editor = editor();
        let settings = BoardSettings {
            snap_to_grid: true,
            ..BoardSettings::default()
        };
        editor.update_board(settings.clone());
        assert_eq!(editor.board(), &settings);
        assert_eq!(editor.persistence().board_saves()[0].board, settings);
    }

    #[test]
    fn test_history_limit_from_config() {
        let config = EngineConfig {
            history_limit: Some(2),
            ..EngineConfig::default()
        };
        let mut editor = Editor::new(MemorySaver::new(), &config);
        for _ in 0..3 {
            editor.create(Item::circle(Point::ZERO, Size::new(1.0, 1.0)));
        }
        assert_eq!(editor.history().len(), 2);
        assert!(editor.undo());
        assert!(editor.undo());
        assert!(!editor.undo());
        assert_eq!(editor.store().len(), 1);
    }

    #[test]
    fn test_end_gesture_when_idle() {
        let mut editor = editor();
        assert!(editor.end_gesture().is_none());
        assert!(editor.persistence().item_saves().is_empty());
    }
}
