//! List controller: user intents in, consistent list snapshot out.
//!
//! # Responsibility
//! - Translate screen intents into item store calls.
//! - Own transient screen state: selection mode, the inline delete marker,
//!   add/edit scratch buffers and the clear-all confirmation.
//! - Keep `items()` in step with the last committed store state.
//!
//! # Invariants
//! - The snapshot is rebuilt whenever the store revision moves.
//! - After every rebuild no transient state refers to a vanished item.
//! - `NotFound` from the store refreshes the snapshot before surfacing.
//! - Intents report the store outcome; a failed refresh after a committed
//!   write is logged, not returned.

pub mod draft;
pub mod pending;
pub mod selection;
pub mod seed;

use crate::model::item::{Item, ItemId, ItemPatch};
use crate::repo::item_repo::ItemRepository;
use crate::service::item_store::{ItemStore, StoreError, StoreResult, SubscriptionId};
use chrono::NaiveDate;
use draft::{AddDraft, EditDraft};
use log::{debug, info, warn};
use pending::PendingDelete;
use rand::Rng;
use selection::SelectionMode;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ControllerResult<T> = Result<T, ControllerError>;

/// Errors from list controller intents.
#[derive(Debug)]
pub enum ControllerError {
    /// Store rejected or failed the call.
    Store(StoreError),
    /// Intent requires selection mode.
    NotSelecting,
    /// No edit buffer is open.
    NoEditInProgress,
    /// `confirm_clear_all` without a preceding request.
    ClearAllNotRequested,
    /// Starter items are only offered for an empty list.
    ListNotEmpty,
    /// Id is not part of the current snapshot.
    NotInList(ItemId),
}

impl ControllerError {
    /// Returns the store error kind when this error came from the store.
    pub fn as_store_error(&self) -> Option<&StoreError> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl Display for ControllerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::NotSelecting => write!(f, "selection mode is not active"),
            Self::NoEditInProgress => write!(f, "no item is being edited"),
            Self::ClearAllNotRequested => write!(f, "clear all was not requested"),
            Self::ListNotEmpty => write!(f, "starter items require an empty list"),
            Self::NotInList(id) => write!(f, "item is not in the list: {id}"),
        }
    }
}

impl Error for ControllerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for ControllerError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Screen-level controller over one item store.
pub struct ListController<R: ItemRepository> {
    store: ItemStore<R>,
    items: Vec<Item>,
    seen_revision: u64,
    selection: SelectionMode,
    pending_delete: PendingDelete,
    add_draft: AddDraft,
    edit_draft: Option<EditDraft>,
    clear_all_requested: bool,
}

impl<R: ItemRepository> ListController<R> {
    /// Creates a controller in `Browsing` mode and loads the first snapshot.
    pub fn new(store: ItemStore<R>) -> ControllerResult<Self> {
        let mut controller = Self {
            store,
            items: Vec::new(),
            seen_revision: 0,
            selection: SelectionMode::default(),
            pending_delete: PendingDelete::default(),
            add_draft: AddDraft::default(),
            edit_draft: None,
            clear_all_requested: false,
        };
        controller.refresh()?;
        Ok(controller)
    }

    pub fn store(&self) -> &ItemStore<R> {
        &self.store
    }

    /// Current items in insertion order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Re-reads the list from the store and prunes stale transient state.
    pub fn refresh(&mut self) -> ControllerResult<()> {
        self.items = self.store.list()?;
        self.seen_revision = self.store.revision();

        let present: HashSet<ItemId> = self.items.iter().map(|item| item.id).collect();
        self.selection.retain(|id| present.contains(id));
        if let Some(id) = self.pending_delete.item() {
            if !present.contains(&id) {
                self.pending_delete.clear();
            }
        }
        if self
            .edit_draft
            .as_ref()
            .is_some_and(|draft| !present.contains(&draft.target))
        {
            self.edit_draft = None;
        }
        Ok(())
    }

    pub fn subscribe(
        &mut self,
        observer: impl FnMut(&[Item]) + Send + 'static,
    ) -> SubscriptionId {
        self.store.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }

    // Item intents.

    pub fn add_item(&mut self, title: &str, due_date: Option<NaiveDate>) -> ControllerResult<Item> {
        let result = self.store.add(title, due_date);
        self.settle(result)
    }

    pub fn update_item(&mut self, id: ItemId, patch: &ItemPatch) -> ControllerResult<Item> {
        let result = self.store.update(id, patch);
        self.settle(result)
    }

    pub fn toggle_completed(&mut self, id: ItemId) -> ControllerResult<Item> {
        let result = self.store.toggle_completed(id);
        self.settle(result)
    }

    /// Deletes a single item (swipe-to-delete).
    pub fn delete_item(&mut self, id: ItemId) -> ControllerResult<()> {
        let result = self.store.delete(id);
        self.settle(result)?;
        self.pending_delete.forget(id);
        Ok(())
    }

    /// Deletes the given ids; missing ids are skipped.
    pub fn delete_many(&mut self, ids: &HashSet<ItemId>) -> ControllerResult<usize> {
        let result = self.store.delete_many(ids);
        self.settle(result)
    }

    /// Row tap: toggles selection while selecting, otherwise moves the
    /// inline delete marker.
    pub fn tap_item(&mut self, id: ItemId) -> ControllerResult<()> {
        if self.selection.is_selecting() {
            return self.toggle_selection(id).map(|_| ());
        }
        self.ensure_listed(id)?;
        self.pending_delete.tap(id);
        Ok(())
    }

    pub fn pending_delete(&self) -> Option<ItemId> {
        self.pending_delete.item()
    }

    // Selection mode.

    pub fn selection_mode(&self) -> &SelectionMode {
        &self.selection
    }

    pub fn is_selecting(&self) -> bool {
        self.selection.is_selecting()
    }

    pub fn enter_selection_mode(&mut self) {
        if !self.selection.is_selecting() {
            debug!("event=selection_enter module=controller status=ok");
        }
        self.selection.enter();
        self.pending_delete.clear();
    }

    /// Leaves selection mode without deleting anything.
    pub fn exit_selection_mode(&mut self) {
        if self.selection.is_selecting() {
            debug!("event=selection_exit module=controller status=ok");
        }
        self.selection.exit();
    }

    /// Returns whether `id` is selected after the toggle.
    pub fn toggle_selection(&mut self, id: ItemId) -> ControllerResult<bool> {
        if !self.selection.is_selecting() {
            return Err(ControllerError::NotSelecting);
        }
        self.ensure_listed(id)?;
        self.selection.toggle(id).ok_or(ControllerError::NotSelecting)
    }

    pub fn select_all(&mut self) -> ControllerResult<()> {
        if !self.selection.is_selecting() {
            return Err(ControllerError::NotSelecting);
        }
        let ids: Vec<ItemId> = self.items.iter().map(|item| item.id).collect();
        for id in ids {
            if !self.selection.is_selected(id) {
                self.selection.toggle(id);
            }
        }
        Ok(())
    }

    /// Selected ids; empty while browsing.
    pub fn selected_ids(&self) -> HashSet<ItemId> {
        self.selection.selected().cloned().unwrap_or_default()
    }

    pub fn is_selected(&self, id: ItemId) -> bool {
        self.selection.is_selected(id)
    }

    /// Deletes the selection and returns to `Browsing`.
    ///
    /// On failure the selection stays active so the user can retry.
    pub fn delete_selected(&mut self) -> ControllerResult<usize> {
        let ids = self
            .selection
            .selected()
            .cloned()
            .ok_or(ControllerError::NotSelecting)?;

        let result = self.store.delete_many(&ids);
        let deleted = self.settle(result)?;
        self.selection.exit();
        info!(
            "event=selection_delete module=controller status=ok selected={} deleted={deleted}",
            ids.len()
        );
        Ok(deleted)
    }

    // Add sheet.

    pub fn add_draft(&self) -> &AddDraft {
        &self.add_draft
    }

    pub fn set_add_title(&mut self, title: impl Into<String>) {
        self.add_draft.title = title.into();
    }

    pub fn set_add_due_date(&mut self, due_date: Option<NaiveDate>) {
        self.add_draft.due_date = due_date;
    }

    pub fn can_save_add(&self) -> bool {
        self.add_draft.can_save()
    }

    /// Persists the add buffer and resets it. The buffer is kept on failure.
    pub fn save_add(&mut self) -> ControllerResult<Item> {
        let AddDraft { title, due_date } = self.add_draft.clone();
        let item = self.add_item(&title, due_date)?;
        self.add_draft.reset();
        Ok(item)
    }

    pub fn discard_add(&mut self) {
        self.add_draft.reset();
    }

    // Edit sheet.

    pub fn edit_draft(&self) -> Option<&EditDraft> {
        self.edit_draft.as_ref()
    }

    /// Opens the edit buffer for `id`, replacing any open buffer.
    pub fn begin_edit(&mut self, id: ItemId) -> ControllerResult<&EditDraft> {
        self.sync()?;
        let draft = self
            .item(id)
            .map(EditDraft::from_item)
            .ok_or(ControllerError::NotInList(id))?;
        let draft = self.edit_draft.insert(draft);
        Ok(&*draft)
    }

    pub fn set_edit_title(&mut self, title: impl Into<String>) -> ControllerResult<()> {
        let draft = self
            .edit_draft
            .as_mut()
            .ok_or(ControllerError::NoEditInProgress)?;
        draft.title = title.into();
        Ok(())
    }

    pub fn set_edit_due_date(&mut self, due_date: Option<NaiveDate>) -> ControllerResult<()> {
        let draft = self
            .edit_draft
            .as_mut()
            .ok_or(ControllerError::NoEditInProgress)?;
        draft.due_date = due_date;
        Ok(())
    }

    /// Applies the edit buffer and closes it. A rejected save keeps it open.
    pub fn save_edit(&mut self) -> ControllerResult<Item> {
        let draft = self
            .edit_draft
            .as_ref()
            .ok_or(ControllerError::NoEditInProgress)?;
        let (target, patch) = (draft.target, draft.to_patch());

        let item = self.update_item(target, &patch)?;
        self.edit_draft = None;
        Ok(item)
    }

    pub fn cancel_edit(&mut self) {
        self.edit_draft = None;
    }

    // Clear all.

    pub fn request_clear_all(&mut self) {
        self.clear_all_requested = true;
    }

    pub fn cancel_clear_all(&mut self) {
        self.clear_all_requested = false;
    }

    pub fn is_clear_all_requested(&self) -> bool {
        self.clear_all_requested
    }

    /// Second phase of clear-all; returns the number of deleted items.
    pub fn confirm_clear_all(&mut self) -> ControllerResult<usize> {
        if !self.clear_all_requested {
            return Err(ControllerError::ClearAllNotRequested);
        }
        self.clear_all_requested = false;

        let result = self.store.clear_all();
        self.settle(result)
    }

    // Starter items.

    pub fn can_seed_starter_items(&self) -> bool {
        self.items.is_empty()
    }

    pub fn seed_starter_items(&mut self) -> ControllerResult<Vec<Item>> {
        self.seed_starter_items_with(&mut rand::thread_rng())
    }

    /// Adds the starter items, drawing random completion flags from `rng`.
    pub fn seed_starter_items_with(&mut self, rng: &mut impl Rng) -> ControllerResult<Vec<Item>> {
        if !self.store.is_empty()? {
            self.sync()?;
            return Err(ControllerError::ListNotEmpty);
        }

        let items = seed::starter_items(rng);
        for item in &items {
            let result = self.store.insert(item);
            self.settle(result)?;
        }
        info!(
            "event=starter_seed module=controller status=ok count={}",
            items.len()
        );
        Ok(items)
    }

    fn ensure_listed(&self, id: ItemId) -> ControllerResult<()> {
        if self.item(id).is_none() {
            return Err(ControllerError::NotInList(id));
        }
        Ok(())
    }

    fn sync(&mut self) -> ControllerResult<()> {
        if self.store.revision() != self.seen_revision {
            self.refresh()?;
        }
        Ok(())
    }

    /// Brings the snapshot up to date after a store call.
    fn settle<T>(&mut self, result: StoreResult<T>) -> ControllerResult<T> {
        match result {
            Ok(value) => {
                // The write landed. A failed refresh keeps `seen_revision`
                // behind so the next sync retries.
                if let Err(sync_err) = self.sync() {
                    warn!("event=list_refresh module=controller status=error error={sync_err}");
                }
                Ok(value)
            }
            Err(err) => {
                if err.is_not_found() {
                    if let Err(refresh_err) = self.refresh() {
                        warn!(
                            "event=list_refresh module=controller status=error error={refresh_err}"
                        );
                    }
                } else if let Err(sync_err) = self.sync() {
                    warn!("event=list_refresh module=controller status=error error={sync_err}");
                }
                Err(err.into())
            }
        }
    }
}
