//! Item store: the single writer of grocery list state.
//!
//! # Responsibility
//! - Validate intents before they reach persistence.
//! - Map repository failures onto `Validation | NotFound | Persistence`.
//! - Notify observers with the full list after every committed mutation.
//!
//! # Invariants
//! - Rejected or failed calls wrote nothing, leave `revision()` unchanged
//!   and fire no observer.
//! - A call that wrote returns `Ok`, even when observers could not be fed.
//! - `list()` is always in insertion order.

use crate::model::item::{validate_title, Item, ItemId, ItemPatch, ItemValidationError};
use crate::repo::item_repo::{ItemRepository, RepoError};
use chrono::NaiveDate;
use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-level error kinds surfaced to callers.
#[derive(Debug)]
pub enum StoreError {
    /// Input rejected before touching persistence.
    Validation(ItemValidationError),
    /// Referenced item does not exist (possibly a stale id).
    NotFound(ItemId),
    /// Underlying storage failed; the call had no effect.
    Persistence(RepoError),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "item not found: {id}"),
            Self::Persistence(err) => write!(f, "persistence failure: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound(_) => None,
            Self::Persistence(err) => Some(err),
        }
    }
}

impl From<ItemValidationError> for StoreError {
    fn from(value: ItemValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Persistence(other),
        }
    }
}

/// Handle returned by [`ItemStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer = Box<dyn FnMut(&[Item]) + Send>;

/// Grocery item store over a repository implementation.
pub struct ItemStore<R: ItemRepository> {
    repo: R,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: u64,
    revision: u64,
}

impl<R: ItemRepository> ItemStore<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            observers: Vec::new(),
            next_subscription: 0,
            revision: 0,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Counter of committed mutations since this store was created.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Registers a callback receiving the full list after each change.
    pub fn subscribe(&mut self, observer: impl FnMut(&[Item]) + Send + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Removes a callback; returns `false` when the id was unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(existing, _)| *existing != id);
        self.observers.len() != before
    }

    /// Creates a new active item.
    ///
    /// # Errors
    /// - `Validation` when the trimmed title is empty; nothing is persisted.
    pub fn add(&mut self, title: &str, due_date: Option<NaiveDate>) -> StoreResult<Item> {
        if let Err(err) = validate_title(title) {
            warn!("event=item_add module=store status=rejected reason=empty_title");
            return Err(err.into());
        }

        let item = Item::new(title, due_date);
        self.repo
            .insert_item(&item)
            .map_err(|err| log_failure("item_add", err))?;
        info!(
            "event=item_add module=store status=ok item_id={} has_due_date={}",
            item.id,
            item.due_date.is_some()
        );

        self.committed();
        Ok(item)
    }

    /// Inserts a fully formed item, keeping its id and completion flag.
    pub(crate) fn insert(&mut self, item: &Item) -> StoreResult<()> {
        item.validate()?;
        self.repo
            .insert_item(item)
            .map_err(|err| log_failure("item_insert", err))?;
        info!("event=item_insert module=store status=ok item_id={}", item.id);
        self.committed();
        Ok(())
    }

    /// Applies a partial update. An empty patch only checks that `id` exists.
    ///
    /// # Errors
    /// - `Validation` when the patch would blank the title.
    /// - `NotFound` when `id` is unknown.
    pub fn update(&mut self, id: ItemId, patch: &ItemPatch) -> StoreResult<Item> {
        patch.validate()?;
        if patch.is_empty() {
            let item = self
                .repo
                .get_item(id)
                .map_err(|err| log_failure("item_update", err))?
                .ok_or_else(|| log_failure("item_update", RepoError::NotFound(id)))?;
            debug!("event=item_update module=store status=unchanged item_id={id}");
            return Ok(item);
        }

        let item = self
            .repo
            .update_item(id, patch)
            .map_err(|err| log_failure("item_update", err))?;
        info!("event=item_update module=store status=ok item_id={id}");

        self.committed();
        Ok(item)
    }

    /// Flips the completion flag.
    pub fn toggle_completed(&mut self, id: ItemId) -> StoreResult<Item> {
        let item = self
            .repo
            .toggle_completed(id)
            .map_err(|err| log_failure("item_toggle", err))?;
        info!(
            "event=item_toggle module=store status=ok item_id={id} completed={}",
            item.is_completed
        );

        self.committed();
        Ok(item)
    }

    pub fn delete(&mut self, id: ItemId) -> StoreResult<()> {
        self.repo
            .delete_item(id)
            .map_err(|err| log_failure("item_delete", err))?;
        info!("event=item_delete module=store status=ok item_id={id}");
        self.committed();
        Ok(())
    }

    /// Deletes every existing id in `ids`; unknown ids are skipped.
    pub fn delete_many(&mut self, ids: &HashSet<ItemId>) -> StoreResult<usize> {
        let deleted = self
            .repo
            .delete_items(ids)
            .map_err(|err| log_failure("item_delete_many", err))?;
        info!(
            "event=item_delete_many module=store status=ok requested={} deleted={deleted}",
            ids.len()
        );

        if deleted > 0 {
            self.committed();
        }
        Ok(deleted)
    }

    pub fn clear_all(&mut self) -> StoreResult<usize> {
        let deleted = self
            .repo
            .clear_items()
            .map_err(|err| log_failure("item_clear_all", err))?;
        info!("event=item_clear_all module=store status=ok deleted={deleted}");

        if deleted > 0 {
            self.committed();
        }
        Ok(deleted)
    }

    pub fn get(&self, id: ItemId) -> StoreResult<Option<Item>> {
        Ok(self.repo.get_item(id)?)
    }

    /// All items in insertion order.
    pub fn list(&self) -> StoreResult<Vec<Item>> {
        Ok(self.repo.list_items()?)
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.repo.count_items()? == 0)
    }

    fn committed(&mut self) {
        self.revision += 1;
        if self.observers.is_empty() {
            return;
        }

        // The write already landed. Observers skip this revision when the
        // read-back fails; pollers still see the bumped revision.
        match self.repo.list_items() {
            Ok(items) => {
                for (_, observer) in &mut self.observers {
                    observer(items.as_slice());
                }
            }
            Err(err) => {
                error!(
                    "event=items_notify module=store status=error revision={} error={err}",
                    self.revision
                );
            }
        }
    }
}

fn log_failure(event: &str, err: RepoError) -> StoreError {
    let err = StoreError::from(err);
    match &err {
        StoreError::Persistence(inner) => {
            error!("event={event} module=store status=error error_code=persistence error={inner}")
        }
        StoreError::NotFound(id) => {
            warn!("event={event} module=store status=not_found item_id={id}")
        }
        StoreError::Validation(_) => {
            warn!("event={event} module=store status=rejected reason=validation")
        }
    }
    err
}
