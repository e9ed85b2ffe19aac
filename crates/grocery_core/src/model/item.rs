//! Item domain model.
//!
//! # Responsibility
//! - Define the grocery list entry and its partial-update shape.
//! - Own title validation so every write path shares one rule.
//!
//! # Invariants
//! - `id` is generated once and never reused for another item.
//! - `title` is non-empty after trim.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// Stable identifier for a grocery item.
pub type ItemId = Uuid;

/// Validation failures for item writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemValidationError {
    /// Title is empty or whitespace only.
    EmptyTitle,
}

impl Display for ItemValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "item title must not be blank"),
        }
    }
}

impl Error for ItemValidationError {}

/// One grocery list entry.
///
/// Equality and hashing only look at `id`; use field comparisons when the
/// content matters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    pub is_completed: bool,
    pub due_date: Option<NaiveDate>,
}

impl Item {
    /// Creates a new, not yet completed item with a generated id.
    ///
    /// The title is trimmed; call [`Item::validate`] before persisting.
    pub fn new(title: impl AsRef<str>, due_date: Option<NaiveDate>) -> Self {
        Self::with_id(Uuid::new_v4(), title, due_date)
    }

    /// Creates an item with a caller-provided id.
    pub fn with_id(id: ItemId, title: impl AsRef<str>, due_date: Option<NaiveDate>) -> Self {
        Self {
            id,
            title: title.as_ref().trim().to_string(),
            is_completed: false,
            due_date,
        }
    }

    /// Checks write-time invariants.
    pub fn validate(&self) -> Result<(), ItemValidationError> {
        validate_title(&self.title)
    }

    /// Applies a patch in place. The patch must already be validated.
    pub fn apply(&mut self, patch: &ItemPatch) {
        if let Some(title) = &patch.title {
            self.title = title.trim().to_string();
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(is_completed) = patch.is_completed {
            self.is_completed = is_completed;
        }
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Item {}

impl Hash for Item {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Partial update for an existing item.
///
/// `due_date` is doubly optional: `None` leaves the date alone,
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemPatch {
    pub title: Option<String>,
    pub due_date: Option<Option<NaiveDate>>,
    pub is_completed: Option<bool>,
}

impl ItemPatch {
    /// Patch replacing title and due date, as produced by the edit sheet.
    pub fn edit(title: impl Into<String>, due_date: Option<NaiveDate>) -> Self {
        Self {
            title: Some(title.into()),
            due_date: Some(due_date),
            is_completed: None,
        }
    }

    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn due_date(due_date: Option<NaiveDate>) -> Self {
        Self {
            due_date: Some(due_date),
            ..Self::default()
        }
    }

    pub fn completed(is_completed: bool) -> Self {
        Self {
            is_completed: Some(is_completed),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.due_date.is_none() && self.is_completed.is_none()
    }

    /// Rejects a patch that would blank the title.
    pub fn validate(&self) -> Result<(), ItemValidationError> {
        match &self.title {
            Some(title) => validate_title(title),
            None => Ok(()),
        }
    }
}

/// Returns whether `title` is acceptable for an item.
pub fn validate_title(title: &str) -> Result<(), ItemValidationError> {
    if title.trim().is_empty() {
        return Err(ItemValidationError::EmptyTitle);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Item, ItemPatch, ItemValidationError};
    use chrono::NaiveDate;

    #[test]
    fn new_item_trims_title_and_starts_active() {
        let item = Item::new("  Milk \n", None);
        assert_eq!(item.title, "Milk");
        assert!(!item.is_completed);
        assert!(item.due_date.is_none());
    }

    #[test]
    fn equality_is_by_id_only() {
        let a = Item::new("Milk", None);
        let mut b = a.clone();
        b.title = "Oat milk".to_string();
        b.is_completed = true;
        assert_eq!(a, b);
        assert_ne!(a, Item::new("Milk", None));
    }

    #[test]
    fn patch_with_blank_title_is_rejected() {
        assert_eq!(
            ItemPatch::title("  ").validate(),
            Err(ItemValidationError::EmptyTitle)
        );
        assert!(ItemPatch::completed(true).validate().is_ok());
    }

    #[test]
    fn apply_clears_due_date_only_when_requested() {
        let due = NaiveDate::from_ymd_opt(2024, 1, 1);
        let mut item = Item::new("Eggs", due);

        item.apply(&ItemPatch::title("Brown eggs"));
        assert_eq!(item.due_date, due);

        item.apply(&ItemPatch::due_date(None));
        assert_eq!(item.title, "Brown eggs");
        assert!(item.due_date.is_none());
    }
}
