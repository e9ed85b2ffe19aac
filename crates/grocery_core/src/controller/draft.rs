//! Scratch buffers for the add and edit sheets.

use crate::model::item::{Item, ItemId, ItemPatch};
use chrono::NaiveDate;

/// Uncommitted input of the add sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddDraft {
    pub title: String,
    pub due_date: Option<NaiveDate>,
}

impl AddDraft {
    /// Save is only offered for a non-blank title.
    pub fn can_save(&self) -> bool {
        !self.title.trim().is_empty()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Snapshot of an item taken when editing starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditDraft {
    pub target: ItemId,
    pub title: String,
    pub due_date: Option<NaiveDate>,
}

impl EditDraft {
    pub fn from_item(item: &Item) -> Self {
        Self {
            target: item.id,
            title: item.title.clone(),
            due_date: item.due_date,
        }
    }

    pub fn to_patch(&self) -> ItemPatch {
        ItemPatch::edit(self.title.clone(), self.due_date)
    }
}
