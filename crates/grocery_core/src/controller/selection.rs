//! Selection mode state machine for batch deletion.

use crate::model::item::ItemId;
use std::collections::HashSet;

/// `Browsing` is the initial state; `Selecting` carries the selected ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SelectionMode {
    #[default]
    Browsing,
    Selecting(HashSet<ItemId>),
}

impl SelectionMode {
    pub fn is_selecting(&self) -> bool {
        matches!(self, Self::Selecting(_))
    }

    /// Enters selection mode with an empty set. No-op when already selecting.
    pub fn enter(&mut self) {
        if !self.is_selecting() {
            *self = Self::Selecting(HashSet::new());
        }
    }

    /// Leaves selection mode, dropping the set.
    pub fn exit(&mut self) {
        *self = Self::Browsing;
    }

    /// Flips membership of `id`; returns whether it is now selected, or
    /// `None` while browsing.
    pub fn toggle(&mut self, id: ItemId) -> Option<bool> {
        match self {
            Self::Browsing => None,
            Self::Selecting(selected) => {
                if selected.remove(&id) {
                    Some(false)
                } else {
                    selected.insert(id);
                    Some(true)
                }
            }
        }
    }

    pub fn selected(&self) -> Option<&HashSet<ItemId>> {
        match self {
            Self::Browsing => None,
            Self::Selecting(selected) => Some(selected),
        }
    }

    pub fn is_selected(&self, id: ItemId) -> bool {
        self.selected().is_some_and(|selected| selected.contains(&id))
    }

    /// Drops ids for which `keep` returns false.
    pub fn retain(&mut self, keep: impl Fn(&ItemId) -> bool) {
        if let Self::Selecting(selected) = self {
            selected.retain(|id| keep(id));
        }
    }
}
