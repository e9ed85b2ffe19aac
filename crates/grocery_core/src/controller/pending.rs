//! Inline delete-confirmation marker.
//!
//! Tapping an item arms the marker on it; tapping it again disarms; tapping
//! another item moves the marker. The marker never deletes anything itself.

use crate::model::item::ItemId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PendingDelete {
    #[default]
    None,
    Pending(ItemId),
}

impl PendingDelete {
    pub fn tap(&mut self, id: ItemId) {
        *self = match *self {
            Self::Pending(current) if current == id => Self::None,
            _ => Self::Pending(id),
        };
    }

    pub fn item(&self) -> Option<ItemId> {
        match self {
            Self::None => None,
            Self::Pending(id) => Some(*id),
        }
    }

    pub fn clear(&mut self) {
        *self = Self::None;
    }

    /// Disarms the marker if it points at `id`.
    pub fn forget(&mut self, id: ItemId) {
        if self.item() == Some(id) {
            self.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PendingDelete;
    use uuid::Uuid;

    #[test]
    fn tap_cycles_between_items() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut pending = PendingDelete::default();

        pending.tap(a);
        assert_eq!(pending.item(), Some(a));
        pending.tap(b);
        assert_eq!(pending.item(), Some(b));
        pending.tap(b);
        assert_eq!(pending, PendingDelete::None);
    }

    #[test]
    fn forget_only_clears_matching_item() {
        let a = Uuid::new_v4();
        let mut pending = PendingDelete::Pending(a);
        pending.forget(Uuid::new_v4());
        assert_eq!(pending.item(), Some(a));
        pending.forget(a);
        assert_eq!(pending.item(), None);
    }
}
