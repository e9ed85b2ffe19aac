//! Starter items offered when the list is empty.

use crate::model::item::Item;
use rand::Rng;

/// Fixed starter titles. `None` means the completion flag is random.
const STARTER_ITEMS: [(&str, Option<bool>); 5] = [
    ("Bakery and Bread", Some(false)),
    ("Meat and SeaFood", Some(true)),
    ("Sweets", None),
    ("Pasta and Rices", None),
    ("Vegatables", None),
];

/// Builds the starter items in display order.
pub fn starter_items(rng: &mut impl Rng) -> Vec<Item> {
    STARTER_ITEMS
        .iter()
        .map(|&(title, completed)| {
            let mut item = Item::new(title, None);
            item.is_completed = completed.unwrap_or_else(|| rng.gen_bool(0.5));
            item
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::starter_items;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn fixed_flags_do_not_depend_on_rng() {
        for seed in 0..8 {
            let items = starter_items(&mut StdRng::seed_from_u64(seed));
            assert_eq!(items.len(), 5);
            assert_eq!(items[0].title, "Bakery and Bread");
            assert!(!items[0].is_completed);
            assert_eq!(items[1].title, "Meat and SeaFood");
            assert!(items[1].is_completed);
        }
    }
}
