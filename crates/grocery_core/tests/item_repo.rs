use chrono::NaiveDate;
use grocery_core::db::open_db_in_memory;
use grocery_core::{Item, ItemPatch, ItemRepository, RepoError, SqliteItemRepository};
use std::collections::HashSet;
use uuid::Uuid;

fn setup() -> SqliteItemRepository {
    SqliteItemRepository::new(open_db_in_memory().unwrap())
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

#[test]
fn insert_and_get_roundtrip() {
    let repo = setup();

    let item = Item::new("Eggs", Some(date(2024, 1, 1)));
    let id = repo.insert_item(&item).unwrap();

    let loaded = repo.get_item(id).unwrap().unwrap();
    assert_eq!(loaded.id, item.id);
    assert_eq!(loaded.title, "Eggs");
    assert!(!loaded.is_completed);
    assert_eq!(loaded.due_date, Some(date(2024, 1, 1)));
}

#[test]
fn due_date_is_stored_as_iso_text() {
    let repo = setup();
    let item = Item::new("Eggs", Some(date(2024, 3, 9)));
    repo.insert_item(&item).unwrap();

    let stored: String = repo
        .connection()
        .query_row(
            "SELECT due_date FROM items WHERE uuid = ?1",
            [item.id.to_string()],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(stored, "2024-03-09");
}

#[test]
fn list_preserves_insertion_order() {
    let repo = setup();
    let titles = ["Milk", "Eggs", "Apples", "Bread"];
    for title in titles {
        repo.insert_item(&Item::new(title, None)).unwrap();
    }

    let listed: Vec<String> = repo
        .list_items()
        .unwrap()
        .into_iter()
        .map(|item| item.title)
        .collect();
    assert_eq!(listed, titles);
}

#[test]
fn update_applies_partial_patch() {
    let repo = setup();
    let item = Item::new("Eggs", Some(date(2024, 1, 1)));
    repo.insert_item(&item).unwrap();

    let updated = repo
        .update_item(item.id, &ItemPatch::title("Brown eggs"))
        .unwrap();
    assert_eq!(updated.title, "Brown eggs");
    assert_eq!(updated.due_date, Some(date(2024, 1, 1)));

    let cleared = repo
        .update_item(item.id, &ItemPatch::due_date(None))
        .unwrap();
    assert_eq!(cleared.title, "Brown eggs");
    assert_eq!(cleared.due_date, None);

    let loaded = repo.get_item(item.id).unwrap().unwrap();
    assert_eq!(loaded.title, "Brown eggs");
    assert_eq!(loaded.due_date, None);
}

#[test]
fn update_not_found_returns_not_found() {
    let repo = setup();
    let missing = Uuid::new_v4();
    let err = repo
        .update_item(missing, &ItemPatch::completed(true))
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == missing));
}

#[test]
fn validation_failure_blocks_insert_and_update() {
    let repo = setup();

    let mut blank = Item::new("placeholder", None);
    blank.title = "   ".to_string();
    assert!(matches!(
        repo.insert_item(&blank).unwrap_err(),
        RepoError::Validation(_)
    ));

    let item = Item::new("Milk", None);
    repo.insert_item(&item).unwrap();
    assert!(matches!(
        repo.update_item(item.id, &ItemPatch::title("")).unwrap_err(),
        RepoError::Validation(_)
    ));
    assert_eq!(repo.get_item(item.id).unwrap().unwrap().title, "Milk");
}

#[test]
fn toggle_completed_flips_flag() {
    let repo = setup();
    let item = Item::new("Milk", None);
    repo.insert_item(&item).unwrap();

    assert!(repo.toggle_completed(item.id).unwrap().is_completed);
    assert!(!repo.toggle_completed(item.id).unwrap().is_completed);

    let missing = Uuid::new_v4();
    assert!(matches!(
        repo.toggle_completed(missing).unwrap_err(),
        RepoError::NotFound(id) if id == missing
    ));
}

#[test]
fn delete_twice_reports_not_found() {
    let repo = setup();
    let item = Item::new("Milk", None);
    repo.insert_item(&item).unwrap();

    repo.delete_item(item.id).unwrap();
    let err = repo.delete_item(item.id).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == item.id));
    assert!(repo.get_item(item.id).unwrap().is_none());
}

#[test]
fn delete_items_skips_missing_ids() {
    let repo = setup();
    let a = Item::new("A", None);
    let c = Item::new("C", None);
    let keep = Item::new("Keep", None);
    for item in [&a, &c, &keep] {
        repo.insert_item(item).unwrap();
    }

    let ids: HashSet<_> = [a.id, Uuid::new_v4(), c.id].into_iter().collect();
    assert_eq!(repo.delete_items(&ids).unwrap(), 2);

    let remaining = repo.list_items().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, keep.id);
    assert_eq!(repo.delete_items(&HashSet::new()).unwrap(), 0);
}

#[test]
fn clear_items_returns_deleted_count() {
    let repo = setup();
    assert_eq!(repo.clear_items().unwrap(), 0);

    for title in ["Milk", "Eggs", "Bread"] {
        repo.insert_item(&Item::new(title, None)).unwrap();
    }
    assert_eq!(repo.count_items().unwrap(), 3);
    assert_eq!(repo.clear_items().unwrap(), 3);
    assert_eq!(repo.count_items().unwrap(), 0);
}

#[test]
fn invalid_persisted_rows_are_rejected() {
    let repo = setup();
    repo.connection()
        .execute(
            "INSERT INTO items (uuid, title, due_date) VALUES (?1, 'Milk', 'someday');",
            [Uuid::new_v4().to_string()],
        )
        .unwrap();

    let err = repo.list_items().unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(message) if message.contains("someday")));
}
