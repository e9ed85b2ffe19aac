//! Core domain logic for the grocery list app.
//! This crate is the single source of truth for item invariants.

pub mod controller;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use controller::draft::{AddDraft, EditDraft};
pub use controller::selection::SelectionMode;
pub use controller::{ControllerError, ControllerResult, ListController};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::item::{Item, ItemId, ItemPatch, ItemValidationError};
pub use repo::item_repo::{
    format_due_date, parse_due_date, ItemRepository, RepoError, RepoResult, SqliteItemRepository,
};
pub use service::item_store::{ItemStore, StoreError, StoreResult, SubscriptionId};

/// Controller over the SQLite-backed store, as used by the app.
pub type SqliteListController = ListController<SqliteItemRepository>;

/// Opens (and migrates) the database at `path` and builds a controller.
pub fn open_list_controller(
    path: impl AsRef<std::path::Path>,
) -> Result<SqliteListController, String> {
    let conn = db::open_db(path).map_err(|err| format!("database open failed: {err}"))?;
    let store = ItemStore::new(SqliteItemRepository::new(conn));
    ListController::new(store).map_err(|err| format!("list load failed: {err}"))
}

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, open_list_controller, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn open_list_controller_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let controller = open_list_controller(dir.path().join("grocery.db")).unwrap();
        assert!(controller.items().is_empty());
        assert!(controller.can_seed_starter_items());
    }
}
