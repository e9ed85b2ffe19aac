//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the grocery list screen intents to Dart via FRB.
//! - Hold one process-wide list session (controller + database).
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Ids cross the boundary as UUID strings, dates as `YYYY-MM-DD`.
//! - Every failure is returned as an envelope with `ok = false`.

use chrono::NaiveDate;
use grocery_core::{
    core_version as core_version_inner, format_due_date, init_logging as init_logging_inner,
    open_list_controller, parse_due_date, ping as ping_inner, Item, ItemId, ItemPatch,
    SqliteListController,
};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Mutex;
use uuid::Uuid;

const DB_PATH_ENV: &str = "GROCERY_DB_PATH";
const DB_FILE_NAME: &str = "grocery_list.sqlite3";

static SESSION: Mutex<Option<Session>> = Mutex::new(None);

struct Session {
    db_path: PathBuf,
    controller: SqliteListController,
}

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// One row of the grocery list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemView {
    pub id: String,
    pub title: String,
    pub is_completed: bool,
    /// `YYYY-MM-DD` when set.
    pub due_date: Option<String>,
}

/// Everything the list screen renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSnapshot {
    pub ok: bool,
    /// Items in insertion order.
    pub items: Vec<ItemView>,
    pub selecting: bool,
    /// Selected ids in list order.
    pub selected_ids: Vec<String>,
    pub pending_delete_id: Option<String>,
    pub clear_all_requested: bool,
    /// Whether the starter-items action should be offered.
    pub can_seed: bool,
    pub message: String,
}

/// Generic result envelope for list intents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListActionResponse {
    pub ok: bool,
    /// Item created or changed by the intent, when there is one.
    pub item_id: Option<String>,
    /// Number of items affected (deleted, seeded, ...).
    pub affected: u32,
    pub message: String,
}

impl ListActionResponse {
    fn success(message: impl Into<String>, item_id: Option<ItemId>, affected: usize) -> Self {
        Self {
            ok: true,
            item_id: item_id.map(|id| id.to_string()),
            affected: u32::try_from(affected).unwrap_or(u32::MAX),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            item_id: None,
            affected: 0,
            message: message.into(),
        }
    }
}

/// Content of the edit sheet when it opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditDraftView {
    pub ok: bool,
    pub item_id: Option<String>,
    pub title: String,
    pub due_date: Option<String>,
    pub message: String,
}

/// Opens the list database, replacing any open session.
///
/// Path resolution: `db_path` argument, then `GROCERY_DB_PATH`, then a file in
/// the temp directory.
#[flutter_rust_bridge::frb(sync)]
pub fn open_list(db_path: Option<String>) -> ListActionResponse {
    let path = resolve_db_path(db_path);
    let mut guard = match SESSION.lock() {
        Ok(guard) => guard,
        Err(_) => return ListActionResponse::failure("open_list failed: session lock poisoned"),
    };

    match open_list_controller(&path) {
        Ok(controller) => {
            let count = controller.items().len();
            *guard = Some(Session {
                db_path: path,
                controller,
            });
            info!("event=session_open module=ffi status=ok items={count}");
            ListActionResponse::success("List opened.", None, count)
        }
        Err(err) => {
            warn!("event=session_open module=ffi status=error error={err}");
            ListActionResponse::failure(format!("open_list failed: {err}"))
        }
    }
}

/// Re-reads the list and returns the current screen state.
#[flutter_rust_bridge::frb(sync)]
pub fn list_snapshot() -> ListSnapshot {
    let result = with_session(|controller| {
        controller.refresh().map_err(|err| err.to_string())?;
        Ok(snapshot_of(controller))
    });
    match result {
        Ok(snapshot) => snapshot,
        Err(err) => ListSnapshot {
            ok: false,
            items: Vec::new(),
            selecting: false,
            selected_ids: Vec::new(),
            pending_delete_id: None,
            clear_all_requested: false,
            can_seed: false,
            message: format!("list_snapshot failed: {err}"),
        },
    }
}

/// Adds an item from the add sheet. Blank titles are rejected.
#[flutter_rust_bridge::frb(sync)]
pub fn add_item(title: String, due_date: Option<String>) -> ListActionResponse {
    respond("add_item", |controller| {
        controller.set_add_title(title);
        controller.set_add_due_date(parse_due_date_arg(due_date)?);
        let item = controller.save_add().map_err(|err| err.to_string())?;
        Ok(ListActionResponse::success("Item added.", Some(item.id), 1))
    })
}

/// Replaces title and due date of an item in one call.
#[flutter_rust_bridge::frb(sync)]
pub fn edit_item(id: String, title: String, due_date: Option<String>) -> ListActionResponse {
    respond("edit_item", |controller| {
        let id = parse_item_id(&id)?;
        let patch = ItemPatch::edit(title, parse_due_date_arg(due_date)?);
        let item = controller
            .update_item(id, &patch)
            .map_err(|err| err.to_string())?;
        Ok(ListActionResponse::success("Item updated.", Some(item.id), 1))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn toggle_item(id: String) -> ListActionResponse {
    respond("toggle_item", |controller| {
        let item = controller
            .toggle_completed(parse_item_id(&id)?)
            .map_err(|err| err.to_string())?;
        let message = if item.is_completed {
            "Item completed."
        } else {
            "Item reopened."
        };
        Ok(ListActionResponse::success(message, Some(item.id), 1))
    })
}

/// Swipe-to-delete for a single item.
#[flutter_rust_bridge::frb(sync)]
pub fn delete_item(id: String) -> ListActionResponse {
    respond("delete_item", |controller| {
        let id = parse_item_id(&id)?;
        controller.delete_item(id).map_err(|err| err.to_string())?;
        Ok(ListActionResponse::success("Item deleted.", Some(id), 1))
    })
}

/// Row tap: moves the delete marker, or toggles selection in selection mode.
#[flutter_rust_bridge::frb(sync)]
pub fn tap_item(id: String) -> ListActionResponse {
    respond("tap_item", |controller| {
        let id = parse_item_id(&id)?;
        controller.tap_item(id).map_err(|err| err.to_string())?;
        Ok(ListActionResponse::success("", Some(id), 0))
    })
}

/// Opens the edit sheet for an item.
#[flutter_rust_bridge::frb(sync)]
pub fn begin_edit(id: String) -> EditDraftView {
    let result = with_session(|controller| {
        let draft = controller
            .begin_edit(parse_item_id(&id)?)
            .map_err(|err| err.to_string())?;
        Ok(EditDraftView {
            ok: true,
            item_id: Some(draft.target.to_string()),
            title: draft.title.clone(),
            due_date: draft.due_date.map(format_due_date),
            message: String::new(),
        })
    });
    result.unwrap_or_else(|err| EditDraftView {
        ok: false,
        item_id: None,
        title: String::new(),
        due_date: None,
        message: format!("begin_edit failed: {err}"),
    })
}

/// Saves the open edit sheet with the final field values.
#[flutter_rust_bridge::frb(sync)]
pub fn save_edit(title: String, due_date: Option<String>) -> ListActionResponse {
    respond("save_edit", |controller| {
        controller.set_edit_title(title).map_err(|err| err.to_string())?;
        controller
            .set_edit_due_date(parse_due_date_arg(due_date)?)
            .map_err(|err| err.to_string())?;
        let item = controller.save_edit().map_err(|err| err.to_string())?;
        Ok(ListActionResponse::success("Item updated.", Some(item.id), 1))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn cancel_edit() -> ListActionResponse {
    respond("cancel_edit", |controller| {
        controller.cancel_edit();
        Ok(ListActionResponse::success("", None, 0))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn enter_selection_mode() -> ListActionResponse {
    respond("enter_selection_mode", |controller| {
        controller.enter_selection_mode();
        Ok(ListActionResponse::success("", None, 0))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn exit_selection_mode() -> ListActionResponse {
    respond("exit_selection_mode", |controller| {
        controller.exit_selection_mode();
        Ok(ListActionResponse::success("", None, 0))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn toggle_selection(id: String) -> ListActionResponse {
    respond("toggle_selection", |controller| {
        let id = parse_item_id(&id)?;
        let selected = controller
            .toggle_selection(id)
            .map_err(|err| err.to_string())?;
        Ok(ListActionResponse::success(
            "",
            Some(id),
            usize::from(selected),
        ))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn select_all() -> ListActionResponse {
    respond("select_all", |controller| {
        controller.select_all().map_err(|err| err.to_string())?;
        Ok(ListActionResponse::success(
            "",
            None,
            controller.selected_ids().len(),
        ))
    })
}

/// Deletes the selected items and leaves selection mode.
#[flutter_rust_bridge::frb(sync)]
pub fn delete_selected() -> ListActionResponse {
    respond("delete_selected", |controller| {
        let deleted = controller
            .delete_selected()
            .map_err(|err| err.to_string())?;
        Ok(ListActionResponse::success(
            format!("Deleted {deleted} item(s)."),
            None,
            deleted,
        ))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn request_clear_all() -> ListActionResponse {
    respond("request_clear_all", |controller| {
        controller.request_clear_all();
        Ok(ListActionResponse::success(
            "Confirm to delete every item.",
            None,
            0,
        ))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn confirm_clear_all() -> ListActionResponse {
    respond("confirm_clear_all", |controller| {
        let deleted = controller
            .confirm_clear_all()
            .map_err(|err| err.to_string())?;
        Ok(ListActionResponse::success(
            format!("Deleted {deleted} item(s)."),
            None,
            deleted,
        ))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn cancel_clear_all() -> ListActionResponse {
    respond("cancel_clear_all", |controller| {
        controller.cancel_clear_all();
        Ok(ListActionResponse::success("", None, 0))
    })
}

/// Fills an empty list with the starter items.
#[flutter_rust_bridge::frb(sync)]
pub fn seed_starter_items() -> ListActionResponse {
    respond("seed_starter_items", |controller| {
        let items = controller
            .seed_starter_items()
            .map_err(|err| err.to_string())?;
        Ok(ListActionResponse::success(
            "Starter items added.",
            None,
            items.len(),
        ))
    })
}

fn respond(
    operation: &str,
    f: impl FnOnce(&mut SqliteListController) -> Result<ListActionResponse, String>,
) -> ListActionResponse {
    with_session(f).unwrap_or_else(|err| {
        warn!("event={operation} module=ffi status=error");
        ListActionResponse::failure(format!("{operation} failed: {err}"))
    })
}

/// Runs `f` against the session, opening the default database on first use.
fn with_session<T>(
    f: impl FnOnce(&mut SqliteListController) -> Result<T, String>,
) -> Result<T, String> {
    let mut guard = SESSION
        .lock()
        .map_err(|_| "session lock poisoned".to_string())?;

    if guard.is_none() {
        let db_path = resolve_db_path(None);
        let controller = open_list_controller(&db_path)?;
        *guard = Some(Session {
            db_path,
            controller,
        });
    }

    match guard.as_mut() {
        Some(session) => f(&mut session.controller),
        None => Err("list session is not open".to_string()),
    }
}

fn snapshot_of(controller: &SqliteListController) -> ListSnapshot {
    let items = controller.items();
    ListSnapshot {
        ok: true,
        items: items.iter().map(to_item_view).collect(),
        selecting: controller.is_selecting(),
        selected_ids: items
            .iter()
            .filter(|item| controller.is_selected(item.id))
            .map(|item| item.id.to_string())
            .collect(),
        pending_delete_id: controller.pending_delete().map(|id| id.to_string()),
        clear_all_requested: controller.is_clear_all_requested(),
        can_seed: controller.can_seed_starter_items(),
        message: if items.is_empty() {
            "Empty Cart".to_string()
        } else {
            format!("{} item(s).", items.len())
        },
    }
}

fn to_item_view(item: &Item) -> ItemView {
    ItemView {
        id: item.id.to_string(),
        title: item.title.clone(),
        is_completed: item.is_completed,
        due_date: item.due_date.map(format_due_date),
    }
}

fn parse_item_id(raw: &str) -> Result<ItemId, String> {
    Uuid::parse_str(raw.trim()).map_err(|_| format!("invalid item id `{raw}`"))
}

fn parse_due_date_arg(raw: Option<String>) -> Result<Option<NaiveDate>, String> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_due_date(value)
            .map(Some)
            .ok_or_else(|| format!("invalid due date `{value}`; expected YYYY-MM-DD")),
    }
}

fn resolve_db_path(explicit: Option<String>) -> PathBuf {
    let from_env = std::env::var(DB_PATH_ENV).ok();
    [explicit, from_env]
        .into_iter()
        .flatten()
        .map(|raw| raw.trim().to_string())
        .find(|trimmed| !trimmed.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join(DB_FILE_NAME))
}

/// Path of the open session database, if any.
#[flutter_rust_bridge::frb(sync)]
pub fn session_db_path() -> Option<String> {
    SESSION.lock().ok().and_then(|guard| {
        guard
            .as_ref()
            .map(|session| session.db_path.display().to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::{
        add_item, begin_edit, cancel_clear_all, confirm_clear_all, core_version, delete_item,
        delete_selected, edit_item, enter_selection_mode, exit_selection_mode, init_logging,
        list_snapshot, open_list, parse_due_date_arg, parse_item_id, ping, request_clear_all,
        resolve_db_path, save_edit, seed_starter_items, session_db_path, tap_item, toggle_item,
        toggle_selection, SESSION,
    };
    use chrono::NaiveDate;

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_bad_input() {
        assert!(!init_logging("info".to_string(), String::new()).is_empty());
        assert!(!init_logging("verbose".to_string(), "/tmp/logs".to_string()).is_empty());
    }

    #[test]
    fn due_date_arguments_parse_or_fail_loudly() {
        assert_eq!(parse_due_date_arg(None).unwrap(), None);
        assert_eq!(parse_due_date_arg(Some("  ".to_string())).unwrap(), None);
        assert_eq!(
            parse_due_date_arg(Some("2024-01-01".to_string())).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert!(parse_due_date_arg(Some("01/01/2024".to_string()))
            .unwrap_err()
            .contains("YYYY-MM-DD"));
    }

    #[test]
    fn item_ids_must_be_uuids() {
        assert!(parse_item_id("not-an-id").is_err());
        assert!(parse_item_id(" 67e55044-10b1-426f-9247-bb680e5fe0c8 ").is_ok());
    }

    #[test]
    fn explicit_db_path_wins_over_fallbacks() {
        let path = resolve_db_path(Some(" /data/grocery.db ".to_string()));
        assert_eq!(path, std::path::PathBuf::from("/data/grocery.db"));
        assert!(!resolve_db_path(Some("   ".to_string()))
            .as_os_str()
            .is_empty());
    }

    // The session is process-wide, so the whole screen flow lives in one test.
    #[test]
    fn list_screen_flow_over_ffi() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("ffi.db");
        let opened = open_list(Some(db_path.display().to_string()));
        assert!(opened.ok, "{}", opened.message);
        assert_eq!(session_db_path(), Some(db_path.display().to_string()));

        let snapshot = list_snapshot();
        assert!(snapshot.ok);
        assert!(snapshot.items.is_empty());
        assert!(snapshot.can_seed);

        let rejected = add_item("   ".to_string(), None);
        assert!(!rejected.ok);
        let bad_date = add_item("Eggs".to_string(), Some("tomorrow".to_string()));
        assert!(!bad_date.ok);

        let milk = add_item("Milk".to_string(), None);
        let eggs = add_item("Eggs".to_string(), Some("2024-01-01".to_string()));
        assert!(milk.ok && eggs.ok, "{} / {}", milk.message, eggs.message);
        let milk_id = milk.item_id.unwrap();
        let eggs_id = eggs.item_id.unwrap();

        assert!(toggle_item(milk_id.clone()).ok);
        let snapshot = list_snapshot();
        assert_eq!(snapshot.items.len(), 2);
        assert_eq!(snapshot.items[0].title, "Milk");
        assert!(snapshot.items[0].is_completed);
        assert_eq!(snapshot.items[1].due_date.as_deref(), Some("2024-01-01"));
        assert!(!snapshot.can_seed);

        assert!(tap_item(eggs_id.clone()).ok);
        assert_eq!(
            list_snapshot().pending_delete_id.as_deref(),
            Some(eggs_id.as_str())
        );

        let draft = begin_edit(eggs_id.clone());
        assert!(draft.ok, "{}", draft.message);
        assert_eq!(draft.title, "Eggs");
        assert_eq!(draft.due_date.as_deref(), Some("2024-01-01"));
        assert!(!save_edit(String::new(), None).ok);
        assert!(save_edit("Brown eggs".to_string(), None).ok);
        let edited = edit_item(
            milk_id.clone(),
            "Oat milk".to_string(),
            Some("2024-02-02".to_string()),
        );
        assert!(edited.ok, "{}", edited.message);

        let snapshot = list_snapshot();
        assert_eq!(snapshot.items[0].title, "Oat milk");
        assert_eq!(snapshot.items[1].title, "Brown eggs");
        assert_eq!(snapshot.items[1].due_date, None);

        assert!(!toggle_selection(milk_id.clone()).ok);
        assert!(enter_selection_mode().ok);
        assert!(toggle_selection(eggs_id.clone()).ok);
        assert_eq!(list_snapshot().selected_ids, vec![eggs_id.clone()]);
        assert!(exit_selection_mode().ok);
        assert_eq!(list_snapshot().items.len(), 2);

        assert!(enter_selection_mode().ok);
        assert!(toggle_selection(eggs_id.clone()).ok);
        let deleted = delete_selected();
        assert!(deleted.ok);
        assert_eq!(deleted.affected, 1);
        assert!(!list_snapshot().selecting);

        assert!(!delete_item(eggs_id).ok);

        assert!(!confirm_clear_all().ok);
        assert!(request_clear_all().ok);
        assert!(list_snapshot().clear_all_requested);
        assert!(cancel_clear_all().ok);
        assert!(request_clear_all().ok);
        let cleared = confirm_clear_all();
        assert!(cleared.ok);
        assert_eq!(cleared.affected, 1);

        let seeded = seed_starter_items();
        assert!(seeded.ok, "{}", seeded.message);
        assert_eq!(seeded.affected, 5);
        assert!(!seed_starter_items().ok);
        assert_eq!(list_snapshot().items.len(), 5);

        let run_sql = |sql: &str| {
            let guard = SESSION.lock().unwrap();
            let session = guard.as_ref().unwrap();
            session
                .controller
                .store()
                .repository()
                .connection()
                .execute_batch(sql)
                .unwrap();
        };
        run_sql("INSERT INTO items (uuid, title) VALUES ('not-a-uuid', 'Broken');");
        let broken = list_snapshot();
        assert!(!broken.ok);
        assert!(broken.message.contains("persistence failure"), "{}", broken.message);
        assert!(!open_list(Some(db_path.display().to_string())).ok);

        run_sql("DELETE FROM items WHERE uuid = 'not-a-uuid';");
        assert!(list_snapshot().ok);
    }
}
