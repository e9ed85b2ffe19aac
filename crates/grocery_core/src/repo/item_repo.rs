//! Item repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and bulk-delete APIs over the `items` table.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Listing order is insertion order (`seq ASC`).
//! - Multi-row writes run inside one transaction.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::item::{Item, ItemId, ItemPatch, ItemValidationError};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const ITEM_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    is_completed,
    due_date
FROM items";

const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for item persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ItemValidationError),
    Db(DbError),
    NotFound(ItemId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "item not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted item data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<ItemValidationError> for RepoError {
    fn from(value: ItemValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for grocery items.
pub trait ItemRepository {
    fn insert_item(&self, item: &Item) -> RepoResult<ItemId>;
    /// Applies `patch` atomically and returns the stored result.
    fn update_item(&self, id: ItemId, patch: &ItemPatch) -> RepoResult<Item>;
    fn toggle_completed(&self, id: ItemId) -> RepoResult<Item>;
    fn get_item(&self, id: ItemId) -> RepoResult<Option<Item>>;
    fn list_items(&self) -> RepoResult<Vec<Item>>;
    fn count_items(&self) -> RepoResult<usize>;
    fn delete_item(&self, id: ItemId) -> RepoResult<()>;
    /// Deletes every listed id that exists; returns how many rows went away.
    fn delete_items(&self, ids: &HashSet<ItemId>) -> RepoResult<usize>;
    fn clear_items(&self) -> RepoResult<usize>;
}

/// SQLite-backed item repository owning its connection.
pub struct SqliteItemRepository {
    conn: Connection,
}

impl SqliteItemRepository {
    /// Wraps a migrated connection (see [`crate::db::open_db`]).
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl ItemRepository for SqliteItemRepository {
    fn insert_item(&self, item: &Item) -> RepoResult<ItemId> {
        item.validate()?;

        self.conn.execute(
            "INSERT INTO items (uuid, title, is_completed, due_date)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                item.id.to_string(),
                item.title.as_str(),
                bool_to_int(item.is_completed),
                item.due_date.map(format_due_date),
            ],
        )?;

        Ok(item.id)
    }

    fn update_item(&self, id: ItemId, patch: &ItemPatch) -> RepoResult<Item> {
        patch.validate()?;

        let tx = self.conn.unchecked_transaction()?;
        let mut item = select_item(&tx, id)?.ok_or(RepoError::NotFound(id))?;
        item.apply(patch);
        item.validate()?;

        tx.execute(
            "UPDATE items
             SET
                title = ?1,
                is_completed = ?2,
                due_date = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?4;",
            params![
                item.title.as_str(),
                bool_to_int(item.is_completed),
                item.due_date.map(format_due_date),
                id.to_string(),
            ],
        )?;
        tx.commit()?;

        Ok(item)
    }

    fn toggle_completed(&self, id: ItemId) -> RepoResult<Item> {
        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE items
             SET
                is_completed = 1 - is_completed,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        let item = select_item(&tx, id)?.ok_or(RepoError::NotFound(id))?;
        tx.commit()?;
        Ok(item)
    }

    fn get_item(&self, id: ItemId) -> RepoResult<Option<Item>> {
        select_item(&self.conn, id)
    }

    fn list_items(&self) -> RepoResult<Vec<Item>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ITEM_SELECT_SQL} ORDER BY seq ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();

        while let Some(row) = rows.next()? {
            items.push(parse_item_row(row)?);
        }

        Ok(items)
    }

    fn count_items(&self) -> RepoResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM items;", [], |row| row.get(0))?;
        usize::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative item count `{count}`")))
    }

    fn delete_item(&self, id: ItemId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM items WHERE uuid = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn delete_items(&self, ids: &HashSet<ItemId>) -> RepoResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let tx = self.conn.unchecked_transaction()?;
        let mut deleted = 0;
        {
            let mut stmt = tx.prepare("DELETE FROM items WHERE uuid = ?1;")?;
            for id in ids {
                deleted += stmt.execute([id.to_string()])?;
            }
        }
        tx.commit()?;

        Ok(deleted)
    }

    fn clear_items(&self) -> RepoResult<usize> {
        Ok(self.conn.execute("DELETE FROM items;", [])?)
    }
}

fn select_item(conn: &Connection, id: ItemId) -> RepoResult<Option<Item>> {
    let mut stmt = conn.prepare(&format!("{ITEM_SELECT_SQL} WHERE uuid = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    match rows.next()? {
        Some(row) => Ok(Some(parse_item_row(row)?)),
        None => Ok(None),
    }
}

fn parse_item_row(row: &Row<'_>) -> RepoResult<Item> {
    let uuid_text: String = row.get("uuid")?;
    let id = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in items.uuid"))
    })?;

    let is_completed = match row.get::<_, i64>("is_completed")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_completed value `{other}` in items.is_completed"
            )));
        }
    };

    let due_date = row
        .get::<_, Option<String>>("due_date")?
        .map(|value| {
            parse_due_date(&value).ok_or_else(|| {
                RepoError::InvalidData(format!("invalid due date `{value}` in items.due_date"))
            })
        })
        .transpose()?;

    let item = Item {
        id,
        title: row.get("title")?,
        is_completed,
        due_date,
    };
    item.validate()
        .map_err(|_| RepoError::InvalidData(format!("blank title for item {id}")))?;
    Ok(item)
}

/// Formats a due date the way it is stored (`YYYY-MM-DD`).
pub fn format_due_date(date: NaiveDate) -> String {
    date.format(DUE_DATE_FORMAT).to_string()
}

/// Parses a stored or user-supplied `YYYY-MM-DD` due date.
pub fn parse_due_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DUE_DATE_FORMAT).ok()
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
