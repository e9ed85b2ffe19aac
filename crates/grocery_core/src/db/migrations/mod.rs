//! Schema steps for the grocery list database.
//!
//! Step `n` (1-based) upgrades a database at `user_version = n - 1`. Steps
//! only ever get appended; a shipped step is never edited.

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::Connection;

const SCHEMA_STEPS: &[&str] = &[include_str!("0001_items.sql")];

/// Schema version reached after every known step has run.
pub fn latest_version() -> u32 {
    u32::try_from(SCHEMA_STEPS.len()).unwrap_or(u32::MAX)
}

/// Runs the steps the database has not seen yet, all in one transaction.
///
/// # Errors
/// - `SchemaTooNew` when the file is ahead of this build.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let found: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    let supported = latest_version();
    if found > supported {
        return Err(DbError::SchemaTooNew { found, supported });
    }

    if found == supported {
        debug!("event=db_migrate module=db status=current version={found}");
        return Ok(());
    }

    let tx = conn.transaction()?;
    let pending = SCHEMA_STEPS.iter().skip(found as usize);
    for (version, sql) in (found + 1..).zip(pending) {
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", version)?;
    }
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from={found} to={supported}");
    Ok(())
}
