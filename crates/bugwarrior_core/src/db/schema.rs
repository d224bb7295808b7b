//! Ordered schema steps for the task database.
//!
//! # Invariants
//! - Step `n` (1-based) takes `PRAGMA user_version` from `n - 1` to `n`.
//! - Steps are append-only; a shipped step is never edited.

use crate::repo::task_repo::{RepoError, RepoResult};
use log::debug;
use rusqlite::Connection;

const STEPS: &[&str] = &[
    include_str!("migrations/0001_tasks.sql"),
    include_str!("migrations/0002_annotations.sql"),
];

/// Schema version written by this build.
pub const SCHEMA_VERSION: u32 = STEPS.len() as u32;

/// Runs every step the database has not seen yet, in one transaction.
pub(crate) fn upgrade(conn: &mut Connection) -> RepoResult<()> {
    let found: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    if found > SCHEMA_VERSION {
        return Err(RepoError::SchemaTooNew {
            found,
            supported: SCHEMA_VERSION,
        });
    }

    let pending = &STEPS[found as usize..];
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for (version, sql) in (found + 1..).zip(pending) {
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", version)?;
        debug!("event=db_upgrade module=db status=ok version={version}");
    }
    tx.commit()?;
    Ok(())
}
