//! Schema migrations, tracked through `PRAGMA user_version`.
//!
//! [`MIGRATIONS`] lists every step in order. Opening a [`Database`](crate::Database)
//! applies the ones above the stored version, each in its own transaction
//! together with the version bump.

pub mod v001_initial;

use rusqlite::Connection;

use crate::error::{Result, StoreError};

type Step = fn(&Connection) -> rusqlite::Result<()>;

const MIGRATIONS: &[(u32, &str, Step)] = &[(1, "v001_initial", v001_initial::up)];

/// Schema version after all migrations ran.
pub const CURRENT_VERSION: u32 = MIGRATIONS[MIGRATIONS.len() - 1].0;

pub fn run_migrations(conn: &Connection) -> Result<()> {
    let stored: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if stored > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema v{stored} is newer than this build (v{CURRENT_VERSION})"
        )));
    }

    for &(version, name, step) in MIGRATIONS.iter().filter(|(v, _, _)| *v > stored) {
        tracing::info!(version, name, "applying migration");

        let tx = conn.unchecked_transaction()?;
        step(&tx).map_err(|e| StoreError::Migration(format!("{name}: {e}")))?;
        tx.pragma_update(None, "user_version", version)?;
        tx.commit()?;
    }

    Ok(())
}
