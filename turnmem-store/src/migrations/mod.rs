//! Migration ledger and the ordered list of schema migrations.
//!
//! Each migration is one `.sql` file, loaded with `include_str!` and run
//! inside its own transaction alongside the ledger insert (spec §4.2).

use rusqlite::Connection;

use crate::error::Result;
use crate::error::StoreErr;

pub struct Migration {
    pub version: i64,
    pub description: &'static str,
    pub sql: &'static str,
}

pub fn all() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            description: "initial schema: sessions, prompts, observations, summaries, queue",
            sql: include_str!("m0001_init.sql"),
        },
        Migration {
            version: 2,
            description: "external-content FTS5 index over observations",
            sql: include_str!("m0002_fts.sql"),
        },
    ]
}

/// Create the ledger table if absent. Must run before any migration.
pub fn ensure_ledger(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS migration_ledger (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        );",
    )
    .map_err(|source| StoreErr::Migration {
        version: 0,
        source,
    })?;
    Ok(())
}

fn applied_versions(conn: &Connection) -> Result<Vec<i64>> {
    let mut stmt = conn
        .prepare("SELECT version FROM migration_ledger ORDER BY version")
        .map_err(|source| StoreErr::Migration { version: 0, source })?;
    let rows = stmt
        .query_map([], |row| row.get::<_, i64>(0))
        .map_err(|source| StoreErr::Migration { version: 0, source })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(|source| StoreErr::Migration { version: 0, source })?);
    }
    Ok(out)
}

/// Run every migration newer than the ledger's max applied version, in
/// ascending order, each inside its own transaction with the ledger
/// insert. Never re-runs or edits an already-applied migration. Partial
/// failure rolls back that migration and halts (returns an error).
pub fn run(conn: &mut Connection) -> Result<()> {
    ensure_ledger(conn)?;
    let applied = applied_versions(conn)?;

    for migration in all() {
        if applied.contains(&migration.version) {
            continue;
        }
        tracing::info!(
            version = migration.version,
            description = migration.description,
            "applying migration"
        );
        let tx = conn
            .transaction()
            .map_err(|source| StoreErr::Migration { version: migration.version, source })?;
        tx.execute_batch(migration.sql)
            .map_err(|source| StoreErr::Migration { version: migration.version, source })?;
        tx.execute(
            "INSERT INTO migration_ledger (version, applied_at) VALUES (?1, ?2)",
            rusqlite::params![migration.version, crate::now_epoch()],
        )
        .map_err(|source| StoreErr::Migration { version: migration.version, source })?;
        tx.commit()
            .map_err(|source| StoreErr::Migration { version: migration.version, source })?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "mod.test.rs"]
mod tests;
