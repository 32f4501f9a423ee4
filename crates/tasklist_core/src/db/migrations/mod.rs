//! Ordered schema steps for the task store.
//!
//! Steps are numbered from 1 without gaps. All pending steps run inside one
//! transaction; `user_version` is bumped after each step so a failure leaves
//! the file at its previous version.

use crate::db::{DbError, DbResult};
use log::{info, warn};
use rusqlite::{Connection, Transaction};

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "users_sessions",
        sql: include_str!("0001_users_sessions.sql"),
    },
    Migration {
        version: 2,
        name: "tasks",
        sql: include_str!("0002_tasks.sql"),
    },
    Migration {
        version: 3,
        name: "tasks_list_order_idx",
        sql: include_str!("0003_tasks_list_order_idx.sql"),
    },
];

pub fn latest_version() -> u32 {
    MIGRATIONS.len() as u32
}

/// Brings the schema to [`latest_version`]. Returns the number of steps applied.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<usize> {
    let from = current_user_version(conn)?;
    let latest = latest_version();
    if from > latest {
        warn!("event=db_migrate module=db status=rejected db_version={from} latest={latest}");
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from,
            latest_supported: latest,
        });
    }

    let pending: Vec<&Migration> = MIGRATIONS.iter().filter(|m| m.version > from).collect();
    if pending.is_empty() {
        return Ok(0);
    }

    let tx = conn.transaction()?;
    for migration in &pending {
        run_step(&tx, migration).map_err(|source| DbError::Migration {
            version: migration.version,
            name: migration.name,
            source,
        })?;
        info!(
            "event=db_migrate module=db status=ok version={} name={}",
            migration.version, migration.name
        );
    }
    tx.commit()?;
    Ok(pending.len())
}

fn run_step(tx: &Transaction<'_>, migration: &Migration) -> rusqlite::Result<()> {
    tx.execute_batch(migration.sql)?;
    tx.pragma_update(None, "user_version", migration.version)
}

/// Schema version stamped on the connection.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get::<_, u32>(0))?)
}
