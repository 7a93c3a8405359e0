use anyhow::{anyhow, Context, Result};
use rusqlite::Connection;

use crate::db::schema;

const LATEST_SCHEMA_VERSION: i64 = 1;

/// Bring the database up to the latest schema version, tracked via SQLite's
/// `user_version` pragma. Safe to call on every open.
pub fn migrate(conn: &Connection) -> Result<()> {
    let current = schema_version(conn)?;
    if current > LATEST_SCHEMA_VERSION {
        return Err(anyhow!(
            "database schema version {current} is newer than supported version {LATEST_SCHEMA_VERSION}"
        ));
    }

    if current < 1 {
        schema::create_schema(conn).context("apply schema migration v1")?;
        set_schema_version(conn, 1)?;
    }

    Ok(())
}

pub fn schema_version(conn: &Connection) -> Result<i64> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
        .context("read schema version pragma")
}

fn set_schema_version(conn: &Connection, version: i64) -> Result<()> {
    // PRAGMA does not accept bound parameters.
    conn.execute_batch(&format!("PRAGMA user_version = {version}"))
        .with_context(|| format!("set schema version to {version}"))
}
