//! Key-value container schema.
//!
//! The container holds one table, `kv_entries`. Its version lives in
//! `PRAGMA user_version`; blob formats stored inside are not versioned here.

use super::{DbError, DbResult};
use log::info;
use rusqlite::Connection;
use std::cmp::Ordering;

/// Container schema version written by this binary.
pub const SCHEMA_VERSION: u32 = 1;

const KV_SCHEMA_SQL: &str = include_str!("kv_schema.sql");

/// Creates `kv_entries` on a fresh database and stamps the version.
///
/// A database written by a newer binary is refused rather than reused.
pub fn ensure_schema(conn: &Connection) -> DbResult<()> {
    let found = schema_version(conn)?;
    match found.cmp(&SCHEMA_VERSION) {
        Ordering::Equal => Ok(()),
        Ordering::Greater => Err(DbError::NewerSchema {
            found,
            supported: SCHEMA_VERSION,
        }),
        Ordering::Less => {
            let tx = conn.unchecked_transaction()?;
            tx.execute_batch(KV_SCHEMA_SQL)?;
            tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
            tx.commit()?;
            info!(
                "event=db_schema module=db status=ok from_version={} to_version={}",
                found, SCHEMA_VERSION
            );
            Ok(())
        }
    }
}

/// Reads the container schema version (`0` for a fresh file).
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?)
}
