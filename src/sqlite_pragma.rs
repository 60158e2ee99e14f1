//! Shared SQLite connection tuning
//!
//! Every handle opened by the trace store goes through `apply_optimized_pragmas`
//! so writers (analysis/grant engines) and readers (trace lookups, operator
//! tools) see the same journal and sync settings.

use rusqlite::Connection;

/// WAL auto-checkpoint threshold in pages
pub const WAL_AUTOCHECKPOINT_PAGES: i64 = 1000;

/// Apply PRAGMAs: WAL, NORMAL sync, MEMORY temp store, mmap, cache, autocheckpoint
///
/// `busy_timeout` lets concurrent writers wait for the lock instead of
/// failing immediately with SQLITE_BUSY.
pub fn apply_optimized_pragmas(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;
    conn.pragma_update(None, "mmap_size", 268_435_456i64)?;
    conn.pragma_update(None, "cache_size", -64_000i64)?;
    conn.pragma_update(None, "wal_autocheckpoint", WAL_AUTOCHECKPOINT_PAGES)?;
    conn.busy_timeout(std::time::Duration::from_secs(5))?;

    log::debug!("📊 SQLite PRAGMAs applied (WAL, NORMAL, MEMORY, mmap, cache)");
    Ok(())
}
