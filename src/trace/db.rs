//! Trace storage trait and SQLite backend
//!
//! Tables (see `/sql/`):
//! - `analysis_records` - INSERT ... ON CONFLICT DO NOTHING (one row per message)
//! - `grant_records` - INSERT (append-only, many rows per message)
//!
//! Rows cross this boundary still encoded; `TraceStore` owns the codec.

use super::error::TraceError;
use super::types::{AnalysisRow, GrantRow, MessageRef};
use crate::sqlite_pragma::apply_optimized_pragmas;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Rows removed by a retention pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneStats {
    pub analyses: usize,
    pub grants: usize,
}

/// Persistence backend for analysis and grant rows
#[async_trait]
pub trait TraceDb: Send + Sync {
    /// Insert the analysis row unless one already exists for
    /// `(guild_id, message_id)`.
    ///
    /// Returns `true` if this call wrote the row, `false` if an earlier
    /// writer won.
    async fn insert_analysis(&self, row: &AnalysisRow) -> Result<bool, TraceError>;

    /// Append a grant row
    async fn append_grant(
        &self,
        message: MessageRef,
        result: &str,
        submitted_at: DateTime<Utc>,
    ) -> Result<(), TraceError>;

    async fn find_analysis(
        &self,
        guild_id: u64,
        message_id: u64,
    ) -> Result<Option<AnalysisRow>, TraceError>;

    /// All grants for a message, oldest first. Grants with the same
    /// `submitted_at` come back in insertion order.
    async fn find_grants(&self, guild_id: u64, message_id: u64) -> Result<Vec<GrantRow>, TraceError>;

    /// Delete rows recorded before `cutoff`
    async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<PruneStats, TraceError>;
}

/// Run schema migrations from SQL files
///
/// Reads all .sql files from `schema_dir` in filename order and executes
/// them. Every file uses "IF NOT EXISTS" so this is safe on each start.
pub fn run_schema_migrations(conn: &mut Connection, schema_dir: &str) -> Result<(), TraceError> {
    let schema_path = Path::new(schema_dir);

    if !schema_path.exists() {
        return Err(TraceError::SchemaDirMissing(schema_dir.to_string()));
    }

    let mut sql_files: Vec<_> = fs::read_dir(schema_path)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().extension().and_then(|s| s.to_str()) == Some("sql"))
        .collect();

    sql_files.sort_by_key(|entry| entry.file_name());

    log::info!("🔧 Running schema migrations from: {}", schema_dir);

    for entry in sql_files {
        let path = entry.path();
        let filename = entry.file_name().to_string_lossy().into_owned();

        let sql_content = fs::read_to_string(&path)?;
        conn.execute_batch(&sql_content)?;

        log::info!("   ├─ ✅ {}", filename);
    }

    log::info!("   └─ Schema ready");
    Ok(())
}

// Discord snowflakes fit in 63 bits; the cast round-trips either way.
fn to_sql_id(id: u64) -> i64 {
    id as i64
}

fn from_sql_id(id: i64) -> u64 {
    id as u64
}

fn to_sql_time(at: DateTime<Utc>) -> i64 {
    at.timestamp_micros()
}

fn from_sql_time(micros: i64) -> Result<DateTime<Utc>, TraceError> {
    DateTime::from_timestamp_micros(micros).ok_or(TraceError::InvalidTimestamp(micros))
}

/// SQLite implementation of `TraceDb`
///
/// A single connection behind a mutex. Writes are single statements, so no
/// cross-table transaction is needed: readers may see an analysis without
/// its grants (or the reverse) while a message is still being processed.
#[derive(Clone)]
pub struct SqliteTraceDb {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteTraceDb {
    /// Open the database and run migrations from `schema_dir`
    pub fn open_with_schema(db_path: impl AsRef<Path>, schema_dir: &str) -> Result<Self, TraceError> {
        let mut conn = Connection::open(db_path)?;
        apply_optimized_pragmas(&conn)?;
        run_schema_migrations(&mut conn, schema_dir)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl TraceDb for SqliteTraceDb {
    async fn insert_analysis(&self, row: &AnalysisRow) -> Result<bool, TraceError> {
        let conn = self.lock();

        let inserted = conn.execute(
            r#"
            INSERT INTO analysis_records (guild_id, channel_id, message_id, snapshot, analyzed_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (guild_id, message_id) DO NOTHING
            "#,
            params![
                to_sql_id(row.message.guild_id),
                to_sql_id(row.message.channel_id),
                to_sql_id(row.message.message_id),
                row.snapshot,
                to_sql_time(row.analyzed_at),
            ],
        )?;

        Ok(inserted == 1)
    }

    async fn append_grant(
        &self,
        message: MessageRef,
        result: &str,
        submitted_at: DateTime<Utc>,
    ) -> Result<(), TraceError> {
        let conn = self.lock();

        conn.execute(
            r#"
            INSERT INTO grant_records (guild_id, channel_id, message_id, result, submitted_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                to_sql_id(message.guild_id),
                to_sql_id(message.channel_id),
                to_sql_id(message.message_id),
                result,
                to_sql_time(submitted_at),
            ],
        )?;

        Ok(())
    }

    async fn find_analysis(
        &self,
        guild_id: u64,
        message_id: u64,
    ) -> Result<Option<AnalysisRow>, TraceError> {
        let raw = {
            let conn = self.lock();
            conn.query_row(
                r#"
                SELECT channel_id, snapshot, analyzed_at
                FROM analysis_records
                WHERE guild_id = ?1 AND message_id = ?2
                "#,
                params![to_sql_id(guild_id), to_sql_id(message_id)],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, i64>(2)?)),
            )
            .optional()?
        };

        match raw {
            Some((channel_id, snapshot, analyzed_at)) => Ok(Some(AnalysisRow {
                message: MessageRef::new(guild_id, from_sql_id(channel_id), message_id),
                snapshot,
                analyzed_at: from_sql_time(analyzed_at)?,
            })),
            None => Ok(None),
        }
    }

    async fn find_grants(&self, guild_id: u64, message_id: u64) -> Result<Vec<GrantRow>, TraceError> {
        let raw: Vec<(i64, String, i64)> = {
            let conn = self.lock();
            let mut stmt = conn.prepare(
                r#"
                SELECT channel_id, result, submitted_at
                FROM grant_records
                WHERE guild_id = ?1 AND message_id = ?2
                ORDER BY submitted_at ASC, id ASC
                "#,
            )?;

            let rows = stmt.query_map(params![to_sql_id(guild_id), to_sql_id(message_id)], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })?;
            let collected = rows.collect::<Result<Vec<_>, _>>()?;
            collected
        };

        raw.into_iter()
            .map(|(channel_id, result, submitted_at)| -> Result<GrantRow, TraceError> {
                Ok(GrantRow {
                    message: MessageRef::new(guild_id, from_sql_id(channel_id), message_id),
                    result,
                    submitted_at: from_sql_time(submitted_at)?,
                })
            })
            .collect()
    }

    async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<PruneStats, TraceError> {
        let conn = self.lock();
        let cutoff = to_sql_time(cutoff);

        let analyses = conn.execute(
            "DELETE FROM analysis_records WHERE analyzed_at < ?1",
            params![cutoff],
        )?;
        let grants = conn.execute(
            "DELETE FROM grant_records WHERE submitted_at < ?1",
            params![cutoff],
        )?;

        Ok(PruneStats { analyses, grants })
    }
}
