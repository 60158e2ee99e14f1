//! Trace Retention - drop analysis and grant rows past their retention
//!
//! Meant to run from cron. Rows recorded more than `TRACE_RETENTION_HOURS`
//! ago are deleted from both tables.
//!
//! ## Environment Variables
//!
//! - `REPSYNC_DB_PATH` - SQLite database (default: repsync.db)
//! - `REPSYNC_SCHEMA_DIR` - schema files (default: sql)
//! - `TRACE_RETENTION_HOURS` - retention (default: 168)
//! - `RUST_LOG` - Log level (default: info)

use chrono::Utc;
use dotenv::dotenv;
use repsync::trace::{SqliteTraceDb, TraceStore};
use repsync::RuntimeConfig;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = RuntimeConfig::from_env()?;
    let cutoff = Utc::now() - chrono::Duration::from_std(config.retention)?;

    log::info!("🧹 Trace retention");
    log::info!("   ├─ Database: {}", config.db_path);
    log::info!("   └─ Cutoff: {}", cutoff);

    let db = SqliteTraceDb::open_with_schema(&config.db_path, &config.schema_dir)?;
    let store = TraceStore::new(Arc::new(db));

    let stats = store.prune_before(cutoff).await?;

    log::info!(
        "✅ Retention done: {} analyses, {} grants removed",
        stats.analyses,
        stats.grants
    );
    Ok(())
}
