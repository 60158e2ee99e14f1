//! Message Trace - print why a message did (or did not) grant reputation
//!
//! Looks up the analysis outcome and every grant recorded for one message and
//! prints them as JSON. Rows are decoded schemaless, so traces written by any
//! engine version can be inspected.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin message_trace -- --guild <GUILD_ID> --message <MESSAGE_ID>
//! ```
//!
//! Exit code 1 when no trace exists for the message.
//!
//! ## Environment Variables
//!
//! - `REPSYNC_DB_PATH` - SQLite database (default: repsync.db)
//! - `REPSYNC_SCHEMA_DIR` - schema files (default: sql)
//! - `RUST_LOG` - Log level (default: info)

use dotenv::dotenv;
use repsync::trace::{SqliteTraceDb, Trace, TraceStore};
use repsync::RuntimeConfig;
use serde_json::Value;
use std::sync::Arc;

fn parse_id_arg(args: &[String], flag: &str) -> Result<u64, Box<dyn std::error::Error>> {
    let raw = args
        .windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].clone())
        .ok_or_else(|| {
            format!(
                "Missing {} argument. Usage: message_trace --guild <GUILD_ID> --message <MESSAGE_ID>",
                flag
            )
        })?;

    raw.parse::<u64>()
        .map_err(|_| format!("Invalid {} value: {}", flag, raw).into())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let guild_id = parse_id_arg(&args, "--guild")?;
    let message_id = parse_id_arg(&args, "--message")?;

    let config = RuntimeConfig::from_env()?;
    log::info!("🔎 Looking up trace for message {} in guild {}", message_id, guild_id);
    log::info!("   └─ Database: {}", config.db_path);

    let db = SqliteTraceDb::open_with_schema(&config.db_path, &config.schema_dir)?;
    let store = TraceStore::new(Arc::new(db));

    let trace: Option<Trace<Value, Value>> = store.get_trace(guild_id, message_id).await?;

    match trace {
        Some(trace) => {
            log::info!(
                "✅ Found trace: analysis {}, {} grants",
                if trace.analysis.is_some() { "present" } else { "absent" },
                trace.grants.len()
            );
            println!("{}", serde_json::to_string_pretty(&trace)?);
            Ok(())
        }
        None => {
            log::warn!("⚠️  No trace recorded for message {}", message_id);
            std::process::exit(1);
        }
    }
}
