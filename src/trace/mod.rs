//! # Reputation trace store
//!
//! Durable record of what happened to a message:
//! - `analysis_records` - one analysis outcome per `(guild_id, message_id)`,
//!   first writer wins
//! - `grant_records` - every reputation grant attributed to the message,
//!   append-only, read back oldest first
//!
//! `TraceStore::get_trace` joins both into a `Trace`.
//!
//! ## Module Organization
//!
//! - `codec` - JSON encode/decode, tolerant of unknown fields
//! - `types` - record and trace types
//! - `db` - storage trait, SQLite backend, schema migrations
//! - `store` - typed facade with logging write semantics

pub mod codec;
pub mod db;
pub mod error;
pub mod store;
pub mod types;

pub use codec::CodecError;
pub use db::{run_schema_migrations, PruneStats, SqliteTraceDb, TraceDb};
pub use error::TraceError;
pub use store::TraceStore;
pub use types::{AnalysisRecord, AnalyzerResult, GrantRecord, MessageRef, Trace};
