//! # repsync
//!
//! Reputation trace log and rank role synchronization for a chat reputation
//! bot.
//!
//! - `trace` - per-message record of the analysis outcome and every grant,
//!   stored in SQLite
//! - `roles` - dedup window cache, message hook and calendar sweeps that keep
//!   rank roles current
//!
//! Pattern analysis, grant decisions and role computation are done by the
//! caller's engines; this crate records their results and decides when roles
//! get recomputed.

pub mod config;
pub mod roles;
pub mod sqlite_pragma;
pub mod trace;

pub use config::RuntimeConfig;
