//! Trace record types
//!
//! Raw rows (`AnalysisRow`, `GrantRow`) hold the encoded text as stored.
//! Decoded records (`AnalysisRecord`, `GrantRecord`, `Trace`) are what
//! `TraceStore::get_trace` hands back to callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifies the message an analysis or grant belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageRef {
    pub guild_id: u64,
    pub channel_id: u64,
    pub message_id: u64,
}

impl MessageRef {
    pub fn new(guild_id: u64, channel_id: u64, message_id: u64) -> Self {
        Self {
            guild_id,
            channel_id,
            message_id,
        }
    }
}

/// Outcome of the pattern-analysis engine for one message
///
/// Only the snapshot is persisted, so the full result may hold data that
/// is not serializable.
pub trait AnalyzerResult {
    type Snapshot: Serialize;

    fn to_snapshot(&self) -> Self::Snapshot;
}

/// Stored analysis row, snapshot still encoded
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRow {
    pub message: MessageRef,
    pub snapshot: String,
    pub analyzed_at: DateTime<Utc>,
}

/// Stored grant row, result still encoded
#[derive(Debug, Clone, PartialEq)]
pub struct GrantRow {
    pub message: MessageRef,
    pub result: String,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord<S> {
    pub guild_id: u64,
    pub channel_id: u64,
    pub message_id: u64,
    pub snapshot: S,
    pub analyzed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrantRecord<R> {
    pub guild_id: u64,
    pub channel_id: u64,
    pub message_id: u64,
    pub result: R,
    pub submitted_at: DateTime<Utc>,
}

/// Combined view of one message: its analysis (if any) and every grant in
/// submission order. Never constructed when both are empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace<S, R> {
    pub analysis: Option<AnalysisRecord<S>>,
    pub grants: Vec<GrantRecord<R>>,
}

impl<S, R> Trace<S, R> {
    /// Build a trace, or `None` when there is nothing to show
    pub fn assemble(analysis: Option<AnalysisRecord<S>>, grants: Vec<GrantRecord<R>>) -> Option<Self> {
        if analysis.is_none() && grants.is_empty() {
            return None;
        }
        Some(Self { analysis, grants })
    }

    /// Channel the message was posted in, taken from whichever record exists
    pub fn channel_id(&self) -> Option<u64> {
        self.analysis
            .as_ref()
            .map(|a| a.channel_id)
            .or_else(|| self.grants.first().map(|g| g.channel_id))
    }
}
