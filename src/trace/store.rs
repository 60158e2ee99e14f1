//! Typed trace facade used by the analysis and grant engines
//!
//! Write paths never fail toward the caller: encode and database errors are
//! logged and the write is dropped. The read path is strict: any row that
//! cannot be decoded fails the whole lookup.

use super::codec::{self, CodecError};
use super::db::{PruneStats, TraceDb};
use super::error::TraceError;
use super::types::{AnalysisRecord, AnalysisRow, AnalyzerResult, GrantRecord, MessageRef, Trace};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

const ANALYSIS_TABLE: &str = "analysis_records";
const GRANT_TABLE: &str = "grant_records";

#[derive(Clone)]
pub struct TraceStore {
    db: Arc<dyn TraceDb>,
}

impl TraceStore {
    pub fn new(db: Arc<dyn TraceDb>) -> Self {
        Self { db }
    }

    /// Record the analysis outcome of a message (first write wins)
    ///
    /// The result is handed back unchanged whether or not a row was written,
    /// so callers can chain on it.
    pub async fn record_analysis<A: AnalyzerResult>(&self, message: MessageRef, result: A) -> A {
        let snapshot = match codec::encode(&result.to_snapshot()) {
            Ok(text) => text,
            Err(e) => {
                log::error!(
                    "❌ Could not serialize analysis (guild: {}, channel: {}, message: {}): {}",
                    message.guild_id,
                    message.channel_id,
                    message.message_id,
                    e
                );
                return result;
            }
        };

        let row = AnalysisRow {
            message,
            snapshot,
            analyzed_at: Utc::now(),
        };

        match self.db.insert_analysis(&row).await {
            Ok(true) => {
                log::debug!("✅ Analysis recorded for message {}", message.message_id);
            }
            Ok(false) => {
                log::debug!(
                    "Analysis for message {} already recorded, keeping first",
                    message.message_id
                );
            }
            Err(e) => {
                log::error!(
                    "❌ Failed to write analysis (guild: {}, message: {}): {}",
                    message.guild_id,
                    message.message_id,
                    e
                );
            }
        }

        result
    }

    /// Append a grant outcome for a message
    pub async fn record_grant<R: Serialize + ?Sized>(&self, message: MessageRef, result: &R) {
        let text = match codec::encode(result) {
            Ok(text) => text,
            Err(e) => {
                log::error!(
                    "❌ Could not serialize grant (guild: {}, channel: {}, message: {}): {}",
                    message.guild_id,
                    message.channel_id,
                    message.message_id,
                    e
                );
                return;
            }
        };

        if let Err(e) = self.db.append_grant(message, &text, Utc::now()).await {
            log::error!(
                "❌ Failed to write grant (guild: {}, message: {}): {}",
                message.guild_id,
                message.message_id,
                e
            );
        }
    }

    /// Look up the analysis and all grants of a message
    ///
    /// Returns `Ok(None)` when neither exists. A concurrent writer may leave
    /// the trace partial (analysis-only or grants-only); that is a valid
    /// answer, not an error.
    pub async fn get_trace<S, R>(&self, guild_id: u64, message_id: u64) -> Result<Option<Trace<S, R>>, TraceError>
    where
        S: DeserializeOwned,
        R: DeserializeOwned,
    {
        let analysis = match self.db.find_analysis(guild_id, message_id).await? {
            Some(row) => {
                let snapshot = codec::decode(&row.snapshot)
                    .map_err(|e| corrupt_row(ANALYSIS_TABLE, guild_id, message_id, e))?;
                Some(AnalysisRecord {
                    guild_id: row.message.guild_id,
                    channel_id: row.message.channel_id,
                    message_id: row.message.message_id,
                    snapshot,
                    analyzed_at: row.analyzed_at,
                })
            }
            None => None,
        };

        let mut grants = Vec::new();
        for row in self.db.find_grants(guild_id, message_id).await? {
            let result = codec::decode(&row.result)
                .map_err(|e| corrupt_row(GRANT_TABLE, guild_id, message_id, e))?;
            grants.push(GrantRecord {
                guild_id: row.message.guild_id,
                channel_id: row.message.channel_id,
                message_id: row.message.message_id,
                result,
                submitted_at: row.submitted_at,
            });
        }

        Ok(Trace::assemble(analysis, grants))
    }

    /// Delete trace rows recorded before `cutoff`
    pub async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<PruneStats, TraceError> {
        let stats = self.db.prune_before(cutoff).await?;
        log::info!(
            "🧹 Pruned {} analyses and {} grants recorded before {}",
            stats.analyses,
            stats.grants,
            cutoff
        );
        Ok(stats)
    }
}

fn corrupt_row(table: &'static str, guild_id: u64, message_id: u64, source: CodecError) -> TraceError {
    log::error!(
        "❌ Could not deserialize {} row (guild: {}, message: {}): {}",
        table,
        guild_id,
        message_id,
        source
    );
    TraceError::Codec {
        table,
        message_id,
        source,
    }
}
