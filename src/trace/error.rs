use super::codec::CodecError;

#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A stored row could not be decoded. The whole read fails rather than
    /// returning a partial trace.
    #[error("Corrupt {table} row for message {message_id}: {source}")]
    Codec {
        table: &'static str,
        message_id: u64,
        #[source]
        source: CodecError,
    },

    #[error("Invalid stored timestamp: {0}")]
    InvalidTimestamp(i64),

    #[error("Schema directory not found: {0}")]
    SchemaDirMissing(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
