use async_trait::async_trait;

use crate::error_handling::types::SinkError;

/// External append-only stream store.
///
/// One `append_batch` call carries a whole sealed batch as a single
/// sink transaction; entry order within the call must be preserved by
/// implementations, since the stream is an append log.
#[async_trait]
pub trait StreamSink: Send + Sync {
    /// Appends the given `(field_tag, serialized_value)` records to the
    /// sink's stream in order.
    async fn append_batch(&self, entries: Vec<(String, String)>) -> Result<(), SinkError>;

    /// Creates the stream if it does not exist yet. Idempotent; called
    /// once at process startup.
    async fn ensure_stream_exists(&self) -> Result<(), SinkError>;
}
