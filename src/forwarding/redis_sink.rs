use async_trait::async_trait;
use log::{debug, info};
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tokio::sync::Mutex;

use super::sink::StreamSink;
use crate::error_handling::types::SinkError;

/// Redis Streams implementation of the stream sink boundary.
///
/// Each appended batch becomes one `XADD` on the named stream, with the
/// batch's records as the entry's field/value pairs. The multiplexed
/// connection is cached and rebuilt on the next append after a failure.
pub struct RedisStreamSink {
    client: redis::Client,
    connection: Mutex<Option<MultiplexedConnection>>,
    stream_key: String,
}

impl RedisStreamSink {
    /// Validates the connection string and prepares a lazily-connected
    /// sink for `stream_key`. No network traffic happens here.
    pub fn connect(connection_string: &str, stream_key: String) -> Result<Self, SinkError> {
        let client = redis::Client::open(connection_string)
            .map_err(|e| SinkError::ConnectionFailed(e.to_string()))?;
        Ok(Self {
            client,
            connection: Mutex::new(None),
            stream_key,
        })
    }

    pub fn stream_key(&self) -> &str {
        &self.stream_key
    }

    async fn connection(&self) -> Result<MultiplexedConnection, SinkError> {
        let mut cached = self.connection.lock().await;
        if let Some(connection) = cached.as_ref() {
            return Ok(connection.clone());
        }
        let connection = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| SinkError::ConnectionFailed(e.to_string()))?;
        info!("connected to stream sink at {:?}", self.client.get_connection_info().addr);
        *cached = Some(connection.clone());
        Ok(connection)
    }

    async fn invalidate(&self) {
        *self.connection.lock().await = None;
    }
}

#[async_trait]
impl StreamSink for RedisStreamSink {
    async fn append_batch(&self, entries: Vec<(String, String)>) -> Result<(), SinkError> {
        let mut connection = self.connection().await?;
        let items: Vec<(&str, &str)> = entries
            .iter()
            .map(|(field, value)| (field.as_str(), value.as_str()))
            .collect();
        let appended: Result<String, redis::RedisError> = connection
            .xadd(self.stream_key.as_str(), "*", &items)
            .await;
        match appended {
            Ok(id) => {
                debug!("appended {} records to {} as {}", items.len(), self.stream_key, id);
                Ok(())
            }
            Err(e) => {
                self.invalidate().await;
                Err(SinkError::AppendFailed(e.to_string()))
            }
        }
    }

    async fn ensure_stream_exists(&self) -> Result<(), SinkError> {
        let mut connection = self.connection().await?;
        let length: i64 = connection
            .xlen(self.stream_key.as_str())
            .await
            .map_err(|e| SinkError::AppendFailed(e.to_string()))?;
        if length == 0 {
            let marker: Result<String, redis::RedisError> = connection
                .xadd(
                    self.stream_key.as_str(),
                    "*",
                    &[(self.stream_key.as_str(), "created")],
                )
                .await;
            marker.map_err(|e| SinkError::AppendFailed(e.to_string()))?;
            info!("created stream {}", self.stream_key);
        }
        Ok(())
    }
}
