use std::sync::Arc;

use log::{debug, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::sink::StreamSink;
use crate::capture::types::SealedBatch;

/// Sealed batches waiting for the sink; capture callbacks drop batches
/// rather than block once this many are queued.
const FORWARD_QUEUE_DEPTH: usize = 64;

/// Cheap handle the capture path uses to dispatch sealed batches
/// without waiting on the sink.
#[derive(Clone)]
pub struct ForwarderHandle {
    tx: mpsc::Sender<SealedBatch>,
}

impl ForwarderHandle {
    /// Hands a sealed batch to the forwarder task. Never blocks: a full
    /// or closed queue means the batch is logged and dropped, keeping
    /// the capture callback fast regardless of sink latency.
    pub fn dispatch(&self, batch: SealedBatch) {
        let count = batch.len();
        let tag = batch.kind().field_tag();
        if let Err(e) = self.tx.try_send(batch) {
            warn!("dropping batch of {} {} records: {}", count, tag, e);
        }
    }
}

/// Converts sealed batches into sink records and appends them, one sink
/// transaction per batch.
///
/// Delivery is at-least-once and best-effort: an append failure is
/// logged and the batch dropped; the capture path never observes sink
/// outages. Within a batch, append order matches capture order. No
/// ordering holds across the frame and statistics batches, which
/// interleave freely at the sink.
pub struct StreamForwarder;

impl StreamForwarder {
    /// Spawns the forwarding task for one capture session. The task
    /// exits after the last [`ForwarderHandle`] is dropped and the
    /// queue has drained, so awaiting the returned handle at teardown
    /// flushes any batches still in flight.
    pub fn spawn(sink: Arc<dyn StreamSink>) -> (ForwarderHandle, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<SealedBatch>(FORWARD_QUEUE_DEPTH);
        let task = tokio::spawn(async move {
            while let Some(batch) = rx.recv().await {
                Self::forward(sink.as_ref(), batch).await;
            }
        });
        (ForwarderHandle { tx }, task)
    }

    async fn forward(sink: &dyn StreamSink, batch: SealedBatch) {
        let tag = batch.kind().field_tag();
        let entries = match serialize_batch(&batch) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("dropping unserializable batch of {} records: {}", batch.len(), e);
                return;
            }
        };
        let count = entries.len();
        match sink.append_batch(entries).await {
            Ok(()) => debug!("forwarded {} {} records", count, tag),
            Err(e) => warn!("dropping batch of {} {} records: {}", count, tag, e),
        }
    }
}

/// Serializes every unit of a batch to the sink record format,
/// preserving capture order.
fn serialize_batch(batch: &SealedBatch) -> Result<Vec<(String, String)>, serde_json::Error> {
    let tag = batch.kind().field_tag();
    match batch {
        SealedBatch::Frames(units) => units
            .iter()
            .map(|unit| Ok((tag.to_string(), serde_json::to_string(unit)?)))
            .collect(),
        SealedBatch::Statistics(units) => units
            .iter()
            .map(|unit| Ok((tag.to_string(), serde_json::to_string(unit)?)))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;

    use crate::capture::types::{CapturedFrame, TrafficStatisticsSample};
    use crate::error_handling::types::SinkError;

    struct RecordingSink {
        appends: Mutex<Vec<Vec<(String, String)>>>,
        fail: bool,
    }

    impl RecordingSink {
        fn new(fail: bool) -> Self {
            Self {
                appends: Mutex::new(Vec::new()),
                fail,
            }
        }
    }

    #[async_trait]
    impl StreamSink for RecordingSink {
        async fn append_batch(&self, entries: Vec<(String, String)>) -> Result<(), SinkError> {
            if self.fail {
                return Err(SinkError::AppendFailed("sink offline".to_string()));
            }
            self.appends.lock().unwrap().push(entries);
            Ok(())
        }

        async fn ensure_stream_exists(&self) -> Result<(), SinkError> {
            Ok(())
        }
    }

    fn frame(n: u8) -> CapturedFrame {
        CapturedFrame {
            timestamp: Utc::now(),
            device: "eth0".to_string(),
            payload: vec![n; 4],
        }
    }

    #[tokio::test]
    async fn one_append_per_batch_with_order_and_tags() {
        let sink = Arc::new(RecordingSink::new(false));
        let (handle, task) = StreamForwarder::spawn(sink.clone());

        handle.dispatch(SealedBatch::Frames(vec![frame(1), frame(2), frame(3)]));
        handle.dispatch(SealedBatch::Statistics(vec![TrafficStatisticsSample {
            timestamp: Utc::now(),
            device: "eth0".to_string(),
            received: 10,
            dropped: 0,
            if_dropped: 0,
        }]));
        drop(handle);
        task.await.unwrap();

        let appends = sink.appends.lock().unwrap();
        assert_eq!(appends.len(), 2, "one sink transaction per batch");

        assert_eq!(appends[0].len(), 3);
        assert!(appends[0].iter().all(|(tag, _)| tag == "raw_packets"));
        let payloads: Vec<CapturedFrame> = appends[0]
            .iter()
            .map(|(_, value)| serde_json::from_str(value).unwrap())
            .collect();
        assert_eq!(payloads[0].payload, vec![1; 4]);
        assert_eq!(payloads[1].payload, vec![2; 4]);
        assert_eq!(payloads[2].payload, vec![3; 4]);

        assert_eq!(appends[1].len(), 1);
        assert_eq!(appends[1][0].0, "statistics");
    }

    #[tokio::test]
    async fn append_failure_is_swallowed_and_later_batches_still_flow() {
        let failing = Arc::new(RecordingSink::new(true));
        let (handle, task) = StreamForwarder::spawn(failing);

        handle.dispatch(SealedBatch::Frames(vec![frame(1)]));
        handle.dispatch(SealedBatch::Frames(vec![frame(2)]));
        drop(handle);

        // The task must terminate normally despite every append failing.
        task.await.unwrap();
    }
}
