use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, error, info, trace, warn};
use tokio::sync::Notify;
use uuid::Uuid;

use crate::capture::backend::{CaptureBackend, FrameSource, StatisticsSource};
use crate::capture::batch_buffer::BatchBuffer;
use crate::capture::types::{
    CaptureDevice, CapturedFrame, SealedBatch, SessionState, TrafficStatisticsSample,
};
use crate::error_handling::types::AgentError;
use crate::forwarding::sink::StreamSink;
use crate::forwarding::stream_forwarder::{ForwarderHandle, StreamForwarder};

/// Cadence at which the statistics source is sampled. Also the upper
/// bound the statistics worker adds to stop latency.
const STATS_SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// Shared, lock-free view of one session's lifecycle state.
#[derive(Debug, Clone)]
pub struct SessionStateCell(Arc<AtomicU8>);

impl SessionStateCell {
    fn new() -> Self {
        Self(Arc::new(AtomicU8::new(SessionState::Opening as u8)))
    }

    fn set(&self, state: SessionState) {
        self.0.store(state as u8, Ordering::Release);
    }

    pub fn get(&self) -> SessionState {
        match self.0.load(Ordering::Acquire) {
            0 => SessionState::Opening,
            1 => SessionState::Capturing,
            2 => SessionState::Stopping,
            _ => SessionState::Closed,
        }
    }
}

/// One active capture against one device.
///
/// Owns the frame and statistics worker threads, the two batch buffers
/// they feed, and the forwarding task draining sealed batches to the
/// stream sink. Constructed by [`open`], driven by [`supervise`] until
/// the cancellation signal fires, then torn down. `Closed` is terminal;
/// capturing again means constructing a fresh session.
///
/// [`open`]: CaptureSession::open
/// [`supervise`]: CaptureSession::supervise
pub struct CaptureSession {
    id: Uuid,
    device_name: String,
    state: SessionStateCell,
    running: Arc<AtomicBool>,
    cancel: Arc<Notify>,
    frame_worker: Option<thread::JoinHandle<()>>,
    stats_worker: Option<thread::JoinHandle<()>>,
    frame_buffer: Arc<BatchBuffer<CapturedFrame>>,
    stats_buffer: Arc<BatchBuffer<TrafficStatisticsSample>>,
    forwarder: Option<ForwarderHandle>,
    forwarder_task: Option<tokio::task::JoinHandle<()>>,
}

impl CaptureSession {
    /// Opens both capture sources on `device`, installs `filter`, and
    /// starts the delivery workers and the forwarding task.
    ///
    /// The filter is validated before anything is opened; a blank
    /// filter fails fast with [`AgentError::MissingFilter`] and zero
    /// open calls. Any later opening failure releases whatever was
    /// already acquired (source handles close on drop) and surfaces the
    /// error as the start result — no capture occurs.
    pub fn open(
        backend: &dyn CaptureBackend,
        device: &CaptureDevice,
        filter: &str,
        max_batch_size: usize,
        sink: Arc<dyn StreamSink>,
    ) -> Result<Self, AgentError> {
        let filter = filter.trim();
        if filter.is_empty() {
            return Err(AgentError::MissingFilter);
        }

        let id = Uuid::new_v4();
        let state = SessionStateCell::new();
        debug!("[{}] opening capture session on {}", id, device.friendly_name);

        let frames = backend.open_frames(device, filter)?;
        // If the statistics source fails to open, `frames` is dropped
        // here and its device handle released with it.
        let statistics = backend.open_statistics(device, filter)?;

        let running = Arc::new(AtomicBool::new(true));
        let frame_buffer = Arc::new(BatchBuffer::new(max_batch_size));
        let stats_buffer = Arc::new(BatchBuffer::new(max_batch_size));
        let (forwarder, forwarder_task) = StreamForwarder::spawn(sink);

        let frame_worker = spawn_frame_worker(
            id,
            frames,
            Arc::clone(&frame_buffer),
            forwarder.clone(),
            Arc::clone(&running),
        );
        let stats_worker = spawn_stats_worker(
            id,
            statistics,
            Arc::clone(&stats_buffer),
            forwarder.clone(),
            Arc::clone(&running),
        );

        state.set(SessionState::Capturing);
        info!("[{}] capturing on {} with filter {:?}", id, device.friendly_name, filter);

        Ok(Self {
            id,
            device_name: device.friendly_name.clone(),
            state,
            running,
            cancel: Arc::new(Notify::new()),
            frame_worker: Some(frame_worker),
            stats_worker: Some(stats_worker),
            frame_buffer,
            stats_buffer,
            forwarder: Some(forwarder),
            forwarder_task: Some(forwarder_task),
        })
    }

    pub fn state_cell(&self) -> SessionStateCell {
        self.state.clone()
    }

    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn cancel_signal(&self) -> Arc<Notify> {
        Arc::clone(&self.cancel)
    }

    /// Blocks on the cancellation signal, then tears the session down.
    ///
    /// Runs as the session's dedicated task so the controlling thread
    /// never carries the session's lifetime. The wait itself does
    /// nothing on the data path; delivery and forwarding proceed on
    /// their own workers.
    pub async fn supervise(mut self) {
        self.cancel.notified().await;
        self.shutdown().await;
    }

    /// Stops both sources, drains and forwards the buffered remainders,
    /// and releases the device handles. Safe to run after a partial
    /// start: every resource is held in an `Option` taken exactly once.
    async fn shutdown(&mut self) {
        self.state.set(SessionState::Stopping);
        self.running.store(false, Ordering::Relaxed);
        debug!("[{}] stopping capture on {}", self.id, self.device_name);

        // The workers observe the flag within one read timeout / sample
        // interval. Join off the async thread.
        if let Some(worker) = self.frame_worker.take() {
            let _ = tokio::task::spawn_blocking(move || worker.join()).await;
        }
        if let Some(worker) = self.stats_worker.take() {
            let _ = tokio::task::spawn_blocking(move || worker.join()).await;
        }

        if let Some(forwarder) = self.forwarder.take() {
            let remainder = self.frame_buffer.drain_remainder();
            if !remainder.is_empty() {
                forwarder.dispatch(SealedBatch::Frames(remainder));
            }
            let remainder = self.stats_buffer.drain_remainder();
            if !remainder.is_empty() {
                forwarder.dispatch(SealedBatch::Statistics(remainder));
            }
        }

        // All handles are gone now; the forwarder task exits once the
        // queue (including the partial batches above) is drained.
        if let Some(task) = self.forwarder_task.take() {
            if let Err(e) = task.await {
                error!("[{}] forwarder task failed: {}", self.id, e);
            }
        }

        self.state.set(SessionState::Closed);
        info!("[{}] capture session closed", self.id);
    }
}

/// Frame delivery loop. Runs on a dedicated thread because the capture
/// library blocks; the read timeout bounds how long a stop can go
/// unnoticed. Sealing a batch hands it to the forwarder without
/// waiting on the sink.
fn spawn_frame_worker(
    id: Uuid,
    mut source: Box<dyn FrameSource>,
    buffer: Arc<BatchBuffer<CapturedFrame>>,
    forwarder: ForwarderHandle,
    running: Arc<AtomicBool>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        while running.load(Ordering::Relaxed) {
            match source.next_frame() {
                Ok(Some(frame)) => {
                    if let Some(batch) = buffer.add(frame) {
                        forwarder.dispatch(SealedBatch::Frames(batch));
                    }
                }
                Ok(None) => continue,
                Err(e) => {
                    error!("[{}] frame source failed: {}", id, e);
                    break;
                }
            }
        }
        trace!("[{}] frame worker exiting", id);
    })
}

/// Statistics sampling loop, same shape as the frame worker but driven
/// by a fixed cadence instead of traffic.
fn spawn_stats_worker(
    id: Uuid,
    mut source: Box<dyn StatisticsSource>,
    buffer: Arc<BatchBuffer<TrafficStatisticsSample>>,
    forwarder: ForwarderHandle,
    running: Arc<AtomicBool>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        while running.load(Ordering::Relaxed) {
            thread::sleep(STATS_SAMPLE_INTERVAL);
            if !running.load(Ordering::Relaxed) {
                break;
            }
            match source.sample() {
                Ok(sample) => {
                    if let Some(batch) = buffer.add(sample) {
                        forwarder.dispatch(SealedBatch::Statistics(batch));
                    }
                }
                Err(e) => {
                    warn!("[{}] statistics source failed: {}", id, e);
                    break;
                }
            }
        }
        trace!("[{}] statistics worker exiting", id);
    })
}
