use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info};
use tokio::sync::{Mutex, Notify};

use crate::capture::backend::CaptureBackend;
use crate::capture::capture_session::{CaptureSession, SessionStateCell};
use crate::capture::device_directory::DeviceDirectory;
use crate::capture::types::SessionState;
use crate::error_handling::types::AgentError;
use crate::forwarding::sink::StreamSink;

/// Upper bound on how long `stop` waits for session teardown before
/// reporting `StopTimedOut` instead of hanging the caller.
const STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// Control handles for the session currently occupying the slot.
struct ActiveCapture {
    state: SessionStateCell,
    running: Arc<AtomicBool>,
    cancel: Arc<Notify>,
    supervisor: tokio::task::JoinHandle<()>,
}

/// The process-wide owner of at most one capture session.
///
/// The session lives in a single guarded slot; `start` and `stop` are
/// atomic transitions on that slot, so two concurrent starts can never
/// produce two live sessions. Only one capture session may run per
/// process at any time — `start` against a live session is an
/// intentional idempotent success, not an error.
pub struct SessionManager {
    backend: Arc<dyn CaptureBackend>,
    devices: DeviceDirectory,
    sink: Option<Arc<dyn StreamSink>>,
    max_batch_size: usize,
    capture_filter: Option<String>,
    active: Mutex<Option<ActiveCapture>>,
}

impl SessionManager {
    pub fn new(
        backend: Arc<dyn CaptureBackend>,
        sink: Option<Arc<dyn StreamSink>>,
        max_batch_size: usize,
        capture_filter: Option<String>,
    ) -> Self {
        Self {
            devices: DeviceDirectory::new(Arc::clone(&backend)),
            backend,
            sink,
            max_batch_size,
            capture_filter,
            active: Mutex::new(None),
        }
    }

    /// Starts capturing on the adapter with the given description.
    ///
    /// Validation order: sink configured, platform supported, adapter
    /// resolvable, then filter. A live (non-`Closed`) session makes
    /// this a no-op success. The new session's supervising loop runs on
    /// its own task; this call returns once opening has completed.
    pub async fn start(&self, adapter: &str) -> Result<(), AgentError> {
        let sink = match &self.sink {
            Some(sink) => Arc::clone(sink),
            None => {
                error!("start refused: no stream sink connection is configured");
                return Err(AgentError::MissingSinkConfig);
            }
        };
        if !self.backend.is_supported() {
            error!("start refused: platform cannot run the capture library");
            return Err(AgentError::UnsupportedPlatform);
        }

        let device = self.devices.resolve_by_description(adapter)?;

        let mut active = self.active.lock().await;
        if let Some(current) = active.as_ref() {
            if current.state.get() != SessionState::Closed {
                debug!("capture session already active; start is a no-op");
                return Ok(());
            }
        }

        let filter = self.capture_filter.as_deref().unwrap_or("");
        let session = CaptureSession::open(
            self.backend.as_ref(),
            &device,
            filter,
            self.max_batch_size,
            sink,
        )?;

        let state = session.state_cell();
        let running = session.running_flag();
        let cancel = session.cancel_signal();
        let supervisor = tokio::spawn(session.supervise());

        *active = Some(ActiveCapture {
            state,
            running,
            cancel,
            supervisor,
        });
        info!("local capture started on {}", adapter);
        Ok(())
    }

    /// Signals cancellation to the active session and waits for its
    /// teardown, bounded by [`STOP_TIMEOUT`]. A no-op when idle. After
    /// this returns the slot is empty either way; a timed-out session
    /// finishes tearing down in the background.
    pub async fn stop(&self) -> Result<(), AgentError> {
        let mut active = self.active.lock().await;
        let current = match active.take() {
            Some(current) => current,
            None => return Ok(()),
        };

        current.running.store(false, Ordering::Relaxed);
        current.cancel.notify_one();

        match tokio::time::timeout(STOP_TIMEOUT, current.supervisor).await {
            Ok(joined) => {
                if let Err(e) = joined {
                    error!("session supervisor failed during teardown: {}", e);
                }
                info!("local capture stopped");
                Ok(())
            }
            Err(_) => {
                error!("session teardown exceeded {:?}", STOP_TIMEOUT);
                Err(AgentError::StopTimedOut)
            }
        }
    }

    /// True iff a session exists and is actively capturing.
    pub async fn is_capturing(&self) -> bool {
        match self.active.lock().await.as_ref() {
            Some(current) => current.state.get() == SessionState::Capturing,
            None => false,
        }
    }
}
