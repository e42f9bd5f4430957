//! Capture subsystem: the platform capture boundary, the device
//! directory, the batch buffers, and the capture session lifecycle.
//!
//! Components:
//! - `backend`: the CaptureBackend / FrameSource / StatisticsSource
//!   traits plus the libpcap implementation.
//! - `device_directory`: adapter enumeration and description-based
//!   resolution.
//! - `batch_buffer`: thread-safe accumulation with swap-under-lock
//!   batch sealing.
//! - `capture_session`: the Opening → Capturing → Stopping → Closed
//!   state machine owning the delivery workers.
//! - `types`: shared data types for the subsystem.

pub mod backend;
pub mod batch_buffer;
pub mod capture_session;
pub mod device_directory;
pub mod types;

pub use backend::{CaptureBackend, FrameSource, PcapBackend, StatisticsSource};
pub use batch_buffer::BatchBuffer;
pub use capture_session::CaptureSession;
pub use device_directory::DeviceDirectory;
pub use types::{
    BatchKind, CaptureDevice, CapturedFrame, SealedBatch, SessionState, TrafficStatisticsSample,
};
