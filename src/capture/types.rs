//! Common data types used across the capture subsystem.

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable snapshot of a capture-capable network adapter as reported
/// by the platform capture library.
#[derive(Debug, Clone, Serialize)]
pub struct CaptureDevice {
    /// Platform-reported description. Where libpcap reports none (common
    /// on Linux), the interface name stands in for it.
    pub description: String,
    /// Interface name as the platform knows it (e.g. `eth0`).
    pub friendly_name: String,
    /// Network addresses bound to the adapter.
    pub addresses: Vec<IpAddr>,
    /// Gateway addresses. libpcap surfaces no gateway data, so this is
    /// empty on all current platforms.
    pub gateway_addresses: Vec<String>,
    /// Hardware address, when the platform reports one.
    pub mac_address: Option<String>,
}

/// One captured frame: an opaque timestamped byte blob plus the device
/// it came from. Owned by the batch buffer until flushed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapturedFrame {
    pub timestamp: DateTime<Utc>,
    pub device: String,
    pub payload: Vec<u8>,
}

/// Periodic snapshot of the capture library's cumulative counters for
/// one device. libpcap reports packet counts only; there are no byte
/// counters at this layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrafficStatisticsSample {
    pub timestamp: DateTime<Utc>,
    pub device: String,
    /// Packets received (and accepted by the filter) so far.
    pub received: u32,
    /// Packets dropped by the capture library's buffer.
    pub dropped: u32,
    /// Packets dropped by the network interface or its driver.
    pub if_dropped: u32,
}

/// The kind of units a sealed batch carries. Doubles as the sink-side
/// field tag for each record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    RawFrames,
    Statistics,
}

impl BatchKind {
    pub fn field_tag(&self) -> &'static str {
        match self {
            BatchKind::RawFrames => "raw_packets",
            BatchKind::Statistics => "statistics",
        }
    }
}

/// An ordered group of captured units handed off together for
/// forwarding. Immutable once constructed; insertion order is the
/// capture order and must survive through the sink append.
#[derive(Debug)]
pub enum SealedBatch {
    Frames(Vec<CapturedFrame>),
    Statistics(Vec<TrafficStatisticsSample>),
}

impl SealedBatch {
    pub fn kind(&self) -> BatchKind {
        match self {
            SealedBatch::Frames(_) => BatchKind::RawFrames,
            SealedBatch::Statistics(_) => BatchKind::Statistics,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SealedBatch::Frames(units) => units.len(),
            SealedBatch::Statistics(units) => units.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Lifecycle states of a capture session.
///
/// `Closed` is terminal; a new session must be constructed to capture
/// again. The session manager treats an empty session slot as idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Opening,
    Capturing,
    Stopping,
    Closed,
}
