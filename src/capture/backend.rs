//! Platform capture library boundary.
//!
//! The capture session talks to [`CaptureBackend`] and the source
//! traits instead of libpcap directly so that tests can substitute a
//! fake backend. The real implementation, [`PcapBackend`], opens one
//! libpcap handle per source with a short read timeout so that capture
//! worker threads can observe the session's run flag between reads.

use chrono::{DateTime, Utc};
use log::trace;
use sysinfo::Networks;

use crate::capture::types::{CaptureDevice, CapturedFrame, TrafficStatisticsSample};
use crate::error_handling::types::CaptureError;

/// Read timeout for the frame source, which doubles as the upper bound
/// on how long a capture worker takes to notice cancellation.
const READ_TIMEOUT_MS: i32 = 1000;
const SNAPLEN: i32 = 65535;

pub trait CaptureBackend: Send + Sync {
    /// Whether the host platform can run the capture library at all.
    fn is_supported(&self) -> bool;

    /// Current adapter list as reported by the platform.
    fn list_devices(&self) -> Result<Vec<CaptureDevice>, CaptureError>;

    /// Opens the frame source for `device` with `filter` installed.
    fn open_frames(
        &self,
        device: &CaptureDevice,
        filter: &str,
    ) -> Result<Box<dyn FrameSource>, CaptureError>;

    /// Opens the companion statistics source for `device` with the same
    /// filter installed.
    fn open_statistics(
        &self,
        device: &CaptureDevice,
        filter: &str,
    ) -> Result<Box<dyn StatisticsSource>, CaptureError>;
}

/// Blocking frame delivery. `next_frame` returns `Ok(None)` when the
/// read timeout elapsed without traffic, so callers can poll their run
/// flag between reads. Dropping the source releases the device handle.
pub trait FrameSource: Send {
    fn next_frame(&mut self) -> Result<Option<CapturedFrame>, CaptureError>;
}

/// Cumulative counter snapshots, sampled by the session at a fixed
/// cadence. Dropping the source releases the device handle.
pub trait StatisticsSource: Send {
    fn sample(&mut self) -> Result<TrafficStatisticsSample, CaptureError>;
}

/// libpcap-backed implementation of the capture boundary.
pub struct PcapBackend;

impl PcapBackend {
    pub fn new() -> Self {
        Self
    }

    fn open_capture(
        device: &CaptureDevice,
        filter: &str,
    ) -> Result<pcap::Capture<pcap::Active>, CaptureError> {
        let mut cap = pcap::Capture::from_device(device.friendly_name.as_str())
            .map_err(|e| CaptureError::OpenFailed(e.to_string()))?
            .promisc(true)
            .snaplen(SNAPLEN)
            .timeout(READ_TIMEOUT_MS)
            .open()
            .map_err(|e| CaptureError::OpenFailed(e.to_string()))?;
        cap.filter(filter, true)
            .map_err(|e| CaptureError::FilterRejected(e.to_string()))?;
        trace!("opened {} with filter {:?}", device.friendly_name, filter);
        Ok(cap)
    }
}

impl Default for PcapBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureBackend for PcapBackend {
    fn is_supported(&self) -> bool {
        cfg!(any(
            target_os = "linux",
            target_os = "windows",
            target_os = "macos",
            target_os = "freebsd",
        ))
    }

    fn list_devices(&self) -> Result<Vec<CaptureDevice>, CaptureError> {
        let devices = pcap::Device::list()
            .map_err(|e| CaptureError::DeviceListFailed(e.to_string()))?;

        // libpcap knows nothing about hardware addresses; pull them from
        // the OS interface table, matched by name.
        let networks = Networks::new_with_refreshed_list();

        let mut formatted = Vec::with_capacity(devices.len());
        for device in devices {
            let mac_address = networks
                .iter()
                .find(|(name, _)| name.as_str() == device.name)
                .map(|(_, data)| data.mac_address())
                .filter(|mac| *mac != sysinfo::MacAddr::UNSPECIFIED)
                .map(|mac| mac.to_string());

            formatted.push(CaptureDevice {
                description: device.desc.clone().unwrap_or_else(|| device.name.clone()),
                friendly_name: device.name,
                addresses: device.addresses.iter().map(|a| a.addr).collect(),
                gateway_addresses: Vec::new(),
                mac_address,
            });
        }
        Ok(formatted)
    }

    fn open_frames(
        &self,
        device: &CaptureDevice,
        filter: &str,
    ) -> Result<Box<dyn FrameSource>, CaptureError> {
        let cap = Self::open_capture(device, filter)?;
        Ok(Box::new(PcapFrameSource {
            cap,
            device: device.friendly_name.clone(),
        }))
    }

    fn open_statistics(
        &self,
        device: &CaptureDevice,
        filter: &str,
    ) -> Result<Box<dyn StatisticsSource>, CaptureError> {
        let cap = Self::open_capture(device, filter)?;
        Ok(Box::new(PcapStatisticsSource {
            cap,
            device: device.friendly_name.clone(),
        }))
    }
}

struct PcapFrameSource {
    cap: pcap::Capture<pcap::Active>,
    device: String,
}

impl FrameSource for PcapFrameSource {
    fn next_frame(&mut self) -> Result<Option<CapturedFrame>, CaptureError> {
        match self.cap.next_packet() {
            Ok(packet) => {
                let ts = packet.header.ts;
                let timestamp =
                    DateTime::from_timestamp(ts.tv_sec as i64, (ts.tv_usec as u32) * 1000)
                        .unwrap_or_else(Utc::now);
                Ok(Some(CapturedFrame {
                    timestamp,
                    device: self.device.clone(),
                    payload: packet.data.to_vec(),
                }))
            }
            Err(pcap::Error::TimeoutExpired) => Ok(None),
            Err(e) => Err(CaptureError::ReadFailed(e.to_string())),
        }
    }
}

struct PcapStatisticsSource {
    cap: pcap::Capture<pcap::Active>,
    device: String,
}

impl StatisticsSource for PcapStatisticsSource {
    fn sample(&mut self) -> Result<TrafficStatisticsSample, CaptureError> {
        let stats = self
            .cap
            .stats()
            .map_err(|e| CaptureError::StatsUnavailable(e.to_string()))?;
        Ok(TrafficStatisticsSample {
            timestamp: Utc::now(),
            device: self.device.clone(),
            received: stats.received,
            dropped: stats.dropped,
            if_dropped: stats.if_dropped,
        })
    }
}
