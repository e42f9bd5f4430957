use std::sync::Arc;

use crate::capture::backend::CaptureBackend;
use crate::capture::types::CaptureDevice;
use crate::error_handling::types::AgentError;

/// Stateless view over the platform's adapter list, queried on demand.
pub struct DeviceDirectory {
    backend: Arc<dyn CaptureBackend>,
}

impl DeviceDirectory {
    pub fn new(backend: Arc<dyn CaptureBackend>) -> Self {
        Self { backend }
    }

    /// Current adapter list. Fails with [`AgentError::NoDevicesFound`]
    /// when the platform reports none.
    pub fn list_devices(&self) -> Result<Vec<CaptureDevice>, AgentError> {
        let devices = self.backend.list_devices()?;
        if devices.is_empty() {
            return Err(AgentError::NoDevicesFound);
        }
        Ok(devices)
    }

    /// Resolves an adapter by its platform-reported description.
    ///
    /// The input is trimmed; the match is exact and case-sensitive.
    /// When several adapters share a description the first match wins —
    /// a known limitation of description-based addressing, kept rather
    /// than silently fixed.
    pub fn resolve_by_description(&self, name: &str) -> Result<CaptureDevice, AgentError> {
        let wanted = name.trim();
        let devices = self.list_devices()?;
        devices
            .into_iter()
            .find(|d| d.description == wanted)
            .ok_or_else(|| AgentError::NoSuchInterface(wanted.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::backend::{FrameSource, StatisticsSource};
    use crate::error_handling::types::CaptureError;

    struct FixedBackend {
        devices: Vec<CaptureDevice>,
    }

    impl CaptureBackend for FixedBackend {
        fn is_supported(&self) -> bool {
            true
        }

        fn list_devices(&self) -> Result<Vec<CaptureDevice>, CaptureError> {
            Ok(self.devices.clone())
        }

        fn open_frames(
            &self,
            _device: &CaptureDevice,
            _filter: &str,
        ) -> Result<Box<dyn FrameSource>, CaptureError> {
            Err(CaptureError::OpenFailed("not used".to_string()))
        }

        fn open_statistics(
            &self,
            _device: &CaptureDevice,
            _filter: &str,
        ) -> Result<Box<dyn StatisticsSource>, CaptureError> {
            Err(CaptureError::OpenFailed("not used".to_string()))
        }
    }

    fn device(description: &str) -> CaptureDevice {
        CaptureDevice {
            description: description.to_string(),
            friendly_name: description.to_lowercase(),
            addresses: Vec::new(),
            gateway_addresses: Vec::new(),
            mac_address: None,
        }
    }

    #[test]
    fn empty_platform_list_is_no_devices_found() {
        let directory = DeviceDirectory::new(Arc::new(FixedBackend {
            devices: Vec::new(),
        }));
        assert!(matches!(
            directory.list_devices(),
            Err(AgentError::NoDevicesFound)
        ));
    }

    #[test]
    fn resolve_trims_input_and_matches_exactly() {
        let directory = DeviceDirectory::new(Arc::new(FixedBackend {
            devices: vec![device("Realtek PCIe GbE"), device("WireGuard Tunnel")],
        }));

        let found = directory
            .resolve_by_description("  WireGuard Tunnel ")
            .unwrap();
        assert_eq!(found.friendly_name, "wireguard tunnel");

        // Case-sensitive: a lowered description is a different adapter.
        assert!(matches!(
            directory.resolve_by_description("wireguard tunnel"),
            Err(AgentError::NoSuchInterface(_))
        ));
    }

    #[test]
    fn duplicate_descriptions_resolve_to_first_match() {
        let mut first = device("Duplicated");
        first.friendly_name = "eth0".to_string();
        let mut second = device("Duplicated");
        second.friendly_name = "eth1".to_string();

        let directory = DeviceDirectory::new(Arc::new(FixedBackend {
            devices: vec![first, second],
        }));

        let found = directory.resolve_by_description("Duplicated").unwrap();
        assert_eq!(found.friendly_name, "eth0");
    }
}
