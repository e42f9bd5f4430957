use serde::Serialize;
use sysinfo::{Networks, System};

/// Read-only snapshot of the host for the control surface's `/info`
/// endpoint. Queried on demand; nothing here is cached or persisted.
#[derive(Debug, Serialize)]
pub struct HostInfo {
    pub machine_name: String,
    pub os_version: String,
    pub hardware: Hardware,
    pub ip_addresses: Vec<String>,
    pub network_interfaces: Vec<NetworkInterfaceInfo>,
    pub is_capture_processing: bool,
}

#[derive(Debug, Serialize)]
pub struct Hardware {
    pub cpu: CpuInfo,
    pub memory: MemoryInfo,
}

#[derive(Debug, Serialize)]
pub struct CpuInfo {
    pub processor: String,
    pub logical_cores: usize,
    pub physical_cores: Option<usize>,
    pub frequency_mhz: u64,
}

#[derive(Debug, Serialize)]
pub struct MemoryInfo {
    pub total_megabytes: u64,
}

#[derive(Debug, Serialize)]
pub struct NetworkInterfaceInfo {
    pub name: String,
    pub mac_address: String,
    pub addresses: Vec<String>,
}

/// Collects the current host snapshot. `is_capture_processing` comes
/// from the session manager, since capture state is not the inventory
/// layer's to know.
pub fn gather(is_capture_processing: bool) -> HostInfo {
    let system = System::new_all();

    let processor = system
        .cpus()
        .first()
        .map(|cpu| cpu.brand().trim().to_string())
        .unwrap_or_default();
    let frequency_mhz = system.cpus().first().map(|cpu| cpu.frequency()).unwrap_or(0);

    let networks = Networks::new_with_refreshed_list();
    let mut network_interfaces = Vec::new();
    let mut ip_addresses = Vec::new();
    for (name, data) in networks.iter() {
        let addresses: Vec<String> = data
            .ip_networks()
            .iter()
            .map(|network| network.addr.to_string())
            .collect();
        for address in &addresses {
            if !ip_addresses.contains(address) {
                ip_addresses.push(address.clone());
            }
        }
        network_interfaces.push(NetworkInterfaceInfo {
            name: name.clone(),
            mac_address: data.mac_address().to_string(),
            addresses,
        });
    }

    HostInfo {
        machine_name: System::host_name().unwrap_or_default(),
        os_version: System::long_os_version().unwrap_or_default(),
        hardware: Hardware {
            cpu: CpuInfo {
                processor,
                logical_cores: system.cpus().len(),
                physical_cores: system.physical_core_count(),
                frequency_mhz,
            },
            memory: MemoryInfo {
                total_megabytes: system.total_memory() / (1024 * 1024),
            },
        },
        ip_addresses,
        network_interfaces,
        is_capture_processing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_the_capture_flag() {
        let info = gather(true);
        assert!(info.is_capture_processing);

        let info = gather(false);
        assert!(!info.is_capture_processing);
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let info = gather(false);
        let json = serde_json::to_value(&info).unwrap();
        assert!(json.get("machine_name").is_some());
        assert!(json.get("hardware").is_some());
    }
}
