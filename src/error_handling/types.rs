use std::fmt;

#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    TomlError(String),
    InvalidPort(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::TomlError(e) => write!(f, "TOML parsing error: {}", e),
            ConfigError::InvalidPort(e) => write!(f, "Invalid listen port: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

#[derive(Debug)]
pub enum CaptureError {
    DeviceListFailed(String),
    OpenFailed(String),
    FilterRejected(String),
    ReadFailed(String),
    StatsUnavailable(String),
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::DeviceListFailed(e) => write!(f, "Device enumeration failed: {}", e),
            CaptureError::OpenFailed(e) => write!(f, "Failed to open capture device: {}", e),
            CaptureError::FilterRejected(e) => write!(f, "Capture filter rejected: {}", e),
            CaptureError::ReadFailed(e) => write!(f, "Capture read failed: {}", e),
            CaptureError::StatsUnavailable(e) => {
                write!(f, "Capture statistics unavailable: {}", e)
            }
        }
    }
}

impl std::error::Error for CaptureError {}

#[derive(Debug)]
pub enum SinkError {
    ConnectionFailed(String),
    AppendFailed(String),
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkError::ConnectionFailed(e) => write!(f, "Stream sink connection failed: {}", e),
            SinkError::AppendFailed(e) => write!(f, "Stream append failed: {}", e),
        }
    }
}

impl std::error::Error for SinkError {}

/// Errors surfaced by the session manager's public operations. The web
/// interface maps every variant to a forbidden response carrying the
/// `Display` text.
#[derive(Debug)]
pub enum AgentError {
    MissingSinkConfig,
    UnsupportedPlatform,
    NoDevicesFound,
    NoSuchInterface(String),
    MissingFilter,
    StopTimedOut,
    Capture(CaptureError),
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentError::MissingSinkConfig => {
                write!(f, "No stream sink connection is configured")
            }
            AgentError::UnsupportedPlatform => {
                write!(f, "The host platform cannot run the capture library")
            }
            AgentError::NoDevicesFound => write!(f, "No capture devices were found"),
            AgentError::NoSuchInterface(name) => write!(f, "No such interface: {}", name),
            AgentError::MissingFilter => write!(f, "No capture filter is configured"),
            AgentError::StopTimedOut => write!(f, "Capture session teardown timed out"),
            AgentError::Capture(e) => write!(f, "Capture error: {}", e),
        }
    }
}

impl std::error::Error for AgentError {}

impl From<CaptureError> for AgentError {
    fn from(err: CaptureError) -> Self {
        AgentError::Capture(err)
    }
}
