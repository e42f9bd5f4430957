use std::fs;
use std::path::Path;

use log::warn;
use serde::Deserialize;

use crate::error_handling::types::ConfigError;

/// Port the control surface falls back to when the file names none.
pub const DEFAULT_LISTEN_PORT: u16 = 59037;

/// Batch capacity used when `max_batch_size` is unset or invalid.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 20;

/// Runtime configuration for the agent, loaded from a TOML file named
/// on the command line.
///
/// # Fields Overview
///
/// - `redis_connection`: connection string for the stream sink. Its
///   absence is not an error at load time — capture start is refused
///   with a specific reason instead.
/// - `listen_port`: TCP port for the HTTP control surface.
/// - `max_batch_size`: units per sealed batch for both the frame and
///   statistics buffers.
/// - `capture_filter`: the capture-library filter expression installed
///   on every opened source. Like the sink connection, validated at
///   capture start rather than load.
#[derive(Debug, Clone)]
pub struct Config {
    pub redis_connection: Option<String>,
    pub listen_port: u16,
    pub max_batch_size: usize,
    pub capture_filter: Option<String>,
}

/// File shape before validation and defaulting.
#[derive(Debug, Deserialize)]
struct RawConfig {
    redis_connection: Option<String>,
    listen_port: Option<i64>,
    max_batch_size: Option<i64>,
    capture_filter: Option<String>,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig =
            toml::from_str(contents).map_err(|e| ConfigError::TomlError(e.to_string()))?;

        let listen_port = match raw.listen_port {
            None => DEFAULT_LISTEN_PORT,
            Some(port) if port > 0 && port <= i64::from(u16::MAX) => port as u16,
            Some(port) => return Err(ConfigError::InvalidPort(port.to_string())),
        };

        let max_batch_size = match raw.max_batch_size {
            None => DEFAULT_MAX_BATCH_SIZE,
            Some(size) if size > 0 => size as usize,
            Some(size) => {
                warn!(
                    "max_batch_size {} is invalid; defaulting to {}",
                    size, DEFAULT_MAX_BATCH_SIZE
                );
                DEFAULT_MAX_BATCH_SIZE
            }
        };

        Ok(Self {
            redis_connection: normalize(raw.redis_connection),
            listen_port,
            max_batch_size,
            capture_filter: normalize(raw.capture_filter),
        })
    }
}

/// Blank strings count as absent so that downstream checks see one
/// notion of "not configured".
fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn full_file_parses() {
        let config = Config::from_toml(
            r#"
            redis_connection = "redis://127.0.0.1:6379"
            listen_port = 8080
            max_batch_size = 50
            capture_filter = "tcp or udp"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.redis_connection.as_deref(),
            Some("redis://127.0.0.1:6379")
        );
        assert_eq!(config.listen_port, 8080);
        assert_eq!(config.max_batch_size, 50);
        assert_eq!(config.capture_filter.as_deref(), Some("tcp or udp"));
    }

    #[test]
    fn missing_values_fall_back_where_documented() {
        let config = Config::from_toml("").unwrap();

        assert_eq!(config.listen_port, DEFAULT_LISTEN_PORT);
        assert_eq!(config.max_batch_size, DEFAULT_MAX_BATCH_SIZE);
        // Sink connection and filter have no defaults; they surface as
        // absent and are validated at capture start.
        assert!(config.redis_connection.is_none());
        assert!(config.capture_filter.is_none());
    }

    #[test]
    fn invalid_batch_size_falls_back_to_default() {
        let config = Config::from_toml("max_batch_size = 0").unwrap();
        assert_eq!(config.max_batch_size, DEFAULT_MAX_BATCH_SIZE);

        let config = Config::from_toml("max_batch_size = -4").unwrap();
        assert_eq!(config.max_batch_size, DEFAULT_MAX_BATCH_SIZE);
    }

    #[test]
    fn invalid_port_is_an_error() {
        assert!(matches!(
            Config::from_toml("listen_port = 0"),
            Err(ConfigError::InvalidPort(_))
        ));
        assert!(matches!(
            Config::from_toml("listen_port = 70000"),
            Err(ConfigError::InvalidPort(_))
        ));
    }

    #[test]
    fn blank_strings_count_as_absent() {
        let config = Config::from_toml(
            r#"
            redis_connection = "  "
            capture_filter = ""
            "#,
        )
        .unwrap();

        assert!(config.redis_connection.is_none());
        assert!(config.capture_filter.is_none());
    }

    #[test]
    fn loads_from_a_file_on_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "listen_port = 59038").unwrap();
        writeln!(file, "capture_filter = \"ip\"").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.listen_port, 59038);
        assert_eq!(config.capture_filter.as_deref(), Some("ip"));
    }

    #[test]
    fn unreadable_file_is_an_io_error() {
        assert!(matches!(
            Config::from_file(Path::new("/nonexistent/sonde.toml")),
            Err(ConfigError::IoError(_))
        ));
    }
}
