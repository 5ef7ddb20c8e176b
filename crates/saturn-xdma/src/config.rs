//! # Configuration
//!
//! YAML configuration for the Saturn core: device nodes, register map
//! overrides, supported firmware range and logging.
//!
//! ## Configuration Search Path
//!
//! Configuration is loaded from the first file found:
//! 1. Path specified via `SATURN_CONFIG` environment variable
//! 2. `./saturn.yaml` (current directory)
//! 3. `~/.config/saturn/config.yaml` (user config)
//! 4. `/etc/saturn/config.yaml` (system config)
//!
//! ## Example Configuration
//!
//! ```yaml
//! device:
//!   user_device: /dev/xdma0_user
//!   h2c_device: /dev/xdma0_h2c_0
//!   c2h_device: /dev/xdma0_c2h_0
//!
//! registers:
//!   fifo_monitor_base: 0x9000
//!
//! firmware:
//!   version_min: 8
//!
//! strict_firmware: false
//!
//! logging:
//!   level: debug
//!   format: compact
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::firmware::FirmwareSupport;
use crate::logging::LogConfig;
use crate::registers::RegisterMap;
use crate::types::StreamChannel;
use crate::xdma::DeviceConfig;

/// Environment variable naming a configuration file
pub const CONFIG_ENV: &str = "SATURN_CONFIG";

/// Error type for configuration operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("config not found: {0}")]
    NotFound(String),
    /// Failed to read or write configuration file
    #[error("failed to read config: {0}")]
    Read(String),
    /// Failed to parse configuration
    #[error("failed to parse config: {0}")]
    Parse(String),
    /// Invalid configuration value
    #[error("invalid config: {0}")]
    Validation(String),
}

/// Complete Saturn configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SaturnConfig {
    /// XDMA device nodes
    pub device: DeviceConfig,
    /// Register address overrides
    pub registers: RegisterMap,
    /// Firmware versions accepted at startup
    pub firmware: FirmwareSupport,
    /// Refuse to start on firmware outside `firmware`, instead of warning
    pub strict_firmware: bool,
    /// Logging configuration
    pub logging: LogConfig,
}

impl SaturnConfig {
    /// Load configuration from the default search path.
    ///
    /// Returns the defaults if no file is found. A `SATURN_CONFIG` that
    /// names a missing file is an error.
    pub fn load() -> Result<Self, ConfigError> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if !path.exists() {
                return Err(ConfigError::NotFound(format!(
                    "{} ({})",
                    path.display(),
                    CONFIG_ENV
                )));
            }
            return Self::load_from(&path);
        }

        for path in Self::config_search_paths() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load and validate configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(format!("{}: {}", path.display(), e)))?;

        let config = Self::parse(&content)?;
        config.validate()?;
        tracing::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content =
            serde_yaml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))?;

        std::fs::write(path, content)
            .map_err(|e| ConfigError::Read(format!("{}: {}", path.display(), e)))
    }

    /// Get configuration search paths.
    pub fn config_search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./saturn.yaml")];

        if let Some(dirs) = directories::ProjectDirs::from("", "", "saturn") {
            paths.push(dirs.config_dir().join("config.yaml"));
        }

        paths.push(PathBuf::from("/etc/saturn/config.yaml"));
        paths
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device.user_device.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "device.user_device must not be empty".to_string(),
            ));
        }

        let mut used = 0u32;
        for channel in StreamChannel::ALL {
            let bit = self.registers.reset_bit(channel);
            if bit >= 32 {
                return Err(ConfigError::Validation(format!(
                    "reset bit {} for {} is outside the 32 bit register",
                    bit, channel
                )));
            }
            if used & (1 << bit) != 0 {
                return Err(ConfigError::Validation(format!(
                    "reset bit {} for {} is shared with another channel",
                    bit, channel
                )));
            }
            used |= 1 << bit;
        }

        for (name, address) in [
            ("sw_version", self.registers.sw_version),
            ("fifo_monitor_base", self.registers.fifo_monitor_base),
            ("fifo_config_offset", self.registers.fifo_config_offset),
            ("fifo_reset", self.registers.fifo_reset),
        ] {
            if address % 4 != 0 {
                return Err(ConfigError::Validation(format!(
                    "registers.{} (0x{:x}) must be word aligned",
                    name, address
                )));
            }
        }

        let fw = &self.firmware;
        if fw.version_min > fw.version_max || fw.major_min > fw.major_max {
            return Err(ConfigError::Validation(format!(
                "firmware range is empty ({})",
                fw
            )));
        }

        Ok(())
    }

    /// Generate example configuration YAML.
    pub fn example_yaml() -> String {
        serde_yaml::to_string(&Self::default()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SaturnConfig::default();
        assert_eq!(config.device.user_device, PathBuf::from("/dev/xdma0_user"));
        assert_eq!(config.registers, RegisterMap::default());
        assert!(!config.strict_firmware);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_yaml() {
        let yaml = r#"
device:
  user_device: /dev/xdma1_user
  h2c_device: ~
registers:
  fifo_monitor_base: 0x8000
strict_firmware: true
"#;

        let config = SaturnConfig::parse(yaml).unwrap();
        assert_eq!(config.device.user_device, PathBuf::from("/dev/xdma1_user"));
        assert_eq!(config.device.h2c_device, None);
        assert_eq!(
            config.device.c2h_device,
            Some(PathBuf::from("/dev/xdma0_c2h_0"))
        );
        assert_eq!(config.registers.fifo_monitor_base, 0x8000);
        // Defaults should be applied
        assert_eq!(config.registers.fifo_reset, 0xA028);
        assert!(config.strict_firmware);
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            SaturnConfig::parse("registers: [1, 2"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_validation() {
        let mut config = SaturnConfig::default();
        config.registers.reset_bit_tx_duc = config.registers.reset_bit_rx_ddc;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let mut config = SaturnConfig::default();
        config.registers.reset_bit_mic_codec = 32;
        assert!(config.validate().is_err());

        let mut config = SaturnConfig::default();
        config.registers.fifo_reset = 0xA029;
        assert!(config.validate().is_err());

        let mut config = SaturnConfig::default();
        config.firmware.version_min = 30;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saturn.yaml");

        let mut config = SaturnConfig::default();
        config.strict_firmware = true;
        config.firmware.version_max = 25;
        config.save(&path).unwrap();

        let loaded = SaturnConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = SaturnConfig::load_from(&dir.path().join("none.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read(_)));
    }

    #[test]
    fn test_example_yaml() {
        let yaml = SaturnConfig::example_yaml();
        assert!(yaml.contains("device:"));
        assert!(yaml.contains("registers:"));
        assert_eq!(SaturnConfig::parse(&yaml).unwrap(), SaturnConfig::default());
    }

    #[test]
    fn test_config_search_paths() {
        let paths = SaturnConfig::config_search_paths();
        assert!(paths[0].ends_with("saturn.yaml"));
        assert!(paths
            .last()
            .is_some_and(|p| p.starts_with("/etc/saturn")));
    }
}
