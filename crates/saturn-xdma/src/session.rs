//! Startup sequence for a Saturn board
//!
//! Bringing the core up is two-phase: first the transport is opened and the
//! firmware identified, then the FIFO monitor is built with the depth table
//! for that firmware. Nothing after [`Session::start`] changes the table.

use std::path::Path;
use std::sync::Arc;

use crate::config::SaturnConfig;
use crate::error::XdmaResult;
use crate::fifo::{FifoDepths, FifoMonitor};
use crate::firmware::FirmwareInfo;
use crate::traits::RegisterAccess;
use crate::xdma::XdmaTransport;

/// An initialised board: transport, firmware identity and FIFO monitor
pub struct Session<T: RegisterAccess + ?Sized> {
    transport: Arc<T>,
    firmware: FirmwareInfo,
    monitor: Arc<FifoMonitor<T>>,
}

impl Session<XdmaTransport> {
    /// Open the XDMA nodes named in the configuration and start the core
    pub fn open(config: &SaturnConfig) -> XdmaResult<Self> {
        let transport = XdmaTransport::open(&config.device)?;
        Self::start(Arc::new(transport), config)
    }

    /// Load a configuration file, then open and start the board it describes
    pub fn from_config_file(path: &Path) -> XdmaResult<Self> {
        let config = SaturnConfig::load_from(path)?;
        Self::open(&config)
    }
}

impl<T: RegisterAccess + ?Sized> Session<T> {
    /// Identify the firmware on an open device and build the FIFO monitor
    ///
    /// Firmware outside the configured range is logged and accepted, unless
    /// `strict_firmware` is set.
    pub fn start(transport: Arc<T>, config: &SaturnConfig) -> XdmaResult<Self> {
        let firmware = FirmwareInfo::read(&*transport, &config.registers);
        tracing::info!("Saturn firmware {}", firmware);

        if let Err(e) = config.firmware.check(&firmware) {
            if config.strict_firmware {
                tracing::error!("{}", e);
                return Err(e);
            }
            tracing::warn!("{}", e);
        }

        let depths = FifoDepths::resolve(&firmware);
        let monitor = FifoMonitor::with_depths(Arc::clone(&transport), config.registers, depths);

        Ok(Self {
            transport,
            firmware,
            monitor: Arc::new(monitor),
        })
    }

    /// Firmware identified at startup
    pub fn firmware(&self) -> &FirmwareInfo {
        &self.firmware
    }

    /// Register and DMA transport
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// FIFO monitor, shareable with streaming threads
    pub fn monitor(&self) -> &Arc<FifoMonitor<T>> {
        &self.monitor
    }
}

#[cfg(all(test, feature = "sim"))]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::error::XdmaError;
    use crate::registers::RegisterMap;
    use crate::sim::SimulatedXdma;
    use crate::types::{SoftwareId, StreamChannel};

    fn version_word(major: u32, id: u32, version: u32) -> u32 {
        (major << 25) | (id << 20) | (version << 4)
    }

    #[test]
    fn test_start_resolves_firmware_and_depths() {
        let sim = Arc::new(SimulatedXdma::with_firmware(version_word(1, 3, 12)));
        let session = Session::start(sim, &SaturnConfig::default()).unwrap();

        assert_eq!(session.firmware().version, 12);
        assert_eq!(session.firmware().software_id, SoftwareId(3));
        assert_eq!(*session.monitor().depths(), FifoDepths::V10);
    }

    #[test]
    fn test_unsupported_firmware_warns_by_default() {
        let sim = Arc::new(SimulatedXdma::with_firmware(version_word(1, 0, 4)));
        let session = Session::start(sim, &SaturnConfig::default()).unwrap();
        assert_eq!(*session.monitor().depths(), FifoDepths::LEGACY);
    }

    #[test]
    fn test_strict_firmware_rejects() {
        let sim = Arc::new(SimulatedXdma::with_firmware(version_word(1, 0, 4)));
        let config = SaturnConfig {
            strict_firmware: true,
            ..Default::default()
        };

        let result = Session::start(sim, &config);
        assert!(matches!(
            result,
            Err(XdmaError::UnsupportedFirmware { .. })
        ));
    }

    #[test]
    fn test_from_config_file_reports_config_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = Session::from_config_file(&dir.path().join("saturn.yaml"));
        assert!(matches!(
            missing,
            Err(XdmaError::Config(ConfigError::Read(_)))
        ));

        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "registers:\n  reset_bit_rx_ddc: 40\n").unwrap();
        assert!(matches!(
            Session::from_config_file(&path),
            Err(XdmaError::Config(ConfigError::Validation(_)))
        ));
    }

    #[test]
    fn test_from_config_file_opens_configured_nodes() {
        let dir = tempfile::tempdir().unwrap();
        let user = tempfile::NamedTempFile::new().unwrap();
        user.as_file().set_len(0x1_0000).unwrap();

        let mut config = SaturnConfig::default();
        config.device = crate::xdma::DeviceConfig::single_node(user.path());
        let path = dir.path().join("saturn.yaml");
        config.save(&path).unwrap();

        // an all-zero register file reads as firmware 0: accepted with a warning
        let session = Session::from_config_file(&path).unwrap();
        assert_eq!(session.firmware().version, 0);
        assert_eq!(*session.monitor().depths(), FifoDepths::LEGACY);

        config.device = crate::xdma::DeviceConfig::single_node(dir.path().join("xdma0_user"));
        config.save(&path).unwrap();
        assert!(matches!(
            Session::from_config_file(&path),
            Err(XdmaError::DeviceUnavailable { .. })
        ));
    }

    #[test]
    fn test_custom_register_map() {
        let map = RegisterMap {
            sw_version: 0x100,
            fifo_monitor_base: 0x200,
            ..Default::default()
        };
        let sim = Arc::new(SimulatedXdma::with_register_map(map));
        sim.set_register(0x100, version_word(1, 0, 13));
        sim.set_fifo_status(StreamChannel::TxDuc, 96);

        let config = SaturnConfig {
            registers: map,
            ..Default::default()
        };
        let session = Session::start(Arc::clone(&sim), &config).unwrap();

        let status = session.monitor().read_channel_status(StreamChannel::TxDuc);
        assert_eq!(status.available, 4096 - 96);
    }
}
