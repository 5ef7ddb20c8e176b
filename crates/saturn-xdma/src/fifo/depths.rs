//! FIFO depth profiles
//!
//! The stream FIFOs were enlarged in later firmware. Depths are counted in
//! 64 bit FIFO locations.

use serde::{Deserialize, Serialize};

use crate::firmware::FirmwareInfo;
use crate::registers::RegisterMap;
use crate::traits::RegisterAccess;
use crate::types::StreamChannel;

/// Depth of each stream FIFO, in 64 bit locations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FifoDepths {
    pub rx_ddc: u32,
    pub tx_duc: u32,
    pub mic_codec: u32,
    pub spk_codec: u32,
}

impl FifoDepths {
    /// Firmware before version 10
    pub const LEGACY: Self = Self {
        rx_ddc: 8192,
        tx_duc: 1024,
        mic_codec: 256,
        spk_codec: 256,
    };

    /// Firmware versions 10 to 12
    pub const V10: Self = Self {
        rx_ddc: 16384,
        tx_duc: 2048,
        mic_codec: 256,
        spk_codec: 1024,
    };

    /// Firmware version 13 and later
    pub const V13: Self = Self {
        rx_ddc: 16384,
        tx_duc: 4096,
        mic_codec: 256,
        spk_codec: 1024,
    };

    /// Select the profile for a firmware version
    pub fn for_firmware(version: u16) -> Self {
        match version {
            0..=9 => Self::LEGACY,
            10..=12 => Self::V10,
            _ => Self::V13,
        }
    }

    /// Read the firmware version from the device and select its profile
    pub fn initialize<T: RegisterAccess + ?Sized>(device: &T, map: &RegisterMap) -> Self {
        Self::resolve(&FirmwareInfo::read(device, map))
    }

    /// Select the profile for already identified firmware
    pub fn resolve(firmware: &FirmwareInfo) -> Self {
        let depths = Self::for_firmware(firmware.version);

        match firmware.version {
            0..=9 => {}
            10..=12 => tracing::info!("loading new FIFO sizes for updated firmware <= 12"),
            _ => tracing::info!("loading new FIFO sizes for updated firmware V13+"),
        }
        tracing::debug!(?depths, firmware = %firmware, "FIFO depth table resolved");

        depths
    }

    /// Depth of one channel's FIFO
    pub fn depth(&self, channel: StreamChannel) -> u32 {
        match channel {
            StreamChannel::RxDdc => self.rx_ddc,
            StreamChannel::TxDuc => self.tx_duc,
            StreamChannel::MicCodec => self.mic_codec,
            StreamChannel::SpkCodec => self.spk_codec,
        }
    }
}

impl Default for FifoDepths {
    fn default() -> Self {
        Self::LEGACY
    }
}
