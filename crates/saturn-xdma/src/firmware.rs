//! Firmware identification
//!
//! The FPGA reports its identity in a single register:
//!
//! ```text
//!  31      25 24    20 19                    4 3   0
//! ┌──────────┬────────┬───────────────────────┬─────┐
//! │  major   │ sw id  │        version        │  -  │
//! └──────────┴────────┴───────────────────────┴─────┘
//! ```
//!
//! The 16 bit `version` selects the FIFO depth profile; `major` tracks
//! incompatible changes to the register set.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{XdmaError, XdmaResult};
use crate::registers::{version, RegisterMap};
use crate::traits::RegisterAccess;
use crate::types::SoftwareId;

/// Decoded content of the software version register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwareInfo {
    /// Board identity code
    pub software_id: SoftwareId,
    /// Firmware (minor) version
    pub version: u16,
    /// Major firmware version
    pub major: u8,
}

impl FirmwareInfo {
    /// Decode a raw version register word
    pub fn decode(word: u32) -> Self {
        Self {
            software_id: SoftwareId(((word >> version::ID_SHIFT) & version::ID_MASK) as u8),
            version: ((word >> version::VERSION_SHIFT) & version::VERSION_MASK) as u16,
            major: ((word >> version::MAJOR_SHIFT) & version::MAJOR_MASK) as u8,
        }
    }

    /// Read and decode the version register
    pub fn read<T: RegisterAccess + ?Sized>(device: &T, map: &RegisterMap) -> Self {
        Self::decode(device.read_register(map.sw_version))
    }
}

impl fmt::Display for FirmwareInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "v{}.{} (id {})",
            self.major, self.version, self.software_id
        )
    }
}

/// Read the board identity and firmware version
pub fn firmware_version<T: RegisterAccess + ?Sized>(
    device: &T,
    map: &RegisterMap,
) -> (SoftwareId, u16) {
    let info = FirmwareInfo::read(device, map);
    (info.software_id, info.version)
}

/// Read the major firmware version
pub fn firmware_major_version<T: RegisterAccess + ?Sized>(device: &T, map: &RegisterMap) -> u8 {
    FirmwareInfo::read(device, map).major
}

/// Firmware versions this library has been validated against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FirmwareSupport {
    /// Oldest supported (minor) version
    pub version_min: u16,
    /// Newest supported (minor) version
    pub version_max: u16,
    /// Oldest supported major version
    pub major_min: u8,
    /// Newest supported major version
    pub major_max: u8,
}

impl Default for FirmwareSupport {
    fn default() -> Self {
        Self {
            version_min: 8,
            version_max: 21,
            major_min: 1,
            major_max: 2,
        }
    }
}

impl FirmwareSupport {
    /// Check whether the firmware lies within the supported ranges
    pub fn supports(&self, info: &FirmwareInfo) -> bool {
        (self.version_min..=self.version_max).contains(&info.version)
            && (self.major_min..=self.major_max).contains(&info.major)
    }

    /// Fail with [`XdmaError::UnsupportedFirmware`] outside the supported ranges
    pub fn check(&self, info: &FirmwareInfo) -> XdmaResult<()> {
        if self.supports(info) {
            Ok(())
        } else {
            Err(XdmaError::UnsupportedFirmware {
                info: *info,
                support: *self,
            })
        }
    }
}

impl fmt::Display for FirmwareSupport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "major {}:{}, minor {}:{}",
            self.major_min, self.major_max, self.version_min, self.version_max
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(major: u32, id: u32, version: u32) -> u32 {
        (major << 25) | (id << 20) | (version << 4)
    }

    #[test]
    fn test_decode_fields() {
        let info = FirmwareInfo::decode(word(2, 0x13, 0xBEEF) | 0xF);
        assert_eq!(info.major, 2);
        assert_eq!(info.software_id, SoftwareId(0x13));
        assert_eq!(info.version, 0xBEEF);
    }

    #[test]
    fn test_decode_saturates_field_widths() {
        let info = FirmwareInfo::decode(u32::MAX);
        assert_eq!(info.major, 0x7F);
        assert_eq!(info.software_id, SoftwareId(0x1F));
        assert_eq!(info.version, 0xFFFF);
    }

    #[cfg(feature = "sim")]
    #[test]
    fn test_read_from_device() {
        let sim = crate::sim::SimulatedXdma::with_firmware(word(1, 3, 13));
        let map = RegisterMap::default();

        assert_eq!(firmware_version(&sim, &map), (SoftwareId(3), 13));
        assert_eq!(firmware_major_version(&sim, &map), 1);
    }

    #[test]
    fn test_support_range() {
        let support = FirmwareSupport::default();
        assert!(support.check(&FirmwareInfo::decode(word(1, 0, 13))).is_ok());

        let too_old = FirmwareInfo::decode(word(1, 0, 7));
        assert!(matches!(
            support.check(&too_old),
            Err(XdmaError::UnsupportedFirmware { .. })
        ));

        let wrong_major = FirmwareInfo::decode(word(3, 0, 13));
        assert!(!support.supports(&wrong_major));
    }
}
