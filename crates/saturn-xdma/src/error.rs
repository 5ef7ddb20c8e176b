//! XDMA error types

use std::fmt;
use std::io;
use std::path::PathBuf;

use nix::errno::Errno;
use thiserror::Error;

use crate::config::ConfigError;
use crate::firmware::{FirmwareInfo, FirmwareSupport};

/// Result type for XDMA operations
pub type XdmaResult<T> = Result<T, XdmaError>;

/// Direction of a bulk (DMA) transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    /// Host to card (stream writer, e.g. DUC and speaker samples)
    HostToCard,
    /// Card to host (stream reader, e.g. DDC and microphone samples)
    CardToHost,
}

impl fmt::Display for TransferDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferDirection::HostToCard => write!(f, "write"),
            TransferDirection::CardToHost => write!(f, "read"),
        }
    }
}

/// Why a bulk transfer did not complete
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferFailure {
    /// The driver moved fewer bytes than requested
    #[error("short transfer of {0} bytes")]
    Short(usize),

    /// The driver returned a negative result
    #[error("{0}")]
    Os(#[from] Errno),
}

/// Errors that can occur while driving the radio front end
#[derive(Error, Debug)]
pub enum XdmaError {
    /// Device node could not be opened (driver not loaded, permissions)
    #[error("XDMA device {} unavailable: {source}", path.display())]
    DeviceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A bulk transfer was attempted after the transport was closed
    #[error("XDMA transport is not open")]
    NotOpen,

    /// A DMA read or write returned short or failed
    #[error("DMA {direction} of 0x{length:x} bytes at AXI offset 0x{offset:x} failed: {cause}")]
    BulkTransfer {
        direction: TransferDirection,
        length: usize,
        offset: u32,
        #[source]
        cause: TransferFailure,
    },

    /// Firmware outside the range this library has been validated against
    #[error("firmware {info} is outside the supported range ({support})")]
    UnsupportedFirmware {
        info: FirmwareInfo,
        support: FirmwareSupport,
    },

    /// Channel name not recognised
    #[error("unknown stream channel '{0}' (expected rx, tx, mic or spk)")]
    UnknownChannel(String),

    /// Aligned DMA buffer could not be allocated
    #[error("DMA buffer allocation failed: {0}")]
    DmaAllocation(String),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl XdmaError {
    /// Check if the stream can be re-synchronised and retried after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            XdmaError::BulkTransfer {
                cause: TransferFailure::Short(_),
                ..
            } | XdmaError::BulkTransfer {
                cause: TransferFailure::Os(Errno::EINTR | Errno::EAGAIN | Errno::EIO),
                ..
            }
        )
    }

    /// Check if this is a permission error on a device node
    pub fn is_permission_error(&self) -> bool {
        matches!(
            self,
            XdmaError::DeviceUnavailable { source, .. }
                if source.kind() == io::ErrorKind::PermissionDenied
        )
    }

    /// Underlying OS error code of a failed bulk transfer, if any
    pub fn errno(&self) -> Option<Errno> {
        match self {
            XdmaError::BulkTransfer {
                cause: TransferFailure::Os(errno),
                ..
            } => Some(*errno),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bulk_transfer_message() {
        let err = XdmaError::BulkTransfer {
            direction: TransferDirection::CardToHost,
            length: 0x800,
            offset: 0x10000,
            cause: TransferFailure::Short(512),
        };
        let msg = err.to_string();
        assert!(msg.contains("read of 0x800 bytes"));
        assert!(msg.contains("0x10000"));
        assert!(err.is_recoverable());
        assert_eq!(err.errno(), None);
    }

    #[test]
    fn test_errno_is_exposed() {
        let err = XdmaError::BulkTransfer {
            direction: TransferDirection::HostToCard,
            length: 64,
            offset: 0,
            cause: TransferFailure::Os(Errno::EFAULT),
        };
        assert_eq!(err.errno(), Some(Errno::EFAULT));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_permission_error() {
        let err = XdmaError::DeviceUnavailable {
            path: PathBuf::from("/dev/xdma0_user"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert!(err.is_permission_error());
        assert!(err.to_string().contains("/dev/xdma0_user"));
    }
}
