//! Xilinx XDMA transport
//!
//! The Saturn board connects an Artix-7 FPGA to a Raspberry Pi CM4 over
//! PCI Express. The XDMA kernel driver exposes the FPGA as character devices:
//!
//! ```text
//! ┌──────────────────────────┐  PCIe   ┌────────────────────────────────┐
//! │  Host (Linux)            │◄───────►│  Artix-7 FPGA                  │
//! │                          │         │  ┌──────────┐  ┌────────────┐  │
//! │  /dev/xdma0_user  ───────┼─AXI-Lite┼─►│ registers│  │ FIFO mon.  │  │
//! │  /dev/xdma0_h2c_0 ───────┼─AXI-MM──┼─►│ stream   │─►│ DUC / spk  │  │
//! │  /dev/xdma0_c2h_0 ◄──────┼─AXI-MM──┼──│ reader/  │◄─│ DDC / mic  │  │
//! │                          │         │  │ writer   │  └────────────┘  │
//! └──────────────────────────┘         └────────────────────────────────┘
//! ```
//!
//! # Requirements
//!
//! - The `xdma` driver loaded and the board enumerated
//! - Read-write access to the device nodes (root or group membership)

mod config;
mod node;

pub use config::{DeviceConfig, DEFAULT_C2H_DEVICE, DEFAULT_H2C_DEVICE, DEFAULT_USER_DEVICE};
pub use node::DeviceNode;

use std::path::Path;

use crate::error::{TransferDirection, XdmaError, XdmaResult};
use crate::traits::RegisterAccess;

/// Register and DMA transport over the XDMA device nodes
///
/// This is the only type that touches the device files. Share it between
/// threads with an `Arc`; all access goes through positioned I/O.
#[derive(Debug)]
pub struct XdmaTransport {
    /// Register node
    user: Option<DeviceNode>,

    /// Host-to-card DMA node
    h2c: Option<DeviceNode>,

    /// Card-to-host DMA node
    c2h: Option<DeviceNode>,
}

impl XdmaTransport {
    /// Open the register node and any configured DMA nodes
    pub fn open(config: &DeviceConfig) -> XdmaResult<Self> {
        let user = DeviceNode::open(&config.user_device)?;

        let h2c = config
            .h2c_device
            .as_deref()
            .map(DeviceNode::open)
            .transpose()?;

        let c2h = config
            .c2h_device
            .as_deref()
            .map(DeviceNode::open)
            .transpose()?;

        Ok(Self {
            user: Some(user),
            h2c,
            c2h,
        })
    }

    /// Open the default XDMA nodes if the driver is present
    pub fn auto_detect() -> XdmaResult<Self> {
        Self::open(&DeviceConfig::default())
    }

    /// Check if the XDMA register node exists
    pub fn is_platform_available() -> bool {
        Path::new(DEFAULT_USER_DEVICE).exists()
    }

    /// Release all device nodes
    ///
    /// Register accesses after this return 0 / are dropped, bulk transfers
    /// fail with [`XdmaError::NotOpen`].
    pub fn close(&mut self) {
        for node in [self.user.take(), self.h2c.take(), self.c2h.take()]
            .into_iter()
            .flatten()
        {
            tracing::info!("closed {}", node.path.display());
        }
    }

    fn block_node(&self, direction: TransferDirection) -> XdmaResult<&DeviceNode> {
        let dma = match direction {
            TransferDirection::HostToCard => self.h2c.as_ref(),
            TransferDirection::CardToHost => self.c2h.as_ref(),
        };
        dma.or(self.user.as_ref()).ok_or(XdmaError::NotOpen)
    }
}

impl RegisterAccess for XdmaTransport {
    fn read_register(&self, address: u32) -> u32 {
        let Some(user) = &self.user else {
            tracing::debug!("register read 0x{:08x} on closed transport", address);
            return 0;
        };

        match user.read32(address) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("register read: addr=0x{:08x} error={}", address, e);
                0
            }
        }
    }

    fn write_register(&self, address: u32, value: u32) {
        let Some(user) = &self.user else {
            tracing::debug!("register write 0x{:08x} on closed transport", address);
            return;
        };

        if let Err(e) = user.write32(address, value) {
            tracing::error!(
                "register write: addr=0x{:08x} data=0x{:08x} error={}",
                address,
                value,
                e
            );
        }
    }

    fn write_block(&self, data: &[u8], axi_offset: u32) -> XdmaResult<()> {
        let direction = TransferDirection::HostToCard;
        let node = self.block_node(direction)?;

        node.write_at(data, axi_offset).map_err(|cause| {
            tracing::error!(
                "DMA write 0x{:x} @ 0x{:x} on {} failed: {}",
                data.len(),
                axi_offset,
                node.path.display(),
                cause
            );
            XdmaError::BulkTransfer {
                direction,
                length: data.len(),
                offset: axi_offset,
                cause,
            }
        })
    }

    fn read_block(&self, buffer: &mut [u8], axi_offset: u32) -> XdmaResult<()> {
        let direction = TransferDirection::CardToHost;
        let node = self.block_node(direction)?;
        let length = buffer.len();

        node.read_at(buffer, axi_offset).map_err(|cause| {
            tracing::error!(
                "DMA read 0x{:x} @ 0x{:x} on {} failed: {}",
                length,
                axi_offset,
                node.path.display(),
                cause
            );
            XdmaError::BulkTransfer {
                direction,
                length,
                offset: axi_offset,
                cause,
            }
        })
    }

    fn is_open(&self) -> bool {
        self.user.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransferFailure;
    use tempfile::NamedTempFile;

    fn transport(len: u64) -> (NamedTempFile, XdmaTransport) {
        let backing = NamedTempFile::new().unwrap();
        backing.as_file().set_len(len).unwrap();
        let transport = XdmaTransport::open(&DeviceConfig::single_node(backing.path())).unwrap();
        (backing, transport)
    }

    #[test]
    fn test_register_roundtrip() {
        let (_backing, xdma) = transport(0x1_0000);
        xdma.write_register(0xC000, 0x0421_00D0);
        assert_eq!(xdma.read_register(0xC000), 0x0421_00D0);
    }

    #[test]
    fn test_short_register_read_is_soft() {
        let (_backing, xdma) = transport(0x10);
        assert_eq!(xdma.read_register(0x9000), 0);
    }

    #[test]
    fn test_closed_transport() {
        let (_backing, mut xdma) = transport(0x1000);
        xdma.write_register(0x10, 7);
        xdma.close();

        assert!(!xdma.is_open());
        assert_eq!(xdma.read_register(0x10), 0);
        xdma.write_register(0x10, 9);

        let mut buf = [0u8; 16];
        assert!(matches!(xdma.read_block(&mut buf, 0), Err(XdmaError::NotOpen)));
        assert!(matches!(xdma.write_block(&buf, 0), Err(XdmaError::NotOpen)));

        // closing twice is harmless
        xdma.close();
    }

    #[test]
    fn test_block_roundtrip() {
        let (_backing, xdma) = transport(0x2_0000);
        let payload: Vec<u8> = (0..=255u8).collect();

        xdma.write_block(&payload, 0x1_0000).unwrap();

        let mut readback = vec![0u8; payload.len()];
        xdma.read_block(&mut readback, 0x1_0000).unwrap();
        assert_eq!(readback, payload);
    }

    #[test]
    fn test_short_block_read_is_reported() {
        let (_backing, xdma) = transport(0x1_0100);
        let mut buf = vec![0u8; 0x200];

        let err = xdma.read_block(&mut buf, 0x1_0000).unwrap_err();
        match err {
            XdmaError::BulkTransfer {
                direction,
                length,
                offset,
                cause,
            } => {
                assert_eq!(direction, TransferDirection::CardToHost);
                assert_eq!(length, 0x200);
                assert_eq!(offset, 0x1_0000);
                assert_eq!(cause, TransferFailure::Short(0x100));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_dma_node() {
        let backing = NamedTempFile::new().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let config = DeviceConfig::single_node(backing.path())
            .dma_devices(dir.path().join("h2c"), dir.path().join("c2h"));

        let err = XdmaTransport::open(&config).unwrap_err();
        assert!(matches!(err, XdmaError::DeviceUnavailable { .. }));
    }

    #[test]
    fn test_separate_dma_nodes() {
        let user = NamedTempFile::new().unwrap();
        let h2c = NamedTempFile::new().unwrap();
        let c2h = NamedTempFile::new().unwrap();
        c2h.as_file().set_len(0x100).unwrap();

        let config = DeviceConfig::single_node(user.path()).dma_devices(h2c.path(), c2h.path());
        let xdma = XdmaTransport::open(&config).unwrap();

        xdma.write_block(&[0xAA; 8], 0x20).unwrap();
        assert_eq!(std::fs::read(h2c.path()).unwrap()[0x20..0x28], [0xAA; 8]);
        assert_eq!(std::fs::metadata(user.path()).unwrap().len(), 0);

        let mut buf = [0xFFu8; 8];
        xdma.read_block(&mut buf, 0x20).unwrap();
        assert_eq!(buf, [0u8; 8]);
    }
}
