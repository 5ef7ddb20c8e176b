//! XDMA device node configuration

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Register (AXI-Lite) node created by the Xilinx XDMA driver
pub const DEFAULT_USER_DEVICE: &str = "/dev/xdma0_user";
/// Host-to-card DMA channel 0
pub const DEFAULT_H2C_DEVICE: &str = "/dev/xdma0_h2c_0";
/// Card-to-host DMA channel 0
pub const DEFAULT_C2H_DEVICE: &str = "/dev/xdma0_c2h_0";

/// Device nodes used by [`XdmaTransport`](super::XdmaTransport)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Register node, always required
    pub user_device: PathBuf,

    /// Host-to-card DMA node. When `None`, bulk writes go to the register node.
    pub h2c_device: Option<PathBuf>,

    /// Card-to-host DMA node. When `None`, bulk reads go to the register node.
    pub c2h_device: Option<PathBuf>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            user_device: PathBuf::from(DEFAULT_USER_DEVICE),
            h2c_device: Some(PathBuf::from(DEFAULT_H2C_DEVICE)),
            c2h_device: Some(PathBuf::from(DEFAULT_C2H_DEVICE)),
        }
    }
}

impl DeviceConfig {
    /// Use a single node for registers and bulk transfers
    pub fn single_node(path: impl Into<PathBuf>) -> Self {
        Self {
            user_device: path.into(),
            h2c_device: None,
            c2h_device: None,
        }
    }

    /// Builder: set the register node
    pub fn user_device(mut self, path: impl Into<PathBuf>) -> Self {
        self.user_device = path.into();
        self
    }

    /// Builder: set the DMA nodes
    pub fn dma_devices(mut self, h2c: impl Into<PathBuf>, c2h: impl Into<PathBuf>) -> Self {
        self.h2c_device = Some(h2c.into());
        self.c2h_device = Some(c2h.into());
        self
    }
}
