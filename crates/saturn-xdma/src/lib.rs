//! Saturn XDMA register and stream core
//!
//! This crate drives the FPGA side of the Saturn SDR board, reached over
//! PCI Express through the Xilinx XDMA driver. It provides:
//!
//! - **Transport**: 32 bit register access and bulk DMA on the XDMA nodes
//! - **Firmware**: identification of the loaded FPGA image
//! - **FIFO monitor**: depth table, status decode, configuration and reset
//!   of the four stream FIFOs
//! - **DDC headers**: per-DDC sample counts of an RX frame
//! - **Simulation**: a software register file for development without a board
//!
//! # Feature Flags
//!
//! - `sim` (default): Simulated XDMA backend
//! - `cli` (default): The `saturn-probe` diagnostic tool
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use saturn_xdma::{SaturnConfig, Session, SimulatedXdma, StreamChannel};
//!
//! // Firmware v1.13 on a simulated board
//! let board = Arc::new(SimulatedXdma::with_firmware((1 << 25) | (13 << 4)));
//! let session = Session::start(board, &SaturnConfig::default()).unwrap();
//!
//! let monitor = session.monitor();
//! monitor.reset_channel_fifo(StreamChannel::RxDdc);
//! let status = monitor.read_channel_status(StreamChannel::TxDuc);
//! assert_eq!(status.available, 4096);
//! ```

pub mod config;
pub mod ddc;
pub mod dma;
pub mod error;
pub mod fifo;
pub mod firmware;
pub mod logging;
pub mod registers;
pub mod session;
pub mod traits;
pub mod types;
pub mod xdma;

#[cfg(feature = "sim")]
pub mod sim;

// Re-export main types
pub use config::{ConfigError, SaturnConfig};
pub use ddc::{decode_frame_header, DdcSampleCounts, NUM_DDC};
pub use dma::DmaBuffer;
pub use error::{TransferDirection, TransferFailure, XdmaError, XdmaResult};
pub use fifo::{FifoDepths, FifoMonitor, FifoStatus};
pub use firmware::{firmware_major_version, firmware_version, FirmwareInfo, FirmwareSupport};
pub use registers::RegisterMap;
pub use session::Session;
pub use traits::RegisterAccess;
pub use types::{SoftwareId, StreamChannel};
pub use xdma::{DeviceConfig, XdmaTransport};

#[cfg(feature = "sim")]
pub use sim::SimulatedXdma;

/// Open the XDMA device, falling back to the simulator when no board is present
#[cfg(feature = "sim")]
pub fn create_default(config: &DeviceConfig) -> std::sync::Arc<dyn RegisterAccess> {
    match XdmaTransport::open(config) {
        Ok(transport) => std::sync::Arc::new(transport),
        Err(e) => {
            tracing::warn!("{}; using simulated XDMA device", e);
            std::sync::Arc::new(SimulatedXdma::new())
        }
    }
}

/// Check if an XDMA board is available
pub fn hardware_available() -> bool {
    XdmaTransport::is_platform_available()
}
