//! Register and DMA access trait

use crate::error::XdmaResult;

/// Raw access to the FPGA register space and AXI stream window
///
/// Register accesses are high-frequency status polling and are best effort:
/// a failed read yields 0 and a failed write is dropped, both with a logged
/// diagnostic. Bulk transfers move stream payload and report failures, since a
/// lost block desynchronises the stream.
///
/// Every method is a single blocking positioned transfer. Implementations
/// are shared between the RX, TX and control threads without a lock; the only
/// multi-step sequence (FIFO reset) is serialised by
/// [`FifoMonitor`](crate::fifo::FifoMonitor).
///
/// # Example
///
/// ```rust
/// use saturn_xdma::{RegisterAccess, SimulatedXdma};
///
/// let device = SimulatedXdma::new();
/// device.write_register(0xA000, 0x1234);
/// assert_eq!(device.read_register(0xA000), 0x1234);
/// ```
pub trait RegisterAccess: Send + Sync {
    /// Read one 32 bit register (0 on failure)
    fn read_register(&self, address: u32) -> u32;

    /// Write one 32 bit register (ignored on failure)
    fn write_register(&self, address: u32, value: u32);

    /// Write `data` to the FPGA at `axi_offset` (host to card DMA)
    fn write_block(&self, data: &[u8], axi_offset: u32) -> XdmaResult<()>;

    /// Fill `buffer` from the FPGA at `axi_offset` (card to host DMA)
    fn read_block(&self, buffer: &mut [u8], axi_offset: u32) -> XdmaResult<()>;

    /// Whether the device handle is currently open
    fn is_open(&self) -> bool;
}
