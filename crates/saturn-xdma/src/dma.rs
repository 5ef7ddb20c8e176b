//! Page-aligned buffers for XDMA bulk transfers
//!
//! The XDMA driver pins the user pages of a transfer and builds a descriptor
//! per page, so page-aligned buffers keep the descriptor count minimal.

use std::alloc::{self, Layout};
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

use crate::error::{TransferDirection, TransferFailure, XdmaError, XdmaResult};
use crate::registers::stream;
use crate::traits::RegisterAccess;

/// Zeroed, page-aligned byte buffer
pub struct DmaBuffer {
    ptr: NonNull<u8>,
    layout: Layout,
}

impl DmaBuffer {
    /// Allocate a zeroed buffer of `size` bytes aligned to the system page size
    pub fn new(size: usize) -> XdmaResult<Self> {
        if size == 0 {
            return Err(XdmaError::DmaAllocation(
                "zero-length buffer".to_string(),
            ));
        }

        let layout = Layout::from_size_align(size, page_size()).map_err(|e| {
            XdmaError::DmaAllocation(format!("invalid layout for {} bytes: {}", size, e))
        })?;

        let ptr = unsafe { alloc::alloc_zeroed(layout) };
        let ptr = NonNull::new(ptr).ok_or_else(|| {
            XdmaError::DmaAllocation(format!("out of memory allocating {} bytes", size))
        })?;

        Ok(Self { ptr, layout })
    }

    /// Allocate a buffer of the standard stream transfer size
    pub fn with_default_size() -> XdmaResult<Self> {
        Self::new(stream::DMA_BUFFER_SIZE)
    }

    /// Alignment of the buffer in bytes
    pub fn alignment(&self) -> usize {
        self.layout.align()
    }

    /// Fill the whole buffer from the card
    pub fn read_from<T: RegisterAccess + ?Sized>(
        &mut self,
        device: &T,
        axi_offset: u32,
    ) -> XdmaResult<()> {
        device.read_block(self, axi_offset)
    }

    /// Send the first `length` bytes to the card
    ///
    /// A `length` beyond the buffer is reported as a short transfer and
    /// nothing is sent.
    pub fn write_to<T: RegisterAccess + ?Sized>(
        &self,
        device: &T,
        length: usize,
        axi_offset: u32,
    ) -> XdmaResult<()> {
        if length > self.len() {
            return Err(XdmaError::BulkTransfer {
                direction: TransferDirection::HostToCard,
                length,
                offset: axi_offset,
                cause: TransferFailure::Short(self.len()),
            });
        }
        device.write_block(&self[..length], axi_offset)
    }
}

impl Deref for DmaBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.layout.size()) }
    }
}

impl DerefMut for DmaBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.layout.size()) }
    }
}

impl Drop for DmaBuffer {
    fn drop(&mut self) {
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) };
    }
}

impl std::fmt::Debug for DmaBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DmaBuffer")
            .field("len", &self.layout.size())
            .field("align", &self.layout.align())
            .finish()
    }
}

// Safety: DmaBuffer owns its allocation exclusively
unsafe impl Send for DmaBuffer {}

// Safety: shared access only hands out `&[u8]`
unsafe impl Sync for DmaBuffer {}

fn page_size() -> usize {
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size > 0 {
        size as usize
    } else {
        4096
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alignment_and_zeroed() {
        let buf = DmaBuffer::new(1000).unwrap();
        assert_eq!(buf.len(), 1000);
        assert_eq!(buf.as_ptr() as usize % buf.alignment(), 0);
        assert!(buf.alignment() >= 4096);
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_default_size() {
        let buf = DmaBuffer::with_default_size().unwrap();
        assert_eq!(buf.len(), stream::DMA_BUFFER_SIZE);
    }

    #[test]
    fn test_zero_length_rejected() {
        assert!(matches!(
            DmaBuffer::new(0),
            Err(XdmaError::DmaAllocation(_))
        ));
    }

    #[cfg(feature = "sim")]
    #[test]
    fn test_transfer_through_device() {
        let sim = crate::sim::SimulatedXdma::new();
        let mut out = DmaBuffer::new(64).unwrap();
        out[..4].copy_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
        out.write_to(&sim, 4, stream::AXI_BASE).unwrap();

        let mut back = DmaBuffer::new(8).unwrap();
        back.read_from(&sim, stream::AXI_BASE).unwrap();
        assert_eq!(&back[..], &[0xDE, 0xAD, 0xBE, 0xEF, 0, 0, 0, 0]);
    }

    #[cfg(feature = "sim")]
    #[test]
    fn test_write_longer_than_buffer_is_short() {
        let sim = crate::sim::SimulatedXdma::new();
        let mut out = DmaBuffer::new(64).unwrap();
        out.fill(0x5A);

        let err = out.write_to(&sim, 4096, stream::AXI_BASE).unwrap_err();
        assert!(matches!(
            err,
            XdmaError::BulkTransfer {
                direction: TransferDirection::HostToCard,
                length: 4096,
                cause: TransferFailure::Short(64),
                ..
            }
        ));

        // nothing reached the card
        let mut back = [0u8; 64];
        sim.read_block(&mut back, stream::AXI_BASE).unwrap();
        assert!(back.iter().all(|&b| b == 0));
    }
}
