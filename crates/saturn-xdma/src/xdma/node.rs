//! Positioned I/O on an XDMA character device

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use nix::errno::Errno;
use nix::sys::uio::{pread, pwrite};

use crate::error::{TransferFailure, XdmaError, XdmaResult};

/// An open XDMA device node
///
/// The XDMA driver maps file offsets onto the AXI address space, so a
/// positioned read or write is one bus transaction (register nodes) or one
/// DMA descriptor chain (h2c/c2h nodes). `pread`/`pwrite` do not move a shared
/// file cursor, which makes `&DeviceNode` safe to use from several threads.
#[derive(Debug)]
pub struct DeviceNode {
    /// Path the node was opened from
    pub path: PathBuf,

    file: File,
}

impl DeviceNode {
    /// Open a device node read-write
    pub fn open(path: &Path) -> XdmaResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| {
                if source.kind() == io::ErrorKind::PermissionDenied {
                    tracing::error!(
                        "Cannot open {}. Run as root or add user to the group owning the XDMA nodes.",
                        path.display()
                    );
                } else {
                    tracing::error!("{} not available: {}", path.display(), source);
                }
                XdmaError::DeviceUnavailable {
                    path: path.to_path_buf(),
                    source,
                }
            })?;

        tracing::info!("connected to {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Read a 32-bit register at the given byte address
    pub fn read32(&self, address: u32) -> Result<u32, TransferFailure> {
        let mut word = [0u8; 4];
        self.read_at(&mut word, address)?;
        Ok(u32::from_ne_bytes(word))
    }

    /// Write a 32-bit register at the given byte address
    pub fn write32(&self, address: u32, value: u32) -> Result<(), TransferFailure> {
        self.write_at(&value.to_ne_bytes(), address)
    }

    /// Fill `buffer` starting at `offset`; anything less than a full buffer is an error
    pub fn read_at(&self, buffer: &mut [u8], offset: u32) -> Result<(), TransferFailure> {
        let n = pread(&self.file, buffer, file_offset(offset)?)?;
        if n != buffer.len() {
            return Err(TransferFailure::Short(n));
        }
        Ok(())
    }

    /// Write all of `data` starting at `offset`; anything less is an error
    pub fn write_at(&self, data: &[u8], offset: u32) -> Result<(), TransferFailure> {
        let n = pwrite(&self.file, data, file_offset(offset)?)?;
        if n != data.len() {
            return Err(TransferFailure::Short(n));
        }
        Ok(())
    }
}

/// AXI offset as a file offset; fails where `off_t` is 32 bit and the offset does not fit
fn file_offset(offset: u32) -> Result<libc::off_t, TransferFailure> {
    libc::off_t::try_from(offset).map_err(|_| TransferFailure::Os(Errno::EOVERFLOW))
}
