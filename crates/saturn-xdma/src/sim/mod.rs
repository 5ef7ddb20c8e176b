//! Simulated XDMA backend for development and testing
//!
//! This module provides a software model of the FPGA register space and AXI
//! stream window, allowing the FIFO monitor and streaming code to run without
//! a Saturn board.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{TransferDirection, TransferFailure, XdmaError, XdmaResult};
use crate::registers::{fifo_monitor, RegisterMap};
use crate::traits::RegisterAccess;
use crate::types::StreamChannel;

/// Default size of the simulated AXI window (covers the stream IP at 0x10000)
const AXI_WINDOW_SIZE: usize = 1 << 20;

/// Simulated XDMA device
///
/// Models the parts of the hardware the core depends on:
/// - a sparse register file, unwritten registers read as 0
/// - FIFO monitor status registers whose flag bits clear when read
/// - an AXI memory window for block transfers
/// - a log of every register write, in order, for sequence checks
pub struct SimulatedXdma {
    /// Register layout, used to find the clear-on-read status registers
    map: RegisterMap,

    /// Simulated register file
    registers: Mutex<HashMap<u32, u32>>,

    /// Every register write as (address, value)
    writes: Mutex<Vec<(u32, u32)>>,

    /// Simulated AXI window
    axi: Mutex<Vec<u8>>,

    open: AtomicBool,
}

impl SimulatedXdma {
    /// Create a simulated device with the default register map
    pub fn new() -> Self {
        Self::with_register_map(RegisterMap::default())
    }

    /// Create a simulated device with a custom register map
    pub fn with_register_map(map: RegisterMap) -> Self {
        Self {
            map,
            registers: Mutex::new(HashMap::new()),
            writes: Mutex::new(Vec::new()),
            axi: Mutex::new(vec![0; AXI_WINDOW_SIZE]),
            open: AtomicBool::new(true),
        }
    }

    /// Create a simulated device reporting the given firmware version word
    pub fn with_firmware(version_word: u32) -> Self {
        let sim = Self::new();
        sim.set_register(sim.map.sw_version, version_word);
        sim
    }

    /// Set a register as the hardware would, without logging a write
    pub fn set_register(&self, address: u32, value: u32) {
        lock(&self.registers).insert(address, value);
    }

    /// Load a raw value into a channel's FIFO status register
    pub fn set_fifo_status(&self, channel: StreamChannel, raw: u32) {
        self.set_register(self.map.fifo_status(channel), raw);
    }

    /// Current register content, without the clear-on-read side effect
    pub fn peek(&self, address: u32) -> u32 {
        lock(&self.registers).get(&address).copied().unwrap_or(0)
    }

    /// Values written to `address`, oldest first
    pub fn writes_to(&self, address: u32) -> Vec<u32> {
        lock(&self.writes)
            .iter()
            .filter(|(a, _)| *a == address)
            .map(|(_, v)| *v)
            .collect()
    }

    /// Simulate the device handle being released
    pub fn close(&self) {
        self.open.store(false, Ordering::Release);
    }

    fn is_status_register(&self, address: u32) -> bool {
        StreamChannel::ALL
            .iter()
            .any(|&ch| self.map.fifo_status(ch) == address)
    }

    fn window_range(
        &self,
        direction: TransferDirection,
        length: usize,
        offset: u32,
    ) -> XdmaResult<std::ops::Range<usize>> {
        if !self.is_open() {
            return Err(XdmaError::NotOpen);
        }

        let start = offset as usize;
        let end = start.saturating_add(length).min(AXI_WINDOW_SIZE);
        if start > end || end - start < length {
            return Err(XdmaError::BulkTransfer {
                direction,
                length,
                offset,
                cause: TransferFailure::Short(end.saturating_sub(start)),
            });
        }
        Ok(start..end)
    }
}

impl Default for SimulatedXdma {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterAccess for SimulatedXdma {
    fn read_register(&self, address: u32) -> u32 {
        if !self.is_open() {
            return 0;
        }

        let mut registers = lock(&self.registers);
        let value = registers.get(&address).copied().unwrap_or(0);

        if self.is_status_register(address) {
            let flags = fifo_monitor::STATUS_OVERFLOW
                | fifo_monitor::STATUS_OVER_THRESHOLD
                | fifo_monitor::STATUS_UNDERFLOW;
            registers.insert(address, value & !flags);
        }

        value
    }

    fn write_register(&self, address: u32, value: u32) {
        if !self.is_open() {
            return;
        }

        // Log under the register lock so the write order matches the register state
        let mut registers = lock(&self.registers);
        registers.insert(address, value);
        lock(&self.writes).push((address, value));
    }

    fn write_block(&self, data: &[u8], axi_offset: u32) -> XdmaResult<()> {
        let range = self.window_range(TransferDirection::HostToCard, data.len(), axi_offset)?;
        lock(&self.axi)[range].copy_from_slice(data);
        Ok(())
    }

    fn read_block(&self, buffer: &mut [u8], axi_offset: u32) -> XdmaResult<()> {
        let range = self.window_range(TransferDirection::CardToHost, buffer.len(), axi_offset)?;
        buffer.copy_from_slice(&lock(&self.axi)[range]);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_operations() {
        let sim = SimulatedXdma::new();

        sim.write_register(0x1000, 0xDEADBEEF);
        assert_eq!(sim.read_register(0x1000), 0xDEADBEEF);

        // Unwritten register should be 0
        assert_eq!(sim.read_register(0x2000), 0);
        assert_eq!(sim.writes_to(0x1000), vec![0xDEADBEEF]);
    }

    #[test]
    fn test_status_flags_clear_on_read() {
        let sim = SimulatedXdma::new();
        sim.set_fifo_status(StreamChannel::RxDdc, 0xE000_0064);

        let status = RegisterMap::default().fifo_status(StreamChannel::RxDdc);
        assert_eq!(sim.read_register(status), 0xE000_0064);
        assert_eq!(sim.read_register(status), 0x0000_0064);
    }

    #[test]
    fn test_block_window() {
        let sim = SimulatedXdma::new();
        sim.write_block(&[1, 2, 3, 4], 0x10000).unwrap();

        let mut buf = [0u8; 4];
        sim.read_block(&mut buf, 0x10000).unwrap();
        assert_eq!(buf, [1, 2, 3, 4]);

        let mut past_end = [0u8; 8];
        let err = sim
            .read_block(&mut past_end, (AXI_WINDOW_SIZE - 4) as u32)
            .unwrap_err();
        assert!(matches!(
            err,
            XdmaError::BulkTransfer {
                cause: TransferFailure::Short(4),
                ..
            }
        ));
    }

    #[test]
    fn test_closed_device() {
        let sim = SimulatedXdma::with_firmware(0x1234);
        sim.close();

        assert_eq!(sim.read_register(RegisterMap::default().sw_version), 0);
        sim.write_register(0x10, 1);
        assert!(sim.writes_to(0x10).is_empty());
        assert!(matches!(sim.write_block(&[0], 0), Err(XdmaError::NotOpen)));
    }
}
