//! FIFO monitor IP core driver

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use super::FifoDepths;
use crate::registers::{fifo_monitor, RegisterMap};
use crate::traits::RegisterAccess;
use crate::types::StreamChannel;

/// One reading of a channel's FIFO monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FifoStatus {
    /// Occupied locations, for read and write channels alike
    pub occupied: u32,
    /// Locations available to the host: occupied for read channels,
    /// free space for write channels
    pub available: u32,
    /// An overflow happened since the last read
    pub overflowed: bool,
    /// The occupancy threshold was exceeded since the last read
    pub over_threshold: bool,
    /// An underflow happened since the last read
    pub underflowed: bool,
}

impl FifoStatus {
    /// Decode a raw status register value
    pub fn decode(raw: u32, channel: StreamChannel, depth: u32) -> Self {
        let occupied = raw & fifo_monitor::STATUS_OCCUPANCY_MASK;
        let available = if channel.is_write() {
            depth.saturating_sub(occupied)
        } else {
            occupied
        };

        Self {
            occupied,
            available,
            overflowed: raw & fifo_monitor::STATUS_OVERFLOW != 0,
            over_threshold: raw & fifo_monitor::STATUS_OVER_THRESHOLD != 0,
            underflowed: raw & fifo_monitor::STATUS_UNDERFLOW != 0,
        }
    }

    /// Check if any error flag is set
    pub fn has_error(&self) -> bool {
        self.overflowed || self.over_threshold || self.underflowed
    }
}

/// Driver for the FIFO monitor and the shared FIFO reset register
///
/// The depth table is fixed when the monitor is built, so status reads and
/// channel configuration take no lock. Only the read-modify-write of the
/// shared reset register is serialised.
pub struct FifoMonitor<T: RegisterAccess + ?Sized> {
    device: Arc<T>,
    map: RegisterMap,
    depths: FifoDepths,
    reset_lock: Mutex<()>,
}

impl<T: RegisterAccess + ?Sized> FifoMonitor<T> {
    /// Create a monitor, resolving the depth table from the firmware version
    pub fn new(device: Arc<T>, map: RegisterMap) -> Self {
        let depths = FifoDepths::initialize(&*device, &map);
        Self::with_depths(device, map, depths)
    }

    /// Create a monitor with a known depth table
    pub fn with_depths(device: Arc<T>, map: RegisterMap, depths: FifoDepths) -> Self {
        Self {
            device,
            map,
            depths,
            reset_lock: Mutex::new(()),
        }
    }

    /// Depth table in use
    pub fn depths(&self) -> &FifoDepths {
        &self.depths
    }

    /// Register layout in use
    pub fn register_map(&self) -> &RegisterMap {
        &self.map
    }

    /// Program a channel's monitor with its FIFO depth
    pub fn configure_channel(&self, channel: StreamChannel, enable_interrupt: bool) {
        let mut value = self.depths.depth(channel);
        if enable_interrupt {
            value |= fifo_monitor::CONFIG_IRQ_ENABLE;
        }

        tracing::debug!("configure FIFO monitor {}: 0x{:08x}", channel, value);
        self.device.write_register(self.map.fifo_config(channel), value);
    }

    /// Read a channel's FIFO status
    ///
    /// The hardware clears the overflow, threshold and underflow flags on
    /// every read, so each call consumes them.
    #[must_use = "reading the status clears the hardware error flags"]
    pub fn read_channel_status(&self, channel: StreamChannel) -> FifoStatus {
        let raw = self.device.read_register(self.map.fifo_status(channel));
        let status = FifoStatus::decode(raw, channel, self.depths.depth(channel));

        if status.overflowed {
            tracing::trace!("{} FIFO overflow, {} occupied", channel, status.occupied);
        }
        if status.underflowed {
            tracing::trace!("{} FIFO underflow", channel);
        }

        status
    }

    /// Pulse a channel's bit in the shared FIFO reset register
    ///
    /// Writes the register twice, first with the bit low then high. Other
    /// bits keep the value read at the start.
    pub fn reset_channel_fifo(&self, channel: StreamChannel) {
        let mask = self.map.reset_mask(channel);

        // guards no data, so a poisoned lock is still usable
        let _guard = self
            .reset_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let current = self.device.read_register(self.map.fifo_reset);
        let cleared = current & !mask;
        self.device.write_register(self.map.fifo_reset, cleared);
        self.device.write_register(self.map.fifo_reset, cleared | mask);

        tracing::debug!("reset {} FIFO", channel);
    }

    /// Configure every channel's monitor
    pub fn configure_all(&self, enable_interrupt: bool) {
        for channel in StreamChannel::ALL {
            self.configure_channel(channel, enable_interrupt);
        }
    }

    /// Reset every channel's FIFO
    pub fn reset_all(&self) {
        for channel in StreamChannel::ALL {
            self.reset_channel_fifo(channel);
        }
    }
}
