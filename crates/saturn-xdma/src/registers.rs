//! Register definitions for the Saturn FPGA AXI-Lite space
//!
//! All registers are 32 bits wide and word aligned. The addresses below are
//! offsets into the `/dev/xdma0_user` window. Boards with a different
//! address decode can override them through [`RegisterMap`].

use serde::{Deserialize, Serialize};

use crate::types::StreamChannel;

/// Firmware identification register
pub mod version {
    /// Software ID and version register
    pub const SW_VERSION: u32 = 0xC000;

    /// Bit position of the 16 bit version field
    pub const VERSION_SHIFT: u32 = 4;
    pub const VERSION_MASK: u32 = 0xFFFF;

    /// Bit position of the 5 bit software (board) ID field
    pub const ID_SHIFT: u32 = 20;
    pub const ID_MASK: u32 = 0x1F;

    /// Bit position of the 7 bit major version field
    pub const MAJOR_SHIFT: u32 = 25;
    pub const MAJOR_MASK: u32 = 0x7F;
}

/// FIFO monitor IP core
///
/// One status register per channel at `BASE + 4 * channel`, and one
/// configuration register per channel at `CONFIG_OFFSET` above that.
pub mod fifo_monitor {
    /// Base of the status registers
    pub const BASE: u32 = 0x9000;
    /// Distance from a status register to its configuration register
    pub const CONFIG_OFFSET: u32 = 0x10;

    // Status bits (cleared by reading the register)
    pub const STATUS_OVERFLOW: u32 = 1 << 31;
    pub const STATUS_OVER_THRESHOLD: u32 = 1 << 30;
    pub const STATUS_UNDERFLOW: u32 = 1 << 29;
    pub const STATUS_OCCUPANCY_MASK: u32 = 0xFFFF;

    // Config bits
    pub const CONFIG_IRQ_ENABLE: u32 = 1 << 31;
}

/// Shared FIFO reset register
///
/// A rising edge on a channel's bit resets that channel's FIFO.
pub mod fifo_reset {
    pub const ADDRESS: u32 = 0xA028;

    pub const BIT_MIC_CODEC: u32 = 0;
    pub const BIT_SPK_CODEC: u32 = 1;
    pub const BIT_TX_DUC: u32 = 2;
    pub const BIT_RX_DDC: u32 = 3;
}

/// AXI stream reader/writer window used for bulk sample transfers
pub mod stream {
    /// Address of the StreamRead/StreamWriter IP
    pub const AXI_BASE: u32 = 0x10000;
    /// Size of a DMA transfer buffer in bytes
    pub const DMA_BUFFER_SIZE: usize = 32768;
}

/// Register addresses used by the core, overridable per board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterMap {
    /// Software ID and version register
    pub sw_version: u32,
    /// FIFO monitor status register base
    pub fifo_monitor_base: u32,
    /// Offset from a status register to the matching config register
    pub fifo_config_offset: u32,
    /// Shared FIFO reset register
    pub fifo_reset: u32,
    /// Reset bit for the RX DDC FIFO
    pub reset_bit_rx_ddc: u32,
    /// Reset bit for the TX DUC FIFO
    pub reset_bit_tx_duc: u32,
    /// Reset bit for the microphone codec FIFO
    pub reset_bit_mic_codec: u32,
    /// Reset bit for the speaker codec FIFO
    pub reset_bit_spk_codec: u32,
    /// AXI offset of the stream reader/writer IP
    pub stream_axi_base: u32,
}

impl Default for RegisterMap {
    fn default() -> Self {
        Self {
            sw_version: version::SW_VERSION,
            fifo_monitor_base: fifo_monitor::BASE,
            fifo_config_offset: fifo_monitor::CONFIG_OFFSET,
            fifo_reset: fifo_reset::ADDRESS,
            reset_bit_rx_ddc: fifo_reset::BIT_RX_DDC,
            reset_bit_tx_duc: fifo_reset::BIT_TX_DUC,
            reset_bit_mic_codec: fifo_reset::BIT_MIC_CODEC,
            reset_bit_spk_codec: fifo_reset::BIT_SPK_CODEC,
            stream_axi_base: stream::AXI_BASE,
        }
    }
}

impl RegisterMap {
    /// Status register of a channel's FIFO monitor
    pub fn fifo_status(&self, channel: StreamChannel) -> u32 {
        self.fifo_monitor_base + 4 * channel.index() as u32
    }

    /// Configuration register of a channel's FIFO monitor
    pub fn fifo_config(&self, channel: StreamChannel) -> u32 {
        self.fifo_status(channel) + self.fifo_config_offset
    }

    /// Bit position of a channel in the shared reset register
    pub fn reset_bit(&self, channel: StreamChannel) -> u32 {
        match channel {
            StreamChannel::RxDdc => self.reset_bit_rx_ddc,
            StreamChannel::TxDuc => self.reset_bit_tx_duc,
            StreamChannel::MicCodec => self.reset_bit_mic_codec,
            StreamChannel::SpkCodec => self.reset_bit_spk_codec,
        }
    }

    /// Mask of a channel in the shared reset register
    pub fn reset_mask(&self, channel: StreamChannel) -> u32 {
        1 << self.reset_bit(channel)
    }
}
