//! Core types shared by the transport, FIFO monitor and CLI

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::XdmaError;

/// One of the four DMA streams between the host and the FPGA
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamChannel {
    /// Receiver DDC samples, card to host
    RxDdc,
    /// Transmitter DUC samples, host to card
    TxDuc,
    /// Microphone codec samples, card to host
    MicCodec,
    /// Speaker codec samples, host to card
    SpkCodec,
}

impl StreamChannel {
    /// All channels in register order
    pub const ALL: [StreamChannel; 4] = [
        StreamChannel::RxDdc,
        StreamChannel::TxDuc,
        StreamChannel::MicCodec,
        StreamChannel::SpkCodec,
    ];

    /// Index of the channel in the FIFO monitor register bank
    pub fn index(self) -> usize {
        match self {
            StreamChannel::RxDdc => 0,
            StreamChannel::TxDuc => 1,
            StreamChannel::MicCodec => 2,
            StreamChannel::SpkCodec => 3,
        }
    }

    /// True for the host-to-card FIFOs, whose producers need free space
    pub fn is_write(self) -> bool {
        matches!(self, StreamChannel::TxDuc | StreamChannel::SpkCodec)
    }

    /// Short name used in logs and on the command line
    pub fn name(self) -> &'static str {
        match self {
            StreamChannel::RxDdc => "rx",
            StreamChannel::TxDuc => "tx",
            StreamChannel::MicCodec => "mic",
            StreamChannel::SpkCodec => "spk",
        }
    }
}

impl fmt::Display for StreamChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StreamChannel {
    type Err = XdmaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rx" | "ddc" | "rx_ddc" => Ok(StreamChannel::RxDdc),
            "tx" | "duc" | "tx_duc" => Ok(StreamChannel::TxDuc),
            "mic" | "mic_codec" => Ok(StreamChannel::MicCodec),
            "spk" | "speaker" | "spk_codec" => Ok(StreamChannel::SpkCodec),
            _ => Err(XdmaError::UnknownChannel(s.to_string())),
        }
    }
}

/// 5 bit board identity code from the version register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SoftwareId(pub u8);

impl fmt::Display for SoftwareId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x}", self.0)
    }
}
