//! DDC frame header decoding
//!
//! Every RX DMA frame starts with a 32 bit header holding a 3 bit rate code
//! per DDC, DDC 0 in the low bits. The code gives the number of samples that
//! DDC contributes to the frame. Code 7 marks an interleaved pair: the next 3
//! bits hold the real code, the pair carries twice that many samples, and
//! the second DDC of the pair carries none of its own.

use serde::{Deserialize, Serialize};

/// Number of DDCs in the Saturn firmware
pub const NUM_DDC: usize = 10;

/// Samples per frame for each rate code; code 7 is the interleave escape
pub const DDC_SAMPLE_COUNTS: [u32; 8] = [0, 1, 2, 4, 8, 16, 32, 0];

const CODE_BITS: u32 = 3;
const CODE_MASK: u32 = 0x7;
const INTERLEAVED: u32 = 7;

/// Per-DDC sample counts decoded from a frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DdcSampleCounts {
    counts: [u32; NUM_DDC],
    total: u32,
}

impl DdcSampleCounts {
    /// Sample count of every DDC
    pub fn counts(&self) -> &[u32; NUM_DDC] {
        &self.counts
    }

    /// Samples in the whole frame
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Sample count of one DDC, `None` if out of range
    pub fn get(&self, ddc: usize) -> Option<u32> {
        self.counts.get(ddc).copied()
    }

    /// DDCs carrying samples, as `(ddc, count)`
    pub fn active(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.counts
            .iter()
            .copied()
            .enumerate()
            .filter(|&(_, count)| count != 0)
    }
}

/// Decode a DDC frame header
pub fn decode_frame_header(header: u32) -> DdcSampleCounts {
    let mut result = DdcSampleCounts::default();
    let mut bits = header;
    let mut ddc = 0;

    while ddc < NUM_DDC {
        let code = bits & CODE_MASK;

        if code == INTERLEAVED {
            bits >>= CODE_BITS;
            let count = 2 * DDC_SAMPLE_COUNTS[(bits & CODE_MASK) as usize];
            result.counts[ddc] = count;
            result.total += count;

            // the partner DDC is already zero; an escape in the last slot has none
            ddc += 2;
        } else {
            let count = DDC_SAMPLE_COUNTS[code as usize];
            result.counts[ddc] = count;
            result.total += count;
            ddc += 1;
        }

        bits >>= CODE_BITS;
    }

    result
}
