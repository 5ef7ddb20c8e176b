//! Stream FIFO depth table and monitor
//!
//! Each sample stream between host and FPGA passes through a FIFO watched by
//! the FIFO monitor IP core:
//!
//! | Channel | Direction | Status reports |
//! |---|---|---|
//! | RX DDC | card to host | occupied locations |
//! | TX DUC | host to card | free locations |
//! | Mic codec | card to host | occupied locations |
//! | Speaker codec | host to card | free locations |

mod depths;
mod monitor;

pub use depths::FifoDepths;
pub use monitor::{FifoMonitor, FifoStatus};
