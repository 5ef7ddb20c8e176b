//! `saturn-probe`: diagnostics for the Saturn XDMA front end.
//!
//! ```text
//! USAGE:
//!   saturn-probe version               Firmware identity and supported range
//!   saturn-probe status                Read (and clear) all FIFO monitors
//!   saturn-probe configure             Program the FIFO monitor depths
//!   saturn-probe reset <channel>       Reset one stream FIFO (rx, tx, mic, spk)
//!   saturn-probe decode <header>       Decode a DDC frame header offline
//!   saturn-probe dump                  Hex dump a bulk read from the AXI window
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use saturn_xdma::logging::init_logging;
use saturn_xdma::{
    decode_frame_header, DmaBuffer, FirmwareInfo, RegisterAccess, SaturnConfig, Session,
    SimulatedXdma, StreamChannel, XdmaTransport,
};

#[derive(Parser)]
#[command(name = "saturn-probe", about = "Saturn XDMA diagnostics", version)]
struct Cli {
    /// Configuration file (default: search SATURN_CONFIG, ./saturn.yaml, ...)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Use the simulated device instead of the XDMA nodes
    #[arg(long, global = true)]
    simulate: bool,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Show the firmware identity and the supported firmware range.
    Version,
    /// Read every FIFO monitor. Clears the overflow and underflow flags.
    Status,
    /// Program every FIFO monitor with its depth.
    Configure {
        /// Enable the overflow interrupt.
        #[arg(long)]
        interrupt: bool,
    },
    /// Reset one stream FIFO.
    Reset {
        /// Channel: rx, tx, mic or spk.
        channel: StreamChannel,
    },
    /// Decode a DDC frame header (hex with 0x prefix, or decimal).
    Decode {
        #[arg(value_parser = parse_word)]
        header: u32,
    },
    /// Read a block from the AXI window and hex dump it.
    Dump {
        /// AXI byte offset (default: the stream window base).
        #[arg(long, value_parser = parse_word)]
        offset: Option<u32>,
        /// Number of bytes.
        #[arg(long, default_value_t = 256)]
        length: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => SaturnConfig::load_from(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SaturnConfig::load().context("loading configuration")?,
    };
    init_logging(&config.logging);

    match cli.command {
        Cmd::Version => cmd_version(&config, cli.simulate)?,
        Cmd::Status => cmd_status(&config, cli.simulate)?,
        Cmd::Configure { interrupt } => cmd_configure(&config, cli.simulate, interrupt)?,
        Cmd::Reset { channel } => cmd_reset(&config, cli.simulate, channel)?,
        Cmd::Decode { header } => cmd_decode(header),
        Cmd::Dump { offset, length } => {
            let offset = offset.unwrap_or(config.registers.stream_axi_base);
            cmd_dump(&config, cli.simulate, offset, length)?
        }
    }

    Ok(())
}

fn parse_word(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(&hex.replace('_', ""), 16),
        None => s.replace('_', "").parse(),
    };
    parsed.map_err(|e| format!("'{}' is not a 32 bit value: {}", s, e))
}

fn open_device(config: &SaturnConfig, simulate: bool) -> Result<Arc<dyn RegisterAccess>> {
    if simulate {
        return Ok(Arc::new(SimulatedXdma::with_register_map(config.registers)));
    }

    let transport = XdmaTransport::open(&config.device).with_context(|| {
        format!(
            "opening {} (use --simulate to run without a board)",
            config.device.user_device.display()
        )
    })?;
    Ok(Arc::new(transport))
}

fn start(config: &SaturnConfig, simulate: bool) -> Result<Session<dyn RegisterAccess>> {
    let device = open_device(config, simulate)?;
    Ok(Session::start(device, config)?)
}

fn cmd_version(config: &SaturnConfig, simulate: bool) -> Result<()> {
    println!("Supported firmware : {}", config.firmware);

    if !simulate && !XdmaTransport::is_platform_available() {
        println!("Device             : not present");
        return Ok(());
    }

    let device = open_device(config, simulate)?;
    let info = FirmwareInfo::read(&*device, &config.registers);
    let verdict = if config.firmware.supports(&info) {
        "supported"
    } else {
        "UNSUPPORTED"
    };

    println!("Software ID        : {}", info.software_id);
    println!("Firmware version   : {}", info.version);
    println!("Major version      : {}", info.major);
    println!("Status             : {}", verdict);
    Ok(())
}

fn cmd_status(config: &SaturnConfig, simulate: bool) -> Result<()> {
    let session = start(config, simulate)?;
    let monitor = session.monitor();

    println!("Firmware {}", session.firmware());
    println!(
        "{:<4} {:>6} {:>9} {:>9}  flags",
        "fifo", "depth", "occupied", "available"
    );

    for channel in StreamChannel::ALL {
        let status = monitor.read_channel_status(channel);
        let mut flags = Vec::new();
        if status.overflowed {
            flags.push("overflow");
        }
        if status.over_threshold {
            flags.push("threshold");
        }
        if status.underflowed {
            flags.push("underflow");
        }

        println!(
            "{:<4} {:>6} {:>9} {:>9}  {}",
            channel,
            monitor.depths().depth(channel),
            status.occupied,
            status.available,
            flags.join(",")
        );
    }
    Ok(())
}

fn cmd_configure(config: &SaturnConfig, simulate: bool, interrupt: bool) -> Result<()> {
    let session = start(config, simulate)?;
    session.monitor().configure_all(interrupt);

    for channel in StreamChannel::ALL {
        println!(
            "{:<4} depth {:>6}  interrupt {}",
            channel,
            session.monitor().depths().depth(channel),
            if interrupt { "on" } else { "off" }
        );
    }
    Ok(())
}

fn cmd_reset(config: &SaturnConfig, simulate: bool, channel: StreamChannel) -> Result<()> {
    let session = start(config, simulate)?;
    session.monitor().reset_channel_fifo(channel);
    println!("{} FIFO reset", channel);
    Ok(())
}

fn cmd_decode(header: u32) {
    let counts = decode_frame_header(header);

    println!("Header 0x{:08x}", header);
    for (ddc, count) in counts.counts().iter().enumerate() {
        println!("  DDC{:<2} {:>3}", ddc, count);
    }
    println!("Total  {:>3} samples", counts.total());
}

fn cmd_dump(config: &SaturnConfig, simulate: bool, offset: u32, length: usize) -> Result<()> {
    let device = open_device(config, simulate)?;
    let mut buffer = DmaBuffer::new(length)?;
    buffer.read_from(&*device, offset)?;

    for (row, chunk) in buffer.chunks(16).enumerate() {
        let hex: Vec<String> = chunk.iter().map(|b| format!("{:02x}", b)).collect();
        println!("{:08x}  {}", offset as usize + row * 16, hex.join(" "));
    }
    Ok(())
}
