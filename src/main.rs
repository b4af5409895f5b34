use std::{io, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use qamtx::{
    channel::{CaptureChannel, StreamingChannel, BUFFER_SYMBOLS},
    console::Console,
    radio::{RadioConfig, RadioSession},
    source::SourceStream,
    sym::ModulationScheme,
    tx::CancelToken,
};

#[derive(Parser)]
#[clap(author, version, about = "QPSK / 16QAM file transmitter")]
struct Args {
    /// Logging verbosity (-v info, -vv debug, -vvv trace)
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    /// SoapySDR device arguments
    #[clap(default_value = "driver=plutosdr,uri=ip:192.168.2.8")]
    soapy_device: String,
    /// Center frequency in Hz
    #[clap(short, long, default_value_t = 915_000_000.0)]
    freq: f64,
    /// RF bandwidth in Hz
    #[clap(short, long, default_value_t = 20_000_000.0)]
    bandwidth: f64,
    /// Sample rate in Hz
    #[clap(short, long, default_value_t = 20_000_000.0)]
    sample_rate: f64,
    /// RF output port
    #[clap(short, long, default_value = "A")]
    port: String,
    /// Symbols per transmit buffer
    #[clap(long, default_value_t = BUFFER_SYMBOLS)]
    buffer_symbols: usize,
    /// Write CS16 samples to this file instead of opening a device
    #[clap(long)]
    capture: Option<PathBuf>,
    #[clap(subcommand)]
    cmd: Option<Cmd>,
}

#[derive(clap::Subcommand)]
enum Cmd {
    /// Print how the bits of an example byte map onto symbols
    Example {
        #[clap(short, long, value_enum, default_value_t = Scheme::Qpsk)]
        scheme: Scheme,
    },
    /// Cycle through every constellation point until Ctrl+C
    Test {
        #[clap(short, long, value_enum, default_value_t = Scheme::Qpsk)]
        scheme: Scheme,
    },
    /// Transmit a file
    Send {
        path: PathBuf,
        #[clap(short, long, value_enum, default_value_t = Scheme::Qpsk)]
        scheme: Scheme,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum Scheme {
    Qpsk,
    Qam16,
}

impl From<Scheme> for ModulationScheme {
    fn from(value: Scheme) -> Self {
        match value {
            Scheme::Qpsk => ModulationScheme::Qpsk,
            Scheme::Qam16 => ModulationScheme::SixteenQam,
        }
    }
}

impl Args {
    fn radio_config(&self) -> RadioConfig {
        RadioConfig {
            device: self.soapy_device.clone(),
            center_frequency_hz: self.freq,
            bandwidth_hz: self.bandwidth,
            sample_rate_hz: self.sample_rate,
            port: self.port.clone(),
            buffer_symbols: self.buffer_symbols,
        }
    }
}

fn operate<C: StreamingChannel>(
    channel: &mut C,
    cmd: Option<Cmd>,
    cancel: CancelToken,
) -> Result<()> {
    let stdin = io::stdin();
    let mut console = Console::new(stdin.lock(), io::stdout(), cancel);

    match cmd {
        None => console.run(channel)?,
        Some(Cmd::Example { scheme }) => console.example(scheme.into())?,
        Some(Cmd::Test { scheme }) => console.test(channel, scheme.into())?,
        Some(Cmd::Send { path, scheme }) => {
            let source = SourceStream::open(&path)
                .with_context(|| format!("Could not open {}", path.display()))?;
            console.send(channel, scheme.into(), source)?;
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    let cancel = CancelToken::new();
    let c = cancel.clone();
    ctrlc::set_handler(move || {
        warn!("interrupt received, stopping after the current buffer");
        c.cancel();
    })
    .context("Failed to set Ctrl+C handler")?;

    let config = args.radio_config();

    println!("\n-----------------------------------------------");
    println!("Transmitter settings:");
    println!("- center frequency = {} Hz", config.center_frequency_hz);
    println!("- bandwidth = {} Hz", config.bandwidth_hz);
    println!("- sample rate = {} Hz", config.sample_rate_hz);
    println!("- buffer = {} symbols", config.buffer_symbols);

    match args.capture {
        Some(ref path) => {
            let mut channel = CaptureChannel::create(path, config.buffer_symbols)
                .context("Could not create capture file")?;
            println!("- output = {}", path.display());
            println!("-----------------------------------------------");

            operate(&mut channel, args.cmd, cancel)?;
        }
        None => {
            let mut session = RadioSession::open(&config).context("Could not set up SDR device")?;
            println!("- device = {}", session.describe());
            println!("-----------------------------------------------");

            operate(&mut session, args.cmd, cancel)?;
        }
    }

    info!("shutting down");
    println!("\nShutting down transmitter");

    Ok(())
}
