use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use dvbridge::audio::{DuplexSession, list_devices};
use dvbridge::bridge::{ChannelLayout, FrameProcessor, LinkState, SampleRateBridge};
use dvbridge::config::BridgeConfig;
use dvbridge::control::{self, Response};
use dvbridge::modem::LoopbackModem;
use dvbridge::signal_processing::Window;

/// Bridge a sound device to a digital-voice modem, with live mode switching
/// over a line protocol on stdin.
#[derive(Parser, Debug)]
#[command(name = "dvbridge", version)]
struct Cli {
    /// List audio devices and exit
    #[arg(short, long)]
    list_devices: bool,

    /// Device index as printed by --list-devices (default device if omitted)
    #[arg(short, long)]
    device: Option<usize>,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Device sample rate in Hz
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Frames per audio callback
    #[arg(long)]
    buffer_size: Option<usize>,

    /// FIR filter length (bumped to odd)
    #[arg(long)]
    taps: Option<usize>,

    /// Filter cutoff in Hz
    #[arg(long)]
    cutoff: Option<f64>,

    /// Filter design window
    #[arg(long, value_enum)]
    window: Option<Window>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    if cli.list_devices {
        list_devices()?;
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => BridgeConfig::from_toml_file(path)?,
        None => BridgeConfig::default(),
    };
    if cli.device.is_some() {
        config.audio.device = cli.device;
    }
    if let Some(rate) = cli.sample_rate {
        config.audio.sample_rate = rate;
    }
    if let Some(size) = cli.buffer_size {
        config.audio.buffer_size = size;
    }
    if let Some(taps) = cli.taps {
        config.filter.taps = taps;
    }
    if let Some(cutoff) = cli.cutoff {
        config.filter.cutoff_hz = cutoff;
    }
    if let Some(window) = cli.window {
        config.filter.window = window;
    }

    println!("=== dvbridge ===");
    println!("Device rate:  {} Hz", config.audio.sample_rate);
    println!("Modem rate:   {} Hz", config.modem.sample_rate);
    println!("Rate ratio:   {}:1", config.decimation_ratio()?);
    println!(
        "Filter:       {} taps @ {} Hz ({})",
        config.filter.taps, config.filter.cutoff_hz, config.filter.window
    );
    println!();

    let link = Arc::new(LinkState::new(&config.squelch));
    let engine = Box::new(LoopbackModem::new(link.clone(), config.modem.speech_block));
    let bridge = SampleRateBridge::new(engine, link.clone(), &config)?;
    let layout = ChannelLayout {
        input_channels: config.audio.input_channels as usize,
        output_channels: config.audio.output_channels as usize,
        input_channel: config.audio.input_channel,
    };
    let processor = FrameProcessor::new(bridge, link.clone(), layout);

    log::info!("Starting duplex session");
    let session = DuplexSession::new(&config.audio, processor)?;

    run_command_loop(&link);

    session.stop();
    Ok(())
}

/// Blocking read-eval-respond loop on stdin; returns on QUIT or EOF.
fn run_command_loop(link: &LinkState) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(_) => break,
        };

        match control::handle_line(&line, link) {
            Response::Line(reply) => println!("{}", reply),
            Response::Err => println!("ERR"),
            Response::Quit => break,
        }
    }
}
