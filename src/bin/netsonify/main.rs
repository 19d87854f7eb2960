//! netsonify - listen to network traffic
//!
//! Run with: cargo run -- capture.json
//!       or: tshark-to-json | cargo run -- -

mod app;
mod source;
mod ui;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result as EyreResult, WrapErr};
use tracing_subscriber::EnvFilter;

use netsonify::{
    config::SessionConfig,
    engine::Session,
    sequencing::{KeyChoice, PitchClass},
};

#[derive(Debug, Parser)]
#[command(name = "netsonify", version, about = "Turn packet metadata into music and a live host graph")]
struct Args {
    /// JSON array of packets, or `-` for newline-delimited JSON on stdin
    input: String,

    /// Session configuration (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Fix the session key instead of picking one from the pool
    #[arg(short, long)]
    key: Option<PitchClass>,

    /// Seed for a reproducible key choice
    #[arg(long, conflicts_with = "key")]
    seed: Option<u64>,

    /// Seconds between played packets
    #[arg(short, long)]
    interval: Option<f64>,

    /// Keep the UI but do not open an audio device
    #[arg(long)]
    no_audio: bool,

    /// No UI and no audio; log every played packet to stderr
    #[arg(long)]
    headless: bool,

    /// Write logs to this file while the UI owns the terminal
    #[arg(long)]
    log: Option<PathBuf>,
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    let args = Args::parse();
    init_tracing(&args)?;

    let mut config = match &args.config {
        Some(path) => SessionConfig::load(path)
            .wrap_err_with(|| format!("failed to load config {}", path.display()))?,
        None => SessionConfig::default(),
    };
    if let Some(interval) = args.interval {
        config.interval = interval;
    }

    let key = match (args.key, args.seed) {
        (Some(class), _) => KeyChoice::Fixed(class),
        (None, Some(seed)) => KeyChoice::Seeded(seed),
        (None, None) => KeyChoice::Random,
    };
    let session = Session::new(config, key).wrap_err("invalid session configuration")?;
    let packets = source::spawn(&args.input)?;

    if args.headless {
        app::run_headless(session, packets)
    } else {
        app::run(session, packets, !args.no_audio)
    }
}

fn init_tracing(args: &Args) -> EyreResult<()> {
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if args.headless {
        tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .init();
    } else if let Some(path) = &args.log {
        let file = std::fs::File::create(path)
            .wrap_err_with(|| format!("failed to create log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .init();
    }
    // UI without --log: nothing may write to the terminal

    Ok(())
}
