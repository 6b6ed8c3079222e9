//! DBC Decoder CLI Application
//!
//! Command-line front end for the dbc-decoder library:
//! - Loads one or more DBC files and lists their message definitions
//! - Decodes frames given inline or read from candump-style files
//! - Prints the results as text or JSON

use anyhow::{Context, Result};
use clap::Parser;
use dbc_decoder::{BitNumbering, CanFrame, Decoder, SignHandling};
use rayon::prelude::*;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

mod config;
mod report;

use config::{AppConfig, OutputFormat};
use report::FrameReport;

/// DBC Decoder - Decode CAN frames with DBC signal definitions
#[derive(Parser, Debug)]
#[command(name = "dbc-cli")]
#[command(about = "Decode CAN frames with DBC signal definitions", long_about = None)]
#[command(version)]
struct Args {
    /// Path to DBC file(s) (can be repeated)
    #[arg(long, value_name = "FILE")]
    dbc: Vec<PathBuf>,

    /// Frame to decode in ID#DATA notation, hex (can be repeated)
    #[arg(short, long, value_name = "FRAME")]
    frame: Vec<String>,

    /// File with one frame per line (candump log or ID#DATA)
    #[arg(long, value_name = "FILE")]
    frames: Vec<PathBuf>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,

    /// Sign-extend signed signals
    #[arg(long)]
    signed: bool,

    /// Use Motorola bit numbering for big-endian signals
    #[arg(long)]
    motorola: bool,

    /// Allow messages with repeated IDs or names
    #[arg(long)]
    allow_duplicates: bool,

    /// Skip the message definition listing
    #[arg(long)]
    no_listing: bool,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    /// Command-line flags extend the file configuration
    fn merge_into(&self, config: &mut AppConfig) {
        config.input.dbc_files.extend(self.dbc.iter().cloned());
        config.input.frames.extend(self.frame.iter().cloned());
        config.input.frame_files.extend(self.frames.iter().cloned());

        if self.json {
            config.output.format = OutputFormat::Json;
        }
        if self.no_listing {
            config.output.list_messages = false;
        }
        if self.signed {
            config.decoding.sign_handling = SignHandling::TwosComplement;
        }
        if self.motorola {
            config.decoding.bit_numbering = BitNumbering::Declared;
        }
        if self.allow_duplicates {
            config.decoding.reject_duplicates = false;
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    log::info!("DBC Decoder CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using decoder library v{}", dbc_decoder::VERSION);

    let mut config = match &args.config {
        Some(config_path) => {
            log::info!("Loading configuration from: {:?}", config_path);
            config::load_config(config_path)?
        }
        None => AppConfig::default(),
    };
    args.merge_into(&mut config);

    if config.input.dbc_files.is_empty() {
        println!("DBC Decoder - No DBC file specified");
        println!("\nQuick Start:");
        println!("  dbc-cli --dbc signals.dbc");
        println!("  dbc-cli --dbc signals.dbc --frame 064#88130000");
        println!("  dbc-cli --dbc signals.dbc --frames candump.log --json");
        println!("\nUse --help for more options");
        return Ok(());
    }

    run(&config)
}

fn run(config: &AppConfig) -> Result<()> {
    let mut decoder = Decoder::with_config(config.decoding.clone());

    for dbc_path in &config.input.dbc_files {
        decoder
            .add_dbc(dbc_path)
            .with_context(|| format!("Failed to load DBC file: {:?}", dbc_path))?;
    }

    let stats = decoder.database_stats();
    log::info!(
        "Signal database: {} messages, {} signals",
        stats.num_messages,
        stats.num_signals
    );

    let frames = collect_frames(config)?;

    // Definitions are immutable from here on, so frames decode independently
    let reports: Vec<FrameReport> = frames
        .par_iter()
        .map(|frame| FrameReport {
            frame: *frame,
            decoded: decoder.decode_frame(frame),
        })
        .collect();

    let unknown = reports.iter().filter(|r| r.decoded.is_none()).count();
    if unknown > 0 {
        log::warn!("{} of {} frames have no matching message", unknown, reports.len());
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let messages = decoder.database().messages();

    match config.output.format {
        OutputFormat::Txt => {
            if config.output.list_messages {
                report::write_listing(&mut out, messages)?;
            }
            report::write_frames_txt(&mut out, &reports)?;
        }
        OutputFormat::Json => {
            let listed: &[_] = if config.output.list_messages { messages } else { &[] };
            report::write_json(&mut out, listed, &reports)?;
        }
    }

    out.flush()?;
    Ok(())
}

fn collect_frames(config: &AppConfig) -> Result<Vec<CanFrame>> {
    let mut frames = Vec::new();

    for text in &config.input.frames {
        let frame = text
            .parse::<CanFrame>()
            .with_context(|| format!("Invalid frame argument: {}", text))?;
        frames.push(frame);
    }

    for path in &config.input.frame_files {
        frames.extend(read_frame_file(path)?);
    }

    Ok(frames)
}

/// Read frames from a file, one per line
///
/// Accepts both bare `ID#DATA` lines and candump log lines
/// (`(1436509052.249713) can0 064#8813`); blank lines are skipped.
fn read_frame_file(path: &Path) -> Result<Vec<CanFrame>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open frame file: {:?}", path))?;

    let mut frames = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read frame file: {:?}", path))?;
        let Some(token) = line.split_whitespace().last() else {
            continue;
        };
        let frame = token
            .parse::<CanFrame>()
            .with_context(|| format!("{:?}:{}: invalid frame", path, idx + 1))?;
        frames.push(frame);
    }

    log::debug!("Read {} frames from {:?}", frames.len(), path);
    Ok(frames)
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
