//! CAN Capture CLI Application
//!
//! Command-line front end for the can-capture-decoder library. It owns the
//! I/O the library leaves out:
//! - Opening the input (dump file, tty device or stdin)
//! - Archiving captured frames as JSON Lines
//! - Replaying archives through the decoder registry
//! - Identifier histograms

use anyhow::{Context, Result};
use can_capture_decoder::{
    ByteSource, CancelToken, CaptureSession, DecoderError, DecoderRegistry, IdHistogram,
    ReaderSource,
};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

mod archive;
mod config;
mod report;

use archive::ArchiveWriter;
use config::AppConfig;
use report::DecodeReport;

/// CAN Capture - Record and decode CAN frames from a serial capture device
#[derive(Parser, Debug)]
#[command(name = "can-capture-cli")]
#[command(about = "Record and decode CAN frames from a serial capture device", long_about = None)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read 11-byte frames from a device or dump file
    Capture {
        /// Device or dump file to read ("-" for stdin)
        #[arg(short, long, value_name = "PATH")]
        input: Option<PathBuf>,

        /// Append captured frames to this JSON Lines archive
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Stop after this many frames
        #[arg(long, value_name = "COUNT")]
        max_frames: Option<usize>,

        /// Stop after this many seconds
        #[arg(long, value_name = "SECS")]
        duration: Option<u64>,

        /// Print decoded records instead of raw frames
        #[arg(long)]
        decode: bool,

        /// Only keep these identifiers (hex with 0x or decimal, repeatable)
        #[arg(long = "id", value_name = "ID")]
        ids: Vec<String>,
    },

    /// Decode a JSON Lines archive and print each record
    Decode {
        /// Archive written by `capture --output`
        #[arg(value_name = "ARCHIVE")]
        archive: PathBuf,

        /// Only print these identifiers (repeatable)
        #[arg(long = "id", value_name = "ID")]
        ids: Vec<String>,
    },

    /// Count frames per identifier in an archive
    Count {
        #[arg(value_name = "ARCHIVE")]
        archive: PathBuf,
    },
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::debug!("CAN Capture CLI v{}", env!("CARGO_PKG_VERSION"));
    log::debug!("Using decoder library v{}", can_capture_decoder::VERSION);

    let app_config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };

    match args.command {
        Command::Capture {
            input,
            output,
            max_frames,
            duration,
            decode,
            ids,
        } => {
            let mut app_config = app_config;
            if input.is_some() {
                app_config.input.path = input;
            }
            if output.is_some() {
                app_config.output.archive = output;
            }
            if max_frames.is_some() {
                app_config.capture.max_frames = max_frames;
            }
            if !ids.is_empty() {
                app_config.capture.id_filter = Some(parse_ids(&ids)?);
            }
            app_config.output.decode |= decode;
            capture_mode(&app_config, duration.map(Duration::from_secs))
        }
        Command::Decode { archive, ids } => decode_mode(&archive, &parse_ids(&ids)?),
        Command::Count { archive } => count_mode(&archive),
    }
}

fn parse_ids(ids: &[String]) -> Result<Vec<u16>> {
    ids.iter().map(|id| config::parse_id(id)).collect()
}

fn open_source(path: &Path) -> Result<Box<dyn ByteSource>> {
    if path == Path::new("-") {
        log::info!("Reading frames from stdin");
        let source = ReaderSource::new(std::io::stdin()).context("Failed to start stdin reader")?;
        return Ok(Box::new(source));
    }
    let file = File::open(path).with_context(|| format!("Failed to open input: {:?}", path))?;
    log::info!("Reading frames from {:?}", path);
    let source = ReaderSource::new(file).context("Failed to start input reader")?;
    Ok(Box::new(source))
}

/// Capture mode - read frames, archive them as they arrive, print a summary
fn capture_mode(config: &AppConfig, duration: Option<Duration>) -> Result<()> {
    let input = config
        .input
        .path
        .as_deref()
        .context("No input given; use --input or [input] path in the config file")?;

    let source = open_source(input)?;
    let token = CancelToken::new();
    let mut session =
        CaptureSession::new(source, config.capture.clone()).with_cancel_token(token.clone());

    if let Some(duration) = duration {
        std::thread::spawn(move || {
            std::thread::sleep(duration);
            log::info!("Capture duration elapsed, stopping");
            token.cancel();
        });
    }

    let mut archive = match &config.output.archive {
        Some(path) => Some(ArchiveWriter::create(path)?),
        None => None,
    };
    let registry = DecoderRegistry::with_known_decoders();
    let mut report = DecodeReport::new();

    for item in session.by_ref() {
        match item {
            Ok(captured) => {
                if let Some(archive) = archive.as_mut() {
                    archive.append(&captured)?;
                }
                if config.output.decode {
                    let record = registry.decode(&captured.frame);
                    println!("{} {}", captured.received_at.format("%H:%M:%S%.3f"), record);
                    report.record(&record);
                } else {
                    println!("{}", captured.frame);
                }
            }
            // Already logged by the session; keep reading
            Err(DecoderError::Frame(_)) => {}
            Err(e) => {
                log::error!("Capture stopped: {}", e);
                break;
            }
        }
    }

    if let Some(archive) = &archive {
        log::info!("Saved {} frames", archive.written());
    }
    report::print_capture_stats(&session.stats());
    if config.output.decode {
        report.print_summary();
    }

    Ok(())
}

/// Decode mode - replay an archive through the registry
fn decode_mode(archive: &Path, ids: &[u16]) -> Result<()> {
    let frames = archive::read_archive(archive)?;
    log::info!("Loaded {} frames from {:?}", frames.len(), archive);

    let registry = DecoderRegistry::with_known_decoders();
    let mut report = DecodeReport::new();

    for captured in &frames {
        if !ids.is_empty() && !ids.contains(&captured.frame.id) {
            continue;
        }
        let record = registry.decode(&captured.frame);
        report.record(&record);
        if record.is_decoded() {
            println!("{} {}", captured.received_at.to_rfc3339(), record);
        } else {
            log::debug!("{}", record);
        }
    }

    report.print_summary();
    Ok(())
}

/// Count mode - identifier histogram of an archive
fn count_mode(archive: &Path) -> Result<()> {
    let frames = archive::read_archive(archive)?;
    let histogram: IdHistogram = frames.iter().map(|captured| &captured.frame).collect();

    println!("Total Frames Loaded: {}", histogram.total());
    println!("{}", "-".repeat(30));
    print!("{}", histogram);
    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

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
