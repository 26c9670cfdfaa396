//! gnmifmt
//!
//! Prints gNMI subscribe NDJSON captures as `[timestamp] path = value` lines.

use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use gnmifmt::{Converter, FormatterConfig, TimeZoneMode};
use gnmifmt_common::init_tracing;

/// gNMI capture formatter
#[derive(Parser, Debug)]
#[command(name = "gnmifmt")]
#[command(about = "Convert gNMI subscribe NDJSON captures into readable lines")]
struct Args {
    /// Input file containing gNMI subscribe messages in NDJSON format
    #[arg(short, long)]
    file: PathBuf,

    /// Path to an optional JSON5 configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Render timestamps in the host's local time zone instead of UTC
    #[arg(long)]
    local_time: bool,

    /// Do not echo a preview of malformed lines
    #[arg(long)]
    no_preview: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = match &args.config {
        Some(path) => FormatterConfig::load_from_file(path)?,
        None => FormatterConfig::default(),
    };
    if args.local_time {
        config.output.timezone = TimeZoneMode::Local;
    }
    if args.no_preview {
        config.output.preview_chars = 0;
    }

    // Initialize logging
    let logging_config = config
        .logging
        .clone()
        .with_level_override(args.log_level.as_deref());
    init_tracing(&logging_config)?;

    let converter = Converter::new(config.output);
    let stdout = std::io::stdout();

    match converter.run_file(&args.file, stdout.lock()) {
        Ok(summary) => {
            info!(
                "Converted {} records into {} lines ({} malformed)",
                summary.records, summary.emitted, summary.malformed
            );
            Ok(())
        }
        Err(e) if e.is_broken_pipe() => Ok(()),
        Err(e) => Err(e.into()),
    }
}
