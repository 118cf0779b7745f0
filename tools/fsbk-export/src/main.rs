//! fsbk-export - FSBK soundbank builder
//!
//! Packs an instrument definition table and its WAV samples into a single
//! soundbank image for the playback engine.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use fsbk_common::RegionLayout;
use fsbk_export::{
    BuildConfig, ConfigFile, ConfigOverrides, EnvelopeScheme, OutputFormat, export_soundbank,
};

#[derive(Parser)]
#[command(name = "fsbk-export")]
#[command(about = "Build an FSBK soundbank from instrument definitions and WAV samples")]
#[command(version)]
struct Cli {
    /// Instrument definition table
    definitions: PathBuf,

    /// Output soundbank file
    output: PathBuf,

    /// Sample data format
    #[arg(value_enum)]
    format: OutputFormat,

    /// Envelope fields in the definition rows
    #[arg(long, value_enum)]
    envelope: Option<EnvelopeScheme>,

    /// Region record layout (split or packed)
    #[arg(long)]
    layout: Option<RegionLayout>,

    /// Sample RAM budget in bytes (overrides the format default)
    #[arg(long)]
    budget: Option<u64>,

    /// Field delimiter in the definition table
    #[arg(long)]
    delimiter: Option<char>,

    /// TOML file with build settings (flags take precedence)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Read malformed integer fields as 0 instead of skipping the row
    #[arg(long)]
    lenient: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    let file = cli.config.as_deref().map(ConfigFile::load).transpose()?;
    let overrides = ConfigOverrides {
        envelope: cli.envelope,
        layout: cli.layout,
        budget: cli.budget,
        delimiter: cli.delimiter,
        lenient: cli.lenient,
    };
    let config = BuildConfig::resolve(cli.format, file.as_ref(), &overrides)?;

    tracing::info!(
        "Building {:?} -> {:?} ({:?}, {:?} envelopes, {} layout, {} byte budget)",
        cli.definitions,
        cli.output,
        config.format,
        config.envelope,
        config.layout,
        config.budget
    );

    let report = export_soundbank(&cli.definitions, &cli.output, &config)?;

    for row in &report.skipped {
        match row.line {
            Some(line) => eprintln!("skipped line {}: {}", line, row.reason),
            None => eprintln!("skipped row: {}", row.reason),
        }
    }
    tracing::info!("Done! {} bytes left", report.remaining);

    Ok(())
}
