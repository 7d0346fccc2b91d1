//! PINCAST composite importer CLI.
//!
//! Imports one NetCDF composite through the importer registry and prints
//! the metadata record with a summary of the arrays as JSON on stdout.
//! Logs go to stderr.

mod config;
mod report;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use netcdf_importer::{find_importer, importer_methods, silence_hdf5_errors, Precision};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use config::ImporterConfig;
use report::ImportReport;

#[derive(Parser, Debug)]
#[command(name = "pincast-import")]
#[command(about = "Import a PINCAST radar composite and print its metadata")]
struct Args {
    /// NetCDF composite to import
    #[arg(required_unless_present = "list")]
    file: Option<PathBuf>,

    /// Configuration file path (YAML)
    #[arg(short, long, env = "PINCAST_CONFIG")]
    config: Option<PathBuf>,

    /// Importer name, with or without the `importer_` prefix
    #[arg(short, long)]
    importer: Option<String>,

    /// Precipitation variable
    #[arg(long)]
    precip_field: Option<String>,

    /// Quality variable (not read unless given)
    #[arg(long)]
    quality_field: Option<String>,

    /// Replacement for non-finite precipitation values
    #[arg(long, allow_hyphen_values = true)]
    fillna: Option<f64>,

    /// Output precision: single or double
    #[arg(long)]
    dtype: Option<String>,

    /// List registered importers and exit
    #[arg(long)]
    list: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    /// Command-line flags take precedence over every other layer.
    fn apply(&self, config: &mut ImporterConfig) -> Result<()> {
        if let Some(importer) = &self.importer {
            config.importer = importer.clone();
        }
        if let Some(field) = &self.precip_field {
            config.options.precip_field = field.clone();
        }
        if let Some(field) = &self.quality_field {
            config.options.quality_field = Some(field.clone());
        }
        if let Some(fill) = self.fillna {
            config.options.postprocess.fillna = Some(fill);
        }
        if let Some(dtype) = &self.dtype {
            config.options.postprocess.dtype = dtype.parse::<Precision>()?;
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    silence_hdf5_errors();

    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    if args.list {
        for name in importer_methods() {
            println!("{}", name);
        }
        return Ok(());
    }

    let file = args
        .file
        .clone()
        .context("No input file given")?;

    let mut config = ImporterConfig::load(args.config.as_deref())?;
    args.apply(&mut config)?;
    info!(
        importer = %config.importer,
        precip_field = %config.options.precip_field,
        quality_field = ?config.options.quality_field,
        dtype = %config.options.postprocess.dtype,
        "Loaded configuration"
    );

    let importer = find_importer(&config.importer)?;
    let imported = importer
        .import(&file, &config.options)
        .with_context(|| format!("Failed to import {}", file.display()))?;

    let report = ImportReport::new(&file, importer.name, imported);
    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{}", json);

    Ok(())
}
