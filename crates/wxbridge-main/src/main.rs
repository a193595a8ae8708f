// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of wxbridge.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

mod config;
mod host;

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use config::AppConfig;

/// Archive record bridge for weather-station hosts
#[derive(Parser, Debug)]
#[command(name = "wxbridge", version, about)]
struct Cli {
    /// Configuration file (TOML, or JSON when the extension is .json)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// NDJSON archive records to process; reads stdin when omitted
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Validate the configuration and exit
    #[arg(long)]
    check: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, config_path) = AppConfig::load(cli.config.as_deref())?;

    // RUST_LOG wins over the configured level; logs go to stderr, records to stdout
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.system.log_level)),
        )
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let order = config.handler_order();
    info!("🚀 Starting wxbridge {}", env!("CARGO_PKG_VERSION"));
    info!("📋 Configuration Summary:");
    info!("   Config file: {}", config_path.display());
    info!("   Archive interval: {}s", config.archive.archive_interval);
    info!("   Handlers: {}", order.join(" -> "));

    if cli.check {
        info!("✅ Configuration is valid");
        return Ok(());
    }

    let chain = config.build_chain()?;

    let input: Box<dyn BufRead> = match &cli.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?,
        )),
        None => Box::new(io::stdin().lock()),
    };

    let stats = host::run(
        &chain,
        config.archive.archive_interval,
        input,
        io::stdout().lock(),
        || chrono::Utc::now().timestamp(),
    )?;

    info!(
        "🏁 Processed {} records ({} malformed lines skipped, {} handler failures)",
        stats.records, stats.skipped_lines, stats.handler_failures
    );
    Ok(())
}
