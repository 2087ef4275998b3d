//! # Strider Engine
//!
//! Headless entry point for Strider.
//!
//! This crate ties together:
//! - Configuration loading (`strider.toml`, `--init [path]` writes the defaults)
//! - Fixed-timestep clock
//! - Scripted demo scenario over the gameplay simulation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod app;
mod config;
mod timing;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::SimConfig;

/// Main entry point.
fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("strider=info".parse()?))
        .init();

    info!("Strider starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut args = std::env::args().skip(1);
    let mut config = match args.next().as_deref() {
        Some("--init") => {
            let path = args
                .next()
                .unwrap_or_else(|| SimConfig::config_path().display().to_string());
            SimConfig::default()
                .save_to(&path)
                .with_context(|| format!("writing default scenario to {path}"))?;
            return Ok(());
        },
        Some(path) => SimConfig::load_from(path),
        None => SimConfig::load(),
    };
    config.validate()?;

    let summary = app::run(&config)?;
    info!(
        "Simulated {:.1}s in {} ticks; {} events ({} jumps, {} landings)",
        summary.elapsed, summary.ticks, summary.events, summary.jumps, summary.lands
    );
    info!(
        "Player ended at {:?}; focused NPC: {:?}",
        summary.player_position, summary.focused
    );

    info!("Strider shutdown complete");
    Ok(())
}
