//! Optimize experiment generator CLI
//!
//! Turns an application definition into an optimization experiment and
//! manages the built-in metric store.

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{generate, reset};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Optimize experiment generator
#[derive(Parser)]
#[command(name = "optimize-gen")]
#[command(author, version, about = "Generate optimization experiments from applications", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to ~/.config/optimize/config.yaml)
    #[arg(long, env = "OPTIMIZE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate an experiment from an application
    Generate(generate::GenerateArgs),

    /// Delete the series collected for the built-in metrics
    ResetMetrics(reset::ResetMetricsArgs),
}

fn init_tracing(json: bool, verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // stdout carries the generated documents
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json, cli.verbose);

    match &cli.command {
        Commands::Generate(args) => {
            let config = config::GeneratorConfig::load(cli.config.as_deref())?;
            generate::run(args, &config)?;
        }
        Commands::ResetMetrics(args) => {
            reset::run(args).await?;
        }
    }

    Ok(())
}
