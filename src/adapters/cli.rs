//! CLI Definition
//!
//! Command-line surface for the monitoring engine.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Poolwatch - token lifecycle monitoring and sniping engine for Solana
#[derive(Parser, Debug)]
#[command(
    name = "poolwatch",
    version = env!("CARGO_PKG_VERSION"),
    about = "Token lifecycle monitoring and sniping engine for Solana",
    long_about = "Poolwatch watches new liquidity pools and signal channels, gates \
                  candidates through a rug-check safety policy, and tracks enrolled \
                  tokens through a persistent price-triggered lifecycle."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the monitoring engine
    Run(RunCmd),

    /// Show tracked-token counts from the store
    Status(StatusCmd),
}

/// Start the monitoring engine
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    pub config: PathBuf,

    /// Force simulation mode regardless of the config file
    #[arg(short, long)]
    pub simulate: bool,
}

/// Show store status
#[derive(Parser, Debug)]
pub struct StatusCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    pub config: PathBuf,
}
