//! Techniq - lighting technique inspection tool
//!
//! # Commands
//!
//! - `techniq decode <id>` - Print the raw, vertex and pixel ids of a technique
//! - `techniq replay` - Run one draw through the binders and print the recorded calls
//!
//! # Usage
//!
//! ```bash
//! # Decode a requested technique id
//! techniq decode 0x4900022D
//!
//! # Decode a raw id directly
//! techniq decode --raw 0x01000200
//!
//! # Replay an envmap draw with two point lights under a custom config
//! techniq replay --technique 0x01000200 --lights 2 --config lighting.toml
//! ```

mod decode;
mod replay;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

/// Techniq - lighting technique inspection tool
#[derive(Parser)]
#[command(name = "techniq")]
#[command(about = "Decode lighting technique ids and replay draws")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the raw, vertex and pixel ids of a technique
    Decode(decode::DecodeArgs),

    /// Run one draw through the binders and print the recorded calls
    Replay(replay::ReplayArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Decode(args) => decode::execute(args),
        Commands::Replay(args) => replay::execute(args),
    }
}

/// Parse a technique id given in hex (`0x` prefix) or decimal
pub(crate) fn parse_id(text: &str) -> Result<u32> {
    let text = text.trim();
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(&hex.replace('_', ""), 16),
        None => text.replace('_', "").parse(),
    };
    parsed.with_context(|| format!("Invalid technique id '{text}'"))
}
