//! regscan CLI
//!
//! Loads an object-graph snapshot, runs the registry scan from a root
//! object and prints what it found.

mod commands;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "regscan")]
#[command(about = "Find u64-keyed registries in object graph snapshots", long_about = None)]
#[command(version)]
struct Cli {
    /// Color output: auto, always, never
    #[arg(long, global = true)]
    color: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a snapshot starting from a root object
    Scan {
        /// Snapshot file (.json or .toml)
        snapshot: PathBuf,
        /// Object id of the root component
        #[arg(short, long)]
        root: u64,
        /// Scan configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Print the effective configuration as TOML
    Config {
        /// Configuration file to merge over the defaults
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

/// Result rendering
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Human-readable listing
    Text,
    /// Serialized `ScanResult`
    Json,
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("REGSCAN_LOG")
        .unwrap_or_else(|_| EnvFilter::new("regscan=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging();
    let color = output::resolve_color_choice(cli.color.as_deref());

    match cli.command {
        Commands::Scan {
            snapshot,
            root,
            config,
            format,
        } => commands::scan::execute(&snapshot, root, config.as_deref(), format, color),
        Commands::Config { config } => {
            commands::config::execute(config.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
