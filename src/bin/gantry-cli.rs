//! Gantry CLI - Command-line interface for the Gantry bridge
//!
//! Provides subcommands for serving the NDJSON control plane over stdio
//! and for inspecting the bridge version.

use anyhow::Result;
use clap::{Parser, Subcommand};
use gantry::service::Service;
use gantry::{Bridge, BridgeConfig};
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gantry")]
#[command(about = "Path-addressable JSON bridge for runtime management objects", long_about = None)]
struct Cli {
    /// Path to a JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the NDJSON control plane over stdin/stdout
    Serve,

    /// Print version information
    Version,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => BridgeConfig::load(path)?,
        None => BridgeConfig::default(),
    };

    match cli.command {
        Commands::Serve => {
            let bridge = Bridge::with_introspection(config)?;
            let stdin = io::stdin().lock();
            let stdout = io::stdout().lock();
            let mut service = Service::new(bridge, stdout);
            service.run(stdin)?;
        }

        Commands::Version => {
            println!("gantry {} (protocol {})", gantry::VERSION, gantry::PROTOCOL_VERSION);
        }
    }

    Ok(())
}
