//! Coldtrace CLI
//!
//! - `coldtrace demo`: run a batch from creation to certified transfer
//!   against an in-process ledger, content store and oracle worker
//! - `coldtrace keygen`: generate a certifying-authority keypair
//! - `coldtrace config`: print a ledger configuration template

#![deny(unsafe_code)]

mod demo;

use anyhow::Context;
use clap::{Parser, Subcommand};
use coldtrace_crypto::AuthorityKeypair;
use coldtrace_ledger::LedgerConfig;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "coldtrace")]
#[command(about = "Coldtrace - cold-chain batch provenance ledger", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the end-to-end batch scenario
    Demo(demo::DemoArgs),

    /// Generate a certifying-authority keypair
    Keygen {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a ledger configuration template
    Config {
        /// Validate this file instead of printing the template
        #[arg(long, env = "COLDTRACE_CONFIG")]
        check: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    match cli.command {
        Commands::Demo(args) => demo::run(args).await,
        Commands::Keygen { json } => {
            let keypair = AuthorityKeypair::generate();
            if json {
                let value = serde_json::json!({
                    "address": keypair.address().to_hex(),
                    "secret": keypair.secret_hex(),
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("Address: {}", keypair.address());
                println!("Secret:  {}", keypair.secret_hex());
            }
            Ok(())
        }
        Commands::Config { check: Some(path) } => {
            let config = LedgerConfig::load(&path)
                .with_context(|| format!("loading {}", path.display()))?;
            println!("✓ {} is valid", path.display());
            println!("  Administrator: {}", config.administrator);
            println!("  Oracle:        {}", config.oracle);
            Ok(())
        }
        Commands::Config { check: None } => {
            print!("{}", LedgerConfig::template().to_toml_string()?);
            Ok(())
        }
    }
}
