//! Fundtrace - Wallet funding provenance and risk analysis
//!
//! Traces where the funds in a wallet came from, classifies the origins
//! against known exchange, mixer, and DeFi registries, and folds the
//! findings into a deterministic 0-100 risk score.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::error;

// Use the library crate
use fundtrace::cli::commands;
use fundtrace::config::Config;

/// Funding source attribution and risk graph engine
#[derive(Parser)]
#[command(name = "fundtrace")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config.toml", env = "FUNDTRACE_CONFIG")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a wallet's funding sources and risk
    Analyze {
        /// Wallet address (0x-prefixed)
        wallet: String,

        /// Emit the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List confirmed incoming transfers for a wallet
    Transfers {
        /// Wallet address (0x-prefixed)
        wallet: String,

        /// Minimum transfer value in raw units (overrides config)
        #[arg(long)]
        min_amount: Option<u128>,

        /// Maximum rows to print
        #[arg(short, long, default_value = "25")]
        limit: usize,
    },

    /// Classify a single address against the entity registry
    Classify {
        /// Address to classify
        address: String,
    },

    /// Show registry and tracker statistics
    Stats,

    /// Show current configuration (secrets masked)
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fundtrace=info".parse().unwrap()),
        )
        .with_target(true)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Execute command
    let result = match cli.command {
        Commands::Analyze { wallet, json } => commands::analyze(&config, &wallet, json).await,
        Commands::Transfers {
            wallet,
            min_amount,
            limit,
        } => commands::transfers(&config, &wallet, min_amount, limit).await,
        Commands::Classify { address } => commands::classify(&config, &address),
        Commands::Stats => commands::stats(&config),
        Commands::Config => commands::show_config(&config),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
