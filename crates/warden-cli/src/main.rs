//! Operator CLI for Warden
//!
//! Offline tooling around the signing engine: check a configuration file,
//! ask what the configured policy requires for an operation, and render the
//! canonical message validators sign.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use warden_effects::WardenEffectSystem;

mod commands;

use commands::{
    config::{load_config, validate_config},
    evaluate::{evaluate, EvaluateArgs},
    message::{render_message, MessageArgs},
};

#[derive(Parser)]
#[command(name = "warden")]
#[command(about = "Warden - multi-signer policy and verification engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path; built-in defaults apply when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load, override from the environment and validate the configuration
    ValidateConfig,

    /// Required signatures for an operation under the configured default policy
    Evaluate(EvaluateArgs),

    /// Canonical message bytes for an operation
    Message(MessageArgs),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    warden_effects::init_logging(&config.logging)?;
    tracing::debug!(config = ?cli.config, "configuration loaded");

    let output = match cli.command {
        Commands::ValidateConfig => validate_config(&config)?,
        Commands::Evaluate(args) => evaluate(&config, &args)?,
        Commands::Message(args) => render_message(&args, &WardenEffectSystem::production()).await?,
    };
    println!("{output}");

    Ok(())
}
