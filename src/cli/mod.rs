//! CLI module — command parsing and dispatch
//!
//! All CLI logic lives here. `main.rs` calls `cli::run()`.

pub mod config;
pub mod context;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};

use relaybot::config::Config;

#[derive(Parser)]
#[command(name = "relaybot")]
#[command(version)]
#[command(about = "Conversation context manager for multi-platform chatbots", long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.relaybot/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a message history through the context pipeline
    Context {
        /// JSON file holding an array of messages
        #[arg(short, long)]
        input: PathBuf,
        /// Token ceiling (overrides context.max_context_tokens)
        #[arg(long, allow_negative_numbers = true)]
        max_tokens: Option<i64>,
        /// Turn cap, -1 to disable (overrides context.enforce_max_turns)
        #[arg(long, allow_negative_numbers = true)]
        max_turns: Option<i64>,
        /// Turns dropped per truncation (overrides context.truncate_turns)
        #[arg(long)]
        truncate_turns: Option<i64>,
        /// Token usage reported by the provider for this history
        #[arg(long, default_value_t = 0)]
        trusted_usage: u64,
    },
    /// Estimate the token count of a message history
    Tokens {
        /// JSON file holding an array of messages
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Show or check the effective configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
    /// Show version information
    Version,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration as JSON
    Show,
    /// Check the configuration file for errors and warnings
    Check,
}

/// Entry point: parse arguments, set up logging and dispatch.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::path);
    // Logging falls back to defaults when the config file is unreadable; the
    // command itself reports the load error.
    let logging_cfg = Config::load_from_path(&config_path)
        .map(|c| c.logging)
        .unwrap_or_default();
    relaybot::utils::logging::init_logging(&logging_cfg)?;

    match cli.command {
        None => {
            let mut cmd = Cli::command();
            cmd.print_help()?;
            println!();
        }
        Some(Commands::Version) => {
            cmd_version();
        }
        Some(Commands::Context {
            input,
            max_tokens,
            max_turns,
            truncate_turns,
            trusted_usage,
        }) => {
            let config = load_config(&config_path)?;
            let overrides = context::ContextOverrides {
                max_tokens,
                max_turns,
                truncate_turns,
            };
            context::cmd_context(&config, &input, overrides, trusted_usage).await?;
        }
        Some(Commands::Tokens { input }) => {
            context::cmd_tokens(&input)?;
        }
        Some(Commands::Config { action }) => {
            config::cmd_config(&config_path, action.unwrap_or(ConfigAction::Show))?;
        }
    }

    Ok(())
}

pub(crate) fn load_config(path: &Path) -> Result<Config> {
    Config::load_from_path(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

fn cmd_version() {
    println!("relaybot {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Conversation context manager for multi-platform chatbots");
}
