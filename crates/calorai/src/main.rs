//! CalorAI - snap a meal, get its calories.
//!
//! Serves a single-page form where a food photo and a prompt are sent to a
//! hosted multimodal model, and the model's nutrition analysis is shown back.
//!
//! # Usage
//!
//! ```bash
//! # Start the web form on 127.0.0.1:8501
//! calorai serve
//!
//! # Analyze one photo from the terminal
//! calorai analyze lunch.jpg
//!
//! # View configuration
//! calorai config show
//! ```

use clap::{Parser, Subcommand};
use calorai_core::Config;
use std::path::{Path, PathBuf};

mod cli;
mod logging;
mod web;

/// CalorAI - intelligent calorie and nutrition analysis from food photos.
#[derive(Parser, Debug)]
#[command(name = "calorai")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "CALORAI_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the web form
    Serve(cli::serve::ServeArgs),

    /// Analyze a single food photo and print the result
    Analyze(cli::analyze::AnalyzeArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Pick up GOOGLE_API_KEY from a local .env file, if any.
    dotenv::dotenv().ok();

    let config = load_config(cli.config.as_deref())?;
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("CalorAI v{}", calorai_core::VERSION);

    match cli.command {
        Commands::Serve(args) => cli::serve::execute(args, config).await,
        Commands::Analyze(args) => cli::analyze::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args, config, cli.config).await,
    }
}

/// Resolve the configuration for this run.
///
/// An explicit `--config` path that doesn't exist yet yields defaults, so
/// `config init` and `config path` work before the file is created.
fn load_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    if let Some(path) = explicit {
        return Ok(Config::load_or_default(path)?);
    }

    // Logging isn't initialized yet, so use eprintln for config warnings.
    match Config::load() {
        Ok(config) => Ok(config),
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `calorai config path`."
            );
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_missing_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh").join("config.toml");

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.server.bind, Config::default().server.bind);
    }

    #[test]
    fn test_explicit_broken_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server\n").unwrap();

        assert!(load_config(Some(&path)).is_err());
    }

    #[test]
    fn test_cli_parses_global_config_flag() {
        let cli = Cli::try_parse_from(["calorai", "--config", "/tmp/c.toml", "config", "path"]).unwrap();
        assert_eq!(cli.config.as_deref(), Some(Path::new("/tmp/c.toml")));
        assert!(matches!(cli.command, Commands::Config(_)));
    }
}
