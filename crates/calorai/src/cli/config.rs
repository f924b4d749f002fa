//! The `calorai config` command for configuration management.

use calorai_core::llm::resolve_env_var;
use calorai_core::Config;
use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display the effective configuration
    Show,

    /// Show config file path
    Path,

    /// Write a config file with defaults
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },

    /// Validate the configuration and check that an API key is available
    Check,
}

/// Execute the config command.
pub async fn execute(
    args: ConfigArgs,
    config: Config,
    explicit_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    let path = explicit_path.unwrap_or_else(Config::default_path);

    match args.command {
        ConfigCommand::Show => {
            println!("{}", config.to_toml()?);
        }

        ConfigCommand::Path => {
            println!("{}", path.display());
        }

        ConfigCommand::Init { force } => {
            write_default_config(&path, force)?;
            tracing::info!("Config file created at: {}", path.display());
            println!("Configuration initialized at: {}", path.display());
        }

        ConfigCommand::Check => {
            config.validate()?;
            if resolve_env_var(&config.llm.gemini.api_key).is_none() {
                anyhow::bail!(
                    "No Gemini API key available.\n\n  \
                     Hint: export GOOGLE_API_KEY or add it to a .env file."
                );
            }
            println!(
                "Configuration OK (model: {}, endpoint: {})",
                config.llm.gemini.model, config.llm.gemini.endpoint
            );
        }
    }

    Ok(())
}

fn write_default_config(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at: {}\nUse --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(path, Config::default().to_toml()?)?;
    Ok(())
}
