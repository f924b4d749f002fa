//! The `calorai serve` command: run the web form.

use anyhow::Context;
use calorai_core::{AnalyzeOptions, Analyzer, Config, ProviderFactory};
use clap::Args;
use std::net::SocketAddr;

use crate::web::{self, AppState};

/// Arguments for the `serve` command.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on, e.g. 0.0.0.0:8501
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Gemini model to use instead of the configured one
    #[arg(long)]
    pub model: Option<String>,
}

/// Execute the serve command.
pub async fn execute(args: ServeArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    let addr = parse_bind(&config.server.bind)?;

    // Fails here with a readable message when GOOGLE_API_KEY is missing
    let provider = ProviderFactory::create(&config.llm, args.model.as_deref())?;
    let analyzer = Analyzer::new(provider, AnalyzeOptions::from_config(&config));

    tracing::info!(
        provider = analyzer.provider_name(),
        model = analyzer.model(),
        max_file_size_mb = config.limits.max_file_size_mb,
        timeout_ms = config.limits.llm_timeout_ms,
        "Starting CalorAI"
    );

    let state = AppState::new(analyzer, config.analysis.prompt.clone());
    web::run_server(state, addr).await
}

fn parse_bind(bind: &str) -> anyhow::Result<SocketAddr> {
    bind.parse()
        .with_context(|| format!("Invalid bind address '{bind}' (expected host:port, e.g. 127.0.0.1:8501)"))
}
