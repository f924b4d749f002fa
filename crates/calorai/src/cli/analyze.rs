//! The `calorai analyze` command: one photo, one answer on stdout.

use calorai_core::{
    AnalysisRequest, AnalyzeOptions, Analyzer, Config, ProviderFactory, UploadedImage,
};
use clap::Args;
use std::path::PathBuf;

/// Arguments for the `analyze` command.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// JPEG or PNG photo of the meal
    pub image: PathBuf,

    /// Prompt text (defaults to the configured nutrition prompt)
    #[arg(short, long, conflicts_with = "prompt_file")]
    pub prompt: Option<String>,

    /// Read the prompt from a file
    #[arg(long)]
    pub prompt_file: Option<PathBuf>,

    /// Gemini model to use instead of the configured one
    #[arg(long)]
    pub model: Option<String>,
}

/// Execute the analyze command.
pub async fn execute(args: AnalyzeArgs, config: Config) -> anyhow::Result<()> {
    if !args.image.exists() {
        anyhow::bail!(
            "Image does not exist: {:?}\n\n  Hint: Check the file path and try again.",
            args.image
        );
    }

    let prompt = resolve_prompt(&args, &config)?;
    let provider = ProviderFactory::create(&config.llm, args.model.as_deref())?;
    let analyzer = Analyzer::new(provider, AnalyzeOptions::from_config(&config));

    let image = UploadedImage::from_path(&args.image).await?;
    tracing::info!(
        "Analyzing {} with {}",
        args.image.display(),
        analyzer.model()
    );

    let result = analyzer
        .analyze(AnalysisRequest::new(prompt, Some(image)))
        .await?;

    println!("{}", result.text);
    Ok(())
}

/// `--prompt` wins, then `--prompt-file`, then the config prompt.
fn resolve_prompt(args: &AnalyzeArgs, config: &Config) -> anyhow::Result<String> {
    if let Some(prompt) = &args.prompt {
        return Ok(prompt.clone());
    }
    if let Some(path) = &args.prompt_file {
        return std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("Failed to read prompt file {}: {e}", path.display())
        });
    }
    Ok(config.analysis.prompt.clone())
}
