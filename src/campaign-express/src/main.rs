//! Campaign Express creative generator.
//!
//! Turns a campaign brief into ranked (copy, image) ad assets.

use anyhow::Context;
use campaign_cache::content_key;
use campaign_core::config::AppConfig;
use campaign_core::types::Brief;
use campaign_creative::CreativePipeline;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "campaign-express")]
#[command(about = "Generate and rank ad creatives from a campaign brief")]
#[command(version)]
struct Cli {
    /// Optional TOML config file
    #[arg(long, global = true, env = "CAMPAIGN_EXPRESS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full pipeline for a brief
    Generate {
        /// Brief as a JSON file
        #[arg(long)]
        brief: PathBuf,

        /// Number of ranked assets to return (overrides config)
        #[arg(long)]
        top_k: Option<usize>,

        /// Use only offline backends, even when credentials are present
        #[arg(long, default_value_t = false)]
        offline: bool,

        /// Write the result here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the cache key for an image prompt
    CacheKey { prompt: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campaign_express=info,campaign_creative=info".into()),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::CacheKey { prompt } => {
            println!("{}", content_key(&prompt));
            Ok(())
        }
        Command::Generate {
            brief,
            top_k,
            offline,
            output,
        } => {
            let mut config = AppConfig::load_from(cli.config.as_deref()).unwrap_or_else(|e| {
                warn!(error = %e, "Failed to load config, using defaults");
                AppConfig::default()
            });
            if let Some(k) = top_k {
                config.pipeline.top_k = k;
            }
            if offline {
                config.force_offline();
            }

            let raw = tokio::fs::read_to_string(&brief)
                .await
                .with_context(|| format!("reading brief {}", brief.display()))?;
            let brief: Brief = serde_json::from_str(&raw).context("parsing brief")?;
            brief.validate()?;

            info!(
                product = %brief.product,
                text = %config.text.provider,
                image = %config.image.provider,
                embedding = %config.embedding.provider,
                top_k = config.pipeline.top_k,
                "Configuration loaded"
            );

            let pipeline = CreativePipeline::from_config(&config).await?;
            let result = pipeline.run(&brief).await?;
            let rendered = serde_json::to_string_pretty(&result)?;

            match output {
                Some(path) => {
                    tokio::fs::write(&path, rendered)
                        .await
                        .with_context(|| format!("writing {}", path.display()))?;
                    info!(path = %path.display(), "Result written");
                }
                None => println!("{rendered}"),
            }
            Ok(())
        }
    }
}
