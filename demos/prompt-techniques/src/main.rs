//! Runs prompt-engineering techniques against the configured completion
//! service and prints each completion.
//!
//! Configuration comes from `.env` or the environment (`LLM_SERVICE`,
//! `LLM_CHAT_MODEL`, `LLM_ENDPOINT`, `LLM_API_KEY`, ...). With `--dry-run` no
//! credentials are needed: the bound prompts are printed instead.

mod techniques;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use promptcraft::adapters::echo::EchoCompletionService;
use promptcraft::prelude::{Kernel, ServiceConfig};
use promptcraft::telemetry::{self, TelemetryConfig};
use tracing::info;

use crate::techniques::Technique;

#[derive(Debug, Parser)]
#[command(name = "prompt-techniques", version, about)]
struct Cli {
    /// Technique to run; runs all of them when omitted.
    #[arg(short, long, value_enum)]
    technique: Option<Technique>,

    /// Print the bound prompts instead of calling the service.
    #[arg(long)]
    dry_run: bool,

    /// Log filter directive, overriding `RUST_LOG`.
    #[arg(long)]
    log: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut telemetry_config = TelemetryConfig::new();
    if let Some(filter) = &cli.log {
        telemetry_config = telemetry_config.with_filter(filter.as_str());
    }
    telemetry::init(&telemetry_config)?;

    let kernel = if cli.dry_run {
        Kernel::new(Arc::new(EchoCompletionService::new()))
    } else {
        let config = ServiceConfig::load().context("failed to load service configuration")?;
        Kernel::from_config(&config).context("failed to create completion service")?
    };
    info!(?kernel, dry_run = cli.dry_run, "kernel ready");

    let selected = cli
        .technique
        .map_or_else(|| Technique::ALL.to_vec(), |technique| vec![technique]);

    for technique in selected {
        println!("=== {} ===\n", technique.title());
        let sections = techniques::run(technique, &kernel)
            .await
            .with_context(|| format!("{} failed", technique.title()))?;
        for section in sections {
            println!("{}\n{}\n", section.label, section.text.trim_end());
        }
    }

    Ok(())
}
