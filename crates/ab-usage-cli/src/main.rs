//! AgenticBilling usage submission tool.
//!
//! Interactive CLI for building CloudEvents usage envelopes, editing them
//! field by field, submitting them to the AgenticBilling API and browsing
//! aggregated usage/cost reports.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ab_usage_client::UsageApiClient;
use ab_usage_core::Prompt;

mod config;
mod console;
mod export;
mod menu;
mod report;

use config::{CliArgs, Config};
use console::StdinPrompt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,ab_usage_core=debug,ab_usage_client=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();
    let mut prompt = StdinPrompt;

    let config = Config::resolve(args, &mut prompt)?;
    tracing::info!(
        base_url = %config.base_url,
        provider = %config.provider,
        "configuration resolved"
    );

    prompt.say("\nAgenticBilling - Usage Data Submission Tool");
    prompt.say(&format!("  Base URL: {}", config.base_url));
    prompt.say(&format!("  API key:  {}", config.masked_key()));
    prompt.say(&format!("  Provider: {}", config.provider));

    let client = UsageApiClient::new(&config.base_url, &config.api_key, &config.provider)?;

    menu::main_menu(&config, &client, &mut prompt).await?;

    prompt.say("Goodbye!");
    Ok(())
}
