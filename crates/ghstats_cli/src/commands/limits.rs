//! The limits command: current GitHub rate limit status.

use chrono::Utc;
use clap::ValueEnum;
use serde::Serialize;

use crate::commands::shared::build_client;
use crate::config::Config;

/// Output format for rate limit display.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Display as a formatted table (default)
    #[default]
    Table,
    /// Display as JSON
    Json,
}

#[derive(Debug, Serialize)]
struct RateLimitDisplay {
    limit: u64,
    used: u64,
    remaining: u64,
    reset_at: String,
    reset_in_secs: i64,
}

pub(crate) async fn handle_limits(
    output: OutputFormat,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = build_client(config)?;
    let rate_limit = client.get_rate_limit().await?;

    let reset_at = rate_limit.reset_at();
    let display = RateLimitDisplay {
        limit: rate_limit.limit,
        used: rate_limit.used,
        remaining: rate_limit.remaining,
        reset_at: reset_at.to_rfc3339(),
        reset_in_secs: (reset_at - Utc::now()).num_seconds().max(0),
    };

    match output {
        OutputFormat::Table => {
            println!("GitHub API rate limit (core):");
            println!("  limit      {}", display.limit);
            println!("  used       {}", display.used);
            println!("  remaining  {}", display.remaining);
            println!("  resets at  {} ({}s)", display.reset_at, display.reset_in_secs);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&display)?);
        }
    }

    Ok(())
}
