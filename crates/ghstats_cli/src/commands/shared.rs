//! Helpers shared by the tracking commands.

use ghstats::{GitHubClient, GitHubConfig, InteractionTracker};

use crate::config::Config;

/// Build a GitHub client from the loaded configuration.
pub(crate) fn build_client(config: &Config) -> Result<GitHubClient, Box<dyn std::error::Error>> {
    let token = config.github_token()?;
    let gh = GitHubConfig::new(token).with_api_base(config.github.api_base.clone());
    Ok(GitHubClient::new(gh))
}

/// Connect to the database (running migrations) and build a tracker.
pub(crate) async fn build_tracker(
    config: &Config,
    database_url: &str,
) -> Result<InteractionTracker, Box<dyn std::error::Error>> {
    let db = ghstats::connect_and_migrate(database_url).await?;
    let client = build_client(config)?;
    Ok(InteractionTracker::new(db, client).with_api_call_logging(config.github.log_api_calls))
}

/// Render an activity report as one summary line per category.
pub(crate) fn print_activity_report(report: &ghstats::ActivityReport) {
    for (kind, count) in &report.counts {
        println!("  {:<14} {count}", kind.as_str());
    }
    for error in &report.errors {
        eprintln!("  {} {}", console::style("error:").red().bold(), error);
    }
    println!(
        "  {} {} interactions recorded",
        console::style("total:").bold(),
        report.total()
    );
}
