//! Tracking commands: organization and repository ingestion.

use console::style;
use ghstats::registry::split_full_name;

use crate::commands::shared::{build_tracker, print_activity_report};
use crate::config::Config;

pub(crate) async fn handle_track_org(
    name: &str,
    fetch_repos: bool,
    config: &Config,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let tracker = build_tracker(config, database_url).await?;

    println!("Tracking organization {}...", style(name).bold());
    let tracked = tracker.track_organization(name).await?;
    if tracked.exists {
        println!(
            "{} {} (github id {})",
            style("ok:").green().bold(),
            tracked.organization.name,
            tracked
                .organization
                .github_id
                .map_or_else(|| "?".to_string(), |id| id.to_string())
        );
    } else {
        println!(
            "{} organization recorded locally, details unavailable: {}",
            style("warning:").yellow().bold(),
            tracked.error.as_deref().unwrap_or("unknown error")
        );
    }

    if !fetch_repos {
        return Ok(());
    }

    let client = crate::commands::shared::build_client(config)?;
    let repos = client.list_org_repos(name).await?;
    println!("Found {} repositories.", repos.len());

    for repo in &repos {
        let Some(full_name) = repo.get("full_name").and_then(|v| v.as_str()) else {
            continue;
        };
        let (owner, short_name) = match split_full_name(full_name) {
            (Some(owner), short_name) => (owner, short_name),
            (None, _) => continue,
        };

        println!("\nTracking {}...", style(full_name).bold());
        tracker.track_repository(full_name, Some(name)).await?;
        let report = tracker.track_repository_activity(owner, short_name).await;
        print_activity_report(&report);
    }

    Ok(())
}

pub(crate) async fn handle_track_repo(
    repo: &str,
    org: Option<&str>,
    config: &Config,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let tracker = build_tracker(config, database_url).await?;

    println!("Tracking {}...", style(repo).bold());
    let tracked = tracker.track_repository(repo, org).await?;
    if !tracked.exists {
        println!(
            "{} repository recorded locally, details unavailable: {}",
            style("warning:").yellow().bold(),
            tracked.error.as_deref().unwrap_or("unknown error")
        );
    }

    let (owner, short_name) = match split_full_name(&tracked.repository.full_name) {
        (Some(owner), short_name) => (owner, short_name),
        (None, short_name) => {
            return Err(format!(
                "Cannot fetch activity for '{short_name}' without an owner. \
                 Use owner/name or pass --org."
            )
            .into());
        }
    };

    let report = tracker.track_repository_activity(owner, short_name).await;
    print_activity_report(&report);

    Ok(())
}
