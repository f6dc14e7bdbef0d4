//! Stored-data reporting commands: stats, list-orgs, list-repos.

use ghstats::StatsFilter;

pub(crate) async fn handle_stats(
    filter: &StatsFilter,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = ghstats::connect_and_migrate(database_url).await?;
    let counts = ghstats::interaction_stats(&db, filter).await?;

    if counts.is_empty() {
        println!("No interactions match.");
        return Ok(());
    }

    println!("{:<14} {:>8}", "category", "count");
    let mut total = 0u64;
    for count in &counts {
        println!("{:<14} {:>8}", count.kind.as_str(), count.count);
        total += count.count;
    }
    println!("{:<14} {:>8}", "total", total);

    Ok(())
}

pub(crate) async fn handle_list_orgs(
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = ghstats::connect_and_migrate(database_url).await?;
    let orgs = ghstats::list_organizations(&db).await?;

    if orgs.is_empty() {
        println!("No organizations tracked yet.");
        return Ok(());
    }

    for org in &orgs {
        let synced = org
            .last_synced_at
            .map_or_else(|| "never synced".to_string(), |ts| ts.to_rfc3339());
        println!("{:<30} {}", org.name, synced);
    }

    Ok(())
}

pub(crate) async fn handle_list_repos(
    org: Option<&str>,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = ghstats::connect_and_migrate(database_url).await?;
    let repos = ghstats::list_repositories(&db, org).await?;

    if repos.is_empty() {
        println!("No repositories tracked yet.");
        return Ok(());
    }

    for repo in &repos {
        let visibility = if repo.is_private { "private" } else { "public" };
        println!("{:<40} {}", repo.full_name, visibility);
    }

    Ok(())
}
