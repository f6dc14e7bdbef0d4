//! The stars command: aggregate star counts per repository.

pub(crate) async fn handle_stars(database_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let db = ghstats::connect_and_migrate(database_url).await?;
    let counts = ghstats::star_counts_by_repository(&db).await?;

    if counts.is_empty() {
        println!("No star interactions recorded yet.");
        return Ok(());
    }

    let width = counts
        .iter()
        .map(|c| c.repository.len())
        .max()
        .unwrap_or(10)
        .max("repository".len());

    println!("{:<width$} {:>8}", "repository", "stars");
    for count in &counts {
        println!("{:<width$} {:>8}", count.repository, count.stars);
    }

    Ok(())
}
