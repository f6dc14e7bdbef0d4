//! The integrity sweep command.

use console::style;

pub(crate) async fn handle_sweep(database_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let db = ghstats::connect_and_migrate(database_url).await?;

    println!("Sweeping interactions...");
    let report = ghstats::sweep(&db).await?;

    if report.total() == 0 {
        println!("No interactions stored.");
        return Ok(());
    }

    println!();
    println!("{:<14} {:>8} {:>10}", "category", "real", "synthetic");
    for (kind, breakdown) in &report.by_kind {
        println!(
            "{:<14} {:>8} {:>10}",
            kind.as_str(),
            breakdown.real,
            breakdown.synthetic
        );
    }
    println!();
    println!(
        "{} {} real ({} timestamps repaired), {} synthetic removed",
        style("done:").green().bold(),
        report.real,
        report.rewritten,
        report.synthetic
    );

    Ok(())
}
