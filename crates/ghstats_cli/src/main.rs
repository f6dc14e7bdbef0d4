//! ghstats CLI - command-line interface for the interaction tracker.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use console::Term;
use tracing_subscriber::EnvFilter;

use crate::commands::limits::OutputFormat;

#[derive(Parser)]
#[command(name = "ghstats")]
#[command(version)]
#[command(about = "Track GitHub interactions into a local database")]
#[command(
    long_about = "ghstats records GitHub activity (commits, issues, pull requests, stars, \
forks, releases, workflow runs) as timestamped interactions in a local database. Every \
stored event carries the timestamp GitHub reported for it; the sweep command removes \
rows whose timestamp cannot be derived from their own payload."
)]
#[command(after_long_help = r#"EXAMPLES
    Track one repository's full activity:
        $ ghstats track-repo rust-lang/cargo

    Track an organization and all of its repositories:
        $ ghstats track-org rust-lang --fetch-repos

    Repair or remove interactions with fabricated timestamps:
        $ ghstats sweep

    Show star counts per tracked repository:
        $ ghstats stars

    Show recent interaction counts for one organization:
        $ ghstats stats --org rust-lang --days 30

CONFIGURATION
    ghstats reads configuration from:
      1. ~/.config/ghstats/config.toml (or $XDG_CONFIG_HOME/ghstats/config.toml)
      2. ./ghstats.toml
      3. Environment variables (GHSTATS_* prefix)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    GHSTATS_DATABASE_URL           Database connection string (default: ~/.local/state/ghstats/ghstats.db)
    GHSTATS_GITHUB_TOKEN           GitHub personal access token
    GHSTATS_GITHUB_API_BASE        API base URL (for GitHub Enterprise)
    GHSTATS_GITHUB_LOG_API_CALLS   Record "api_call" meta interactions (true/false)
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
    /// Track an organization's details (and optionally all of its repos)
    TrackOrg {
        /// Organization login
        name: String,

        /// Also fetch the organization's repositories and track each one's
        /// full activity
        #[arg(short = 'r', long)]
        fetch_repos: bool,
    },
    /// Track a repository's details and full activity
    TrackRepo {
        /// Repository as "owner/name" (or a bare name with --org)
        repo: String,

        /// Organization to file the repository under when the name has no
        /// owner part
        #[arg(short = 'o', long)]
        org: Option<String>,
    },
    /// Repair or remove interactions whose timestamps cannot be re-derived
    Sweep,
    /// Show star counts per tracked repository
    Stars,
    /// Show interaction counts grouped by category
    Stats {
        /// Restrict to one organization (by login)
        #[arg(short = 'o', long)]
        org: Option<String>,

        /// Restrict to one repository (by "owner/name")
        #[arg(short = 'r', long)]
        repo: Option<String>,

        /// Restrict to one category (e.g. "commit", "star", "pull_request")
        #[arg(short = 'k', long)]
        kind: Option<ghstats::InteractionType>,

        /// Only interactions from the last N days
        #[arg(short = 'd', long)]
        days: Option<i64>,
    },
    /// List tracked organizations
    ListOrgs,
    /// List tracked repositories
    ListRepos {
        /// Restrict to one organization (by login)
        #[arg(short = 'o', long)]
        org: Option<String>,
    },
    /// Show current rate limit status
    Limits {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
}

#[derive(Subcommand)]
enum MigrateAction {
    /// Apply all pending migrations
    Up,
    /// Rollback the last migration
    Down,
    /// Show migration status
    Status,
    /// Fresh install - drop all tables and reapply migrations
    Fresh,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Structured logging only when not attached to a terminal; interactive
    // runs get plain command output instead.
    if !Term::stdout().is_term() {
        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::new("ghstats=info,ghstats_cli=info"),
        };

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    let config = config::Config::load();
    let cli = Cli::parse();

    let database_url = config
        .database_url()
        .ok_or("Failed to determine database URL")?;

    // For SQLite targets, make sure the parent directory exists.
    if database_url.starts_with("sqlite://") {
        let db_path = database_url.trim_start_matches("sqlite://");
        let db_path = db_path.split('?').next().unwrap_or(db_path);
        let db_path = std::path::Path::new(db_path);

        if db_path.is_relative() && !db_path.as_os_str().is_empty() {
            tracing::warn!(
                "Database path '{}' is relative - behavior depends on current directory",
                db_path.display()
            );
        }

        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
    }

    match cli.command {
        Commands::Migrate { action } => {
            commands::migrate::handle_migrate(action, &database_url).await?;
        }
        Commands::TrackOrg { name, fetch_repos } => {
            commands::track::handle_track_org(&name, fetch_repos, &config, &database_url).await?;
        }
        Commands::TrackRepo { repo, org } => {
            commands::track::handle_track_repo(&repo, org.as_deref(), &config, &database_url)
                .await?;
        }
        Commands::Sweep => {
            commands::sweep::handle_sweep(&database_url).await?;
        }
        Commands::Stars => {
            commands::stars::handle_stars(&database_url).await?;
        }
        Commands::Stats {
            org,
            repo,
            kind,
            days,
        } => {
            let filter = ghstats::StatsFilter {
                organization: org,
                repository: repo,
                kind,
                days,
            };
            commands::stats::handle_stats(&filter, &database_url).await?;
        }
        Commands::ListOrgs => {
            commands::stats::handle_list_orgs(&database_url).await?;
        }
        Commands::ListRepos { org } => {
            commands::stats::handle_list_repos(org.as_deref(), &database_url).await?;
        }
        Commands::Limits { output } => {
            commands::limits::handle_limits(output, &config).await?;
        }
    }

    Ok(())
}
