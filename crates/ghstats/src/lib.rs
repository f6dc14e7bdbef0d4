//! ghstats - GitHub interaction tracking.
//!
//! This library fetches activity from the GitHub REST API (commits, issues,
//! pull requests, stars, forks, releases, workflow runs) and records each
//! event as an interaction row with an upstream-derived timestamp. Events
//! whose payload carries no real timestamp are never stored, and the
//! integrity sweep removes or repairs rows written by earlier versions that
//! fabricated timestamps at import time.
//!
//! # Example
//!
//! ```ignore
//! use ghstats::{connect_and_migrate, GitHubClient, GitHubConfig, InteractionTracker};
//!
//! let db = connect_and_migrate("sqlite://ghstats.db?mode=rwc").await?;
//! let client = GitHubClient::new(GitHubConfig::new(token));
//! let tracker = InteractionTracker::new(db.clone(), client);
//!
//! let report = tracker.track_repository_activity("acme", "widgets").await;
//! println!("recorded {} interactions", report.total());
//! ```

pub mod db;
pub mod entity;
pub mod github;
pub mod mapper;
pub mod migration;
pub mod registry;
pub mod stars;
pub mod stats;
pub mod sweep;
pub mod timestamp;
pub mod tracker;
pub mod transport;

pub use db::{connect, connect_and_migrate, data_counts, DataCounts};
pub use entity::prelude::*;
pub use github::{GitHubClient, GitHubConfig, GitHubError, RateLimit};
pub use registry::RegistryError;
pub use stars::{star_counts_by_repository, RepoStarCount};
pub use stats::{
    interaction_stats, list_organizations, list_repositories, KindCount, StatsFilter,
};
pub use sweep::{sweep, SweepError, SweepReport};
pub use tracker::{
    ActivityReport, InteractionTracker, TrackError, TrackedOrganization, TrackedRepository,
};
pub use transport::{HttpTransport, ReqwestTransport};
