//! GitHub REST API gateway.

mod client;
mod error;

pub use client::{GitHubClient, GitHubConfig, RateLimit, MAX_PAGES, PER_PAGE, STARGAZER_ACCEPT};
pub use error::GitHubError;
