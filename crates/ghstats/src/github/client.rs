//! GitHub API client: authenticated requests, pagination, rate limiting.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::error::GitHubError;
use crate::transport::{HttpRequest, HttpTransport, ReqwestTransport};

/// Page size for list endpoints.
pub const PER_PAGE: usize = 100;

/// Safety cap on pages fetched per list call, so a misbehaving endpoint that
/// keeps returning full pages cannot loop forever.
pub const MAX_PAGES: u32 = 100;

/// Remaining-quota threshold below which a warning is logged.
const LOW_QUOTA_WARNING: u64 = 10;

const DEFAULT_ACCEPT: &str = "application/vnd.github.v3+json";

/// Accept media type that makes the stargazers endpoint include `starred_at`.
pub const STARGAZER_ACCEPT: &str = "application/vnd.github.star+json";

/// Configuration for the GitHub client. No ambient globals: callers build
/// one of these and hand it to [`GitHubClient::new`].
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    /// Personal access token used as a bearer credential.
    pub token: String,
    /// API base URL, overridable for GitHub Enterprise or tests.
    pub api_base: String,
}

impl GitHubConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_base: "https://api.github.com".to_string(),
        }
    }

    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
}

/// GitHub API rate limit information (core resource).
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RateLimit {
    pub limit: u64,
    pub remaining: u64,
    pub reset: i64,
    #[serde(default)]
    pub used: u64,
}

impl RateLimit {
    /// The reset instant as a UTC timestamp.
    #[must_use]
    pub fn reset_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.reset, 0).unwrap_or_else(Utc::now)
    }
}

/// Client for the GitHub REST API.
///
/// Stateless apart from the credential holder; all I/O goes through the
/// [`HttpTransport`] seam.
#[derive(Clone)]
pub struct GitHubClient {
    config: GitHubConfig,
    transport: Arc<dyn HttpTransport>,
}

impl GitHubClient {
    /// Create a client backed by a real reqwest transport.
    pub fn new(config: GitHubConfig) -> Self {
        Self::with_transport(config, Arc::new(ReqwestTransport::default()))
    }

    /// Create a client with an explicit transport (used by tests).
    pub fn with_transport(config: GitHubConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self { config, transport }
    }

    fn headers(&self, accept: &str) -> Vec<(String, String)> {
        vec![
            ("Accept".to_string(), accept.to_string()),
            (
                "Authorization".to_string(),
                format!("Bearer {}", self.config.token),
            ),
            (
                "User-Agent".to_string(),
                format!("ghstats/{}", env!("CARGO_PKG_VERSION")),
            ),
        ]
    }

    /// Authenticated GET returning the parsed JSON body.
    ///
    /// `path_and_query` is appended to the configured API base.
    async fn get_json(&self, path_and_query: &str, accept: &str) -> Result<Value, GitHubError> {
        let url = format!("{}{}", self.config.api_base, path_and_query);
        let response = self
            .transport
            .get(HttpRequest {
                url,
                headers: self.headers(accept),
            })
            .await?;

        if response.status == 403
            && let Some(reset) = response
                .header("x-ratelimit-reset")
                .and_then(|v| v.parse::<i64>().ok())
        {
            return Err(GitHubError::RateLimited {
                reset_at: DateTime::from_timestamp(reset, 0).unwrap_or_else(Utc::now),
            });
        }

        if let Some(remaining) = response
            .header("x-ratelimit-remaining")
            .and_then(|v| v.parse::<u64>().ok())
            && remaining < LOW_QUOTA_WARNING
        {
            tracing::warn!(remaining, "low rate limit remaining");
        }

        if !(200..300).contains(&response.status) {
            return Err(GitHubError::Api {
                status: response.status,
                body: String::from_utf8_lossy(&response.body).into_owned(),
            });
        }

        if response.body.is_empty() {
            return Ok(Value::Object(serde_json::Map::new()));
        }

        serde_json::from_slice(&response.body).map_err(|e| GitHubError::Decode(e.to_string()))
    }

    /// Fetch every page of a list endpoint.
    ///
    /// Pages are requested sequentially with `per_page=100`; the loop stops
    /// on the first empty or short page, or at [`MAX_PAGES`]. `items_key`
    /// unwraps envelope responses such as `{"workflow_runs": [...]}`.
    pub async fn list_paginated(
        &self,
        path: &str,
        params: &[(&str, String)],
        items_key: Option<&str>,
        accept: &str,
    ) -> Result<Vec<Value>, GitHubError> {
        let mut items = Vec::new();

        for page in 1..=MAX_PAGES {
            let mut query = String::new();
            for (key, value) in params {
                query.push_str(&format!("{key}={value}&"));
            }
            query.push_str(&format!("per_page={PER_PAGE}&page={page}"));

            let body = self.get_json(&format!("{path}?{query}"), accept).await?;
            let page_items = match items_key {
                Some(key) => body
                    .get(key)
                    .and_then(Value::as_array)
                    .ok_or_else(|| GitHubError::Decode(format!("missing '{key}' array")))?
                    .clone(),
                None => body
                    .as_array()
                    .ok_or_else(|| GitHubError::Decode("expected a JSON array".to_string()))?
                    .clone(),
            };

            let count = page_items.len();
            items.extend(page_items);

            if count < PER_PAGE {
                return Ok(items);
            }
            if page == MAX_PAGES {
                tracing::warn!(path, pages = MAX_PAGES, "stopping at page cap");
            }
        }

        Ok(items)
    }

    /// Get current rate limit status (core API only).
    pub async fn get_rate_limit(&self) -> Result<RateLimit, GitHubError> {
        let body = self.get_json("/rate_limit", DEFAULT_ACCEPT).await?;
        // Some deployments expose "rate", newer ones "resources.core".
        let core = body
            .pointer("/resources/core")
            .or_else(|| body.pointer("/rate"))
            .cloned()
            .ok_or_else(|| GitHubError::Decode("missing rate limit resource".to_string()))?;
        serde_json::from_value(core).map_err(|e| GitHubError::Decode(e.to_string()))
    }

    /// Get organization details.
    pub async fn get_organization(&self, org: &str) -> Result<Value, GitHubError> {
        self.get_json(&format!("/orgs/{org}"), DEFAULT_ACCEPT).await
    }

    /// Get repository details.
    pub async fn get_repository(&self, owner: &str, repo: &str) -> Result<Value, GitHubError> {
        self.get_json(&format!("/repos/{owner}/{repo}"), DEFAULT_ACCEPT)
            .await
    }

    /// List all repositories of an organization.
    pub async fn list_org_repos(&self, org: &str) -> Result<Vec<Value>, GitHubError> {
        self.list_paginated(&format!("/orgs/{org}/repos"), &[], None, DEFAULT_ACCEPT)
            .await
    }

    /// List repository commits, optionally bounded by a time window.
    pub async fn list_commits(
        &self,
        owner: &str,
        repo: &str,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<Value>, GitHubError> {
        let mut params = Vec::new();
        if let Some(since) = since {
            params.push(("since", since.format("%Y-%m-%dT%H:%M:%SZ").to_string()));
        }
        if let Some(until) = until {
            params.push(("until", until.format("%Y-%m-%dT%H:%M:%SZ").to_string()));
        }
        self.list_paginated(
            &format!("/repos/{owner}/{repo}/commits"),
            &params,
            None,
            DEFAULT_ACCEPT,
        )
        .await
    }

    /// List repository issues. Note the endpoint also returns pull requests;
    /// the mapper filters those out.
    pub async fn list_issues(
        &self,
        owner: &str,
        repo: &str,
        state: &str,
    ) -> Result<Vec<Value>, GitHubError> {
        self.list_paginated(
            &format!("/repos/{owner}/{repo}/issues"),
            &[("state", state.to_string())],
            None,
            DEFAULT_ACCEPT,
        )
        .await
    }

    /// List repository pull requests.
    pub async fn list_pulls(
        &self,
        owner: &str,
        repo: &str,
        state: &str,
    ) -> Result<Vec<Value>, GitHubError> {
        self.list_paginated(
            &format!("/repos/{owner}/{repo}/pulls"),
            &[("state", state.to_string())],
            None,
            DEFAULT_ACCEPT,
        )
        .await
    }

    /// List repository stargazers.
    ///
    /// Sent with the star+json media type so each entry carries `starred_at`
    /// (the only candidate timestamp for star events).
    pub async fn list_stargazers(&self, owner: &str, repo: &str) -> Result<Vec<Value>, GitHubError> {
        self.list_paginated(
            &format!("/repos/{owner}/{repo}/stargazers"),
            &[],
            None,
            STARGAZER_ACCEPT,
        )
        .await
    }

    /// List repository forks.
    pub async fn list_forks(&self, owner: &str, repo: &str) -> Result<Vec<Value>, GitHubError> {
        self.list_paginated(
            &format!("/repos/{owner}/{repo}/forks"),
            &[],
            None,
            DEFAULT_ACCEPT,
        )
        .await
    }

    /// List repository releases.
    pub async fn list_releases(&self, owner: &str, repo: &str) -> Result<Vec<Value>, GitHubError> {
        self.list_paginated(
            &format!("/repos/{owner}/{repo}/releases"),
            &[],
            None,
            DEFAULT_ACCEPT,
        )
        .await
    }

    /// List workflow definitions (enveloped under "workflows").
    pub async fn list_workflows(&self, owner: &str, repo: &str) -> Result<Vec<Value>, GitHubError> {
        self.list_paginated(
            &format!("/repos/{owner}/{repo}/actions/workflows"),
            &[],
            Some("workflows"),
            DEFAULT_ACCEPT,
        )
        .await
    }

    /// List workflow runs (enveloped under "workflow_runs").
    pub async fn list_workflow_runs(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<Value>, GitHubError> {
        self.list_paginated(
            &format!("/repos/{owner}/{repo}/actions/runs"),
            &[],
            Some("workflow_runs"),
            DEFAULT_ACCEPT,
        )
        .await
    }
}
