//! Tracking orchestrator: fetches GitHub activity and persists it.
//!
//! One transaction per category fetch. Items whose payload yields no
//! upstream timestamp are skipped, not backfilled with the import time, so
//! every stored row carries a real event time.

use std::collections::BTreeMap;

use sea_orm::{
    ActiveModelTrait, DatabaseConnection, DbErr, IntoActiveModel, NotSet, Set, TransactionTrait,
};
use serde_json::Value;
use thiserror::Error;

use crate::entity::interaction_type::InteractionType;
use crate::entity::{interaction, organization, repository};
use crate::github::{GitHubClient, GitHubError};
use crate::mapper;
use crate::registry::{self, split_full_name, RegistryError};
use crate::timestamp::{self, candidate_fields};

#[derive(Debug, Error)]
pub enum TrackError {
    #[error("github api error: {0}")]
    GitHub(#[from] GitHubError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("database error: {0}")]
    Db(#[from] DbErr),
}

/// Result of tracking an organization's details.
#[derive(Debug, Clone)]
pub struct TrackedOrganization {
    pub organization: organization::Model,
    /// Whether the remote organization was reachable.
    pub exists: bool,
    pub error: Option<String>,
}

/// Result of tracking a repository's details.
#[derive(Debug, Clone)]
pub struct TrackedRepository {
    pub repository: repository::Model,
    /// Whether the remote repository was reachable.
    pub exists: bool,
    pub error: Option<String>,
}

/// Outcome of a full-activity pass over one repository.
///
/// A failing category contributes zero items and an error string; it never
/// aborts the remaining categories.
#[derive(Debug, Clone, Default)]
pub struct ActivityReport {
    pub counts: BTreeMap<InteractionType, usize>,
    pub errors: Vec<String>,
}

impl ActivityReport {
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

/// Fetches activity from GitHub and records it as interactions.
pub struct InteractionTracker {
    db: DatabaseConnection,
    client: GitHubClient,
    log_api_calls: bool,
}

impl InteractionTracker {
    pub fn new(db: DatabaseConnection, client: GitHubClient) -> Self {
        Self {
            db,
            client,
            log_api_calls: false,
        }
    }

    /// Enable recording of "api_call" meta interactions for detail fetches.
    /// Off by default; even when on, a meta row is only written when the
    /// fetched payload itself provides a timestamp.
    #[must_use]
    pub fn with_api_call_logging(mut self, enabled: bool) -> Self {
        self.log_api_calls = enabled;
        self
    }

    /// Ensure an organization row exists and refresh its details.
    ///
    /// The local row is always created; a failed detail fetch is reported in
    /// the result, not as an `Err`. `Err` is reserved for storage failures.
    pub async fn track_organization(
        &self,
        name: &str,
    ) -> Result<TrackedOrganization, TrackError> {
        let org = registry::get_or_create_organization(&self.db, name).await?;

        match self.client.get_organization(name).await {
            Ok(detail) => {
                let mut active = org.into_active_model();
                if let Some(github_id) = detail.get("id").and_then(Value::as_i64) {
                    active.github_id = Set(Some(github_id));
                }
                if let Some(description) = detail.get("description").and_then(Value::as_str) {
                    active.description = Set(Some(description.to_string()));
                }
                let now = chrono::Utc::now();
                active.last_synced_at = Set(Some(now));
                active.updated_at = Set(now);
                let organization = active.update(&self.db).await.map_err(RegistryError::from)?;

                if self.log_api_calls {
                    self.record_api_call(Some(organization.id), None, &detail)
                        .await?;
                }

                Ok(TrackedOrganization {
                    organization,
                    exists: true,
                    error: None,
                })
            }
            Err(err) => {
                tracing::warn!(organization = name, error = %err, "detail fetch failed");
                Ok(TrackedOrganization {
                    organization: org,
                    exists: false,
                    error: Some(err.to_string()),
                })
            }
        }
    }

    /// Ensure a repository row exists and refresh its details.
    pub async fn track_repository(
        &self,
        identifier: &str,
        org_hint: Option<&str>,
    ) -> Result<TrackedRepository, TrackError> {
        let repo = registry::get_or_create_repository(&self.db, identifier, org_hint).await?;

        let (owner, name) = match split_full_name(&repo.full_name) {
            (Some(owner), name) => (owner.to_string(), name.to_string()),
            (None, name) => {
                // No owner known: the detail endpoint cannot be addressed.
                return Ok(TrackedRepository {
                    repository: repo.clone(),
                    exists: false,
                    error: Some(format!("no owner known for '{name}'")),
                });
            }
        };

        match self.client.get_repository(&owner, &name).await {
            Ok(detail) => {
                let repo_id = repo.id;
                let mut active = repo.into_active_model();
                if let Some(github_id) = detail.get("id").and_then(Value::as_i64) {
                    active.github_id = Set(Some(github_id));
                }
                if let Some(description) = detail.get("description").and_then(Value::as_str) {
                    active.description = Set(Some(description.to_string()));
                }
                if let Some(private) = detail.get("private").and_then(Value::as_bool) {
                    active.is_private = Set(private);
                }
                let now = chrono::Utc::now();
                active.last_synced_at = Set(Some(now));
                active.updated_at = Set(now);
                let repository = active.update(&self.db).await.map_err(RegistryError::from)?;

                if self.log_api_calls {
                    self.record_api_call(repository.organization_id, Some(repo_id), &detail)
                        .await?;
                }

                Ok(TrackedRepository {
                    repository,
                    exists: true,
                    error: None,
                })
            }
            Err(err) => {
                tracing::warn!(repository = %repo.full_name, error = %err, "detail fetch failed");
                Ok(TrackedRepository {
                    repository: repo,
                    exists: false,
                    error: Some(err.to_string()),
                })
            }
        }
    }

    /// Track commits, optionally bounded to a `since`/`until` window. Both
    /// bounds are forwarded to the commits endpoint, so out-of-window commits
    /// are never fetched at all.
    pub async fn track_commits(
        &self,
        owner: &str,
        repo: &str,
        since: Option<chrono::DateTime<chrono::Utc>>,
        until: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Result<Vec<interaction::Model>, TrackError> {
        let payloads = self.client.list_commits(owner, repo, since, until).await?;
        self.persist(owner, repo, InteractionType::Commit, &payloads)
            .await
    }

    pub async fn track_issues(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<interaction::Model>, TrackError> {
        let payloads = self.client.list_issues(owner, repo, "all").await?;
        self.persist(owner, repo, InteractionType::Issue, &payloads)
            .await
    }

    pub async fn track_pull_requests(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<interaction::Model>, TrackError> {
        let payloads = self.client.list_pulls(owner, repo, "all").await?;
        self.persist(owner, repo, InteractionType::PullRequest, &payloads)
            .await
    }

    pub async fn track_stars(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<interaction::Model>, TrackError> {
        let payloads = self.client.list_stargazers(owner, repo).await?;
        self.persist(owner, repo, InteractionType::Star, &payloads)
            .await
    }

    pub async fn track_forks(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<interaction::Model>, TrackError> {
        let payloads = self.client.list_forks(owner, repo).await?;
        self.persist(owner, repo, InteractionType::Fork, &payloads)
            .await
    }

    pub async fn track_releases(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<interaction::Model>, TrackError> {
        let payloads = self.client.list_releases(owner, repo).await?;
        self.persist(owner, repo, InteractionType::Release, &payloads)
            .await
    }

    pub async fn track_workflow_runs(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<interaction::Model>, TrackError> {
        let payloads = self.client.list_workflow_runs(owner, repo).await?;
        self.persist(owner, repo, InteractionType::WorkflowRun, &payloads)
            .await
    }

    /// Run every activity category against one repository.
    pub async fn track_repository_activity(&self, owner: &str, repo: &str) -> ActivityReport {
        let mut report = ActivityReport::default();

        let runs: [(InteractionType, Result<Vec<interaction::Model>, TrackError>); 7] = [
            (
                InteractionType::Commit,
                self.track_commits(owner, repo, None, None).await,
            ),
            (InteractionType::Issue, self.track_issues(owner, repo).await),
            (
                InteractionType::PullRequest,
                self.track_pull_requests(owner, repo).await,
            ),
            (InteractionType::Star, self.track_stars(owner, repo).await),
            (InteractionType::Fork, self.track_forks(owner, repo).await),
            (InteractionType::Release, self.track_releases(owner, repo).await),
            (
                InteractionType::WorkflowRun,
                self.track_workflow_runs(owner, repo).await,
            ),
        ];

        for (kind, result) in runs {
            match result {
                Ok(saved) => {
                    report.counts.insert(kind, saved.len());
                }
                Err(err) => {
                    tracing::error!(%kind, repository = %format!("{owner}/{repo}"), error = %err, "category failed");
                    report.counts.insert(kind, 0);
                    report.errors.push(format!("{kind}: {err}"));
                }
            }
        }

        report
    }

    /// Map, resolve and insert one category's payloads in a single
    /// transaction. Only rows with an upstream-derived timestamp survive.
    async fn persist(
        &self,
        owner: &str,
        repo: &str,
        kind: InteractionType,
        payloads: &[Value],
    ) -> Result<Vec<interaction::Model>, TrackError> {
        let full_name = format!("{owner}/{repo}");
        let txn = self.db.begin().await?;
        let repository = registry::get_or_create_repository(&txn, &full_name, None).await?;

        let mut saved = Vec::with_capacity(payloads.len());
        for payload in payloads {
            let Some(mapped) = mapper::map_payload(kind, payload) else {
                continue;
            };
            let Some(ts) = timestamp::resolve(&mapped.extra, candidate_fields(kind)) else {
                tracing::debug!(
                    %kind,
                    repository = %full_name,
                    resource = mapped.resource_id.as_deref().unwrap_or("?"),
                    "skipping item without an upstream timestamp"
                );
                continue;
            };

            let model = interaction::ActiveModel {
                id: NotSet,
                kind: Set(kind),
                repository_id: Set(Some(repository.id)),
                organization_id: Set(repository.organization_id),
                timestamp: Set(ts),
                user_login: Set(mapped.user_login),
                action: Set(Some(mapped.action)),
                resource_id: Set(mapped.resource_id),
                resource_url: Set(mapped.resource_url),
                extra_data: Set(Some(Value::Object(mapped.extra))),
            }
            .insert(&txn)
            .await?;
            saved.push(model);
        }

        txn.commit().await?;
        tracing::debug!(%kind, repository = %full_name, fetched = payloads.len(), saved = saved.len(), "category persisted");
        Ok(saved)
    }

    /// Record a meta interaction for a detail fetch. Skipped silently when
    /// the payload carries no usable timestamp.
    async fn record_api_call(
        &self,
        organization_id: Option<i32>,
        repository_id: Option<i32>,
        detail: &Value,
    ) -> Result<(), TrackError> {
        let Some(payload) = detail.as_object() else {
            return Ok(());
        };
        let Some(ts) = timestamp::resolve(payload, &["updated_at", "created_at"]) else {
            return Ok(());
        };

        self.insert_api_call(organization_id, repository_id, ts)
            .await
    }

    async fn insert_api_call(
        &self,
        organization_id: Option<i32>,
        repository_id: Option<i32>,
        ts: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), TrackError> {
        interaction::ActiveModel {
            id: NotSet,
            kind: Set(InteractionType::ApiCall),
            repository_id: Set(repository_id),
            organization_id: Set(organization_id),
            timestamp: Set(ts),
            user_login: Set(None),
            action: Set(Some("api_call".to_string())),
            resource_id: Set(None),
            resource_url: Set(None),
            extra_data: Set(None),
        }
        .insert(&self.db)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_and_migrate;
    use crate::github::GitHubConfig;
    use crate::transport::{HttpResponse, MockTransport};
    use sea_orm::{EntityTrait, PaginatorTrait};
    use serde_json::json;
    use std::sync::Arc;

    const BASE: &str = "https://api.github.com";

    async fn tracker(transport: &MockTransport) -> InteractionTracker {
        let db = connect_and_migrate("sqlite::memory:").await.expect("db");
        let client = GitHubClient::with_transport(
            GitHubConfig::new("test-token"),
            Arc::new(transport.clone()),
        );
        InteractionTracker::new(db, client)
    }

    fn commit_payload(sha: &str, date: &str) -> serde_json::Value {
        json!({
            "sha": sha,
            "html_url": format!("https://github.com/acme/widgets/commit/{sha}"),
            "author": {"login": "alice"},
            "commit": {
                "message": "change",
                "author": {"name": "Alice", "date": date},
                "committer": {"name": "Bob", "date": "2024-03-09T00:00:00Z"},
            },
        })
    }

    #[tokio::test]
    async fn commits_round_trip_with_author_date_timestamps() {
        let transport = MockTransport::new();
        transport.push_json(
            format!("{BASE}/repos/acme/widgets/commits?per_page=100&page=1"),
            &json!([
                commit_payload("abc", "2024-03-01T10:00:00Z"),
                commit_payload("def", "2024-03-02T10:00:00Z"),
            ]),
        );

        let tracker = tracker(&transport).await;
        let saved = tracker
            .track_commits("acme", "widgets", None, None)
            .await
            .expect("save");
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[0].kind, InteractionType::Commit);
        assert_eq!(
            saved[0].timestamp.to_rfc3339(),
            "2024-03-01T10:00:00+00:00"
        );
        assert_eq!(saved[0].resource_id.as_deref(), Some("abc"));
        assert_eq!(saved[0].action.as_deref(), Some("commit"));
        assert!(saved[0].repository_id.is_some());
        assert!(saved[0].organization_id.is_some());
    }

    #[tokio::test]
    async fn commit_window_bounds_reach_the_commits_endpoint() {
        let transport = MockTransport::new();
        transport.push_json(
            format!(
                "{BASE}/repos/acme/widgets/commits?since=2024-01-01T00:00:00Z&until=2024-02-01T00:00:00Z&per_page=100&page=1"
            ),
            &json!([commit_payload("abc", "2024-01-10T10:00:00Z")]),
        );

        let tracker = tracker(&transport).await;
        let saved = tracker
            .track_commits(
                "acme",
                "widgets",
                crate::timestamp::parse_timestamp("2024-01-01T00:00:00Z"),
                crate::timestamp::parse_timestamp("2024-02-01T00:00:00Z"),
            )
            .await
            .expect("save");
        assert_eq!(saved.len(), 1);

        let requests = transport.requests();
        assert!(requests[0].url.contains("since=2024-01-01T00:00:00Z"));
        assert!(requests[0].url.contains("until=2024-02-01T00:00:00Z"));
    }

    #[tokio::test]
    async fn stargazers_without_starred_at_are_skipped() {
        let transport = MockTransport::new();
        transport.push_json(
            format!("{BASE}/repos/acme/widgets/stargazers?per_page=100&page=1"),
            &json!([
                {"starred_at": "2024-01-15T08:30:00Z", "user": {"login": "erin", "id": 1}},
                {"login": "bare-user", "id": 2},
            ]),
        );

        let tracker = tracker(&transport).await;
        let saved = tracker.track_stars("acme", "widgets").await.expect("save");
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].user_login.as_deref(), Some("erin"));
    }

    #[tokio::test]
    async fn issues_tracking_filters_pull_request_shaped_items() {
        let transport = MockTransport::new();
        transport.push_json(
            format!("{BASE}/repos/acme/widgets/issues?state=all&per_page=100&page=1"),
            &json!([
                {
                    "number": 1,
                    "state": "open",
                    "title": "real issue",
                    "created_at": "2024-02-01T00:00:00Z",
                    "user": {"login": "carol"},
                },
                {
                    "number": 2,
                    "state": "open",
                    "created_at": "2024-02-02T00:00:00Z",
                    "pull_request": {"url": "..."},
                },
            ]),
        );

        let tracker = tracker(&transport).await;
        let saved = tracker.track_issues("acme", "widgets").await.expect("save");
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].action.as_deref(), Some("issue_open"));
    }

    #[tokio::test]
    async fn track_repository_reports_unreachable_remote_without_failing() {
        let transport = MockTransport::new();
        transport.push_response(
            format!("{BASE}/repos/acme/gone"),
            HttpResponse {
                status: 404,
                headers: Vec::new(),
                body: b"{\"message\":\"Not Found\"}".to_vec(),
            },
        );

        let tracker = tracker(&transport).await;
        let tracked = tracker
            .track_repository("acme/gone", None)
            .await
            .expect("local row");
        assert!(!tracked.exists);
        assert!(tracked.error.is_some());
        assert_eq!(tracked.repository.full_name, "acme/gone");
        assert!(tracked.repository.last_synced_at.is_none());
    }

    #[tokio::test]
    async fn track_repository_upserts_details_on_success() {
        let transport = MockTransport::new();
        transport.push_json(
            format!("{BASE}/repos/acme/widgets"),
            &json!({
                "id": 12345,
                "full_name": "acme/widgets",
                "description": "widget factory",
                "private": true,
            }),
        );

        let tracker = tracker(&transport).await;
        let tracked = tracker
            .track_repository("acme/widgets", None)
            .await
            .expect("tracked");
        assert!(tracked.exists);
        assert_eq!(tracked.repository.github_id, Some(12345));
        assert_eq!(tracked.repository.description.as_deref(), Some("widget factory"));
        assert!(tracked.repository.is_private);
        assert!(tracked.repository.last_synced_at.is_some());
    }

    #[tokio::test]
    async fn track_organization_creates_row_even_when_remote_fetch_fails() {
        let transport = MockTransport::new();
        transport.push_response(
            format!("{BASE}/orgs/acme"),
            HttpResponse {
                status: 500,
                headers: Vec::new(),
                body: b"boom".to_vec(),
            },
        );

        let tracker = tracker(&transport).await;
        let tracked = tracker.track_organization("acme").await.expect("local row");
        assert!(!tracked.exists);
        assert_eq!(tracked.organization.name, "acme");
        assert!(tracked.organization.github_id.is_none());
    }

    #[tokio::test]
    async fn activity_report_contains_failures_without_aborting_siblings() {
        let transport = MockTransport::new();
        transport.push_json(
            format!("{BASE}/repos/acme/widgets/commits?per_page=100&page=1"),
            &json!([commit_payload("abc", "2024-03-01T10:00:00Z")]),
        );
        // Issues endpoint fails; every other category returns empty pages.
        transport.push_response(
            format!("{BASE}/repos/acme/widgets/issues?state=all&per_page=100&page=1"),
            HttpResponse {
                status: 500,
                headers: Vec::new(),
                body: b"server error".to_vec(),
            },
        );
        transport.push_json(
            format!("{BASE}/repos/acme/widgets/pulls?state=all&per_page=100&page=1"),
            &json!([]),
        );
        for path in ["stargazers", "forks", "releases", "actions/runs"] {
            let body = if path == "actions/runs" {
                json!({"total_count": 0, "workflow_runs": []})
            } else {
                json!([])
            };
            transport.push_json(
                format!("{BASE}/repos/acme/widgets/{path}?per_page=100&page=1"),
                &body,
            );
        }

        let tracker = tracker(&transport).await;
        let report = tracker.track_repository_activity("acme", "widgets").await;

        assert_eq!(report.counts[&InteractionType::Commit], 1);
        assert_eq!(report.counts[&InteractionType::Issue], 0);
        assert_eq!(report.total(), 1);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].starts_with("issue:"));
    }

    #[tokio::test]
    async fn api_call_logging_is_off_by_default() {
        let transport = MockTransport::new();
        transport.push_json(
            format!("{BASE}/orgs/acme"),
            &json!({"id": 1, "login": "acme", "updated_at": "2024-01-01T00:00:00Z"}),
        );

        let tracker = tracker(&transport).await;
        tracker.track_organization("acme").await.expect("tracked");

        let count = crate::entity::prelude::Interaction::find()
            .count(tracker_db(&tracker))
            .await
            .expect("count");
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn api_call_logging_records_meta_row_when_enabled() {
        let transport = MockTransport::new();
        transport.push_json(
            format!("{BASE}/orgs/acme"),
            &json!({"id": 1, "login": "acme", "updated_at": "2024-01-01T00:00:00Z"}),
        );

        let tracker = tracker(&transport).await.with_api_call_logging(true);
        tracker.track_organization("acme").await.expect("tracked");

        let rows = crate::entity::prelude::Interaction::find()
            .all(tracker_db(&tracker))
            .await
            .expect("rows");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].kind, InteractionType::ApiCall);
        assert_eq!(rows[0].timestamp.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    fn tracker_db(tracker: &InteractionTracker) -> &sea_orm::DatabaseConnection {
        &tracker.db
    }
}
