//! Pure mapping from raw GitHub payloads to interaction fields.
//!
//! Each category has its own mapper. Mappers never touch the network or the
//! database and never panic on missing structure: absent nested fields become
//! `None`. The `extra` map keeps every candidate timestamp field for the
//! category (flattened to top-level keys) plus the raw fields worth showing,
//! so the integrity sweep can re-derive the event time offline.

use serde_json::{Map, Value};

use crate::entity::interaction_type::InteractionType;

/// Category-independent fields extracted from one raw payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedInteraction {
    pub user_login: Option<String>,
    pub action: String,
    pub resource_id: Option<String>,
    pub resource_url: Option<String>,
    pub extra: Map<String, Value>,
}

/// Dispatch a payload to its category's mapper.
///
/// `None` means the payload does not belong in this category (a pull request
/// returned by the issues endpoint) or the category has no event payloads.
#[must_use]
pub fn map_payload(kind: InteractionType, payload: &Value) -> Option<MappedInteraction> {
    match kind {
        InteractionType::Commit => Some(map_commit(payload)),
        InteractionType::Issue => map_issue(payload),
        InteractionType::PullRequest => Some(map_pull_request(payload)),
        InteractionType::Star => Some(map_star(payload)),
        InteractionType::Fork => Some(map_fork(payload)),
        InteractionType::Release => Some(map_release(payload)),
        InteractionType::WorkflowRun => Some(map_workflow_run(payload)),
        InteractionType::ApiCall
        | InteractionType::Comment
        | InteractionType::Review
        | InteractionType::Watch => None,
    }
}

/// Map a commit from `/repos/{owner}/{repo}/commits`.
///
/// The author date and committer date live nested under `commit`; both are
/// flattened into `extra` so the resolver sees them as `author_date` /
/// `committer_date`.
#[must_use]
pub fn map_commit(payload: &Value) -> MappedInteraction {
    let mut extra = Map::new();
    copy_string(&mut extra, "author_date", payload.pointer("/commit/author/date"));
    copy_string(
        &mut extra,
        "committer_date",
        payload.pointer("/commit/committer/date"),
    );
    copy_string(&mut extra, "message", payload.pointer("/commit/message"));
    copy_string(&mut extra, "sha", payload.get("sha"));

    MappedInteraction {
        user_login: string_at(payload, "/author/login")
            .or_else(|| string_at(payload, "/commit/author/name")),
        action: "commit".to_string(),
        resource_id: string_at(payload, "/sha"),
        resource_url: string_at(payload, "/html_url"),
        extra,
    }
}

/// Map an issue from `/repos/{owner}/{repo}/issues`.
///
/// That endpoint also returns pull requests; those carry a `pull_request`
/// key and are rejected here so they are only counted by the PR tracker.
#[must_use]
pub fn map_issue(payload: &Value) -> Option<MappedInteraction> {
    if payload.get("pull_request").is_some() {
        return None;
    }

    let state = string_at(payload, "/state").unwrap_or_else(|| "unknown".to_string());
    let mut extra = Map::new();
    copy_string(&mut extra, "created_at", payload.get("created_at"));
    copy_string(&mut extra, "updated_at", payload.get("updated_at"));
    copy_string(&mut extra, "closed_at", payload.get("closed_at"));
    copy_string(&mut extra, "title", payload.get("title"));
    copy_string(&mut extra, "state", payload.get("state"));
    if let Some(number) = payload.get("number").and_then(Value::as_i64) {
        extra.insert("number".to_string(), number.into());
    }
    let labels: Vec<Value> = payload
        .get("labels")
        .and_then(Value::as_array)
        .map(|labels| {
            labels
                .iter()
                .filter_map(|label| label.get("name").cloned())
                .collect()
        })
        .unwrap_or_default();
    if !labels.is_empty() {
        extra.insert("labels".to_string(), Value::Array(labels));
    }

    Some(MappedInteraction {
        user_login: string_at(payload, "/user/login"),
        action: format!("issue_{state}"),
        resource_id: payload.get("number").and_then(Value::as_i64).map(|n| n.to_string()),
        resource_url: string_at(payload, "/html_url"),
        extra,
    })
}

/// Map a pull request from `/repos/{owner}/{repo}/pulls`.
#[must_use]
pub fn map_pull_request(payload: &Value) -> MappedInteraction {
    let state = string_at(payload, "/state").unwrap_or_else(|| "unknown".to_string());
    let mut extra = Map::new();
    copy_string(&mut extra, "created_at", payload.get("created_at"));
    copy_string(&mut extra, "updated_at", payload.get("updated_at"));
    copy_string(&mut extra, "merged_at", payload.get("merged_at"));
    copy_string(&mut extra, "closed_at", payload.get("closed_at"));
    copy_string(&mut extra, "title", payload.get("title"));
    copy_string(&mut extra, "state", payload.get("state"));
    if let Some(number) = payload.get("number").and_then(Value::as_i64) {
        extra.insert("number".to_string(), number.into());
    }

    MappedInteraction {
        user_login: string_at(payload, "/user/login"),
        action: format!("pr_{state}"),
        resource_id: payload.get("number").and_then(Value::as_i64).map(|n| n.to_string()),
        resource_url: string_at(payload, "/html_url"),
        extra,
    }
}

/// Map a stargazer entry.
///
/// With the star media type each entry is `{"starred_at": ..., "user": {...}}`;
/// without it the entry is the bare user object and carries no timestamp at
/// all. Both shapes are tolerated; the second yields an empty candidate set
/// and the item is later dropped for lack of a real event time.
#[must_use]
pub fn map_star(payload: &Value) -> MappedInteraction {
    let user = payload.get("user").unwrap_or(payload);
    let mut extra = Map::new();
    copy_string(&mut extra, "starred_at", payload.get("starred_at"));

    MappedInteraction {
        user_login: user.get("login").and_then(Value::as_str).map(str::to_string),
        action: "star".to_string(),
        resource_id: user.get("id").and_then(Value::as_i64).map(|id| id.to_string()),
        resource_url: user.get("html_url").and_then(Value::as_str).map(str::to_string),
        extra,
    }
}

/// Map a fork from `/repos/{owner}/{repo}/forks`. The fork's own `created_at`
/// is the event time.
#[must_use]
pub fn map_fork(payload: &Value) -> MappedInteraction {
    let mut extra = Map::new();
    copy_string(&mut extra, "created_at", payload.get("created_at"));
    copy_string(&mut extra, "full_name", payload.get("full_name"));

    MappedInteraction {
        user_login: string_at(payload, "/owner/login"),
        action: "fork".to_string(),
        resource_id: payload.get("id").and_then(Value::as_i64).map(|id| id.to_string()),
        resource_url: string_at(payload, "/html_url"),
        extra,
    }
}

/// Map a release from `/repos/{owner}/{repo}/releases`.
#[must_use]
pub fn map_release(payload: &Value) -> MappedInteraction {
    let mut extra = Map::new();
    copy_string(&mut extra, "published_at", payload.get("published_at"));
    copy_string(&mut extra, "created_at", payload.get("created_at"));
    copy_string(&mut extra, "tag_name", payload.get("tag_name"));
    copy_string(&mut extra, "name", payload.get("name"));

    MappedInteraction {
        user_login: string_at(payload, "/author/login"),
        action: "release".to_string(),
        resource_id: payload.get("id").and_then(Value::as_i64).map(|id| id.to_string()),
        resource_url: string_at(payload, "/html_url"),
        extra,
    }
}

/// Map a workflow run from `/repos/{owner}/{repo}/actions/runs`.
#[must_use]
pub fn map_workflow_run(payload: &Value) -> MappedInteraction {
    let status = string_at(payload, "/status").unwrap_or_else(|| "unknown".to_string());
    let mut extra = Map::new();
    copy_string(&mut extra, "created_at", payload.get("created_at"));
    copy_string(&mut extra, "updated_at", payload.get("updated_at"));
    copy_string(&mut extra, "name", payload.get("name"));
    copy_string(&mut extra, "status", payload.get("status"));
    copy_string(&mut extra, "conclusion", payload.get("conclusion"));
    copy_string(&mut extra, "head_branch", payload.get("head_branch"));

    MappedInteraction {
        user_login: string_at(payload, "/actor/login")
            .or_else(|| string_at(payload, "/triggering_actor/login")),
        action: format!("workflow_{status}"),
        resource_id: payload.get("id").and_then(Value::as_i64).map(|id| id.to_string()),
        resource_url: string_at(payload, "/html_url"),
        extra,
    }
}

fn string_at(payload: &Value, pointer: &str) -> Option<String> {
    payload.pointer(pointer).and_then(Value::as_str).map(str::to_string)
}

fn copy_string(extra: &mut Map<String, Value>, key: &str, value: Option<&Value>) {
    if let Some(Value::String(s)) = value {
        extra.insert(key.to_string(), Value::String(s.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestamp::{candidate_fields, resolve};
    use serde_json::json;

    #[test]
    fn commit_flattens_both_dates_and_resolves_to_author_date() {
        let payload = json!({
            "sha": "abc123",
            "html_url": "https://github.com/acme/widgets/commit/abc123",
            "author": {"login": "alice"},
            "commit": {
                "message": "fix parser",
                "author": {"name": "Alice", "date": "2024-03-01T10:00:00Z"},
                "committer": {"name": "Bob", "date": "2024-03-02T11:00:00Z"},
            },
        });

        let mapped = map_commit(&payload);
        assert_eq!(mapped.user_login.as_deref(), Some("alice"));
        assert_eq!(mapped.action, "commit");
        assert_eq!(mapped.resource_id.as_deref(), Some("abc123"));
        assert_eq!(mapped.extra["message"], "fix parser");

        let ts = resolve(&mapped.extra, candidate_fields(InteractionType::Commit))
            .expect("author date");
        assert_eq!(ts.to_rfc3339(), "2024-03-01T10:00:00+00:00");
    }

    #[test]
    fn commit_without_github_account_falls_back_to_git_author_name() {
        let payload = json!({
            "sha": "def456",
            "author": null,
            "commit": {"author": {"name": "Drive-by", "date": "2024-01-01T00:00:00Z"}},
        });

        let mapped = map_commit(&payload);
        assert_eq!(mapped.user_login.as_deref(), Some("Drive-by"));
        assert!(mapped.resource_url.is_none());
    }

    #[test]
    fn issue_mapper_rejects_pull_request_shaped_items() {
        let pr_shaped = json!({
            "number": 5,
            "state": "open",
            "created_at": "2024-02-01T00:00:00Z",
            "pull_request": {"url": "https://api.github.com/repos/acme/widgets/pulls/5"},
        });
        assert!(map_issue(&pr_shaped).is_none());

        let issue = json!({
            "number": 6,
            "state": "closed",
            "title": "crash on empty input",
            "created_at": "2024-02-01T00:00:00Z",
            "labels": [{"name": "bug"}, {"name": "parser"}],
            "user": {"login": "carol"},
        });
        let mapped = map_issue(&issue).expect("real issue");
        assert_eq!(mapped.action, "issue_closed");
        assert_eq!(mapped.resource_id.as_deref(), Some("6"));
        assert_eq!(mapped.extra["labels"], json!(["bug", "parser"]));
    }

    #[test]
    fn pull_request_action_carries_state() {
        let payload = json!({
            "number": 12,
            "state": "open",
            "title": "add retry",
            "created_at": "2024-02-10T00:00:00Z",
            "merged_at": null,
            "user": {"login": "dave"},
        });

        let mapped = map_pull_request(&payload);
        assert_eq!(mapped.action, "pr_open");
        assert_eq!(mapped.user_login.as_deref(), Some("dave"));
        assert!(!mapped.extra.contains_key("merged_at"));
    }

    #[test]
    fn star_mapper_tolerates_both_payload_shapes() {
        let with_envelope = json!({
            "starred_at": "2024-01-15T08:30:00Z",
            "user": {"login": "erin", "id": 42},
        });
        let mapped = map_star(&with_envelope);
        assert_eq!(mapped.user_login.as_deref(), Some("erin"));
        assert_eq!(mapped.extra["starred_at"], "2024-01-15T08:30:00Z");

        // Bare user object: no timestamp candidates at all.
        let bare = json!({"login": "frank", "id": 43});
        let mapped = map_star(&bare);
        assert_eq!(mapped.user_login.as_deref(), Some("frank"));
        assert!(resolve(&mapped.extra, candidate_fields(InteractionType::Star)).is_none());
    }

    #[test]
    fn fork_release_and_workflow_labels() {
        let fork = map_fork(&json!({
            "id": 99,
            "full_name": "frank/widgets",
            "created_at": "2024-04-01T00:00:00Z",
            "owner": {"login": "frank"},
        }));
        assert_eq!(fork.action, "fork");
        assert_eq!(fork.resource_id.as_deref(), Some("99"));

        let release = map_release(&json!({
            "id": 7,
            "tag_name": "v1.2.0",
            "published_at": "2024-05-01T00:00:00Z",
            "created_at": "2024-04-30T00:00:00Z",
            "author": {"login": "alice"},
        }));
        assert_eq!(release.action, "release");
        assert_eq!(release.extra["tag_name"], "v1.2.0");

        let run = map_workflow_run(&json!({
            "id": 1001,
            "name": "CI",
            "status": "completed",
            "conclusion": "success",
            "created_at": "2024-06-01T00:00:00Z",
            "actor": {"login": "bob"},
        }));
        assert_eq!(run.action, "workflow_completed");
        assert_eq!(run.extra["conclusion"], "success");
    }

    #[test]
    fn missing_structure_never_panics() {
        for payload in [json!({}), json!(null), json!("string"), json!(12)] {
            let mapped = map_commit(&payload);
            assert!(mapped.user_login.is_none());
            assert!(mapped.extra.is_empty());
            let _ = map_pull_request(&payload);
            let _ = map_star(&payload);
            let _ = map_fork(&payload);
            let _ = map_release(&payload);
            let _ = map_workflow_run(&payload);
            assert!(map_issue(&payload).is_some());
        }
    }

    #[test]
    fn dispatch_covers_event_categories_only() {
        let payload = json!({"created_at": "2024-01-01T00:00:00Z"});
        assert!(map_payload(InteractionType::Fork, &payload).is_some());
        assert!(map_payload(InteractionType::ApiCall, &payload).is_none());
        assert!(map_payload(InteractionType::Watch, &payload).is_none());
    }
}
