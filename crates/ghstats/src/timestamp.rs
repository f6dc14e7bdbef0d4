//! Timestamp resolution for interaction payloads.
//!
//! GitHub payloads carry their event times in different fields per category
//! (commits in `commit.author.date`, stars in `starred_at`, and so on), and
//! some categories may not carry one at all. The resolver scans an ordered
//! candidate list and returns the first value that parses; `None` means "no
//! real timestamp available" and the caller must drop the item rather than
//! substitute an import-time value.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use crate::entity::interaction_type::InteractionType;

/// Candidate timestamp fields scanned by the sweep for records predating
/// per-category payloads (and for categories without a policy entry).
pub const LEGACY_SWEEP_FIELDS: &[&str] = &[
    "created_at",
    "committed_date",
    "authored_date",
    "starred_at",
    "updated_at",
    "pushed_at",
    "published_at",
];

/// Ordered candidate fields per interaction category.
///
/// The order is policy: commits prefer the author date over the committer
/// date, releases prefer the publish time over the tag-creation time.
/// An empty slice means the category has no per-event timestamp of its own.
pub fn candidate_fields(kind: InteractionType) -> &'static [&'static str] {
    match kind {
        InteractionType::Commit => &["author_date", "committer_date"],
        InteractionType::Issue => &["created_at", "updated_at"],
        InteractionType::PullRequest => &["created_at", "updated_at"],
        InteractionType::Star => &["starred_at"],
        InteractionType::Fork => &["created_at"],
        InteractionType::Release => &["published_at", "created_at"],
        InteractionType::WorkflowRun => &["created_at", "updated_at"],
        InteractionType::ApiCall
        | InteractionType::Comment
        | InteractionType::Review
        | InteractionType::Watch => &[],
    }
}

/// Parse a timestamp string as produced by the GitHub API or by earlier
/// versions of this tool.
///
/// Accepts RFC 3339 (with or without fractional seconds), naive datetimes
/// (taken as UTC), a space-separated variant, and bare dates (midnight UTC).
/// Deterministic: never falls back to the current time.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }

    None
}

/// Resolve the event time of a payload from an ordered candidate list.
///
/// Fields are tried strictly in order; the first present, non-empty value
/// that parses wins. Values that are present but unparseable are skipped.
pub fn resolve(payload: &Map<String, Value>, candidates: &[&str]) -> Option<DateTime<Utc>> {
    for field in candidates {
        if let Some(Value::String(raw)) = payload.get(*field)
            && let Some(ts) = parse_timestamp(raw)
        {
            return Some(ts);
        }
    }
    None
}
