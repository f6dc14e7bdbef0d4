//! Interaction category enum.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Categories of GitHub interactions we track.
///
/// `ApiCall` is a legacy meta category (a log of our own requests); the
/// remaining variants describe events sourced from the API. `Comment`,
/// `Review` and `Watch` exist in stored data from earlier versions but have
/// no active ingestion path.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum InteractionType {
    #[sea_orm(string_value = "api_call")]
    ApiCall,
    #[sea_orm(string_value = "commit")]
    Commit,
    #[sea_orm(string_value = "pull_request")]
    PullRequest,
    #[sea_orm(string_value = "issue")]
    Issue,
    #[sea_orm(string_value = "comment")]
    Comment,
    #[sea_orm(string_value = "review")]
    Review,
    #[sea_orm(string_value = "fork")]
    Fork,
    #[sea_orm(string_value = "star")]
    Star,
    #[sea_orm(string_value = "watch")]
    Watch,
    #[sea_orm(string_value = "release")]
    Release,
    #[sea_orm(string_value = "workflow_run")]
    WorkflowRun,
}

impl InteractionType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            InteractionType::ApiCall => "api_call",
            InteractionType::Commit => "commit",
            InteractionType::PullRequest => "pull_request",
            InteractionType::Issue => "issue",
            InteractionType::Comment => "comment",
            InteractionType::Review => "review",
            InteractionType::Fork => "fork",
            InteractionType::Star => "star",
            InteractionType::Watch => "watch",
            InteractionType::Release => "release",
            InteractionType::WorkflowRun => "workflow_run",
        }
    }
}

impl std::fmt::Display for InteractionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InteractionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "api_call" => Ok(InteractionType::ApiCall),
            "commit" => Ok(InteractionType::Commit),
            "pull_request" => Ok(InteractionType::PullRequest),
            "issue" => Ok(InteractionType::Issue),
            "comment" => Ok(InteractionType::Comment),
            "review" => Ok(InteractionType::Review),
            "fork" => Ok(InteractionType::Fork),
            "star" => Ok(InteractionType::Star),
            "watch" => Ok(InteractionType::Watch),
            "release" => Ok(InteractionType::Release),
            "workflow_run" => Ok(InteractionType::WorkflowRun),
            other => Err(format!("unknown interaction type '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_stored_string_values() {
        assert_eq!(InteractionType::ApiCall.to_string(), "api_call");
        assert_eq!(InteractionType::PullRequest.to_string(), "pull_request");
        assert_eq!(InteractionType::WorkflowRun.to_string(), "workflow_run");
        assert_eq!(InteractionType::Star.to_string(), "star");
    }

    #[test]
    fn parsing_round_trips_every_variant() {
        use sea_orm::Iterable;
        use std::str::FromStr;

        for kind in InteractionType::iter() {
            assert_eq!(InteractionType::from_str(kind.as_str()), Ok(kind));
        }
        assert!(InteractionType::from_str("starfish").is_err());
    }
}
