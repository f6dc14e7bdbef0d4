//! Interaction entity - one row per externally-sourced event.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::interaction_type::InteractionType;

/// Interaction model.
///
/// `timestamp` is always an upstream-provided event time; rows whose
/// timestamp cannot be re-derived from `extra_data` are removed by the
/// integrity sweep. `extra_data` preserves the category-specific raw fields
/// (including every candidate timestamp field) so re-derivation never needs
/// the live API.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "interactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub kind: InteractionType,
    pub repository_id: Option<i32>,
    pub organization_id: Option<i32>,
    pub timestamp: DateTimeUtc,
    /// Login of the acting user, when the payload names one.
    pub user_login: Option<String>,
    /// Category-specific action label, e.g. "issue_open", "pr_merged".
    pub action: Option<String>,
    /// The remote event's natural id (sha, number, id) as a string.
    pub resource_id: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub resource_url: Option<String>,
    #[sea_orm(column_type = "Json", nullable)]
    pub extra_data: Option<Json>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::repository::Entity",
        from = "Column::RepositoryId",
        to = "super::repository::Column::Id"
    )]
    Repository,
    #[sea_orm(
        belongs_to = "super::organization::Entity",
        from = "Column::OrganizationId",
        to = "super::organization::Column::Id"
    )]
    Organization,
}

impl Related<super::repository::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Repository.def()
    }
}

impl Related<super::organization::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organization.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// The auxiliary payload as a JSON object, empty when absent or not an
    /// object (legacy rows).
    #[must_use]
    pub fn extra_object(&self) -> serde_json::Map<String, serde_json::Value> {
        match &self.extra_data {
            Some(serde_json::Value::Object(map)) => map.clone(),
            _ => serde_json::Map::new(),
        }
    }
}
