//! Repository entity - one row per tracked repository.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Repository model. The natural key is `full_name` ("owner/name", unique).
///
/// `organization_id` is nullable: a repository may be tracked before its
/// owning organization is known, and backfilled later.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "repositories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Short repository name (the part after the slash).
    pub name: String,
    /// "owner/name", unique natural key.
    #[sea_orm(unique)]
    pub full_name: String,
    /// Numeric ID assigned by GitHub, filled in once details are fetched.
    pub github_id: Option<i64>,
    pub organization_id: Option<i32>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub is_private: bool,
    /// When details were last fetched from the API.
    pub last_synced_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::organization::Entity",
        from = "Column::OrganizationId",
        to = "super::organization::Column::Id"
    )]
    Organization,
    #[sea_orm(has_many = "super::interaction::Entity")]
    Interaction,
}

impl Related<super::organization::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organization.def()
    }
}

impl Related<super::interaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Interaction.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
