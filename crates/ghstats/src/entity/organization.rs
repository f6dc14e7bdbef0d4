//! Organization entity - one row per tracked GitHub organization.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Organization model. The natural key is `name` (unique, case-sensitive).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "organizations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Organization login, unique natural key.
    #[sea_orm(unique)]
    pub name: String,
    /// Numeric ID assigned by GitHub, filled in once details are fetched.
    pub github_id: Option<i64>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    /// When details were last fetched from the API.
    pub last_synced_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::repository::Entity")]
    Repository,
    #[sea_orm(has_many = "super::interaction::Entity")]
    Interaction,
}

impl Related<super::repository::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Repository.def()
    }
}

impl Related<super::interaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Interaction.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
