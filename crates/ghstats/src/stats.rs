//! Read-only reporting queries over stored interactions.
//!
//! These back the CLI's listing commands: interaction counts grouped by
//! category (filterable by organization, repository, category and recency)
//! and plain listings of tracked organizations and repositories.

use chrono::{Duration, Utc};
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, FromQueryResult, QueryFilter, QueryOrder,
    QuerySelect,
};

use crate::entity::interaction_type::InteractionType;
use crate::entity::{interaction, organization, repository};

/// Filters for [`interaction_stats`]. All fields are optional and combine
/// with AND.
#[derive(Debug, Clone, Default)]
pub struct StatsFilter {
    /// Restrict to one organization (by login).
    pub organization: Option<String>,
    /// Restrict to one repository (by full name).
    pub repository: Option<String>,
    /// Restrict to one interaction category.
    pub kind: Option<InteractionType>,
    /// Only interactions from the last N days.
    pub days: Option<i64>,
}

/// Interaction count for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindCount {
    pub kind: InteractionType,
    pub count: u64,
}

/// Count stored interactions grouped by category, largest group first.
///
/// A filter naming an organization or repository that is not tracked yields
/// an empty result rather than an error.
pub async fn interaction_stats(
    db: &DatabaseConnection,
    filter: &StatsFilter,
) -> Result<Vec<KindCount>, DbErr> {
    #[derive(FromQueryResult)]
    struct CountRow {
        kind: InteractionType,
        count: i64,
    }

    let mut query = interaction::Entity::find()
        .select_only()
        .column(interaction::Column::Kind)
        .column_as(interaction::Column::Id.count(), "count")
        .group_by(interaction::Column::Kind);

    if let Some(name) = &filter.organization {
        let Some(org) = organization::Entity::find()
            .filter(organization::Column::Name.eq(name))
            .one(db)
            .await?
        else {
            return Ok(Vec::new());
        };
        query = query.filter(interaction::Column::OrganizationId.eq(org.id));
    }

    if let Some(full_name) = &filter.repository {
        let Some(repo) = repository::Entity::find()
            .filter(repository::Column::FullName.eq(full_name))
            .one(db)
            .await?
        else {
            return Ok(Vec::new());
        };
        query = query.filter(interaction::Column::RepositoryId.eq(repo.id));
    }

    if let Some(kind) = filter.kind {
        query = query.filter(interaction::Column::Kind.eq(kind));
    }

    if let Some(days) = filter.days {
        let cutoff = Utc::now() - Duration::days(days);
        query = query.filter(interaction::Column::Timestamp.gte(cutoff));
    }

    let mut counts: Vec<KindCount> = query
        .into_model::<CountRow>()
        .all(db)
        .await?
        .into_iter()
        .map(|row| KindCount {
            kind: row.kind,
            count: row.count.max(0) as u64,
        })
        .collect();

    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.kind.cmp(&b.kind)));
    Ok(counts)
}

/// List all tracked organizations, sorted by name.
pub async fn list_organizations(
    db: &DatabaseConnection,
) -> Result<Vec<organization::Model>, DbErr> {
    organization::Entity::find()
        .order_by_asc(organization::Column::Name)
        .all(db)
        .await
}

/// List tracked repositories, optionally restricted to one organization,
/// sorted by full name.
pub async fn list_repositories(
    db: &DatabaseConnection,
    organization_name: Option<&str>,
) -> Result<Vec<repository::Model>, DbErr> {
    let mut query = repository::Entity::find().order_by_asc(repository::Column::FullName);

    if let Some(name) = organization_name {
        let Some(org) = organization::Entity::find()
            .filter(organization::Column::Name.eq(name))
            .one(db)
            .await?
        else {
            return Ok(Vec::new());
        };
        query = query.filter(repository::Column::OrganizationId.eq(org.id));
    }

    query.all(db).await
}
