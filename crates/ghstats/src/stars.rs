//! Aggregate star counts.
//!
//! Individual star interactions only exist for events with a real
//! `starred_at`; the per-repository count is the user-facing number and is
//! computed here straight from the interactions table.

use std::collections::HashMap;

use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, FromQueryResult, QueryFilter, QuerySelect,
};

use crate::entity::interaction_type::InteractionType;
use crate::entity::{interaction, organization, repository};

/// Star count for one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoStarCount {
    pub repository: String,
    pub organization: Option<String>,
    pub stars: u64,
}

/// Count star interactions grouped by repository, most-starred first.
///
/// Star rows that never got linked to a repository are not reported.
pub async fn star_counts_by_repository(
    db: &DatabaseConnection,
) -> Result<Vec<RepoStarCount>, DbErr> {
    #[derive(FromQueryResult)]
    struct CountRow {
        repository_id: Option<i32>,
        stars: i64,
    }

    let counts = interaction::Entity::find()
        .select_only()
        .column(interaction::Column::RepositoryId)
        .column_as(interaction::Column::Id.count(), "stars")
        .filter(interaction::Column::Kind.eq(InteractionType::Star))
        .group_by(interaction::Column::RepositoryId)
        .into_model::<CountRow>()
        .all(db)
        .await?;

    let repositories: HashMap<i32, repository::Model> = repository::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|repo| (repo.id, repo))
        .collect();
    let organizations: HashMap<i32, String> = organization::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|org| (org.id, org.name))
        .collect();

    let mut results: Vec<RepoStarCount> = counts
        .into_iter()
        .filter_map(|row| {
            let repo = repositories.get(&row.repository_id?)?;
            Some(RepoStarCount {
                repository: repo.full_name.clone(),
                organization: repo
                    .organization_id
                    .and_then(|id| organizations.get(&id).cloned()),
                stars: row.stars.max(0) as u64,
            })
        })
        .collect();

    results.sort_by(|a, b| b.stars.cmp(&a.stars).then_with(|| a.repository.cmp(&b.repository)));
    Ok(results)
}
