//! Entity registry: get-or-create organizations and repositories by their
//! natural keys.
//!
//! Both functions take any [`ConnectionTrait`] so they compose with a caller's
//! transaction. Lookups go by natural key first; an insert that loses a race
//! to a concurrent writer is resolved by re-fetching the existing row.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, NotSet, QueryFilter, Set,
};
use thiserror::Error;

use crate::entity::{organization, repository};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("database error: {0}")]
    Db(#[from] DbErr),
}

/// Split an "owner/name" repository identifier into its owner and short name.
///
/// A bare name (no slash) has no owner. Only the first slash splits, so
/// malformed extra segments stay in the name.
#[must_use]
pub fn split_full_name(identifier: &str) -> (Option<&str>, &str) {
    match identifier.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() => (Some(owner), name),
        _ => (None, identifier),
    }
}

/// Look up an organization by login, creating it if absent.
pub async fn get_or_create_organization<C: ConnectionTrait>(
    conn: &C,
    name: &str,
) -> Result<organization::Model, RegistryError> {
    if let Some(existing) = find_organization(conn, name).await? {
        return Ok(existing);
    }

    let now = Utc::now();
    let inserted = organization::ActiveModel {
        id: NotSet,
        name: Set(name.to_string()),
        github_id: Set(None),
        description: Set(None),
        last_synced_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await;

    match inserted {
        Ok(model) => {
            tracing::debug!(organization = name, "created organization");
            Ok(model)
        }
        // Lost a race on the unique name index: the row exists now.
        Err(err) => match find_organization(conn, name).await? {
            Some(existing) => Ok(existing),
            None => Err(err.into()),
        },
    }
}

/// Look up a repository by its full name, creating it (and its parent
/// organization) if absent.
///
/// `identifier` may be "owner/name" or a bare name; an owner embedded in the
/// identifier wins over `org_hint`. When an owner is known, the organization
/// row is created as a side effect and linked via `organization_id`.
pub async fn get_or_create_repository<C: ConnectionTrait>(
    conn: &C,
    identifier: &str,
    org_hint: Option<&str>,
) -> Result<repository::Model, RegistryError> {
    let (embedded_owner, short_name) = split_full_name(identifier);
    let owner = embedded_owner.or(org_hint);
    let full_name = match owner {
        Some(owner) => format!("{owner}/{short_name}"),
        None => short_name.to_string(),
    };

    if let Some(existing) = find_repository(conn, &full_name).await? {
        return Ok(existing);
    }

    let organization_id = match owner {
        Some(owner) => Some(get_or_create_organization(conn, owner).await?.id),
        None => None,
    };

    let now = Utc::now();
    let inserted = repository::ActiveModel {
        id: NotSet,
        name: Set(short_name.to_string()),
        full_name: Set(full_name.clone()),
        github_id: Set(None),
        organization_id: Set(organization_id),
        description: Set(None),
        is_private: Set(false),
        last_synced_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await;

    match inserted {
        Ok(model) => {
            tracing::debug!(repository = %full_name, "created repository");
            Ok(model)
        }
        Err(err) => match find_repository(conn, &full_name).await? {
            Some(existing) => Ok(existing),
            None => Err(err.into()),
        },
    }
}

async fn find_organization<C: ConnectionTrait>(
    conn: &C,
    name: &str,
) -> Result<Option<organization::Model>, DbErr> {
    organization::Entity::find()
        .filter(organization::Column::Name.eq(name))
        .one(conn)
        .await
}

async fn find_repository<C: ConnectionTrait>(
    conn: &C,
    full_name: &str,
) -> Result<Option<repository::Model>, DbErr> {
    repository::Entity::find()
        .filter(repository::Column::FullName.eq(full_name))
        .one(conn)
        .await
}
