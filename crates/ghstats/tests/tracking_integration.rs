//! Integration tests for the storage-side workflow.
//!
//! Everything here runs against an in-memory SQLite database with the real
//! migrations applied: registry get-or-create semantics, the integrity
//! sweep, the star aggregates, and the table counts the CLI shows.

use chrono::Utc;
use ghstats::entity::interaction::ActiveModel as InteractionActiveModel;
use ghstats::entity::prelude::*;
use ghstats::registry::{get_or_create_organization, get_or_create_repository};
use ghstats::timestamp::parse_timestamp;
use ghstats::{connect_and_migrate, data_counts, star_counts_by_repository, sweep};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, NotSet, PaginatorTrait, Set};
use serde_json::json;

async fn setup_test_db() -> DatabaseConnection {
    connect_and_migrate("sqlite::memory:")
        .await
        .expect("in-memory database should migrate")
}

async fn insert_interaction(
    db: &DatabaseConnection,
    kind: InteractionType,
    repository_id: Option<i32>,
    timestamp: &str,
    extra: serde_json::Value,
) -> InteractionModel {
    InteractionActiveModel {
        id: NotSet,
        kind: Set(kind),
        repository_id: Set(repository_id),
        organization_id: Set(None),
        timestamp: Set(parse_timestamp(timestamp).expect("test timestamp")),
        user_login: Set(None),
        action: Set(None),
        resource_id: Set(None),
        resource_url: Set(None),
        extra_data: Set(Some(extra)),
    }
    .insert(db)
    .await
    .expect("insert interaction")
}

#[tokio::test]
async fn registry_is_idempotent_across_natural_key_spellings() {
    let db = setup_test_db().await;

    let org = get_or_create_organization(&db, "acme").await.expect("org");
    let again = get_or_create_organization(&db, "acme").await.expect("org");
    assert_eq!(org.id, again.id);

    let by_full_name = get_or_create_repository(&db, "acme/widgets", None)
        .await
        .expect("repo");
    let by_hint = get_or_create_repository(&db, "widgets", Some("acme"))
        .await
        .expect("repo");
    assert_eq!(by_full_name.id, by_hint.id);
    assert_eq!(by_full_name.organization_id, Some(org.id));

    let counts = data_counts(&db).await.expect("counts");
    assert_eq!(counts.organizations, 1);
    assert_eq!(counts.repositories, 1);
    assert_eq!(counts.interactions, 0);
}

#[tokio::test]
async fn sweep_separates_real_rows_from_synthetic_ones() {
    let db = setup_test_db().await;
    let repo = get_or_create_repository(&db, "acme/widgets", None)
        .await
        .expect("repo");

    // One real star, two synthetic rows with no recoverable event time.
    insert_interaction(
        &db,
        InteractionType::Star,
        Some(repo.id),
        "2024-01-15T08:30:00Z",
        json!({"starred_at": "2024-01-15T08:30:00Z"}),
    )
    .await;
    insert_interaction(
        &db,
        InteractionType::Star,
        Some(repo.id),
        "2024-06-01T00:00:00Z",
        json!({}),
    )
    .await;
    insert_interaction(
        &db,
        InteractionType::Commit,
        Some(repo.id),
        "2024-06-02T00:00:00Z",
        json!({"sha": "abc", "message": "no dates kept"}),
    )
    .await;

    let report = sweep(&db).await.expect("sweep");
    assert_eq!(report.real, 1);
    assert_eq!(report.synthetic, 2);
    assert_eq!(report.by_kind[&InteractionType::Star].real, 1);
    assert_eq!(report.by_kind[&InteractionType::Star].synthetic, 1);
    assert_eq!(report.by_kind[&InteractionType::Commit].synthetic, 1);

    let remaining = Interaction::find().count(&db).await.expect("count");
    assert_eq!(remaining, 1);
}

#[tokio::test]
async fn sweep_repairs_drifted_timestamps_in_place() {
    let db = setup_test_db().await;
    let repo = get_or_create_repository(&db, "acme/widgets", None)
        .await
        .expect("repo");

    let row = insert_interaction(
        &db,
        InteractionType::Release,
        Some(repo.id),
        "2025-12-31T00:00:00Z",
        json!({"published_at": "2024-05-01T00:00:00Z", "created_at": "2024-04-30T00:00:00Z"}),
    )
    .await;

    let report = sweep(&db).await.expect("sweep");
    assert_eq!(report.rewritten, 1);

    let repaired = Interaction::find_by_id(row.id)
        .one(&db)
        .await
        .expect("query")
        .expect("row survives");
    assert_eq!(repaired.timestamp.to_rfc3339(), "2024-05-01T00:00:00+00:00");
}

#[tokio::test]
async fn star_aggregates_follow_the_per_repository_counts() {
    let db = setup_test_db().await;

    let widgets = get_or_create_repository(&db, "acme/widgets", None)
        .await
        .expect("repo");
    let gadgets = get_or_create_repository(&db, "acme/gadgets", None)
        .await
        .expect("repo");

    for i in 0..3 {
        insert_interaction(
            &db,
            InteractionType::Star,
            Some(widgets.id),
            "2024-01-15T08:30:00Z",
            json!({"starred_at": "2024-01-15T08:30:00Z", "n": i}),
        )
        .await;
    }
    for i in 0..2 {
        insert_interaction(
            &db,
            InteractionType::Star,
            Some(gadgets.id),
            "2024-02-15T08:30:00Z",
            json!({"starred_at": "2024-02-15T08:30:00Z", "n": i}),
        )
        .await;
    }

    let counts = star_counts_by_repository(&db).await.expect("counts");
    assert_eq!(counts.len(), 2);
    assert_eq!(
        (counts[0].repository.as_str(), counts[0].stars),
        ("acme/widgets", 3)
    );
    assert_eq!(
        (counts[1].repository.as_str(), counts[1].stars),
        ("acme/gadgets", 2)
    );
    assert_eq!(counts[0].organization.as_deref(), Some("acme"));
}

#[tokio::test]
async fn sweep_then_aggregate_reflects_only_real_stars() {
    let db = setup_test_db().await;
    let repo = get_or_create_repository(&db, "acme/widgets", None)
        .await
        .expect("repo");

    insert_interaction(
        &db,
        InteractionType::Star,
        Some(repo.id),
        "2024-01-15T08:30:00Z",
        json!({"starred_at": "2024-01-15T08:30:00Z"}),
    )
    .await;
    // Fabricated rows inflate the count until the sweep runs.
    for _ in 0..4 {
        insert_interaction(
            &db,
            InteractionType::Star,
            Some(repo.id),
            "2024-06-01T00:00:00Z",
            json!({}),
        )
        .await;
    }

    let before = star_counts_by_repository(&db).await.expect("counts");
    assert_eq!(before[0].stars, 5);

    sweep(&db).await.expect("sweep");

    let after = star_counts_by_repository(&db).await.expect("counts");
    assert_eq!(after[0].stars, 1);
}

#[tokio::test]
async fn organization_rows_track_update_times() {
    let db = setup_test_db().await;
    let before = Utc::now();
    let org = get_or_create_organization(&db, "acme").await.expect("org");
    assert!(org.created_at >= before - chrono::Duration::seconds(5));
    assert!(org.last_synced_at.is_none());

    let counts = data_counts(&db).await.expect("counts");
    assert_eq!(counts.total(), 1);
}
