//! Integrity sweep over stored interactions.
//!
//! Every row must carry a timestamp that can be re-derived from its own
//! `extra_data`. Rows that can are "real": their stored timestamp is
//! rewritten when it drifted from the payload value. Rows that cannot are
//! "synthetic" (fabricated at import time by older versions) and are
//! deleted. Rewrites happen in one transaction, deletions in a second, so a
//! failed deletion never rolls back completed repairs.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, TransactionTrait,
};
use thiserror::Error;

use crate::entity::interaction;
use crate::entity::interaction_type::InteractionType;
use crate::timestamp::{candidate_fields, resolve, LEGACY_SWEEP_FIELDS};

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("database error: {0}")]
    Db(#[from] DbErr),
}

/// Real/synthetic split for one interaction category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindBreakdown {
    pub real: u64,
    pub synthetic: u64,
}

/// Outcome of a sweep, counted before any row is deleted.
#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    pub real: u64,
    pub synthetic: u64,
    /// Real rows whose stored timestamp was corrected.
    pub rewritten: u64,
    pub by_kind: BTreeMap<InteractionType, KindBreakdown>,
}

impl SweepReport {
    #[must_use]
    pub fn total(&self) -> u64 {
        self.real + self.synthetic
    }
}

/// Classify every interaction, repair real rows, delete synthetic ones.
///
/// Categories without their own candidate fields are resolved against
/// [`LEGACY_SWEEP_FIELDS`], the flat list earlier versions stored under.
pub async fn sweep(db: &DatabaseConnection) -> Result<SweepReport, SweepError> {
    let rows = interaction::Entity::find().all(db).await?;

    let mut report = SweepReport::default();
    let mut rewrites: Vec<(i32, DateTime<Utc>)> = Vec::new();
    let mut synthetic_ids: Vec<i32> = Vec::new();

    for row in &rows {
        let fields = candidate_fields(row.kind);
        let fields = if fields.is_empty() {
            LEGACY_SWEEP_FIELDS
        } else {
            fields
        };

        let breakdown = report.by_kind.entry(row.kind).or_default();
        match resolve(&row.extra_object(), fields) {
            Some(ts) => {
                report.real += 1;
                breakdown.real += 1;
                if ts != row.timestamp {
                    rewrites.push((row.id, ts));
                }
            }
            None => {
                report.synthetic += 1;
                breakdown.synthetic += 1;
                synthetic_ids.push(row.id);
            }
        }
    }

    report.rewritten = rewrites.len() as u64;

    if !rewrites.is_empty() {
        let txn = db.begin().await?;
        for (id, ts) in rewrites {
            interaction::ActiveModel {
                id: ActiveValue::Unchanged(id),
                timestamp: ActiveValue::Set(ts),
                ..Default::default()
            }
            .update(&txn)
            .await?;
        }
        txn.commit().await?;
    }

    if !synthetic_ids.is_empty() {
        let txn = db.begin().await?;
        let deleted = interaction::Entity::delete_many()
            .filter(interaction::Column::Id.is_in(synthetic_ids))
            .exec(&txn)
            .await?;
        txn.commit().await?;
        tracing::warn!(deleted = deleted.rows_affected, "removed synthetic interactions");
    }

    tracing::debug!(
        real = report.real,
        synthetic = report.synthetic,
        rewritten = report.rewritten,
        "sweep finished"
    );
    Ok(report)
}
