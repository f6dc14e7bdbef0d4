//! Database connection utilities.

use sea_orm::{Database, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait};

/// Row counts for the three core tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DataCounts {
    pub organizations: u64,
    pub repositories: u64,
    pub interactions: u64,
}

impl DataCounts {
    #[must_use]
    pub fn total(&self) -> u64 {
        self.organizations + self.repositories + self.interactions
    }
}

/// Configure SQLite-specific pragmas for better performance and concurrency.
///
/// This sets:
/// - `journal_mode=WAL` - Write-ahead logging for better concurrent access
/// - `busy_timeout=5000` - Wait up to 5 seconds for locks instead of failing immediately
/// - `synchronous=NORMAL` - Good balance of safety and performance with WAL
async fn configure_sqlite(db: &DatabaseConnection) -> Result<(), DbErr> {
    use sea_orm::{ConnectionTrait, Statement};

    for pragma in [
        "PRAGMA journal_mode=WAL",
        "PRAGMA busy_timeout=5000",
        "PRAGMA synchronous=NORMAL",
    ] {
        db.execute(Statement::from_string(
            db.get_database_backend(),
            pragma.to_string(),
        ))
        .await?;
    }

    Ok(())
}

/// Establish a connection to the database.
///
/// For SQLite databases, this automatically configures WAL journal mode, a
/// 5 second busy timeout, and NORMAL synchronous mode.
///
/// # Errors
/// Returns `DbErr` if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(database_url).await?;

    if database_url.starts_with("sqlite:") {
        configure_sqlite(&db).await?;
    }

    Ok(db)
}

/// Establish a connection to the database and run all pending migrations.
///
/// This is the recommended way to initialize the database for applications
/// using ghstats. It ensures the schema is always up-to-date.
///
/// # Errors
/// Returns `DbErr` if the connection cannot be established or migrations fail.
pub async fn connect_and_migrate(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    use sea_orm_migration::MigratorTrait;

    let db = connect(database_url).await?;
    crate::migration::Migrator::up(&db, None).await?;
    Ok(db)
}

/// Count rows in the organizations, repositories and interactions tables.
///
/// Used by callers that want to warn before re-initializing a database that
/// already holds data.
pub async fn data_counts(db: &DatabaseConnection) -> Result<DataCounts, DbErr> {
    use crate::entity::prelude::*;

    Ok(DataCounts {
        organizations: Organization::find().count(db).await?,
        repositories: Repository::find().count(db).await?,
        interactions: Interaction::find().count(db).await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_and_migrate_creates_empty_schema() {
        let db = connect_and_migrate("sqlite::memory:")
            .await
            .expect("in-memory database should migrate");

        let counts = data_counts(&db).await.expect("counts query");
        assert_eq!(counts, DataCounts::default());
        assert_eq!(counts.total(), 0);
    }

    #[tokio::test]
    async fn connect_returns_error_for_invalid_database_url() {
        let err = connect("this-is-not-a-db-url")
            .await
            .expect_err("invalid URL should error");
        let msg = err.to_string().to_ascii_lowercase();
        assert!(
            msg.contains("error") || msg.contains("invalid"),
            "unexpected error message: {err}"
        );
    }
}
