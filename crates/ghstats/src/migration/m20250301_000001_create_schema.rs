//! Initial migration to create the ghstats database schema.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        self.create_organizations(manager).await?;
        self.create_repositories(manager).await?;
        self.create_interactions(manager).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Interactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Repositories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Organizations::Table).to_owned())
            .await?;
        Ok(())
    }
}

impl Migration {
    async fn create_organizations(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Organizations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Organizations::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Organizations::Name).string().not_null())
                    .col(
                        ColumnDef::new(Organizations::GithubId)
                            .big_integer()
                            .null(),
                    )
                    .col(ColumnDef::new(Organizations::Description).text().null())
                    .col(
                        ColumnDef::new(Organizations::LastSyncedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Organizations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Organizations::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Natural key: one row per organization name.
        manager
            .create_index(
                Index::create()
                    .name("idx-organizations-name")
                    .table(Organizations::Table)
                    .col(Organizations::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_repositories(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Repositories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Repositories::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Repositories::Name).string().not_null())
                    .col(ColumnDef::new(Repositories::FullName).string().not_null())
                    .col(ColumnDef::new(Repositories::GithubId).big_integer().null())
                    .col(
                        ColumnDef::new(Repositories::OrganizationId)
                            .integer()
                            .null(),
                    )
                    .col(ColumnDef::new(Repositories::Description).text().null())
                    .col(
                        ColumnDef::new(Repositories::IsPrivate)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Repositories::LastSyncedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Repositories::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Repositories::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-repositories-organization")
                            .from(Repositories::Table, Repositories::OrganizationId)
                            .to(Organizations::Table, Organizations::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Natural key: one row per "owner/name".
        manager
            .create_index(
                Index::create()
                    .name("idx-repositories-full-name")
                    .table(Repositories::Table)
                    .col(Repositories::FullName)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_interactions(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Interactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Interactions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Interactions::Kind).string().not_null())
                    .col(ColumnDef::new(Interactions::RepositoryId).integer().null())
                    .col(
                        ColumnDef::new(Interactions::OrganizationId)
                            .integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Interactions::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Interactions::UserLogin).string().null())
                    .col(ColumnDef::new(Interactions::Action).string().null())
                    .col(ColumnDef::new(Interactions::ResourceId).string().null())
                    .col(ColumnDef::new(Interactions::ResourceUrl).text().null())
                    .col(ColumnDef::new(Interactions::ExtraData).json().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-interactions-repository")
                            .from(Interactions::Table, Interactions::RepositoryId)
                            .to(Repositories::Table, Repositories::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-interactions-organization")
                            .from(Interactions::Table, Interactions::OrganizationId)
                            .to(Organizations::Table, Organizations::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-interactions-timestamp")
                    .table(Interactions::Table)
                    .col(Interactions::Timestamp)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-interactions-kind")
                    .table(Interactions::Table)
                    .col(Interactions::Kind)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Organizations {
    Table,
    Id,
    Name,
    GithubId,
    Description,
    LastSyncedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Repositories {
    Table,
    Id,
    Name,
    FullName,
    GithubId,
    OrganizationId,
    Description,
    IsPrivate,
    LastSyncedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Interactions {
    Table,
    Id,
    Kind,
    RepositoryId,
    OrganizationId,
    Timestamp,
    UserLogin,
    Action,
    ResourceId,
    ResourceUrl,
    ExtraData,
}
