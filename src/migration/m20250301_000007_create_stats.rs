//! Create derived aggregate tables and the raw statistics they are built from.

use sea_orm_migration::prelude::*;

use super::m20250301_000002_create_addons::Addon;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AppSupport::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AppSupport::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AppSupport::AddonId).big_integer().not_null())
                    .col(ColumnDef::new(AppSupport::AppId).integer().not_null())
                    .col(
                        ColumnDef::new(AppSupport::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(AppSupport::Table, AppSupport::AddonId)
                            .to(Addon::Table, Addon::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_appsupport_unique")
                    .table(AppSupport::Table)
                    .col(AppSupport::AddonId)
                    .col(AppSupport::AppId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Collection::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Collection::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Collection::Name).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Collection::Downloads)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Collection::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AddonCollection::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AddonCollection::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AddonCollection::AddonId).big_integer().not_null())
                    .col(
                        ColumnDef::new(AddonCollection::CollectionId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AddonCollection::Downloads)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(AddonCollection::Table, AddonCollection::AddonId)
                            .to(Addon::Table, Addon::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(AddonCollection::Table, AddonCollection::CollectionId)
                            .to(Collection::Table, Collection::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_addons_collections_unique")
                    .table(AddonCollection::Table)
                    .col(AddonCollection::AddonId)
                    .col(AddonCollection::CollectionId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AddonCollectionCount::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AddonCollectionCount::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AddonCollectionCount::AddonId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AddonCollectionCount::CollectionId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AddonCollectionCount::Count).integer().not_null())
                    .col(ColumnDef::new(AddonCollectionCount::Date).date().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_stats_addons_collections_counts_pair")
                    .table(AddonCollectionCount::Table)
                    .col(AddonCollectionCount::AddonId)
                    .col(AddonCollectionCount::CollectionId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CollectionCount::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CollectionCount::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CollectionCount::CollectionId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CollectionCount::Count).integer().not_null())
                    .col(ColumnDef::new(CollectionCount::Date).date().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_stats_collections_counts_collection")
                    .table(CollectionCount::Table)
                    .col(CollectionCount::CollectionId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Contribution::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Contribution::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Contribution::AddonId).big_integer().not_null())
                    .col(ColumnDef::new(Contribution::Amount).integer().not_null())
                    .col(
                        ColumnDef::new(Contribution::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_stats_contributions_addon")
                    .table(Contribution::Table)
                    .col(Contribution::AddonId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            Contribution::Table.into_iden(),
            CollectionCount::Table.into_iden(),
            AddonCollectionCount::Table.into_iden(),
            AddonCollection::Table.into_iden(),
            Collection::Table.into_iden(),
            AppSupport::Table.into_iden(),
        ] {
            manager
                .drop_table(Table::drop().table(table).to_owned())
                .await?;
        }
        Ok(())
    }
}

#[derive(DeriveIden)]
enum AppSupport {
    #[sea_orm(iden = "appsupport")]
    Table,
    Id,
    AddonId,
    AppId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Collection {
    #[sea_orm(iden = "collections")]
    Table,
    Id,
    Name,
    Downloads,
    CreatedAt,
}

#[derive(DeriveIden)]
enum AddonCollection {
    #[sea_orm(iden = "addons_collections")]
    Table,
    Id,
    AddonId,
    CollectionId,
    Downloads,
}

#[derive(DeriveIden)]
enum AddonCollectionCount {
    #[sea_orm(iden = "stats_addons_collections_counts")]
    Table,
    Id,
    AddonId,
    CollectionId,
    Count,
    Date,
}

#[derive(DeriveIden)]
enum CollectionCount {
    #[sea_orm(iden = "stats_collections_counts")]
    Table,
    Id,
    CollectionId,
    Count,
    Date,
}

#[derive(DeriveIden)]
enum Contribution {
    #[sea_orm(iden = "stats_contributions")]
    Table,
    Id,
    AddonId,
    Amount,
    CreatedAt,
}
