//! Create categories, addons_categories and previews tables.

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
                    .table(Category::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Category::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Category::Name).string_len(50).not_null())
                    .col(ColumnDef::new(Category::Slug).string_len(50).not_null())
                    .col(ColumnDef::new(Category::ApplicationId).integer().not_null())
                    .col(ColumnDef::new(Category::AddonType).integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AddonCategory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AddonCategory::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AddonCategory::AddonId).big_integer().not_null())
                    .col(ColumnDef::new(AddonCategory::CategoryId).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(AddonCategory::Table, AddonCategory::AddonId)
                            .to(Addon::Table, Addon::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(AddonCategory::Table, AddonCategory::CategoryId)
                            .to(Category::Table, Category::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_addons_categories_unique")
                    .table(AddonCategory::Table)
                    .col(AddonCategory::AddonId)
                    .col(AddonCategory::CategoryId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Preview::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Preview::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Preview::AddonId).big_integer().not_null())
                    .col(ColumnDef::new(Preview::Caption).string_len(280))
                    .col(ColumnDef::new(Preview::Position).integer().not_null().default(0))
                    .col(ColumnDef::new(Preview::Filetype).string_len(25).not_null())
                    .col(
                        ColumnDef::new(Preview::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Preview::Table, Preview::AddonId)
                            .to(Addon::Table, Addon::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Preview::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AddonCategory::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Category::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Category {
    #[sea_orm(iden = "categories")]
    Table,
    Id,
    Name,
    Slug,
    ApplicationId,
    AddonType,
}

#[derive(DeriveIden)]
enum AddonCategory {
    #[sea_orm(iden = "addons_categories")]
    Table,
    Id,
    AddonId,
    CategoryId,
}

#[derive(DeriveIden)]
enum Preview {
    #[sea_orm(iden = "previews")]
    Table,
    Id,
    AddonId,
    Caption,
    Position,
    Filetype,
    CreatedAt,
}
