//! Create addons, addons_users and submit_steps tables.
//!
//! A submit_steps row exists only while an add-on's submission is unfinished.

use sea_orm_migration::prelude::*;

use super::m20250301_000001_create_users::User;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Addon::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Addon::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Addon::Guid).string().unique_key())
                    .col(ColumnDef::new(Addon::Slug).string_len(30).not_null().unique_key())
                    .col(ColumnDef::new(Addon::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Addon::AddonType).integer().not_null())
                    .col(ColumnDef::new(Addon::Status).integer().not_null().default(0))
                    .col(ColumnDef::new(Addon::Summary).string_len(255))
                    .col(ColumnDef::new(Addon::Description).text())
                    .col(ColumnDef::new(Addon::Homepage).string_len(255))
                    .col(ColumnDef::new(Addon::SupportEmail).string_len(255))
                    .col(ColumnDef::new(Addon::SupportUrl).string_len(255))
                    .col(ColumnDef::new(Addon::DeveloperComments).text())
                    .col(
                        ColumnDef::new(Addon::DefaultLocale)
                            .string_len(10)
                            .not_null()
                            .default("en-US"),
                    )
                    .col(ColumnDef::new(Addon::IconType).string_len(25))
                    .col(ColumnDef::new(Addon::PrivacyPolicy).text())
                    .col(ColumnDef::new(Addon::Eula).text())
                    .col(ColumnDef::new(Addon::ViewSource).boolean().not_null().default(true))
                    .col(ColumnDef::new(Addon::Binary).boolean().not_null().default(false))
                    .col(
                        ColumnDef::new(Addon::DisabledByUser)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Addon::CurrentVersionId).big_integer())
                    .col(ColumnDef::new(Addon::LastUpdated).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Addon::TotalContributions)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Addon::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Addon::ModifiedAt)
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
                    .name("idx_addons_status")
                    .table(Addon::Table)
                    .col(Addon::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AddonUser::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AddonUser::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AddonUser::AddonId).big_integer().not_null())
                    .col(ColumnDef::new(AddonUser::UserId).big_integer().not_null())
                    .col(ColumnDef::new(AddonUser::Role).integer().not_null())
                    .col(ColumnDef::new(AddonUser::Position).integer().not_null().default(0))
                    .col(ColumnDef::new(AddonUser::Listed).boolean().not_null().default(true))
                    .foreign_key(
                        ForeignKey::create()
                            .from(AddonUser::Table, AddonUser::AddonId)
                            .to(Addon::Table, Addon::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(AddonUser::Table, AddonUser::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_addons_users_unique")
                    .table(AddonUser::Table)
                    .col(AddonUser::AddonId)
                    .col(AddonUser::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SubmitStep::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SubmitStep::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SubmitStep::AddonId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(SubmitStep::Step).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(SubmitStep::Table, SubmitStep::AddonId)
                            .to(Addon::Table, Addon::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SubmitStep::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AddonUser::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Addon::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Addon {
    #[sea_orm(iden = "addons")]
    Table,
    Id,
    Guid,
    Slug,
    Name,
    AddonType,
    Status,
    Summary,
    Description,
    Homepage,
    SupportEmail,
    SupportUrl,
    DeveloperComments,
    DefaultLocale,
    IconType,
    PrivacyPolicy,
    Eula,
    ViewSource,
    Binary,
    DisabledByUser,
    CurrentVersionId,
    LastUpdated,
    TotalContributions,
    CreatedAt,
    ModifiedAt,
}

#[derive(DeriveIden)]
enum AddonUser {
    #[sea_orm(iden = "addons_users")]
    Table,
    Id,
    AddonId,
    UserId,
    Role,
    Position,
    Listed,
}

#[derive(DeriveIden)]
enum SubmitStep {
    #[sea_orm(iden = "submit_steps")]
    Table,
    Id,
    AddonId,
    Step,
}
