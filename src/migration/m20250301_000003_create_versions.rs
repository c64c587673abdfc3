//! Create licenses, versions, files and versions_apps tables.

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
                    .table(License::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(License::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(License::Name).string_len(255))
                    .col(ColumnDef::new(License::Text).text())
                    .col(ColumnDef::new(License::Url).string_len(255))
                    .col(ColumnDef::new(License::Builtin).integer().not_null().default(0))
                    .col(
                        ColumnDef::new(License::CreatedAt)
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
                    .table(Version::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Version::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Version::AddonId).big_integer().not_null())
                    .col(ColumnDef::new(Version::Version).string_len(255).not_null())
                    .col(ColumnDef::new(Version::LicenseId).big_integer())
                    .col(
                        ColumnDef::new(Version::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Version::Table, Version::AddonId)
                            .to(Addon::Table, Addon::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Version::Table, Version::LicenseId)
                            .to(License::Table, License::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_versions_addon")
                    .table(Version::Table)
                    .col(Version::AddonId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(File::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(File::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(File::VersionId).big_integer().not_null())
                    .col(ColumnDef::new(File::Platform).integer().not_null())
                    .col(ColumnDef::new(File::Filename).string_len(255).not_null())
                    .col(ColumnDef::new(File::Path).string_len(500).not_null())
                    .col(ColumnDef::new(File::Hash).string_len(255).not_null())
                    .col(ColumnDef::new(File::Size).big_integer().not_null().default(0))
                    .col(ColumnDef::new(File::Status).integer().not_null().default(1))
                    .col(ColumnDef::new(File::Datestatuschanged).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(File::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(File::Table, File::VersionId)
                            .to(Version::Table, Version::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_files_version")
                    .table(File::Table)
                    .col(File::VersionId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(VersionApp::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VersionApp::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(VersionApp::VersionId).big_integer().not_null())
                    .col(ColumnDef::new(VersionApp::ApplicationId).integer().not_null())
                    .col(ColumnDef::new(VersionApp::MinVersion).string_len(255).not_null())
                    .col(ColumnDef::new(VersionApp::MaxVersion).string_len(255).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(VersionApp::Table, VersionApp::VersionId)
                            .to(Version::Table, Version::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_versions_apps_unique")
                    .table(VersionApp::Table)
                    .col(VersionApp::VersionId)
                    .col(VersionApp::ApplicationId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(VersionApp::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(File::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Version::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(License::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum License {
    #[sea_orm(iden = "licenses")]
    Table,
    Id,
    Name,
    Text,
    Url,
    Builtin,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Version {
    #[sea_orm(iden = "versions")]
    Table,
    Id,
    AddonId,
    Version,
    LicenseId,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum File {
    #[sea_orm(iden = "files")]
    Table,
    Id,
    VersionId,
    Platform,
    Filename,
    Path,
    Hash,
    Size,
    Status,
    Datestatuschanged,
    CreatedAt,
}

#[derive(DeriveIden)]
enum VersionApp {
    #[sea_orm(iden = "versions_apps")]
    Table,
    Id,
    VersionId,
    ApplicationId,
    MinVersion,
    MaxVersion,
}
