//! Create file_uploads and validation_results tables.

use sea_orm_migration::prelude::*;

use super::m20250301_000003_create_versions::File;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FileUpload::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FileUpload::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FileUpload::UserId).big_integer())
                    .col(ColumnDef::new(FileUpload::Name).string_len(255).not_null())
                    .col(ColumnDef::new(FileUpload::Path).string_len(500).not_null())
                    .col(ColumnDef::new(FileUpload::Size).big_integer().not_null())
                    .col(ColumnDef::new(FileUpload::Hash).string_len(255).not_null())
                    .col(ColumnDef::new(FileUpload::Validation).text())
                    .col(ColumnDef::new(FileUpload::TaskError).text())
                    .col(
                        ColumnDef::new(FileUpload::CreatedAt)
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
                    .table(ValidationResult::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ValidationResult::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ValidationResult::FileId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(ValidationResult::Validation).text())
                    .col(ColumnDef::new(ValidationResult::TaskError).text())
                    .col(ColumnDef::new(ValidationResult::Completed).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(ValidationResult::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ValidationResult::Table, ValidationResult::FileId)
                            .to(File::Table, File::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ValidationResult::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FileUpload::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum FileUpload {
    #[sea_orm(iden = "file_uploads")]
    Table,
    Id,
    UserId,
    Name,
    Path,
    Size,
    Hash,
    Validation,
    TaskError,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ValidationResult {
    #[sea_orm(iden = "validation_results")]
    Table,
    Id,
    FileId,
    Validation,
    TaskError,
    Completed,
    CreatedAt,
}
