//! Cached validation results of add-on files.
//!
//! At most one result exists per file. Concurrent validations of the same file
//! race on the unique `file_id`; the loser reads the winner's row.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set, SqlErr,
};

use crate::entity::file::{self, Entity as File};
use crate::entity::validation_result::{self, Entity as ValidationResult};
use crate::entity::version::Entity as Version;
use crate::error::{AppError, AppResult};

use super::DbPool;

/// Insert a completed result on `conn`.
pub async fn insert_validation_result_in<C: ConnectionTrait>(
    conn: &C,
    file_id: i64,
    validation: Option<String>,
    task_error: Option<String>,
) -> Result<validation_result::Model, DbErr> {
    let now = Utc::now();
    validation_result::ActiveModel {
        file_id: Set(file_id),
        validation: Set(validation),
        task_error: Set(task_error),
        completed: Set(Some(now)),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await
}

impl DbPool {
    /// A file of the given add-on. Files of other add-ons are reported missing.
    pub async fn get_addon_file(&self, addon_id: i64, file_id: i64) -> AppResult<file::Model> {
        let not_found = || AppError::NotFound(format!("File {}", file_id));

        let file = File::find_by_id(file_id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get file: {}", e)))?
            .ok_or_else(not_found)?;

        let version = Version::find_by_id(file.version_id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get version: {}", e)))?
            .ok_or_else(not_found)?;

        if version.addon_id != addon_id {
            return Err(not_found());
        }
        Ok(file)
    }

    pub async fn get_file(&self, file_id: i64) -> AppResult<Option<file::Model>> {
        File::find_by_id(file_id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get file: {}", e)))
    }

    /// Completed result for a file, if any.
    pub async fn get_validation_result(
        &self,
        file_id: i64,
    ) -> AppResult<Option<validation_result::Model>> {
        ValidationResult::find()
            .filter(validation_result::Column::FileId.eq(file_id))
            .filter(validation_result::Column::Completed.is_not_null())
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get validation result: {}", e)))
    }

    pub async fn get_validation_result_by_id(
        &self,
        id: i64,
    ) -> AppResult<Option<validation_result::Model>> {
        ValidationResult::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get validation result: {}", e)))
    }

    /// Store a result; when another worker stored one first, return theirs.
    pub async fn save_validation_result(
        &self,
        file_id: i64,
        validation: Option<String>,
        task_error: Option<String>,
    ) -> AppResult<validation_result::Model> {
        match insert_validation_result_in(self.writer()?, file_id, validation, task_error).await {
            Ok(model) => Ok(model),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => self
                .get_validation_result(file_id)
                .await?
                .ok_or_else(|| {
                    AppError::Database(format!(
                        "Validation result for file {} vanished after conflict",
                        file_id
                    ))
                }),
            Err(e) => Err(AppError::Database(format!(
                "Failed to save validation result: {}",
                e
            ))),
        }
    }
}
