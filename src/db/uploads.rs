//! Database operations for uploaded packages awaiting submission.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use uuid::Uuid;

use crate::entity::file_upload::{self, ActiveModel, Entity as FileUpload};
use crate::error::{AppError, AppResult};

use super::DbPool;

/// A package written to local storage, before it is recorded.
#[derive(Debug, Clone)]
pub struct NewUpload {
    pub user_id: Option<i64>,
    pub name: String,
    pub path: String,
    pub size: i64,
    /// `sha256:` prefixed hex digest
    pub hash: String,
}

impl DbPool {
    /// Record an upload. Validation fields stay empty until the validator runs.
    pub async fn insert_upload(&self, upload: NewUpload) -> AppResult<file_upload::Model> {
        let model = ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(upload.user_id),
            name: Set(upload.name),
            path: Set(upload.path),
            size: Set(upload.size),
            hash: Set(upload.hash),
            validation: Set(None),
            task_error: Set(None),
            created_at: Set(Utc::now()),
        };

        model
            .insert(self.writer()?)
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert upload: {}", e)))
    }

    pub async fn get_upload(&self, id: Uuid) -> AppResult<Option<file_upload::Model>> {
        FileUpload::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get upload: {}", e)))
    }

    /// Store the validator outcome: a JSON payload, or the crash text.
    pub async fn set_upload_validation(
        &self,
        id: Uuid,
        validation: Option<String>,
        task_error: Option<String>,
    ) -> AppResult<file_upload::Model> {
        let upload = self
            .get_upload(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Upload {}", id)))?;

        let mut active: ActiveModel = upload.into();
        active.validation = Set(validation);
        active.task_error = Set(task_error);

        active
            .update(self.writer()?)
            .await
            .map_err(|e| AppError::Database(format!("Failed to store upload validation: {}", e)))
    }
}
