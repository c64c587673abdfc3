//! Versions, their files and compatible applications, plus licenses.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, TransactionTrait,
};
use serde_json::json;

use crate::entity::addon::{self, Entity as Addon};
use crate::entity::file::{self, Entity as File};
use crate::entity::license::{self, Entity as License};
use crate::entity::version::{self, Entity as Version};
use crate::entity::version_app::{self, Entity as VersionApp};
use crate::error::{AppError, AppResult};
use crate::models::license::BuiltinLicense;
use crate::models::{
    AddonStatus, Application, CompatibleApp, FileSummary, LogAction, Platform, VersionSummary,
};

use super::DbPool;
use super::activity_log::log_activity_in;

/// Newest version of an add-on.
pub async fn latest_version_in<C: ConnectionTrait>(
    conn: &C,
    addon_id: i64,
) -> Result<Option<version::Model>, DbErr> {
    Version::find()
        .filter(version::Column::AddonId.eq(addon_id))
        .order_by_desc(version::Column::CreatedAt)
        .order_by_desc(version::Column::Id)
        .one(conn)
        .await
}

/// The add-on's current version, falling back to its newest one.
pub async fn current_version_in<C: ConnectionTrait>(
    conn: &C,
    addon: &addon::Model,
) -> Result<Option<version::Model>, DbErr> {
    if let Some(id) = addon.current_version_id
        && let Some(version) = Version::find_by_id(id).one(conn).await?
    {
        return Ok(Some(version));
    }
    latest_version_in(conn, addon.id).await
}

/// Row for a built-in license, created on first use.
pub async fn ensure_builtin_license_in<C: ConnectionTrait>(
    conn: &C,
    builtin: &BuiltinLicense,
) -> Result<license::Model, DbErr> {
    let existing = License::find()
        .filter(license::Column::Builtin.eq(builtin.builtin))
        .one(conn)
        .await?;
    if let Some(model) = existing {
        return Ok(model);
    }

    license::ActiveModel {
        name: Set(Some(builtin.name.to_string())),
        text: Set(None),
        url: Set(Some(builtin.url.to_string())),
        builtin: Set(builtin.builtin),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(conn)
    .await
}

impl DbPool {
    /// Versions of an add-on, newest first, with their files and applications.
    pub async fn get_version_summaries(&self, addon_id: i64) -> AppResult<Vec<VersionSummary>> {
        let conn = self.connection();
        let db_err = |e: DbErr| AppError::Database(format!("Failed to list versions: {}", e));

        let versions = Version::find()
            .filter(version::Column::AddonId.eq(addon_id))
            .order_by_desc(version::Column::CreatedAt)
            .order_by_desc(version::Column::Id)
            .all(conn)
            .await
            .map_err(db_err)?;
        let ids: Vec<i64> = versions.iter().map(|v| v.id).collect();

        let mut files: HashMap<i64, Vec<FileSummary>> = HashMap::new();
        let mut apps: HashMap<i64, Vec<CompatibleApp>> = HashMap::new();
        if !ids.is_empty() {
            for f in File::find()
                .filter(file::Column::VersionId.is_in(ids.clone()))
                .order_by_asc(file::Column::Id)
                .all(conn)
                .await
                .map_err(db_err)?
            {
                files.entry(f.version_id).or_default().push(FileSummary {
                    id: f.id,
                    platform: Platform::from_id(f.platform),
                    filename: f.filename,
                    size: f.size,
                    status: AddonStatus::from_i32(f.status),
                    created_at: f.created_at,
                });
            }

            for a in VersionApp::find()
                .filter(version_app::Column::VersionId.is_in(ids))
                .order_by_asc(version_app::Column::ApplicationId)
                .all(conn)
                .await
                .map_err(db_err)?
            {
                apps.entry(a.version_id).or_default().push(CompatibleApp {
                    application: Application::from_id(a.application_id),
                    min_version: a.min_version,
                    max_version: a.max_version,
                });
            }
        }

        Ok(versions
            .into_iter()
            .map(|v| VersionSummary {
                id: v.id,
                files: files.remove(&v.id).unwrap_or_default(),
                apps: apps.remove(&v.id).unwrap_or_default(),
                version: v.version,
                created_at: v.created_at,
            })
            .collect())
    }

    pub async fn get_current_version(&self, addon: &addon::Model) -> AppResult<Option<version::Model>> {
        current_version_in(self.connection(), addon)
            .await
            .map_err(|e| AppError::Database(format!("Failed to get current version: {}", e)))
    }

    /// Applications the given version is compatible with.
    pub async fn get_version_apps(&self, version_id: i64) -> AppResult<Vec<Application>> {
        let rows = VersionApp::find()
            .filter(version_app::Column::VersionId.eq(version_id))
            .order_by_asc(version_app::Column::ApplicationId)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get version apps: {}", e)))?;

        Ok(rows
            .into_iter()
            .filter_map(|a| Application::from_id(a.application_id))
            .collect())
    }

    pub async fn get_license(&self, id: i64) -> AppResult<Option<license::Model>> {
        License::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get license: {}", e)))
    }

    /// Delete one version. The add-on falls back to its newest remaining
    /// version, or to the incomplete status when none is left.
    pub async fn delete_version(
        &self,
        addon: &addon::Model,
        version_id: i64,
        user_id: i64,
    ) -> AppResult<()> {
        let db_err = |e: DbErr| AppError::Database(format!("Failed to delete version: {}", e));
        let txn = self.writer()?.begin().await.map_err(db_err)?;

        let version = Version::find_by_id(version_id)
            .filter(version::Column::AddonId.eq(addon.id))
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or_else(|| AppError::NotFound(format!("Version {}", version_id)))?;

        Version::delete_by_id(version.id)
            .exec(&txn)
            .await
            .map_err(db_err)?;

        let remaining = latest_version_in(&txn, addon.id).await.map_err(db_err)?;
        if addon.current_version_id == Some(version.id) || remaining.is_none() {
            let mut active: addon::ActiveModel = Addon::find_by_id(addon.id)
                .one(&txn)
                .await
                .map_err(db_err)?
                .ok_or_else(|| AppError::NotFound(format!("Addon {}", addon.slug)))?
                .into();
            active.current_version_id = Set(remaining.as_ref().map(|v| v.id));
            if remaining.is_none() {
                active.status = Set(AddonStatus::Null.as_i32());
            }
            active.modified_at = Set(Utc::now());
            active.update(&txn).await.map_err(db_err)?;
        }

        log_activity_in(
            &txn,
            LogAction::DeleteVersion,
            Some(addon.id),
            Some(user_id),
            Some(json!({ "version": version.version })),
        )
        .await
        .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        Ok(())
    }

    /// Whether any file of the add-on is still eligible for review.
    pub async fn has_reviewable_files(&self, addon_id: i64) -> AppResult<bool> {
        let version_ids: Vec<i64> = Version::find()
            .filter(version::Column::AddonId.eq(addon_id))
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list versions: {}", e)))?
            .into_iter()
            .map(|v| v.id)
            .collect();
        if version_ids.is_empty() {
            return Ok(false);
        }

        let reviewable = File::find()
            .filter(file::Column::VersionId.is_in(version_ids))
            .filter(file::Column::Status.ne(AddonStatus::Disabled.as_i32()))
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list files: {}", e)))?;

        Ok(reviewable.is_some())
    }
}
