//! Background tasks and the queue they are submitted through.
//!
//! Handlers and periodic jobs never run follow-up work themselves; they hand
//! a [`Task`] to the injected [`TaskQueue`]. The server spawns each task on
//! the runtime, tests and the cron binary run them inline.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entity::addon;
use crate::error::{AppError, AppResult};

use super::storage::Storage;
use super::validation;
use super::validator::Validator;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    ValidateUpload(Uuid),
    ValidateFile(i64),
    /// Refresh what depends on an add-on's versions.
    VersionChanged(i64),
    UpdateLastUpdated(Vec<i64>),
    UpdateAppSupport(Vec<i64>),
    UpdateAddonsCollectionsDownloads(Vec<(i64, i64)>),
    UpdateCollectionsTotal(Vec<i64>),
    AddonTotalContributions(Vec<i64>),
    UpdateCurrentVersion(Vec<i64>),
    Reindex(Vec<i64>),
    DeletePreviewFiles { addon_id: i64, preview_id: i64 },
}

impl Task {
    pub fn name(&self) -> &'static str {
        match self {
            Task::ValidateUpload(_) => "validate_upload",
            Task::ValidateFile(_) => "validate_file",
            Task::VersionChanged(_) => "version_changed",
            Task::UpdateLastUpdated(_) => "update_last_updated",
            Task::UpdateAppSupport(_) => "update_appsupport",
            Task::UpdateAddonsCollectionsDownloads(_) => "update_addons_collections_downloads",
            Task::UpdateCollectionsTotal(_) => "update_collections_total",
            Task::AddonTotalContributions(_) => "addon_total_contributions",
            Task::UpdateCurrentVersion(_) => "update_current_version",
            Task::Reindex(_) => "reindex",
            Task::DeletePreviewFiles { .. } => "delete_preview_files",
        }
    }
}

/// Accepts background work.
#[async_trait]
pub trait TaskQueue: Send + Sync {
    async fn submit(&self, task: Task) -> AppResult<()>;
}

/// Receives add-ons whose search documents are stale.
#[async_trait]
pub trait SearchIndexer: Send + Sync {
    async fn index(&self, addons: &[addon::Model]) -> AppResult<()>;
}

/// Indexer that only records what would have been indexed.
#[derive(Debug, Default)]
pub struct LoggingIndexer;

#[async_trait]
impl SearchIndexer for LoggingIndexer {
    async fn index(&self, addons: &[addon::Model]) -> AppResult<()> {
        for addon in addons {
            info!("Indexing add-on {} ({})", addon.id, addon.slug);
        }
        Ok(())
    }
}

/// Executes tasks against the database, storage and validator.
pub struct TaskRunner {
    pool: DbPool,
    storage: Storage,
    validator: Arc<dyn Validator>,
    indexer: Arc<dyn SearchIndexer>,
}

impl TaskRunner {
    pub fn new(
        pool: DbPool,
        storage: Storage,
        validator: Arc<dyn Validator>,
        indexer: Arc<dyn SearchIndexer>,
    ) -> Self {
        Self {
            pool,
            storage,
            validator,
            indexer,
        }
    }

    fn data_dir(&self) -> PathBuf {
        self.storage.root().to_path_buf()
    }

    pub async fn run(&self, task: Task) -> AppResult<()> {
        match task {
            Task::ValidateUpload(id) => {
                validation::validate_upload(&self.pool, self.validator.as_ref(), &self.data_dir(), id)
                    .await?;
            }
            Task::ValidateFile(file_id) => {
                let file = self
                    .pool
                    .get_file(file_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("File {}", file_id)))?;
                validation::get_or_validate(
                    &self.pool,
                    self.validator.as_ref(),
                    &self.data_dir(),
                    &file,
                )
                .await?;
            }
            Task::VersionChanged(addon_id) => {
                info!("Version changed for add-on {}", addon_id);
                self.pool.update_last_updated(&[addon_id]).await?;
                self.pool.update_appsupport(&[addon_id]).await?;
                self.reindex(&[addon_id]).await?;
            }
            Task::UpdateLastUpdated(ids) => {
                info!("[{}@None] Updating last updated for addons.", ids.len());
                let changed = self.pool.update_last_updated(&ids).await?;
                info!("Updated last_updated of {} addons", changed);
            }
            Task::UpdateAppSupport(ids) => {
                info!("[{}@None] Updating appsupport for addons.", ids.len());
                let rows = self.pool.update_appsupport(&ids).await?;
                info!("Inserted {} appsupport rows", rows);
            }
            Task::UpdateAddonsCollectionsDownloads(pairs) => {
                info!(
                    "[{}@None] Updating addons+collections download totals.",
                    pairs.len()
                );
                self.pool.update_addons_collections_downloads(&pairs).await?;
            }
            Task::UpdateCollectionsTotal(ids) => {
                info!("[{}@None] Updating collections' download totals.", ids.len());
                self.pool.update_collections_total(&ids).await?;
            }
            Task::AddonTotalContributions(ids) => {
                info!("[{}@None] Updating total contributions.", ids.len());
                self.pool.update_total_contributions(&ids).await?;
            }
            Task::UpdateCurrentVersion(ids) => {
                info!("[{}@None] Updating current versions.", ids.len());
                self.pool.update_current_versions(&ids).await?;
                self.reindex(&ids).await?;
            }
            Task::Reindex(ids) => self.reindex(&ids).await?,
            Task::DeletePreviewFiles {
                addon_id,
                preview_id,
            } => {
                self.storage.delete_preview(addon_id, preview_id).await?;
            }
        }
        Ok(())
    }

    async fn reindex(&self, ids: &[i64]) -> AppResult<()> {
        let addons = self.pool.get_addons_by_ids(ids).await?;
        self.indexer.index(&addons).await
    }
}

/// Queue that runs each task on its own tokio task.
pub struct SpawningTaskQueue {
    runner: Arc<TaskRunner>,
}

impl SpawningTaskQueue {
    pub fn new(runner: Arc<TaskRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl TaskQueue for SpawningTaskQueue {
    async fn submit(&self, task: Task) -> AppResult<()> {
        let runner = Arc::clone(&self.runner);
        tokio::spawn(async move {
            let name = task.name();
            if let Err(e) = runner.run(task).await {
                error!("Task {} failed: {}", name, e);
            }
        });
        Ok(())
    }
}

/// Queue that runs each task before `submit` returns.
pub struct InlineTaskQueue {
    runner: Arc<TaskRunner>,
}

impl InlineTaskQueue {
    pub fn new(runner: Arc<TaskRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl TaskQueue for InlineTaskQueue {
    async fn submit(&self, task: Task) -> AppResult<()> {
        let name = task.name();
        if let Err(e) = self.runner.run(task).await {
            error!("Task {} failed: {}", name, e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_names() {
        assert_eq!(Task::ValidateUpload(Uuid::nil()).name(), "validate_upload");
        assert_eq!(
            Task::DeletePreviewFiles {
                addon_id: 1,
                preview_id: 2
            }
            .name(),
            "delete_preview_files"
        );
        assert_eq!(
            Task::UpdateAddonsCollectionsDownloads(vec![(1, 2)]).name(),
            "update_addons_collections_downloads"
        );
    }
}
