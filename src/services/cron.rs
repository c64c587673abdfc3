//! Periodic aggregation jobs.
//!
//! A job selects candidate keys, splits them into chunks and submits one
//! task per chunk. Chunks commit independently.

use tracing::info;

use crate::db::DbPool;
use crate::error::AppResult;

use super::tasks::{Task, TaskQueue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CronJob {
    AddonLastUpdated,
    UpdateAddonAppsupport,
    UpdateAddonsCollectionsDownloads,
    UpdateCollectionsTotal,
    AddonTotalContributions,
    UpdateAddonsCurrentVersion,
}

impl CronJob {
    pub const ALL: [CronJob; 6] = [
        Self::UpdateAddonsCurrentVersion,
        Self::AddonLastUpdated,
        Self::UpdateAddonAppsupport,
        Self::UpdateAddonsCollectionsDownloads,
        Self::UpdateCollectionsTotal,
        Self::AddonTotalContributions,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AddonLastUpdated => "addon_last_updated",
            Self::UpdateAddonAppsupport => "update_addon_appsupport",
            Self::UpdateAddonsCollectionsDownloads => "update_addons_collections_downloads",
            Self::UpdateCollectionsTotal => "update_collections_total",
            Self::AddonTotalContributions => "addon_total_contributions",
            Self::UpdateAddonsCurrentVersion => "update_addons_current_version",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|job| job.as_str() == s)
    }

    /// Keys handed to one task.
    pub fn chunk_size(self) -> usize {
        match self {
            Self::AddonLastUpdated => 1000,
            Self::UpdateAddonAppsupport => 1000,
            Self::UpdateAddonsCollectionsDownloads => 600,
            Self::UpdateCollectionsTotal => 1000,
            Self::AddonTotalContributions => 100,
            Self::UpdateAddonsCurrentVersion => 100,
        }
    }
}

impl std::fmt::Display for CronJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn chunk_tasks<T: Clone>(keys: &[T], size: usize, make: impl Fn(Vec<T>) -> Task) -> Vec<Task> {
    keys.chunks(size.max(1)).map(|c| make(c.to_vec())).collect()
}

/// Tasks a job would submit for the current data.
pub async fn plan_job(job: CronJob, pool: &DbPool) -> AppResult<Vec<Task>> {
    let size = job.chunk_size();
    let tasks = match job {
        CronJob::AddonLastUpdated => {
            chunk_tasks(&pool.get_live_addon_ids().await?, size, Task::UpdateLastUpdated)
        }
        CronJob::UpdateAddonAppsupport => {
            chunk_tasks(&pool.get_live_addon_ids().await?, size, Task::UpdateAppSupport)
        }
        CronJob::UpdateAddonsCollectionsDownloads => chunk_tasks(
            &pool.get_addon_collection_pairs_with_counts().await?,
            size,
            Task::UpdateAddonsCollectionsDownloads,
        ),
        CronJob::UpdateCollectionsTotal => chunk_tasks(
            &pool.get_collection_ids_with_counts().await?,
            size,
            Task::UpdateCollectionsTotal,
        ),
        CronJob::AddonTotalContributions => chunk_tasks(
            &pool.get_addon_ids_with_contributions().await?,
            size,
            Task::AddonTotalContributions,
        ),
        CronJob::UpdateAddonsCurrentVersion => chunk_tasks(
            &pool.get_addon_ids_missing_current_version().await?,
            size,
            Task::UpdateCurrentVersion,
        ),
    };
    Ok(tasks)
}

/// Run one job. Returns the number of tasks submitted.
pub async fn run_job(job: CronJob, pool: &DbPool, queue: &dyn TaskQueue) -> AppResult<usize> {
    let tasks = plan_job(job, pool).await?;
    let count = tasks.len();
    for task in tasks {
        queue.submit(task).await?;
    }
    info!("Cron job {} submitted {} tasks", job, count);
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_names() {
        for job in CronJob::ALL {
            assert_eq!(CronJob::parse(job.as_str()), Some(job));
        }
        assert_eq!(CronJob::parse("gc"), None);
    }

    #[test]
    fn test_chunking() {
        let ids: Vec<i64> = (1..=2500).collect();
        let tasks = chunk_tasks(&ids, 1000, Task::UpdateLastUpdated);
        assert_eq!(tasks.len(), 3);
        assert_eq!(tasks[2], Task::UpdateLastUpdated((2001..=2500).collect()));
        assert!(chunk_tasks::<i64>(&[], 1000, Task::UpdateLastUpdated).is_empty());
    }
}
