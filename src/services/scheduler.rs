//! Runs the periodic aggregation jobs on an interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;
use tracing::{error, info, warn};

use crate::db::DbPool;

use super::cron::{CronJob, run_job};
use super::tasks::TaskQueue;

/// Start the background loop running every cron job each `interval_secs`.
///
/// Failed jobs are logged and picked up again by the next run.
pub fn start_cron_task(pool: DbPool, queue: Arc<dyn TaskQueue>, interval_secs: u64) {
    tokio::spawn(async move {
        info!("Starting cron scheduler (interval: {} seconds)", interval_secs);

        let mut ticker = interval(Duration::from_secs(interval_secs));

        loop {
            ticker.tick().await;

            if pool.is_read_only() {
                warn!("Read-only mode, skipping cron jobs");
                continue;
            }

            for job in CronJob::ALL {
                if let Err(e) = run_job(job, &pool, queue.as_ref()).await {
                    error!("Cron job {} failed: {}", job, e);
                }
            }
        }
    });
}
