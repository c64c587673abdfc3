//! CLI tool to run the aggregation jobs once.
//!
//! Usage:
//!   cargo run --bin devhub-cron -- list
//!   cargo run --bin devhub-cron -- all
//!   cargo run --bin devhub-cron -- <job-name>

use std::env;
use std::sync::Arc;

use devhub_lib::config::Config;
use devhub_lib::db::DbPool;
use devhub_lib::services::cron::{CronJob, run_job};
use devhub_lib::services::{
    InlineTaskQueue, LoggingIndexer, PackageValidator, Storage, TaskQueue, TaskRunner,
};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let command = args[1].as_str();
    let jobs: Vec<CronJob> = match command {
        "help" | "--help" | "-h" => {
            print_usage();
            return;
        }
        "list" | "ls" => {
            for job in CronJob::ALL {
                println!("{:<40} chunk size {}", job.as_str(), job.chunk_size());
            }
            return;
        }
        "all" => CronJob::ALL.to_vec(),
        name => match CronJob::parse(name) {
            Some(job) => vec![job],
            None => {
                eprintln!("Unknown job: {}", name);
                print_usage();
                std::process::exit(1);
            }
        },
    };

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };

    if config.read_only {
        eprintln!("Site is read-only, not running cron jobs");
        std::process::exit(1);
    }

    let pool = match DbPool::new(&config).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error connecting to database: {}", e);
            std::process::exit(1);
        }
    };

    let runner = Arc::new(TaskRunner::new(
        pool.clone(),
        Storage::new(config.data_dir.clone()),
        Arc::new(PackageValidator),
        Arc::new(LoggingIndexer),
    ));
    let queue: Arc<dyn TaskQueue> = Arc::new(InlineTaskQueue::new(runner));

    let mut failed = false;
    for job in jobs {
        match run_job(job, &pool, queue.as_ref()).await {
            Ok(count) => println!("{}: {} tasks", job, count),
            Err(e) => {
                eprintln!("{} failed: {}", job, e);
                failed = true;
            }
        }
    }

    if failed {
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"
Developer Hub Cron Jobs

USAGE:
    devhub-cron <COMMAND>

COMMANDS:
    list            List the available jobs
    all             Run every job, in dependency order
    <job-name>      Run a single job
    help            Show this help message

JOBS:
    update_addons_current_version
    addon_last_updated
    update_addon_appsupport
    update_addons_collections_downloads
    update_collections_total
    addon_total_contributions
"#
    );
}
