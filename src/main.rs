//! Add-on developer hub - Main entry point.
//!
//! Starts the Actix-web server with configured routes and middleware, and the
//! periodic aggregation jobs.

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, http::header};
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use devhub_lib::api::ApiDoc;
use devhub_lib::app::AppState;
use devhub_lib::config::{Config, USER_HEADER};
use devhub_lib::db::DbPool;
use devhub_lib::middleware::{ReadOnly, RequestLogger};
use devhub_lib::services::{
    LoggingIndexer, PackageValidator, SpawningTaskQueue, Storage, TaskQueue, TaskRunner, Validator,
    start_cron_task,
};

/// Perform health check (for Docker healthcheck).
async fn health_check() -> bool {
    // Simple check - just verify we can load config
    Config::from_env().is_ok()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Check for --health-check flag (used by Docker HEALTHCHECK)
    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|arg| arg == "--health-check") {
        dotenvy::dotenv().ok();
        if health_check().await {
            std::process::exit(0);
        } else {
            std::process::exit(1);
        }
    }

    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - In production, DATABASE_URL and DEVHUB_REDIRECT_SECRET_KEY must be set");
            error!("  - In production, values must not match development defaults");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  Add-on Developer Hub");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
        info!("Using development defaults for DATABASE_URL and DEVHUB_REDIRECT_SECRET_KEY");
    }
    if config.read_only {
        warn!("Read-only mode: writes are refused and cron jobs are skipped");
    }
    if !config.validation.validate_addons {
        warn!("Add-on validation is disabled; upload reports are stubbed");
    }

    // Create storage directories
    let storage = Storage::new(config.data_dir.clone());
    if let Err(e) = storage.ensure_dirs().await {
        error!("Failed to create data directories: {}", e);
        std::process::exit(1);
    }

    let pool = match DbPool::new(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };
    info!("Database connection established");

    if config.read_only {
        info!("Skipping migrations in read-only mode");
    } else if let Err(e) = pool.run_migrations().await {
        error!("Failed to run migrations: {}", e);
        std::process::exit(1);
    }

    // Background work
    let validator: Arc<dyn Validator> = Arc::new(PackageValidator);
    let runner = Arc::new(TaskRunner::new(
        pool.clone(),
        storage.clone(),
        Arc::clone(&validator),
        Arc::new(LoggingIndexer),
    ));
    let queue: Arc<dyn TaskQueue> = Arc::new(SpawningTaskQueue::new(runner));
    start_cron_task(pool.clone(), Arc::clone(&queue), config.cron_interval_secs);

    let bind_address = config.bind_address();
    let is_development = config.is_development();
    let read_only = config.read_only;
    info!(
        "Upload limits: {}MB per package, {}MB per image",
        config.uploads.max_upload_size / 1024 / 1024,
        config.uploads.max_icon_upload_size / 1024 / 1024
    );

    let state = AppState {
        pool,
        config,
        storage,
        queue,
        validator,
    };

    let worker_count = if is_development {
        info!(
            "Starting server at http://{} (4 workers - development mode)",
            bind_address
        );
        4
    } else {
        let cpus = num_cpus::get();
        info!("Starting server at http://{} ({} workers)", bind_address, cpus);
        cpus
    };

    let openapi = ApiDoc::openapi();

    // Start HTTP server
    let server = HttpServer::new(move || {
        let cors = if is_development {
            // Permissive CORS for development
            Cors::default()
                .allowed_origin("http://localhost:3000")
                .allowed_origin("http://127.0.0.1:3000")
                .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
                .allowed_header(USER_HEADER)
                .supports_credentials()
                .max_age(3600)
        } else {
            // Restrictive CORS for production (same-origin only)
            Cors::default()
                .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
                .allowed_header(USER_HEADER)
                .max_age(3600)
        };

        let state = state.clone();
        App::new()
            // Refuse writes before anything else runs
            .wrap(ReadOnly::new(read_only))
            .wrap(RequestLogger)
            // CORS must wrap outermost so preflights are answered first
            .wrap(cors)
            .configure(|cfg| state.configure(cfg))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
    });

    server
        .workers(worker_count)
        .bind(&bind_address)?
        .run()
        .await
}
