//! Shared test helpers for the developer hub suite.

use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::header;
use actix_web::test::TestRequest;
use actix_web::{App, test};
use async_trait::async_trait;
use devhub_lib::app::AppState;
use devhub_lib::config::{
    Config, DatabaseSettings, Environment, RedirectSettings, USER_HEADER, UploadSettings,
    ValidationSettings,
};
use devhub_lib::db::DbPool;
use devhub_lib::db::addons::{NewAddon, NewVersionApp};
use devhub_lib::db::uploads::NewUpload;
use devhub_lib::entity::{addon, file};
use devhub_lib::middleware::ReadOnly;
use devhub_lib::models::{AddonType, Application, Platform, UserRole};
use devhub_lib::services::{
    InlineTaskQueue, LoggingIndexer, PackageValidator, Storage, TaskQueue, TaskRunner, Validator,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use secrecy::SecretString;
use serde_json::Value;
use tempfile::TempDir;
use uuid::Uuid;
use zip::write::SimpleFileOptions;

pub const FIREFOX_GUID: &str = "{ec8030f7-c20a-464f-9b0e-13a3a9e97384}";

/// Counts validator runs so tests can see cache hits.
#[derive(Default)]
pub struct CountingValidator {
    runs: AtomicUsize,
}

impl CountingValidator {
    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Validator for CountingValidator {
    async fn validate(&self, path: &Path) -> Result<Value, String> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        PackageValidator.validate(path).await
    }
}

/// One isolated hub: database, storage and the state handed to the app.
pub struct TestEnv {
    pub pool: DbPool,
    pub storage: Storage,
    pub config: Config,
    pub validator: Arc<CountingValidator>,
    pub queue: Arc<dyn TaskQueue>,
    _dir: TempDir,
}

pub fn test_config(root: &Path) -> Config {
    Config {
        environment: Environment::Development,
        host: "127.0.0.1".to_string(),
        port: 0,
        database: DatabaseSettings {
            url: format!("sqlite://{}?mode=rwc", root.join("devhub.db").display()),
            max_connections: 4,
            min_connections: 1,
        },
        data_dir: root.join("data"),
        uploads: UploadSettings {
            max_upload_size: 1024 * 1024,
            max_icon_upload_size: 64 * 1024,
        },
        validation: ValidationSettings {
            validate_addons: true,
            expose_tracebacks: false,
        },
        redirect: RedirectSettings {
            base_url: "https://outgoing.example.org/v1".to_string(),
            secret_key: SecretString::from("test-redirect-secret".to_string()),
        },
        read_only: false,
        cron_interval_secs: 3600,
        agreement_path: None,
    }
}

/// Fresh database with migrations applied.
pub async fn setup() -> TestEnv {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = test_config(dir.path());

    let pool = DbPool::new(&config)
        .await
        .expect("Failed to connect to database");
    pool.run_migrations()
        .await
        .expect("Failed to run migrations");

    let storage = Storage::new(config.data_dir.clone());
    storage
        .ensure_dirs()
        .await
        .expect("Failed to create data dirs");

    let validator = Arc::new(CountingValidator::default());
    let runner = Arc::new(TaskRunner::new(
        pool.clone(),
        storage.clone(),
        validator.clone(),
        Arc::new(LoggingIndexer),
    ));
    let queue: Arc<dyn TaskQueue> = Arc::new(InlineTaskQueue::new(runner));

    TestEnv {
        pool,
        storage,
        config,
        validator,
        queue,
        _dir: dir,
    }
}

impl TestEnv {
    pub fn state(&self, read_only: bool) -> AppState {
        let mut config = self.config.clone();
        config.read_only = read_only;
        AppState {
            pool: self.pool.with_read_only(read_only),
            config,
            storage: self.storage.clone(),
            queue: Arc::clone(&self.queue),
            validator: self.validator.clone(),
        }
    }

    pub async fn user(&self, username: &str, role: UserRole) -> i64 {
        self.pool
            .insert_user(username, Some(&format!("{}@example.org", username)), role)
            .await
            .expect("Failed to insert user")
            .id
    }

    /// Store a package and record it as an upload of `user_id`.
    pub async fn upload(&self, user_id: i64, package: &[u8]) -> Uuid {
        let key = Storage::upload_key(Uuid::new_v4());
        self.storage
            .put(&key, package)
            .await
            .expect("Failed to store package");
        self.pool
            .insert_upload(NewUpload {
                user_id: Some(user_id),
                name: "addon.zip".to_string(),
                path: key,
                size: package.len() as i64,
                hash: "sha256:00".to_string(),
            })
            .await
            .expect("Failed to insert upload")
            .id
    }

    /// Create an add-on owned by `user_id`, its submission tracked at step 3.
    pub async fn addon(&self, user_id: i64, name: &str) -> addon::Model {
        let upload_id = self.upload(user_id, &package(name, "1.0")).await;
        let upload = self
            .pool
            .get_upload(upload_id)
            .await
            .expect("Failed to load upload")
            .expect("Upload missing");

        self.pool
            .create_addon(NewAddon {
                user_id,
                guid: Some(format!("{}@example.org", Uuid::new_v4().simple())),
                name: name.to_string(),
                addon_type: AddonType::Extension,
                version: "1.0".to_string(),
                apps: vec![NewVersionApp {
                    application: Application::Firefox,
                    min_version: "3.0".to_string(),
                    max_version: "4.*".to_string(),
                }],
                platforms: vec![Platform::All],
                upload,
            })
            .await
            .expect("Failed to create add-on")
    }

    /// Add-on whose submission went through to the preliminary queue.
    pub async fn submitted_addon(&self, user_id: i64, name: &str) -> addon::Model {
        let created = self.addon(user_id, name).await;
        self.pool
            .finish_submission(
                created.id,
                devhub_lib::models::ReviewRequest::Preliminary,
                user_id,
            )
            .await
            .expect("Failed to finish submission")
    }

    pub async fn reload(&self, addon_id: i64) -> addon::Model {
        self.pool
            .get_addon(addon_id)
            .await
            .expect("Failed to load add-on")
            .expect("Add-on missing")
    }

    /// Files of an add-on's versions.
    pub async fn files(&self, addon_id: i64) -> Vec<file::Model> {
        let versions = devhub_lib::entity::version::Entity::find()
            .filter(devhub_lib::entity::version::Column::AddonId.eq(addon_id))
            .all(self.pool.connection())
            .await
            .expect("Failed to list versions");
        let ids: Vec<i64> = versions.iter().map(|v| v.id).collect();
        file::Entity::find()
            .filter(file::Column::VersionId.is_in(ids))
            .all(self.pool.connection())
            .await
            .expect("Failed to list files")
    }
}

/// Create a test hub app. Maintenance mode refuses writes in the middleware
/// and in the pool.
pub async fn create_test_app(
    env: &TestEnv,
    read_only: bool,
) -> impl Service<actix_http::Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>
{
    let state = env.state(read_only);
    test::init_service(
        App::new()
            .wrap(ReadOnly::new(read_only))
            .configure(move |cfg| state.configure(cfg)),
    )
    .await
}

/// Zip archive with a manifest for `name`.
pub fn package(name: &str, version: &str) -> Vec<u8> {
    let manifest = serde_json::json!({
        "id": format!("{}@example.org", name.to_lowercase().replace(' ', "-")),
        "name": name,
        "version": version,
        "applications": [{ "guid": FIREFOX_GUID, "min_version": "3.0", "max_version": "4.*" }],
    });
    zip_files(&[
        ("manifest.json", manifest.to_string().as_bytes()),
        ("main.js", b"run();"),
    ])
}

pub fn zip_files(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in files {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .expect("Failed to start zip entry");
        writer.write_all(content).expect("Failed to write zip entry");
    }
    writer
        .finish()
        .expect("Failed to finish zip")
        .into_inner()
}

pub fn as_user(req: TestRequest, user_id: i64) -> TestRequest {
    req.insert_header((USER_HEADER, user_id.to_string()))
}

pub fn get(uri: &str, user_id: i64) -> TestRequest {
    as_user(TestRequest::get().uri(uri), user_id)
}

pub fn post_json(uri: &str, user_id: i64, body: Value) -> TestRequest {
    as_user(TestRequest::post().uri(uri), user_id).set_json(body)
}

/// Multipart request carrying one file field.
pub fn post_file(uri: &str, user_id: i64, field: &str, filename: &str, data: &[u8]) -> TestRequest {
    const BOUNDARY: &str = "devhub-test-boundary";

    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    as_user(TestRequest::post().uri(uri), user_id)
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        ))
        .set_payload(body)
}

/// Status and `Location` of a response.
pub fn redirect_of<B>(resp: &ServiceResponse<B>) -> (u16, String) {
    let location = resp
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    (resp.status().as_u16(), location)
}

/// Send a request and return status plus JSON body (`Null` when empty).
pub async fn call_json<S, B>(app: &S, req: TestRequest) -> (u16, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let resp = test::call_service(app, req.to_request()).await;
    let status = resp.status().as_u16();
    let bytes = test::read_body(resp).await;
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

/// Send a request that is expected to redirect; returns status and location.
pub async fn call_redirect<S, B>(app: &S, req: TestRequest) -> (u16, String)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let resp = test::call_service(app, req.to_request()).await;
    redirect_of(&resp)
}

pub fn submit_url(slug: &str, step: i32) -> String {
    format!("/api/v1/developers/addon/{}/submit/{}", slug, step)
}

pub fn addon_url(slug: &str, rest: &str) -> String {
    format!("/api/v1/developers/addon/{}/{}", slug, rest)
}
