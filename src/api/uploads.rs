//! Package and image uploads, and the upload validation report.

use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use futures_util::StreamExt;
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use uuid::Uuid;

use super::found;
use crate::auth::CurrentUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::db::uploads::NewUpload;
use crate::entity::file_upload;
use crate::error::{AppError, AppResult};
use crate::models::fields::clamp_filename;
use crate::models::{AuthenticatedUser, ImageUploadResponse, ReportPage, ValidationResponse};
use crate::services::validation::{upload_detail as build_upload_detail, upload_json_url};
use crate::services::{OutgoingLinker, Storage, Task, TaskQueue};

/// Multipart field carrying the package.
const UPLOAD_FIELD: &str = "upload";
/// Multipart field carrying an icon or screenshot.
const IMAGE_FIELD: &str = "upload_image";

/// Upload an add-on package and queue its validation.
///
/// Content-Type: multipart/form-data, package in the `upload` field.
#[utoipa::path(
    post,
    path = "/developers/upload",
    tag = "Uploads",
    responses(
        (status = 302, description = "Stored, to the upload's validation JSON"),
        (status = 400, description = "Missing or oversized file", body = crate::error::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
    ),
    security(("devhub_user" = []))
)]
pub async fn upload(
    CurrentUser(user): CurrentUser,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    storage: web::Data<Storage>,
    queue: web::Data<dyn TaskQueue>,
    mut payload: Multipart,
) -> AppResult<HttpResponse> {
    let max_size = config.uploads.max_upload_size;

    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::InvalidInput(format!("Multipart error: {}", e)))?;
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = clamp_filename(
            field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .unwrap_or_default(),
        );

        let key = Storage::upload_key(Uuid::new_v4());
        let mut file = storage.create(&key).await?;
        let mut hasher = Sha256::new();
        let mut size = 0usize;

        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| AppError::InvalidInput(format!("Read error: {}", e)))?;
            size += chunk.len();
            if size > max_size {
                drop(file);
                storage.delete(&key).await?;
                return Err(AppError::field(
                    UPLOAD_FIELD,
                    format!("Packages must be smaller than {} bytes.", max_size),
                ));
            }
            hasher.update(&chunk);
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        let upload = pool
            .insert_upload(NewUpload {
                user_id: Some(user.id),
                name: filename,
                path: key,
                size: size as i64,
                hash: format!("sha256:{}", hex::encode(hasher.finalize())),
            })
            .await?;
        info!(
            "Upload {} stored for user {} ({} bytes)",
            upload.id.simple(),
            user.id,
            upload.size
        );

        if config.validation.validate_addons {
            queue.submit(Task::ValidateUpload(upload.id)).await?;
        }
        return Ok(found(upload_json_url(upload.id)));
    }

    Err(AppError::field(UPLOAD_FIELD, "No file was submitted."))
}

fn image_error(message: impl Into<String>) -> HttpResponse {
    HttpResponse::Ok().json(ImageUploadResponse {
        upload_hash: String::new(),
        errors: vec![message.into()],
    })
}

/// Upload an icon or screenshot for later use in the media form.
///
/// Content-Type: multipart/form-data, image in the `upload_image` field.
#[utoipa::path(
    post,
    path = "/developers/upload-image",
    tag = "Uploads",
    responses(
        (status = 200, description = "Upload token, or the reasons the image was refused", body = ImageUploadResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
    ),
    security(("devhub_user" = []))
)]
pub async fn upload_image(
    CurrentUser(user): CurrentUser,
    config: web::Data<Config>,
    storage: web::Data<Storage>,
    mut payload: Multipart,
) -> AppResult<HttpResponse> {
    let max_size = config.uploads.max_icon_upload_size;

    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::InvalidInput(format!("Multipart error: {}", e)))?;
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| AppError::InvalidInput(format!("Read error: {}", e)))?;
            data.extend_from_slice(&chunk);
            if data.len() > max_size {
                return Ok(image_error(format!(
                    "Please use images smaller than {}MB.",
                    max_size / (1024 * 1024)
                )));
            }
        }

        if Storage::image_content_type(&data).is_none() {
            return Ok(image_error("Images must be either PNG or JPG."));
        }

        let upload_hash = Uuid::new_v4().simple().to_string();
        storage
            .put(&Storage::temp_image_key(&upload_hash), &data)
            .await?;
        info!("Image {} uploaded by user {}", upload_hash, user.id);

        return Ok(HttpResponse::Ok().json(ImageUploadResponse {
            upload_hash,
            errors: Vec::new(),
        }));
    }

    Ok(image_error("No file was submitted."))
}

/// Uploads are private to whoever sent them.
async fn load_upload(
    pool: &DbPool,
    user: &AuthenticatedUser,
    raw_id: &str,
) -> AppResult<file_upload::Model> {
    let not_found = || AppError::NotFound(format!("Upload {}", raw_id));
    let id = Uuid::parse_str(raw_id).map_err(|_| not_found())?;
    let upload = pool.get_upload(id).await?.ok_or_else(not_found)?;

    if upload.user_id.is_some() && upload.user_id != Some(user.id) && !user.is_admin() {
        warn!("User {} asked for upload {} of another user", user.id, raw_id);
        return Err(not_found());
    }
    Ok(upload)
}

/// Report page of an upload.
#[utoipa::path(
    get,
    path = "/developers/upload/{uuid}",
    tag = "Uploads",
    params(("uuid" = String, Path, description = "Upload id")),
    responses(
        (status = 200, description = "Report page", body = ReportPage),
        (status = 404, description = "Upload not found", body = crate::error::ErrorResponse),
    ),
    security(("devhub_user" = []))
)]
pub async fn upload_report(
    CurrentUser(user): CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let upload = load_upload(&pool, &user, &path).await?;
    Ok(HttpResponse::Ok().json(ReportPage {
        filename: upload.name.clone(),
        timestamp: upload.created_at,
        validate_url: upload_json_url(upload.id),
    }))
}

/// Validation JSON of an upload.
#[utoipa::path(
    get,
    path = "/developers/upload/{uuid}/json",
    tag = "Uploads",
    params(("uuid" = String, Path, description = "Upload id")),
    responses(
        (status = 200, description = "Validation result", body = ValidationResponse),
        (status = 404, description = "Upload not found", body = crate::error::ErrorResponse),
    ),
    security(("devhub_user" = []))
)]
pub async fn upload_detail(
    CurrentUser(user): CurrentUser,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    storage: web::Data<Storage>,
    linker: web::Data<OutgoingLinker>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let upload = load_upload(&pool, &user, &path).await?;
    let response = build_upload_detail(&upload, &config.validation, &linker, storage.root()).await;
    Ok(HttpResponse::Ok().json(response))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/developers/upload").route(web::post().to(upload)))
        .service(web::resource("/developers/upload-image").route(web::post().to(upload_image)))
        .service(web::resource("/developers/upload/{uuid}").route(web::get().to(upload_report)))
        .service(
            web::resource("/developers/upload/{uuid}/json").route(web::get().to(upload_detail)),
        );
}
