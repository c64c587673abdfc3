//! Validation reports of stored files.

use actix_web::{HttpResponse, web};

use super::API_PREFIX;
use crate::auth::CurrentUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{ReportPage, ValidationResponse};
use crate::services::validation::{get_or_validate, result_response};
use crate::services::{AddonAccess, OutgoingLinker, Storage, Validator, authorize_addon};

fn file_validation_json_url(slug: &str, file_id: i64) -> String {
    format!(
        "{}/developers/addon/{}/file/{}/validation.json",
        API_PREFIX, slug, file_id
    )
}

/// Report page of one file.
#[utoipa::path(
    get,
    path = "/developers/addon/{slug}/file/{file_id}/validation",
    tag = "Validation",
    params(
        ("slug" = String, Path, description = "Add-on slug"),
        ("file_id" = i64, Path, description = "File id")
    ),
    responses(
        (status = 200, description = "Report page", body = ReportPage),
        (status = 404, description = "File not found", body = crate::error::ErrorResponse),
    ),
    security(("devhub_user" = []))
)]
pub async fn file_validation(
    CurrentUser(user): CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<(String, i64)>,
) -> AppResult<HttpResponse> {
    let (slug, file_id) = path.into_inner();
    let addon =
        authorize_addon(&pool, &user, &slug, false, AddonAccess::AUTHORS_AND_EDITORS).await?;
    let file = pool.get_addon_file(addon.id, file_id).await?;

    Ok(HttpResponse::Ok().json(ReportPage {
        filename: file.filename.clone(),
        timestamp: file.created_at,
        validate_url: file_validation_json_url(&addon.slug, file.id),
    }))
}

/// Validation JSON of a file. Validates and stores the result on first use.
#[utoipa::path(
    post,
    path = "/developers/addon/{slug}/file/{file_id}/validation.json",
    tag = "Validation",
    params(
        ("slug" = String, Path, description = "Add-on slug"),
        ("file_id" = i64, Path, description = "File id")
    ),
    responses(
        (status = 200, description = "Validation result", body = ValidationResponse),
        (status = 404, description = "File not found", body = crate::error::ErrorResponse),
    ),
    security(("devhub_user" = []))
)]
pub async fn json_file_validation(
    CurrentUser(user): CurrentUser,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    storage: web::Data<Storage>,
    validator: web::Data<dyn Validator>,
    linker: web::Data<OutgoingLinker>,
    path: web::Path<(String, i64)>,
) -> AppResult<HttpResponse> {
    let (slug, file_id) = path.into_inner();
    let addon =
        authorize_addon(&pool, &user, &slug, true, AddonAccess::AUTHORS_AND_EDITORS).await?;
    let file = pool.get_addon_file(addon.id, file_id).await?;

    let result = get_or_validate(&pool, validator.get_ref(), storage.root(), &file).await?;
    Ok(HttpResponse::Ok().json(result_response(&result, &config.validation, &linker)))
}

/// A stored validation result, looked up by its own id.
#[utoipa::path(
    post,
    path = "/developers/addon/{slug}/validation-result/{result_id}.json",
    tag = "Validation",
    params(
        ("slug" = String, Path, description = "Add-on slug"),
        ("result_id" = i64, Path, description = "Validation result id")
    ),
    responses(
        (status = 200, description = "Validation result", body = ValidationResponse),
        (status = 404, description = "Result not found", body = crate::error::ErrorResponse),
    ),
    security(("devhub_user" = []))
)]
pub async fn json_validation_result(
    CurrentUser(user): CurrentUser,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    linker: web::Data<OutgoingLinker>,
    path: web::Path<(String, i64)>,
) -> AppResult<HttpResponse> {
    let (slug, result_id) = path.into_inner();
    let addon =
        authorize_addon(&pool, &user, &slug, true, AddonAccess::AUTHORS_AND_EDITORS).await?;

    let result = pool
        .get_validation_result_by_id(result_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Validation result {}", result_id)))?;
    // The result must belong to a file of this add-on.
    pool.get_addon_file(addon.id, result.file_id).await?;

    Ok(HttpResponse::Ok().json(result_response(&result, &config.validation, &linker)))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/developers/addon/{slug}/file/{file_id}/validation")
            .route(web::get().to(file_validation)),
    )
    .service(
        web::resource("/developers/addon/{slug}/file/{file_id}/validation.json")
            .route(web::post().to(json_file_validation)),
    )
    .service(
        web::resource("/developers/addon/{slug}/validation-result/{result_id}.json")
            .route(web::post().to(json_validation_result)),
    );
}
