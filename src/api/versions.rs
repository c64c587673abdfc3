//! Versions page and version deletion.

use actix_web::{HttpResponse, web};
use tracing::info;

use super::{found, pending_submission, versions_url};
use crate::auth::CurrentUser;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::addon::available_review_requests;
use crate::models::{AddonStatus, AddonSummary, DeleteVersionForm, VersionListResponse};
use crate::services::{AddonAccess, Task, TaskQueue, authorize_addon};

/// Versions of an add-on with the review actions currently offered.
#[utoipa::path(
    get,
    path = "/developers/addon/{slug}/versions",
    tag = "Versions",
    params(("slug" = String, Path, description = "Add-on slug")),
    responses(
        (status = 200, description = "Versions", body = VersionListResponse),
        (status = 302, description = "Submission unfinished, back into the wizard"),
        (status = 404, description = "Add-on not found", body = crate::error::ErrorResponse),
    ),
    security(("devhub_user" = []))
)]
pub async fn list_versions(
    CurrentUser(user): CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let addon = authorize_addon(&pool, &user, &path, false, AddonAccess::AUTHORS).await?;
    if let Some(redirect) = pending_submission(&pool, &addon).await? {
        return Ok(redirect);
    }

    let versions = pool.get_version_summaries(addon.id).await?;
    let status = AddonStatus::from_i32(addon.status);
    let review_requests = match status {
        Some(status) => {
            let reviewable = pool.has_reviewable_files(addon.id).await?;
            available_review_requests(status, addon.disabled_by_user, reviewable)
        }
        None => Vec::new(),
    };

    Ok(HttpResponse::Ok().json(VersionListResponse {
        addon: AddonSummary::from_model(&addon, None),
        versions,
        review_requests,
        can_cancel_review: status.is_some_and(AddonStatus::is_under_review),
    }))
}

/// Delete one version.
#[utoipa::path(
    post,
    path = "/developers/addon/{slug}/versions/delete",
    tag = "Versions",
    params(("slug" = String, Path, description = "Add-on slug")),
    request_body = DeleteVersionForm,
    responses(
        (status = 302, description = "Deleted, to the versions page"),
        (status = 403, description = "Not allowed", body = crate::error::ErrorResponse),
        (status = 404, description = "Version not found", body = crate::error::ErrorResponse),
    ),
    security(("devhub_user" = []))
)]
pub async fn delete_version(
    CurrentUser(user): CurrentUser,
    pool: web::Data<DbPool>,
    queue: web::Data<dyn TaskQueue>,
    path: web::Path<String>,
    body: web::Json<DeleteVersionForm>,
) -> AppResult<HttpResponse> {
    let addon = authorize_addon(&pool, &user, &path, true, AddonAccess::AUTHORS).await?;
    pool.delete_version(&addon, body.version_id, user.id).await?;
    info!(
        "Version {} of add-on {} deleted by user {}",
        body.version_id, addon.slug, user.id
    );
    queue.submit(Task::VersionChanged(addon.id)).await?;
    Ok(found(versions_url(&addon.slug)))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/developers/addon/{slug}/versions").route(web::get().to(list_versions)),
    )
    .service(
        web::resource("/developers/addon/{slug}/versions/delete")
            .route(web::post().to(delete_version)),
    );
}
