//! Developer status actions: enable, disable, cancel review, delete and
//! review requests.

use actix_web::{HttpResponse, web};
use tracing::info;

use super::{dashboard_url, found, versions_url};
use crate::auth::CurrentUser;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::addon::{
    available_review_requests, status_after_cancel, status_after_review_request,
};
use crate::models::{AddonStatus, DeleteAddonForm, LogAction, ReviewRequest};
use crate::services::{AddonAccess, Task, TaskQueue, authorize_addon};

/// Show the add-on again.
#[utoipa::path(
    post,
    path = "/developers/addon/{slug}/enable",
    tag = "Status",
    params(("slug" = String, Path, description = "Add-on slug")),
    responses(
        (status = 302, description = "Enabled, to the versions page"),
        (status = 403, description = "Owners only", body = crate::error::ErrorResponse),
    ),
    security(("devhub_user" = []))
)]
pub async fn enable(
    CurrentUser(user): CurrentUser,
    pool: web::Data<DbPool>,
    queue: web::Data<dyn TaskQueue>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let addon = authorize_addon(&pool, &user, &path, true, AddonAccess::OWNERS).await?;
    let updated = pool.set_disabled_by_user(addon.id, false, user.id).await?;
    info!("Add-on {} enabled by user {}", updated.slug, user.id);
    queue.submit(Task::Reindex(vec![updated.id])).await?;
    Ok(found(versions_url(&updated.slug)))
}

/// Hide the add-on without changing its review status.
#[utoipa::path(
    post,
    path = "/developers/addon/{slug}/disable",
    tag = "Status",
    params(("slug" = String, Path, description = "Add-on slug")),
    responses(
        (status = 302, description = "Disabled, to the versions page"),
        (status = 403, description = "Owners only", body = crate::error::ErrorResponse),
    ),
    security(("devhub_user" = []))
)]
pub async fn disable(
    CurrentUser(user): CurrentUser,
    pool: web::Data<DbPool>,
    queue: web::Data<dyn TaskQueue>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let addon = authorize_addon(&pool, &user, &path, true, AddonAccess::OWNERS).await?;
    let updated = pool.set_disabled_by_user(addon.id, true, user.id).await?;
    info!("Add-on {} disabled by user {}", updated.slug, user.id);
    queue.submit(Task::Reindex(vec![updated.id])).await?;
    Ok(found(versions_url(&updated.slug)))
}

/// Withdraw from the review queue. Add-ons not under review are left alone.
#[utoipa::path(
    post,
    path = "/developers/addon/{slug}/cancel",
    tag = "Status",
    params(("slug" = String, Path, description = "Add-on slug")),
    responses(
        (status = 302, description = "To the versions page"),
        (status = 403, description = "Owners only", body = crate::error::ErrorResponse),
    ),
    security(("devhub_user" = []))
)]
pub async fn cancel(
    CurrentUser(user): CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let addon = authorize_addon(&pool, &user, &path, true, AddonAccess::OWNERS).await?;

    let next = AddonStatus::from_i32(addon.status).and_then(status_after_cancel);
    if let Some(status) = next {
        pool.set_addon_status(addon.id, status, LogAction::ChangeStatus, user.id)
            .await?;
        info!("Review of {} cancelled, now {}", addon.slug, status.as_str());
    }
    Ok(found(versions_url(&addon.slug)))
}

/// Soft-delete the add-on. The slug must be re-typed.
#[utoipa::path(
    post,
    path = "/developers/addon/{slug}/delete",
    tag = "Status",
    params(("slug" = String, Path, description = "Add-on slug")),
    request_body = DeleteAddonForm,
    responses(
        (status = 302, description = "Deleted, to the dashboard"),
        (status = 400, description = "Slug did not match", body = crate::error::ErrorResponse),
        (status = 403, description = "Owners only", body = crate::error::ErrorResponse),
    ),
    security(("devhub_user" = []))
)]
pub async fn delete(
    CurrentUser(user): CurrentUser,
    pool: web::Data<DbPool>,
    queue: web::Data<dyn TaskQueue>,
    path: web::Path<String>,
    body: web::Json<DeleteAddonForm>,
) -> AppResult<HttpResponse> {
    let addon = authorize_addon(&pool, &user, &path, true, AddonAccess::OWNERS).await?;
    if body.slug.trim() != addon.slug {
        return Err(AppError::field(
            "slug",
            "Slug incorrect. Add-on was not deleted.",
        ));
    }

    pool.set_addon_status(addon.id, AddonStatus::Deleted, LogAction::DeleteAddon, user.id)
        .await?;
    info!("Add-on {} deleted by user {}", addon.slug, user.id);
    queue.submit(Task::Reindex(vec![addon.id])).await?;

    Ok(found(dashboard_url()))
}

/// Ask for a review, addressed by the status it aims for.
#[utoipa::path(
    post,
    path = "/developers/addon/{slug}/request-review/{status}",
    tag = "Status",
    params(
        ("slug" = String, Path, description = "Add-on slug"),
        ("status" = i32, Path, description = "Target status: 4 for full, 8 for preliminary review")
    ),
    responses(
        (status = 302, description = "Queued, to the versions page"),
        (status = 400, description = "Request not available", body = crate::error::ErrorResponse),
        (status = 404, description = "Unknown target status", body = crate::error::ErrorResponse),
    ),
    security(("devhub_user" = []))
)]
pub async fn request_review(
    CurrentUser(user): CurrentUser,
    pool: web::Data<DbPool>,
    queue: web::Data<dyn TaskQueue>,
    path: web::Path<(String, i32)>,
) -> AppResult<HttpResponse> {
    let (slug, target) = path.into_inner();
    let request = ReviewRequest::from_target_status(target)
        .ok_or_else(|| AppError::NotFound(format!("Review status {}", target)))?;
    let addon = authorize_addon(&pool, &user, &slug, true, AddonAccess::AUTHORS).await?;

    let current = AddonStatus::from_i32(addon.status)
        .ok_or_else(|| AppError::InvalidInput(format!("Unknown status {}", addon.status)))?;
    let reviewable = pool.has_reviewable_files(addon.id).await?;
    if !available_review_requests(current, addon.disabled_by_user, reviewable).contains(&request) {
        return Err(AppError::InvalidInput(format!(
            "A {:?} review cannot be requested for this add-on",
            request
        )));
    }

    let status = status_after_review_request(current, request);
    pool.set_addon_status(addon.id, status, LogAction::ChangeStatus, user.id)
        .await?;
    info!(
        "Add-on {} requested {:?} review, now {}",
        addon.slug,
        request,
        status.as_str()
    );
    queue.submit(Task::Reindex(vec![addon.id])).await?;

    Ok(found(versions_url(&addon.slug)))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/developers/addon/{slug}/enable").route(web::post().to(enable)))
        .service(web::resource("/developers/addon/{slug}/disable").route(web::post().to(disable)))
        .service(web::resource("/developers/addon/{slug}/cancel").route(web::post().to(cancel)))
        .service(web::resource("/developers/addon/{slug}/delete").route(web::post().to(delete)))
        .service(
            web::resource("/developers/addon/{slug}/request-review/{status}")
                .route(web::post().to(request_review)),
        );
}
