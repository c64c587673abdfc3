//! API endpoint modules.

pub mod dashboard;
pub mod edit;
pub mod health;
pub mod openapi;
pub mod status;
pub mod submit;
pub mod uploads;
pub mod validation;
pub mod versions;

use actix_web::{HttpResponse, http::header, web};
use tracing::warn;

use crate::db::DbPool;
use crate::db::addons::MediaOutcome;
use crate::entity::addon;
use crate::error::AppResult;
use crate::services::{Storage, Task, TaskQueue};

pub use health::configure_health_routes;
pub use openapi::ApiDoc;

/// Mount point of every route below.
pub const API_PREFIX: &str = "/api/v1";

/// Register all developer hub routes. Call inside the `/api/v1` scope.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(configure_health_routes)
        .configure(dashboard::configure_routes)
        .configure(submit::configure_routes)
        .configure(edit::configure_routes)
        .configure(status::configure_routes)
        .configure(versions::configure_routes)
        .configure(uploads::configure_routes)
        .configure(validation::configure_routes);
}

/// `302 Found` to `location`.
pub(crate) fn found(location: impl AsRef<str>) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location.as_ref()))
        .finish()
}

pub(crate) fn dashboard_url() -> String {
    format!("{}/developers/addons", API_PREFIX)
}

/// Wizard page of `step`. Steps before the add-on exists have no slug.
pub(crate) fn step_url(slug: Option<&str>, step: i32) -> String {
    match slug {
        Some(slug) => format!("{}/developers/addon/{}/submit/{}", API_PREFIX, slug, step),
        None => format!("{}/developers/addon/submit/{}", API_PREFIX, step),
    }
}

pub(crate) fn versions_url(slug: &str) -> String {
    format!("{}/developers/addon/{}/versions", API_PREFIX, slug)
}

pub(crate) fn edit_url(slug: &str, section: &str) -> String {
    format!("{}/developers/addon/{}/edit/{}", API_PREFIX, slug, section)
}

/// Management pages send authors of an unfinished submission back into the
/// wizard.
pub(crate) async fn pending_submission(
    pool: &DbPool,
    addon: &addon::Model,
) -> AppResult<Option<HttpResponse>> {
    let step = pool.get_submit_step(addon.id).await?;
    Ok(step.map(|step| found(step_url(Some(&addon.slug), step))))
}

/// Move freshly uploaded images into place and queue removal of deleted ones.
/// Runs after the media transaction has committed.
pub(crate) async fn finish_media(
    storage: &Storage,
    queue: &dyn TaskQueue,
    addon_id: i64,
    outcome: &MediaOutcome,
) -> AppResult<()> {
    for (preview_id, upload_hash) in &outcome.created {
        if let Err(e) = storage.attach_preview(upload_hash, addon_id, *preview_id).await {
            warn!(
                "Could not attach image of preview {} (add-on {}): {}",
                preview_id, addon_id, e
            );
        }
    }
    for preview_id in &outcome.deleted {
        queue
            .submit(Task::DeletePreviewFiles {
                addon_id,
                preview_id: *preview_id,
            })
            .await?;
    }
    Ok(())
}
