//! Submission wizard.
//!
//! Steps 1 and 2 run before the add-on exists. From step 3 on every request
//! goes through the step gate, which compares the step in the URL with the
//! persisted tracker and redirects when the request runs ahead of it.

use actix_web::cookie::Cookie;
use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, web};
use serde_json::{Value as JsonValue, json};
use tracing::info;

use super::{finish_media, found, step_url, versions_url};
use crate::auth::CurrentUser;
use crate::config::{Config, ValidationSettings};
use crate::db::DbPool;
use crate::db::addons::{FIRST_TRACKED_STEP, NewAddon};
use crate::entity::{addon, file_upload};
use crate::error::{AppError, AppResult};
use crate::models::submit::{ICON_TYPES, PreviewChange};
use crate::models::{
    AddonStatus, AddonType, AuthenticatedUser, BUILTIN_LICENSES, BumpForm, DescribeForm,
    LicenseForm, MAX_STEP, MediaForm, NewAddonForm, Platform, ReviewRequest, ReviewTypeForm, Step,
    StepPage,
};
use crate::services::package::parse_addon_file;
use crate::services::submit_gate::next_tracked_step;
use crate::services::{
    AddonAccess, GateDecision, Storage, Task, TaskQueue, TrackerState, authorize_addon, gate,
};

/// Cookie set once the developer agreement has been accepted.
pub const AGREEMENT_COOKIE: &str = "devhub_agreement";

/// Result of entering a tracked step.
enum Entry {
    Page(addon::Model, Step),
    Redirect(HttpResponse),
}

/// Load the add-on, check access and run the step gate.
async fn enter(
    pool: &DbPool,
    user: &AuthenticatedUser,
    slug: &str,
    declared: i32,
    is_write: bool,
) -> AppResult<Entry> {
    let addon = authorize_addon(pool, user, slug, is_write, AddonAccess::AUTHORS).await?;
    let tracker = TrackerState::from(pool.get_submit_step(addon.id).await?);

    Ok(match gate(declared, tracker) {
        GateDecision::Proceed(step) => Entry::Page(addon, step),
        GateDecision::Redirect(to) => {
            info!(
                "Step {} of {} is ahead of its submission, redirecting to {}",
                declared, addon.slug, to
            );
            Entry::Redirect(found(step_url(Some(&addon.slug), to)))
        }
    })
}

fn page(step: Step, addon: Option<&addon::Model>, context: JsonValue) -> HttpResponse {
    HttpResponse::Ok().json(StepPage {
        step,
        addon: addon.map(|a| a.slug.clone()),
        context,
    })
}

fn agreement_accepted(req: &HttpRequest) -> bool {
    req.cookie(AGREEMENT_COOKIE).is_some_and(|c| c.value() == "1")
}

/// Steps before the add-on exists are never gated.
fn untracked(declared: i32) -> Step {
    Step {
        current: declared,
        max: MAX_STEP,
    }
}

/// Step 1: the developer agreement.
#[utoipa::path(
    get,
    path = "/developers/addon/submit/1",
    tag = "Submit",
    responses(
        (status = 200, description = "Agreement page", body = StepPage),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
    ),
    security(("devhub_user" = []))
)]
pub async fn agreement(
    CurrentUser(_user): CurrentUser,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    let text = match &config.agreement_path {
        Some(path) => Some(tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::Storage(format!("Failed to read agreement {}: {}", path.display(), e))
        })?),
        None => None,
    };
    Ok(page(untracked(1), None, json!({ "agreement": text })))
}

/// Accept the developer agreement.
#[utoipa::path(
    post,
    path = "/developers/addon/submit/1",
    tag = "Submit",
    responses(
        (status = 302, description = "Agreement accepted, continue to the upload step"),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
    ),
    security(("devhub_user" = []))
)]
pub async fn accept_agreement(CurrentUser(user): CurrentUser) -> AppResult<HttpResponse> {
    info!("User {} accepted the developer agreement", user.id);
    let cookie = Cookie::build(AGREEMENT_COOKIE, "1")
        .path("/")
        .http_only(true)
        .finish();
    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, step_url(None, 2)))
        .cookie(cookie)
        .finish())
}

/// Step 2: upload form.
#[utoipa::path(
    get,
    path = "/developers/addon/submit/2",
    tag = "Submit",
    responses(
        (status = 200, description = "Upload page", body = StepPage),
        (status = 302, description = "Agreement not accepted yet"),
    ),
    security(("devhub_user" = []))
)]
pub async fn upload_page(
    req: HttpRequest,
    CurrentUser(_user): CurrentUser,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    if !agreement_accepted(&req) {
        return Ok(found(step_url(None, 1)));
    }
    let platforms: Vec<Platform> = Platform::supported().collect();
    Ok(page(
        untracked(2),
        None,
        json!({
            "platforms": platforms,
            "max_upload_size": config.uploads.max_upload_size,
        }),
    ))
}

/// Uploads can only become add-ons once validation passed.
fn check_upload_ready(upload: &file_upload::Model, settings: &ValidationSettings) -> AppResult<()> {
    if !settings.validate_addons {
        return Ok(());
    }
    if upload.task_error.is_some() {
        return Err(AppError::field(
            "upload",
            "Validation of this upload failed. Please upload it again.",
        ));
    }
    let errors = upload
        .validation
        .as_deref()
        .and_then(|raw| serde_json::from_str::<JsonValue>(raw).ok())
        .and_then(|v| v.get("errors").and_then(JsonValue::as_u64));
    match errors {
        Some(0) => Ok(()),
        Some(_) => Err(AppError::field(
            "upload",
            "Fix the validation errors of this upload first.",
        )),
        None => Err(AppError::field(
            "upload",
            "Validation of this upload has not finished.",
        )),
    }
}

/// Create the add-on from a validated upload.
#[utoipa::path(
    post,
    path = "/developers/addon/submit/2",
    tag = "Submit",
    request_body = NewAddonForm,
    responses(
        (status = 302, description = "Add-on created, continue to step 3"),
        (status = 400, description = "Invalid form", body = crate::error::ErrorResponse),
    ),
    security(("devhub_user" = []))
)]
pub async fn create_addon(
    req: HttpRequest,
    CurrentUser(user): CurrentUser,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    storage: web::Data<Storage>,
    queue: web::Data<dyn TaskQueue>,
    body: web::Json<NewAddonForm>,
) -> AppResult<HttpResponse> {
    if !agreement_accepted(&req) {
        return Ok(found(step_url(None, 1)));
    }
    let form = body.into_inner().clean().map_err(AppError::Form)?;

    let upload = pool
        .get_upload(form.upload)
        .await?
        .filter(|u| u.user_id == Some(user.id))
        .ok_or_else(|| {
            AppError::field(
                "upload",
                "There was an error with your upload. Please try again.",
            )
        })?;
    check_upload_ready(&upload, &config.validation)?;

    let parsed = parse_addon_file(&storage.path(&upload.path)).await?;
    let addon = pool
        .create_addon(NewAddon {
            user_id: user.id,
            guid: parsed.guid,
            name: parsed.name,
            addon_type: parsed.addon_type,
            version: parsed.version,
            apps: parsed.apps,
            platforms: form.platforms,
            upload,
        })
        .await?;

    info!("Add-on {} ({}) created by user {}", addon.id, addon.slug, user.id);
    queue.submit(Task::VersionChanged(addon.id)).await?;

    Ok(found(step_url(Some(&addon.slug), FIRST_TRACKED_STEP)))
}

/// Step 3: describe the add-on.
#[utoipa::path(
    get,
    path = "/developers/addon/{slug}/submit/3",
    tag = "Submit",
    params(("slug" = String, Path, description = "Add-on slug")),
    responses(
        (status = 200, description = "Describe page", body = StepPage),
        (status = 302, description = "Redirected by the step gate"),
        (status = 403, description = "Not an author", body = crate::error::ErrorResponse),
        (status = 404, description = "Add-on not found", body = crate::error::ErrorResponse),
    ),
    security(("devhub_user" = []))
)]
pub async fn describe_page(
    CurrentUser(user): CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let (addon, step) = match enter(&pool, &user, &path, 3, false).await? {
        Entry::Page(addon, step) => (addon, step),
        Entry::Redirect(resp) => return Ok(resp),
    };

    let addon_type = AddonType::from_i32(addon.addon_type).unwrap_or(AddonType::Extension);
    let available: Vec<JsonValue> = pool
        .list_categories(addon_type)
        .await?
        .into_iter()
        .map(|c| json!({ "id": c.id, "name": c.name, "slug": c.slug }))
        .collect();
    let categories = pool.get_addon_category_ids(addon.id).await?;

    let context = json!({
        "name": addon.name,
        "slug": addon.slug,
        "summary": addon.summary,
        "description": addon.description,
        "categories": categories,
        "available_categories": available,
    });
    Ok(page(step, Some(&addon), context))
}

#[utoipa::path(
    post,
    path = "/developers/addon/{slug}/submit/3",
    tag = "Submit",
    params(("slug" = String, Path, description = "Add-on slug")),
    request_body = DescribeForm,
    responses(
        (status = 302, description = "Saved, continue to step 4"),
        (status = 400, description = "Invalid form", body = crate::error::ErrorResponse),
    ),
    security(("devhub_user" = []))
)]
pub async fn save_describe(
    CurrentUser(user): CurrentUser,
    pool: web::Data<DbPool>,
    queue: web::Data<dyn TaskQueue>,
    path: web::Path<String>,
    body: web::Json<DescribeForm>,
) -> AppResult<HttpResponse> {
    let (addon, step) = match enter(&pool, &user, &path, 3, true).await? {
        Entry::Page(addon, step) => (addon, step),
        Entry::Redirect(resp) => return Ok(resp),
    };
    let describe = body.clean().map_err(AppError::Form)?;

    let next = next_tracked_step(step.current).unwrap_or(step.current + 1);
    let updated = pool.save_describe(addon.id, &describe, next).await?;
    queue.submit(Task::Reindex(vec![updated.id])).await?;

    Ok(found(step_url(Some(&updated.slug), next)))
}

/// Step 4: icon and screenshots.
#[utoipa::path(
    get,
    path = "/developers/addon/{slug}/submit/4",
    tag = "Submit",
    params(("slug" = String, Path, description = "Add-on slug")),
    responses(
        (status = 200, description = "Media page", body = StepPage),
        (status = 302, description = "Redirected by the step gate"),
    ),
    security(("devhub_user" = []))
)]
pub async fn media_page(
    CurrentUser(user): CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let (addon, step) = match enter(&pool, &user, &path, 4, false).await? {
        Entry::Page(addon, step) => (addon, step),
        Entry::Redirect(resp) => return Ok(resp),
    };

    let previews: Vec<JsonValue> = pool
        .get_previews(addon.id)
        .await?
        .into_iter()
        .map(|p| json!({ "id": p.id, "caption": p.caption, "position": p.position }))
        .collect();
    let context = json!({
        "icon_type": addon.icon_type,
        "icon_types": ICON_TYPES,
        "previews": previews,
    });
    Ok(page(step, Some(&addon), context))
}

/// New previews must point at an image uploaded through the image endpoint.
pub(crate) async fn check_preview_images(storage: &Storage, previews: &[PreviewChange]) -> AppResult<()> {
    for change in previews {
        if let PreviewChange::Create { upload_hash, .. } = change
            && !storage.exists(&Storage::temp_image_key(upload_hash)).await
        {
            return Err(AppError::field("previews", "Upload a screenshot."));
        }
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/developers/addon/{slug}/submit/4",
    tag = "Submit",
    params(("slug" = String, Path, description = "Add-on slug")),
    request_body = MediaForm,
    responses(
        (status = 302, description = "Saved, continue to step 5"),
        (status = 400, description = "Invalid form", body = crate::error::ErrorResponse),
    ),
    security(("devhub_user" = []))
)]
pub async fn save_media(
    CurrentUser(user): CurrentUser,
    pool: web::Data<DbPool>,
    storage: web::Data<Storage>,
    queue: web::Data<dyn TaskQueue>,
    path: web::Path<String>,
    body: web::Json<MediaForm>,
) -> AppResult<HttpResponse> {
    let (addon, step) = match enter(&pool, &user, &path, 4, true).await? {
        Entry::Page(addon, step) => (addon, step),
        Entry::Redirect(resp) => return Ok(resp),
    };
    let media = body.clean().map_err(AppError::Form)?;
    check_preview_images(&storage, &media.previews).await?;

    let next = next_tracked_step(step.current).unwrap_or(step.current + 1);
    let outcome = pool.save_media(addon.id, &media, next).await?;
    finish_media(&storage, queue.get_ref(), addon.id, &outcome).await?;

    Ok(found(step_url(Some(&addon.slug), next)))
}

/// Step 5: license and policies.
#[utoipa::path(
    get,
    path = "/developers/addon/{slug}/submit/5",
    tag = "Submit",
    params(("slug" = String, Path, description = "Add-on slug")),
    responses(
        (status = 200, description = "License page", body = StepPage),
        (status = 302, description = "Redirected by the step gate"),
    ),
    security(("devhub_user" = []))
)]
pub async fn license_page(
    CurrentUser(user): CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let (addon, step) = match enter(&pool, &user, &path, 5, false).await? {
        Entry::Page(addon, step) => (addon, step),
        Entry::Redirect(resp) => return Ok(resp),
    };

    let license_id = pool
        .get_current_version(&addon)
        .await?
        .and_then(|v| v.license_id);
    let license = match license_id {
        Some(id) => pool.get_license(id).await?,
        None => None,
    };

    let context = json!({
        "builtin_licenses": BUILTIN_LICENSES,
        "license": license.map(|l| json!({
            "builtin": l.builtin,
            "name": l.name,
            "text": l.text,
        })),
        "privacy_policy": addon.privacy_policy,
        "eula": addon.eula,
    });
    Ok(page(step, Some(&addon), context))
}

#[utoipa::path(
    post,
    path = "/developers/addon/{slug}/submit/5",
    tag = "Submit",
    params(("slug" = String, Path, description = "Add-on slug")),
    request_body = LicenseForm,
    responses(
        (status = 302, description = "Saved, continue to step 6"),
        (status = 400, description = "Invalid form", body = crate::error::ErrorResponse),
    ),
    security(("devhub_user" = []))
)]
pub async fn save_license(
    CurrentUser(user): CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<String>,
    body: web::Json<LicenseForm>,
) -> AppResult<HttpResponse> {
    let (addon, step) = match enter(&pool, &user, &path, 5, true).await? {
        Entry::Page(addon, step) => (addon, step),
        Entry::Redirect(resp) => return Ok(resp),
    };
    let license = body.clean().map_err(AppError::Form)?;

    let next = next_tracked_step(step.current).unwrap_or(step.current + 1);
    pool.save_license(addon.id, &license, next).await?;

    Ok(found(step_url(Some(&addon.slug), next)))
}

/// Step 6: choose a review queue.
#[utoipa::path(
    get,
    path = "/developers/addon/{slug}/submit/6",
    tag = "Submit",
    params(("slug" = String, Path, description = "Add-on slug")),
    responses(
        (status = 200, description = "Review type page", body = StepPage),
        (status = 302, description = "Redirected by the step gate"),
    ),
    security(("devhub_user" = []))
)]
pub async fn review_page(
    CurrentUser(user): CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let (addon, step) = match enter(&pool, &user, &path, 6, false).await? {
        Entry::Page(addon, step) => (addon, step),
        Entry::Redirect(resp) => return Ok(resp),
    };
    let context = json!({
        "review_types": [ReviewRequest::Full, ReviewRequest::Preliminary],
    });
    Ok(page(step, Some(&addon), context))
}

/// Enter the review queue. The submission stops being tracked.
#[utoipa::path(
    post,
    path = "/developers/addon/{slug}/submit/6",
    tag = "Submit",
    params(("slug" = String, Path, description = "Add-on slug")),
    request_body = ReviewTypeForm,
    responses(
        (status = 302, description = "Submitted, continue to the final page"),
        (status = 400, description = "Invalid form", body = crate::error::ErrorResponse),
    ),
    security(("devhub_user" = []))
)]
pub async fn finish_submission(
    CurrentUser(user): CurrentUser,
    pool: web::Data<DbPool>,
    queue: web::Data<dyn TaskQueue>,
    path: web::Path<String>,
    body: web::Json<ReviewTypeForm>,
) -> AppResult<HttpResponse> {
    let (addon, _step) = match enter(&pool, &user, &path, 6, true).await? {
        Entry::Page(addon, step) => (addon, step),
        Entry::Redirect(resp) => return Ok(resp),
    };
    let request = body.clean().map_err(AppError::Form)?;

    let updated = pool.finish_submission(addon.id, request, user.id).await?;
    info!(
        "Add-on {} submitted for {:?} review",
        updated.slug, request
    );
    queue.submit(Task::Reindex(vec![updated.id])).await?;

    Ok(found(step_url(Some(&updated.slug), MAX_STEP)))
}

/// Step 7: submission done.
#[utoipa::path(
    get,
    path = "/developers/addon/{slug}/submit/7",
    tag = "Submit",
    params(("slug" = String, Path, description = "Add-on slug")),
    responses(
        (status = 200, description = "Final page", body = StepPage),
        (status = 302, description = "Redirected by the step gate, or to the versions page when nothing was submitted"),
    ),
    security(("devhub_user" = []))
)]
pub async fn done_page(
    CurrentUser(user): CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let (addon, step) = match enter(&pool, &user, &path, MAX_STEP, false).await? {
        Entry::Page(addon, step) => (addon, step),
        Entry::Redirect(resp) => return Ok(resp),
    };

    if pool.get_current_version(&addon).await?.is_none() {
        return Ok(found(versions_url(&addon.slug)));
    }

    let status = AddonStatus::from_i32(addon.status);
    let context = json!({
        "status": status,
        "status_display": status.map(AddonStatus::as_str).unwrap_or("Unknown"),
        "versions_url": versions_url(&addon.slug),
        "edit_url": super::edit_url(&addon.slug, "basic"),
    });
    Ok(page(step, Some(&addon), context))
}

/// Continue an unfinished submission where it stopped.
#[utoipa::path(
    get,
    path = "/developers/addon/{slug}/submit/resume",
    tag = "Submit",
    params(("slug" = String, Path, description = "Add-on slug")),
    responses(
        (status = 302, description = "To the stored step, or the versions page when finished"),
    ),
    security(("devhub_user" = []))
)]
pub async fn resume(
    CurrentUser(user): CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let addon = authorize_addon(&pool, &user, &path, false, AddonAccess::AUTHORS).await?;
    Ok(match pool.get_submit_step(addon.id).await? {
        Some(step) => found(step_url(Some(&addon.slug), step)),
        None => found(versions_url(&addon.slug)),
    })
}

/// Stored step of a submission, for administrators.
#[utoipa::path(
    get,
    path = "/developers/addon/{slug}/submit/bump",
    tag = "Submit",
    params(("slug" = String, Path, description = "Add-on slug")),
    responses(
        (status = 200, description = "Stored step, null when finished"),
        (status = 403, description = "Administrators only", body = crate::error::ErrorResponse),
    ),
    security(("devhub_user" = []))
)]
pub async fn bump_page(
    CurrentUser(user): CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    require_admin(&user)?;
    let addon = authorize_addon(&pool, &user, &path, false, AddonAccess::AUTHORS).await?;
    let step = pool.get_submit_step(addon.id).await?;
    Ok(HttpResponse::Ok().json(json!({ "addon": addon.slug, "step": step })))
}

/// Move a submission to any step it can be resumed at.
#[utoipa::path(
    post,
    path = "/developers/addon/{slug}/submit/bump",
    tag = "Submit",
    params(("slug" = String, Path, description = "Add-on slug")),
    request_body = BumpForm,
    responses(
        (status = 302, description = "Step stored, to that step"),
        (status = 400, description = "Step out of range", body = crate::error::ErrorResponse),
        (status = 403, description = "Administrators only", body = crate::error::ErrorResponse),
    ),
    security(("devhub_user" = []))
)]
pub async fn bump(
    CurrentUser(user): CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<String>,
    body: web::Json<BumpForm>,
) -> AppResult<HttpResponse> {
    require_admin(&user)?;
    let addon = authorize_addon(&pool, &user, &path, true, AddonAccess::AUTHORS).await?;
    // Steps before the add-on exists have no page under its slug.
    if !(FIRST_TRACKED_STEP..=MAX_STEP).contains(&body.step) {
        return Err(AppError::field(
            "step",
            format!(
                "Step must be between {} and {}.",
                FIRST_TRACKED_STEP, MAX_STEP
            ),
        ));
    }

    pool.set_submit_step(addon.id, body.step).await?;
    info!(
        "Submission of {} bumped to step {} by {}",
        addon.slug, body.step, user.username
    );
    Ok(found(step_url(Some(&addon.slug), body.step)))
}

fn require_admin(user: &AuthenticatedUser) -> AppResult<()> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Only administrators can change submission steps".to_string(),
        ))
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/developers/addon/submit/1")
            .route(web::get().to(agreement))
            .route(web::post().to(accept_agreement)),
    )
    .service(
        web::resource("/developers/addon/submit/2")
            .route(web::get().to(upload_page))
            .route(web::post().to(create_addon)),
    )
    .service(web::resource("/developers/addon/{slug}/submit/resume").route(web::get().to(resume)))
    .service(
        web::resource("/developers/addon/{slug}/submit/bump")
            .route(web::get().to(bump_page))
            .route(web::post().to(bump)),
    )
    .service(
        web::resource("/developers/addon/{slug}/submit/3")
            .route(web::get().to(describe_page))
            .route(web::post().to(save_describe)),
    )
    .service(
        web::resource("/developers/addon/{slug}/submit/4")
            .route(web::get().to(media_page))
            .route(web::post().to(save_media)),
    )
    .service(
        web::resource("/developers/addon/{slug}/submit/5")
            .route(web::get().to(license_page))
            .route(web::post().to(save_license)),
    )
    .service(
        web::resource("/developers/addon/{slug}/submit/6")
            .route(web::get().to(review_page))
            .route(web::post().to(finish_submission)),
    )
    .service(web::resource("/developers/addon/{slug}/submit/7").route(web::get().to(done_page)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn upload(validation: Option<&str>, task_error: Option<&str>) -> file_upload::Model {
        file_upload::Model {
            id: Uuid::new_v4(),
            user_id: Some(1),
            name: "a.zip".into(),
            path: "uploads/a.zip".into(),
            size: 10,
            hash: "sha256:00".into(),
            validation: validation.map(str::to_string),
            task_error: task_error.map(str::to_string),
            created_at: Utc::now(),
        }
    }

    fn settings(validate_addons: bool) -> ValidationSettings {
        ValidationSettings {
            validate_addons,
            expose_tracebacks: false,
        }
    }

    #[test]
    fn test_upload_ready_requires_clean_validation() {
        let on = settings(true);
        assert!(check_upload_ready(&upload(Some(r#"{"errors":0}"#), None), &on).is_ok());
        assert!(check_upload_ready(&upload(Some(r#"{"errors":2}"#), None), &on).is_err());
        assert!(check_upload_ready(&upload(None, None), &on).is_err());
        assert!(check_upload_ready(&upload(None, Some("Traceback")), &on).is_err());
    }

    #[test]
    fn test_upload_ready_when_validation_disabled() {
        assert!(check_upload_ready(&upload(None, None), &settings(false)).is_ok());
    }

    #[test]
    fn test_untracked_steps_span_the_wizard() {
        assert_eq!(untracked(2), Step { current: 2, max: MAX_STEP });
        for declared in [1, 2] {
            assert_eq!(
                gate(declared, TrackerState::NoAddon),
                GateDecision::Proceed(untracked(declared))
            );
        }
    }
}
