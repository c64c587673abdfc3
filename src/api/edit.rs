//! Section edits of a submitted add-on.

use actix_web::{HttpResponse, web};
use serde_json::{Value as JsonValue, json};
use tracing::info;

use super::{edit_url, finish_media, found, pending_submission};
use crate::auth::CurrentUser;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{AuthenticatedUser, SectionKind};
use crate::services::{AddonAccess, Storage, Task, TaskQueue, authorize_addon};

fn section_from_path(name: &str) -> AppResult<SectionKind> {
    SectionKind::parse(name).ok_or_else(|| AppError::NotFound(format!("Section {}", name)))
}

fn check_section_allowed(kind: SectionKind, user: &AuthenticatedUser) -> AppResult<()> {
    if kind.spec().admin_only && !user.is_admin() {
        return Err(AppError::Forbidden(format!(
            "Only administrators can edit the {} section",
            kind.as_str()
        )));
    }
    Ok(())
}

/// Current values of one section.
#[utoipa::path(
    get,
    path = "/developers/addon/{slug}/edit/{section}",
    tag = "Edit",
    params(
        ("slug" = String, Path, description = "Add-on slug"),
        ("section" = String, Path, description = "basic, media, details, support, technical or admin")
    ),
    responses(
        (status = 200, description = "Section values"),
        (status = 302, description = "Submission unfinished, back into the wizard"),
        (status = 403, description = "Not allowed", body = crate::error::ErrorResponse),
        (status = 404, description = "Add-on or section not found", body = crate::error::ErrorResponse),
    ),
    security(("devhub_user" = []))
)]
pub async fn get_section(
    CurrentUser(user): CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<(String, String)>,
) -> AppResult<HttpResponse> {
    let (slug, section) = path.into_inner();
    let kind = section_from_path(&section)?;
    check_section_allowed(kind, &user)?;

    let addon = authorize_addon(&pool, &user, &slug, false, AddonAccess::AUTHORS).await?;
    if let Some(redirect) = pending_submission(&pool, &addon).await? {
        return Ok(redirect);
    }

    let categories = pool.get_addon_category_ids(addon.id).await?;
    let mut values = kind.values(&addon, &categories);
    if kind == SectionKind::Media {
        let previews: Vec<JsonValue> = pool
            .get_previews(addon.id)
            .await?
            .into_iter()
            .map(|p| json!({ "id": p.id, "caption": p.caption, "position": p.position }))
            .collect();
        values["previews"] = JsonValue::Array(previews);
    }

    Ok(HttpResponse::Ok().json(json!({
        "addon": addon.slug,
        "section": kind.as_str(),
        "fields": kind.spec().fields,
        "values": values,
    })))
}

/// Save one section. The JSON body holds the section's fields; anything else
/// is ignored.
#[utoipa::path(
    post,
    path = "/developers/addon/{slug}/edit/{section}",
    tag = "Edit",
    params(
        ("slug" = String, Path, description = "Add-on slug"),
        ("section" = String, Path, description = "basic, media, details, support, technical or admin")
    ),
    responses(
        (status = 302, description = "Saved, back to the section"),
        (status = 400, description = "Invalid form", body = crate::error::ErrorResponse),
        (status = 403, description = "Not allowed", body = crate::error::ErrorResponse),
    ),
    security(("devhub_user" = []))
)]
pub async fn save_section(
    CurrentUser(user): CurrentUser,
    pool: web::Data<DbPool>,
    storage: web::Data<Storage>,
    queue: web::Data<dyn TaskQueue>,
    path: web::Path<(String, String)>,
    body: web::Json<JsonValue>,
) -> AppResult<HttpResponse> {
    let (slug, section) = path.into_inner();
    let kind = section_from_path(&section)?;
    check_section_allowed(kind, &user)?;

    let addon = authorize_addon(&pool, &user, &slug, true, AddonAccess::AUTHORS).await?;
    let edit = kind.clean(body.into_inner()).map_err(AppError::Form)?;

    if let Some(media) = edit.media() {
        super::submit::check_preview_images(&storage, &media.previews).await?;
    }

    let (updated, outcome) = pool
        .save_section(addon.id, &edit, kind.spec(), user.id)
        .await?;
    finish_media(&storage, queue.get_ref(), updated.id, &outcome).await?;

    info!(
        "Section {} of add-on {} saved by user {}",
        kind.as_str(),
        updated.slug,
        user.id
    );
    queue.submit(Task::Reindex(vec![updated.id])).await?;

    Ok(found(edit_url(&updated.slug, kind.as_str())))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/developers/addon/{slug}/edit/{section}")
            .route(web::get().to(get_section))
            .route(web::post().to(save_section)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;

    fn user(role: UserRole) -> AuthenticatedUser {
        AuthenticatedUser {
            id: 1,
            username: "dev".into(),
            role,
        }
    }

    #[test]
    fn test_unknown_section_is_not_found() {
        assert!(matches!(
            section_from_path("payments"),
            Err(AppError::NotFound(_))
        ));
        assert_eq!(section_from_path("media").unwrap(), SectionKind::Media);
    }

    #[test]
    fn test_admin_section_needs_admin() {
        assert!(check_section_allowed(SectionKind::Admin, &user(UserRole::Developer)).is_err());
        assert!(check_section_allowed(SectionKind::Admin, &user(UserRole::Admin)).is_ok());
        assert!(check_section_allowed(SectionKind::Basic, &user(UserRole::Developer)).is_ok());
    }
}
