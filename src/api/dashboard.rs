//! Add-on dashboard of the signed-in developer.

use actix_web::{HttpResponse, web};

use crate::auth::CurrentUser;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::{AddonListResponse, AddonSummary, DashboardQuery};

/// List the caller's add-ons.
///
/// Unfinished submissions carry the step they resume at.
#[utoipa::path(
    get,
    path = "/developers/addons",
    tag = "Dashboard",
    params(
        ("sort" = Option<String>, Query, description = "name, created or updated (default)"),
        ("page" = Option<u64>, Query, description = "Page number, from 1"),
        ("limit" = Option<u64>, Query, description = "Results per page (default 20, max 100)")
    ),
    responses(
        (status = 200, description = "The caller's add-ons", body = AddonListResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
    ),
    security(
        ("devhub_user" = [])
    )
)]
pub async fn list_addons(
    CurrentUser(user): CurrentUser,
    pool: web::Data<DbPool>,
    query: web::Query<DashboardQuery>,
) -> AppResult<HttpResponse> {
    let (addons, total, page, limit) = pool.list_user_addons(user.id, &query).await?;

    let ids: Vec<i64> = addons.iter().map(|a| a.id).collect();
    let steps = pool.get_submit_steps(&ids).await?;

    let addons = addons
        .iter()
        .map(|a| AddonSummary::from_model(a, steps.get(&a.id).copied()))
        .collect();

    Ok(HttpResponse::Ok().json(AddonListResponse {
        addons,
        total,
        page,
        limit,
    }))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/developers/addons").route(web::get().to(list_addons)));
}
