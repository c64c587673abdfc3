//! Maintenance mode: reads keep working, writes are answered with 503.

use actix_web::test::TestRequest;
use actix_web::{App, test};
use devhub_lib::middleware::ReadOnly;
use devhub_lib::models::UserRole;
use serde_json::json;

use super::test_helpers::*;

#[actix_rt::test]
async fn test_writes_are_refused_while_read_only() {
    let env = setup().await;
    let dev = env.user("reader", UserRole::Developer).await;
    let addon = env.submitted_addon(dev, "Frozen").await;
    let app = create_test_app(&env, true).await;

    let (status, body) = call_json(
        &app,
        as_user(TestRequest::post().uri("/api/v1/developers/addon/submit/1"), dev),
    )
    .await;
    assert_eq!(status, 503);
    assert_eq!(body["error"], "MAINTENANCE");

    let (status, _) = call_json(
        &app,
        post_file(
            "/api/v1/developers/upload",
            dev,
            "upload",
            "x.zip",
            &package("Frozen", "2.0"),
        ),
    )
    .await;
    assert_eq!(status, 503);

    let (status, _) = call_json(
        &app,
        post_json(
            &addon_url(&addon.slug, "edit/support"),
            dev,
            json!({ "support_email": "help@example.org" }),
        ),
    )
    .await;
    assert_eq!(status, 503);

    // Reads are unaffected
    let (status, body) = call_json(&app, get("/api/v1/developers/addons", dev)).await;
    assert_eq!(status, 200);
    assert_eq!(body["total"], 1);

    let (status, _) = call_json(&app, get(&addon_url(&addon.slug, "versions"), dev)).await;
    assert_eq!(status, 200);

    let (status, body) = call_json(&app, TestRequest::get().uri("/api/v1/ready")).await;
    assert_eq!(status, 200);
    assert_eq!(body["read_only"], true);
}

#[actix_rt::test]
async fn test_pool_refuses_writes_behind_the_middleware() {
    let env = setup().await;
    let dev = env.user("owner", UserRole::Developer).await;
    let addon = env.submitted_addon(dev, "Guarded").await;

    // Middleware off, pool read-only: the handler still cannot write
    let state = env.state(true);
    let app = test::init_service(
        App::new()
            .wrap(ReadOnly::new(false))
            .configure(move |cfg| state.configure(cfg)),
    )
    .await;

    let (status, body) = call_json(
        &app,
        as_user(
            TestRequest::post().uri(&addon_url(&addon.slug, "disable")),
            dev,
        ),
    )
    .await;
    assert_eq!(status, 503);
    assert_eq!(body["error"], "MAINTENANCE");
    assert!(!env.reload(addon.id).await.disabled_by_user);
}

#[actix_rt::test]
async fn test_health_reports_writable_site() {
    let env = setup().await;
    let app = create_test_app(&env, false).await;

    let (status, body) = call_json(&app, TestRequest::get().uri("/api/v1/health")).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "devhub");

    let (status, body) = call_json(&app, TestRequest::get().uri("/api/v1/ready")).await;
    assert_eq!(status, 200);
    assert_eq!(body["database"], "connected");
    assert_eq!(body["read_only"], false);
    assert_eq!(body["unfinished_submissions"], 0);

    // Tracked submissions are counted, finished ones are not
    let dev = env.user("counted", UserRole::Developer).await;
    env.addon(dev, "In Progress").await;
    env.submitted_addon(dev, "Done").await;
    let (_, body) = call_json(&app, TestRequest::get().uri("/api/v1/ready")).await;
    assert_eq!(body["unfinished_submissions"], 1);
}
