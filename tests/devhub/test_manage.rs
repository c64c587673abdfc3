//! Managing a submitted add-on: section edits, status actions and versions.

use actix_web::test::TestRequest;
use devhub_lib::models::{AddonStatus, AuthorRole, LogAction, UserRole};
use serde_json::json;

use super::test_helpers::*;

fn post(uri: &str, user_id: i64) -> TestRequest {
    as_user(TestRequest::post().uri(uri), user_id)
}

#[actix_rt::test]
async fn test_support_section_round_trip() {
    let env = setup().await;
    let app = create_test_app(&env, false).await;
    let dev = env.user("editor-of-own", UserRole::Developer).await;
    let addon = env.submitted_addon(dev, "Helpful").await;
    let url = addon_url(&addon.slug, "edit/support");

    let (status, location) = call_redirect(
        &app,
        post_json(
            &url,
            dev,
            json!({ "support_email": "help@example.org", "support_url": "https://example.org/help" }),
        ),
    )
    .await;
    assert_eq!((status, location), (302, url.clone()));

    let (status, body) = call_json(&app, get(&url, dev)).await;
    assert_eq!(status, 200);
    assert_eq!(body["section"], "support");
    assert_eq!(body["values"]["support_email"], "help@example.org");
    assert_eq!(body["values"]["support_url"], "https://example.org/help");

    let (status, body) = call_json(
        &app,
        post_json(&url, dev, json!({ "support_email": "not-an-address" })),
    )
    .await;
    assert_eq!(status, 400);
    assert!(body["errors"]["support_email"].is_array());

    let actions: Vec<i32> = env
        .pool
        .get_activity_for_addon(addon.id)
        .await
        .unwrap()
        .iter()
        .map(|a| a.action)
        .collect();
    assert!(actions.contains(&LogAction::EditProperties.id()));
}

#[actix_rt::test]
async fn test_unknown_and_admin_sections() {
    let env = setup().await;
    let app = create_test_app(&env, false).await;
    let dev = env.user("plain", UserRole::Developer).await;
    let admin = env.user("root", UserRole::Admin).await;
    let addon = env.submitted_addon(dev, "Sectioned").await;

    let (status, _) = call_json(&app, get(&addon_url(&addon.slug, "edit/payments"), dev)).await;
    assert_eq!(status, 404);

    let (status, _) = call_json(&app, get(&addon_url(&addon.slug, "edit/admin"), dev)).await;
    assert_eq!(status, 403);

    let (status, body) = call_json(&app, get(&addon_url(&addon.slug, "edit/admin"), admin)).await;
    assert_eq!(status, 200);
    assert_eq!(body["fields"], json!(["addon_type", "status"]));
}

#[actix_rt::test]
async fn test_disable_and_enable() {
    let env = setup().await;
    let app = create_test_app(&env, false).await;
    let dev = env.user("toggler", UserRole::Developer).await;
    let addon = env.submitted_addon(dev, "Switchable").await;
    let versions = format!("/api/v1/developers/addon/{}/versions", addon.slug);

    let (status, location) = call_redirect(&app, post(&addon_url(&addon.slug, "disable"), dev)).await;
    assert_eq!((status, location), (302, versions.clone()));
    let disabled = env.reload(addon.id).await;
    assert!(disabled.disabled_by_user);
    assert_eq!(disabled.status, addon.status, "Status is kept while hidden");

    // Hidden add-ons cannot ask for review
    let (status, body) = call_json(&app, get(&versions, dev)).await;
    assert_eq!(status, 200);
    assert_eq!(body["review_requests"], json!([]));

    let (status, _) = call_redirect(&app, post(&addon_url(&addon.slug, "enable"), dev)).await;
    assert_eq!(status, 302);
    assert!(!env.reload(addon.id).await.disabled_by_user);
}

#[actix_rt::test]
async fn test_review_requests_and_cancel() {
    let env = setup().await;
    let app = create_test_app(&env, false).await;
    let dev = env.user("requester", UserRole::Developer).await;
    // Preliminary queue: only a full review can be requested
    let addon = env.submitted_addon(dev, "Queued").await;
    assert_eq!(addon.status, AddonStatus::Unreviewed.as_i32());

    let versions = format!("/api/v1/developers/addon/{}/versions", addon.slug);
    let (_, body) = call_json(&app, get(&versions, dev)).await;
    assert_eq!(body["review_requests"], json!(["full"]));
    assert_eq!(body["can_cancel_review"], true);
    assert_eq!(body["versions"][0]["version"], "1.0");

    let (status, _) = call_json(&app, post(&addon_url(&addon.slug, "request-review/99"), dev)).await;
    assert_eq!(status, 404);

    let (status, _) = call_json(
        &app,
        post(
            &addon_url(
                &addon.slug,
                &format!("request-review/{}", AddonStatus::Lite.as_i32()),
            ),
            dev,
        ),
    )
    .await;
    assert_eq!(status, 400);

    let (status, location) = call_redirect(
        &app,
        post(
            &addon_url(
                &addon.slug,
                &format!("request-review/{}", AddonStatus::Public.as_i32()),
            ),
            dev,
        ),
    )
    .await;
    assert_eq!((status, location), (302, versions.clone()));
    assert_eq!(
        env.reload(addon.id).await.status,
        AddonStatus::Nominated.as_i32()
    );

    let (status, _) = call_redirect(&app, post(&addon_url(&addon.slug, "cancel"), dev)).await;
    assert_eq!(status, 302);
    assert_eq!(env.reload(addon.id).await.status, AddonStatus::Null.as_i32());

    // Nothing to cancel any more: a no-op
    let (status, _) = call_redirect(&app, post(&addon_url(&addon.slug, "cancel"), dev)).await;
    assert_eq!(status, 302);
    assert_eq!(env.reload(addon.id).await.status, AddonStatus::Null.as_i32());
}

#[actix_rt::test]
async fn test_delete_requires_matching_slug() {
    let env = setup().await;
    let app = create_test_app(&env, false).await;
    let dev = env.user("deleter", UserRole::Developer).await;
    let addon = env.submitted_addon(dev, "Doomed").await;
    let url = addon_url(&addon.slug, "delete");

    let (status, body) = call_json(&app, post_json(&url, dev, json!({ "slug": "wrong" }))).await;
    assert_eq!(status, 400);
    assert!(body["errors"]["slug"].is_array());
    assert_eq!(env.reload(addon.id).await.status, addon.status);

    let (status, location) =
        call_redirect(&app, post_json(&url, dev, json!({ "slug": addon.slug }))).await;
    assert_eq!((status, location), (302, "/api/v1/developers/addons".to_string()));
    assert_eq!(env.reload(addon.id).await.status, AddonStatus::Deleted.as_i32());

    // Deleted add-ons are gone from every page
    let (status, _) = call_json(&app, get(&addon_url(&addon.slug, "versions"), dev)).await;
    assert_eq!(status, 404);
}

#[actix_rt::test]
async fn test_author_roles() {
    let env = setup().await;
    let app = create_test_app(&env, false).await;
    let owner = env.user("owner", UserRole::Developer).await;
    let developer = env.user("developer", UserRole::Developer).await;
    let viewer = env.user("viewer", UserRole::Developer).await;
    let addon = env.submitted_addon(owner, "Shared").await;
    env.pool
        .insert_author(addon.id, developer, AuthorRole::Developer)
        .await
        .unwrap();
    env.pool
        .insert_author(addon.id, viewer, AuthorRole::Viewer)
        .await
        .unwrap();

    // Viewers read, but cannot write
    let (status, _) = call_json(&app, get(&addon_url(&addon.slug, "versions"), viewer)).await;
    assert_eq!(status, 200);
    let (status, _) = call_json(
        &app,
        post_json(
            &addon_url(&addon.slug, "edit/support"),
            viewer,
            json!({ "support_email": "v@example.org" }),
        ),
    )
    .await;
    assert_eq!(status, 403);

    // Developers edit, but owner-only actions are refused
    let (status, _) = call_redirect(
        &app,
        post_json(
            &addon_url(&addon.slug, "edit/support"),
            developer,
            json!({ "support_email": "d@example.org" }),
        ),
    )
    .await;
    assert_eq!(status, 302);
    let (status, _) = call_json(&app, post(&addon_url(&addon.slug, "disable"), developer)).await;
    assert_eq!(status, 403);
}

#[actix_rt::test]
async fn test_deleting_last_version_resets_status() {
    let env = setup().await;
    let app = create_test_app(&env, false).await;
    let dev = env.user("pruner", UserRole::Developer).await;
    let addon = env.submitted_addon(dev, "Pruned").await;
    let version_id = addon.current_version_id.unwrap();

    let (status, _) = call_json(
        &app,
        post_json(
            &addon_url(&addon.slug, "versions/delete"),
            dev,
            json!({ "version_id": version_id + 1000 }),
        ),
    )
    .await;
    assert_eq!(status, 404);

    let (status, location) = call_redirect(
        &app,
        post_json(
            &addon_url(&addon.slug, "versions/delete"),
            dev,
            json!({ "version_id": version_id }),
        ),
    )
    .await;
    assert_eq!(
        (status, location),
        (302, format!("/api/v1/developers/addon/{}/versions", addon.slug))
    );

    let reloaded = env.reload(addon.id).await;
    assert_eq!(reloaded.current_version_id, None);
    assert_eq!(reloaded.status, AddonStatus::Null.as_i32());
    assert!(env.files(addon.id).await.is_empty());
}

#[actix_rt::test]
async fn test_dashboard_lists_only_own_addons() {
    let env = setup().await;
    let app = create_test_app(&env, false).await;
    let dev = env.user("lister", UserRole::Developer).await;
    let other = env.user("bystander", UserRole::Developer).await;
    env.submitted_addon(dev, "Mine").await;
    env.submitted_addon(other, "Theirs").await;

    let (status, body) = call_json(&app, get("/api/v1/developers/addons", dev)).await;
    assert_eq!(status, 200);
    assert_eq!(body["total"], 1);
    assert_eq!(body["addons"][0]["name"], "Mine");
    assert_eq!(body["addons"][0]["submission_step"], serde_json::Value::Null);
    assert_eq!(body["addons"][0]["status"], "unreviewed");
}

#[actix_rt::test]
async fn test_screenshots_are_uploaded_then_attached() {
    let env = setup().await;
    let app = create_test_app(&env, false).await;
    let dev = env.user("photographer", UserRole::Developer).await;
    let addon = env.submitted_addon(dev, "Pictured").await;

    let (status, body) = call_json(
        &app,
        post_file("/api/v1/developers/upload-image", dev, "upload_image", "x.txt", b"plain text"),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["upload_hash"], "");
    assert_eq!(body["errors"][0], "Images must be either PNG or JPG.");

    let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
    let (status, body) = call_json(
        &app,
        post_file("/api/v1/developers/upload-image", dev, "upload_image", "shot.png", png),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["errors"], json!([]));
    let hash = body["upload_hash"].as_str().unwrap().to_string();

    let media = addon_url(&addon.slug, "edit/media");
    let (status, _) = call_redirect(
        &app,
        post_json(
            &media,
            dev,
            json!({ "icon_type": "", "previews": [{ "upload_hash": hash, "caption": "Main window" }] }),
        ),
    )
    .await;
    assert_eq!(status, 302);

    let (_, body) = call_json(&app, get(&media, dev)).await;
    assert_eq!(body["values"]["previews"][0]["caption"], "Main window");
    let preview_id = body["values"]["previews"][0]["id"].as_i64().unwrap();
    assert!(
        env.storage
            .exists(&devhub_lib::services::Storage::preview_key(addon.id, preview_id))
            .await
    );

    let (status, _) = call_redirect(
        &app,
        post_json(
            &media,
            dev,
            json!({ "icon_type": "", "previews": [{ "id": preview_id, "delete": true }] }),
        ),
    )
    .await;
    assert_eq!(status, 302);
    let (_, body) = call_json(&app, get(&media, dev)).await;
    assert_eq!(body["values"]["previews"], json!([]));
    assert!(
        !env.storage
            .exists(&devhub_lib::services::Storage::preview_key(addon.id, preview_id))
            .await
    );
}
