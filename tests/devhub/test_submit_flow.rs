//! Submission wizard: the walk from agreement to the final page, and the
//! step gate in front of it.

use actix_web::cookie::Cookie;
use actix_web::test;
use devhub_lib::api::submit::AGREEMENT_COOKIE;
use devhub_lib::models::{AddonStatus, AddonType, Application, UserRole};
use serde_json::json;
use uuid::Uuid;

use super::test_helpers::*;

fn agreed(req: actix_web::test::TestRequest) -> actix_web::test::TestRequest {
    req.cookie(Cookie::new(AGREEMENT_COOKIE, "1"))
}

/// Slug out of a `/developers/addon/{slug}/submit/{step}` location.
fn slug_of(location: &str) -> String {
    location
        .trim_start_matches("/api/v1/developers/addon/")
        .split('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

#[actix_rt::test]
async fn test_full_submission_walkthrough() {
    let env = setup().await;
    let app = create_test_app(&env, false).await;
    let dev = env.user("walker", UserRole::Developer).await;
    let category = env
        .pool
        .insert_category("Tabs", "tabs", Application::Firefox, AddonType::Extension)
        .await
        .unwrap();

    // Upload page needs the agreement first
    let (status, location) =
        call_redirect(&app, get("/api/v1/developers/addon/submit/2", dev)).await;
    assert_eq!(status, 302);
    assert_eq!(location, "/api/v1/developers/addon/submit/1");

    let (status, page) = call_json(&app, get("/api/v1/developers/addon/submit/1", dev)).await;
    assert_eq!(status, 200);
    assert_eq!(page["step"]["current"], 1);

    let resp = test::call_service(
        &app,
        as_user(
            test::TestRequest::post().uri("/api/v1/developers/addon/submit/1"),
            dev,
        )
        .to_request(),
    )
    .await;
    assert_eq!(resp.status().as_u16(), 302);
    assert!(
        resp.response()
            .cookies()
            .any(|c| c.name() == AGREEMENT_COOKIE && c.value() == "1"),
        "Accepting the agreement should set the cookie"
    );

    // Upload: validation runs inline
    let (status, json_url) = call_redirect(
        &app,
        post_file(
            "/api/v1/developers/upload",
            dev,
            "upload",
            "tab-mixer.zip",
            &package("Tab Mixer", "1.0"),
        ),
    )
    .await;
    assert_eq!(status, 302);
    assert!(json_url.ends_with("/json"), "unexpected location {}", json_url);
    let upload_id: Uuid = json_url
        .trim_end_matches("/json")
        .rsplit('/')
        .next()
        .unwrap()
        .parse()
        .unwrap();

    let (status, detail) = call_json(&app, get(&json_url, dev)).await;
    assert_eq!(status, 200);
    assert_eq!(detail["validation"]["errors"], 0);
    assert_eq!(detail["error"], serde_json::Value::Null);
    assert_eq!(env.validator.runs(), 1);

    // Step 2 creates the add-on and starts tracking at step 3
    let (status, location) = call_redirect(
        &app,
        agreed(post_json(
            "/api/v1/developers/addon/submit/2",
            dev,
            json!({ "upload": upload_id, "desktop_platforms": ["all"] }),
        )),
    )
    .await;
    assert_eq!(status, 302);
    assert!(location.ends_with("/submit/3"), "unexpected location {}", location);
    let slug = slug_of(&location);
    let created = env.pool.get_addon_by_slug(&slug).await.unwrap().unwrap();
    assert_eq!(env.pool.get_submit_step(created.id).await.unwrap(), Some(3));
    assert_eq!(created.status, AddonStatus::Null.as_i32());

    // Running ahead is sent back
    let (status, location) = call_redirect(&app, get(&submit_url(&slug, 5), dev)).await;
    assert_eq!((status, location), (302, submit_url(&slug, 3)));

    let (status, page) = call_json(&app, get(&submit_url(&slug, 3), dev)).await;
    assert_eq!(status, 200);
    assert_eq!(page["step"], json!({ "current": 3, "max": 3 }));
    assert_eq!(page["context"]["available_categories"][0]["slug"], "tabs");

    // Step 3 may rename the slug
    let (status, location) = call_redirect(
        &app,
        post_json(
            &submit_url(&slug, 3),
            dev,
            json!({
                "name": "Tab Mixer",
                "slug": "tab-mixer-plus",
                "summary": "Mixes your tabs.",
                "categories": [category.id],
            }),
        ),
    )
    .await;
    assert_eq!((status, location), (302, submit_url("tab-mixer-plus", 4)));
    let slug = "tab-mixer-plus";

    let (status, location) = call_redirect(
        &app,
        post_json(
            &submit_url(slug, 4),
            dev,
            json!({ "icon_type": "", "previews": [] }),
        ),
    )
    .await;
    assert_eq!((status, location), (302, submit_url(slug, 5)));

    let (status, location) = call_redirect(
        &app,
        post_json(&submit_url(slug, 5), dev, json!({ "builtin": 1 })),
    )
    .await;
    assert_eq!((status, location), (302, submit_url(slug, 6)));
    assert_eq!(env.pool.get_submit_step(created.id).await.unwrap(), Some(6));

    // Going back to an earlier step is allowed
    let (status, page) = call_json(&app, get(&submit_url(slug, 4), dev)).await;
    assert_eq!(status, 200);
    assert_eq!(page["step"], json!({ "current": 4, "max": 6 }));

    let (status, location) = call_redirect(
        &app,
        post_json(
            &submit_url(slug, 6),
            dev,
            json!({ "review_type": "preliminary" }),
        ),
    )
    .await;
    assert_eq!((status, location), (302, submit_url(slug, 7)));

    let finished = env.reload(created.id).await;
    assert_eq!(finished.status, AddonStatus::Unreviewed.as_i32());
    assert_eq!(env.pool.get_submit_step(created.id).await.unwrap(), None);

    let (status, page) = call_json(&app, get(&submit_url(slug, 7), dev)).await;
    assert_eq!(status, 200);
    assert_eq!(page["context"]["status"], "unreviewed");

    // Finished submissions only reach the final page
    let (status, location) = call_redirect(&app, get(&submit_url(slug, 3), dev)).await;
    assert_eq!((status, location), (302, submit_url(slug, 7)));

    let (status, location) = call_redirect(&app, get(&submit_url(slug, 6), dev)).await;
    assert_eq!((status, location), (302, submit_url(slug, 7)));
}

#[actix_rt::test]
async fn test_resume_goes_to_stored_step() {
    let env = setup().await;
    let app = create_test_app(&env, false).await;
    let dev = env.user("resumer", UserRole::Developer).await;
    let addon = env.addon(dev, "Resumable").await;

    let (status, location) = call_redirect(
        &app,
        get(&addon_url(&addon.slug, "submit/resume"), dev),
    )
    .await;
    assert_eq!((status, location), (302, submit_url(&addon.slug, 3)));

    env.pool
        .finish_submission(addon.id, devhub_lib::models::ReviewRequest::Full, dev)
        .await
        .unwrap();
    let (status, location) = call_redirect(
        &app,
        get(&addon_url(&addon.slug, "submit/resume"), dev),
    )
    .await;
    assert_eq!(
        (status, location),
        (302, format!("/api/v1/developers/addon/{}/versions", addon.slug))
    );
}

#[actix_rt::test]
async fn test_admin_bump_moves_the_tracker() {
    let env = setup().await;
    let app = create_test_app(&env, false).await;
    let dev = env.user("bumped", UserRole::Developer).await;
    let admin = env.user("admin", UserRole::Admin).await;
    let addon = env.addon(dev, "Bumpy").await;

    let (status, _) = call_json(
        &app,
        post_json(&addon_url(&addon.slug, "submit/bump"), dev, json!({ "step": 6 })),
    )
    .await;
    assert_eq!(status, 403);

    let (status, body) = call_json(
        &app,
        post_json(&addon_url(&addon.slug, "submit/bump"), admin, json!({ "step": 9 })),
    )
    .await;
    assert_eq!(status, 400);
    assert!(body["errors"]["step"].is_array());

    // Steps before the add-on exists cannot be stored
    for step in [1, 2] {
        let (status, body) = call_json(
            &app,
            post_json(&addon_url(&addon.slug, "submit/bump"), admin, json!({ "step": step })),
        )
        .await;
        assert_eq!(status, 400, "step {} should be refused", step);
        assert!(body["errors"]["step"].is_array());
    }
    assert_eq!(env.pool.get_submit_step(addon.id).await.unwrap(), Some(3));
    let (status, location) = call_redirect(
        &app,
        get(&addon_url(&addon.slug, "submit/resume"), dev),
    )
    .await;
    assert_eq!((status, location), (302, submit_url(&addon.slug, 3)));

    let (status, location) = call_redirect(
        &app,
        post_json(&addon_url(&addon.slug, "submit/bump"), admin, json!({ "step": 6 })),
    )
    .await;
    assert_eq!((status, location), (302, submit_url(&addon.slug, 6)));

    let (status, body) = call_json(&app, get(&addon_url(&addon.slug, "submit/bump"), admin)).await;
    assert_eq!(status, 200);
    assert_eq!(body["step"], 6);

    let (status, page) = call_json(&app, get(&submit_url(&addon.slug, 6), dev)).await;
    assert_eq!(status, 200);
    assert_eq!(page["step"]["max"], 6);
}

#[actix_rt::test]
async fn test_upload_with_errors_cannot_become_an_addon() {
    let env = setup().await;
    let app = create_test_app(&env, false).await;
    let dev = env.user("broken", UserRole::Developer).await;

    let broken = zip_files(&[("main.js", b"run();")]);
    let (status, json_url) =
        call_redirect(&app, post_file("/api/v1/developers/upload", dev, "upload", "x.zip", &broken))
            .await;
    assert_eq!(status, 302);

    let (_, detail) = call_json(&app, get(&json_url, dev)).await;
    assert_eq!(detail["validation"]["errors"], 1);
    assert!(detail.get("platforms_to_exclude").is_none());

    let upload_id = json_url.trim_end_matches("/json").rsplit('/').next().unwrap();
    let (status, body) = call_json(
        &app,
        agreed(post_json(
            "/api/v1/developers/addon/submit/2",
            dev,
            json!({ "upload": upload_id, "desktop_platforms": ["all"] }),
        )),
    )
    .await;
    assert_eq!(status, 400);
    assert!(body["errors"]["upload"].is_array());
}

#[actix_rt::test]
async fn test_uploads_are_private() {
    let env = setup().await;
    let app = create_test_app(&env, false).await;
    let owner = env.user("owner", UserRole::Developer).await;
    let other = env.user("other", UserRole::Developer).await;
    let upload_id = env.upload(owner, &package("Private", "1.0")).await;
    let url = format!("/api/v1/developers/upload/{}/json", upload_id.simple());

    let (status, _) = call_json(&app, get(&url, other)).await;
    assert_eq!(status, 404);

    // Someone else's upload cannot be submitted either
    let (status, body) = call_json(
        &app,
        agreed(post_json(
            "/api/v1/developers/addon/submit/2",
            other,
            json!({ "upload": upload_id, "desktop_platforms": ["all"] }),
        )),
    )
    .await;
    assert_eq!(status, 400);
    assert!(body["errors"]["upload"].is_array());
}

#[actix_rt::test]
async fn test_wizard_requires_authorship() {
    let env = setup().await;
    let app = create_test_app(&env, false).await;
    let dev = env.user("author", UserRole::Developer).await;
    let stranger = env.user("stranger", UserRole::Developer).await;
    let addon = env.addon(dev, "Guarded").await;

    let (status, _) = call_json(&app, get(&submit_url(&addon.slug, 3), stranger)).await;
    assert_eq!(status, 403);

    let (status, _) = call_json(&app, get(&submit_url("no-such-addon", 3), dev)).await;
    assert_eq!(status, 404);

    let (status, _) = call_json(
        &app,
        test::TestRequest::get().uri(&submit_url(&addon.slug, 3)),
    )
    .await;
    assert_eq!(status, 401);
}

#[actix_rt::test]
async fn test_management_pages_send_unfinished_submissions_back() {
    let env = setup().await;
    let app = create_test_app(&env, false).await;
    let dev = env.user("unfinished", UserRole::Developer).await;
    let addon = env.addon(dev, "Half Done").await;

    for page in ["versions", "edit/basic"] {
        let (status, location) = call_redirect(&app, get(&addon_url(&addon.slug, page), dev)).await;
        assert_eq!(
            (status, location),
            (302, submit_url(&addon.slug, 3)),
            "{} should resume the wizard",
            page
        );
    }

    let (status, body) = call_json(&app, get("/api/v1/developers/addons", dev)).await;
    assert_eq!(status, 200);
    assert_eq!(body["total"], 1);
    assert_eq!(body["addons"][0]["submission_step"], 3);
}

#[actix_rt::test]
async fn test_reposting_an_earlier_step_keeps_the_tracker() {
    let env = setup().await;
    let app = create_test_app(&env, false).await;
    let dev = env.user("revisitor", UserRole::Developer).await;
    let category = env
        .pool
        .insert_category("Tabs", "tabs", Application::Firefox, AddonType::Extension)
        .await
        .unwrap();
    let addon = env.addon(dev, "Revisited").await;
    env.pool.set_submit_step(addon.id, 6).await.unwrap();

    let (status, location) = call_redirect(
        &app,
        post_json(
            &submit_url(&addon.slug, 3),
            dev,
            json!({
                "name": "Revisited",
                "slug": addon.slug,
                "summary": "Seen twice.",
                "categories": [category.id],
            }),
        ),
    )
    .await;
    assert_eq!((status, location), (302, submit_url(&addon.slug, 4)));
    assert_eq!(env.pool.get_submit_step(addon.id).await.unwrap(), Some(6));

    // A rejected form leaves it alone too
    let (status, _) = call_json(
        &app,
        post_json(&submit_url(&addon.slug, 3), dev, json!({ "name": "" })),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(env.pool.get_submit_step(addon.id).await.unwrap(), Some(6));
}

#[actix_rt::test]
async fn test_overlong_manifest_values_are_upload_errors() {
    let env = setup().await;
    let app = create_test_app(&env, false).await;
    let dev = env.user("verbose", UserRole::Developer).await;

    let (status, json_url) = call_redirect(
        &app,
        post_file(
            "/api/v1/developers/upload",
            dev,
            "upload",
            "long.zip",
            &package(&"Long".repeat(80), "1.0"),
        ),
    )
    .await;
    assert_eq!(status, 302);

    let (_, detail) = call_json(&app, get(&json_url, dev)).await;
    assert_eq!(detail["validation"]["errors"], 1);
    assert_eq!(detail["validation"]["messages"][0]["tier"], 1);

    let upload_id = json_url.trim_end_matches("/json").rsplit('/').next().unwrap();
    let (status, body) = call_json(
        &app,
        agreed(post_json(
            "/api/v1/developers/addon/submit/2",
            dev,
            json!({ "upload": upload_id, "desktop_platforms": ["all"] }),
        )),
    )
    .await;
    assert_eq!(status, 400);
    assert!(body["errors"]["upload"].is_array());
}

#[actix_rt::test]
async fn test_addon_without_manifest_id_gets_one() {
    let env = setup().await;
    let app = create_test_app(&env, false).await;
    let dev = env.user("anonymous", UserRole::Developer).await;

    let manifest = json!({
        "name": "No Id",
        "version": "1.0",
        "applications": [{ "guid": FIREFOX_GUID, "min_version": "3.0", "max_version": "4.*" }],
    });
    let bytes = zip_files(&[("manifest.json", manifest.to_string().as_bytes())]);
    let filename = format!("{}.zip", "f".repeat(300));
    let (status, json_url) = call_redirect(
        &app,
        post_file("/api/v1/developers/upload", dev, "upload", &filename, &bytes),
    )
    .await;
    assert_eq!(status, 302);
    let upload_id: Uuid = json_url
        .trim_end_matches("/json")
        .rsplit('/')
        .next()
        .unwrap()
        .parse()
        .unwrap();

    // Stored name is cut to fit, extension kept
    let upload = env.pool.get_upload(upload_id).await.unwrap().unwrap();
    assert_eq!(upload.name.chars().count(), 255);
    assert!(upload.name.ends_with(".zip"));

    let (_, detail) = call_json(&app, get(&json_url, dev)).await;
    assert_eq!(detail["validation"]["errors"], 0);
    assert_eq!(detail["validation"]["warnings"], 1);

    let (status, location) = call_redirect(
        &app,
        agreed(post_json(
            "/api/v1/developers/addon/submit/2",
            dev,
            json!({ "upload": upload_id, "desktop_platforms": ["all"] }),
        )),
    )
    .await;
    assert_eq!(status, 302);
    let created = env
        .pool
        .get_addon_by_slug(&slug_of(&location))
        .await
        .unwrap()
        .unwrap();
    let guid = created.guid.expect("A generated add-on ID");
    assert!(guid.starts_with('{') && guid.ends_with('}'), "unexpected id {}", guid);
}
