//! File validation: results are computed once per file and served from the
//! stored row afterwards.

use actix_web::test::TestRequest;
use devhub_lib::models::UserRole;
use serde_json::Value;

use super::test_helpers::*;

fn post(uri: &str, user_id: i64) -> TestRequest {
    as_user(TestRequest::post().uri(uri), user_id)
}

#[actix_rt::test]
async fn test_file_validation_runs_once() {
    let env = setup().await;
    let app = create_test_app(&env, false).await;
    let dev = env.user("validator", UserRole::Developer).await;
    let addon = env.submitted_addon(dev, "Checked").await;
    let file = env.files(addon.id).await.remove(0);
    assert!(env.pool.get_validation_result(file.id).await.unwrap().is_none());

    let (status, report) = call_json(
        &app,
        get(&addon_url(&addon.slug, &format!("file/{}/validation", file.id)), dev),
    )
    .await;
    assert_eq!(status, 200);
    let json_url = report["validate_url"].as_str().unwrap().to_string();
    assert!(json_url.ends_with(&format!("/file/{}/validation.json", file.id)));

    let (status, first) = call_json(&app, post(&json_url, dev)).await;
    assert_eq!(status, 200);
    assert_eq!(first["validation"]["errors"], 0);
    assert_eq!(first["error"], Value::Null);
    assert_eq!(env.validator.runs(), 1);

    let (status, second) = call_json(&app, post(&json_url, dev)).await;
    assert_eq!(status, 200);
    assert_eq!(second, first);
    assert_eq!(env.validator.runs(), 1, "Second request should hit the stored result");

    let stored = env
        .pool
        .get_validation_result(file.id)
        .await
        .unwrap()
        .expect("Result should be stored");
    let (status, by_id) = call_json(
        &app,
        post(
            &addon_url(&addon.slug, &format!("validation-result/{}.json", stored.id)),
            dev,
        ),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(by_id["validation"], first["validation"]);
}

#[actix_rt::test]
async fn test_crashed_validation_is_stored_with_last_line() {
    let env = setup().await;
    let app = create_test_app(&env, false).await;
    let dev = env.user("crasher", UserRole::Developer).await;
    let addon = env.submitted_addon(dev, "Vanished").await;
    let file = env.files(addon.id).await.remove(0);
    assert!(env.storage.delete(&file.path).await.unwrap());

    let url = addon_url(&addon.slug, &format!("file/{}/validation.json", file.id));
    let (status, body) = call_json(&app, post(&url, dev)).await;
    assert_eq!(status, 200);
    assert_eq!(body["validation"], "");
    let error = body["error"].as_str().unwrap();
    assert!(error.starts_with("IOError:"), "unexpected error {}", error);
    assert!(!error.contains("Traceback"));

    let (_, again) = call_json(&app, post(&url, dev)).await;
    assert_eq!(again, body);
    assert_eq!(env.validator.runs(), 1);

    let stored = env.pool.get_validation_result(file.id).await.unwrap().unwrap();
    assert!(stored.validation.is_none());
    assert!(stored.task_error.unwrap().starts_with("Traceback"));
}

#[actix_rt::test]
async fn test_results_are_scoped_to_their_addon() {
    let env = setup().await;
    let app = create_test_app(&env, false).await;
    let dev = env.user("scoped", UserRole::Developer).await;
    let first = env.submitted_addon(dev, "First").await;
    let second = env.submitted_addon(dev, "Second").await;
    let file = env.files(first.id).await.remove(0);

    let (status, _) = call_json(
        &app,
        post(
            &addon_url(&second.slug, &format!("file/{}/validation.json", file.id)),
            dev,
        ),
    )
    .await;
    assert_eq!(status, 404);
    assert_eq!(env.validator.runs(), 0);

    let (status, _) = call_json(
        &app,
        post(
            &addon_url(&first.slug, &format!("file/{}/validation.json", file.id)),
            dev,
        ),
    )
    .await;
    assert_eq!(status, 200);
    let stored = env.pool.get_validation_result(file.id).await.unwrap().unwrap();

    let (status, _) = call_json(
        &app,
        post(
            &addon_url(&second.slug, &format!("validation-result/{}.json", stored.id)),
            dev,
        ),
    )
    .await;
    assert_eq!(status, 404);
}

#[actix_rt::test]
async fn test_editors_may_validate_any_addon() {
    let env = setup().await;
    let app = create_test_app(&env, false).await;
    let dev = env.user("owner", UserRole::Developer).await;
    let editor = env.user("editor", UserRole::Editor).await;
    let stranger = env.user("stranger", UserRole::Developer).await;
    let addon = env.submitted_addon(dev, "Reviewed").await;
    let file = env.files(addon.id).await.remove(0);
    let url = addon_url(&addon.slug, &format!("file/{}/validation.json", file.id));

    let (status, _) = call_json(&app, post(&url, stranger)).await;
    assert_eq!(status, 403);

    let (status, body) = call_json(&app, post(&url, editor)).await;
    assert_eq!(status, 200);
    assert_eq!(body["validation"]["errors"], 0);
}
