//! Periodic aggregation jobs against seeded statistics.

use chrono::{NaiveDate, Utc};
use chrono::TimeZone;
use devhub_lib::entity::{
    addon, addon_collection, addon_collection_count, app_support, collection, collection_count,
    contribution, file,
};
use devhub_lib::error::AppError;
use devhub_lib::models::{AddonStatus, AddonType, Application, UserRole};
use devhub_lib::services::cron::{CronJob, plan_job, run_job};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

use super::test_helpers::*;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

async fn insert_collection(env: &TestEnv, name: &str) -> collection::Model {
    collection::ActiveModel {
        name: Set(name.to_string()),
        downloads: Set(0),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(env.pool.connection())
    .await
    .unwrap()
}

#[actix_rt::test]
async fn test_total_contributions_are_summed() {
    let env = setup().await;
    let dev = env.user("earner", UserRole::Developer).await;
    let rich = env.submitted_addon(dev, "Rich").await;
    let poor = env.submitted_addon(dev, "Poor").await;

    for amount in [500, 250, 1] {
        contribution::ActiveModel {
            addon_id: Set(rich.id),
            amount: Set(amount),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(env.pool.connection())
        .await
        .unwrap();
    }

    let submitted = run_job(CronJob::AddonTotalContributions, &env.pool, env.queue.as_ref())
        .await
        .unwrap();
    assert_eq!(submitted, 1);
    assert_eq!(env.reload(rich.id).await.total_contributions, 751);
    assert_eq!(env.reload(poor.id).await.total_contributions, 0);
}

#[actix_rt::test]
async fn test_collection_downloads_are_summed() {
    let env = setup().await;
    let dev = env.user("collector", UserRole::Developer).await;
    let listed = env.submitted_addon(dev, "Collected").await;
    let favourites = insert_collection(&env, "Favourites").await;
    let empty = insert_collection(&env, "Empty").await;

    let pair = addon_collection::ActiveModel {
        addon_id: Set(listed.id),
        collection_id: Set(favourites.id),
        downloads: Set(0),
        ..Default::default()
    }
    .insert(env.pool.connection())
    .await
    .unwrap();

    for (count, d) in [(3, 1), (4, 2), (10, 3)] {
        collection_count::ActiveModel {
            collection_id: Set(favourites.id),
            count: Set(count),
            date: Set(day(d)),
            ..Default::default()
        }
        .insert(env.pool.connection())
        .await
        .unwrap();
        addon_collection_count::ActiveModel {
            addon_id: Set(listed.id),
            collection_id: Set(favourites.id),
            count: Set(count * 2),
            date: Set(day(d)),
            ..Default::default()
        }
        .insert(env.pool.connection())
        .await
        .unwrap();
    }

    run_job(CronJob::UpdateCollectionsTotal, &env.pool, env.queue.as_ref())
        .await
        .unwrap();
    run_job(
        CronJob::UpdateAddonsCollectionsDownloads,
        &env.pool,
        env.queue.as_ref(),
    )
    .await
    .unwrap();

    let totals = collection::Entity::find_by_id(favourites.id)
        .one(env.pool.connection())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(totals.downloads, 17);

    let untouched = collection::Entity::find_by_id(empty.id)
        .one(env.pool.connection())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(untouched.downloads, 0);

    let pair = addon_collection::Entity::find_by_id(pair.id)
        .one(env.pool.connection())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(pair.downloads, 34);
}

#[actix_rt::test]
async fn test_appsupport_follows_current_version() {
    let env = setup().await;
    let dev = env.user("supporter", UserRole::Developer).await;
    let addon = env.submitted_addon(dev, "Supported").await;

    // Stale row for an application the add-on no longer supports
    app_support::ActiveModel {
        addon_id: Set(addon.id),
        app_id: Set(Application::Thunderbird.id()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(env.pool.connection())
    .await
    .unwrap();

    run_job(CronJob::UpdateAddonAppsupport, &env.pool, env.queue.as_ref())
        .await
        .unwrap();

    let rows = app_support::Entity::find()
        .filter(app_support::Column::AddonId.eq(addon.id))
        .all(env.pool.connection())
        .await
        .unwrap();
    let apps: Vec<i32> = rows.iter().map(|r| r.app_id).collect();
    assert_eq!(apps, vec![Application::Firefox.id()]);
}

#[actix_rt::test]
async fn test_missing_current_version_is_restored() {
    let env = setup().await;
    let dev = env.user("versioned", UserRole::Developer).await;
    let addon = env.submitted_addon(dev, "Lost Version").await;
    let current = addon.current_version_id;
    assert!(current.is_some());

    let mut active: addon::ActiveModel = addon.clone().into();
    active.current_version_id = Set(None);
    active.update(env.pool.connection()).await.unwrap();

    let planned = plan_job(CronJob::UpdateAddonsCurrentVersion, &env.pool)
        .await
        .unwrap();
    assert_eq!(planned.len(), 1);

    run_job(
        CronJob::UpdateAddonsCurrentVersion,
        &env.pool,
        env.queue.as_ref(),
    )
    .await
    .unwrap();
    assert_eq!(env.reload(addon.id).await.current_version_id, current);

    // Nothing left to fix
    assert!(
        plan_job(CronJob::UpdateAddonsCurrentVersion, &env.pool)
            .await
            .unwrap()
            .is_empty()
    );
}

#[actix_rt::test]
async fn test_last_updated_is_set_for_live_addons() {
    let env = setup().await;
    let dev = env.user("updater", UserRole::Developer).await;
    let addon = env.submitted_addon(dev, "Fresh").await;
    assert!(addon.last_updated.is_none());

    run_job(CronJob::AddonLastUpdated, &env.pool, env.queue.as_ref())
        .await
        .unwrap();

    // Unreviewed add-ons take the newest valid file's creation time
    let file = env.files(addon.id).await.remove(0);
    assert_eq!(env.reload(addon.id).await.last_updated, Some(file.created_at));
}

#[actix_rt::test]
async fn test_aggregates_refuse_to_write_when_read_only() {
    let env = setup().await;
    let dev = env.user("frozen", UserRole::Developer).await;
    let addon = env.submitted_addon(dev, "Frozen").await;

    let read_only = env.pool.with_read_only(true);
    let result = read_only.update_total_contributions(&[addon.id]).await;
    assert!(matches!(result, Err(AppError::ReadOnly)));
}

async fn set_addon(env: &TestEnv, model: &addon::Model, addon_type: AddonType, status: AddonStatus) {
    let mut active: addon::ActiveModel = model.clone().into();
    active.addon_type = Set(addon_type.as_i32());
    active.status = Set(status.as_i32());
    active.update(env.pool.connection()).await.unwrap();
}

#[actix_rt::test]
async fn test_last_updated_is_stable_across_runs() {
    let env = setup().await;
    let dev = env.user("repeater", UserRole::Developer).await;

    let persona = env.submitted_addon(dev, "Persona").await;
    set_addon(&env, &persona, AddonType::Persona, AddonStatus::Public).await;

    let public = env.submitted_addon(dev, "Public").await;
    set_addon(&env, &public, AddonType::Extension, AddonStatus::Public).await;
    let changed = Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap();
    for f in env.files(public.id).await {
        let mut active: file::ActiveModel = f.into();
        active.status = Set(AddonStatus::Public.as_i32());
        active.datestatuschanged = Set(Some(changed));
        active.update(env.pool.connection()).await.unwrap();
    }

    let listed = env.submitted_addon(dev, "Listed").await;
    set_addon(&env, &listed, AddonType::Extension, AddonStatus::Listed).await;

    let other = env.submitted_addon(dev, "Other").await;
    let ids = [persona.id, public.id, listed.id, other.id];

    run_job(CronJob::AddonLastUpdated, &env.pool, env.queue.as_ref())
        .await
        .unwrap();
    let mut first = Vec::new();
    for id in ids {
        first.push(env.reload(id).await.last_updated);
    }
    assert!(first.iter().all(Option::is_some));
    assert_eq!(first[0], Some(env.reload(persona.id).await.created_at));
    assert_eq!(first[1], Some(changed));

    run_job(CronJob::AddonLastUpdated, &env.pool, env.queue.as_ref())
        .await
        .unwrap();
    let mut second = Vec::new();
    for id in ids {
        second.push(env.reload(id).await.last_updated);
    }
    assert_eq!(first, second);
}

#[actix_rt::test]
async fn test_appsupport_is_stable_across_runs() {
    let env = setup().await;
    let dev = env.user("steady", UserRole::Developer).await;
    env.submitted_addon(dev, "Steady One").await;
    env.submitted_addon(dev, "Steady Two").await;

    run_job(CronJob::UpdateAddonAppsupport, &env.pool, env.queue.as_ref())
        .await
        .unwrap();
    let first = app_support::Entity::find()
        .all(env.pool.connection())
        .await
        .unwrap();
    assert_eq!(first.len(), 2);

    run_job(CronJob::UpdateAddonAppsupport, &env.pool, env.queue.as_ref())
        .await
        .unwrap();
    let second = app_support::Entity::find()
        .all(env.pool.connection())
        .await
        .unwrap();
    assert_eq!(second.len(), first.len());
    let pairs = |rows: &[app_support::Model]| {
        let mut pairs: Vec<(i64, i32)> = rows.iter().map(|r| (r.addon_id, r.app_id)).collect();
        pairs.sort();
        pairs
    };
    assert_eq!(pairs(&first), pairs(&second));
}
