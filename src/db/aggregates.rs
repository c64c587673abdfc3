//! Derived counters recomputed by the periodic jobs.
//!
//! Each `update_*` method handles one chunk of keys: it reads the raw rows for
//! those keys only, aggregates them, and writes the result inside one
//! transaction. Running a unit twice leaves the same values behind.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};

use crate::entity::addon::{self, Entity as Addon};
use crate::entity::addon_collection::{self, Entity as AddonCollection};
use crate::entity::addon_collection_count::{self, Entity as AddonCollectionCount};
use crate::entity::app_support::{self, Entity as AppSupport};
use crate::entity::collection::{self, Entity as Collection};
use crate::entity::collection_count::{self, Entity as CollectionCount};
use crate::entity::contribution::{self, Entity as Contribution};
use crate::entity::file::{self, Entity as File};
use crate::entity::version::{self, Entity as Version};
use crate::entity::version_app::{self, Entity as VersionApp};
use crate::error::{AppError, AppResult};
use crate::models::{AddonStatus, AddonType};

use super::DbPool;

fn db_err(context: &'static str) -> impl Fn(DbErr) -> AppError {
    move |e| AppError::Database(format!("Failed to {}: {}", context, e))
}

/// File columns that decide "last updated".
#[derive(Debug, Clone, Copy)]
pub struct FileDates {
    pub status: i32,
    pub datestatuschanged: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// When an add-on last changed in a way visible to users.
///
/// Personas use their creation date. Public add-ons use the newest status
/// change of a public file, listed add-ons their newest version, and every
/// other add-on the newest file with a valid status. Without any candidate
/// the creation date is used.
pub fn compute_last_updated(
    addon_type: i32,
    status: i32,
    created_at: DateTime<Utc>,
    versions_created: &[DateTime<Utc>],
    files: &[FileDates],
) -> DateTime<Utc> {
    if AddonType::from_i32(addon_type) == Some(AddonType::Persona) {
        return created_at;
    }

    let candidate = match AddonStatus::from_i32(status) {
        Some(AddonStatus::Public) => files
            .iter()
            .filter(|f| f.status == AddonStatus::Public.as_i32())
            .filter_map(|f| f.datestatuschanged)
            .max(),
        Some(AddonStatus::Listed) => versions_created.iter().copied().max(),
        _ => files
            .iter()
            .filter(|f| AddonStatus::from_i32(f.status).is_some_and(AddonStatus::is_valid))
            .map(|f| f.created_at)
            .max(),
    };

    candidate.unwrap_or(created_at)
}

impl DbPool {
    /// Ids of add-ons that are not deleted, ascending.
    pub async fn get_live_addon_ids(&self) -> AppResult<Vec<i64>> {
        Addon::find()
            .select_only()
            .column(addon::Column::Id)
            .filter(addon::Column::Status.ne(AddonStatus::Deleted.as_i32()))
            .order_by_asc(addon::Column::Id)
            .into_tuple::<i64>()
            .all(self.connection())
            .await
            .map_err(db_err("list addons"))
    }

    /// Add-ons with versions but no current version set.
    pub async fn get_addon_ids_missing_current_version(&self) -> AppResult<Vec<i64>> {
        let missing: Vec<i64> = Addon::find()
            .select_only()
            .column(addon::Column::Id)
            .filter(addon::Column::CurrentVersionId.is_null())
            .filter(addon::Column::Status.ne(AddonStatus::Deleted.as_i32()))
            .order_by_asc(addon::Column::Id)
            .into_tuple::<i64>()
            .all(self.connection())
            .await
            .map_err(db_err("list addons"))?;
        if missing.is_empty() {
            return Ok(missing);
        }

        let with_versions: HashSet<i64> = Version::find()
            .select_only()
            .column(version::Column::AddonId)
            .filter(version::Column::AddonId.is_in(missing.clone()))
            .into_tuple::<i64>()
            .all(self.connection())
            .await
            .map_err(db_err("list versions"))?
            .into_iter()
            .collect();

        Ok(missing
            .into_iter()
            .filter(|id| with_versions.contains(id))
            .collect())
    }

    /// Distinct (addon, collection) pairs that have raw download counts.
    pub async fn get_addon_collection_pairs_with_counts(&self) -> AppResult<Vec<(i64, i64)>> {
        AddonCollectionCount::find()
            .select_only()
            .column(addon_collection_count::Column::AddonId)
            .column(addon_collection_count::Column::CollectionId)
            .distinct()
            .order_by_asc(addon_collection_count::Column::AddonId)
            .order_by_asc(addon_collection_count::Column::CollectionId)
            .into_tuple::<(i64, i64)>()
            .all(self.connection())
            .await
            .map_err(db_err("list collection counts"))
    }

    /// Collections that have raw download counts.
    pub async fn get_collection_ids_with_counts(&self) -> AppResult<Vec<i64>> {
        CollectionCount::find()
            .select_only()
            .column(collection_count::Column::CollectionId)
            .distinct()
            .order_by_asc(collection_count::Column::CollectionId)
            .into_tuple::<i64>()
            .all(self.connection())
            .await
            .map_err(db_err("list collection counts"))
    }

    /// Add-ons that received contributions.
    pub async fn get_addon_ids_with_contributions(&self) -> AppResult<Vec<i64>> {
        Contribution::find()
            .select_only()
            .column(contribution::Column::AddonId)
            .distinct()
            .order_by_asc(contribution::Column::AddonId)
            .into_tuple::<i64>()
            .all(self.connection())
            .await
            .map_err(db_err("list contributions"))
    }

    /// Recompute `last_updated` for a chunk. Returns how many add-ons changed.
    pub async fn update_last_updated(&self, addon_ids: &[i64]) -> AppResult<u64> {
        if addon_ids.is_empty() {
            return Ok(0);
        }
        let txn = self
            .writer()?
            .begin()
            .await
            .map_err(db_err("begin transaction"))?;

        let addons = Addon::find()
            .filter(addon::Column::Id.is_in(addon_ids.to_vec()))
            .all(&txn)
            .await
            .map_err(db_err("load addons"))?;
        let versions = Version::find()
            .filter(version::Column::AddonId.is_in(addon_ids.to_vec()))
            .all(&txn)
            .await
            .map_err(db_err("load versions"))?;

        let version_addon: HashMap<i64, i64> = versions.iter().map(|v| (v.id, v.addon_id)).collect();
        let mut version_dates: HashMap<i64, Vec<DateTime<Utc>>> = HashMap::new();
        for v in &versions {
            version_dates.entry(v.addon_id).or_default().push(v.created_at);
        }

        let mut file_dates: HashMap<i64, Vec<FileDates>> = HashMap::new();
        if !version_addon.is_empty() {
            let files = File::find()
                .filter(file::Column::VersionId.is_in(version_addon.keys().copied().collect::<Vec<_>>()))
                .all(&txn)
                .await
                .map_err(db_err("load files"))?;
            for f in files {
                if let Some(addon_id) = version_addon.get(&f.version_id) {
                    file_dates.entry(*addon_id).or_default().push(FileDates {
                        status: f.status,
                        datestatuschanged: f.datestatuschanged,
                        created_at: f.created_at,
                    });
                }
            }
        }

        let mut changed = 0;
        for a in addons {
            let value = compute_last_updated(
                a.addon_type,
                a.status,
                a.created_at,
                version_dates.get(&a.id).map(Vec::as_slice).unwrap_or_default(),
                file_dates.get(&a.id).map(Vec::as_slice).unwrap_or_default(),
            );
            if a.last_updated == Some(value) {
                continue;
            }
            let mut active: addon::ActiveModel = a.into();
            active.last_updated = Set(Some(value));
            active
                .update(&txn)
                .await
                .map_err(db_err("save last_updated"))?;
            changed += 1;
        }

        txn.commit().await.map_err(db_err("commit last_updated"))?;
        Ok(changed)
    }

    /// Replace the AppSupport rows of a chunk with the applications of each
    /// add-on's current version. Returns the number of rows inserted.
    pub async fn update_appsupport(&self, addon_ids: &[i64]) -> AppResult<u64> {
        if addon_ids.is_empty() {
            return Ok(0);
        }
        let txn = self
            .writer()?
            .begin()
            .await
            .map_err(db_err("begin transaction"))?;

        let addons = Addon::find()
            .filter(addon::Column::Id.is_in(addon_ids.to_vec()))
            .all(&txn)
            .await
            .map_err(db_err("load addons"))?;
        let versions = Version::find()
            .filter(version::Column::AddonId.is_in(addon_ids.to_vec()))
            .order_by_asc(version::Column::CreatedAt)
            .order_by_asc(version::Column::Id)
            .all(&txn)
            .await
            .map_err(db_err("load versions"))?;

        // Newest version last, so later inserts win.
        let mut latest: HashMap<i64, i64> = HashMap::new();
        let mut owned: HashMap<i64, i64> = HashMap::new();
        for v in &versions {
            latest.insert(v.addon_id, v.id);
            owned.insert(v.id, v.addon_id);
        }

        let mut chosen: HashMap<i64, i64> = HashMap::new();
        for a in &addons {
            let current = a
                .current_version_id
                .filter(|id| owned.get(id) == Some(&a.id))
                .or_else(|| latest.get(&a.id).copied());
            if let Some(version_id) = current {
                chosen.insert(version_id, a.id);
            }
        }

        let mut pairs: BTreeSet<(i64, i32)> = BTreeSet::new();
        if !chosen.is_empty() {
            let apps = VersionApp::find()
                .filter(version_app::Column::VersionId.is_in(chosen.keys().copied().collect::<Vec<_>>()))
                .all(&txn)
                .await
                .map_err(db_err("load compatibility"))?;
            for app in apps {
                if let Some(addon_id) = chosen.get(&app.version_id) {
                    pairs.insert((*addon_id, app.application_id));
                }
            }
        }

        AppSupport::delete_many()
            .filter(app_support::Column::AddonId.is_in(addon_ids.to_vec()))
            .exec(&txn)
            .await
            .map_err(db_err("clear appsupport"))?;

        let inserted = pairs.len() as u64;
        if !pairs.is_empty() {
            let now = Utc::now();
            let rows = pairs.into_iter().map(|(addon_id, app_id)| app_support::ActiveModel {
                addon_id: Set(addon_id),
                app_id: Set(app_id),
                created_at: Set(now),
                ..Default::default()
            });
            AppSupport::insert_many(rows)
                .exec(&txn)
                .await
                .map_err(db_err("insert appsupport"))?;
        }

        txn.commit().await.map_err(db_err("commit appsupport"))?;
        Ok(inserted)
    }

    /// Sum raw counts into `addons_collections.downloads` for a chunk of pairs.
    pub async fn update_addons_collections_downloads(&self, pairs: &[(i64, i64)]) -> AppResult<u64> {
        if pairs.is_empty() {
            return Ok(0);
        }
        let wanted: HashSet<(i64, i64)> = pairs.iter().copied().collect();
        let addon_ids: Vec<i64> = wanted.iter().map(|(a, _)| *a).collect::<BTreeSet<_>>().into_iter().collect();
        let collection_ids: Vec<i64> = wanted.iter().map(|(_, c)| *c).collect::<BTreeSet<_>>().into_iter().collect();

        let txn = self
            .writer()?
            .begin()
            .await
            .map_err(db_err("begin transaction"))?;

        let counts = AddonCollectionCount::find()
            .filter(addon_collection_count::Column::AddonId.is_in(addon_ids))
            .filter(addon_collection_count::Column::CollectionId.is_in(collection_ids))
            .all(&txn)
            .await
            .map_err(db_err("load collection counts"))?;

        let mut totals: HashMap<(i64, i64), i64> = HashMap::new();
        for row in counts {
            let key = (row.addon_id, row.collection_id);
            if wanted.contains(&key) {
                *totals.entry(key).or_default() += i64::from(row.count);
            }
        }

        let mut updated = 0;
        for ((addon_id, collection_id), total) in totals {
            let result = AddonCollection::update_many()
                .col_expr(addon_collection::Column::Downloads, Expr::value(total))
                .filter(addon_collection::Column::AddonId.eq(addon_id))
                .filter(addon_collection::Column::CollectionId.eq(collection_id))
                .exec(&txn)
                .await
                .map_err(db_err("save addon collection downloads"))?;
            updated += result.rows_affected;
        }

        txn.commit().await.map_err(db_err("commit downloads"))?;
        Ok(updated)
    }

    /// Sum raw counts into `collections.downloads` for a chunk.
    pub async fn update_collections_total(&self, collection_ids: &[i64]) -> AppResult<u64> {
        if collection_ids.is_empty() {
            return Ok(0);
        }
        let txn = self
            .writer()?
            .begin()
            .await
            .map_err(db_err("begin transaction"))?;

        let counts = CollectionCount::find()
            .filter(collection_count::Column::CollectionId.is_in(collection_ids.to_vec()))
            .all(&txn)
            .await
            .map_err(db_err("load collection counts"))?;

        let mut totals: HashMap<i64, i64> = HashMap::new();
        for row in counts {
            *totals.entry(row.collection_id).or_default() += i64::from(row.count);
        }

        let mut updated = 0;
        for (collection_id, total) in totals {
            let result = Collection::update_many()
                .col_expr(collection::Column::Downloads, Expr::value(total))
                .filter(collection::Column::Id.eq(collection_id))
                .exec(&txn)
                .await
                .map_err(db_err("save collection downloads"))?;
            updated += result.rows_affected;
        }

        txn.commit().await.map_err(db_err("commit collection totals"))?;
        Ok(updated)
    }

    /// Sum contributions into `addons.total_contributions` for a chunk.
    pub async fn update_total_contributions(&self, addon_ids: &[i64]) -> AppResult<u64> {
        if addon_ids.is_empty() {
            return Ok(0);
        }
        let txn = self
            .writer()?
            .begin()
            .await
            .map_err(db_err("begin transaction"))?;

        let rows = Contribution::find()
            .filter(contribution::Column::AddonId.is_in(addon_ids.to_vec()))
            .all(&txn)
            .await
            .map_err(db_err("load contributions"))?;

        let mut totals: HashMap<i64, i64> = addon_ids.iter().map(|id| (*id, 0)).collect();
        for row in rows {
            *totals.entry(row.addon_id).or_default() += i64::from(row.amount);
        }

        let mut updated = 0;
        for (addon_id, total) in totals {
            let result = Addon::update_many()
                .col_expr(addon::Column::TotalContributions, Expr::value(total))
                .filter(addon::Column::Id.eq(addon_id))
                .exec(&txn)
                .await
                .map_err(db_err("save contributions"))?;
            updated += result.rows_affected;
        }

        txn.commit().await.map_err(db_err("commit contributions"))?;
        Ok(updated)
    }

    /// Point add-ons without a current version at their newest one.
    pub async fn update_current_versions(&self, addon_ids: &[i64]) -> AppResult<u64> {
        if addon_ids.is_empty() {
            return Ok(0);
        }
        let txn = self
            .writer()?
            .begin()
            .await
            .map_err(db_err("begin transaction"))?;

        let versions = Version::find()
            .filter(version::Column::AddonId.is_in(addon_ids.to_vec()))
            .order_by_asc(version::Column::CreatedAt)
            .order_by_asc(version::Column::Id)
            .all(&txn)
            .await
            .map_err(db_err("load versions"))?;
        let latest: HashMap<i64, i64> = versions.iter().map(|v| (v.addon_id, v.id)).collect();

        let mut updated = 0;
        for (addon_id, version_id) in latest {
            let result = Addon::update_many()
                .col_expr(addon::Column::CurrentVersionId, Expr::value(version_id))
                .filter(addon::Column::Id.eq(addon_id))
                .filter(addon::Column::CurrentVersionId.is_null())
                .exec(&txn)
                .await
                .map_err(db_err("set current version"))?;
            updated += result.rows_affected;
        }

        txn.commit().await.map_err(db_err("commit current versions"))?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap()
    }

    fn file(status: AddonStatus, changed: Option<u32>, created: u32) -> FileDates {
        FileDates {
            status: status.as_i32(),
            datestatuschanged: changed.map(at),
            created_at: at(created),
        }
    }

    #[test]
    fn test_persona_uses_created() {
        let files = [file(AddonStatus::Public, Some(20), 10)];
        let value = compute_last_updated(
            AddonType::Persona.as_i32(),
            AddonStatus::Public.as_i32(),
            at(1),
            &[at(5)],
            &files,
        );
        assert_eq!(value, at(1));
    }

    #[test]
    fn test_public_uses_newest_public_status_change() {
        let files = [
            file(AddonStatus::Public, Some(8), 2),
            file(AddonStatus::Public, Some(12), 3),
            file(AddonStatus::Unreviewed, Some(25), 24),
        ];
        let value = compute_last_updated(
            AddonType::Extension.as_i32(),
            AddonStatus::Public.as_i32(),
            at(1),
            &[],
            &files,
        );
        assert_eq!(value, at(12));
    }

    #[test]
    fn test_listed_uses_newest_version() {
        let value = compute_last_updated(
            AddonType::Extension.as_i32(),
            AddonStatus::Listed.as_i32(),
            at(1),
            &[at(3), at(9), at(6)],
            &[file(AddonStatus::Listed, Some(20), 20)],
        );
        assert_eq!(value, at(9));
    }

    #[test]
    fn test_other_statuses_use_newest_valid_file() {
        let files = [
            file(AddonStatus::Unreviewed, None, 4),
            file(AddonStatus::Disabled, None, 15),
            file(AddonStatus::Lite, None, 7),
        ];
        let value = compute_last_updated(
            AddonType::Theme.as_i32(),
            AddonStatus::Lite.as_i32(),
            at(1),
            &[],
            &files,
        );
        assert_eq!(value, at(7));
    }

    #[test]
    fn test_missing_candidates_fall_back_to_created() {
        let value = compute_last_updated(
            AddonType::Extension.as_i32(),
            AddonStatus::Public.as_i32(),
            at(2),
            &[],
            &[file(AddonStatus::Public, None, 5)],
        );
        assert_eq!(value, at(2));
    }
}
