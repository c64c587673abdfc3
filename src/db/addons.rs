//! Database operations for add-ons: creation from an upload, the wizard
//! steps, section edits and developer status actions.
//!
//! Every method that changes more than one row runs in a single transaction.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde_json::json;
use uuid::Uuid;

use crate::entity::addon::{self, ActiveModel, Entity as Addon};
use crate::entity::addon_category::{self, Entity as AddonCategory};
use crate::entity::addon_user::{self, Entity as AddonUser};
use crate::entity::category::{self, Entity as Category};
use crate::entity::file;
use crate::entity::file_upload;
use crate::entity::license;
use crate::entity::preview::{self, Entity as Preview};
use crate::entity::version;
use crate::entity::version_app;
use crate::error::{AppError, AppResult};
use crate::models::fields::MAX_SLUG_LENGTH;
use crate::models::license::builtin_license;
use crate::models::section::SectionSpec;
use crate::models::submit::{CleanDescribe, CleanLicense, CleanMedia, LicenseChoice, PreviewChange};
use crate::models::{
    AddonStatus, AddonType, Application, AuthorRole, DashboardQuery, DashboardSort, LogAction,
    Platform, ReviewRequest, SectionEdit,
};

use super::DbPool;
use super::activity_log::log_activity_in;
use super::submit_steps::{advance_submit_step_in, create_submit_step_in, delete_submit_step_in};
use super::validation_results::insert_validation_result_in;
use super::versions::{current_version_in, ensure_builtin_license_in};

const DEFAULT_PAGE_SIZE: u64 = 20;
const MAX_PAGE_SIZE: u64 = 100;

/// Step a new submission resumes at once the add-on exists.
pub const FIRST_TRACKED_STEP: i32 = 3;

/// ID given to add-ons whose manifest has none, in `{uuid}` form.
fn generated_guid() -> String {
    format!("{{{}}}", Uuid::new_v4())
}

/// Everything needed to create an add-on from a validated upload.
#[derive(Debug, Clone)]
pub struct NewAddon {
    pub user_id: i64,
    pub guid: Option<String>,
    pub name: String,
    pub addon_type: AddonType,
    pub version: String,
    pub apps: Vec<NewVersionApp>,
    pub platforms: Vec<Platform>,
    pub upload: file_upload::Model,
}

#[derive(Debug, Clone)]
pub struct NewVersionApp {
    pub application: Application,
    pub min_version: String,
    pub max_version: String,
}

/// Preview rows touched by a media save. Image files are moved or removed
/// by the caller once the transaction has committed.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MediaOutcome {
    /// `(preview id, upload hash)` of created previews
    pub created: Vec<(i64, String)>,
    pub deleted: Vec<i64>,
}

/// Lowercase ASCII slug derived from an add-on name.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let mut slug: String = slug.trim_matches('-').chars().take(MAX_SLUG_LENGTH).collect();
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        return "addon".to_string();
    }
    if slug.chars().all(|c| c.is_ascii_digit()) {
        slug.insert_str(0, "addon-");
        slug.truncate(MAX_SLUG_LENGTH);
    }
    slug
}

fn db_err(context: &'static str) -> impl Fn(DbErr) -> AppError {
    move |e| AppError::Database(format!("Failed to {}: {}", context, e))
}

async fn slug_taken<C: ConnectionTrait>(
    conn: &C,
    slug: &str,
    exclude: Option<i64>,
) -> Result<bool, DbErr> {
    let mut query = Addon::find().filter(addon::Column::Slug.eq(slug));
    if let Some(id) = exclude {
        query = query.filter(addon::Column::Id.ne(id));
    }
    Ok(query.one(conn).await?.is_some())
}

/// First free slug among `base`, `base-1`, `base-2`, ...
async fn unique_slug<C: ConnectionTrait>(conn: &C, base: &str) -> Result<String, DbErr> {
    if !slug_taken(conn, base, None).await? {
        return Ok(base.to_string());
    }
    let mut n = 1u32;
    loop {
        let suffix = format!("-{}", n);
        let keep = MAX_SLUG_LENGTH.saturating_sub(suffix.len());
        let candidate = format!("{}{}", &base[..base.len().min(keep)], suffix);
        if !slug_taken(conn, &candidate, None).await? {
            return Ok(candidate);
        }
        n += 1;
    }
}

async fn find_addon_in<C: ConnectionTrait>(conn: &C, addon_id: i64) -> AppResult<addon::Model> {
    Addon::find_by_id(addon_id)
        .one(conn)
        .await
        .map_err(db_err("get addon"))?
        .ok_or_else(|| AppError::NotFound(format!("Addon {}", addon_id)))
}

async fn check_slug_free(txn: &DatabaseTransaction, slug: &str, addon_id: i64) -> AppResult<()> {
    if slug_taken(txn, slug, Some(addon_id))
        .await
        .map_err(db_err("check slug"))?
    {
        return Err(AppError::field("slug", "This slug is already in use."));
    }
    Ok(())
}

/// Replace the add-on's categories. Unknown category ids are a form error.
async fn replace_categories_in(
    txn: &DatabaseTransaction,
    addon_id: i64,
    category_ids: &[i64],
) -> AppResult<()> {
    let known = Category::find()
        .filter(category::Column::Id.is_in(category_ids.to_vec()))
        .count(txn)
        .await
        .map_err(db_err("check categories"))?;
    if known != category_ids.len() as u64 {
        return Err(AppError::field("categories", "Select a valid choice."));
    }

    AddonCategory::delete_many()
        .filter(addon_category::Column::AddonId.eq(addon_id))
        .exec(txn)
        .await
        .map_err(db_err("clear categories"))?;

    let rows = category_ids.iter().map(|&category_id| addon_category::ActiveModel {
        addon_id: Set(addon_id),
        category_id: Set(category_id),
        ..Default::default()
    });
    AddonCategory::insert_many(rows)
        .exec(txn)
        .await
        .map_err(db_err("save categories"))?;
    Ok(())
}

async fn apply_preview_changes_in(
    txn: &DatabaseTransaction,
    addon_id: i64,
    changes: &[PreviewChange],
) -> AppResult<MediaOutcome> {
    let mut outcome = MediaOutcome::default();

    for change in changes {
        match change {
            PreviewChange::Create {
                upload_hash,
                caption,
                position,
            } => {
                let created = preview::ActiveModel {
                    addon_id: Set(addon_id),
                    caption: Set(caption.clone()),
                    position: Set(*position),
                    filetype: Set("image/png".to_string()),
                    created_at: Set(Utc::now()),
                    ..Default::default()
                }
                .insert(txn)
                .await
                .map_err(db_err("create preview"))?;
                outcome.created.push((created.id, upload_hash.clone()));
            }
            PreviewChange::Update {
                id,
                caption,
                position,
            } => {
                let mut active: preview::ActiveModel = owned_preview(txn, addon_id, *id).await?.into();
                active.caption = Set(caption.clone());
                active.position = Set(*position);
                active.update(txn).await.map_err(db_err("update preview"))?;
            }
            PreviewChange::Delete { id } => {
                owned_preview(txn, addon_id, *id).await?;
                Preview::delete_by_id(*id)
                    .exec(txn)
                    .await
                    .map_err(db_err("delete preview"))?;
                outcome.deleted.push(*id);
            }
        }
    }

    Ok(outcome)
}

async fn owned_preview(
    txn: &DatabaseTransaction,
    addon_id: i64,
    preview_id: i64,
) -> AppResult<preview::Model> {
    Preview::find_by_id(preview_id)
        .filter(preview::Column::AddonId.eq(addon_id))
        .one(txn)
        .await
        .map_err(db_err("get preview"))?
        .ok_or_else(|| AppError::field("previews", "Select a valid preview."))
}

impl DbPool {
    pub async fn get_addon(&self, id: i64) -> AppResult<Option<addon::Model>> {
        Addon::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(db_err("get addon"))
    }

    pub async fn get_addon_by_slug(&self, slug: &str) -> AppResult<Option<addon::Model>> {
        Addon::find()
            .filter(addon::Column::Slug.eq(slug))
            .one(self.connection())
            .await
            .map_err(db_err("get addon"))
    }

    pub async fn get_addons_by_ids(&self, ids: &[i64]) -> AppResult<Vec<addon::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Addon::find()
            .filter(addon::Column::Id.is_in(ids.to_vec()))
            .order_by_asc(addon::Column::Id)
            .all(self.connection())
            .await
            .map_err(db_err("get addons"))
    }

    pub async fn get_addon_category_ids(&self, addon_id: i64) -> AppResult<Vec<i64>> {
        let rows = AddonCategory::find()
            .filter(addon_category::Column::AddonId.eq(addon_id))
            .order_by_asc(addon_category::Column::CategoryId)
            .all(self.connection())
            .await
            .map_err(db_err("get categories"))?;
        Ok(rows.into_iter().map(|m| m.category_id).collect())
    }

    pub async fn get_previews(&self, addon_id: i64) -> AppResult<Vec<preview::Model>> {
        Preview::find()
            .filter(preview::Column::AddonId.eq(addon_id))
            .order_by_asc(preview::Column::Position)
            .order_by_asc(preview::Column::Id)
            .all(self.connection())
            .await
            .map_err(db_err("get previews"))
    }

    pub async fn insert_category(
        &self,
        name: &str,
        slug: &str,
        application: Application,
        addon_type: AddonType,
    ) -> AppResult<category::Model> {
        category::ActiveModel {
            name: Set(name.to_string()),
            slug: Set(slug.to_string()),
            application_id: Set(application.id()),
            addon_type: Set(addon_type.as_i32()),
            ..Default::default()
        }
        .insert(self.writer()?)
        .await
        .map_err(db_err("insert category"))
    }

    /// Categories offered to add-ons of a type.
    pub async fn list_categories(&self, addon_type: AddonType) -> AppResult<Vec<category::Model>> {
        Category::find()
            .filter(category::Column::AddonType.eq(addon_type.as_i32()))
            .order_by_asc(category::Column::Name)
            .all(self.connection())
            .await
            .map_err(db_err("list categories"))
    }

    /// Add-ons the user is an author of, excluding deleted ones.
    pub async fn list_user_addons(
        &self,
        user_id: i64,
        query: &DashboardQuery,
    ) -> AppResult<(Vec<addon::Model>, u64, u64, u64)> {
        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let page = query.page.unwrap_or(1).max(1);

        let mut select = Addon::find()
            .inner_join(AddonUser)
            .filter(addon_user::Column::UserId.eq(user_id))
            .filter(addon::Column::Status.ne(AddonStatus::Deleted.as_i32()));
        select = match query.sort {
            DashboardSort::Name => select.order_by_asc(addon::Column::Name),
            DashboardSort::Created => select.order_by_desc(addon::Column::CreatedAt),
            DashboardSort::Updated => select.order_by_desc(addon::Column::ModifiedAt),
        };
        let select = select.order_by_desc(addon::Column::Id);

        let paginator = select.paginate(self.connection(), limit);
        let total = paginator.num_items().await.map_err(db_err("count addons"))?;
        let addons = paginator
            .fetch_page(page - 1)
            .await
            .map_err(db_err("list addons"))?;

        Ok((addons, total, page, limit))
    }

    /// Create an add-on, its owner, first version and files from an upload,
    /// and start tracking the submission.
    pub async fn create_addon(&self, new: NewAddon) -> AppResult<addon::Model> {
        if let Some(ref guid) = new.guid {
            let duplicate = Addon::find()
                .filter(addon::Column::Guid.eq(guid.as_str()))
                .one(self.connection())
                .await
                .map_err(db_err("check guid"))?;
            if duplicate.is_some() {
                return Err(AppError::field("upload", "Duplicate add-on ID found."));
            }
        }

        let txn = self.writer()?.begin().await.map_err(db_err("begin transaction"))?;
        let now = Utc::now();

        let slug = unique_slug(&txn, &slugify(&new.name))
            .await
            .map_err(db_err("pick slug"))?;

        let guid = new.guid.clone().unwrap_or_else(generated_guid);
        let created = ActiveModel {
            guid: Set(Some(guid)),
            slug: Set(slug),
            name: Set(new.name.clone()),
            addon_type: Set(new.addon_type.as_i32()),
            status: Set(AddonStatus::Null.as_i32()),
            default_locale: Set("en-US".to_string()),
            view_source: Set(true),
            binary: Set(false),
            disabled_by_user: Set(false),
            total_contributions: Set(0),
            created_at: Set(now),
            modified_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(db_err("create addon"))?;

        addon_user::ActiveModel {
            addon_id: Set(created.id),
            user_id: Set(new.user_id),
            role: Set(AuthorRole::Owner.as_i32()),
            position: Set(0),
            listed: Set(true),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(db_err("add owner"))?;

        let version = version::ActiveModel {
            addon_id: Set(created.id),
            version: Set(new.version.clone()),
            license_id: Set(None),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(db_err("create version"))?;

        for app in &new.apps {
            version_app::ActiveModel {
                version_id: Set(version.id),
                application_id: Set(app.application.id()),
                min_version: Set(app.min_version.clone()),
                max_version: Set(app.max_version.clone()),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(db_err("save compatibility"))?;
        }

        for platform in &new.platforms {
            let file = file::ActiveModel {
                version_id: Set(version.id),
                platform: Set(platform.id()),
                filename: Set(new.upload.name.clone()),
                path: Set(new.upload.path.clone()),
                hash: Set(new.upload.hash.clone()),
                size: Set(new.upload.size),
                status: Set(AddonStatus::Unreviewed.as_i32()),
                datestatuschanged: Set(Some(now)),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(db_err("create file"))?;

            // The upload was already validated; reuse its result for the file.
            if new.upload.validation.is_some() {
                insert_validation_result_in(&txn, file.id, new.upload.validation.clone(), None)
                    .await
                    .map_err(db_err("copy validation"))?;
            }
        }

        let mut active: ActiveModel = created.into();
        active.current_version_id = Set(Some(version.id));
        let created = active.update(&txn).await.map_err(db_err("set current version"))?;

        create_submit_step_in(&txn, created.id, FIRST_TRACKED_STEP)
            .await
            .map_err(db_err("track submission"))?;

        log_activity_in(
            &txn,
            LogAction::CreateAddon,
            Some(created.id),
            Some(new.user_id),
            Some(json!({ "version": new.version })),
        )
        .await
        .map_err(db_err("log activity"))?;

        txn.commit().await.map_err(db_err("commit addon"))?;
        Ok(created)
    }

    /// Step 3: listing details.
    pub async fn save_describe(
        &self,
        addon_id: i64,
        describe: &CleanDescribe,
        advance_to: i32,
    ) -> AppResult<addon::Model> {
        let txn = self.writer()?.begin().await.map_err(db_err("begin transaction"))?;

        check_slug_free(&txn, &describe.slug, addon_id).await?;
        replace_categories_in(&txn, addon_id, &describe.categories).await?;

        let mut active: ActiveModel = find_addon_in(&txn, addon_id).await?.into();
        active.name = Set(describe.name.clone());
        active.slug = Set(describe.slug.clone());
        active.summary = Set(Some(describe.summary.clone()));
        active.description = Set(describe.description.clone());
        active.modified_at = Set(Utc::now());
        let updated = active.update(&txn).await.map_err(db_err("save description"))?;

        advance_submit_step_in(&txn, addon_id, advance_to)
            .await
            .map_err(db_err("advance submit step"))?;

        txn.commit().await.map_err(db_err("commit description"))?;
        Ok(updated)
    }

    /// Step 4: icon and previews.
    pub async fn save_media(
        &self,
        addon_id: i64,
        media: &CleanMedia,
        advance_to: i32,
    ) -> AppResult<MediaOutcome> {
        let txn = self.writer()?.begin().await.map_err(db_err("begin transaction"))?;

        let outcome = apply_preview_changes_in(&txn, addon_id, &media.previews).await?;

        let mut active: ActiveModel = find_addon_in(&txn, addon_id).await?.into();
        active.icon_type = Set(media.icon_type.clone());
        active.modified_at = Set(Utc::now());
        active.update(&txn).await.map_err(db_err("save icon"))?;

        advance_submit_step_in(&txn, addon_id, advance_to)
            .await
            .map_err(db_err("advance submit step"))?;

        txn.commit().await.map_err(db_err("commit media"))?;
        Ok(outcome)
    }

    /// Step 5: license of the current version plus policies.
    pub async fn save_license(
        &self,
        addon_id: i64,
        choice: &CleanLicense,
        advance_to: i32,
    ) -> AppResult<license::Model> {
        let txn = self.writer()?.begin().await.map_err(db_err("begin transaction"))?;

        let license = match &choice.license {
            LicenseChoice::Builtin(builtin) => {
                let known = builtin_license(*builtin)
                    .ok_or_else(|| AppError::field("builtin", "Select a valid license."))?;
                ensure_builtin_license_in(&txn, known)
                    .await
                    .map_err(db_err("get builtin license"))?
            }
            LicenseChoice::Custom { name, text } => license::ActiveModel {
                name: Set(name.clone()),
                text: Set(Some(text.clone())),
                url: Set(None),
                builtin: Set(0),
                created_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(db_err("create license"))?,
        };

        let addon = find_addon_in(&txn, addon_id).await?;
        let version = current_version_in(&txn, &addon)
            .await
            .map_err(db_err("get current version"))?
            .ok_or_else(|| AppError::InvalidInput("Add-on has no version to license".into()))?;

        let mut active_version: version::ActiveModel = version.into();
        active_version.license_id = Set(Some(license.id));
        active_version
            .update(&txn)
            .await
            .map_err(db_err("set license"))?;

        let mut active: ActiveModel = addon.into();
        active.privacy_policy = Set(choice.privacy_policy.clone());
        active.eula = Set(choice.eula.clone());
        active.modified_at = Set(Utc::now());
        active.update(&txn).await.map_err(db_err("save policies"))?;

        advance_submit_step_in(&txn, addon_id, advance_to)
            .await
            .map_err(db_err("advance submit step"))?;

        txn.commit().await.map_err(db_err("commit license"))?;
        Ok(license)
    }

    /// Step 6: enter the chosen review queue and stop tracking the submission.
    pub async fn finish_submission(
        &self,
        addon_id: i64,
        request: ReviewRequest,
        user_id: i64,
    ) -> AppResult<addon::Model> {
        let txn = self.writer()?.begin().await.map_err(db_err("begin transaction"))?;

        let status = request.submission_status();
        let mut active: ActiveModel = find_addon_in(&txn, addon_id).await?.into();
        active.status = Set(status.as_i32());
        active.modified_at = Set(Utc::now());
        let updated = active.update(&txn).await.map_err(db_err("set status"))?;

        delete_submit_step_in(&txn, addon_id)
            .await
            .map_err(db_err("finish submission"))?;

        log_activity_in(
            &txn,
            LogAction::ChangeStatus,
            Some(addon_id),
            Some(user_id),
            Some(json!({ "status": status })),
        )
        .await
        .map_err(db_err("log activity"))?;

        txn.commit().await.map_err(db_err("commit submission"))?;
        Ok(updated)
    }

    /// Save one edit section and log it with the section's action.
    pub async fn save_section(
        &self,
        addon_id: i64,
        edit: &SectionEdit,
        spec: SectionSpec,
        user_id: i64,
    ) -> AppResult<(addon::Model, MediaOutcome)> {
        let txn = self.writer()?.begin().await.map_err(db_err("begin transaction"))?;

        if let Some(slug) = edit.new_slug() {
            check_slug_free(&txn, slug, addon_id).await?;
        }
        if let Some(categories) = edit.categories() {
            replace_categories_in(&txn, addon_id, categories).await?;
        }
        let outcome = match edit.media() {
            Some(media) => apply_preview_changes_in(&txn, addon_id, &media.previews).await?,
            None => MediaOutcome::default(),
        };

        let mut active: ActiveModel = find_addon_in(&txn, addon_id).await?.into();
        edit.apply(&mut active);
        active.modified_at = Set(Utc::now());
        let updated = active.update(&txn).await.map_err(db_err("save section"))?;

        log_activity_in(
            &txn,
            spec.action,
            Some(addon_id),
            Some(user_id),
            Some(json!({ "fields": spec.fields })),
        )
        .await
        .map_err(db_err("log activity"))?;

        txn.commit().await.map_err(db_err("commit section"))?;
        Ok((updated, outcome))
    }

    /// Change the review status and log why.
    pub async fn set_addon_status(
        &self,
        addon_id: i64,
        status: AddonStatus,
        action: LogAction,
        user_id: i64,
    ) -> AppResult<addon::Model> {
        let txn = self.writer()?.begin().await.map_err(db_err("begin transaction"))?;

        let mut active: ActiveModel = find_addon_in(&txn, addon_id).await?.into();
        active.status = Set(status.as_i32());
        active.modified_at = Set(Utc::now());
        let updated = active.update(&txn).await.map_err(db_err("set status"))?;

        log_activity_in(
            &txn,
            action,
            Some(addon_id),
            Some(user_id),
            Some(json!({ "status": status })),
        )
        .await
        .map_err(db_err("log activity"))?;

        txn.commit().await.map_err(db_err("commit status"))?;
        Ok(updated)
    }

    /// Developer-side switch hiding the add-on without changing its status.
    pub async fn set_disabled_by_user(
        &self,
        addon_id: i64,
        disabled: bool,
        user_id: i64,
    ) -> AppResult<addon::Model> {
        let txn = self.writer()?.begin().await.map_err(db_err("begin transaction"))?;

        let mut active: ActiveModel = find_addon_in(&txn, addon_id).await?.into();
        active.disabled_by_user = Set(disabled);
        active.modified_at = Set(Utc::now());
        let updated = active.update(&txn).await.map_err(db_err("toggle addon"))?;

        let action = if disabled {
            LogAction::UserDisable
        } else {
            LogAction::UserEnable
        };
        log_activity_in(&txn, action, Some(addon_id), Some(user_id), None)
            .await
            .map_err(db_err("log activity"))?;

        txn.commit().await.map_err(db_err("commit toggle"))?;
        Ok(updated)
    }
}
