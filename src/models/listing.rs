//! Dashboard and version listing DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::addon::{AddonStatus, ReviewRequest};
use super::platform::{Application, Platform};
use crate::entity::addon;

/// Sort orders of the add-on dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DashboardSort {
    Name,
    Created,
    #[default]
    Updated,
}

/// Dashboard query parameters.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DashboardQuery {
    #[serde(default)]
    pub sort: DashboardSort,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// Add-on row on the dashboard.
#[derive(Debug, Serialize, ToSchema)]
pub struct AddonSummary {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub status: Option<AddonStatus>,
    pub status_display: &'static str,
    pub disabled_by_user: bool,
    pub last_updated: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Wizard step to resume at, when the submission is unfinished.
    pub submission_step: Option<i32>,
}

impl AddonSummary {
    pub fn from_model(addon: &addon::Model, submission_step: Option<i32>) -> Self {
        let status = AddonStatus::from_i32(addon.status);
        Self {
            id: addon.id,
            slug: addon.slug.clone(),
            name: addon.name.clone(),
            status,
            status_display: status.map(AddonStatus::as_str).unwrap_or("Unknown"),
            disabled_by_user: addon.disabled_by_user,
            last_updated: addon.last_updated,
            created_at: addon.created_at,
            submission_step,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AddonListResponse {
    pub addons: Vec<AddonSummary>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

/// File of a version on the versions page.
#[derive(Debug, Serialize, ToSchema)]
pub struct FileSummary {
    pub id: i64,
    pub platform: Option<Platform>,
    pub filename: String,
    pub size: i64,
    pub status: Option<AddonStatus>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CompatibleApp {
    pub application: Option<Application>,
    pub min_version: String,
    pub max_version: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VersionSummary {
    pub id: i64,
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub files: Vec<FileSummary>,
    pub apps: Vec<CompatibleApp>,
}

/// Versions page: versions plus the review actions currently offered.
#[derive(Debug, Serialize, ToSchema)]
pub struct VersionListResponse {
    pub addon: AddonSummary,
    pub versions: Vec<VersionSummary>,
    pub review_requests: Vec<ReviewRequest>,
    pub can_cancel_review: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DeleteVersionForm {
    pub version_id: i64,
}

/// Add-on deletion requires re-typing the slug.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DeleteAddonForm {
    pub slug: String,
}
