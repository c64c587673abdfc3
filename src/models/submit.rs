//! Submission wizard pages and the forms posted to each step.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::addon::ReviewRequest;
use super::fields::{
    MAX_NAME_LENGTH, MAX_SUMMARY_LENGTH, REQUIRED, clean_slug, clean_text, finish, push_error,
};
use super::license::{CUSTOM_LICENSE, builtin_license};
use super::platform::Platform;
use crate::error::FormErrors;

/// Number of the last wizard step.
pub const MAX_STEP: i32 = 7;

/// Categories an add-on may be listed in.
pub const MAX_CATEGORIES: usize = 2;

pub const MAX_CAPTION_LENGTH: usize = 280;

/// Built-in icons selectable instead of uploading an image.
pub const ICON_TYPES: [&str; 19] = [
    "icon/alerts",
    "icon/clock",
    "icon/coffee",
    "icon/dictionary",
    "icon/downloads",
    "icon/feeds",
    "icon/games",
    "icon/library",
    "icon/location",
    "icon/music",
    "icon/search",
    "icon/shopping",
    "icon/social",
    "icon/soft",
    "icon/sports",
    "icon/theme",
    "icon/web",
    "icon/wrench",
    "icon/default",
];

/// Uploaded icons are stored with their image type.
pub const UPLOADED_ICON_TYPES: [&str; 2] = ["image/png", "image/jpeg"];

/// Position of a request in the wizard: the step being shown and the
/// furthest step the add-on may visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Step {
    pub current: i32,
    pub max: i32,
}

/// JSON page returned for a wizard GET.
#[derive(Debug, Serialize, ToSchema)]
pub struct StepPage {
    pub step: Step,
    /// Slug of the add-on being submitted (absent before the upload step).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addon: Option<String>,
    /// Step-specific context (current values, choices).
    #[schema(value_type = Object)]
    pub context: serde_json::Value,
}

/// Step 2: create an add-on from a validated upload.
#[derive(Debug, Deserialize, ToSchema)]
pub struct NewAddonForm {
    pub upload: Option<Uuid>,
    #[serde(default)]
    pub desktop_platforms: Vec<Platform>,
    #[serde(default)]
    pub mobile_platforms: Vec<Platform>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CleanNewAddon {
    pub upload: Uuid,
    pub platforms: Vec<Platform>,
}

impl NewAddonForm {
    pub fn clean(&self) -> Result<CleanNewAddon, FormErrors> {
        let mut errors = FormErrors::new();

        if self.upload.is_none() {
            push_error(&mut errors, "upload", REQUIRED);
        }

        let desktop = narrow_platforms(&self.desktop_platforms, Platform::All);
        let mobile = narrow_platforms(&self.mobile_platforms, Platform::AllMobile);

        if desktop.iter().any(|p| p.is_mobile()) {
            push_error(&mut errors, "desktop_platforms", "Select a desktop platform.");
        }
        if mobile.iter().any(|p| !p.is_mobile()) {
            push_error(&mut errors, "mobile_platforms", "Select a mobile platform.");
        }
        if desktop.is_empty() && mobile.is_empty() {
            push_error(&mut errors, "platforms", "Need at least one platform.");
        }

        let cleaned = self.upload.map(|upload| CleanNewAddon {
            upload,
            platforms: desktop.into_iter().chain(mobile).collect(),
        });
        finish(errors, cleaned)
    }
}

/// Choosing the "all" platform makes every other choice in the group redundant.
fn narrow_platforms(chosen: &[Platform], all: Platform) -> Vec<Platform> {
    if chosen.contains(&all) {
        return vec![all];
    }
    chosen
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Step 3: public listing details.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct DescribeForm {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub categories: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CleanDescribe {
    pub name: String,
    pub slug: String,
    pub summary: String,
    pub description: Option<String>,
    pub categories: Vec<i64>,
}

impl DescribeForm {
    pub fn clean(&self) -> Result<CleanDescribe, FormErrors> {
        let mut errors = FormErrors::new();

        let name = clean_text(
            &mut errors,
            "name",
            self.name.as_deref(),
            true,
            Some(MAX_NAME_LENGTH),
        )
        .flatten();
        let slug = clean_slug(&mut errors, "slug", self.slug.as_deref());
        let summary = clean_text(
            &mut errors,
            "summary",
            self.summary.as_deref(),
            true,
            Some(MAX_SUMMARY_LENGTH),
        )
        .flatten();
        let description = clean_text(
            &mut errors,
            "description",
            self.description.as_deref(),
            false,
            None,
        );
        let categories = clean_categories(&mut errors, &self.categories);

        let cleaned = match (name, slug, summary, description, categories) {
            (Some(name), Some(slug), Some(summary), Some(description), Some(categories)) => {
                Some(CleanDescribe {
                    name,
                    slug,
                    summary,
                    description,
                    categories,
                })
            }
            _ => None,
        };
        finish(errors, cleaned)
    }
}

/// Deduplicate category ids; between one and `MAX_CATEGORIES` are allowed.
pub fn clean_categories(errors: &mut FormErrors, ids: &[i64]) -> Option<Vec<i64>> {
    let unique: Vec<i64> = ids
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if unique.is_empty() {
        push_error(errors, "categories", REQUIRED);
        return None;
    }
    if unique.len() > MAX_CATEGORIES {
        push_error(
            errors,
            "categories",
            format!("You can have only {} categories.", MAX_CATEGORIES),
        );
        return None;
    }
    Some(unique)
}

/// Step 4: icon and screenshots.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct MediaForm {
    pub icon_type: Option<String>,
    #[serde(default)]
    pub previews: Vec<PreviewForm>,
}

/// One row of the preview formset. Rows without an id are new previews.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PreviewForm {
    pub id: Option<i64>,
    /// Token returned by the image upload endpoint.
    pub upload_hash: Option<String>,
    pub caption: Option<String>,
    #[serde(default)]
    pub position: i32,
    #[serde(default)]
    pub delete: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PreviewChange {
    Create {
        upload_hash: String,
        caption: Option<String>,
        position: i32,
    },
    Update {
        id: i64,
        caption: Option<String>,
        position: i32,
    },
    Delete {
        id: i64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CleanMedia {
    pub icon_type: Option<String>,
    pub previews: Vec<PreviewChange>,
}

impl MediaForm {
    pub fn clean(&self) -> Result<CleanMedia, FormErrors> {
        let mut errors = FormErrors::new();

        let icon_type = clean_icon_type(&mut errors, self.icon_type.as_deref());

        let mut previews = Vec::with_capacity(self.previews.len());
        for (index, row) in self.previews.iter().enumerate() {
            let field = format!("previews.{}", index);
            let caption = clean_text(
                &mut errors,
                &field,
                row.caption.as_deref(),
                false,
                Some(MAX_CAPTION_LENGTH),
            );
            match (row.id, row.delete) {
                (Some(id), true) => previews.push(PreviewChange::Delete { id }),
                // Deleting a row that was never saved is a no-op.
                (None, true) => {}
                (Some(id), false) => {
                    if let Some(caption) = caption {
                        previews.push(PreviewChange::Update {
                            id,
                            caption,
                            position: row.position,
                        });
                    }
                }
                (None, false) => match row.upload_hash.as_deref().map(str::trim) {
                    Some(hash) if is_upload_hash(hash) => {
                        if let Some(caption) = caption {
                            previews.push(PreviewChange::Create {
                                upload_hash: hash.to_string(),
                                caption,
                                position: row.position,
                            });
                        }
                    }
                    Some(_) => push_error(&mut errors, &field, "Invalid upload token."),
                    None => push_error(&mut errors, &field, "Upload a screenshot."),
                },
            }
        }

        finish(
            errors,
            icon_type.map(|icon_type| CleanMedia {
                icon_type,
                previews,
            }),
        )
    }
}

/// Empty means "no icon"; anything else must be a built-in or uploaded type.
pub fn clean_icon_type(errors: &mut FormErrors, value: Option<&str>) -> Option<Option<String>> {
    let icon = value.map(str::trim).unwrap_or_default();
    if icon.is_empty() {
        return Some(None);
    }
    if ICON_TYPES.contains(&icon) || UPLOADED_ICON_TYPES.contains(&icon) {
        Some(Some(icon.to_string()))
    } else {
        push_error(errors, "icon_type", "Select a valid icon.");
        None
    }
}

/// Upload tokens are simple-format UUIDs.
pub fn is_upload_hash(s: &str) -> bool {
    s.len() == 32 && s.chars().all(|c| c.is_ascii_hexdigit())
}

/// Step 5: license and optional policies.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct LicenseForm {
    /// Built-in license number; absent or 0 for a custom license.
    pub builtin: Option<i32>,
    pub name: Option<String>,
    pub text: Option<String>,
    #[serde(default)]
    pub has_priv: bool,
    pub privacy_policy: Option<String>,
    #[serde(default)]
    pub has_eula: bool,
    pub eula: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LicenseChoice {
    Builtin(i32),
    Custom { name: Option<String>, text: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CleanLicense {
    pub license: LicenseChoice,
    pub privacy_policy: Option<String>,
    pub eula: Option<String>,
}

impl LicenseForm {
    pub fn clean(&self) -> Result<CleanLicense, FormErrors> {
        let mut errors = FormErrors::new();

        let license = match self.builtin.unwrap_or(CUSTOM_LICENSE) {
            CUSTOM_LICENSE => {
                let name = clean_text(&mut errors, "name", self.name.as_deref(), false, Some(200));
                let text = clean_text(&mut errors, "text", self.text.as_deref(), true, None);
                match (name, text) {
                    (Some(name), Some(Some(text))) => Some(LicenseChoice::Custom { name, text }),
                    _ => None,
                }
            }
            builtin if builtin_license(builtin).is_some() => Some(LicenseChoice::Builtin(builtin)),
            _ => {
                push_error(&mut errors, "builtin", "Select a valid license.");
                None
            }
        };

        let privacy_policy = clean_text(
            &mut errors,
            "privacy_policy",
            self.privacy_policy.as_deref(),
            self.has_priv,
            None,
        );
        let eula = clean_text(&mut errors, "eula", self.eula.as_deref(), self.has_eula, None);

        let cleaned = match (license, privacy_policy, eula) {
            (Some(license), Some(privacy_policy), Some(eula)) => Some(CleanLicense {
                license,
                privacy_policy: privacy_policy.filter(|_| self.has_priv),
                eula: eula.filter(|_| self.has_eula),
            }),
            _ => None,
        };
        finish(errors, cleaned)
    }
}

/// Step 6: which review queue to enter.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ReviewTypeForm {
    pub review_type: Option<ReviewRequest>,
}

impl ReviewTypeForm {
    pub fn clean(&self) -> Result<ReviewRequest, FormErrors> {
        let mut errors = FormErrors::new();
        if self.review_type.is_none() {
            push_error(&mut errors, "review_type", REQUIRED);
        }
        finish(errors, self.review_type)
    }
}

/// Admin override of the persisted wizard step.
#[derive(Debug, Deserialize, ToSchema)]
pub struct BumpForm {
    pub step: i32,
}
