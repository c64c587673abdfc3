//! Edit sections of the add-on management page.
//!
//! Each section owns a fixed set of addon fields; posting a section can only
//! change those fields, whatever else the body carries.

use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use utoipa::ToSchema;

use super::activity::LogAction;
use super::addon::{AddonStatus, AddonType};
use super::fields::{
    MAX_NAME_LENGTH, MAX_SUMMARY_LENGTH, REQUIRED, clean_email, clean_slug, clean_text, clean_url,
    finish, push_error,
};
use super::submit::{CleanMedia, MediaForm, clean_categories};
use crate::entity::addon;
use crate::error::{FormErrors, NON_FIELD_ERRORS};

/// Editable section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Basic,
    Media,
    Details,
    Support,
    Technical,
    Admin,
}

/// What a section may touch and how edits to it are logged.
#[derive(Debug, Clone, Copy)]
pub struct SectionSpec {
    pub fields: &'static [&'static str],
    pub action: LogAction,
    pub admin_only: bool,
}

impl SectionKind {
    pub const ALL: [SectionKind; 6] = [
        Self::Basic,
        Self::Media,
        Self::Details,
        Self::Support,
        Self::Technical,
        Self::Admin,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Media => "media",
            Self::Details => "details",
            Self::Support => "support",
            Self::Technical => "technical",
            Self::Admin => "admin",
        }
    }

    pub fn spec(self) -> SectionSpec {
        match self {
            Self::Basic => SectionSpec {
                fields: &["name", "slug", "summary", "categories"],
                action: LogAction::EditProperties,
                admin_only: false,
            },
            Self::Media => SectionSpec {
                fields: &["icon_type", "previews"],
                action: LogAction::ChangeIcon,
                admin_only: false,
            },
            Self::Details => SectionSpec {
                fields: &["description", "default_locale", "homepage"],
                action: LogAction::EditProperties,
                admin_only: false,
            },
            Self::Support => SectionSpec {
                fields: &["support_email", "support_url"],
                action: LogAction::EditProperties,
                admin_only: false,
            },
            Self::Technical => SectionSpec {
                fields: &["developer_comments", "view_source", "binary"],
                action: LogAction::EditProperties,
                admin_only: false,
            },
            Self::Admin => SectionSpec {
                fields: &["addon_type", "status"],
                action: LogAction::ChangeStatus,
                admin_only: true,
            },
        }
    }

    /// Validate a posted body against this section's form.
    pub fn clean(self, body: JsonValue) -> Result<SectionEdit, FormErrors> {
        match self {
            Self::Basic => parse_form::<BasicForm>(body)?.clean().map(SectionEdit::Basic),
            Self::Media => parse_form::<MediaForm>(body)?.clean().map(SectionEdit::Media),
            Self::Details => parse_form::<DetailsForm>(body)?.clean(),
            Self::Support => parse_form::<SupportForm>(body)?.clean(),
            Self::Technical => Ok(parse_form::<TechnicalForm>(body)?.into_edit()),
            Self::Admin => parse_form::<AdminForm>(body)?.clean(),
        }
    }

    /// Current values of the section's fields.
    pub fn values(self, addon: &addon::Model, categories: &[i64]) -> JsonValue {
        match self {
            Self::Basic => json!({
                "name": addon.name,
                "slug": addon.slug,
                "summary": addon.summary,
                "categories": categories,
            }),
            Self::Media => json!({ "icon_type": addon.icon_type }),
            Self::Details => json!({
                "description": addon.description,
                "default_locale": addon.default_locale,
                "homepage": addon.homepage,
            }),
            Self::Support => json!({
                "support_email": addon.support_email,
                "support_url": addon.support_url,
            }),
            Self::Technical => json!({
                "developer_comments": addon.developer_comments,
                "view_source": addon.view_source,
                "binary": addon.binary,
            }),
            Self::Admin => json!({
                "addon_type": AddonType::from_i32(addon.addon_type),
                "status": AddonStatus::from_i32(addon.status),
            }),
        }
    }
}

fn parse_form<T: serde::de::DeserializeOwned>(body: JsonValue) -> Result<T, FormErrors> {
    serde_json::from_value(body).map_err(|e| {
        let mut errors = FormErrors::new();
        push_error(&mut errors, NON_FIELD_ERRORS, e.to_string());
        errors
    })
}

/// A validated section edit.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionEdit {
    Basic(CleanBasic),
    Media(CleanMedia),
    Details {
        description: Option<String>,
        default_locale: String,
        homepage: Option<String>,
    },
    Support {
        support_email: Option<String>,
        support_url: Option<String>,
    },
    Technical {
        developer_comments: Option<String>,
        view_source: bool,
        binary: bool,
    },
    Admin {
        addon_type: AddonType,
        status: AddonStatus,
    },
}

impl SectionEdit {
    /// Copy the edited fields onto `active`. Fields of other sections are left unset.
    pub fn apply(&self, active: &mut addon::ActiveModel) {
        use sea_orm::Set;

        match self {
            Self::Basic(basic) => {
                active.name = Set(basic.name.clone());
                active.slug = Set(basic.slug.clone());
                active.summary = Set(Some(basic.summary.clone()));
            }
            Self::Media(media) => {
                active.icon_type = Set(media.icon_type.clone());
            }
            Self::Details {
                description,
                default_locale,
                homepage,
            } => {
                active.description = Set(description.clone());
                active.default_locale = Set(default_locale.clone());
                active.homepage = Set(homepage.clone());
            }
            Self::Support {
                support_email,
                support_url,
            } => {
                active.support_email = Set(support_email.clone());
                active.support_url = Set(support_url.clone());
            }
            Self::Technical {
                developer_comments,
                view_source,
                binary,
            } => {
                active.developer_comments = Set(developer_comments.clone());
                active.view_source = Set(*view_source);
                active.binary = Set(*binary);
            }
            Self::Admin { addon_type, status } => {
                active.addon_type = Set(addon_type.as_i32());
                active.status = Set(status.as_i32());
            }
        }
    }

    /// Slug this edit claims, if any; it must stay unique.
    pub fn new_slug(&self) -> Option<&str> {
        match self {
            Self::Basic(basic) => Some(&basic.slug),
            _ => None,
        }
    }

    pub fn categories(&self) -> Option<&[i64]> {
        match self {
            Self::Basic(basic) => Some(&basic.categories),
            _ => None,
        }
    }

    pub fn media(&self) -> Option<&CleanMedia> {
        match self {
            Self::Media(media) => Some(media),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct BasicForm {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub summary: Option<String>,
    #[serde(default)]
    pub categories: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CleanBasic {
    pub name: String,
    pub slug: String,
    pub summary: String,
    pub categories: Vec<i64>,
}

impl BasicForm {
    pub fn clean(&self) -> Result<CleanBasic, FormErrors> {
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
        let categories = clean_categories(&mut errors, &self.categories);

        let cleaned = match (name, slug, summary, categories) {
            (Some(name), Some(slug), Some(summary), Some(categories)) => Some(CleanBasic {
                name,
                slug,
                summary,
                categories,
            }),
            _ => None,
        };
        finish(errors, cleaned)
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct DetailsForm {
    pub description: Option<String>,
    pub default_locale: Option<String>,
    pub homepage: Option<String>,
}

impl DetailsForm {
    fn clean(&self) -> Result<SectionEdit, FormErrors> {
        let mut errors = FormErrors::new();
        let description = clean_text(
            &mut errors,
            "description",
            self.description.as_deref(),
            false,
            None,
        );
        let default_locale = clean_text(
            &mut errors,
            "default_locale",
            self.default_locale.as_deref(),
            true,
            Some(10),
        )
        .flatten()
        .filter(|locale| {
            let valid = locale
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-');
            if !valid {
                push_error(&mut errors, "default_locale", "Select a valid locale.");
            }
            valid
        });
        let homepage = clean_url(&mut errors, "homepage", self.homepage.as_deref(), false);

        let cleaned = match (description, default_locale, homepage) {
            (Some(description), Some(default_locale), Some(homepage)) => {
                Some(SectionEdit::Details {
                    description,
                    default_locale,
                    homepage,
                })
            }
            _ => None,
        };
        finish(errors, cleaned)
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SupportForm {
    pub support_email: Option<String>,
    pub support_url: Option<String>,
}

impl SupportForm {
    fn clean(&self) -> Result<SectionEdit, FormErrors> {
        let mut errors = FormErrors::new();
        let support_email = clean_email(
            &mut errors,
            "support_email",
            self.support_email.as_deref(),
            false,
        );
        let support_url = clean_url(&mut errors, "support_url", self.support_url.as_deref(), false);

        let cleaned = match (support_email, support_url) {
            (Some(support_email), Some(support_url)) => Some(SectionEdit::Support {
                support_email,
                support_url,
            }),
            _ => None,
        };
        finish(errors, cleaned)
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct TechnicalForm {
    pub developer_comments: Option<String>,
    #[serde(default)]
    pub view_source: bool,
    #[serde(default)]
    pub binary: bool,
}

impl TechnicalForm {
    fn into_edit(self) -> SectionEdit {
        SectionEdit::Technical {
            developer_comments: self
                .developer_comments
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            view_source: self.view_source,
            binary: self.binary,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct AdminForm {
    pub addon_type: Option<AddonType>,
    pub status: Option<AddonStatus>,
}

impl AdminForm {
    fn clean(&self) -> Result<SectionEdit, FormErrors> {
        let mut errors = FormErrors::new();
        if self.addon_type.is_none() {
            push_error(&mut errors, "addon_type", REQUIRED);
        }
        if self.status.is_none() {
            push_error(&mut errors, "status", REQUIRED);
        }
        let cleaned = self
            .addon_type
            .zip(self.status)
            .map(|(addon_type, status)| SectionEdit::Admin { addon_type, status });
        finish(errors, cleaned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::ActiveValue;

    #[test]
    fn test_parse_section_names() {
        assert_eq!(SectionKind::parse("support"), Some(SectionKind::Support));
        assert_eq!(SectionKind::parse("Support"), None);
        assert!(SectionKind::Admin.spec().admin_only);
        assert_eq!(SectionKind::Media.spec().action, LogAction::ChangeIcon);
    }

    #[test]
    fn test_support_edit_only_sets_support_fields() {
        let edit = SectionKind::Support
            .clean(json!({
                "support_email": "help@example.org",
                "support_url": "",
                "name": "Renamed",
                "description": "Hijacked",
            }))
            .unwrap();

        let mut active = addon::ActiveModel::default();
        edit.apply(&mut active);

        assert_eq!(
            active.support_email,
            ActiveValue::Set(Some("help@example.org".to_string()))
        );
        assert_eq!(active.support_url, ActiveValue::Set(None));
        assert!(active.name.is_not_set());
        assert!(active.description.is_not_set());
        assert!(active.slug.is_not_set());
    }

    #[test]
    fn test_details_requires_locale_and_valid_homepage() {
        let errors = SectionKind::Details
            .clean(json!({"homepage": "ftp://example.org"}))
            .unwrap_err();
        assert!(errors.contains_key("default_locale"));
        assert!(errors.contains_key("homepage"));
    }

    #[test]
    fn test_malformed_body_is_a_form_error() {
        let errors = SectionKind::Basic
            .clean(json!({"categories": "not-a-list"}))
            .unwrap_err();
        assert!(errors.contains_key(NON_FIELD_ERRORS));
    }

    #[test]
    fn test_technical_blank_comments_clear_the_field() {
        let edit = SectionKind::Technical
            .clean(json!({"developer_comments": "   ", "view_source": true}))
            .unwrap();
        assert_eq!(
            edit,
            SectionEdit::Technical {
                developer_comments: None,
                view_source: true,
                binary: false,
            }
        );
    }
}
