//! Who may act on an add-on's developer pages.

use crate::db::DbPool;
use crate::entity::addon;
use crate::error::{AppError, AppResult};
use crate::models::{AddonStatus, AuthenticatedUser, AuthorRole};

/// Per-page access rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddonAccess {
    /// Writes require the owner role instead of developer.
    pub owner_for_post: bool,
    /// Editors may use the page without being an author.
    pub allow_editors: bool,
}

impl AddonAccess {
    pub const AUTHORS: AddonAccess = AddonAccess {
        owner_for_post: false,
        allow_editors: false,
    };

    pub const OWNERS: AddonAccess = AddonAccess {
        owner_for_post: true,
        allow_editors: false,
    };

    pub const AUTHORS_AND_EDITORS: AddonAccess = AddonAccess {
        owner_for_post: false,
        allow_editors: true,
    };
}

/// Decide on a request given the caller's author role.
///
/// Authors keep read access to add-ons disabled by an administrator; writes
/// to them are refused.
pub fn check_access(
    addon: &addon::Model,
    user: &AuthenticatedUser,
    role: Option<AuthorRole>,
    is_write: bool,
    access: AddonAccess,
) -> AppResult<()> {
    if user.is_admin() || (access.allow_editors && user.is_editor()) {
        return Ok(());
    }

    if !is_write {
        return match role {
            Some(_) => Ok(()),
            None => Err(AppError::Forbidden(
                "You are not an author of this add-on".to_string(),
            )),
        };
    }

    if AddonStatus::from_i32(addon.status) == Some(AddonStatus::Disabled) {
        return Err(AppError::Forbidden(
            "This add-on has been disabled by an administrator".to_string(),
        ));
    }

    let needed = if access.owner_for_post {
        AuthorRole::Owner
    } else {
        AuthorRole::Developer
    };
    if role.is_some_and(|r| r >= needed) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You are not allowed to manage this add-on".to_string(),
        ))
    }
}

/// Load an add-on by slug and check the caller may use the page.
pub async fn authorize_addon(
    pool: &DbPool,
    user: &AuthenticatedUser,
    slug: &str,
    is_write: bool,
    access: AddonAccess,
) -> AppResult<addon::Model> {
    let addon = pool
        .get_addon_by_slug(slug)
        .await?
        .filter(|a| AddonStatus::from_i32(a.status) != Some(AddonStatus::Deleted))
        .ok_or_else(|| AppError::NotFound(format!("Add-on {}", slug)))?;

    let role = if user.is_admin() {
        None
    } else {
        pool.get_author_role(addon.id, user.id).await?
    };

    check_access(&addon, user, role, is_write, access)?;
    Ok(addon)
}
