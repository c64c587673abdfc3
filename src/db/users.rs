//! Database operations for users and their roles on add-ons.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

use crate::entity::addon_user::{self, Entity as AddonUser};
use crate::entity::user::{self, Entity as User};
use crate::error::{AppError, AppResult};
use crate::models::{AuthenticatedUser, AuthorRole, UserRole};

use super::DbPool;

impl DbPool {
    /// Resolve the user named by the authentication header.
    pub async fn get_authenticated_user(&self, id: i64) -> AppResult<Option<AuthenticatedUser>> {
        let found = User::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get user: {}", e)))?;

        Ok(found.map(|m| AuthenticatedUser {
            id: m.id,
            username: m.username,
            role: UserRole::parse(&m.role).unwrap_or(UserRole::Developer),
        }))
    }

    /// Create a user account.
    pub async fn insert_user(
        &self,
        username: &str,
        email: Option<&str>,
        role: UserRole,
    ) -> AppResult<user::Model> {
        let model = user::ActiveModel {
            username: Set(username.to_string()),
            email: Set(email.map(|s| s.to_string())),
            role: Set(role.as_str().to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        model
            .insert(self.writer()?)
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert user: {}", e)))
    }

    /// Role of `user_id` on an add-on, `None` when not an author.
    pub async fn get_author_role(&self, addon_id: i64, user_id: i64) -> AppResult<Option<AuthorRole>> {
        let found = AddonUser::find()
            .filter(addon_user::Column::AddonId.eq(addon_id))
            .filter(addon_user::Column::UserId.eq(user_id))
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get author role: {}", e)))?;

        Ok(found.and_then(|m| AuthorRole::from_i32(m.role)))
    }

    /// Add `user_id` as an author of an add-on.
    pub async fn insert_author(
        &self,
        addon_id: i64,
        user_id: i64,
        role: AuthorRole,
    ) -> AppResult<addon_user::Model> {
        let model = addon_user::ActiveModel {
            addon_id: Set(addon_id),
            user_id: Set(user_id),
            role: Set(role.as_i32()),
            position: Set(0),
            listed: Set(true),
            ..Default::default()
        };

        model
            .insert(self.writer()?)
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert author: {}", e)))
    }
}
