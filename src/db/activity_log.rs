//! Developer activity log.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use serde_json::Value as JsonValue;

use crate::entity::activity_log::{self, Entity as ActivityLog};
use crate::error::{AppError, AppResult};
use crate::models::LogAction;

use super::DbPool;

/// Record an action on `conn`, usually inside the transaction making the change.
pub async fn log_activity_in<C: ConnectionTrait>(
    conn: &C,
    action: LogAction,
    addon_id: Option<i64>,
    user_id: Option<i64>,
    details: Option<JsonValue>,
) -> Result<activity_log::Model, DbErr> {
    activity_log::ActiveModel {
        addon_id: Set(addon_id),
        user_id: Set(user_id),
        action: Set(action.id()),
        details: Set(details),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(conn)
    .await
}

impl DbPool {
    /// Activity recorded for an add-on, oldest first.
    pub async fn get_activity_for_addon(&self, addon_id: i64) -> AppResult<Vec<activity_log::Model>> {
        ActivityLog::find()
            .filter(activity_log::Column::AddonId.eq(addon_id))
            .order_by_asc(activity_log::Column::Id)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get activity log: {}", e)))
    }
}
