//! Persisted position of unfinished submissions.
//!
//! A row exists from the upload step until the review type is chosen. The
//! stored value only moves forward, except through the admin override.

use std::collections::HashMap;

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};

use crate::entity::submit_step::{self, Entity as SubmitStep};
use crate::error::{AppError, AppResult};

use super::DbPool;

/// Start tracking a new submission at `step`.
pub async fn create_submit_step_in<C: ConnectionTrait>(
    conn: &C,
    addon_id: i64,
    step: i32,
) -> Result<(), DbErr> {
    submit_step::ActiveModel {
        addon_id: Set(addon_id),
        step: Set(step),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    Ok(())
}

/// Move the stored step to `to` only when it is currently lower.
/// Returns whether a row changed.
pub async fn advance_submit_step_in<C: ConnectionTrait>(
    conn: &C,
    addon_id: i64,
    to: i32,
) -> Result<bool, DbErr> {
    let result = SubmitStep::update_many()
        .col_expr(submit_step::Column::Step, Expr::value(to))
        .filter(submit_step::Column::AddonId.eq(addon_id))
        .filter(submit_step::Column::Step.lt(to))
        .exec(conn)
        .await?;
    Ok(result.rows_affected > 0)
}

/// Stop tracking: the submission graduated.
pub async fn delete_submit_step_in<C: ConnectionTrait>(conn: &C, addon_id: i64) -> Result<(), DbErr> {
    SubmitStep::delete_many()
        .filter(submit_step::Column::AddonId.eq(addon_id))
        .exec(conn)
        .await?;
    Ok(())
}

impl DbPool {
    /// Stored wizard step of an add-on, `None` when its submission is finished.
    pub async fn get_submit_step(&self, addon_id: i64) -> AppResult<Option<i32>> {
        let found = SubmitStep::find()
            .filter(submit_step::Column::AddonId.eq(addon_id))
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get submit step: {}", e)))?;

        Ok(found.map(|m| m.step))
    }

    /// Stored steps for several add-ons at once.
    pub async fn get_submit_steps(&self, addon_ids: &[i64]) -> AppResult<HashMap<i64, i32>> {
        if addon_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = SubmitStep::find()
            .filter(submit_step::Column::AddonId.is_in(addon_ids.to_vec()))
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get submit steps: {}", e)))?;

        Ok(rows.into_iter().map(|m| (m.addon_id, m.step)).collect())
    }

    /// Number of submissions that have not reached the final step.
    pub async fn count_unfinished_submissions(&self) -> AppResult<u64> {
        SubmitStep::find()
            .count(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to count submit steps: {}", e)))
    }

    /// Conditional advance used after a wizard step succeeds.
    pub async fn advance_submit_step(&self, addon_id: i64, to: i32) -> AppResult<bool> {
        advance_submit_step_in(self.writer()?, addon_id, to)
            .await
            .map_err(|e| AppError::Database(format!("Failed to advance submit step: {}", e)))
    }

    /// Admin override: set the stored step, creating the row when missing.
    pub async fn set_submit_step(&self, addon_id: i64, step: i32) -> AppResult<()> {
        let conn = self.writer()?;

        let existing = SubmitStep::find()
            .filter(submit_step::Column::AddonId.eq(addon_id))
            .one(conn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to get submit step: {}", e)))?;

        let result = match existing {
            Some(model) => {
                let mut active: submit_step::ActiveModel = model.into();
                active.step = Set(step);
                active.update(conn).await.map(|_| ())
            }
            None => create_submit_step_in(conn, addon_id, step).await,
        };

        result.map_err(|e| AppError::Database(format!("Failed to set submit step: {}", e)))
    }
}
