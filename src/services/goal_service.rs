use chrono::{NaiveDate, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{
    resolve_achieved_at, resolve_status, Goal, GoalInput, GoalProgressInput, GoalQuery,
    GoalResponse, GoalStatus, MAX_ACTIVE_GOALS,
};
use crate::validation::invalid_field;

pub(crate) const GOAL_COLUMNS: &str = "id, user_id, title, description, target_value, \
     current_value, unit, deadline, status, achieved_at, created_at, updated_at";

#[derive(Clone)]
pub struct GoalService {
    db: PgPool,
}

impl GoalService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Active goals first, then by deadline.
    pub async fn list_goals(
        &self,
        user_id: Uuid,
        query: GoalQuery,
        today: NaiveDate,
    ) -> Result<Vec<GoalResponse>, ApiError> {
        let goals = sqlx::query_as::<_, Goal>(&format!(
            "SELECT {GOAL_COLUMNS} FROM goals
             WHERE user_id = $1 AND ($2::text IS NULL OR status = $2)
             ORDER BY (status = 'active') DESC, deadline ASC NULLS LAST, created_at DESC"
        ))
        .bind(user_id)
        .bind(query.status.map(|status| status.as_str()))
        .fetch_all(&self.db)
        .await?;

        Ok(goals
            .into_iter()
            .map(|goal| GoalResponse::new(goal, today))
            .collect())
    }

    pub async fn get_goal(&self, user_id: Uuid, goal_id: Uuid) -> Result<Goal, ApiError> {
        sqlx::query_as::<_, Goal>(&format!(
            "SELECT {GOAL_COLUMNS} FROM goals WHERE id = $1 AND user_id = $2"
        ))
        .bind(goal_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(ApiError::NotFound("Goal"))
    }

    /// Goals still active plus those achieved within `from..=to`.
    pub async fn goals_for_period(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Goal>, ApiError> {
        let goals = sqlx::query_as::<_, Goal>(&format!(
            "SELECT {GOAL_COLUMNS} FROM goals
             WHERE user_id = $1
               AND (status = 'active' OR (achieved_at IS NOT NULL AND achieved_at::date BETWEEN $2 AND $3))
             ORDER BY (status = 'active') DESC, title"
        ))
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.db)
        .await?;

        Ok(goals)
    }

    pub async fn create_goal(
        &self,
        user_id: Uuid,
        input: GoalInput,
        today: NaiveDate,
    ) -> Result<Goal, ApiError> {
        let input = input.validated(Some(today))?;
        let status = resolve_status(
            input.status.unwrap_or(GoalStatus::Active),
            input.current_value,
            input.target_value,
        );
        let now = Utc::now();

        let mut tx = self.db.begin().await?;
        lock_user(&mut tx, user_id).await?;
        if status == GoalStatus::Active {
            ensure_below_limit(&mut tx, user_id).await?;
        }

        let goal = sqlx::query_as::<_, Goal>(&format!(
            "INSERT INTO goals (
                id, user_id, title, description, target_value, current_value, unit, deadline,
                status, achieved_at, created_at, updated_at
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
             RETURNING {GOAL_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.target_value)
        .bind(input.current_value)
        .bind(&input.unit)
        .bind(input.deadline)
        .bind(status.as_str())
        .bind(resolve_achieved_at(status, None, now))
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(user_id = %user_id, goal_id = %goal.id, status = status.as_str(), "Goal created");
        Ok(goal)
    }

    pub async fn update_goal(
        &self,
        user_id: Uuid,
        goal_id: Uuid,
        input: GoalInput,
    ) -> Result<Goal, ApiError> {
        let input = input.validated(None)?;

        let mut tx = self.db.begin().await?;
        lock_user(&mut tx, user_id).await?;
        let existing = fetch_for_update(&mut tx, user_id, goal_id).await?;

        let status = resolve_status(
            input.status.unwrap_or(existing.status),
            input.current_value,
            input.target_value,
        );
        if status == GoalStatus::Active && existing.status != GoalStatus::Active {
            ensure_below_limit(&mut tx, user_id).await?;
        }
        let now = Utc::now();

        let goal = sqlx::query_as::<_, Goal>(&format!(
            "UPDATE goals SET
                title = $3, description = $4, target_value = $5, current_value = $6, unit = $7,
                deadline = $8, status = $9, achieved_at = $10, updated_at = $11
             WHERE id = $1 AND user_id = $2
             RETURNING {GOAL_COLUMNS}"
        ))
        .bind(goal_id)
        .bind(user_id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.target_value)
        .bind(input.current_value)
        .bind(&input.unit)
        .bind(input.deadline)
        .bind(status.as_str())
        .bind(resolve_achieved_at(status, existing.achieved_at, now))
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(goal)
    }

    /// Record a new current value; reaching the target achieves the goal.
    pub async fn update_progress(
        &self,
        user_id: Uuid,
        goal_id: Uuid,
        input: GoalProgressInput,
    ) -> Result<Goal, ApiError> {
        if !input.current_value.is_finite() || input.current_value < 0.0 {
            return Err(invalid_field("current_value", "range", "must be 0 or greater").into());
        }

        let mut tx = self.db.begin().await?;
        let existing = fetch_for_update(&mut tx, user_id, goal_id).await?;

        let status = resolve_status(existing.status, Some(input.current_value), existing.target_value);
        let now = Utc::now();

        let goal = sqlx::query_as::<_, Goal>(&format!(
            "UPDATE goals SET current_value = $3, status = $4, achieved_at = $5, updated_at = $6
             WHERE id = $1 AND user_id = $2
             RETURNING {GOAL_COLUMNS}"
        ))
        .bind(goal_id)
        .bind(user_id)
        .bind(input.current_value)
        .bind(status.as_str())
        .bind(resolve_achieved_at(status, existing.achieved_at, now))
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        if status != existing.status {
            info!(user_id = %user_id, goal_id = %goal_id, "Goal achieved");
        }
        Ok(goal)
    }

    pub async fn delete_goal(&self, user_id: Uuid, goal_id: Uuid) -> Result<(), ApiError> {
        let deleted = sqlx::query("DELETE FROM goals WHERE id = $1 AND user_id = $2")
            .bind(goal_id)
            .bind(user_id)
            .execute(&self.db)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(ApiError::NotFound("Goal"));
        }
        Ok(())
    }
}

/// Serializes goal writes of one user, so the active-goal count cannot race.
async fn lock_user(tx: &mut Transaction<'_, Postgres>, user_id: Uuid) -> Result<(), ApiError> {
    sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    Ok(())
}

async fn ensure_below_limit(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
) -> Result<(), ApiError> {
    let active: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM goals WHERE user_id = $1 AND status = 'active'")
            .bind(user_id)
            .fetch_one(&mut **tx)
            .await?;

    if active >= MAX_ACTIVE_GOALS {
        return Err(ApiError::GoalLimitReached(MAX_ACTIVE_GOALS));
    }
    Ok(())
}

async fn fetch_for_update(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    goal_id: Uuid,
) -> Result<Goal, ApiError> {
    sqlx::query_as::<_, Goal>(&format!(
        "SELECT {GOAL_COLUMNS} FROM goals WHERE id = $1 AND user_id = $2 FOR UPDATE"
    ))
    .bind(goal_id)
    .bind(user_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(ApiError::NotFound("Goal"))
}
