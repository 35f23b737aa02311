use chrono::{Datelike, NaiveDate};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{
    compute_streaks, month_bounds, week_bounds, Dashboard, Goal, GoalResponse, PeriodStats,
    PeriodTotals, PersonalRecord, Training, TypeDistribution,
};
use crate::services::goal_service::GOAL_COLUMNS;
use crate::services::personal_record_service::RECORD_COLUMNS;
use crate::services::training_service::TRAINING_COLUMNS;
use crate::validation::{invalid_field, query_date};

const RECENT_ITEMS: i64 = 5;

#[derive(Clone)]
pub struct DashboardService {
    db: PgPool,
}

impl DashboardService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    #[tracing::instrument(skip(self))]
    pub async fn dashboard(&self, user_id: Uuid, today: NaiveDate) -> Result<Dashboard, ApiError> {
        let today = query_date("today", today)?;
        let (week_start, week_end) = week_bounds(today)
            .ok_or_else(|| invalid_field("today", "date_range", "week is out of range"))?;
        let (month_start, month_end) = month_bounds(today.year(), today.month())
            .ok_or_else(|| invalid_field("today", "date_range", "month is out of range"))?;

        let week = PeriodStats {
            from: week_start,
            to: week_end,
            totals: self.period_totals(user_id, week_start, week_end).await?,
        };
        let month = PeriodStats {
            from: month_start,
            to: month_end,
            totals: self.period_totals(user_id, month_start, month_end).await?,
        };

        let total_trainings: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM trainings WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.db)
                .await?;

        let training_days: Vec<NaiveDate> = sqlx::query_scalar(
            "SELECT DISTINCT date FROM trainings WHERE user_id = $1 ORDER BY date",
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        let month_by_type = self.type_distribution(user_id, month_start, month_end).await?;

        let active_goals = sqlx::query_as::<_, Goal>(&format!(
            "SELECT {GOAL_COLUMNS} FROM goals
             WHERE user_id = $1 AND status = 'active'
             ORDER BY deadline ASC NULLS LAST, created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await?
        .into_iter()
        .map(|goal| GoalResponse::new(goal, today))
        .collect();

        let recent_trainings = sqlx::query_as::<_, Training>(&format!(
            "SELECT {TRAINING_COLUMNS}
             FROM trainings t JOIN training_types tt ON tt.id = t.training_type_id
             WHERE t.user_id = $1
             ORDER BY t.date DESC, t.created_at DESC
             LIMIT $2"
        ))
        .bind(user_id)
        .bind(RECENT_ITEMS)
        .fetch_all(&self.db)
        .await?;

        let recent_personal_records = sqlx::query_as::<_, PersonalRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM personal_records
             WHERE user_id = $1
             ORDER BY date DESC, created_at DESC
             LIMIT $2"
        ))
        .bind(user_id)
        .bind(RECENT_ITEMS)
        .fetch_all(&self.db)
        .await?;

        Ok(Dashboard {
            today,
            week,
            month,
            total_trainings,
            streaks: compute_streaks(&training_days, today),
            month_by_type,
            active_goals,
            recent_trainings,
            recent_personal_records,
        })
    }

    pub async fn period_totals(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<PeriodTotals, ApiError> {
        let totals = sqlx::query_as::<_, PeriodTotals>(
            "SELECT COUNT(*) AS trainings,
                    COALESCE(SUM(duration_minutes), 0)::BIGINT AS total_minutes,
                    AVG(rating)::FLOAT8 AS average_rating,
                    AVG(intensity)::FLOAT8 AS average_intensity
             FROM trainings
             WHERE user_id = $1 AND date BETWEEN $2 AND $3",
        )
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_one(&self.db)
        .await?;

        Ok(totals)
    }

    pub async fn type_distribution(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<TypeDistribution>, ApiError> {
        let distribution = sqlx::query_as::<_, TypeDistribution>(
            "SELECT t.training_type_id,
                    tt.name AS training_type_name,
                    COUNT(*) AS trainings,
                    COALESCE(SUM(t.duration_minutes), 0)::BIGINT AS total_minutes
             FROM trainings t JOIN training_types tt ON tt.id = t.training_type_id
             WHERE t.user_id = $1 AND t.date BETWEEN $2 AND $3
             GROUP BY t.training_type_id, tt.name
             ORDER BY trainings DESC, tt.name",
        )
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.db)
        .await?;

        Ok(distribution)
    }
}
