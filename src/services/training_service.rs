use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{
    MediaEntity, Training, TrainingDetail, TrainingInput, TrainingList, TrainingQuery,
};
use crate::services::media_service::attachments_for;
use crate::services::MediaService;
use crate::validation::{invalid_field, page_bounds, query_date};

/// Training columns with the type name; expects `t` and `tt` aliases.
pub(crate) const TRAINING_COLUMNS: &str = "t.id, t.user_id, t.training_type_id, \
     tt.name AS training_type_name, t.date, t.duration_minutes, t.intensity, t.rating, \
     t.energy_level, t.calories, t.distance_km, t.notes, t.what_went_well, t.what_to_improve, \
     t.created_at, t.updated_at";

#[derive(Clone)]
pub struct TrainingService {
    db: PgPool,
    media: MediaService,
}

impl TrainingService {
    pub fn new(db: PgPool, media: MediaService) -> Self {
        Self { db, media }
    }

    pub async fn list_trainings(
        &self,
        user_id: Uuid,
        query: TrainingQuery,
    ) -> Result<TrainingList, ApiError> {
        let from = query.from.map(|from| query_date("from", from)).transpose()?;
        let to = query.to.map(|to| query_date("to", to)).transpose()?;
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(invalid_field("from", "date_order", "must not be after 'to'").into());
            }
        }
        let (limit, offset) = page_bounds(query.limit, query.offset);

        let filter = "t.user_id = $1
             AND ($2::date IS NULL OR t.date >= $2)
             AND ($3::date IS NULL OR t.date <= $3)
             AND ($4::uuid IS NULL OR t.training_type_id = $4)";

        let items = sqlx::query_as::<_, Training>(&format!(
            "SELECT {TRAINING_COLUMNS}
             FROM trainings t JOIN training_types tt ON tt.id = t.training_type_id
             WHERE {filter}
             ORDER BY t.date DESC, t.created_at DESC
             LIMIT $5 OFFSET $6"
        ))
        .bind(user_id)
        .bind(from)
        .bind(to)
        .bind(query.type_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM trainings t WHERE {filter}"))
                .bind(user_id)
                .bind(from)
                .bind(to)
                .bind(query.type_id)
                .fetch_one(&self.db)
                .await?;

        Ok(TrainingList {
            items,
            total,
            limit,
            offset,
        })
    }

    /// Trainings in `from..=to`, oldest first.
    pub async fn trainings_between(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Training>, ApiError> {
        let trainings = sqlx::query_as::<_, Training>(&format!(
            "SELECT {TRAINING_COLUMNS}
             FROM trainings t JOIN training_types tt ON tt.id = t.training_type_id
             WHERE t.user_id = $1 AND t.date BETWEEN $2 AND $3
             ORDER BY t.date, t.created_at"
        ))
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.db)
        .await?;

        Ok(trainings)
    }

    pub async fn get_training(&self, user_id: Uuid, training_id: Uuid) -> Result<Training, ApiError> {
        sqlx::query_as::<_, Training>(&format!(
            "SELECT {TRAINING_COLUMNS}
             FROM trainings t JOIN training_types tt ON tt.id = t.training_type_id
             WHERE t.id = $1 AND t.user_id = $2"
        ))
        .bind(training_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(ApiError::NotFound("Training"))
    }

    pub async fn get_training_detail(
        &self,
        user_id: Uuid,
        training_id: Uuid,
    ) -> Result<TrainingDetail, ApiError> {
        let training = self.get_training(user_id, training_id).await?;
        let media = attachments_for(&self.db, MediaEntity::Training, training.id).await?;

        Ok(TrainingDetail { training, media })
    }

    pub async fn create_training(
        &self,
        user_id: Uuid,
        input: TrainingInput,
        today: NaiveDate,
    ) -> Result<Training, ApiError> {
        let input = input.validated(today)?;
        self.ensure_type_accessible(user_id, input.training_type_id).await?;

        let training = sqlx::query_as::<_, Training>(&format!(
            "WITH t AS (
                INSERT INTO trainings (
                    id, user_id, training_type_id, date, duration_minutes, intensity, rating,
                    energy_level, calories, distance_km, notes, what_went_well, what_to_improve,
                    created_at, updated_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $14)
                RETURNING *
             )
             SELECT {TRAINING_COLUMNS} FROM t JOIN training_types tt ON tt.id = t.training_type_id"
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(input.training_type_id)
        .bind(input.date)
        .bind(input.duration_minutes)
        .bind(input.intensity)
        .bind(input.rating)
        .bind(input.energy_level)
        .bind(input.calories)
        .bind(input.distance_km)
        .bind(&input.notes)
        .bind(&input.what_went_well)
        .bind(&input.what_to_improve)
        .bind(Utc::now())
        .fetch_one(&self.db)
        .await?;

        info!(user_id = %user_id, training_id = %training.id, "Training created");
        Ok(training)
    }

    /// Full replacement of a training's fields.
    pub async fn update_training(
        &self,
        user_id: Uuid,
        training_id: Uuid,
        input: TrainingInput,
        today: NaiveDate,
    ) -> Result<Training, ApiError> {
        self.get_training(user_id, training_id).await?;
        let input = input.validated(today)?;
        self.ensure_type_accessible(user_id, input.training_type_id).await?;

        sqlx::query_as::<_, Training>(&format!(
            "WITH t AS (
                UPDATE trainings SET
                    training_type_id = $3, date = $4, duration_minutes = $5, intensity = $6,
                    rating = $7, energy_level = $8, calories = $9, distance_km = $10,
                    notes = $11, what_went_well = $12, what_to_improve = $13, updated_at = $14
                WHERE id = $1 AND user_id = $2
                RETURNING *
             )
             SELECT {TRAINING_COLUMNS} FROM t JOIN training_types tt ON tt.id = t.training_type_id"
        ))
        .bind(training_id)
        .bind(user_id)
        .bind(input.training_type_id)
        .bind(input.date)
        .bind(input.duration_minutes)
        .bind(input.intensity)
        .bind(input.rating)
        .bind(input.energy_level)
        .bind(input.calories)
        .bind(input.distance_km)
        .bind(&input.notes)
        .bind(&input.what_went_well)
        .bind(&input.what_to_improve)
        .bind(Utc::now())
        .fetch_optional(&self.db)
        .await?
        .ok_or(ApiError::NotFound("Training"))
    }

    /// Files go first; the row delete then cascades to the attachment rows.
    pub async fn delete_training(&self, user_id: Uuid, training_id: Uuid) -> Result<(), ApiError> {
        self.get_training(user_id, training_id).await?;
        self.media
            .delete_files_for(MediaEntity::Training, training_id)
            .await?;

        sqlx::query("DELETE FROM trainings WHERE id = $1 AND user_id = $2")
            .bind(training_id)
            .bind(user_id)
            .execute(&self.db)
            .await?;

        info!(user_id = %user_id, training_id = %training_id, "Training deleted");
        Ok(())
    }

    async fn ensure_type_accessible(&self, user_id: Uuid, type_id: Uuid) -> Result<(), ApiError> {
        let accessible: bool = sqlx::query_scalar(
            "SELECT EXISTS (
                SELECT 1 FROM training_types WHERE id = $1 AND (user_id IS NULL OR user_id = $2)
             )",
        )
        .bind(type_id)
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        if accessible {
            Ok(())
        } else {
            Err(invalid_field("training_type_id", "unknown_type", "unknown training type").into())
        }
    }
}
