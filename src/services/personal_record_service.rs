use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{
    ActivitySummary, MediaEntity, PersonalRecord, PersonalRecordDetail, PersonalRecordInput,
    PersonalRecordQuery,
};
use crate::services::media_service::attachments_for;
use crate::services::MediaService;

pub(crate) const RECORD_COLUMNS: &str =
    "id, user_id, activity_name, result_value, unit, date, notes, created_at, updated_at";

#[derive(Clone)]
pub struct PersonalRecordService {
    db: PgPool,
    media: MediaService,
}

impl PersonalRecordService {
    pub fn new(db: PgPool, media: MediaService) -> Self {
        Self { db, media }
    }

    pub async fn list_records(
        &self,
        user_id: Uuid,
        query: PersonalRecordQuery,
    ) -> Result<Vec<PersonalRecord>, ApiError> {
        let activity = query
            .activity
            .map(|activity| activity.trim().to_string())
            .filter(|activity| !activity.is_empty());

        let records = sqlx::query_as::<_, PersonalRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM personal_records
             WHERE user_id = $1 AND ($2::text IS NULL OR LOWER(activity_name) = LOWER($2))
             ORDER BY date DESC, created_at DESC"
        ))
        .bind(user_id)
        .bind(activity)
        .fetch_all(&self.db)
        .await?;

        Ok(records)
    }

    pub async fn list_activities(&self, user_id: Uuid) -> Result<Vec<ActivitySummary>, ApiError> {
        let activities = sqlx::query_as::<_, ActivitySummary>(
            "SELECT activity_name,
                    COUNT(*) AS records,
                    MAX(result_value) AS max_value,
                    MIN(result_value) AS min_value,
                    MAX(date) AS last_date
             FROM personal_records
             WHERE user_id = $1
             GROUP BY activity_name
             ORDER BY LOWER(activity_name)",
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(activities)
    }

    /// Records dated within `from..=to`, oldest first.
    pub async fn records_between(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PersonalRecord>, ApiError> {
        let records = sqlx::query_as::<_, PersonalRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM personal_records
             WHERE user_id = $1 AND date BETWEEN $2 AND $3
             ORDER BY date, created_at"
        ))
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.db)
        .await?;

        Ok(records)
    }

    pub async fn get_record(&self, user_id: Uuid, record_id: Uuid) -> Result<PersonalRecord, ApiError> {
        sqlx::query_as::<_, PersonalRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM personal_records WHERE id = $1 AND user_id = $2"
        ))
        .bind(record_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(ApiError::NotFound("Personal record"))
    }

    pub async fn get_record_detail(
        &self,
        user_id: Uuid,
        record_id: Uuid,
    ) -> Result<PersonalRecordDetail, ApiError> {
        let record = self.get_record(user_id, record_id).await?;
        let media = attachments_for(&self.db, MediaEntity::PersonalRecord, record.id).await?;

        Ok(PersonalRecordDetail { record, media })
    }

    pub async fn create_record(
        &self,
        user_id: Uuid,
        input: PersonalRecordInput,
        today: NaiveDate,
    ) -> Result<PersonalRecord, ApiError> {
        let input = input.validated(today)?;

        let record = sqlx::query_as::<_, PersonalRecord>(&format!(
            "INSERT INTO personal_records
                (id, user_id, activity_name, result_value, unit, date, notes, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
             RETURNING {RECORD_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&input.activity_name)
        .bind(input.result_value)
        .bind(&input.unit)
        .bind(input.date)
        .bind(&input.notes)
        .bind(Utc::now())
        .fetch_one(&self.db)
        .await?;

        info!(user_id = %user_id, record_id = %record.id, "Personal record created");
        Ok(record)
    }

    pub async fn update_record(
        &self,
        user_id: Uuid,
        record_id: Uuid,
        input: PersonalRecordInput,
        today: NaiveDate,
    ) -> Result<PersonalRecord, ApiError> {
        let input = input.validated(today)?;

        sqlx::query_as::<_, PersonalRecord>(&format!(
            "UPDATE personal_records SET
                activity_name = $3, result_value = $4, unit = $5, date = $6, notes = $7,
                updated_at = $8
             WHERE id = $1 AND user_id = $2
             RETURNING {RECORD_COLUMNS}"
        ))
        .bind(record_id)
        .bind(user_id)
        .bind(&input.activity_name)
        .bind(input.result_value)
        .bind(&input.unit)
        .bind(input.date)
        .bind(&input.notes)
        .bind(Utc::now())
        .fetch_optional(&self.db)
        .await?
        .ok_or(ApiError::NotFound("Personal record"))
    }

    /// Files go first; the row delete then cascades to the attachment rows.
    pub async fn delete_record(&self, user_id: Uuid, record_id: Uuid) -> Result<(), ApiError> {
        self.get_record(user_id, record_id).await?;
        self.media
            .delete_files_for(MediaEntity::PersonalRecord, record_id)
            .await?;

        sqlx::query("DELETE FROM personal_records WHERE id = $1 AND user_id = $2")
            .bind(record_id)
            .bind(user_id)
            .execute(&self.db)
            .await?;

        info!(user_id = %user_id, record_id = %record_id, "Personal record deleted");
        Ok(())
    }
}
