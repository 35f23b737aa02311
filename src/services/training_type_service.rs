use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::error::{is_foreign_key_violation, is_unique_violation, ApiError};
use crate::models::{TrainingType, TrainingTypeInput};

const TYPE_COLUMNS: &str = "id, user_id, name, description, icon, is_default, created_at";

#[derive(Clone)]
pub struct TrainingTypeService {
    db: PgPool,
}

impl TrainingTypeService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Defaults first, then the user's own types, each group by name.
    pub async fn list_types(&self, user_id: Uuid) -> Result<Vec<TrainingType>, ApiError> {
        let types = sqlx::query_as::<_, TrainingType>(&format!(
            "SELECT {TYPE_COLUMNS} FROM training_types
             WHERE user_id IS NULL OR user_id = $1
             ORDER BY is_default DESC, LOWER(name)"
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(types)
    }

    /// A default type or one owned by the user.
    pub async fn get_type(&self, user_id: Uuid, type_id: Uuid) -> Result<TrainingType, ApiError> {
        sqlx::query_as::<_, TrainingType>(&format!(
            "SELECT {TYPE_COLUMNS} FROM training_types
             WHERE id = $1 AND (user_id IS NULL OR user_id = $2)"
        ))
        .bind(type_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(ApiError::NotFound("Training type"))
    }

    pub async fn create_type(
        &self,
        user_id: Uuid,
        input: TrainingTypeInput,
    ) -> Result<TrainingType, ApiError> {
        let input = input.validated()?;
        self.ensure_unique_name(user_id, &input.name, None).await?;

        let created = sqlx::query_as::<_, TrainingType>(&format!(
            "INSERT INTO training_types (id, user_id, name, description, icon, is_default)
             VALUES ($1, $2, $3, $4, $5, FALSE)
             RETURNING {TYPE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.icon)
        .fetch_one(&self.db)
        .await
        .map_err(unique_to_duplicate)?;

        info!(user_id = %user_id, type_id = %created.id, "Training type created");
        Ok(created)
    }

    pub async fn update_type(
        &self,
        user_id: Uuid,
        type_id: Uuid,
        input: TrainingTypeInput,
    ) -> Result<TrainingType, ApiError> {
        self.get_editable(user_id, type_id).await?;
        let input = input.validated()?;
        self.ensure_unique_name(user_id, &input.name, Some(type_id)).await?;

        let updated = sqlx::query_as::<_, TrainingType>(&format!(
            "UPDATE training_types SET name = $3, description = $4, icon = $5
             WHERE id = $1 AND user_id = $2
             RETURNING {TYPE_COLUMNS}"
        ))
        .bind(type_id)
        .bind(user_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.icon)
        .fetch_optional(&self.db)
        .await
        .map_err(unique_to_duplicate)?
        .ok_or(ApiError::NotFound("Training type"))?;

        Ok(updated)
    }

    pub async fn delete_type(&self, user_id: Uuid, type_id: Uuid) -> Result<(), ApiError> {
        self.get_editable(user_id, type_id).await?;

        let in_use: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM trainings WHERE training_type_id = $1)",
        )
        .bind(type_id)
        .fetch_one(&self.db)
        .await?;
        if in_use {
            return Err(ApiError::TypeInUse);
        }

        // A training may be logged between the check and the delete; the FK catches it.
        sqlx::query("DELETE FROM training_types WHERE id = $1 AND user_id = $2")
            .bind(type_id)
            .bind(user_id)
            .execute(&self.db)
            .await
            .map_err(|err| {
                if is_foreign_key_violation(&err) {
                    ApiError::TypeInUse
                } else {
                    ApiError::Database(err)
                }
            })?;

        info!(user_id = %user_id, type_id = %type_id, "Training type deleted");
        Ok(())
    }

    async fn get_editable(&self, user_id: Uuid, type_id: Uuid) -> Result<TrainingType, ApiError> {
        let training_type = self.get_type(user_id, type_id).await?;
        if training_type.is_default {
            return Err(ApiError::DefaultTypeProtected);
        }
        Ok(training_type)
    }

    /// Names are unique per user, case-insensitively, including the defaults.
    async fn ensure_unique_name(
        &self,
        user_id: Uuid,
        name: &str,
        except: Option<Uuid>,
    ) -> Result<(), ApiError> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (
                SELECT 1 FROM training_types
                WHERE (user_id IS NULL OR user_id = $1)
                  AND LOWER(name) = LOWER($2)
                  AND ($3::uuid IS NULL OR id <> $3)
             )",
        )
        .bind(user_id)
        .bind(name)
        .bind(except)
        .fetch_one(&self.db)
        .await?;

        if taken {
            Err(ApiError::DuplicateName)
        } else {
            Ok(())
        }
    }
}

fn unique_to_duplicate(err: sqlx::Error) -> ApiError {
    if is_unique_violation(&err) {
        ApiError::DuplicateName
    } else {
        ApiError::Database(err)
    }
}
