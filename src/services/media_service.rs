use bytes::Bytes;
use sqlx::{PgPool, Postgres, Transaction};
use tokio::fs::File;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::error::ApiError;
use crate::models::{MediaAttachment, MediaEntity, MediaQuery, NewMedia};
use crate::storage::media_type::{content_matches, lookup, MediaKind};
use crate::storage::{key_owner, validate_key, FileStorage};

pub(crate) const MEDIA_COLUMNS: &str = "id, user_id, training_id, personal_record_id, file_name, \
     storage_key, mime_type, size_bytes, '/api/files/' || storage_key AS url, created_at";

/// A stored file ready to be streamed back to its owner.
pub struct StoredFile {
    pub file: File,
    pub len: u64,
    pub attachment: MediaAttachment,
}

#[derive(Clone)]
pub struct MediaService {
    db: PgPool,
    storage: FileStorage,
    config: StorageConfig,
}

impl MediaService {
    pub fn new(db: PgPool, storage: FileStorage, config: StorageConfig) -> Self {
        Self {
            db,
            storage,
            config,
        }
    }

    pub fn max_attachments(&self, entity: MediaEntity) -> i64 {
        match entity {
            MediaEntity::Training => self.config.max_media_per_training,
            MediaEntity::PersonalRecord => self.config.max_media_per_personal_record,
        }
    }

    /// Type, size and content checks that need no database access.
    pub fn check_upload(&self, declared_mime: &str, data: &[u8]) -> Result<&'static str, ApiError> {
        let media_type = lookup(declared_mime)
            .ok_or_else(|| ApiError::UnsupportedMediaType(declared_mime.to_string()))?;

        let limit = match media_type.kind {
            MediaKind::Image => self.config.max_image_bytes,
            MediaKind::Video => self.config.max_video_bytes,
        };
        if data.len() as u64 > limit {
            return Err(ApiError::FileTooLarge { limit });
        }
        if data.is_empty() {
            return Err(ApiError::BadRequest("File is empty".to_string()));
        }
        if !content_matches(media_type, data) {
            return Err(ApiError::UnsupportedMediaType(format!(
                "file content does not match {}",
                media_type.mime
            )));
        }

        Ok(media_type.extension)
    }

    /// Store an upload and attach it to an entity owned by the user.
    pub async fn upload(
        &self,
        user_id: Uuid,
        upload: NewMedia,
        data: Bytes,
    ) -> Result<MediaAttachment, ApiError> {
        let extension = self.check_upload(&upload.mime_type, &data)?;
        let mime_type = lookup(&upload.mime_type)
            .map(|media_type| media_type.mime)
            .unwrap_or_default();

        let mut tx = self.db.begin().await?;
        lock_owned_entity(&mut tx, user_id, upload.entity, upload.entity_id).await?;

        let limit = self.max_attachments(upload.entity);
        let attached: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM media_attachments WHERE {} = $1",
            upload.entity.column()
        ))
        .bind(upload.entity_id)
        .fetch_one(&mut *tx)
        .await?;
        if attached >= limit {
            return Err(ApiError::MediaLimitReached(limit));
        }

        let key = FileStorage::generate_key(user_id, extension);
        self.storage.save(&key, &data).await?;

        let (training_id, personal_record_id) = match upload.entity {
            MediaEntity::Training => (Some(upload.entity_id), None),
            MediaEntity::PersonalRecord => (None, Some(upload.entity_id)),
        };

        let inserted = sqlx::query_as::<_, MediaAttachment>(&format!(
            "INSERT INTO media_attachments
                (id, user_id, training_id, personal_record_id, file_name, storage_key, mime_type, size_bytes)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {MEDIA_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(training_id)
        .bind(personal_record_id)
        .bind(&upload.file_name)
        .bind(&key)
        .bind(mime_type)
        .bind(data.len() as i64)
        .fetch_one(&mut *tx)
        .await;

        let attachment = match inserted {
            Ok(attachment) => attachment,
            Err(err) => {
                self.discard(&key).await;
                return Err(err.into());
            }
        };
        if let Err(err) = tx.commit().await {
            self.discard(&key).await;
            return Err(err.into());
        }

        info!(
            user_id = %user_id,
            media_id = %attachment.id,
            size = attachment.size_bytes,
            "Media attached to {}",
            upload.entity.label()
        );
        Ok(attachment)
    }

    pub async fn list_media(
        &self,
        user_id: Uuid,
        query: MediaQuery,
    ) -> Result<Vec<MediaAttachment>, ApiError> {
        ensure_owned_entity(&self.db, user_id, query.entity_type, query.entity_id).await?;
        Ok(attachments_for(&self.db, query.entity_type, query.entity_id).await?)
    }

    /// Remove the file first, then the row.
    pub async fn delete_media(&self, user_id: Uuid, media_id: Uuid) -> Result<(), ApiError> {
        let key: String = sqlx::query_scalar(
            "SELECT storage_key FROM media_attachments WHERE id = $1 AND user_id = $2",
        )
        .bind(media_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(ApiError::NotFound("Media"))?;

        self.discard(&key).await;

        sqlx::query("DELETE FROM media_attachments WHERE id = $1 AND user_id = $2")
            .bind(media_id)
            .bind(user_id)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    /// Open a file for download, only if the key is safe and belongs to the caller.
    pub async fn open_file(&self, user_id: Uuid, key: &str) -> Result<StoredFile, ApiError> {
        validate_key(key)?;
        if key_owner(key) != Some(user_id) {
            return Err(ApiError::NotFound("File"));
        }

        let attachment = sqlx::query_as::<_, MediaAttachment>(&format!(
            "SELECT {MEDIA_COLUMNS} FROM media_attachments WHERE storage_key = $1 AND user_id = $2"
        ))
        .bind(key)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(ApiError::NotFound("File"))?;

        let (file, len) = self.storage.open(key).await?;
        Ok(StoredFile {
            file,
            len,
            attachment,
        })
    }

    /// Delete every file attached to an entity. Failures are logged only.
    pub async fn delete_files_for(
        &self,
        entity: MediaEntity,
        entity_id: Uuid,
    ) -> Result<(), ApiError> {
        let keys: Vec<String> = sqlx::query_scalar(&format!(
            "SELECT storage_key FROM media_attachments WHERE {} = $1",
            entity.column()
        ))
        .bind(entity_id)
        .fetch_all(&self.db)
        .await?;

        self.storage.delete_all(&keys).await;
        Ok(())
    }

    /// Delete every file a user has uploaded. Failures are logged only.
    pub async fn delete_files_of_user(&self, user_id: Uuid) -> Result<(), ApiError> {
        let keys: Vec<String> =
            sqlx::query_scalar("SELECT storage_key FROM media_attachments WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(&self.db)
                .await?;

        self.storage.delete_all(&keys).await;
        Ok(())
    }

    async fn discard(&self, key: &str) {
        if let Err(err) = self.storage.delete(key).await {
            warn!("Failed to delete file {}: {}", key, err);
        }
    }
}

pub(crate) async fn attachments_for(
    db: &PgPool,
    entity: MediaEntity,
    entity_id: Uuid,
) -> Result<Vec<MediaAttachment>, sqlx::Error> {
    sqlx::query_as::<_, MediaAttachment>(&format!(
        "SELECT {MEDIA_COLUMNS} FROM media_attachments WHERE {} = $1 ORDER BY created_at",
        entity.column()
    ))
    .bind(entity_id)
    .fetch_all(db)
    .await
}

async fn ensure_owned_entity(
    db: &PgPool,
    user_id: Uuid,
    entity: MediaEntity,
    entity_id: Uuid,
) -> Result<(), ApiError> {
    let owned: bool = sqlx::query_scalar(&format!(
        "SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1 AND user_id = $2)",
        entity.table()
    ))
    .bind(entity_id)
    .bind(user_id)
    .fetch_one(db)
    .await?;

    if owned {
        Ok(())
    } else {
        Err(ApiError::NotFound(entity.label()))
    }
}

/// Row lock on the owning entity serializes concurrent uploads to it.
async fn lock_owned_entity(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    entity: MediaEntity,
    entity_id: Uuid,
) -> Result<(), ApiError> {
    let locked: Option<Uuid> = sqlx::query_scalar(&format!(
        "SELECT id FROM {} WHERE id = $1 AND user_id = $2 FOR UPDATE",
        entity.table()
    ))
    .bind(entity_id)
    .bind(user_id)
    .fetch_optional(&mut **tx)
    .await?;

    locked.map(|_| ()).ok_or(ApiError::NotFound(entity.label()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use sqlx::postgres::PgPoolOptions;

    fn service() -> MediaService {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        MediaService::new(pool, FileStorage::new("/tmp/unused"), StorageConfig::default())
    }

    #[tokio::test]
    async fn test_check_upload_accepts_matching_image() {
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];
        assert_eq!(service().check_upload("image/png", &png).unwrap(), "png");
    }

    #[tokio::test]
    async fn test_check_upload_rejections() {
        let service = service();

        assert_matches!(
            service.check_upload("application/pdf", b"%PDF-1.7"),
            Err(ApiError::UnsupportedMediaType(_))
        );
        assert_matches!(
            service.check_upload("image/jpeg", b"GIF89a......"),
            Err(ApiError::UnsupportedMediaType(_))
        );
        assert_matches!(service.check_upload("image/gif", b""), Err(ApiError::BadRequest(_)));

        let mut big = vec![0u8; 5 * 1024 * 1024 + 1];
        big[..3].copy_from_slice(&[0xFF, 0xD8, 0xFF]);
        assert_matches!(
            service.check_upload("image/jpeg", &big),
            Err(ApiError::FileTooLarge { limit }) if limit == 5 * 1024 * 1024
        );
    }

    #[tokio::test]
    async fn test_attachment_caps() {
        let service = service();
        assert_eq!(service.max_attachments(MediaEntity::Training), 5);
        assert_eq!(service.max_attachments(MediaEntity::PersonalRecord), 3);
    }
}
