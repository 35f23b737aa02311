use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// The kind of journal entry an attachment belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MediaEntity {
    Training,
    PersonalRecord,
}

impl MediaEntity {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "training" => Some(MediaEntity::Training),
            "personal_record" => Some(MediaEntity::PersonalRecord),
            _ => None,
        }
    }

    /// Column on `media_attachments` pointing at the owning row.
    pub(crate) fn column(&self) -> &'static str {
        match self {
            MediaEntity::Training => "training_id",
            MediaEntity::PersonalRecord => "personal_record_id",
        }
    }

    /// Table holding the owning rows.
    pub(crate) fn table(&self) -> &'static str {
        match self {
            MediaEntity::Training => "trainings",
            MediaEntity::PersonalRecord => "personal_records",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MediaEntity::Training => "Training",
            MediaEntity::PersonalRecord => "Personal record",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MediaAttachment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub training_id: Option<Uuid>,
    pub personal_record_id: Option<Uuid>,
    pub file_name: String,
    pub storage_key: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct MediaQuery {
    pub entity_type: MediaEntity,
    pub entity_id: Uuid,
}

/// Metadata of an upload that passed type and size checks.
#[derive(Debug, Clone)]
pub struct NewMedia {
    pub entity: MediaEntity,
    pub entity_id: Uuid,
    pub file_name: String,
    pub mime_type: String,
}

/// Keep only the last path segment and characters safe to echo back.
pub fn sanitize_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control())
        .take(255)
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        "plik".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_entity_parsing() {
        assert_eq!(MediaEntity::parse("training"), Some(MediaEntity::Training));
        assert_eq!(MediaEntity::parse("personal_record"), Some(MediaEntity::PersonalRecord));
        assert_eq!(MediaEntity::parse("goal"), None);
        assert_eq!(MediaEntity::PersonalRecord.column(), "personal_record_id");
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("zdjęcie.jpg"), "zdjęcie.jpg");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\Users\\jan\\film.mp4"), "film.mp4");
        assert_eq!(sanitize_file_name(".."), "plik");
        assert_eq!(sanitize_file_name("a\u{0}b.png"), "ab.png");
    }
}
