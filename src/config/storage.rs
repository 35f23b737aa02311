use std::path::PathBuf;

use super::{env_or, env_string, ConfigError};

const MIB: u64 = 1024 * 1024;

/// Where uploaded media lives and how much of it a user may attach.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub upload_dir: PathBuf,
    pub max_image_bytes: u64,
    pub max_video_bytes: u64,
    pub max_media_per_training: i64,
    pub max_media_per_personal_record: i64,
}

impl StorageConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            upload_dir: PathBuf::from(env_string("UPLOAD_DIR", "./uploads")),
            max_image_bytes: mebibytes("MAX_IMAGE_MB", env_or("MAX_IMAGE_MB", 5)?)?,
            max_video_bytes: mebibytes("MAX_VIDEO_MB", env_or("MAX_VIDEO_MB", 50)?)?,
            max_media_per_training: env_or("MAX_MEDIA_PER_TRAINING", 5)?,
            max_media_per_personal_record: env_or("MAX_MEDIA_PER_RECORD", 3)?,
        })
    }

    pub fn with_upload_dir(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            ..Self::default()
        }
    }

    /// Largest request body the upload route accepts: the video cap plus room
    /// for the multipart envelope and the other form fields.
    pub fn max_request_bytes(&self) -> usize {
        let bytes = self.max_image_bytes.max(self.max_video_bytes).saturating_add(MIB);
        usize::try_from(bytes).unwrap_or(usize::MAX)
    }
}

fn mebibytes(key: &str, value: u64) -> Result<u64, ConfigError> {
    value.checked_mul(MIB).ok_or_else(|| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("./uploads"),
            max_image_bytes: 5 * MIB,
            max_video_bytes: 50 * MIB,
            max_media_per_training: 5,
            max_media_per_personal_record: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_size_limits_in_mebibytes() {
        assert_eq!(mebibytes("MAX_IMAGE_MB", 5).unwrap(), 5 * 1024 * 1024);
        assert_matches!(
            mebibytes("MAX_VIDEO_MB", u64::MAX / 1024),
            Err(ConfigError::InvalidValue { key, .. }) if key == "MAX_VIDEO_MB"
        );
    }

    #[test]
    fn test_request_limit_saturates() {
        let config = StorageConfig {
            max_video_bytes: u64::MAX,
            ..StorageConfig::default()
        };
        assert_eq!(config.max_request_bytes(), usize::MAX);
        assert_eq!(StorageConfig::default().max_request_bytes(), 51 * 1024 * 1024);
    }
}
