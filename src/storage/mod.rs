//! Local disk storage for uploaded media.
//!
//! Files are addressed by keys of the form `{user_id}/{file}`; nothing outside
//! the upload directory can be named by a key.

pub mod media_type;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub use media_type::{lookup, sniff, AllowedMediaType, MediaKind, ALLOWED_MEDIA_TYPES};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the upload directory if it does not exist yet.
    pub async fn ensure_root(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Fresh key for a new upload of `user_id`.
    pub fn generate_key(user_id: Uuid, extension: &str) -> String {
        format!("{}/{}.{}", user_id, Uuid::new_v4(), extension)
    }

    /// Resolve a key to a path below the root, rejecting unsafe keys.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(key.split('/').fold(self.root.clone(), |path, segment| path.join(segment)))
    }

    pub async fn save(&self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write next to the target and rename so readers never see partial files.
        let tmp = path.with_extension("part");
        let mut file = fs::File::create(&tmp).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&tmp, &path).await?;

        info!("Stored file: key={}, size={}", key, data.len());
        Ok(())
    }

    /// Open a stored file for streaming, returning it with its length.
    pub async fn open(&self, key: &str) -> Result<(fs::File, u64), StorageError> {
        let path = self.path_for(key)?;
        let file = fs::File::open(&path).await.map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound(key.to_string()),
            _ => StorageError::Io(err),
        })?;
        let len = file.metadata().await?.len();
        Ok((file, len))
    }

    /// Remove a file. A file that is already gone is not an error.
    pub async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Deleted file: {}", key);
                Ok(true)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Best-effort removal of several files; failures are logged and counted.
    pub async fn delete_all(&self, keys: &[String]) -> usize {
        let mut failures = 0;
        for key in keys {
            if let Err(err) = self.delete(key).await {
                warn!("Failed to delete file {}: {}", key, err);
                failures += 1;
            }
        }
        if !keys.is_empty() {
            info!("Deleted {} of {} files", keys.len() - failures, keys.len());
        }
        failures
    }
}

fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.starts_with('.')
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// A key is exactly `{uuid}/{file}` with a conservative character set.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let invalid = || StorageError::InvalidKey(key.to_string());

    if key.is_empty() || key.len() > 255 || key.contains(['\\', '\0']) || key.starts_with('/') {
        return Err(invalid());
    }

    let mut segments = key.split('/');
    let (Some(owner), Some(file), None) = (segments.next(), segments.next(), segments.next()) else {
        return Err(invalid());
    };

    if Uuid::parse_str(owner).is_err() || !is_safe_segment(file) {
        return Err(invalid());
    }

    Ok(())
}

/// The user directory a valid key belongs to.
pub fn key_owner(key: &str) -> Option<Uuid> {
    validate_key(key).ok()?;
    key.split('/').next().and_then(|owner| Uuid::parse_str(owner).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    #[test]
    fn test_valid_keys() {
        let user = Uuid::new_v4();
        let key = FileStorage::generate_key(user, "png");
        assert!(validate_key(&key).is_ok());
        assert_eq!(key_owner(&key), Some(user));
    }

    #[test]
    fn test_rejects_traversal_and_odd_shapes() {
        let user = Uuid::new_v4();
        for key in [
            String::new(),
            "../etc/passwd".to_string(),
            format!("{user}/../secret.png"),
            format!("{user}/.."),
            format!("/{user}/a.png"),
            format!("{user}\\a.png"),
            format!("{user}/a\0.png"),
            format!("{user}/nested/a.png"),
            format!("{user}/.hidden"),
            format!("{user}/"),
            "not-a-uuid/a.png".to_string(),
        ] {
            assert_matches!(validate_key(&key), Err(StorageError::InvalidKey(_)), "key {key:?}");
        }
    }

    proptest! {
        #[test]
        fn prop_valid_keys_stay_inside_root(key in "\\PC{0,80}") {
            let storage = FileStorage::new("/srv/uploads");
            if let Ok(path) = storage.path_for(&key) {
                prop_assert!(path.starts_with("/srv/uploads"));
                prop_assert_eq!(path.components().count(), Path::new("/srv/uploads").components().count() + 2);
            }
        }

        #[test]
        fn prop_dot_dot_segments_always_rejected(prefix in "[a-z0-9/]{0,10}", suffix in "[a-z0-9/]{0,10}") {
            let key = format!("{prefix}../{suffix}");
            prop_assert!(validate_key(&key).is_err());
        }
    }

    #[tokio::test]
    async fn test_save_open_delete() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        storage.ensure_root().await.unwrap();

        let key = FileStorage::generate_key(Uuid::new_v4(), "png");
        storage.save(&key, b"\x89PNG data").await.unwrap();

        let (_, len) = storage.open(&key).await.unwrap();
        assert_eq!(len, 9);

        assert!(storage.delete(&key).await.unwrap());
        assert!(!storage.delete(&key).await.unwrap());
        assert_matches!(storage.open(&key).await, Err(StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_all_counts_failures() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        let key = FileStorage::generate_key(Uuid::new_v4(), "jpg");
        storage.save(&key, b"\xFF\xD8\xFFdata").await.unwrap();

        let failures = storage
            .delete_all(&[key.clone(), "../escape".to_string()])
            .await;
        assert_eq!(failures, 1);
        assert!(!storage.path_for(&key).unwrap().exists());
    }
}
