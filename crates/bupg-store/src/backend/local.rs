use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, warn};

use super::{Backend, CollectionKey};
use crate::error::Result;

/// Collections stored as JSON files in one directory.
#[derive(Debug, Clone)]
pub struct LocalFileBackend {
    data_dir: PathBuf,
}

impl LocalFileBackend {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    fn path_for(&self, key: CollectionKey) -> PathBuf {
        self.data_dir.join(key.file_name())
    }
}

#[async_trait]
impl Backend for LocalFileBackend {
    fn describe(&self) -> &'static str {
        "local-file"
    }

    async fn load(&self, key: CollectionKey) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "Collection file absent");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write to `<file>.tmp`, then rename over the target. A failed rename
    /// (stale or cross-device target) removes the destination and retries
    /// once. This narrows the window for a torn file; it is not a
    /// transaction.
    async fn save(&self, key: CollectionKey, json: String) -> Result<()> {
        fs::create_dir_all(&self.data_dir).await?;

        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json.as_bytes()).await?;

        if let Err(e) = fs::rename(&tmp, &path).await {
            warn!(path = %path.display(), error = %e, "Rename failed, replacing target");
            if let Err(e) = fs::remove_file(&path).await {
                debug!(error = %e, "Could not remove rename target");
            }
            fs::rename(&tmp, &path).await?;
        }

        debug!(path = %path.display(), bytes = json.len(), "Collection written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_is_no_data() {
        let dir = TempDir::new().unwrap();
        let backend = LocalFileBackend::new(dir.path().to_path_buf());
        assert!(backend.load(CollectionKey::Products).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_creates_dir_and_leaves_no_tmp() {
        let dir = TempDir::new().unwrap();
        let data_dir = dir.path().join("nested").join("data");
        let backend = LocalFileBackend::new(data_dir.clone());

        backend
            .save(CollectionKey::Chats, "[1,2,3]".to_string())
            .await
            .unwrap();

        assert_eq!(
            backend.load(CollectionKey::Chats).await.unwrap().as_deref(),
            Some("[1,2,3]")
        );
        assert!(data_dir.join("chats.json").exists());
        assert!(!data_dir.join("chats.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let dir = TempDir::new().unwrap();
        let backend = LocalFileBackend::new(dir.path().to_path_buf());

        backend.save(CollectionKey::Products, "[1]".into()).await.unwrap();
        backend.save(CollectionKey::Products, "[2]".into()).await.unwrap();

        assert_eq!(
            backend.load(CollectionKey::Products).await.unwrap().as_deref(),
            Some("[2]")
        );
    }

    #[tokio::test]
    async fn test_unreplaceable_target_surfaces_error() {
        // Non-empty directory at the target: both renames and the removal fail.
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("products.json")).unwrap();
        std::fs::write(dir.path().join("products.json").join("x"), b"x").unwrap();

        let backend = LocalFileBackend::new(dir.path().to_path_buf());
        assert!(backend
            .save(CollectionKey::Products, "[]".into())
            .await
            .is_err());
    }
}
