use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;

use super::{FileStore, StorageError};

/// Files on local disk under the media root.
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if key.is_empty() || escapes {
            return Err(format!("Invalid storage key: {key}").into());
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn save(&self, key: &str, data: Bytes) -> Result<(), StorageError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &data).await?;
        tracing::debug!(path = %path.display(), bytes = data.len(), "Stored file");
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Bytes, StorageError> {
        let path = self.resolve(key)?;
        let data = tokio::fs::read(&path).await?;
        Ok(Bytes::from(data))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.resolve(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
