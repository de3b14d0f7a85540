// src/clients/storage.rs

use std::{path::PathBuf, sync::Arc};

use bytes::Bytes;
use futures::TryStreamExt;
use object_store::{
    ObjectStore, PutMode, PutPayload, local::LocalFileSystem, memory::InMemory,
    path::Path as StorePath,
};
use url::Url;

use crate::{config::StorageSettings, services::retry::Transient};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("object already exists: {0}")]
    Conflict(String),
    #[error("request rejected by storage: {0}")]
    Rejected(String),
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl Transient for StorageError {
    fn is_transient(&self) -> bool {
        matches!(self, StorageError::Backend(_))
    }
}

impl From<object_store::Error> for StorageError {
    fn from(err: object_store::Error) -> Self {
        match err {
            object_store::Error::NotFound { path, .. } => StorageError::NotFound(path),
            object_store::Error::AlreadyExists { path, .. } => StorageError::Conflict(path),
            object_store::Error::InvalidPath { .. } => StorageError::Rejected(err.to_string()),
            other => StorageError::Backend(other.to_string()),
        }
    }
}

/// Object storage for uploaded documents, with a public read URL per key.
#[derive(Clone)]
pub struct DocumentStore {
    inner: Arc<dyn ObjectStore>,
    public_base: Url,
}

impl DocumentStore {
    pub fn new(inner: Arc<dyn ObjectStore>, public_base: Url) -> Self {
        Self { inner, public_base }
    }

    /// Local-filesystem store rooted at `settings.local_dir`.
    pub fn local(settings: &StorageSettings) -> Result<Self, StorageError> {
        let root = PathBuf::from(&settings.local_dir);
        std::fs::create_dir_all(&root).map_err(|e| StorageError::Backend(e.to_string()))?;
        let fs = LocalFileSystem::new_with_prefix(root)?;
        let base = Url::parse(&settings.public_base_url)
            .map_err(|e| StorageError::Rejected(e.to_string()))?;
        Ok(Self::new(Arc::new(fs), base))
    }

    /// Process-local store; contents vanish with the process.
    pub fn in_memory(public_base: Url) -> Self {
        Self::new(Arc::new(InMemory::new()), public_base)
    }

    /// Writes a new object; an existing object under `key` is a conflict.
    pub async fn put(&self, key: &str, bytes: Bytes) -> Result<(), StorageError> {
        let location = StorePath::from(key);
        self.inner
            .put_opts(&location, PutPayload::from(bytes), PutMode::Create.into())
            .await?;
        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<Bytes, StorageError> {
        let location = StorePath::from(key);
        let result = self.inner.get(&location).await?;
        Ok(result.bytes().await?)
    }

    /// Removes `key`. A missing object is reported as `NotFound` on every backend.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let location = StorePath::from(key);
        self.inner.head(&location).await?;
        self.inner.delete(&location).await?;
        Ok(())
    }

    pub async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        match self.inner.head(&StorePath::from(key)).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Keys stored under `prefix`.
    pub async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let prefix = StorePath::from(prefix);
        let keys = self
            .inner
            .list(Some(&prefix))
            .map_ok(|meta| meta.location.to_string())
            .try_collect::<Vec<_>>()
            .await?;
        Ok(keys)
    }

    pub fn public_url(&self, key: &str) -> Result<String, StorageError> {
        self.public_base
            .join(key)
            .map(String::from)
            .map_err(|e| StorageError::Rejected(e.to_string()))
    }
}
