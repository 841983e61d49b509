use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// StorageError
///
/// Failures of the media storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Backend(String),
}

// 1. Storage Contract
/// StorageService
///
/// Abstract contract for persisting uploaded media. Handlers only see this trait, so
/// the disk-backed store used in deployments can be swapped for the in-memory mock
/// in tests.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Writes `bytes` under `key`, replacing any existing object.
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<(), StorageError>;

    /// Removes the object at `key`. Deleting a missing object is not an error.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Public URL under which the object at `key` is served.
    fn public_url(&self, key: &str) -> String;
}

// 2. The Real Implementation (local disk)
/// LocalDiskStorage
///
/// Stores objects as files below `root`; the router serves the same directory
/// under `url_prefix` with `ServeDir`.
#[derive(Clone, Debug)]
pub struct LocalDiskStorage {
    root: PathBuf,
    url_prefix: String,
}

impl LocalDiskStorage {
    pub fn new(root: impl Into<PathBuf>, url_prefix: &str) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let clean = sanitize_key(key);
        if clean.is_empty() {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(clean))
    }
}

#[async_trait]
impl StorageService for LocalDiskStorage {
    async fn put(&self, key: &str, bytes: &[u8], _content_type: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        tracing::debug!(key, size = bytes.len(), "stored media object");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.url_prefix, sanitize_key(key))
    }
}

/// sanitize_key
///
/// Prevents path traversal by removing directory navigation components
/// (`..`, `.`) and empty segments from a key.
pub fn sanitize_key(key: &str) -> String {
    key.split(['/', '\\'])
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

// 3. In-memory Implementation (tests)
/// MockStorageService
///
/// Keeps objects in memory so upload and delete handlers can be exercised without
/// touching the filesystem.
#[derive(Clone, Default)]
pub struct MockStorageService {
    /// When true, all operations return a simulated failure.
    pub should_fail: bool,
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self { should_fail: true, ..Self::default() }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects
            .lock()
            .map(|objects| objects.contains_key(&sanitize_key(key)))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.objects.lock().map(|objects| objects.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn put(&self, key: &str, bytes: &[u8], _content_type: &str) -> Result<(), StorageError> {
        if self.should_fail {
            return Err(StorageError::Backend("Mock Storage Error: Simulation requested".to_string()));
        }
        let mut objects = self
            .objects
            .lock()
            .map_err(|_| StorageError::Backend("mock storage poisoned".to_string()))?;
        objects.insert(sanitize_key(key), bytes.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        if self.should_fail {
            return Err(StorageError::Backend("Mock Storage Error: Simulation requested".to_string()));
        }
        let mut objects = self
            .objects
            .lock()
            .map_err(|_| StorageError::Backend("mock storage poisoned".to_string()))?;
        objects.remove(&sanitize_key(key));
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("/uploads/{}", sanitize_key(key))
    }
}

/// StorageState
///
/// The concrete type used to share the storage service across the application state.
pub type StorageState = Arc<dyn StorageService>;
