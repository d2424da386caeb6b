use crate::error::StorageError;
use async_trait::async_trait;
use gpilot_domain::value::ConfigMap;
use parking_lot::RwLock;
use std::borrow::Cow;
use std::fmt::Debug;
use std::sync::Arc;

/// Asynchronous key/value persistence shared by every context of an install.
///
/// Writes merge at key granularity: keys absent from `entries` are left untouched.
#[async_trait]
pub trait PersistenceBackend: Send + Sync + Debug {
    /// Returns the stored entries among `keys`; keys never written are omitted.
    async fn load(&self, keys: &[String]) -> Result<ConfigMap, StorageError>;

    async fn load_all(&self) -> Result<ConfigMap, StorageError>;

    async fn save(&self, entries: ConfigMap) -> Result<(), StorageError>;
}

/// Process-local backend; clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: Arc<RwLock<ConfigMap>>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_entries(entries: ConfigMap) -> Self {
        Self { entries: Arc::new(RwLock::new(entries)) }
    }

    #[must_use]
    pub fn snapshot(&self) -> ConfigMap {
        self.entries.read().clone()
    }
}

#[async_trait]
impl PersistenceBackend for MemoryBackend {
    async fn load(&self, keys: &[String]) -> Result<ConfigMap, StorageError> {
        let entries = self.entries.read();
        Ok(keys
            .iter()
            .filter_map(|key| entries.get(key).map(|value| (key.clone(), value.clone())))
            .collect())
    }

    async fn load_all(&self) -> Result<ConfigMap, StorageError> {
        Ok(self.snapshot())
    }

    async fn save(&self, entries: ConfigMap) -> Result<(), StorageError> {
        self.entries.write().extend(entries);
        Ok(())
    }
}

/// Backend of a context with no reachable persistence; every call fails.
#[derive(Debug, Clone)]
pub struct UnavailableBackend {
    reason: Cow<'static, str>,
}

impl UnavailableBackend {
    #[must_use]
    pub fn new(reason: impl Into<Cow<'static, str>>) -> Self {
        Self { reason: reason.into() }
    }

    fn error(&self) -> StorageError {
        StorageError::Unavailable { message: self.reason.clone(), context: None }
    }
}

#[async_trait]
impl PersistenceBackend for UnavailableBackend {
    async fn load(&self, _keys: &[String]) -> Result<ConfigMap, StorageError> {
        Err(self.error())
    }

    async fn load_all(&self) -> Result<ConfigMap, StorageError> {
        Err(self.error())
    }

    async fn save(&self, _entries: ConfigMap) -> Result<(), StorageError> {
        Err(self.error())
    }
}
