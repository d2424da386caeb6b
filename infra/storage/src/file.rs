//! JSON-document backend with atomic writes.
//!
//! Each storage area is a single `<area>.json` document under the root. Reads parse the
//! whole document; writes merge the given entries into the current document and swap
//! the result in atomically (unique temp write + `fsync` + `rename`).

use crate::backend::PersistenceBackend;
use crate::builder::FileBackendBuilder;
use crate::error::{StorageError, StorageErrorExt};
use crate::maintenance;
use async_trait::async_trait;
use gpilot_domain::value::ConfigMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

pub(crate) const TMP_MARKER: &str = ".gpilottmp.";
const TMP_ATTEMPTS: usize = 4;

#[derive(Debug)]
pub(crate) struct FileInner {
    /// Canonicalized directory holding the area documents.
    pub(crate) root: PathBuf,
    pub(crate) document: PathBuf,
    /// Process id plus a random suffix; keeps temp names apart across processes.
    pub(crate) tmp_tag: String,
    pub(crate) tmp_counter: AtomicU64,
    /// Serializes read-merge-write cycles of this process.
    pub(crate) write_lock: Mutex<()>,
}

/// Handle to one storage area on disk. Cheap to clone.
///
/// ```rust
/// use gpilot_storage::{FileBackend, PersistenceBackend, StorageError};
/// use gpilot_domain::value::{ConfigMap, ConfigValue};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), StorageError> {
///     # let tmp = tempfile::tempdir().unwrap();
///     let backend = FileBackend::builder().root(tmp.path()).area("sync").connect().await?;
///
///     backend.save(ConfigMap::from([("ui_theme".into(), ConfigValue::from("dark"))])).await?;
///     let loaded = backend.load(&["ui_theme".into()]).await?;
///     assert_eq!(loaded["ui_theme"].as_str(), Some("dark"));
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileBackend {
    pub(crate) inner: Arc<FileInner>,
}

impl FileBackend {
    #[must_use = "The backend is not initialized until you call .connect()"]
    pub fn builder() -> FileBackendBuilder {
        FileBackendBuilder::new()
    }

    /// Physical path of the area document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.inner.document
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.inner.root
    }

    async fn read_document(&self) -> Result<ConfigMap, StorageError> {
        let path = &self.inner.document;
        let data = match fs::read(path).await {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(ConfigMap::new()),
            Err(err) => {
                return Err(StorageError::Io {
                    source: err,
                    context: Some(format!("Read failed: {}", path.display()).into()),
                });
            },
        };

        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(ConfigMap::new());
        }

        serde_json::from_slice(&data).context(format!("Parsing {}", path.display()))
    }

    async fn write_document(&self, document: &ConfigMap) -> Result<(), StorageError> {
        let target = &self.inner.document;
        let data = serde_json::to_vec_pretty(document).context("Encoding settings document")?;
        let (mut file, temp) = self.create_temp(target).await?;
        file.write_all(&data).await.context("Write failed")?;
        file.sync_all().await.context("Hardware sync failed")?;
        drop(file);

        if let Err(err) = fs::rename(&temp, target).await {
            if err.kind() == std::io::ErrorKind::AlreadyExists {
                fs::remove_file(target)
                    .await
                    .context(format!("Failed to replace existing file: {}", target.display()))?;
                fs::rename(&temp, target).await.context(format!(
                    "Atomic swap failed: {} -> {}",
                    temp.display(),
                    target.display()
                ))?;
            } else {
                let _ = fs::remove_file(&temp).await;
                return Err(StorageError::Io {
                    source: err,
                    context: Some(
                        format!("Atomic swap failed: {} -> {}", temp.display(), target.display())
                            .into(),
                    ),
                });
            }
        }

        sync_dir(&self.inner.root).await;
        debug!(path = %target.display(), entries = document.len(), "Settings document saved");
        Ok(())
    }

    /// Opens a fresh temp file next to `target`, skipping names another writer already holds.
    async fn create_temp(&self, target: &Path) -> Result<(fs::File, PathBuf), StorageError> {
        let mut attempt = 1;
        loop {
            let temp = unique_tmp_path(target, &self.inner.tmp_tag, &self.inner.tmp_counter);
            match fs::OpenOptions::new().create_new(true).write(true).open(&temp).await {
                Ok(file) => return Ok((file, temp)),
                Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists && attempt < TMP_ATTEMPTS => {
                    debug!(path = %temp.display(), attempt, "Temp name taken, retrying");
                    attempt += 1;
                },
                Err(err) => {
                    return Err(StorageError::Io {
                        source: err,
                        context: Some(format!("Temp creation failed: {}", temp.display()).into()),
                    });
                },
            }
        }
    }

    pub async fn purge_tmp(&self) {
        maintenance::purge_tmp(&self.inner.root).await;
    }
}

#[async_trait]
impl PersistenceBackend for FileBackend {
    async fn load(&self, keys: &[String]) -> Result<ConfigMap, StorageError> {
        let mut document = self.read_document().await?;
        Ok(keys.iter().filter_map(|key| document.remove_entry(key)).collect())
    }

    async fn load_all(&self) -> Result<ConfigMap, StorageError> {
        self.read_document().await
    }

    async fn save(&self, entries: ConfigMap) -> Result<(), StorageError> {
        if entries.is_empty() {
            return Ok(());
        }

        let _guard = self.inner.write_lock.lock().await;
        let mut document = self.read_document().await?;
        document.extend(entries);
        self.write_document(&document).await
    }
}

async fn sync_dir(path: &Path) {
    match fs::File::open(path).await {
        Ok(dir) => {
            if let Err(err) = dir.sync_all().await {
                tracing::warn!(path = %path.display(), error = %err, "Directory sync failed");
            }
        },
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "Directory open failed");
        },
    }
}

fn unique_tmp_path(target: &Path, tag: &str, counter: &AtomicU64) -> PathBuf {
    let counter = counter.fetch_add(1, Ordering::Relaxed);
    let file_name = target.file_name().and_then(|s| s.to_str()).unwrap_or("settings");
    target.with_file_name(format!("{file_name}{TMP_MARKER}{tag}.{counter}"))
}
