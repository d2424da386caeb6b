use crate::area::AreaName;
use crate::error::{StorageError, StorageErrorExt};
use crate::file::{FileBackend, FileInner};
use private::Sealed;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::info;

const DEFAULT_AREA: &str = "sync";

#[derive(Debug, Clone)]
struct BackendConfig {
    area: String,
    create: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self { area: DEFAULT_AREA.to_owned(), create: true }
    }
}

#[derive(Debug, Default)]
pub struct NoRoot;
#[derive(Debug)]
pub struct WithRoot(PathBuf);

mod private {
    pub(super) trait Sealed {}
}
impl Sealed for NoRoot {}
impl Sealed for WithRoot {}

#[allow(private_bounds)]
#[derive(Debug, Default)]
pub struct FileBackendBuilder<S: Sealed = NoRoot> {
    state: S,
    config: BackendConfig,
}

#[allow(private_bounds)]
impl<S: Sealed> FileBackendBuilder<S> {
    /// Storage area (document) name, `sync` by default.
    #[must_use = "Sets the storage area of the backend"]
    pub fn area(mut self, area: impl Into<String>) -> Self {
        self.config.area = area.into();
        self
    }

    #[must_use = "Sets whether the root directory should be created if it does not exist"]
    pub const fn create(mut self, enable: bool) -> Self {
        self.config.create = enable;
        self
    }

    fn transition<N: Sealed>(self, state: N) -> FileBackendBuilder<N> {
        FileBackendBuilder { state, config: self.config }
    }
}

impl FileBackendBuilder<NoRoot> {
    #[must_use = "Creates a new backend builder with default configuration"]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "Sets the root directory of the backend"]
    pub fn root(self, path: impl Into<PathBuf>) -> FileBackendBuilder<WithRoot> {
        self.transition(WithRoot(path.into()))
    }
}

impl FileBackendBuilder<WithRoot> {
    /// Validates the area, bootstraps and canonicalizes the root, then removes temp
    /// files orphaned by interrupted writes.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidArea`] for an illegal area name and
    /// [`StorageError::Io`] if the root cannot be created or resolved.
    pub async fn connect(self) -> Result<FileBackend, StorageError> {
        let area = AreaName::try_from(self.config.area.as_str())?;
        let root = &self.state.0;

        if self.config.create {
            fs::create_dir_all(root)
                .await
                .context(format!("Failed to bootstrap storage root: {}", root.display()))?;
        }

        let canonical = fs::canonicalize(root)
            .await
            .context(format!("Failed to resolve storage root: {}", root.display()))?;
        let document = canonical.join(format!("{area}.json"));
        info!(path = %document.display(), "Settings storage ready");

        let backend = FileBackend {
            inner: Arc::new(FileInner {
                root: canonical,
                document,
                tmp_tag: format!("{}.{}", std::process::id(), gpilot_kernel::safe_nanoid!(8)),
                tmp_counter: AtomicU64::new(1),
                write_lock: Mutex::new(()),
            }),
        };

        backend.purge_tmp().await;

        Ok(backend)
    }
}
