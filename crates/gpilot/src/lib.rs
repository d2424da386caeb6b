//! Facade crate for GitLab Pilot slices and shared modules.
//! Re-exports domain/kernel primitives and wires the background context.
//! Keep this crate thin: it should compose other crates, not implement business logic.
//!
//! ## Usage
//! - Open the persistence backend with [`open_backend`].
//! - Build the background context with [`init`], then `start` and `serve` it.

use gpilot_controller::{Collaborators, Controller};
use gpilot_domain::config::{AppConfig, StorageConfig};
use gpilot_messaging::EventBus;
use gpilot_storage::{FileBackend, MemoryBackend, PersistenceBackend, StorageError};
use std::sync::Arc;
use tracing::info;

pub use gpilot_domain as domain;
pub use gpilot_kernel as kernel;
pub use gpilot_messaging as messaging;
pub use gpilot_storage as storage;

/// Feature slices.
pub mod features {
    pub use gpilot_controller as controller;
    pub use gpilot_menu as menu;
    pub use gpilot_settings as settings;
    pub use gpilot_site_toggle as site_toggle;
}

/// The backend `config` asks for: in memory, or one JSON document per storage area
/// under `data_dir`.
///
/// # Errors
/// Returns a [`StorageError`] if the area name is invalid or the directory cannot be
/// created.
pub async fn open_backend(config: &StorageConfig) -> Result<Arc<dyn PersistenceBackend>, StorageError> {
    if config.in_memory {
        info!("Using in-memory persistence");
        return Ok(Arc::new(MemoryBackend::new()));
    }

    let backend = FileBackend::builder().area(config.area.as_str()).root(&config.data_dir).connect().await?;
    info!(path = %backend.path().display(), "Using file persistence");
    Ok(Arc::new(backend))
}

/// Wires every slice of the background context over `backend`.
#[must_use]
pub fn init(
    config: &AppConfig,
    backend: Arc<dyn PersistenceBackend>,
    bus: EventBus,
    collaborators: Collaborators,
) -> Controller {
    info!(max_disabled = config.sites.max_disabled, "Background context assembled");
    Controller::assemble(config, backend, bus, collaborators)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_backend_lands_under_data_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = StorageConfig {
            data_dir: dir.path().to_path_buf(),
            area: "Sync".to_owned(),
            in_memory: false,
        };

        let backend = open_backend(&config).await.expect("backend");
        assert!(backend.load_all().await.expect("load").is_empty());
    }

    #[tokio::test]
    async fn invalid_area_is_rejected() {
        let config = StorageConfig { area: "../escape".to_owned(), ..StorageConfig::default() };
        let err = open_backend(&config).await.expect_err("invalid area");
        assert_eq!(err.code(), "invalid_area");
    }
}
