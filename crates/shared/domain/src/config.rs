use serde::Deserialize;
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;

/// Top-level configuration of one extension install.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfigInner {
    pub storage: StorageConfig,
    pub sites: SitesConfig,
    pub menu: MenuConfig,
    pub messaging: MessagingConfig,
    pub settings: SettingsConfig,
    pub logging: LoggingConfig,
}

/// Thin Arc-wrapped config for inexpensive cloning into subsystems.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(flatten, default)]
    inner: Arc<AppConfigInner>,
}

impl Deref for AppConfig {
    type Target = AppConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for AppConfig {
    fn deref_mut(&mut self) -> &mut AppConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// Where the persisted store lives.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    /// Storage area name; one JSON document per area.
    pub area: String,
    /// Keep everything in memory (nothing survives the process).
    pub in_memory: bool,
}

/// Per-domain opt-out list limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SitesConfig {
    pub max_disabled: usize,
}

/// The context-menu affordance.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MenuConfig {
    pub id: String,
    pub enabled_label: String,
    pub disabled_label: String,
    /// Self-managed instances treated as GitLab-hosted origins.
    pub gitlab_hosts: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MessagingConfig {
    /// Zero disables the reply timeout.
    pub reply_timeout_ms: u64,
    pub inbox_capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SettingsConfig {
    pub debounce_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
    pub path: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { data_dir: PathBuf::from(".gpilot"), area: "sync".to_owned(), in_memory: false }
    }
}

impl Default for SitesConfig {
    fn default() -> Self {
        Self { max_disabled: 500 }
    }
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            id: "gpilot-site-toggle".to_owned(),
            enabled_label: "Disable GitLab Pilot on this site".to_owned(),
            disabled_label: "Re-enable GitLab Pilot on this site".to_owned(),
            gitlab_hosts: Vec::new(),
        }
    }
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self { reply_timeout_ms: 30_000, inbox_capacity: 64 }
    }
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self { debounce_ms: 1_000 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_owned(), json: false, path: None }
    }
}
