use gpilot_domain::events::ConfigChanged;
use gpilot_domain::settings::Settings;
use gpilot_domain::value::{ConfigMap, ConfigValue};
use gpilot_messaging::EventBus;
use gpilot_storage::PersistenceBackend;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// What became of a write. Both outcomes signal completion; neither is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Persisted,
    /// No backend, or the backend failed; logged and dropped.
    Dropped,
}

/// Key/value configuration shared by every context, with defaulting.
///
/// Reads never fail: missing keys and backend errors resolve to the caller's defaults.
/// Writes are last-write-wins per key and always complete.
#[gpilot_derive::gpilot_slice]
pub struct ConfigStore {
    backend: Option<Arc<dyn PersistenceBackend>>,
    bus: Option<EventBus>,
}

impl ConfigStore {
    /// A store over `backend`. With a bus, successful writes publish [`ConfigChanged`].
    #[must_use]
    pub fn connect(backend: Arc<dyn PersistenceBackend>, bus: Option<EventBus>) -> Self {
        Self::new(ConfigStoreInner { backend: Some(backend), bus })
    }

    /// A store for a context with no reachable persistence: reads yield defaults and
    /// writes complete as no-ops.
    #[must_use]
    pub fn detached() -> Self {
        Self::new(ConfigStoreInner { backend: None, bus: None })
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.backend.is_some()
    }

    /// Resolves `keys`: the stored value, else `defaults[key]`, else an empty string.
    pub async fn get(&self, keys: &[&str], defaults: &ConfigMap) -> ConfigMap {
        self.get_with_fallback(keys, defaults, &ConfigValue::default()).await
    }

    /// Like [`ConfigStore::get`], with `fallback` for keys that have no declared default.
    pub async fn get_with_fallback(
        &self,
        keys: &[&str],
        defaults: &ConfigMap,
        fallback: &ConfigValue,
    ) -> ConfigMap {
        let mut stored = self.load(keys).await;
        keys.iter()
            .map(|key| {
                let value = stored
                    .remove(*key)
                    .or_else(|| defaults.get(*key).cloned())
                    .unwrap_or_else(|| fallback.clone());
                ((*key).to_owned(), value)
            })
            .collect()
    }

    /// Single-key read.
    pub async fn get_value(&self, key: &str, default: ConfigValue) -> ConfigValue {
        let mut stored = self.load(&[key]).await;
        stored.remove(key).unwrap_or(default)
    }

    /// Writes `entries`, merging at key granularity.
    pub async fn set(&self, entries: ConfigMap) -> WriteOutcome {
        if entries.is_empty() {
            return WriteOutcome::Persisted;
        }

        let Some(backend) = &self.backend else {
            debug!(keys = ?entries.keys().collect::<Vec<_>>(), "No persistence; write skipped");
            return WriteOutcome::Dropped;
        };

        let keys: Vec<String> = entries.keys().cloned().collect();
        if let Err(err) = backend.save(entries).await {
            warn!(error = %err, code = err.code(), ?keys, "Persisting settings failed; write dropped");
            return WriteOutcome::Dropped;
        }

        trace!(?keys, "Settings persisted");
        if let Some(bus) = &self.bus
            && let Err(err) = bus.publish(ConfigChanged { keys })
        {
            warn!(error = %err, "Publishing config change failed");
        }
        WriteOutcome::Persisted
    }

    /// The typed settings view, defaults filled in.
    pub async fn load_settings(&self) -> Settings {
        let keys = gpilot_domain::keys::ALL;
        Settings::from_map(&self.get(keys, &Settings::defaults()).await)
    }

    pub async fn save_settings(&self, settings: &Settings) -> WriteOutcome {
        self.set(settings.to_map()).await
    }

    async fn load(&self, keys: &[&str]) -> ConfigMap {
        let Some(backend) = &self.backend else {
            return ConfigMap::new();
        };

        let owned: Vec<String> = keys.iter().map(|k| (*k).to_owned()).collect();
        match backend.load(&owned).await {
            Ok(stored) => stored,
            Err(err) => {
                warn!(error = %err, code = err.code(), ?keys, "Reading settings failed; using defaults");
                ConfigMap::new()
            },
        }
    }
}
