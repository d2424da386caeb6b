//! Site toggle feature slice.
//!
//! The per-domain opt-out list lives in the configuration store under
//! `disabled_sites`: distinct host names, oldest first, capped in length. Toggling is a
//! read-modify-write without a lock, so two contexts toggling concurrently settle on
//! whichever write lands last; the user can re-check and toggle again.

mod error;

pub use crate::error::{SiteToggleError, SiteToggleErrorExt};

use fxhash::FxHashSet;
use gpilot_domain::keys::DISABLED_SITES;
use gpilot_domain::value::{ConfigMap, ConfigValue};
use gpilot_settings::{ConfigStore, WriteOutcome};
use tracing::{debug, info, warn};
use url::Url;

/// Extracts the host name of an absolute URL.
///
/// # Errors
/// Returns [`SiteToggleError::InvalidUrl`] if `url` does not parse or has no host.
pub fn host_of(url: &str) -> Result<String, SiteToggleError> {
    let parsed = Url::parse(url.trim()).map_err(|e| SiteToggleError::InvalidUrl {
        message: e.to_string().into(),
        context: Some(url.to_owned().into()),
    })?;

    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(host.to_ascii_lowercase()),
        _ => Err(SiteToggleError::InvalidUrl {
            message: "URL has no host".into(),
            context: Some(url.to_owned().into()),
        }),
    }
}

/// The opt-out list.
#[gpilot_derive::gpilot_slice]
pub struct SiteToggles {
    store: ConfigStore,
    max_disabled: usize,
}

impl SiteToggles {
    /// `max_disabled` bounds the list; zero is treated as one.
    #[must_use]
    pub fn with_store(store: ConfigStore, max_disabled: usize) -> Self {
        Self::new(SiteTogglesInner { store, max_disabled: max_disabled.max(1) })
    }

    #[must_use]
    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// The stored list in normal form, oldest first.
    pub async fn disabled_sites(&self) -> Vec<String> {
        let stored = self.store.get_value(DISABLED_SITES, ConfigValue::List(Vec::new())).await;
        self.normalize(stored.into_list())
    }

    /// Lowercases and trims every host, drops blanks and repeats (first occurrence
    /// keeps its place) and evicts the oldest entries beyond the cap.
    #[must_use]
    pub fn normalize(&self, hosts: Vec<String>) -> Vec<String> {
        let mut seen = FxHashSet::default();
        let mut sites: Vec<String> = hosts
            .into_iter()
            .map(|host| host.trim().to_ascii_lowercase())
            .filter(|host| !host.is_empty() && seen.insert(host.clone()))
            .collect();
        self.evict_oldest(&mut sites);
        sites
    }

    /// Rewrites a `disabled_sites` entry of `entries` into normal form. Other keys are
    /// left alone.
    pub fn normalize_entries(&self, entries: &mut ConfigMap) {
        if let Some(value) = entries.get_mut(DISABLED_SITES) {
            let hosts = std::mem::replace(value, ConfigValue::List(Vec::new())).into_list();
            *value = ConfigValue::List(self.normalize(hosts));
        }
    }

    /// Whether the feature is disabled on the host of `url`. An invalid URL is never
    /// disabled.
    pub async fn is_disabled(&self, url: &str) -> bool {
        match host_of(url) {
            Ok(host) => self.is_host_disabled(&host).await,
            Err(err) => {
                debug!(error = %err, "Unparseable URL treated as enabled");
                false
            },
        }
    }

    pub async fn is_host_disabled(&self, host: &str) -> bool {
        let disabled: FxHashSet<String> = self.disabled_sites().await.into_iter().collect();
        disabled.contains(&host.trim().to_ascii_lowercase())
    }

    /// Flips the host of `url` in the list and returns whether it is now disabled.
    ///
    /// # Errors
    /// Returns [`SiteToggleError::InvalidUrl`] if `url` has no parseable host.
    pub async fn toggle(&self, url: &str) -> Result<bool, SiteToggleError> {
        let host = host_of(url)?;
        let mut sites = self.disabled_sites().await;

        let disabled = if let Some(pos) = sites.iter().position(|h| *h == host) {
            sites.remove(pos);
            false
        } else {
            sites.push(host.clone());
            self.evict_oldest(&mut sites);
            true
        };

        let entries = ConfigMap::from([(DISABLED_SITES.to_owned(), ConfigValue::List(sites))]);
        if self.store.set(entries).await == WriteOutcome::Dropped {
            warn!(%host, disabled, "Toggle was not persisted");
        }

        info!(%host, disabled, "Site toggled");
        Ok(disabled)
    }

    fn evict_oldest(&self, sites: &mut Vec<String>) {
        if sites.len() <= self.max_disabled {
            return;
        }
        let excess = sites.len() - self.max_disabled;
        let evicted: Vec<String> = sites.drain(..excess).collect();
        warn!(?evicted, max = self.max_disabled, "Disabled-site list full; re-enabled oldest entries");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_is_extracted_and_lowercased() {
        assert_eq!(host_of("https://GitLab.Example.com/-/issues/42").expect("host"), "gitlab.example.com");
        assert_eq!(host_of("http://localhost:8080/x").expect("host"), "localhost");
    }

    fn toggles(max_disabled: usize) -> SiteToggles {
        SiteToggles::with_store(ConfigStore::detached(), max_disabled)
    }

    fn hosts(list: &[&str]) -> Vec<String> {
        list.iter().map(|h| (*h).to_owned()).collect()
    }

    #[test]
    fn normalize_lowercases_and_drops_repeats() {
        let sites = toggles(10).normalize(hosts(&[" GitLab.Example.com ", "a.x", "", "A.X", "gitlab.example.com"]));
        assert_eq!(sites, hosts(&["gitlab.example.com", "a.x"]));
    }

    #[test]
    fn normalize_keeps_the_newest_within_the_cap() {
        let sites = toggles(2).normalize(hosts(&["a.x", "b.x", "c.x", "a.x"]));
        assert_eq!(sites, hosts(&["b.x", "c.x"]));
    }

    #[test]
    fn normalize_entries_only_touches_the_list_key() {
        let mut entries = ConfigMap::from([
            (DISABLED_SITES.to_owned(), ConfigValue::List(hosts(&["B.x", "b.x"]))),
            ("ui_theme".to_owned(), ConfigValue::from("Dark")),
        ]);
        toggles(5).normalize_entries(&mut entries);

        assert_eq!(entries[DISABLED_SITES], ConfigValue::List(hosts(&["b.x"])));
        assert_eq!(entries["ui_theme"], ConfigValue::from("Dark"));
    }

    #[test]
    fn urls_without_host_are_invalid() {
        assert_eq!(host_of("not a url").expect_err("relative").code(), "invalid_url");
        assert!(host_of("mailto:someone@example.com").is_err());
        assert!(host_of("").is_err());
    }
}
