//! Menu affordance state machine.
//!
//! Every trigger (tab activation, navigation, a toggle of the active site) starts a
//! recomputation with a [`Ticket`]: a per-tab sequence number taken before any
//! suspension point. Results are committed in ticket order per tab; a result whose
//! number is not above the last applied one is discarded, so a slow lookup can never
//! overwrite a newer state.

use crate::classify;
use crate::error::MenuError;
use crate::host::{MenuHost, MenuUpdate};
use fxhash::FxHashMap;
use gpilot_domain::config::MenuConfig;
use gpilot_domain::menu::{MenuContexts, MenuState, TabId};
use gpilot_site_toggle::{SiteToggles, host_of};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};

/// One recomputation of one tab's menu state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub tab: TabId,
    pub seq: u64,
}

#[derive(Debug, Clone)]
struct ActiveTab {
    tab: TabId,
    url: String,
}

#[derive(Debug, Default)]
struct Gate {
    applied: FxHashMap<TabId, u64>,
    active: Option<ActiveTab>,
    shown: MenuState,
}

#[derive(Debug)]
struct MachineInner {
    host: Arc<dyn MenuHost>,
    sites: SiteToggles,
    config: MenuConfig,
    issued: parking_lot::Mutex<FxHashMap<TabId, u64>>,
    /// Held while a result is applied to the host, so host calls follow commit order.
    gate: Mutex<Gate>,
}

/// Drives the single menu entry from tab events and the opt-out list.
#[derive(Debug, Clone)]
pub struct MenuStateMachine {
    inner: Arc<MachineInner>,
}

impl MenuStateMachine {
    #[must_use]
    pub fn new(host: Arc<dyn MenuHost>, sites: SiteToggles, config: MenuConfig) -> Self {
        Self {
            inner: Arc::new(MachineInner {
                host,
                sites,
                config,
                issued: parking_lot::Mutex::default(),
                gate: Mutex::default(),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &MenuConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn sites(&self) -> &SiteToggles {
        &self.inner.sites
    }

    /// Removes entries left by a previous run and creates ours, hidden.
    ///
    /// # Errors
    /// Returns the host's [`MenuError`] if any of the calls fails.
    pub async fn install(&self) -> Result<(), MenuError> {
        let mut gate = self.inner.gate.lock().await;
        let id = &self.inner.config.id;

        self.inner.host.remove_all().await?;
        self.inner.host.create(id, MenuContexts::PAGE, &self.inner.config.enabled_label).await?;
        self.inner.host.update(id, &MenuUpdate { visible: false, title: None }).await?;

        gate.shown = MenuState::Hidden;
        debug!(%id, "Menu entry installed");
        Ok(())
    }

    /// Takes the next sequence number for `tab`.
    pub fn begin(&self, tab: TabId) -> Ticket {
        let mut issued = self.inner.issued.lock();
        let seq = issued.entry(tab).or_default();
        *seq += 1;
        Ticket { tab, seq: *seq }
    }

    /// Classifies `url` and, for a qualifying page, looks up its site.
    pub async fn evaluate(&self, url: &str) -> MenuState {
        let config = &self.inner.config;
        if !classify::is_qualifying(url, &config.gitlab_hosts) {
            return MenuState::Hidden;
        }

        if self.inner.sites.is_disabled(url).await {
            MenuState::Disabled { label: config.disabled_label.clone() }
        } else {
            MenuState::Enabled { label: config.enabled_label.clone() }
        }
    }

    /// Marks `tab` as the one the menu reflects.
    pub async fn activate(&self, tab: TabId, url: impl Into<String>) {
        self.inner.gate.lock().await.active = Some(ActiveTab { tab, url: url.into() });
    }

    /// Applies `state` unless a newer result for the tab was already applied or the tab
    /// is no longer active. Returns whether the host now shows `state`.
    pub async fn commit(&self, ticket: Ticket, state: MenuState) -> bool {
        let mut gate = self.inner.gate.lock().await;

        let last = gate.applied.get(&ticket.tab).copied().unwrap_or_default();
        if ticket.seq <= last {
            trace!(tab = %ticket.tab, seq = ticket.seq, last, "Stale menu result discarded");
            return false;
        }
        gate.applied.insert(ticket.tab, ticket.seq);

        if gate.active.as_ref().map(|active| active.tab) != Some(ticket.tab) {
            trace!(tab = %ticket.tab, seq = ticket.seq, "Result for inactive tab discarded");
            return false;
        }
        if gate.shown == state {
            return true;
        }

        let update = MenuUpdate::from(state.visibility());
        if let Err(err) = self.inner.host.update(&self.inner.config.id, &update).await {
            warn!(error = %err, code = err.code(), tab = %ticket.tab, "Menu update failed");
            return false;
        }

        trace!(tab = %ticket.tab, seq = ticket.seq, ?state, "Menu state applied");
        gate.shown = state;
        true
    }

    /// The tab became active or navigated.
    pub async fn on_tab_changed(&self, tab: TabId, url: &str) -> MenuState {
        let ticket = {
            let mut gate = self.inner.gate.lock().await;
            gate.active = Some(ActiveTab { tab, url: url.to_owned() });
            self.begin(tab)
        };
        self.resolve(ticket, url).await
    }

    /// Recomputes the active tab; `None` when no tab is active.
    pub async fn recompute(&self) -> Option<MenuState> {
        let (ticket, url) = {
            let gate = self.inner.gate.lock().await;
            let active = gate.active.clone()?;
            (self.begin(active.tab), active.url)
        };
        Some(self.resolve(ticket, &url).await)
    }

    /// Recomputes if the active tab is on `host`.
    pub async fn on_site_toggled(&self, host: &str) -> Option<MenuState> {
        let active_host = self.active().await.and_then(|(_, url)| host_of(&url).ok());
        if active_host.as_deref() != Some(host) {
            return None;
        }
        self.recompute().await
    }

    /// Drops the sequence state of a closed tab.
    pub async fn forget_tab(&self, tab: TabId) {
        self.inner.issued.lock().remove(&tab);

        let mut gate = self.inner.gate.lock().await;
        gate.applied.remove(&tab);
        if gate.active.as_ref().is_some_and(|active| active.tab == tab) {
            gate.active = None;
        }
    }

    /// What the host currently shows.
    pub async fn current(&self) -> MenuState {
        self.inner.gate.lock().await.shown.clone()
    }

    pub async fn active(&self) -> Option<(TabId, String)> {
        let gate = self.inner.gate.lock().await;
        gate.active.as_ref().map(|active| (active.tab, active.url.clone()))
    }

    async fn resolve(&self, ticket: Ticket, url: &str) -> MenuState {
        let state = self.evaluate(url).await;
        self.commit(ticket, state.clone()).await;
        state
    }
}
