use crate::collaborators::{AiProvider, ChatRelay, Collaborators};
use gpilot_domain::config::AppConfig;
use gpilot_menu::MenuStateMachine;
use gpilot_messaging::EventBus;
use gpilot_settings::ConfigStore;
use gpilot_site_toggle::SiteToggles;
use gpilot_storage::PersistenceBackend;
use std::sync::Arc;

/// The long-lived background context: owns the menu entry and answers requests from
/// page scripts and the settings UI.
#[gpilot_derive::gpilot_slice]
pub struct Controller {
    pub(crate) store: ConfigStore,
    pub(crate) sites: SiteToggles,
    pub(crate) menu: MenuStateMachine,
    pub(crate) bus: EventBus,
    pub(crate) chat: Arc<dyn ChatRelay>,
    pub(crate) ai: Arc<dyn AiProvider>,
}

impl Controller {
    /// Wires the feature slices over one persistence backend. Writes through the store
    /// are announced on `bus`.
    #[must_use]
    pub fn assemble(
        config: &AppConfig,
        backend: Arc<dyn PersistenceBackend>,
        bus: EventBus,
        collaborators: Collaborators,
    ) -> Self {
        let store = ConfigStore::connect(backend, Some(bus.clone()));
        let sites = SiteToggles::with_store(store.clone(), config.sites.max_disabled);
        let menu = MenuStateMachine::new(collaborators.menu_host, sites.clone(), config.menu.clone());

        Self::new(ControllerInner {
            store,
            sites,
            menu,
            bus,
            chat: collaborators.chat,
            ai: collaborators.ai,
        })
    }

    #[must_use]
    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    #[must_use]
    pub fn sites(&self) -> &SiteToggles {
        &self.sites
    }

    #[must_use]
    pub fn menu(&self) -> &MenuStateMachine {
        &self.menu
    }

    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }
}
