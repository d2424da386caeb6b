//! Background event loop: tab, menu and configuration events drive the menu entry.

use crate::controller::Controller;
use crate::error::ControllerError;
use gpilot_domain::events::{ConfigChanged, MenuClicked, TabChanged, TabClosed};
use gpilot_domain::keys::DISABLED_SITES;
use gpilot_messaging::{EventReceiverExt, Router, Transport};
use gpilot_site_toggle::host_of;
use std::sync::Arc;
use tokio::sync::broadcast::Receiver;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

/// Taken before the loop is spawned, so no event published after `start` is missed.
#[derive(Debug)]
struct Subscriptions {
    tabs: Receiver<Arc<TabChanged>>,
    closed: Receiver<Arc<TabClosed>>,
    clicks: Receiver<Arc<MenuClicked>>,
    config: Receiver<Arc<ConfigChanged>>,
}

impl Controller {
    /// Installs the menu entry and spawns the event loop. The loop ends when the bus
    /// shuts down.
    ///
    /// # Errors
    /// Returns [`ControllerError::Menu`] if the host rejects the entry and
    /// [`ControllerError::Messaging`] if subscribing fails.
    pub async fn start(&self) -> Result<JoinHandle<()>, ControllerError> {
        self.menu().install().await?;

        let bus = self.bus();
        let subscriptions = Subscriptions {
            tabs: bus.subscribe()?,
            closed: bus.subscribe()?,
            clicks: bus.subscribe()?,
            config: bus.subscribe()?,
        };

        let this = self.clone();
        Ok(tokio::spawn(async move { this.run(subscriptions).await }))
    }

    /// Connects to `transport` as the `background` context and serves requests.
    pub fn serve(&self, transport: &Transport) -> JoinHandle<()> {
        let (inbox, _) = transport.connect("background");
        let router = Router::new("background");
        self.register(&router);
        tokio::spawn(async move { router.serve(inbox).await })
    }

    async fn run(self, mut subs: Subscriptions) {
        info!("Background event loop started");
        loop {
            tokio::select! {
                Some(event) = EventReceiverExt::recv(&mut subs.tabs) => {
                    self.menu().on_tab_changed(event.tab, &event.url).await;
                },
                Some(event) = EventReceiverExt::recv(&mut subs.closed) => {
                    self.menu().forget_tab(event.tab).await;
                },
                Some(event) = EventReceiverExt::recv(&mut subs.clicks) => {
                    self.on_menu_clicked(&event).await;
                },
                Some(event) = EventReceiverExt::recv(&mut subs.config) => {
                    if event.touches(DISABLED_SITES) {
                        self.menu().recompute().await;
                    }
                },
                else => break,
            }
        }
        debug!("Background event loop stopped");
    }

    async fn on_menu_clicked(&self, click: &MenuClicked) {
        if click.menu_id != self.menu().config().id {
            trace!(menu_id = %click.menu_id, "Click on a foreign menu entry");
            return;
        }

        match self.sites().toggle(&click.url).await {
            Ok(disabled) => {
                if let Ok(host) = host_of(&click.url) {
                    self.menu().on_site_toggled(&host).await;
                }
                info!(tab = %click.tab, disabled, "Site toggled from the menu");
            },
            Err(err) => debug!(error = %err, tab = %click.tab, "Menu click on an unparseable page"),
        }
    }
}
