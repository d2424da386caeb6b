//! Request handlers of the background context.

use crate::collaborators::AiRequest;
use crate::controller::Controller;
use crate::error::ControllerError;
use gpilot_kernel::safe_nanoid;
use gpilot_messaging::{Disposition, HandlerError, Message, Router};
use gpilot_settings::{WriteOutcome, entries::entries_from_json};
use gpilot_site_toggle::host_of;
use serde_json::{Value, json};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};

/// Action tags answered by the background context.
pub mod actions {
    pub const GET_SETTINGS: &str = "get_settings";
    pub const SAVE_SETTINGS: &str = "save_settings";
    pub const IS_SITE_DISABLED: &str = "is_site_disabled";
    pub const TOGGLE_SITE: &str = "toggle_site";
    pub const LIST_DISABLED_SITES: &str = "list_disabled_sites";
    pub const GET_MENU_STATE: &str = "get_menu_state";
    pub const RELAY_TO_CHAT: &str = "relay_to_chat";
    pub const ASK_AI: &str = "ask_ai";
}

impl Controller {
    /// Registers every background action on `router`.
    pub fn register(&self, router: &Router) {
        self.route(router, actions::GET_SETTINGS, |c, _| async move { c.settings_json().await });
        self.route(router, actions::SAVE_SETTINGS, |c, msg| async move { c.save_settings(&msg.payload).await });
        self.route(router, actions::IS_SITE_DISABLED, |c, msg| async move {
            let url = required_str(&msg, "url")?;
            Ok(json!({ "disabled": c.sites.is_disabled(url).await }))
        });
        self.route(router, actions::TOGGLE_SITE, |c, msg| async move {
            let url = required_str(&msg, "url")?;
            c.toggle_site(url).await
        });
        self.route(router, actions::LIST_DISABLED_SITES, |c, _| async move {
            Ok(json!({ "sites": c.sites.disabled_sites().await }))
        });
        self.route(router, actions::GET_MENU_STATE, |c, _| async move { Ok(c.menu_state().await) });
        self.route(router, actions::RELAY_TO_CHAT, |c, msg| async move { c.relay_to_chat(msg.payload.clone()).await });

        // Replies from a task of its own once the provider answers.
        let this = self.clone();
        router.on(actions::ASK_AI, move |message, responder| {
            let this = this.clone();
            tokio::spawn(async move {
                let sent = match this.ask_ai(message.payload.clone()).await {
                    Ok(data) => responder.ok(data),
                    Err(err) => responder.fail(&HandlerError::from(err)),
                };
                if let Err(err) = sent {
                    debug!(error = %err, "AI reply discarded");
                }
            });
            Ok(Disposition::Deferred)
        });
    }

    fn route<F, Fut>(&self, router: &Router, action: &'static str, handler: F)
    where
        F: Fn(Self, Arc<Message>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ControllerError>> + Send + 'static,
    {
        let this = self.clone();
        router.on_async(action, move |message| {
            let pending = handler(this.clone(), message);
            async move { pending.await.map_err(HandlerError::from) }
        });
    }

    /// The typed settings, defaults filled in.
    ///
    /// # Errors
    /// Returns [`ControllerError::Internal`] if the settings do not serialize.
    pub async fn settings_json(&self) -> Result<Value, ControllerError> {
        let settings = self.store.load_settings().await;
        serde_json::to_value(settings)
            .map_err(|e| ControllerError::Internal { message: e.to_string().into(), context: None })
    }

    /// Validates and writes a settings object. A `disabled_sites` list is stored in
    /// normal form.
    ///
    /// # Errors
    /// Returns [`ControllerError::Settings`] for unknown keys or mistyped values.
    pub async fn save_settings(&self, payload: &Value) -> Result<Value, ControllerError> {
        let mut entries = entries_from_json(payload)?;
        self.sites.normalize_entries(&mut entries);
        let outcome = self.store.set(entries).await;
        Ok(json!({ "persisted": outcome == WriteOutcome::Persisted }))
    }

    /// Toggles the site of `url` and refreshes the menu if that site is showing.
    ///
    /// # Errors
    /// Returns [`ControllerError::Site`] if `url` has no parseable host.
    pub async fn toggle_site(&self, url: &str) -> Result<Value, ControllerError> {
        let host = host_of(url)?;
        let disabled = self.sites.toggle(url).await?;
        self.menu.on_site_toggled(&host).await;
        Ok(json!({ "host": host, "disabled": disabled }))
    }

    pub async fn menu_state(&self) -> Value {
        let active = self.menu.active().await.map(|(tab, url)| json!({ "tab": tab, "url": url }));
        let current = self.menu.current().await;
        json!({ "menu": current, "visibility": current.visibility(), "active": active })
    }

    /// Hands `payload` to the chat relay.
    ///
    /// # Errors
    /// Returns [`ControllerError::NotConfigured`] without a webhook URL, or the relay's
    /// own error.
    pub async fn relay_to_chat(&self, payload: Value) -> Result<Value, ControllerError> {
        let settings = self.store.load_settings().await;
        let Some(webhook) = settings.chat_webhook() else {
            return Err(ControllerError::NotConfigured {
                message: "no chat webhook URL".into(),
                context: Some("slack_webhook_url".into()),
            });
        };
        self.chat.relay(webhook, payload).await
    }

    /// Hands `payload` to the selected AI provider.
    ///
    /// # Errors
    /// Returns [`ControllerError::NotConfigured`] without an API key for the selected
    /// provider, or the provider's own error.
    pub async fn ask_ai(&self, payload: Value) -> Result<Value, ControllerError> {
        let settings = self.store.load_settings().await;
        let Some(api_key) = settings.provider_key() else {
            return Err(ControllerError::NotConfigured {
                message: "no API key for the selected provider".into(),
                context: Some(settings.ai_provider.clone().into()),
            });
        };

        let request = AiRequest {
            request_id: safe_nanoid!(),
            provider: settings.ai_provider.clone(),
            model: settings.openai_model.clone(),
            api_key: api_key.to_owned(),
            payload,
        };
        let request_id = request.request_id.clone();
        info!(%request_id, provider = %request.provider, "AI request");

        let result = self.ai.complete(request).await?;
        Ok(json!({ "request_id": request_id, "result": result }))
    }
}

fn required_str<'a>(message: &'a Message, field: &'static str) -> Result<&'a str, ControllerError> {
    message.str_field(field).ok_or_else(|| ControllerError::InvalidPayload {
        message: format!("missing string field `{field}`").into(),
        context: Some(message.action.clone().into()),
    })
}
