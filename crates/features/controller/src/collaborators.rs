//! Outside collaborators the controller hands opaque payloads to.
//!
//! The webhook and AI-provider calls themselves live in the host; the controller only
//! checks that the user configured them and passes the payload through.

use crate::error::ControllerError;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::fmt::{self, Debug};
use std::sync::Arc;

/// Posts a message to the user's chat webhook.
#[async_trait]
pub trait ChatRelay: Send + Sync + Debug {
    async fn relay(&self, webhook_url: &str, payload: Value) -> Result<Value, ControllerError>;
}

/// One AI request, with the provider settings resolved.
#[derive(Clone, Serialize)]
pub struct AiRequest {
    pub request_id: String,
    pub provider: String,
    pub model: String,
    #[serde(skip)]
    pub api_key: String,
    pub payload: Value,
}

impl fmt::Debug for AiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AiRequest")
            .field("request_id", &self.request_id)
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

#[async_trait]
pub trait AiProvider: Send + Sync + Debug {
    async fn complete(&self, request: AiRequest) -> Result<Value, ControllerError>;
}

/// Stand-in for hosts without network collaborators; every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct Offline;

#[async_trait]
impl ChatRelay for Offline {
    async fn relay(&self, _webhook_url: &str, _payload: Value) -> Result<Value, ControllerError> {
        Err(ControllerError::Collaborator { message: "chat relay unavailable".into(), context: None })
    }
}

#[async_trait]
impl AiProvider for Offline {
    async fn complete(&self, request: AiRequest) -> Result<Value, ControllerError> {
        Err(ControllerError::Collaborator {
            message: "AI provider unavailable".into(),
            context: Some(request.provider.into()),
        })
    }
}

/// The capabilities the host supplies.
#[derive(Debug, Clone)]
pub struct Collaborators {
    pub menu_host: Arc<dyn gpilot_menu::MenuHost>,
    pub chat: Arc<dyn ChatRelay>,
    pub ai: Arc<dyn AiProvider>,
}

impl Collaborators {
    /// `menu_host` with offline chat and AI.
    #[must_use]
    pub fn offline(menu_host: Arc<dyn gpilot_menu::MenuHost>) -> Self {
        Self { menu_host, chat: Arc::new(Offline), ai: Arc::new(Offline) }
    }
}
