use crate::keys;
use crate::value::{ConfigMap, ConfigValue};
use serde::{Deserialize, Serialize};

pub const DEFAULT_AI_PROVIDER: &str = "openai";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_UI_THEME: &str = "system";
pub const DEFAULT_UI_LANGUAGE: &str = "en";

/// Typed view over the persisted configuration entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub ai_provider: String,
    pub openai_api_key: String,
    pub openai_model: String,
    pub anthropic_api_key: String,
    pub slack_webhook_url: String,
    pub ui_theme: String,
    pub ui_language: String,
    pub auto_summarize: bool,
    pub disabled_sites: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ai_provider: DEFAULT_AI_PROVIDER.to_owned(),
            openai_api_key: String::new(),
            openai_model: DEFAULT_OPENAI_MODEL.to_owned(),
            anthropic_api_key: String::new(),
            slack_webhook_url: String::new(),
            ui_theme: DEFAULT_UI_THEME.to_owned(),
            ui_language: DEFAULT_UI_LANGUAGE.to_owned(),
            auto_summarize: false,
            disabled_sites: Vec::new(),
        }
    }
}

impl Settings {
    /// Declared defaults for every known key.
    #[must_use]
    pub fn defaults() -> ConfigMap {
        Self::default().to_map()
    }

    /// Builds settings from resolved entries; keys of the wrong shape keep their default.
    #[must_use]
    pub fn from_map(map: &ConfigMap) -> Self {
        let mut settings = Self::default();
        let text = |key: &str, slot: &mut String| {
            if let Some(value) = map.get(key).and_then(ConfigValue::as_str) {
                value.clone_into(slot);
            }
        };

        text(keys::AI_PROVIDER, &mut settings.ai_provider);
        text(keys::OPENAI_API_KEY, &mut settings.openai_api_key);
        text(keys::OPENAI_MODEL, &mut settings.openai_model);
        text(keys::ANTHROPIC_API_KEY, &mut settings.anthropic_api_key);
        text(keys::SLACK_WEBHOOK_URL, &mut settings.slack_webhook_url);
        text(keys::UI_THEME, &mut settings.ui_theme);
        text(keys::UI_LANGUAGE, &mut settings.ui_language);

        if let Some(flag) = map.get(keys::AUTO_SUMMARIZE).and_then(ConfigValue::as_bool) {
            settings.auto_summarize = flag;
        }
        if let Some(sites) = map.get(keys::DISABLED_SITES).and_then(ConfigValue::as_list) {
            settings.disabled_sites = sites.to_vec();
        }

        settings
    }

    #[must_use]
    pub fn to_map(&self) -> ConfigMap {
        ConfigMap::from([
            (keys::AI_PROVIDER.to_owned(), self.ai_provider.as_str().into()),
            (keys::OPENAI_API_KEY.to_owned(), self.openai_api_key.as_str().into()),
            (keys::OPENAI_MODEL.to_owned(), self.openai_model.as_str().into()),
            (keys::ANTHROPIC_API_KEY.to_owned(), self.anthropic_api_key.as_str().into()),
            (keys::SLACK_WEBHOOK_URL.to_owned(), self.slack_webhook_url.as_str().into()),
            (keys::UI_THEME.to_owned(), self.ui_theme.as_str().into()),
            (keys::UI_LANGUAGE.to_owned(), self.ui_language.as_str().into()),
            (keys::AUTO_SUMMARIZE.to_owned(), self.auto_summarize.into()),
            (keys::DISABLED_SITES.to_owned(), self.disabled_sites.clone().into()),
        ])
    }

    /// The configured chat webhook, if any.
    #[must_use]
    pub fn chat_webhook(&self) -> Option<&str> {
        let url = self.slack_webhook_url.trim();
        (!url.is_empty()).then_some(url)
    }

    /// API key for the selected provider, if one is configured.
    #[must_use]
    pub fn provider_key(&self) -> Option<&str> {
        let key = match self.ai_provider.as_str() {
            "anthropic" => &self.anthropic_api_key,
            _ => &self.openai_api_key,
        };
        (!key.trim().is_empty()).then_some(key.as_str())
    }
}
