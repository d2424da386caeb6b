//! Persisted configuration keys, grouped by purpose.

// Provider credentials and model choice
pub const AI_PROVIDER: &str = "ai_provider";
pub const OPENAI_API_KEY: &str = "openai_api_key";
pub const OPENAI_MODEL: &str = "openai_model";
pub const ANTHROPIC_API_KEY: &str = "anthropic_api_key";

// Chat relay
pub const SLACK_WEBHOOK_URL: &str = "slack_webhook_url";

// UI
pub const UI_THEME: &str = "ui_theme";
pub const UI_LANGUAGE: &str = "ui_language";
pub const AUTO_SUMMARIZE: &str = "auto_summarize";

// Per-domain opt-out list
pub const DISABLED_SITES: &str = "disabled_sites";

/// Every key the settings surface knows about.
pub const ALL: &[&str] = &[
    AI_PROVIDER,
    OPENAI_API_KEY,
    OPENAI_MODEL,
    ANTHROPIC_API_KEY,
    SLACK_WEBHOOK_URL,
    UI_THEME,
    UI_LANGUAGE,
    AUTO_SUMMARIZE,
    DISABLED_SITES,
];
