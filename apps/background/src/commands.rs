use crate::cli::Command;
use anyhow::Context;
use gpilot::domain::config::AppConfig;
use gpilot::domain::menu::TabId;
use gpilot::domain::settings::Settings;
use gpilot::domain::value::ConfigMap;
use gpilot::features::controller::{Controller, actions};
use gpilot::features::menu::MemoryMenuHost;
use gpilot::features::settings::DebouncedWriter;
use gpilot::features::settings::entries::parse_assignment;
use gpilot::messaging::Outbox;
use serde_json::{Value, json};
use std::io::{self, Write};
use std::time::Duration;
use tracing::debug;

/// The tab the CLI pretends is focused.
const CLI_TAB: TabId = TabId(1);
const MASK: &str = "********";

/// One CLI invocation against a running background context.
#[derive(Debug)]
pub(crate) struct Session {
    pub(crate) config: AppConfig,
    pub(crate) controller: Controller,
    pub(crate) host: MemoryMenuHost,
    pub(crate) page: Outbox,
}

impl Session {
    pub(crate) async fn run(&self, command: Command) -> anyhow::Result<()> {
        let output = match command {
            Command::Visit { url, tab } => self.visit(TabId(tab), &url).await,
            Command::Toggle { url } => {
                self.controller.menu().on_tab_changed(CLI_TAB, &url).await;
                let toggled = self.page.call(actions::TOGGLE_SITE, json!({ "url": url })).await?;
                json!({ "toggled": toggled, "menu": self.menu_entry() })
            },
            Command::Status { url } => self.page.call(actions::IS_SITE_DISABLED, json!({ "url": url })).await?,
            Command::Sites => self.page.call(actions::LIST_DISABLED_SITES, json!({})).await?,
            Command::Get { keys } => self.get(&keys).await?,
            Command::Set { assignments } => self.set(&assignments).await?,
            Command::Call { action, payload } => {
                let payload: Value = serde_json::from_str(&payload).context("Payload is not JSON")?;
                self.page.request(action, payload).await?
            },
        };
        print(&output)
    }

    async fn visit(&self, tab: TabId, url: &str) -> Value {
        let state = self.controller.menu().on_tab_changed(tab, url).await;
        json!({ "tab": tab, "state": state, "menu": self.menu_entry() })
    }

    fn menu_entry(&self) -> Value {
        self.host.entry(&self.config.menu.id).map_or(Value::Null, |entry| {
            json!({ "visible": entry.visible, "title": entry.title })
        })
    }

    async fn get(&self, keys: &[String]) -> anyhow::Result<Value> {
        let mut resolved = if keys.is_empty() {
            self.page.call(actions::GET_SETTINGS, json!({})).await?
        } else {
            let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
            let map = self.controller.store().get(&keys, &Settings::defaults()).await;
            serde_json::to_value(map)?
        };

        if let Some(object) = resolved.as_object_mut() {
            for (key, value) in object.iter_mut() {
                if key.ends_with("_api_key") && value.as_str().is_some_and(|v| !v.is_empty()) {
                    *value = json!(MASK);
                }
            }
        }
        Ok(resolved)
    }

    /// Writes through the debounced writer, as the settings UI does.
    async fn set(&self, assignments: &[String]) -> anyhow::Result<Value> {
        let mut entries = assignments
            .iter()
            .map(String::as_str)
            .map(parse_assignment)
            .collect::<Result<ConfigMap, _>>()?;
        self.controller.sites().normalize_entries(&mut entries);
        let keys: Vec<String> = entries.keys().cloned().collect();

        let writer = DebouncedWriter::spawn(
            self.controller.store().clone(),
            Duration::from_millis(self.config.settings.debounce_ms),
        );
        for (key, value) in entries {
            writer.stage(ConfigMap::from([(key, value)]));
        }
        writer.close().await;
        debug!(?keys, "Settings written");
        Ok(json!({ "written": keys }))
    }
}

fn print(value: &Value) -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", serde_json::to_string_pretty(value)?)?;
    Ok(())
}
