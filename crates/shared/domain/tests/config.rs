use gpilot_domain::config::{AppConfig, MenuConfig, MessagingConfig, SitesConfig, StorageConfig};
use serde_json::json;

#[test]
fn config_defaults_are_sane() {
    let storage = StorageConfig::default();
    assert_eq!(storage.area, "sync");
    assert!(!storage.in_memory);

    assert_eq!(SitesConfig::default().max_disabled, 500);

    let messaging = MessagingConfig::default();
    assert_eq!(messaging.reply_timeout_ms, 30_000);
    assert_eq!(messaging.inbox_capacity, 64);

    let menu = MenuConfig::default();
    assert_ne!(menu.enabled_label, menu.disabled_label);
    assert!(menu.gitlab_hosts.is_empty());
}

#[test]
fn app_config_deserializes_partial_sections() {
    let raw = json!({
        "storage": { "data_dir": "/tmp/gpilot", "in_memory": true },
        "sites": { "max_disabled": 3 },
        "menu": { "gitlab_hosts": ["code.example.org"] }
    });

    let cfg: AppConfig = serde_json::from_value(raw).expect("config deserialize");
    assert_eq!(cfg.storage.data_dir, std::path::PathBuf::from("/tmp/gpilot"));
    assert_eq!(cfg.storage.area, "sync");
    assert!(cfg.storage.in_memory);
    assert_eq!(cfg.sites.max_disabled, 3);
    assert_eq!(cfg.menu.gitlab_hosts, vec!["code.example.org".to_owned()]);
    assert_eq!(cfg.settings.debounce_ms, 1_000);
}

#[test]
fn cloned_config_is_copy_on_write() {
    let original = AppConfig::default();
    let mut changed = original.clone();
    changed.sites.max_disabled = 10;

    assert_eq!(original.sites.max_disabled, 500);
    assert_eq!(changed.sites.max_disabled, 10);
}
