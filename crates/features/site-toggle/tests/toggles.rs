use gpilot_domain::keys::DISABLED_SITES;
use gpilot_domain::value::{ConfigMap, ConfigValue};
use gpilot_settings::ConfigStore;
use gpilot_site_toggle::SiteToggles;
use gpilot_storage::{MemoryBackend, UnavailableBackend};
use proptest::prelude::*;
use std::sync::Arc;

fn toggles(max_disabled: usize) -> (SiteToggles, MemoryBackend) {
    let backend = MemoryBackend::new();
    let store = ConfigStore::connect(Arc::new(backend.clone()), None);
    (SiteToggles::with_store(store, max_disabled), backend)
}

#[tokio::test]
async fn test_toggle_disables_then_reenables() {
    let (sites, _) = toggles(500);
    let url = "https://gitlab.example.com/-/issues/42";

    assert!(!sites.is_disabled(url).await);
    assert!(sites.toggle(url).await.unwrap());
    assert!(sites.is_disabled(url).await);
    assert!(sites.is_disabled("https://gitlab.example.com/other/path").await);

    assert!(!sites.toggle(url).await.unwrap());
    assert!(!sites.is_disabled(url).await);
    assert!(sites.disabled_sites().await.is_empty());
}

#[tokio::test]
async fn test_hosts_are_compared_exactly() {
    let (sites, _) = toggles(500);
    sites.toggle("https://gitlab.com/a").await.unwrap();

    assert!(sites.is_disabled("https://GITLAB.com/b").await);
    assert!(!sites.is_disabled("https://www.gitlab.com/a").await);
    assert!(!sites.is_disabled("https://gitlab.company.io/a").await);
}

#[tokio::test]
async fn test_invalid_urls_are_enabled_and_rejected_by_toggle() {
    let (sites, backend) = toggles(500);

    assert!(!sites.is_disabled("not a url").await);
    let err = sites.toggle("not a url").await.unwrap_err();
    assert_eq!(err.code(), "invalid_url");
    assert!(backend.snapshot().is_empty());
}

#[tokio::test]
async fn test_list_is_stored_oldest_first() {
    let (sites, backend) = toggles(500);
    for host in ["a.example", "b.example", "c.example"] {
        sites.toggle(&format!("https://{host}/")).await.unwrap();
    }
    sites.toggle("https://b.example/").await.unwrap();

    assert_eq!(
        backend.snapshot()[DISABLED_SITES],
        ConfigValue::List(vec!["a.example".into(), "c.example".into()])
    );
}

#[tokio::test]
async fn test_full_list_evicts_oldest_entries() {
    let (sites, _) = toggles(2);
    for host in ["a.example", "b.example", "c.example"] {
        sites.toggle(&format!("https://{host}/")).await.unwrap();
    }

    assert_eq!(sites.disabled_sites().await, vec!["b.example".to_owned(), "c.example".to_owned()]);
    assert!(!sites.is_disabled("https://a.example/").await);
}

#[tokio::test]
async fn test_duplicate_entries_are_collapsed() {
    let backend = MemoryBackend::with_entries(ConfigMap::from([(
        DISABLED_SITES.to_owned(),
        ConfigValue::List(vec!["a.example".into(), "a.example".into(), "b.example".into()]),
    )]));
    let sites = SiteToggles::with_store(ConfigStore::connect(Arc::new(backend.clone()), None), 500);

    assert_eq!(sites.disabled_sites().await, vec!["a.example".to_owned(), "b.example".to_owned()]);
    assert!(!sites.toggle("https://a.example/").await.unwrap());
    assert!(!sites.is_disabled("https://a.example/").await);
}

#[tokio::test]
async fn test_list_written_elsewhere_is_read_in_normal_form() {
    let backend = MemoryBackend::with_entries(ConfigMap::from([(
        DISABLED_SITES.to_owned(),
        ConfigValue::List(vec!["GitLab.Example.com".into(), " a.example".into(), "b.example".into()]),
    )]));
    let sites = SiteToggles::with_store(ConfigStore::connect(Arc::new(backend), None), 2);

    assert_eq!(sites.disabled_sites().await, vec!["a.example".to_owned(), "b.example".to_owned()]);
    assert!(sites.is_disabled("https://a.example/x").await);
    assert!(sites.is_host_disabled("B.Example").await);
}

#[tokio::test]
async fn test_unreachable_persistence_reads_as_enabled() {
    let store = ConfigStore::connect(Arc::new(UnavailableBackend::new("offline")), None);
    let sites = SiteToggles::with_store(store, 500);

    assert!(!sites.is_disabled("https://gitlab.com/").await);
    // The write is dropped, but the call still completes with the computed state.
    assert!(sites.toggle("https://gitlab.com/").await.unwrap());
}

proptest! {
    #[test]
    fn test_toggling_twice_restores_the_list(
        existing in proptest::collection::vec("[a-z]{1,8}\\.(com|io|dev)", 0..6),
        host in "[a-z]{1,8}\\.(com|io|dev)",
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        runtime.block_on(async {
            let (sites, _) = toggles(500);
            for h in &existing {
                if !sites.is_host_disabled(h).await {
                    sites.toggle(&format!("https://{h}/")).await.unwrap();
                }
            }
            let before = sites.disabled_sites().await;
            let url = format!("https://{host}/merge_requests/7");

            let first = sites.toggle(&url).await.unwrap();
            let second = sites.toggle(&url).await.unwrap();

            prop_assert_ne!(first, second);
            let mut after = sites.disabled_sites().await;
            let mut expected = before;
            after.sort();
            expected.sort();
            prop_assert_eq!(after, expected);
            Ok(())
        })?;
    }
}
