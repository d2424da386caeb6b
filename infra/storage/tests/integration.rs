use gpilot_domain::value::{ConfigMap, ConfigValue};
use gpilot_storage::*;
use std::sync::Arc;
use tempfile::TempDir;

fn entry(key: &str, value: impl Into<ConfigValue>) -> ConfigMap {
    ConfigMap::from([(key.to_owned(), value.into())])
}

#[tokio::test]
async fn test_missing_document_loads_empty() {
    let temp = TempDir::new().unwrap();
    let backend = FileBackend::builder().root(temp.path()).connect().await.unwrap();

    assert!(backend.load_all().await.unwrap().is_empty());
    assert!(backend.load(&["ui_theme".to_owned()]).await.unwrap().is_empty());
    assert!(backend.path().ends_with("sync.json"));
}

#[tokio::test]
async fn test_save_merges_keys_and_survives_reconnect() {
    let temp = TempDir::new().unwrap();
    let backend = FileBackend::builder().root(temp.path()).connect().await.unwrap();

    backend.save(entry("ui_theme", "dark")).await.unwrap();
    backend.save(entry("auto_summarize", true)).await.unwrap();
    backend.save(entry("ui_theme", "light")).await.unwrap();

    let reopened = FileBackend::builder().root(temp.path()).connect().await.unwrap();
    let all = reopened.load_all().await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all["ui_theme"], ConfigValue::from("light"));
    assert_eq!(all["auto_summarize"], ConfigValue::from(true));
}

#[tokio::test]
async fn test_areas_are_isolated() {
    let temp = TempDir::new().unwrap();
    let sync = FileBackend::builder().root(temp.path()).area("sync").connect().await.unwrap();
    let local = FileBackend::builder().root(temp.path()).area("local").connect().await.unwrap();

    sync.save(entry("ui_language", "uk")).await.unwrap();
    assert!(local.load_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_area_rejected() {
    let temp = TempDir::new().unwrap();
    let err = FileBackend::builder().root(temp.path()).area("../up").connect().await.unwrap_err();
    assert!(matches!(err, StorageError::InvalidArea { .. }));
}

#[tokio::test]
async fn test_missing_root_without_create_fails() {
    let temp = TempDir::new().unwrap();
    let err = FileBackend::builder()
        .root(temp.path().join("absent"))
        .create(false)
        .connect()
        .await
        .unwrap_err();
    assert_eq!(err.code(), "io");
}

#[tokio::test]
async fn test_corrupted_document_is_reported() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("sync.json"), b"{ not json").unwrap();
    let backend = FileBackend::builder().root(temp.path()).connect().await.unwrap();

    let err = backend.load_all().await.unwrap_err();
    assert!(matches!(err, StorageError::Serialization { .. }));
}

#[tokio::test]
async fn test_concurrent_saves_keep_every_key() {
    let temp = TempDir::new().unwrap();
    let backend: Arc<dyn PersistenceBackend> =
        Arc::new(FileBackend::builder().root(temp.path()).connect().await.unwrap());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let backend = Arc::clone(&backend);
            tokio::spawn(async move { backend.save(entry(&format!("key_{i}"), i % 2 == 0)).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(backend.load_all().await.unwrap().len(), 8);
    let leftovers = std::fs::read_dir(temp.path()).unwrap().count();
    assert_eq!(leftovers, 1, "only the document should remain");
}

#[tokio::test]
async fn test_save_ignores_temp_files_held_by_other_writers() {
    let temp = TempDir::new().unwrap();
    for name in ["sync.json.gpilottmp.1", "sync.json.gpilottmp.2", "sync.json.gpilottmp.1.abc.1"] {
        std::fs::write(temp.path().join(name), b"{}").unwrap();
    }

    let backend = FileBackend::builder().root(temp.path()).connect().await.unwrap();
    backend.save(entry("ui_theme", "dark")).await.unwrap();

    let all = backend.load_all().await.unwrap();
    assert_eq!(all["ui_theme"], ConfigValue::from("dark"));
    // fresh temp files of other writers are not ours to remove
    assert!(temp.path().join("sync.json.gpilottmp.1").exists());
}

#[tokio::test]
async fn test_two_handles_on_one_document_both_write() {
    let temp = TempDir::new().unwrap();
    let first = FileBackend::builder().root(temp.path()).connect().await.unwrap();
    let second = FileBackend::builder().root(temp.path()).connect().await.unwrap();

    first.save(entry("ui_theme", "dark")).await.unwrap();
    second.save(entry("auto_summarize", true)).await.unwrap();

    let all = first.load_all().await.unwrap();
    assert_eq!(all["ui_theme"], ConfigValue::from("dark"));
    assert_eq!(all["auto_summarize"], ConfigValue::from(true));
}
