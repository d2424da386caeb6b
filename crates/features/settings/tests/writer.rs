use async_trait::async_trait;
use gpilot_domain::value::{ConfigMap, ConfigValue};
use gpilot_settings::{ConfigStore, DebouncedWriter};
use gpilot_storage::{MemoryBackend, PersistenceBackend, StorageError};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Memory backend that counts writes.
#[derive(Debug, Default)]
struct CountingBackend {
    inner: MemoryBackend,
    saves: AtomicUsize,
}

#[async_trait]
impl PersistenceBackend for CountingBackend {
    async fn load(&self, keys: &[String]) -> Result<ConfigMap, StorageError> {
        self.inner.load(keys).await
    }

    async fn load_all(&self) -> Result<ConfigMap, StorageError> {
        self.inner.load_all().await
    }

    async fn save(&self, entries: ConfigMap) -> Result<(), StorageError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(entries).await
    }
}

fn edit(key: &str, value: &str) -> ConfigMap {
    ConfigMap::from([(key.to_owned(), ConfigValue::from(value))])
}

fn setup() -> (Arc<CountingBackend>, DebouncedWriter) {
    let backend = Arc::new(CountingBackend::default());
    let store = ConfigStore::connect(backend.clone(), None);
    (backend, DebouncedWriter::spawn(store, Duration::from_millis(1000)))
}

#[tokio::test(start_paused = true)]
async fn burst_of_edits_collapses_into_one_write() {
    let (backend, writer) = setup();

    writer.stage(edit("ui_theme", "dark"));
    tokio::time::sleep(Duration::from_millis(300)).await;
    writer.stage(edit("ui_language", "uk"));
    tokio::time::sleep(Duration::from_millis(300)).await;
    writer.stage(edit("ui_theme", "light"));

    tokio::time::sleep(Duration::from_millis(900)).await;
    assert_eq!(backend.saves.load(Ordering::SeqCst), 0, "still inside the quiet window");

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(backend.saves.load(Ordering::SeqCst), 1);

    let stored = backend.inner.snapshot();
    assert_eq!(stored["ui_theme"], ConfigValue::from("light"));
    assert_eq!(stored["ui_language"], ConfigValue::from("uk"));
}

#[tokio::test(start_paused = true)]
async fn flush_writes_immediately() {
    let (backend, writer) = setup();

    writer.stage(edit("ui_theme", "dark"));
    writer.flush().await;
    assert_eq!(backend.saves.load(Ordering::SeqCst), 1);

    writer.flush().await;
    assert_eq!(backend.saves.load(Ordering::SeqCst), 1, "nothing pending, nothing written");
}

#[tokio::test(start_paused = true)]
async fn closing_persists_pending_edits() {
    let (backend, writer) = setup();

    writer.stage(edit("openai_model", "gpt-4o"));
    writer.close().await;

    assert_eq!(backend.saves.load(Ordering::SeqCst), 1);
    assert_eq!(backend.inner.snapshot()["openai_model"], ConfigValue::from("gpt-4o"));
}
