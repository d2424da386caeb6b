use crate::store::ConfigStore;
use gpilot_domain::value::ConfigMap;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, trace};

#[derive(Debug)]
enum Command {
    Stage(ConfigMap),
    Flush(oneshot::Sender<()>),
}

/// Collapses bursts of edits into one write.
///
/// Staged entries merge key by key; the write happens once no edit arrived for the
/// debounce interval, so consecutive writes are at least that far apart. Dropping the
/// writer still persists pending edits.
#[derive(Debug)]
pub struct DebouncedWriter {
    commands: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

impl DebouncedWriter {
    /// Spawns the writer task on the current runtime.
    #[must_use]
    pub fn spawn(store: ConfigStore, interval: Duration) -> Self {
        let (commands, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(store, interval, rx));
        Self { commands, task }
    }

    pub fn stage(&self, entries: ConfigMap) {
        if self.commands.send(Command::Stage(entries)).is_err() {
            debug!("Writer task gone; edit dropped");
        }
    }

    /// Writes pending edits now and waits for completion.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.commands.send(Command::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }

    /// Flushes pending edits and stops the task.
    pub async fn close(self) {
        let Self { commands, task } = self;
        drop(commands);
        let _ = task.await;
    }
}

async fn run(store: ConfigStore, interval: Duration, mut rx: mpsc::UnboundedReceiver<Command>) {
    let mut pending = ConfigMap::new();
    let mut deadline: Option<Instant> = None;

    loop {
        let due = deadline;
        let timer = async move {
            match due {
                Some(at) => sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            command = rx.recv() => match command {
                Some(Command::Stage(entries)) => {
                    pending.extend(entries);
                    deadline = Some(Instant::now() + interval);
                    trace!(pending = pending.len(), "Edit staged");
                },
                Some(Command::Flush(done)) => {
                    write(&store, &mut pending).await;
                    deadline = None;
                    let _ = done.send(());
                },
                None => {
                    write(&store, &mut pending).await;
                    break;
                },
            },
            () = timer => {
                write(&store, &mut pending).await;
                deadline = None;
            },
        }
    }
}

async fn write(store: &ConfigStore, pending: &mut ConfigMap) {
    if pending.is_empty() {
        return;
    }
    let entries = std::mem::take(pending);
    debug!(keys = entries.len(), "Writing debounced settings");
    store.set(entries).await;
}
