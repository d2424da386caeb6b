//! # Runtime
//!
//! Tokio runtime profiles for the execution contexts of the extension.
//!
//! Every context (background controller, page script, settings UI) runs its own
//! cooperative event loop; the [`RuntimeConfig::cooperative`] profile builds exactly
//! that: a current-thread scheduler. The multi-thread profile exists for hosts that
//! simulate several contexts inside one process.
//!
//! ## Example
//!
//! ```rust,ignore
//! #[gpilot_runtime::main(cooperative)]
//! async fn main() -> anyhow::Result<()> {
//!     Ok(())
//! }
//! ```

pub use anyhow::Result;
pub use gpilot_derive::main;

use anyhow::anyhow;
use std::{thread::available_parallelism, time::Duration};
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

const DEFAULT_WORKER_THREADS: usize = 4;
const MAX_WORKER_THREADS: usize = 256;
/// 2 `MiB`.
const DEFAULT_STACK_SIZE: usize = 2 * 1024 * 1024;
const MIN_STACK_SIZE: usize = 1024 * 1024;
const MAX_STACK_SIZE: usize = 16 * 1024 * 1024;
const THREAD_KEEP_ALIVE: Duration = Duration::from_secs(60);
const DEFAULT_THREAD_NAME: &str = "gpilot-worker";

/// Scheduler flavor of the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    /// One thread drives every task; tasks interleave only at `.await` points.
    CurrentThread,
    /// Work-stealing pool of worker threads.
    MultiThread,
}

/// Configuration for the Tokio runtime.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub flavor: Flavor,
    pub worker_threads: usize,
    pub stack_size: usize,
    pub thread_name: String,
    pub thread_keep_alive: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            flavor: Flavor::MultiThread,
            worker_threads: detect_worker_threads(),
            stack_size: DEFAULT_STACK_SIZE,
            thread_name: DEFAULT_THREAD_NAME.to_owned(),
            thread_keep_alive: THREAD_KEEP_ALIVE,
        }
    }
}

impl RuntimeConfig {
    /// Single cooperative event loop, the scheduling model of one context.
    #[must_use = "Use this configuration for a single execution context"]
    pub fn cooperative() -> Self {
        Self {
            flavor: Flavor::CurrentThread,
            worker_threads: 1,
            thread_name: "gpilot-context".to_owned(),
            ..Self::default()
        }
    }

    /// Multi-threaded pool for hosts that run several contexts side by side.
    #[must_use = "Use this configuration when several contexts share one process"]
    pub fn multi_thread() -> Self {
        Self { thread_name: "gpilot-host".to_owned(), ..Self::default() }
    }

    #[must_use = "Customize the number of worker threads for the runtime"]
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads.clamp(1, MAX_WORKER_THREADS);
        self
    }

    #[must_use = "Customize the stack size for worker threads"]
    pub fn with_stack_size(mut self, size: usize) -> Self {
        self.stack_size = size.clamp(MIN_STACK_SIZE, MAX_STACK_SIZE);
        self
    }

    #[must_use = "Customize the thread name"]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.thread_name = if name.trim().is_empty() { DEFAULT_THREAD_NAME.to_owned() } else { name };
        self
    }
}

fn detect_worker_threads() -> usize {
    std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|&n| n > 0 && n <= MAX_WORKER_THREADS)
        .unwrap_or_else(|| {
            available_parallelism().map(std::num::NonZero::get).unwrap_or(DEFAULT_WORKER_THREADS)
        })
}

/// Builds a Tokio runtime from `config`, with I/O and timers enabled.
///
/// # Errors
///
/// Returns an [`anyhow::Error`] if the OS refuses to create the runtime threads.
///
/// # Examples
///
/// ```rust
/// use gpilot_runtime::{build_runtime_with_config, RuntimeConfig};
///
/// let rt = build_runtime_with_config(&RuntimeConfig::cooperative())?;
/// let answer = rt.block_on(async { 42 });
/// assert_eq!(answer, 42);
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn build_runtime_with_config(config: &RuntimeConfig) -> Result<Runtime> {
    debug!(config = ?config, "Building tokio runtime");

    let mut builder = match config.flavor {
        Flavor::CurrentThread => Builder::new_current_thread(),
        Flavor::MultiThread => {
            let mut builder = Builder::new_multi_thread();
            builder
                .worker_threads(config.worker_threads.clamp(1, MAX_WORKER_THREADS))
                .thread_keep_alive(config.thread_keep_alive);
            builder
        },
    };

    builder
        .thread_name(&config.thread_name)
        .thread_stack_size(config.stack_size.clamp(MIN_STACK_SIZE, MAX_STACK_SIZE))
        .enable_all();

    builder.build().map_err(|e| anyhow!("Failed to initialize runtime: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_threads_validation() {
        let config = RuntimeConfig::default().with_worker_threads(0);
        assert_eq!(config.worker_threads, 1);

        let config = RuntimeConfig::default().with_worker_threads(2000);
        assert_eq!(config.worker_threads, MAX_WORKER_THREADS);
    }

    #[test]
    fn test_stack_size_validation() {
        let config = RuntimeConfig::default().with_stack_size(100);
        assert_eq!(config.stack_size, MIN_STACK_SIZE);

        let config = RuntimeConfig::default().with_stack_size(100 * 1024 * 1024);
        assert_eq!(config.stack_size, MAX_STACK_SIZE);
    }

    #[test]
    fn test_cooperative_profile_is_single_threaded() {
        let config = RuntimeConfig::cooperative();
        assert_eq!(config.flavor, Flavor::CurrentThread);

        let rt = build_runtime_with_config(&config).expect("runtime");
        let on_same_thread = rt.block_on(async {
            let outer = std::thread::current().id();
            tokio::spawn(async move { std::thread::current().id() == outer }).await
        });
        assert!(on_same_thread.expect("join"));
    }

    #[test]
    fn test_blank_thread_name_falls_back() {
        let config = RuntimeConfig::default().with_thread_name("  ");
        assert_eq!(config.thread_name, DEFAULT_THREAD_NAME);
    }
}
