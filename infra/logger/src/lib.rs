//! # Logger
//!
//! Tracing subscriber setup shared by every execution context.
//!
//! A context (background controller, page script, settings UI) initializes the global
//! subscriber once, naming itself; the name prefixes rolling log files and is attached
//! to every event through a root span returned by [`Logger::span`].
//!
//! * Console output is compact and coloured.
//! * File output rotates through `tracing-appender`, optionally as JSON lines.
//! * `RUST_LOG` overrides the programmatic level; [`LoggerBuilder::env_filter`] sets
//!   module directives such as `"gpilot_menu=trace,gpilot_storage=debug"`.
//! * The `profiling` feature adds a `tokio-console` layer (needs `--cfg tokio_unstable`).
//! * [`bootstrap`] covers the work that runs before the global subscriber exists, such
//!   as reading the configuration that decides how logging is set up.
//!
//! ## Example
//!
//! ```rust
//! # use gpilot_logger::{Logger, LevelFilter};
//! let logger = Logger::builder()
//!     .context("background")
//!     .level(LevelFilter::DEBUG)
//!     .init()
//!     .unwrap();
//!
//! let _entered = logger.span().entered();
//! tracing::info!("controller ready");
//! ```

mod error;

pub use crate::error::{LoggerError, LoggerErrorExt};
pub use tracing::level_filters::LevelFilter;
pub use tracing_appender::rolling::Rotation;

use std::fs;
use std::path::PathBuf;
use tracing::Span;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const DEFAULT_MAX_FILES: usize = 7;
const LOG_FILE_SUFFIX: &str = "log";

#[derive(Debug)]
struct FileOutput {
    dir: PathBuf,
    rotation: Rotation,
    max_files: usize,
    json: bool,
}

#[derive(Debug)]
struct LoggerConfig {
    console: bool,
    level: LevelFilter,
    env_filter: Option<String>,
    file: Option<FileOutput>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self { console: true, level: LevelFilter::INFO, env_filter: None, file: None }
    }
}

/// Typestate: no context name yet.
#[derive(Debug, Default)]
pub struct Unnamed;
/// Typestate: the execution context has been named.
#[derive(Debug)]
pub struct Named(String);

mod private {
    pub trait Sealed {}
}
impl private::Sealed for Unnamed {}
impl private::Sealed for Named {}

/// Builder for the global tracing subscriber of one execution context.
#[derive(Debug)]
pub struct LoggerBuilder<S: private::Sealed = Unnamed> {
    config: LoggerConfig,
    state: S,
}

impl LoggerBuilder<Unnamed> {
    /// Names the execution context (`background`, `page`, `settings`, ...).
    pub fn context(self, name: impl Into<String>) -> LoggerBuilder<Named> {
        LoggerBuilder { config: self.config, state: Named(name.into()) }
    }
}

impl LoggerBuilder<Named> {
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn level(mut self, level: LevelFilter) -> Self {
        self.config.level = level;
        self
    }

    /// Programmatic filter directives; `RUST_LOG` is ignored when this is set.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn env_filter(mut self, filter: impl Into<String>) -> Self {
        self.config.env_filter = Some(filter.into());
        self
    }

    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn console(mut self, enabled: bool) -> Self {
        self.config.console = enabled;
        self
    }

    /// Writes rolling log files named `<context>.<date>.log` into `dir`.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn file(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.file = Some(FileOutput {
            dir: dir.into(),
            rotation: Rotation::DAILY,
            max_files: DEFAULT_MAX_FILES,
            json: false,
        });
        self
    }

    /// Rotation strategy for file output. No effect without [`Self::file`].
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn rotation(mut self, rotation: Rotation) -> Self {
        if let Some(file) = self.config.file.as_mut() {
            file.rotation = rotation;
        }
        self
    }

    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn max_files(mut self, max: usize) -> Self {
        if let Some(file) = self.config.file.as_mut() {
            file.max_files = max;
        }
        self
    }

    /// JSON lines for file output. No effect without [`Self::file`].
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn json(mut self, enabled: bool) -> Self {
        if let Some(file) = self.config.file.as_mut() {
            file.json = enabled;
        }
        self
    }

    /// Installs the global tracing subscriber.
    ///
    /// The returned [`Logger`] owns the non-blocking writer guard; keep it alive
    /// until the context shuts down or buffered file lines are lost.
    ///
    /// # Errors
    /// Returns [`LoggerError::Subscriber`] if a global subscriber is already set,
    /// [`LoggerError::InvalidConfiguration`] for invalid settings, and
    /// [`LoggerError::Appender`] if the log directory cannot be used.
    pub fn init(self) -> Result<Logger, LoggerError> {
        let Named(name) = self.state;
        validate(&self.config, &name)?;

        let filter = build_env_filter(&self.config)?;
        let mut layers = Vec::new();

        #[cfg(all(feature = "profiling", tokio_unstable))]
        if self.config.console {
            layers.push(console_subscriber::spawn().boxed());
        }

        if self.config.console {
            layers.push(layer().compact().with_ansi(true).boxed());
        }

        let guard = match self.config.file {
            Some(file) => {
                fs::create_dir_all(&file.dir).map_err(|e| LoggerError::Internal {
                    message: e.to_string().into(),
                    context: Some(format!("Failed to create {}", file.dir.display()).into()),
                })?;

                let appender = RollingFileAppender::builder()
                    .rotation(file.rotation)
                    .filename_prefix(&name)
                    .filename_suffix(LOG_FILE_SUFFIX)
                    .max_log_files(file.max_files)
                    .build(&file.dir)?;

                let (writer, guard) = tracing_appender::non_blocking(appender);
                let file_layer = layer().with_writer(writer).with_ansi(false);
                layers.push(if file.json { file_layer.json().boxed() } else { file_layer.boxed() });
                Some(guard)
            },
            None => None,
        };

        if layers.is_empty() {
            return Err(LoggerError::InvalidConfiguration {
                message: "No logging output enabled. Enable console or file output.".into(),
                context: Some(name.into()),
            });
        }

        tracing_subscriber::registry().with(filter).with(layers).try_init()?;

        Ok(Logger { context: name, guard })
    }
}

/// Handle to the initialized logging system of one context.
#[must_use = "Dropping this handle stops the background log writer."]
#[derive(Debug)]
pub struct Logger {
    context: String,
    guard: Option<WorkerGuard>,
}

impl Logger {
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder { config: LoggerConfig::default(), state: Unnamed }
    }

    /// Name of the execution context this logger was initialized for.
    #[must_use]
    pub fn context(&self) -> &str {
        &self.context
    }

    /// Root span carrying the context name; enter it around the context's event loop.
    #[must_use]
    pub fn span(&self) -> Span {
        tracing::info_span!("context", name = %self.context)
    }

    #[must_use]
    pub const fn guard(&self) -> Option<&WorkerGuard> {
        self.guard.as_ref()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if self.guard.is_some() {
            tracing::debug!(context = %self.context, "Flushing log buffers");
        }
    }
}

/// Runs `f` under a console subscriber scoped to the calling thread.
///
/// `RUST_LOG` applies as it does for [`LoggerBuilder::init`]; the global subscriber is
/// left untouched.
pub fn bootstrap<T>(level: LevelFilter, f: impl FnOnce() -> T) -> T {
    let filter = EnvFilter::builder().with_default_directive(level.into()).from_env_lossy();
    let subscriber = tracing_subscriber::registry().with(filter).with(layer().compact().with_ansi(true));
    tracing::subscriber::with_default(subscriber, f)
}

fn validate(config: &LoggerConfig, name: &str) -> Result<(), LoggerError> {
    if name.trim().is_empty() {
        return Err(LoggerError::InvalidConfiguration {
            message: "Context name cannot be empty".into(),
            context: None,
        });
    }

    if config.file.as_ref().is_some_and(|file| file.max_files == 0) {
        return Err(LoggerError::InvalidConfiguration {
            message: "max_files must be greater than zero".into(),
            context: Some(name.to_owned().into()),
        });
    }

    Ok(())
}

fn build_env_filter(config: &LoggerConfig) -> Result<EnvFilter, LoggerError> {
    let builder = EnvFilter::builder().with_default_directive(config.level.into());
    match config.env_filter.as_deref() {
        None => Ok(builder.from_env_lossy()),
        Some(directives) => {
            builder.parse(directives).map_err(|e| LoggerError::InvalidConfiguration {
                message: format!("Invalid env filter '{directives}': {e}").into(),
                context: None,
            })
        },
    }
}
