mod cli;
mod commands;

use anyhow::Context;
use clap::Parser;
use gpilot::domain::config::AppConfig;
use gpilot::features::controller::Collaborators;
use gpilot::features::menu::MemoryMenuHost;
use gpilot::kernel::config::load_config;
use gpilot::messaging::{EventBus, Transport, TransportConfig};
use gpilot_logger::{LevelFilter, Logger};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::cli::Cli;
use crate::commands::Session;

#[gpilot_runtime::main(cooperative)]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // The configured logger depends on the config, so its loading logs to the console.
    let mut config: AppConfig = gpilot_logger::bootstrap(LevelFilter::INFO, || load_config(cli.config.as_deref()))
        .context("Critical: Configuration is malformed")?;
    if cli.in_memory {
        config.storage.in_memory = true;
    }

    let level: LevelFilter = config.logging.level.parse().unwrap_or(LevelFilter::INFO);
    let mut logger = Logger::builder().context("background").level(level).console(true);
    if let Some(dir) = &config.logging.path {
        logger = logger.file(dir).json(config.logging.json);
    }
    let _logger = logger.init()?;

    let backend = gpilot::open_backend(&config.storage).await?;
    let bus = EventBus::new();
    let host = MemoryMenuHost::new();
    let controller =
        gpilot::init(&config, backend, bus.clone(), Collaborators::offline(Arc::new(host.clone())));
    let events = controller.start().await?;

    let transport = Transport::new(TransportConfig {
        inbox_capacity: config.messaging.inbox_capacity,
        reply_timeout: (config.messaging.reply_timeout_ms > 0)
            .then(|| Duration::from_millis(config.messaging.reply_timeout_ms)),
    });
    let server = controller.serve(&transport);

    let session = Session { config, controller, host, page: transport.outbox("page") };
    let outcome = session.run(cli.command).await;

    let closed = bus.shutdown();
    debug!(closed, "Event bus shut down");
    if let Err(err) = events.await {
        warn!(error = %err, "Event loop task ended abnormally");
    }
    server.abort();
    outcome
}
