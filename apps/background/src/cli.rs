use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Drives the background context of GitLab Pilot from the command line, standing in
/// for the browser: tabs, menu clicks and the settings UI.
#[derive(Debug, Parser)]
#[command(name = "gpilot", version, about)]
pub(crate) struct Cli {
    /// Configuration file; `gpilot.toml` in the working directory is used if present.
    #[arg(short, long, global = true)]
    pub(crate) config: Option<PathBuf>,

    /// Keep settings in memory; nothing is persisted.
    #[arg(long, global = true)]
    pub(crate) in_memory: bool,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Open a URL in a tab and print the resulting menu entry.
    Visit {
        url: String,
        #[arg(long, default_value_t = 1)]
        tab: u32,
    },
    /// Click the menu entry on a URL, toggling its site.
    Toggle { url: String },
    /// Whether the extension is disabled on the site of a URL.
    Status { url: String },
    /// List disabled sites, oldest first.
    Sites,
    /// Print settings: all of them, or the given keys.
    Get { keys: Vec<String> },
    /// Write settings given as `key=value`; lists are comma separated.
    Set {
        #[arg(required = true)]
        assignments: Vec<String>,
    },
    /// Send a raw action message from a page context and print the reply.
    Call {
        action: String,
        #[arg(default_value = "{}")]
        payload: String,
    },
}
