//! Settings feature slice.
//!
//! [`ConfigStore`] is the single source of truth for user configuration, shared by all
//! contexts through a persistence backend. The settings UI writes through a
//! [`DebouncedWriter`]; values arriving from outside are validated by [`entries`].

pub mod entries;
mod error;
mod store;
mod writer;

pub use crate::error::{SettingsError, SettingsErrorExt};
pub use crate::store::{ConfigStore, ConfigStoreInner, WriteOutcome};
pub use crate::writer::DebouncedWriter;
