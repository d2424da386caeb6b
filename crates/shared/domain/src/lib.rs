//! # Domain Models
//!
//! Pure data shared by every execution context: configuration values and keys, the
//! typed settings view, application configuration, tab/menu types and the events
//! that flow between contexts.
//! Keep it lean: `serde` and `bitflags` only, no I/O.

pub mod config;
pub mod events;
pub mod keys;
pub mod menu;
pub mod settings;
pub mod value;
