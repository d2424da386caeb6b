//! Menu feature slice.
//!
//! A single context-menu entry offers to disable the extension on the current site, or
//! to re-enable it. [`classify`] decides which pages get the entry; the
//! [`MenuStateMachine`] keeps the host's entry in step with the active tab through a
//! [`MenuHost`].

pub mod classify;
mod error;
mod host;
mod machine;

pub use crate::error::{MenuError, MenuErrorExt};
pub use crate::host::{MemoryMenuHost, MenuCall, MenuEntry, MenuHost, MenuUpdate};
pub use crate::machine::{MenuStateMachine, Ticket};
