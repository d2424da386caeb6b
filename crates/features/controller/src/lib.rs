//! Background controller.
//!
//! Wires the settings, site-toggle and menu slices together, answers request messages
//! from the other contexts and runs the event loop that keeps the menu entry current.

mod collaborators;
mod controller;
mod error;
mod events;
mod handlers;

pub use crate::collaborators::{AiProvider, AiRequest, ChatRelay, Collaborators, Offline};
pub use crate::controller::{Controller, ControllerInner};
pub use crate::error::{ControllerError, ControllerErrorExt};
pub use crate::handlers::actions;
