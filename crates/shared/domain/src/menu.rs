use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Host-assigned browser tab identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub u32);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab#{}", self.0)
    }
}

/// What the affordance currently shows, as handed to the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuVisibilityState {
    pub visible: bool,
    pub label: String,
}

/// Classified affordance state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MenuState {
    /// Not a qualifying page.
    #[default]
    Hidden,
    /// Qualifying page, feature active on the site.
    Enabled { label: String },
    /// Qualifying page, site opted out.
    Disabled { label: String },
}

impl MenuState {
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        !matches!(self, Self::Hidden)
    }

    #[must_use]
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Hidden => None,
            Self::Enabled { label } | Self::Disabled { label } => Some(label),
        }
    }

    #[must_use]
    pub fn visibility(&self) -> MenuVisibilityState {
        MenuVisibilityState {
            visible: self.is_visible(),
            label: self.label().unwrap_or_default().to_owned(),
        }
    }
}

bitflags! {
    /// Where the host shows the menu entry.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MenuContexts: u8 {
        const PAGE = 1 << 0;
    }
}

impl Default for MenuContexts {
    fn default() -> Self {
        Self::PAGE
    }
}
