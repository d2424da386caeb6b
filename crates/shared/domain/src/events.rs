//! Events published on the in-process bus. Each is `Clone` so that every
//! subscriber receives its own copy.

use crate::menu::TabId;
use serde::{Deserialize, Serialize};

/// The active tab changed or navigated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabChanged {
    pub tab: TabId,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabClosed {
    pub tab: TabId,
}

/// The user clicked the menu entry on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuClicked {
    pub menu_id: String,
    pub tab: TabId,
    pub url: String,
}

/// Persisted entries were written, by whichever context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigChanged {
    pub keys: Vec<String>,
}

impl ConfigChanged {
    #[must_use]
    pub fn touches(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }
}
