//! The host menu API, and an in-memory host that records what it was asked to do.

use crate::error::MenuError;
use async_trait::async_trait;
use fxhash::FxHashMap;
use gpilot_domain::menu::{MenuContexts, MenuVisibilityState};
use parking_lot::Mutex;
use std::fmt::Debug;
use std::sync::Arc;

/// Fields to change on an existing entry; `title: None` keeps the current title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuUpdate {
    pub visible: bool,
    pub title: Option<String>,
}

impl From<MenuVisibilityState> for MenuUpdate {
    /// A hidden entry keeps whatever title it had.
    fn from(shown: MenuVisibilityState) -> Self {
        Self { visible: shown.visible, title: shown.visible.then_some(shown.label) }
    }
}

/// Menu-affordance capability of the host. Calls are idempotent and last-write-wins.
#[async_trait]
pub trait MenuHost: Send + Sync + Debug {
    async fn create(&self, id: &str, contexts: MenuContexts, title: &str) -> Result<(), MenuError>;

    async fn update(&self, id: &str, update: &MenuUpdate) -> Result<(), MenuError>;

    async fn remove_all(&self) -> Result<(), MenuError>;
}

/// One entry as the host currently shows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub contexts: MenuContexts,
    pub title: String,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuCall {
    Create { id: String, title: String },
    Update { id: String, update: MenuUpdate },
    RemoveAll,
}

#[derive(Debug, Default)]
struct Recorded {
    entries: FxHashMap<String, MenuEntry>,
    calls: Vec<MenuCall>,
}

/// Process-local host; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryMenuHost {
    state: Arc<Mutex<Recorded>>,
}

impl MemoryMenuHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn entry(&self, id: &str) -> Option<MenuEntry> {
        self.state.lock().entries.get(id).cloned()
    }

    #[must_use]
    pub fn calls(&self) -> Vec<MenuCall> {
        self.state.lock().calls.clone()
    }
}

#[async_trait]
impl MenuHost for MemoryMenuHost {
    async fn create(&self, id: &str, contexts: MenuContexts, title: &str) -> Result<(), MenuError> {
        let mut state = self.state.lock();
        state.calls.push(MenuCall::Create { id: id.to_owned(), title: title.to_owned() });
        state
            .entries
            .insert(id.to_owned(), MenuEntry { contexts, title: title.to_owned(), visible: true });
        Ok(())
    }

    async fn update(&self, id: &str, update: &MenuUpdate) -> Result<(), MenuError> {
        let mut state = self.state.lock();
        state.calls.push(MenuCall::Update { id: id.to_owned(), update: update.clone() });
        let Some(entry) = state.entries.get_mut(id) else {
            return Err(MenuError::UnknownEntry {
                message: "entry was never created".into(),
                context: Some(id.to_owned().into()),
            });
        };
        entry.visible = update.visible;
        if let Some(title) = &update.title {
            entry.title.clone_from(title);
        }
        Ok(())
    }

    async fn remove_all(&self) -> Result<(), MenuError> {
        let mut state = self.state.lock();
        state.calls.push(MenuCall::RemoveAll);
        state.entries.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn update_of_unknown_entry_fails() {
        let host = MemoryMenuHost::new();
        let update = MenuUpdate { visible: true, title: None };
        let err = host.update("nope", &update).await.expect_err("unknown");
        assert_eq!(err.code(), "unknown_entry");
    }

    #[test]
    fn hidden_visibility_leaves_title_alone() {
        let hidden = MenuUpdate::from(MenuVisibilityState { visible: false, label: String::new() });
        assert_eq!(hidden, MenuUpdate { visible: false, title: None });

        let shown = MenuUpdate::from(MenuVisibilityState { visible: true, label: "Re-enable".into() });
        assert_eq!(shown.title.as_deref(), Some("Re-enable"));
    }

    #[tokio::test]
    async fn update_keeps_title_when_none() {
        let host = MemoryMenuHost::new();
        host.create("m", MenuContexts::PAGE, "Disable").await.expect("create");
        host.update("m", &MenuUpdate { visible: false, title: None }).await.expect("update");

        let entry = host.entry("m").expect("entry");
        assert_eq!(entry.title, "Disable");
        assert!(!entry.visible);
    }
}
