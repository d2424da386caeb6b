use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A persisted configuration value.
///
/// Untagged on the wire: `true`, `"dark"` and `["a", "b"]` are all valid entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Flag(bool),
    Text(String),
    List(Vec<String>),
}

/// Key-ordered mapping of configuration entries.
pub type ConfigMap = BTreeMap<String, ConfigValue>;

impl Default for ConfigValue {
    /// The fallback for keys with neither a stored value nor a declared default.
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl ConfigValue {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Flag(flag) => Some(*flag),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Consumes the value, yielding the list or an empty list for other shapes.
    #[must_use]
    pub fn into_list(self) -> Vec<String> {
        match self {
            Self::List(items) => items,
            _ => Vec::new(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Flag(_) => "boolean",
            Self::Text(_) => "string",
            Self::List(_) => "list",
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(flag: bool) -> Self {
        Self::Flag(flag)
    }
}

impl From<&str> for ConfigValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for ConfigValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<String>> for ConfigValue {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

impl From<&[&str]> for ConfigValue {
    fn from(items: &[&str]) -> Self {
        Self::List(items.iter().map(|s| (*s).to_owned()).collect())
    }
}
