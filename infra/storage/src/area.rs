use crate::error::StorageError;
use std::fmt;

/// Validated storage area name (`sync`, `local`, ...); one document per area.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AreaName(String);

impl TryFrom<String> for AreaName {
    type Error = StorageError;

    fn try_from(value: String) -> Result<Self, StorageError> {
        Self::try_from(value.as_str())
    }
}

impl TryFrom<&str> for AreaName {
    type Error = StorageError;

    fn try_from(value: &str) -> Result<Self, StorageError> {
        let name = value.trim().to_lowercase();

        if name.is_empty() {
            return Err(StorageError::InvalidArea {
                message: "EMPTY".into(),
                context: Some("Area name cannot be empty".into()),
            });
        }

        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return Err(StorageError::InvalidArea {
                message: name.into(),
                context: Some("Area name contains illegal characters".into()),
            });
        }

        Ok(Self(name))
    }
}

impl AsRef<str> for AreaName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AreaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
