//! Parsing of setting entries arriving from outside the process: `key=value`
//! assignments and JSON objects.

use crate::error::SettingsError;
use gpilot_domain::keys;
use gpilot_domain::value::{ConfigMap, ConfigValue};
use serde_json::Value;

/// Shape a known key expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    Text,
    Flag,
    List,
}

/// The shape of `key`, or `None` for keys outside the settings surface.
#[must_use]
pub fn shape_of(key: &str) -> Option<ValueShape> {
    match key {
        keys::AUTO_SUMMARIZE => Some(ValueShape::Flag),
        keys::DISABLED_SITES => Some(ValueShape::List),
        k if keys::ALL.contains(&k) => Some(ValueShape::Text),
        _ => None,
    }
}

/// Parses `key=value`. Flags accept `true`/`false`, lists are comma separated.
///
/// # Errors
/// [`SettingsError::UnknownKey`] for keys outside the settings surface and
/// [`SettingsError::InvalidValue`] for malformed assignments.
pub fn parse_assignment(input: &str) -> Result<(String, ConfigValue), SettingsError> {
    let Some((key, raw)) = input.split_once('=') else {
        return Err(SettingsError::InvalidValue {
            message: format!("expected key=value, got `{input}`").into(),
            context: None,
        });
    };
    let key = key.trim();
    let shape = shape_of(key).ok_or_else(|| unknown(key))?;

    let value = match shape {
        ValueShape::Text => ConfigValue::Text(raw.to_owned()),
        ValueShape::Flag => match raw.trim() {
            "true" => ConfigValue::Flag(true),
            "false" => ConfigValue::Flag(false),
            other => {
                return Err(SettingsError::InvalidValue {
                    message: format!("`{other}` is not a boolean").into(),
                    context: Some(key.to_owned().into()),
                });
            },
        },
        ValueShape::List => ConfigValue::List(
            raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_owned).collect(),
        ),
    };
    Ok((key.to_owned(), value))
}

/// Converts a JSON object of settings into entries, checking every value's shape.
///
/// # Errors
/// [`SettingsError::InvalidValue`] if `payload` is not an object or a value has the
/// wrong shape, [`SettingsError::UnknownKey`] for unknown keys.
pub fn entries_from_json(payload: &Value) -> Result<ConfigMap, SettingsError> {
    let Some(object) = payload.as_object() else {
        return Err(SettingsError::InvalidValue {
            message: "settings payload must be an object".into(),
            context: None,
        });
    };

    object
        .iter()
        .map(|(key, value)| {
            let shape = shape_of(key).ok_or_else(|| unknown(key))?;
            let parsed: ConfigValue = serde_json::from_value(value.clone())
                .map_err(|source| SettingsError::Payload { source, context: Some(key.clone().into()) })?;
            let matches = matches!(
                (shape, &parsed),
                (ValueShape::Text, ConfigValue::Text(_))
                    | (ValueShape::Flag, ConfigValue::Flag(_))
                    | (ValueShape::List, ConfigValue::List(_))
            );
            if !matches {
                return Err(SettingsError::InvalidValue {
                    message: format!("expected {shape:?}, got {}", parsed.kind()).into(),
                    context: Some(key.clone().into()),
                });
            }
            Ok((key.clone(), parsed))
        })
        .collect()
}

fn unknown(key: &str) -> SettingsError {
    SettingsError::UnknownKey { message: key.to_owned().into(), context: None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn assignments_follow_key_shape() {
        assert_eq!(
            parse_assignment("auto_summarize=true").expect("flag"),
            ("auto_summarize".to_owned(), ConfigValue::Flag(true))
        );
        assert_eq!(
            parse_assignment("disabled_sites=a.example, b.example,").expect("list").1,
            ConfigValue::List(vec!["a.example".into(), "b.example".into()])
        );
        assert_eq!(parse_assignment("ui_theme=dark=ish").expect("text").1, ConfigValue::from("dark=ish"));
    }

    #[test]
    fn bad_assignments_are_rejected() {
        assert_eq!(parse_assignment("nope=1").expect_err("unknown").code(), "unknown_key");
        assert_eq!(parse_assignment("ui_theme").expect_err("no =").code(), "invalid_value");
        assert_eq!(parse_assignment("auto_summarize=yes").expect_err("flag").code(), "invalid_value");
    }

    #[test]
    fn json_entries_are_shape_checked() {
        let entries =
            entries_from_json(&json!({ "ui_theme": "dark", "auto_summarize": false })).expect("ok");
        assert_eq!(entries.len(), 2);

        let err = entries_from_json(&json!({ "auto_summarize": "false" })).expect_err("shape");
        assert_eq!(err.code(), "invalid_value");
        let err = entries_from_json(&json!({ "ui_theme": 3 })).expect_err("number");
        assert_eq!(err.code(), "payload");
        assert!(entries_from_json(&json!([1])).is_err());
    }
}
