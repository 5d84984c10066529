//! Helpers for reading generic rule values

use crate::error::RuleError;
use crate::rules::Section;
use serde_yaml::Value;

/// Key/value pairs of a section body; an empty body yields nothing
pub(super) fn entries(body: &Value, section: Section) -> Result<Vec<(&Value, &Value)>, RuleError> {
    match body {
        Value::Null => Ok(Vec::new()),
        Value::Mapping(mapping) => Ok(mapping.iter().collect()),
        other => Err(RuleError::malformed(format!(
            "{section} section must be a mapping, found {}",
            render(other)
        ))),
    }
}

/// Scalar as text (strings, numbers and booleans)
pub(super) fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Scalar or a malformed rule error naming what was expected
pub(super) fn expect_scalar(value: &Value, what: &str) -> Result<String, RuleError> {
    scalar(value).ok_or_else(|| RuleError::malformed(format!("expected {what}, found {}", render(value))))
}

/// Compact single-line-ish rendering for messages
pub(super) fn render(value: &Value) -> String {
    match serde_yaml::to_string(value) {
        Ok(text) => text.trim_end().to_string(),
        Err(_) => format!("{value:?}"),
    }
}

/// `key: value` rendering of one rule entry
pub(super) fn render_entry(key: &Value, value: &Value) -> String {
    format!("{}: {}", render(key), render(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_as_text() {
        assert_eq!(scalar(&Value::from("x")).as_deref(), Some("x"));
        assert_eq!(scalar(&Value::from(9)).as_deref(), Some("9"));
        assert_eq!(scalar(&Value::from(true)).as_deref(), Some("true"));
        assert!(scalar(&Value::Sequence(vec![])).is_none());
    }

    #[test]
    fn empty_section_has_no_entries() {
        assert!(entries(&Value::Null, Section::Classes).unwrap().is_empty());
        assert!(entries(&Value::from("x"), Section::Flags).is_err());
    }
}
