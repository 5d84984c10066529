//! Rule file loading
//!
//! Uses `serde_yaml` for parsing with support for:
//! - A top-level sequence of rule documents
//! - A single mapping as a one-document file
//! - Multiple YAML documents in one stream, concatenated

use crate::error::{RemapError, RuleError};
use serde::Deserialize;
use serde_yaml::Value;
use std::path::Path;

/// Parse rule documents from YAML text
///
/// # Errors
/// [`RuleError::Syntax`] for invalid YAML, [`RuleError::MalformedRule`] if a
/// top-level value is neither a sequence nor a mapping.
///
/// # Example
/// ```
/// use remap_core::load_documents;
///
/// let docs = load_documents("- classes: {a/A: b/B}\n- regex: {'^b/': c/}\n").unwrap();
/// assert_eq!(docs.len(), 2);
/// ```
pub fn load_documents(text: &str) -> Result<Vec<Value>, RuleError> {
    let mut documents = Vec::new();

    for stream in serde_yaml::Deserializer::from_str(text) {
        match Value::deserialize(stream)? {
            Value::Null => {}
            Value::Sequence(items) => documents.extend(items),
            mapping @ Value::Mapping(_) => documents.push(mapping),
            other => {
                return Err(RuleError::malformed(format!(
                    "rule file must contain a sequence or a mapping, found {other:?}"
                )))
            }
        }
    }

    Ok(documents)
}

/// Read and parse a rule file
///
/// # Errors
/// [`RemapError::Io`] if the file cannot be read, otherwise as
/// [`load_documents`].
pub fn load_file(path: &Path) -> Result<Vec<Value>, RemapError> {
    let text = std::fs::read_to_string(path).map_err(|e| RemapError::io_error(path, e))?;
    let documents = load_documents(&text)?;
    tracing::debug!(path = %path.display(), documents = documents.len(), "rule file loaded");
    Ok(documents)
}
