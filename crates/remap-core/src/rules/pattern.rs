//! `regex` section: `pattern: replacement` applied to every current class name

use super::value::{entries, expect_scalar};
use super::{RuleInterpreter, Section};
use crate::error::RuleError;
use ::regex::RegexBuilder;
use remap_symbol::ClassToken;
use serde_yaml::Value;

impl RuleInterpreter {
    pub(super) fn apply_regex(&mut self, body: &Value) -> Result<(), RuleError> {
        for (pattern, replacement) in entries(body, Section::Regex)? {
            let pattern = expect_scalar(pattern, "pattern")?;
            let replacement = expect_scalar(replacement, "replacement")?;
            let regex = RegexBuilder::new(&pattern)
                .dot_matches_new_line(true)
                .build()
                .map_err(|source| RuleError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                })?;

            let changed: Vec<(ClassToken, ClassToken)> = self
                .state
                .classes()
                .filter_map(|(original, current)| {
                    let replaced = regex.replace_all(current, replacement.as_str());
                    (replaced != current.as_str()).then(|| (original.clone(), ClassToken::new(replaced)))
                })
                .collect();

            for (original, _) in &changed {
                self.state.release_class(original);
            }
            for (original, renamed) in &changed {
                self.state.rename_class(original.clone(), renamed.clone())?;
            }
            tracing::debug!(%pattern, renamed = changed.len(), "class pattern applied");
        }
        Ok(())
    }
}
