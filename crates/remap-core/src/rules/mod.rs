//! Rule interpreter
//!
//! Applies declarative rule documents to a [`RenameState`]. Each document is
//! a mapping with up to four sections, always applied in this order:
//!
//! - `classes`: `old: new` class renames
//! - `members`: field and method renames, propagated to subclasses
//! - `flags`: access flag overrides
//! - `regex`: pattern based class renames
//!
//! Rules always refer to *current* names, so a later document sees the
//! renames of earlier ones.

mod classes;
mod flags;
mod members;
mod pattern;
mod value;

use crate::error::RuleError;
use crate::graph::InheritanceGraph;
use crate::missing::MissingPolicy;
use crate::program::Program;
use crate::rename::RenameState;
use serde_yaml::Value;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

/// Rule document section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// Class renames
    Classes,
    /// Member renames
    Members,
    /// Access flag overrides
    Flags,
    /// Pattern based class renames
    Regex,
}

impl Section {
    /// Every section in application order
    pub const ALL: [Section; 4] = [Self::Classes, Self::Members, Self::Flags, Self::Regex];

    /// Key of the section in a rule document
    #[inline]
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Classes => "classes",
            Self::Members => "members",
            Self::Flags => "flags",
            Self::Regex => "regex",
        }
    }
}

impl Display for Section {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Applies rule documents to a rename state
///
/// # Example
/// ```
/// use remap_core::prelude::*;
/// use std::sync::Arc;
///
/// let program: Program = [ClassInfo::new("a/A").with_member("m", "()V", 1)]
///     .into_iter()
///     .collect();
/// let graph = InheritanceGraph::build(&program);
/// let state = RenameState::seed(&program, &graph).unwrap();
///
/// let mut rules = RuleInterpreter::new(Arc::new(program), Arc::new(graph), state);
/// let docs = load_documents("classes:\n  a/A: b/B\nmembers:\n  b/B m ()V: run\n").unwrap();
/// rules.apply_all(&docs).unwrap();
///
/// let state = rules.into_state();
/// assert_eq!(state.current_class("a/A").unwrap().as_str(), "b/B");
/// ```
#[derive(Debug)]
pub struct RuleInterpreter {
    program: Arc<Program>,
    graph: Arc<InheritanceGraph>,
    state: RenameState,
    policy: MissingPolicy,
    find_parents: bool,
}

impl RuleInterpreter {
    /// Create an interpreter over a seeded state
    #[must_use]
    pub fn new(program: Arc<Program>, graph: Arc<InheritanceGraph>, state: RenameState) -> Self {
        Self {
            program,
            graph,
            state,
            policy: MissingPolicy::default(),
            find_parents: false,
        }
    }

    /// With missing-symbol policy
    #[inline]
    #[must_use]
    pub fn with_policy(mut self, policy: MissingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// With advisory parent checks
    #[inline]
    #[must_use]
    pub fn with_find_parents(mut self, enabled: bool) -> Self {
        self.find_parents = enabled;
        self
    }

    /// Current rename state
    #[inline]
    #[must_use]
    pub fn state(&self) -> &RenameState {
        &self.state
    }

    /// Consume the interpreter, returning the final state
    #[must_use]
    pub fn into_state(self) -> RenameState {
        self.state
    }

    /// Apply every document in order
    ///
    /// # Errors
    /// Stops at the first failing document; see [`RuleInterpreter::apply`].
    pub fn apply_all(&mut self, documents: &[Value]) -> Result<(), RuleError> {
        for (index, document) in documents.iter().enumerate() {
            self.apply(index, document)?;
        }
        Ok(())
    }

    /// Apply one document
    ///
    /// # Errors
    /// Section failures are wrapped in [`RuleError::Document`] with the
    /// document index, the section and the document itself.
    pub fn apply(&mut self, index: usize, document: &Value) -> Result<(), RuleError> {
        let mapping = match document {
            Value::Mapping(mapping) => mapping,
            Value::Null => return Ok(()),
            other => {
                return Err(RuleError::malformed(format!(
                    "rule document {index} is not a mapping: {}",
                    value::render(other)
                )))
            }
        };

        for key in mapping.keys() {
            let known = key
                .as_str()
                .is_some_and(|k| Section::ALL.iter().any(|s| s.key() == k));
            if !known {
                tracing::warn!("ignoring unknown section {} in rule document {index}", value::render(key));
            }
        }

        for section in Section::ALL {
            let Some(body) = mapping.get(section.key()) else {
                continue;
            };
            let result = match section {
                Section::Classes => self.apply_classes(body),
                Section::Members => self.apply_members(body),
                Section::Flags => self.apply_flags(body),
                Section::Regex => self.apply_regex(body),
            };
            result.map_err(|source| RuleError::Document {
                index,
                section,
                document: value::render(document),
                source: Box::new(source),
            })?;
        }

        tracing::debug!(index, "rule document applied");
        Ok(())
    }
}
