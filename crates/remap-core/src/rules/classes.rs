//! `classes` section: `old: new`

use super::value::{entries, expect_scalar, render_entry};
use super::{RuleInterpreter, Section};
use crate::error::RuleError;
use crate::missing::MissingSymbol;
use remap_symbol::{ClassToken, DuplicateTarget};
use serde_yaml::Value;

impl RuleInterpreter {
    pub(super) fn apply_classes(&mut self, body: &Value) -> Result<(), RuleError> {
        for (key, value) in entries(body, Section::Classes)? {
            let old = expect_scalar(key, "class name")?;
            let new = expect_scalar(value, "class name")?;
            self.rename_class(&old, &new, || render_entry(key, value))?;
        }
        Ok(())
    }

    fn rename_class(
        &mut self,
        old: &str,
        new: &str,
        context: impl FnOnce() -> String,
    ) -> Result<(), RuleError> {
        if let Some(existing) = self.state.original_class(new) {
            return Err(DuplicateTarget {
                key: ClassToken::new(old),
                value: ClassToken::new(new),
                existing: existing.clone(),
            }
            .into());
        }

        let Some(original) = self.state.original_class(old).cloned() else {
            let missing = MissingSymbol::Class {
                name: old.to_string(),
            };
            return self.policy.act(missing, context());
        };

        self.state
            .rename_class(original.clone(), ClassToken::new(new))?;
        tracing::debug!(%original, from = old, to = new, "class renamed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::RuleError;
    use crate::missing::MissingPolicy;
    use crate::program::ClassInfo;
    use crate::rules::tests::{apply, interpreter};

    #[test]
    fn rename_resolves_current_name() {
        let mut rules = interpreter(vec![ClassInfo::new("a/A"), ClassInfo::new("a/B")]);
        apply(&mut rules, "classes:\n  a/A: x/X\n").unwrap();
        apply(&mut rules, "classes:\n  x/X: y/Y\n").unwrap();

        let state = rules.state();
        assert_eq!(state.current_class("a/A").unwrap().as_str(), "y/Y");
        assert_eq!(state.original_class("y/Y").unwrap().as_str(), "a/A");
        assert!(state.original_class("x/X").is_none());
    }

    #[test]
    fn duplicate_target_fails_before_lookup() {
        let mut rules = interpreter(vec![ClassInfo::new("a/A"), ClassInfo::new("a/B")]);
        // The source name does not even exist; the collision wins.
        let err = apply(&mut rules, "classes:\n  q/Missing: a/B\n").unwrap_err();
        match err.root_cause() {
            RuleError::DuplicateClass(dup) => assert_eq!(dup.existing.as_str(), "a/B"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn two_classes_cannot_share_a_name() {
        let mut rules = interpreter(vec![ClassInfo::new("a/A"), ClassInfo::new("a/B")]);
        let err = apply(&mut rules, "classes:\n  a/A: x/X\n  a/B: x/X\n").unwrap_err();
        assert!(matches!(err.root_cause(), RuleError::DuplicateClass(_)));
        assert_eq!(rules.state().current_class("a/B").unwrap().as_str(), "a/B");
    }

    #[test]
    fn unknown_class_follows_policy() {
        let mut rules = interpreter(vec![ClassInfo::new("a/A")]);
        assert!(matches!(
            apply(&mut rules, "classes:\n  q/Q: x/X\n").unwrap_err().root_cause(),
            RuleError::Unresolved(_)
        ));

        let mut rules = interpreter(vec![ClassInfo::new("a/A")]).with_policy(MissingPolicy::Warn);
        apply(&mut rules, "classes:\n  q/Q: x/X\n  a/A: b/B\n").unwrap();
        assert_eq!(rules.state().current_class("a/A").unwrap().as_str(), "b/B");
    }
}
