//! `flags` section: `"Class name descriptor": access`

use super::value::{entries, expect_scalar, render, render_entry};
use super::{RuleInterpreter, Section};
use crate::error::RuleError;
use crate::missing::MissingSymbol;
use remap_symbol::{QualifiedMember, SymbolId};
use serde_yaml::Value;

impl RuleInterpreter {
    pub(super) fn apply_flags(&mut self, body: &Value) -> Result<(), RuleError> {
        for (key, value) in entries(body, Section::Flags)? {
            let key_text = expect_scalar(key, "member key")?;
            let member: QualifiedMember = key_text.parse()?;
            let descriptor = member.require_descriptor()?;
            let access = access_value(value)?;

            let missing = || MissingSymbol::Flag {
                key: key_text.clone(),
            };
            let Some(owner) = self.state.original_class(&member.class).cloned() else {
                self.policy.act(missing(), render_entry(key, value))?;
                continue;
            };

            let current = SymbolId::new(owner, &member.name, self.state.unmap_descriptor(descriptor));
            let declared = self
                .state
                .original_signature(&current)
                .filter(|original| {
                    self.program
                        .get(original.owner())
                        .is_some_and(|info| info.member(original).is_some())
                })
                .cloned();
            let Some(original) = declared else {
                self.policy.act(missing(), render_entry(key, value))?;
                continue;
            };

            tracing::debug!(%original, access, "access flags overridden");
            self.state.flags_mut().insert(original, access);
        }
        Ok(())
    }
}

fn access_value(value: &Value) -> Result<u32, RuleError> {
    let parsed = match value {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| RuleError::malformed(format!("access flags must be an integer, found {}", render(value))))
}

#[cfg(test)]
mod tests {
    use crate::error::RuleError;
    use crate::program::ClassInfo;
    use crate::rules::tests::{apply, interpreter};
    use remap_symbol::{ClassToken, SymbolId};

    fn program() -> Vec<ClassInfo> {
        vec![
            ClassInfo::new("a/A")
                .with_member("m", "(La/A;)V", 2)
                .with_member("f", "I", 2),
            ClassInfo::new("a/B").with_superclass("a/A"),
        ]
    }

    #[test]
    fn flag_keyed_by_original_identity() {
        let mut rules = interpreter(program());
        apply(
            &mut rules,
            "classes:\n  a/A: x/X\nmembers:\n  x/X m (Lx/X;)V: run\nflags:\n  x/X run (Lx/X;)V: 1\n  x/X f I: \"9\"\n",
        )
        .unwrap();

        let flags = rules.state().flags();
        let m = SymbolId::new(ClassToken::new("a/A"), "m", "(La/A;)V");
        let f = SymbolId::new(ClassToken::new("a/A"), "f", "I");
        assert_eq!(flags.get(&m), Some(1));
        assert_eq!(flags.get(&f), Some(9));
    }

    #[test]
    fn descriptor_is_mandatory() {
        let mut rules = interpreter(program());
        let err = apply(&mut rules, "flags:\n  a/A f: 1\n").unwrap_err();
        assert!(matches!(err.root_cause(), RuleError::MalformedRule(_)));
    }

    #[test]
    fn value_must_be_integer() {
        let mut rules = interpreter(program());
        let err = apply(&mut rules, "flags:\n  a/A f I: public\n").unwrap_err();
        assert!(matches!(err.root_cause(), RuleError::MalformedRule(_)));
    }

    #[test]
    fn inherited_or_unknown_targets_are_missing() {
        let mut rules = interpreter(program());
        let err = apply(&mut rules, "flags:\n  a/B m (La/A;)V: 1\n").unwrap_err();
        assert!(matches!(err.root_cause(), RuleError::Unresolved(_)));

        let mut rules = interpreter(program());
        let err = apply(&mut rules, "flags:\n  a/A nope ()V: 1\n").unwrap_err();
        assert!(matches!(err.root_cause(), RuleError::Unresolved(_)));
    }
}
