//! `members` section
//!
//! Accepted entry shapes:
//! - `"Class name descriptor": newName` (descriptor may be left out for fields)
//! - `Class: { name, map, description? }`
//! - `[ClassA, ClassB]: { name, map, description? }`
//! - `Class: { name: anchor, map: [n1, n2, ...] }` renames consecutive fields
//!
//! Method renames propagate to every subclass. Each entry carries a search
//! cache of the classes already handled so a class reached twice (directly
//! and through a parent) is renamed once.

use super::value::{entries, expect_scalar, render_entry};
use super::{RuleInterpreter, Section};
use crate::error::RuleError;
use crate::missing::MissingSymbol;
use indexmap::IndexSet;
use remap_symbol::{ClassToken, QualifiedMember, SymbolId};
use serde::Deserialize;
use serde_yaml::Value;

/// Structured member rule value
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StructuredRule {
    name: String,
    map: Target,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Target {
    Single(String),
    Sequence(Vec<String>),
}

impl StructuredRule {
    fn parse(value: &Value) -> Result<Self, RuleError> {
        serde_yaml::from_value(value.clone())
            .map_err(|err| RuleError::malformed(format!("invalid member rule: {err}")))
    }
}

/// Classes (load-time tokens) already handled for the current entry
type SearchCache = IndexSet<ClassToken>;

impl RuleInterpreter {
    pub(super) fn apply_members(&mut self, body: &Value) -> Result<(), RuleError> {
        for (key, value) in entries(body, Section::Members)? {
            let context = render_entry(key, value);
            let mut cache = SearchCache::new();

            if let Value::Sequence(classes) = key {
                let rule = StructuredRule::parse(value)?;
                for class in classes {
                    let class = expect_scalar(class, "class name")?;
                    self.apply_structured(&class, &rule, &mut cache, &context)?;
                }
                continue;
            }

            let key = expect_scalar(key, "member key")?;
            if key.contains(' ') {
                let member: QualifiedMember = key.parse()?;
                let new = expect_scalar(value, "member name")?;
                self.rename_member(
                    &member.class,
                    &member.name,
                    member.descriptor.as_deref(),
                    &new,
                    &mut cache,
                    &context,
                )?;
            } else {
                let rule = StructuredRule::parse(value)?;
                self.apply_structured(&key, &rule, &mut cache, &context)?;
            }
        }
        Ok(())
    }

    fn apply_structured(
        &mut self,
        class: &str,
        rule: &StructuredRule,
        cache: &mut SearchCache,
        context: &str,
    ) -> Result<(), RuleError> {
        match &rule.map {
            Target::Single(new) => self.rename_member(
                class,
                &rule.name,
                rule.description.as_deref(),
                new,
                cache,
                context,
            ),
            Target::Sequence(names) => {
                self.rename_field_sequence(class, &rule.name, rule.description.as_deref(), names, context)
            }
        }
    }

    fn rename_member(
        &mut self,
        class: &str,
        name: &str,
        descriptor: Option<&str>,
        new: &str,
        cache: &mut SearchCache,
        context: &str,
    ) -> Result<(), RuleError> {
        let Some(owner) = self.state.original_class(class).cloned() else {
            let missing = MissingSymbol::MemberClass {
                class: class.to_string(),
            };
            return self.policy.act(missing, context);
        };

        let Some(descriptor) = descriptor else {
            return self.rename_field_by_name(&owner, class, name, new, context);
        };

        let descriptor = self.state.unmap_descriptor(descriptor);
        let found = self.update_member(&owner, name, &descriptor, new, cache, context)?;

        if found && descriptor.starts_with('(') && !name.starts_with('<') {
            let descendants: Vec<ClassToken> = self.graph.rdepends(&owner).cloned().collect();
            for descendant in descendants {
                self.update_member(&descendant, name, &descriptor, new, cache, context)?;
            }
        }

        if self.find_parents {
            self.check_parents(name, &descriptor, cache);
        }
        Ok(())
    }

    /// Rename `owner.name descriptor` (load-time owner and descriptor,
    /// current name). Returns whether the member was found.
    fn update_member(
        &mut self,
        owner: &ClassToken,
        name: &str,
        descriptor: &str,
        new: &str,
        cache: &mut SearchCache,
        context: &str,
    ) -> Result<bool, RuleError> {
        if !cache.insert(owner.clone()) {
            return Ok(true);
        }

        let current = SymbolId::new(owner.clone(), name, descriptor);
        let Some(original) = self.state.original_signature(&current).cloned() else {
            let missing = MissingSymbol::Member {
                class: self.current_class_name(owner),
                name: name.to_string(),
                descriptor: self.state.map_descriptor(descriptor),
            };
            self.policy.act(missing, context)?;
            return Ok(false);
        };

        self.rename_original(original, current, new)?;
        Ok(true)
    }

    fn rename_original(&mut self, original: SymbolId, current: SymbolId, new: &str) -> Result<(), RuleError> {
        let target = current.with_name(new);
        match self.state.rename_signature(original.clone(), target) {
            Ok(_) => {
                tracing::debug!(%original, to = new, "member renamed");
                Ok(())
            }
            Err(conflict) => Err(RuleError::MemberConflict {
                original,
                current,
                existing: conflict.existing,
            }),
        }
    }

    fn rename_field_by_name(
        &mut self,
        owner: &ClassToken,
        class: &str,
        name: &str,
        new: &str,
        context: &str,
    ) -> Result<(), RuleError> {
        let fields = self.current_fields(owner);
        let matches: Vec<&(SymbolId, SymbolId)> =
            fields.iter().filter(|(_, current)| current.name() == name).collect();

        match matches.as_slice() {
            [] => {
                let missing = MissingSymbol::Field {
                    class: class.to_string(),
                    name: name.to_string(),
                    fields: fields.iter().map(|(_, c)| c.name().to_string()).collect(),
                };
                self.policy.act(missing, context)
            }
            [(original, current)] => self.rename_original(original.clone(), current.clone(), new),
            candidates => Err(RuleError::malformed(format!(
                "field name `{name}' is ambiguous in class `{class}' ({} fields share it); add a descriptor",
                candidates.len()
            ))),
        }
    }

    fn rename_field_sequence(
        &mut self,
        class: &str,
        anchor: &str,
        descriptor: Option<&str>,
        names: &[String],
        context: &str,
    ) -> Result<(), RuleError> {
        let Some(owner) = self.state.original_class(class).cloned() else {
            let missing = MissingSymbol::MemberClass {
                class: class.to_string(),
            };
            return self.policy.act(missing, context);
        };

        let descriptor = descriptor.map(|d| self.state.unmap_descriptor(d));
        let fields = self.current_fields(&owner);
        let start = fields.iter().position(|(_, current)| {
            current.name() == anchor
                && descriptor
                    .as_deref()
                    .map_or(true, |d| current.descriptor() == d)
        });

        let Some(start) = start else {
            let missing = MissingSymbol::Field {
                class: class.to_string(),
                name: anchor.to_string(),
                fields: fields.iter().map(|(_, c)| c.name().to_string()).collect(),
            };
            return self.policy.act(missing, context);
        };

        let remaining = &fields[start..];
        if remaining.len() < names.len() {
            return Err(RuleError::malformed(format!(
                "sequence mapping for `{class}' from `{anchor}' lists {} names but only {} fields remain",
                names.len(),
                remaining.len()
            )));
        }

        // Release every old name first so names may shift within the run.
        let renames: Vec<(SymbolId, SymbolId)> = remaining
            .iter()
            .zip(names)
            .map(|((original, current), new)| (original.clone(), current.with_name(new)))
            .collect();
        for (original, _) in &renames {
            self.state.release_signature(original);
        }
        for (original, target) in renames {
            let current = remaining
                .iter()
                .find(|(o, _)| *o == original)
                .map_or_else(|| original.clone(), |(_, c)| c.clone());
            if let Err(conflict) = self.state.rename_signature(original.clone(), target) {
                return Err(RuleError::MemberConflict {
                    original,
                    current,
                    existing: conflict.existing,
                });
            }
        }
        tracing::debug!(class, anchor, count = names.len(), "field sequence renamed");
        Ok(())
    }

    /// Advisory only: report ancestors that declare the member just renamed
    /// on their descendants.
    fn check_parents(&self, name: &str, descriptor: &str, cache: &SearchCache) {
        let mut reported = IndexSet::new();
        for class in cache {
            for ancestor in self.graph.depends(class) {
                if cache.contains(ancestor) || !reported.insert(ancestor.clone()) {
                    continue;
                }
                let inherited = SymbolId::new(ancestor.clone(), name, descriptor);
                if self.state.original_signature(&inherited).is_some() {
                    tracing::info!(
                        "parent {} also has {name} {}; the rename does not reach it",
                        self.current_class_name(ancestor),
                        self.state.map_descriptor(descriptor)
                    );
                }
            }
        }
    }

    /// `(original, current)` identities of the declared fields of `owner`
    fn current_fields(&self, owner: &ClassToken) -> Vec<(SymbolId, SymbolId)> {
        self.program
            .get(owner)
            .into_iter()
            .flat_map(|info| info.fields())
            .filter_map(|field| {
                let current = self.state.current_signature(&field.id)?;
                Some((field.id.clone(), current.clone()))
            })
            .collect()
    }

    fn current_class_name(&self, owner: &ClassToken) -> String {
        self.state
            .current_class(owner)
            .unwrap_or(owner)
            .to_string()
    }
}
