//! Rename state
//!
//! The evolving rename tables, keyed by load-time identities:
//! - `classes`: original token → current token
//! - `signatures`: original member → current member (same owner and
//!   descriptor as the key, only the name changes)
//! - `flags`: original member → access flag override
//!
//! Both rename tables are [`BiMap`]s, so no two originals can ever share a
//! current name. Inverse lookups translate names written in rules (which are
//! always current names) back to load-time identities.

use crate::graph::InheritanceGraph;
use crate::program::Program;
use indexmap::IndexMap;
use remap_symbol::descriptor::map_descriptor;
use remap_symbol::{BiMap, ClassToken, DuplicateTarget, SymbolId};

/// Access flag overrides keyed by load-time member identity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagTable {
    overrides: IndexMap<SymbolId, u32>,
}

impl FlagTable {
    /// Set the override for `member`, returning the previous one
    pub fn insert(&mut self, member: SymbolId, access: u32) -> Option<u32> {
        self.overrides.insert(member, access)
    }

    /// Override for `member`
    #[inline]
    #[must_use]
    pub fn get(&self, member: &SymbolId) -> Option<u32> {
        self.overrides.get(member).copied()
    }

    /// Declared flags unless overridden
    #[inline]
    #[must_use]
    pub fn access_for(&self, member: &SymbolId, declared: u32) -> u32 {
        self.get(member).unwrap_or(declared)
    }

    /// Number of overrides
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    /// Returns true if nothing is overridden
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}

/// Class and member rename tables plus flag overrides
#[derive(Debug, Clone, Default)]
pub struct RenameState {
    classes: BiMap<ClassToken, ClassToken>,
    signatures: BiMap<SymbolId, SymbolId>,
    flags: FlagTable,
}

impl RenameState {
    /// Create empty state
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed identity entries for a program
    ///
    /// Every class maps to itself and every declared member to itself. Each
    /// non-initializer method additionally gets an identity entry on every
    /// descendant class, so that calls through a subclass can be resolved
    /// and renamed.
    ///
    /// # Errors
    /// Identity entries cannot collide; an error here means the program
    /// declared the same member twice under different owners' names.
    pub fn seed(
        program: &Program,
        graph: &InheritanceGraph,
    ) -> Result<Self, DuplicateTarget<SymbolId, SymbolId>> {
        let members = program.classes().map(|c| c.members.len()).sum();
        let mut state = Self {
            classes: BiMap::with_capacity(program.len()),
            signatures: BiMap::with_capacity(members),
            flags: FlagTable::default(),
        };

        for info in program.classes() {
            // Class tokens are unique in a program.
            let _ = state.classes.insert(info.token.clone(), info.token.clone());

            for member in &info.members {
                state.signatures.insert(member.id.clone(), member.id.clone())?;
            }
        }

        for info in program.classes() {
            for method in info.methods().filter(|m| !m.id.is_initializer()) {
                for descendant in graph.rdepends(&info.token) {
                    let inherited = method.id.with_owner(descendant.clone());
                    state.signatures.insert(inherited.clone(), inherited)?;
                }
            }
        }

        tracing::debug!(
            classes = state.classes.len(),
            signatures = state.signatures.len(),
            "rename state seeded"
        );
        Ok(state)
    }

    /// Current name of a load-time class
    #[inline]
    #[must_use]
    pub fn current_class(&self, original: &str) -> Option<&ClassToken> {
        self.classes.get(original)
    }

    /// Load-time class currently named `current`
    #[inline]
    #[must_use]
    pub fn original_class(&self, current: &str) -> Option<&ClassToken> {
        self.classes.get_by_value(current)
    }

    /// Whether any class is currently named `current`
    #[inline]
    #[must_use]
    pub fn class_name_taken(&self, current: &str) -> bool {
        self.classes.contains_value(current)
    }

    /// Rename a load-time class
    ///
    /// # Errors
    /// Fails without change if another class already has the name.
    pub fn rename_class(
        &mut self,
        original: ClassToken,
        current: ClassToken,
    ) -> Result<Option<ClassToken>, DuplicateTarget<ClassToken, ClassToken>> {
        self.classes.insert(original, current)
    }

    /// Forget the current name of `original`
    pub(crate) fn release_class(&mut self, original: &str) -> Option<ClassToken> {
        self.classes.remove(original)
    }

    /// Iterate `(original, current)` class pairs
    pub fn classes(&self) -> impl Iterator<Item = (&ClassToken, &ClassToken)> {
        self.classes.iter()
    }

    /// Current identity of a load-time member
    #[inline]
    #[must_use]
    pub fn current_signature(&self, original: &SymbolId) -> Option<&SymbolId> {
        self.signatures.get(original)
    }

    /// Load-time member with this current identity
    ///
    /// `current` uses the load-time owner and descriptor with the current
    /// member name.
    #[inline]
    #[must_use]
    pub fn original_signature(&self, current: &SymbolId) -> Option<&SymbolId> {
        self.signatures.get_by_value(current)
    }

    /// Rename a load-time member
    ///
    /// # Errors
    /// Fails without change if another member already has the identity.
    pub fn rename_signature(
        &mut self,
        original: SymbolId,
        current: SymbolId,
    ) -> Result<Option<SymbolId>, DuplicateTarget<SymbolId, SymbolId>> {
        self.signatures.insert(original, current)
    }

    /// Forget the current name of member `original`
    pub(crate) fn release_signature(&mut self, original: &SymbolId) -> Option<SymbolId> {
        self.signatures.remove(original)
    }

    /// Iterate `(original, current)` member pairs
    pub fn signatures(&self) -> impl Iterator<Item = (&SymbolId, &SymbolId)> {
        self.signatures.iter()
    }

    /// Flag overrides
    #[inline]
    #[must_use]
    pub fn flags(&self) -> &FlagTable {
        &self.flags
    }

    /// Mutable flag overrides
    #[inline]
    pub fn flags_mut(&mut self) -> &mut FlagTable {
        &mut self.flags
    }

    /// Rewrite a descriptor written with current class names to load-time names
    #[must_use]
    pub fn unmap_descriptor(&self, descriptor: &str) -> String {
        map_descriptor(descriptor, |name| {
            self.original_class(name).map(ClassToken::as_str)
        })
    }

    /// Rewrite a descriptor written with load-time class names to current names
    #[must_use]
    pub fn map_descriptor(&self, descriptor: &str) -> String {
        map_descriptor(descriptor, |name| {
            self.current_class(name).map(ClassToken::as_str)
        })
    }

    /// Number of classes whose current name differs from the load-time name
    #[must_use]
    pub fn renamed_classes(&self) -> usize {
        self.classes.iter().filter(|(k, v)| k != v).count()
    }

    /// Number of declared or inherited member entries with a new name
    #[must_use]
    pub fn renamed_signatures(&self) -> usize {
        self.signatures
            .iter()
            .filter(|(k, v)| k.name() != v.name())
            .count()
    }
}
