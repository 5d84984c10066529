//! Loaded program model
//!
//! A [`Program`] is the closed set of classes being remapped, keyed by their
//! load-time [`ClassToken`]. It is built once from the codec's parse results,
//! reordered once so that ancestors precede descendants, and read-only after.

use crate::error::RemapError;
use indexmap::IndexMap;
use remap_kernel::sequencer::{self, Informer, SequenceError};
use remap_symbol::{ClassToken, SymbolId};

/// Access flag marking an enum constant field
pub const ACC_ENUM: u32 = 0x4000;

/// One declared field or method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    /// Load-time identity
    pub id: SymbolId,
    /// Declared access flags
    pub access: u32,
}

impl MemberInfo {
    /// Create member info
    #[inline]
    #[must_use]
    pub fn new(id: SymbolId, access: u32) -> Self {
        Self { id, access }
    }

    /// Whether this is a field declared as an enum constant
    #[inline]
    #[must_use]
    pub fn is_enum_constant(&self) -> bool {
        !self.id.is_method() && self.access & ACC_ENUM != 0
    }
}

/// Structural summary of one class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassInfo {
    /// Load-time class name
    pub token: ClassToken,
    /// Direct superclass, if any
    pub superclass: Option<ClassToken>,
    /// Directly implemented interfaces, platform types excluded
    pub interfaces: Vec<ClassToken>,
    /// Declared members in declaration order
    pub members: Vec<MemberInfo>,
}

impl ClassInfo {
    /// Create class info with no parents or members
    #[must_use]
    pub fn new(token: impl Into<ClassToken>) -> Self {
        Self {
            token: token.into(),
            superclass: None,
            interfaces: Vec::new(),
            members: Vec::new(),
        }
    }

    /// With superclass
    #[must_use]
    pub fn with_superclass(mut self, superclass: impl Into<ClassToken>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    /// With an implemented interface; platform interfaces are dropped
    #[must_use]
    pub fn with_interface(mut self, interface: impl Into<ClassToken>) -> Self {
        let interface = interface.into();
        if !interface.is_platform() {
            self.interfaces.push(interface);
        }
        self
    }

    /// With a declared member
    #[must_use]
    pub fn with_member(mut self, name: &str, descriptor: &str, access: u32) -> Self {
        let id = SymbolId::new(self.token.clone(), name, descriptor);
        self.members.push(MemberInfo::new(id, access));
        self
    }

    /// Superclass followed by interfaces
    pub fn parents(&self) -> impl Iterator<Item = &ClassToken> {
        self.superclass.iter().chain(self.interfaces.iter())
    }

    /// Declared fields in order
    pub fn fields(&self) -> impl Iterator<Item = &MemberInfo> {
        self.members.iter().filter(|m| !m.id.is_method())
    }

    /// Declared methods in order
    pub fn methods(&self) -> impl Iterator<Item = &MemberInfo> {
        self.members.iter().filter(|m| m.id.is_method())
    }

    /// Declared member with exactly this identity
    #[must_use]
    pub fn member(&self, id: &SymbolId) -> Option<&MemberInfo> {
        self.members.iter().find(|m| &m.id == id)
    }
}

/// Insertion-ordered set of loaded classes
#[derive(Debug, Clone, Default)]
pub struct Program {
    classes: IndexMap<ClassToken, ClassInfo>,
}

impl Program {
    /// Create empty program
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a class
    ///
    /// # Errors
    /// [`RemapError::DuplicateClass`] if the token is already loaded.
    pub fn insert(&mut self, info: ClassInfo) -> Result<(), RemapError> {
        if self.classes.contains_key(&info.token) {
            return Err(RemapError::DuplicateClass(info.token));
        }
        self.classes.insert(info.token.clone(), info);
        Ok(())
    }

    /// Class by load-time name
    #[inline]
    #[must_use]
    pub fn get(&self, token: &str) -> Option<&ClassInfo> {
        self.classes.get(token)
    }

    /// Whether the class is part of the program
    #[inline]
    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        self.classes.contains_key(token)
    }

    /// Classes in program order
    pub fn classes(&self) -> impl Iterator<Item = &ClassInfo> {
        self.classes.values()
    }

    /// Class tokens in program order
    pub fn tokens(&self) -> impl Iterator<Item = &ClassToken> {
        self.classes.keys()
    }

    /// Number of classes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns true if no class is loaded
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// In-program parents of `token`
    pub fn local_parents<'a>(&'a self, token: &str) -> impl Iterator<Item = &'a ClassToken> + 'a {
        self.get(token)
            .into_iter()
            .flat_map(ClassInfo::parents)
            .filter(move |parent| self.contains(parent))
    }

    /// Reorder so every class follows its in-program superclass and interfaces
    ///
    /// # Errors
    /// [`SequenceError::CircularOrder`] if the hierarchy is cyclic.
    pub fn sequenced(mut self) -> Result<Self, SequenceError> {
        let order = sequencer::process(self.classes.keys().cloned().collect::<Vec<_>>(), &self)?;
        let mut classes = IndexMap::with_capacity(order.len());
        for token in order {
            if let Some(info) = self.classes.swap_remove(&token) {
                classes.insert(token, info);
            }
        }
        Ok(Self { classes })
    }
}

impl Informer<ClassToken> for Program {
    fn add_preceding_to(&self, token: &ClassToken, into: &mut Vec<ClassToken>) {
        into.extend(self.local_parents(token).cloned());
    }
}

impl FromIterator<ClassInfo> for Program {
    /// Later duplicates replace earlier ones; use [`Program::insert`] to detect them.
    fn from_iter<I: IntoIterator<Item = ClassInfo>>(iter: I) -> Self {
        Self {
            classes: iter
                .into_iter()
                .map(|info| (info.token.clone(), info))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(program: &Program) -> Vec<&str> {
        program.tokens().map(ClassToken::as_str).collect()
    }

    #[test]
    fn duplicate_class_rejected() {
        let mut program = Program::new();
        program.insert(ClassInfo::new("a/A")).unwrap();
        let err = program.insert(ClassInfo::new("a/A")).unwrap_err();
        assert!(matches!(err, RemapError::DuplicateClass(token) if token.as_str() == "a/A"));
    }

    #[test]
    fn platform_interfaces_are_dropped() {
        let info = ClassInfo::new("a/A")
            .with_interface("java/lang/Runnable")
            .with_interface("a/I");
        assert_eq!(info.interfaces, vec![ClassToken::new("a/I")]);
    }

    #[test]
    fn sequencing_puts_parents_first() {
        let program: Program = [
            ClassInfo::new("a/C").with_superclass("a/B"),
            ClassInfo::new("a/B").with_superclass("a/A").with_interface("a/I"),
            ClassInfo::new("a/I"),
            ClassInfo::new("a/A").with_superclass("java/lang/Object"),
        ]
        .into_iter()
        .collect();

        let ordered = program.sequenced().unwrap();
        assert_eq!(names(&ordered), vec!["a/I", "a/A", "a/B", "a/C"]);
    }

    #[test]
    fn hierarchy_cycle_detected() {
        let program: Program = [
            ClassInfo::new("a/A").with_superclass("a/B"),
            ClassInfo::new("a/B").with_superclass("a/A"),
        ]
        .into_iter()
        .collect();

        assert!(matches!(
            program.sequenced(),
            Err(SequenceError::CircularOrder { .. })
        ));
    }

    #[test]
    fn enum_constants_are_fields_only() {
        let info = ClassInfo::new("a/E")
            .with_member("RED", "La/E;", ACC_ENUM | 0x19)
            .with_member("values", "()[La/E;", ACC_ENUM);
        let flagged: Vec<_> = info
            .members
            .iter()
            .filter(|m| m.is_enum_constant())
            .map(|m| m.id.name())
            .collect();
        assert_eq!(flagged, vec!["RED"]);
    }
}
