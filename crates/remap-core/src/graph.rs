//! Inheritance graph
//!
//! `depends[c]` holds every in-program ancestor of `c` (superclasses and
//! interfaces, transitively); `rdepends` is its exact inverse. Ancestors
//! outside the program are silently excluded. Both are computed once and
//! read-only afterward.

use crate::program::Program;
use indexmap::IndexSet;
use remap_symbol::ClassToken;
use std::collections::HashMap;

type Closure = HashMap<ClassToken, IndexSet<ClassToken>>;

/// Transitive ancestor / descendant sets for a program
#[derive(Debug, Clone, Default)]
pub struct InheritanceGraph {
    depends: Closure,
    rdepends: Closure,
}

impl InheritanceGraph {
    /// Build the graph
    ///
    /// Expects a sequenced program (ancestors first) so each class can reuse
    /// the closure already computed for its parents; unsequenced input is
    /// still handled by walking up the hierarchy.
    #[must_use]
    pub fn build(program: &Program) -> Self {
        let mut depends: Closure = HashMap::with_capacity(program.len());

        for info in program.classes() {
            let mut ancestors = IndexSet::new();
            let mut stack: Vec<&ClassToken> = program.local_parents(&info.token).collect();
            stack.reverse();

            while let Some(parent) = stack.pop() {
                if *parent == info.token || !ancestors.insert(parent.clone()) {
                    continue;
                }
                match depends.get(parent) {
                    Some(known) => ancestors.extend(known.iter().cloned()),
                    None => {
                        let mut grand: Vec<&ClassToken> = program.local_parents(parent).collect();
                        grand.reverse();
                        stack.extend(grand);
                    }
                }
            }
            ancestors.shift_remove(&info.token);
            depends.insert(info.token.clone(), ancestors);
        }

        let mut rdepends: Closure = HashMap::with_capacity(program.len());
        for token in program.tokens() {
            rdepends.entry(token.clone()).or_default();
            if let Some(ancestors) = depends.get(token) {
                for ancestor in ancestors {
                    rdepends
                        .entry(ancestor.clone())
                        .or_default()
                        .insert(token.clone());
                }
            }
        }

        tracing::debug!(classes = program.len(), "inheritance graph built");
        Self { depends, rdepends }
    }

    /// Every in-program ancestor of `token`
    pub fn depends(&self, token: &str) -> impl Iterator<Item = &ClassToken> {
        self.depends.get(token).into_iter().flatten()
    }

    /// Every in-program descendant of `token`
    pub fn rdepends(&self, token: &str) -> impl Iterator<Item = &ClassToken> {
        self.rdepends.get(token).into_iter().flatten()
    }

    /// Whether `ancestor` is a transitive parent of `token`
    #[must_use]
    pub fn is_ancestor(&self, token: &str, ancestor: &str) -> bool {
        self.depends
            .get(token)
            .is_some_and(|set| set.contains(ancestor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::ClassInfo;

    fn diamond() -> Program {
        // I <- A <- B <- C, and J <- C
        [
            ClassInfo::new("p/I"),
            ClassInfo::new("p/J").with_interface("p/I"),
            ClassInfo::new("p/A").with_interface("p/I"),
            ClassInfo::new("p/B").with_superclass("p/A"),
            ClassInfo::new("p/C")
                .with_superclass("p/B")
                .with_interface("p/J")
                .with_interface("x/External"),
        ]
        .into_iter()
        .collect()
    }

    fn sorted<'a>(iter: impl Iterator<Item = &'a ClassToken>) -> Vec<&'a str> {
        let mut names: Vec<&str> = iter.map(ClassToken::as_str).collect();
        names.sort_unstable();
        names
    }

    #[test]
    fn depends_is_transitive_and_local() {
        let graph = InheritanceGraph::build(&diamond());
        assert_eq!(sorted(graph.depends("p/C")), vec!["p/A", "p/B", "p/I", "p/J"]);
        assert_eq!(sorted(graph.depends("p/I")), Vec::<&str>::new());
        assert!(graph.is_ancestor("p/C", "p/I"));
        assert!(!graph.is_ancestor("p/C", "x/External"));
    }

    #[test]
    fn rdepends_is_inverse() {
        let program = diamond();
        let graph = InheritanceGraph::build(&program);
        assert_eq!(sorted(graph.rdepends("p/I")), vec!["p/A", "p/B", "p/C", "p/J"]);
        assert_eq!(sorted(graph.rdepends("p/A")), vec!["p/B", "p/C"]);

        for child in program.tokens() {
            for parent in graph.depends(child) {
                assert!(graph.rdepends(parent).any(|t| t == child));
            }
        }
    }

    #[test]
    fn unsequenced_input_gives_same_closure() {
        let mut classes: Vec<ClassInfo> = diamond().classes().cloned().collect();
        classes.reverse();
        let reversed: Program = classes.into_iter().collect();
        let graph = InheritanceGraph::build(&reversed);
        assert_eq!(sorted(graph.depends("p/C")), vec!["p/A", "p/B", "p/I", "p/J"]);
    }
}
