//! Dependency Sequencer
//!
//! Reorders a collection so that every token appears after the tokens it
//! requires, honoring soft preferences where possible.
//!
//! # Algorithm
//!
//! - An [`Informer`] reports hard requirements and soft preferences per token
//! - Every required token must itself be part of the input
//! - Each pass places, in current order, every token whose requirements and
//!   preferences are already placed
//! - A pass with no progress falls back to requirements only and places the
//!   first eligible token, dropping its preferences
//! - No progress on the fallback either means a requirement cycle

use indexmap::IndexSet;
use std::collections::{HashMap, VecDeque};
use std::fmt::Debug;
use std::hash::Hash;

/// Ordering failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SequenceError {
    /// A required predecessor is not part of the input
    #[error("token {token} requires tokens not present in the input: {missing}")]
    UnmetPrecedingToken {
        /// The dependent token
        token: String,
        /// Required tokens absent from the input
        missing: String,
    },

    /// Requirements form a cycle
    #[error("circular order among remaining tokens: {unresolved}")]
    CircularOrder {
        /// Remaining tokens and their unplaced requirements
        unresolved: String,
    },
}

/// Source of ordering constraints
///
/// Each method appends to `into`; the defaults contribute nothing.
pub trait Informer<T> {
    /// Tokens that must come before `token`
    fn add_preceding_to(&self, _token: &T, _into: &mut Vec<T>) {}

    /// Tokens that should come before `token`
    fn add_preceding_preferences_to(&self, _token: &T, _into: &mut Vec<T>) {}

    /// Tokens that `token` should come before
    fn add_proceeding_preferences_to(&self, _token: &T, _into: &mut Vec<T>) {}
}

/// [`Informer`] built from a closure reporting hard requirements only
pub struct Requires<F>(pub F);

impl<T, F> Informer<T> for Requires<F>
where
    F: Fn(&T, &mut Vec<T>),
{
    fn add_preceding_to(&self, token: &T, into: &mut Vec<T>) {
        (self.0)(token, into);
    }
}

type Constraints<T> = HashMap<T, VecDeque<T>>;

/// Order `input` so that requirements precede their dependents
///
/// Duplicate tokens are collapsed to their first occurrence. Tokens without
/// constraints keep their relative input order.
///
/// # Errors
/// [`SequenceError::UnmetPrecedingToken`] if a requirement is missing from
/// the input, [`SequenceError::CircularOrder`] if requirements are cyclic.
///
/// # Example
/// ```
/// use remap_kernel::sequencer::{process, Requires};
///
/// fn parents(token: &&'static str, into: &mut Vec<&'static str>) {
///     if *token == "child" {
///         into.push("parent");
///     }
/// }
///
/// let ordered = process(["child", "other", "parent"], &Requires(parents)).unwrap();
/// assert_eq!(ordered, vec!["other", "parent", "child"]);
/// ```
pub fn process<T, I, N>(input: I, informer: &N) -> Result<Vec<T>, SequenceError>
where
    T: Eq + Hash + Clone + Debug,
    I: IntoIterator<Item = T>,
    N: Informer<T> + ?Sized,
{
    let mut pending: IndexSet<T> = input.into_iter().collect();
    let mut preferred: Constraints<T> = HashMap::new();
    let mut required: Constraints<T> = HashMap::new();
    let mut buffer = Vec::new();

    for token in &pending {
        informer.add_preceding_preferences_to(token, &mut buffer);
        append(&mut preferred, token, &mut buffer);

        informer.add_preceding_to(token, &mut buffer);
        let missing: Vec<&T> = buffer.iter().filter(|t| !pending.contains(*t)).collect();
        if !missing.is_empty() {
            return Err(SequenceError::UnmetPrecedingToken {
                token: format!("{token:?}"),
                missing: format!("{missing:?}"),
            });
        }
        append(&mut required, token, &mut buffer);

        informer.add_proceeding_preferences_to(token, &mut buffer);
        for successor in buffer.drain(..) {
            preferred
                .entry(successor)
                .or_default()
                .push_back(token.clone());
        }
    }

    let mut ordered = Vec::with_capacity(pending.len());
    while !pending.is_empty() {
        let before = pending.len();

        let snapshot: Vec<T> = pending.iter().cloned().collect();
        for token in snapshot {
            if is_satisfied(&token, &mut preferred, &pending)
                && is_satisfied(&token, &mut required, &pending)
            {
                pending.shift_remove(&token);
                ordered.push(token);
            }
        }

        if pending.len() == before {
            let fallback = pending
                .iter()
                .position(|token| required_placed(token, &required, &pending));
            match fallback.and_then(|index| pending.shift_remove_index(index)) {
                Some(token) => {
                    preferred.remove(&token);
                    ordered.push(token);
                }
                None => break,
            }
        }
    }

    if !pending.is_empty() {
        let unresolved: Vec<String> = pending
            .iter()
            .map(|token| match required.get(token) {
                Some(deps) => format!("{token:?} <- {deps:?}"),
                None => format!("{token:?}"),
            })
            .collect();
        tracing::debug!(remaining = pending.len(), "sequencer found a cycle");
        return Err(SequenceError::CircularOrder {
            unresolved: unresolved.join(", "),
        });
    }

    Ok(ordered)
}

fn append<T>(constraints: &mut Constraints<T>, token: &T, buffer: &mut Vec<T>)
where
    T: Eq + Hash + Clone,
{
    if buffer.is_empty() {
        return;
    }
    constraints
        .entry(token.clone())
        .or_default()
        .extend(buffer.drain(..));
}

/// Prunes already-placed constraints from the front of the queue and reports
/// whether none remain.
fn is_satisfied<T>(token: &T, constraints: &mut Constraints<T>, pending: &IndexSet<T>) -> bool
where
    T: Eq + Hash,
{
    let Some(queue) = constraints.get_mut(token) else {
        return true;
    };
    while let Some(front) = queue.front() {
        if pending.contains(front) {
            return false;
        }
        queue.pop_front();
    }
    constraints.remove(token);
    true
}

fn required_placed<T>(token: &T, required: &Constraints<T>, pending: &IndexSet<T>) -> bool
where
    T: Eq + Hash,
{
    required
        .get(token)
        .map_or(true, |deps| deps.iter().all(|dep| !pending.contains(dep)))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Table(Vec<(&'static str, &'static str)>);

    impl Informer<&'static str> for Table {
        fn add_preceding_to(&self, token: &&'static str, into: &mut Vec<&'static str>) {
            into.extend(
                self.0
                    .iter()
                    .filter(|(child, _)| child == token)
                    .map(|(_, parent)| *parent),
            );
        }
    }

    struct Prefers {
        before: Vec<(&'static str, &'static str)>,
        cycle: bool,
    }

    impl Informer<&'static str> for Prefers {
        fn add_preceding_to(&self, token: &&'static str, into: &mut Vec<&'static str>) {
            if self.cycle && *token == "a" {
                into.push("z");
            }
        }

        fn add_preceding_preferences_to(&self, token: &&'static str, into: &mut Vec<&'static str>) {
            into.extend(
                self.before
                    .iter()
                    .filter(|(later, _)| later == token)
                    .map(|(_, earlier)| *earlier),
            );
        }
    }

    #[test]
    fn unconstrained_keeps_input_order() {
        let ordered = process(vec!["c", "a", "b"], &Table(vec![])).unwrap();
        assert_eq!(ordered, vec!["c", "a", "b"]);
    }

    #[test]
    fn requirements_come_first() {
        let table = Table(vec![("c", "b"), ("b", "a")]);
        let ordered = process(vec!["c", "b", "a"], &table).unwrap();
        assert_eq!(ordered, vec!["a", "b", "c"]);
    }

    #[test]
    fn duplicates_collapse() {
        let ordered = process(vec!["a", "b", "a"], &Table(vec![])).unwrap();
        assert_eq!(ordered, vec!["a", "b"]);
    }

    #[test]
    fn missing_requirement_is_reported() {
        let table = Table(vec![("b", "ghost")]);
        let err = process(vec!["a", "b"], &table).unwrap_err();
        assert!(matches!(err, SequenceError::UnmetPrecedingToken { ref token, .. } if token == "\"b\""));
    }

    #[test]
    fn cycle_is_reported() {
        let table = Table(vec![("a", "b"), ("b", "a"), ("c", "a")]);
        let err = process(vec!["a", "b", "c", "d"], &table).unwrap_err();
        match err {
            SequenceError::CircularOrder { unresolved } => {
                assert!(unresolved.contains("\"a\""));
                assert!(unresolved.contains("\"b\""));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn self_requirement_is_a_cycle() {
        let table = Table(vec![("a", "a")]);
        assert!(matches!(
            process(vec!["a"], &table),
            Err(SequenceError::CircularOrder { .. })
        ));
    }

    #[test]
    fn preferences_reorder_when_possible() {
        let prefers = Prefers {
            before: vec![("a", "b")],
            cycle: false,
        };
        let ordered = process(vec!["a", "b"], &prefers).unwrap();
        assert_eq!(ordered, vec!["b", "a"]);
    }

    #[test]
    fn conflicting_preferences_fall_back() {
        let prefers = Prefers {
            before: vec![("a", "b"), ("b", "a")],
            cycle: false,
        };
        let ordered = process(vec!["a", "b"], &prefers).unwrap();
        assert_eq!(ordered.len(), 2);
        assert_eq!(ordered[0], "a");
    }

    #[test]
    fn proceeding_preferences_apply_to_successor() {
        struct Before;
        impl Informer<u32> for Before {
            fn add_proceeding_preferences_to(&self, token: &u32, into: &mut Vec<u32>) {
                if *token == 3 {
                    into.push(1);
                }
            }
        }
        let ordered = process(vec![1, 2, 3], &Before).unwrap();
        assert_eq!(ordered, vec![2, 3, 1]);
    }

    #[test]
    fn requirement_reorders_input() {
        let prefers = Prefers {
            before: vec![],
            cycle: true,
        };
        assert!(matches!(
            process(vec!["a", "z"], &prefers),
            Ok(ordered) if ordered == vec!["z", "a"]
        ));
    }
}
