//! Missing-symbol policy
//!
//! Decides what happens when a rule names a class or member that does not
//! exist under its current name.

use crate::error::RuleError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Reaction to an unresolved rule target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingPolicy {
    /// Log a warning and skip the rule
    #[default]
    Warn,
    /// Abort with [`RuleError::Unresolved`]
    Fail,
    /// Skip silently
    Ignore,
    /// Log a warning plus the rule it came from
    Verbose,
}

/// What a rule failed to resolve
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissingSymbol {
    /// No class currently has this name
    Class {
        /// Current class name
        name: String,
    },
    /// Member rule names a class that does not exist
    MemberClass {
        /// Current class name
        class: String,
    },
    /// No member with this current identity
    Member {
        /// Current class name
        class: String,
        /// Current member name
        name: String,
        /// Descriptor as written in the rule
        descriptor: String,
    },
    /// No field with this current name
    Field {
        /// Current class name
        class: String,
        /// Current field name
        name: String,
        /// Current names of the class's fields
        fields: Vec<String>,
    },
    /// Flag rule target does not exist
    Flag {
        /// The rule key
        key: String,
    },
}

impl Display for MissingSymbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class { name } => write!(f, "could not find class `{name}'"),
            Self::MemberClass { class } => {
                write!(f, "could not find class `{class}' for member mapping")
            }
            Self::Member {
                class,
                name,
                descriptor,
            } => write!(f, "could not find member `{name} {descriptor}' in class `{class}'"),
            Self::Field {
                class,
                name,
                fields,
            } => write!(
                f,
                "could not find field name `{name}' in fields `{}' of class `{class}'",
                fields.join(", ")
            ),
            Self::Flag { key } => write!(f, "could not find flag target `{key}'"),
        }
    }
}

impl MissingPolicy {
    /// Apply the policy
    ///
    /// `context` describes the rule being applied; only `verbose` logs it.
    ///
    /// # Errors
    /// [`RuleError::Unresolved`] under the `fail` policy.
    pub fn act(self, missing: MissingSymbol, context: impl Display) -> Result<(), RuleError> {
        match self {
            Self::Ignore => Ok(()),
            Self::Fail => Err(RuleError::Unresolved(missing)),
            Self::Warn => {
                tracing::warn!("{missing}");
                Ok(())
            }
            Self::Verbose => {
                tracing::warn!("{missing}");
                tracing::info!("Verbose:\n{context}");
                Ok(())
            }
        }
    }

    /// Parse a policy name, falling back to `warn` for unknown names
    #[must_use]
    pub fn parse_lenient(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            tracing::warn!("unknown missing-symbol policy `{name}', using `warn'");
            Self::Warn
        })
    }

    /// Whether loaded classes should be logged at info level
    #[inline]
    #[must_use]
    pub fn is_verbose(self) -> bool {
        self == Self::Verbose
    }
}

impl FromStr for MissingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "warn" => Ok(Self::Warn),
            "fail" => Ok(Self::Fail),
            "ignore" => Ok(Self::Ignore),
            "verbose" => Ok(Self::Verbose),
            other => Err(format!("unknown missing-symbol policy: {other}")),
        }
    }
}

impl Display for MissingPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Warn => "warn",
            Self::Fail => "fail",
            Self::Ignore => "ignore",
            Self::Verbose => "verbose",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(name: &str) -> MissingSymbol {
        MissingSymbol::Class {
            name: name.to_string(),
        }
    }

    #[test]
    fn only_fail_errors() {
        for policy in [MissingPolicy::Warn, MissingPolicy::Ignore, MissingPolicy::Verbose] {
            assert!(policy.act(class("a/X"), "ctx").is_ok());
        }
        let err = MissingPolicy::Fail.act(class("a/X"), "ctx").unwrap_err();
        assert!(matches!(err, RuleError::Unresolved(MissingSymbol::Class { ref name }) if name == "a/X"));
    }

    #[test]
    fn parse_names() {
        assert_eq!("FAIL".parse::<MissingPolicy>().unwrap(), MissingPolicy::Fail);
        assert_eq!("verbose".parse::<MissingPolicy>().unwrap(), MissingPolicy::Verbose);
        assert!("loud".parse::<MissingPolicy>().is_err());
        assert_eq!(MissingPolicy::parse_lenient("loud"), MissingPolicy::Warn);
        assert_eq!(MissingPolicy::Ignore.to_string(), "ignore");
    }

    #[test]
    fn field_message_lists_candidates() {
        let missing = MissingSymbol::Field {
            class: "a/A".to_string(),
            name: "x".to_string(),
            fields: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(
            missing.to_string(),
            "could not find field name `x' in fields `a, b' of class `a/A'"
        );
    }
}
