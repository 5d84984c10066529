//! Class tokens and member identities
//!
//! Provides [`ClassToken`] for internal class names and [`SymbolId`] for the
//! `(owner, name, descriptor)` triple that identifies a field or method
//! declaration site.

use std::borrow::Borrow;
use std::fmt::{self, Display, Formatter};
use std::ops::Deref;
use std::str::FromStr;
use std::sync::Arc;

/// Fully qualified internal name of a class (`com/example/Foo`)
///
/// Cheap to clone; equality and hash are those of the underlying string, so
/// maps keyed by `ClassToken` can be queried with a plain `&str`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassToken(Arc<str>);

impl ClassToken {
    /// Create a token from an internal name
    #[inline]
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// Internal name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Package portion of the name, empty for the default package
    #[must_use]
    pub fn package(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[..idx],
            None => "",
        }
    }

    /// Simple (unqualified) name
    #[must_use]
    pub fn simple_name(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }

    /// Whether the class belongs to the platform library (`java/`, `javax/`)
    ///
    /// Platform types can never be part of a loaded program.
    #[must_use]
    pub fn is_platform(&self) -> bool {
        self.0.starts_with("java/") || self.0.starts_with("javax/")
    }
}

impl Borrow<str> for ClassToken {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Deref for ClassToken {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ClassToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ClassToken {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ClassToken {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

impl Display for ClassToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of a class member
///
/// Two identities are equal iff owner, name and descriptor are all equal.
/// A descriptor starting with `(` denotes a method, anything else a field.
///
/// # Example
/// ```
/// use remap_symbol::{ClassToken, SymbolId};
///
/// let run = SymbolId::new(ClassToken::new("a/Task"), "run", "()V");
/// assert!(run.is_method());
///
/// let renamed = run.with_name("execute");
/// assert_eq!(renamed.owner(), run.owner());
/// assert_eq!(renamed.descriptor(), "()V");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolId {
    owner: ClassToken,
    name: Arc<str>,
    descriptor: Arc<str>,
}

impl SymbolId {
    /// Create a new identity
    #[inline]
    #[must_use]
    pub fn new(owner: ClassToken, name: impl AsRef<str>, descriptor: impl AsRef<str>) -> Self {
        Self {
            owner,
            name: Arc::from(name.as_ref()),
            descriptor: Arc::from(descriptor.as_ref()),
        }
    }

    /// Owning class
    #[inline]
    #[must_use]
    pub fn owner(&self) -> &ClassToken {
        &self.owner
    }

    /// Element name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type descriptor
    #[inline]
    #[must_use]
    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    /// True iff the descriptor begins with `(`
    #[inline]
    #[must_use]
    pub fn is_method(&self) -> bool {
        self.descriptor.starts_with('(')
    }

    /// Instance or static initializer (`<init>`, `<clinit>`)
    ///
    /// Initializers are never inherited.
    #[inline]
    #[must_use]
    pub fn is_initializer(&self) -> bool {
        self.is_method() && self.name.starts_with('<')
    }

    /// Same name and descriptor on a different owner
    #[inline]
    #[must_use]
    pub fn with_owner(&self, owner: ClassToken) -> Self {
        Self {
            owner,
            name: Arc::clone(&self.name),
            descriptor: Arc::clone(&self.descriptor),
        }
    }

    /// Same owner and descriptor with a different element name
    #[inline]
    #[must_use]
    pub fn with_name(&self, name: impl AsRef<str>) -> Self {
        Self {
            owner: self.owner.clone(),
            name: Arc::from(name.as_ref()),
            descriptor: Arc::clone(&self.descriptor),
        }
    }
}

impl Display for SymbolId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} {}", self.owner, self.name, self.descriptor)
    }
}

/// A member reference as written in a rule key
///
/// Format: `Class name descriptor`, or `Class name` when the descriptor is
/// left out. Names refer to the *current* (possibly already renamed) names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedMember {
    /// Current class name
    pub class: String,
    /// Current member name
    pub name: String,
    /// Descriptor using current class names, if given
    pub descriptor: Option<String>,
}

impl QualifiedMember {
    /// Descriptor, failing if the key left it out
    ///
    /// # Errors
    /// Returns [`SymbolError::MissingDescriptor`] for `Class name` keys.
    pub fn require_descriptor(&self) -> Result<&str, SymbolError> {
        self.descriptor
            .as_deref()
            .ok_or_else(|| SymbolError::MissingDescriptor(format!("{} {}", self.class, self.name)))
    }
}

impl FromStr for QualifiedMember {
    type Err = SymbolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || SymbolError::MalformedMember(s.to_string());
        let parts: Vec<&str> = s.split(' ').collect();
        let member = match parts.as_slice() {
            [class, name] => Self {
                class: (*class).to_string(),
                name: (*name).to_string(),
                descriptor: None,
            },
            [class, name, descriptor] => {
                if descriptor.is_empty() {
                    return Err(malformed());
                }
                Self {
                    class: (*class).to_string(),
                    name: (*name).to_string(),
                    descriptor: Some((*descriptor).to_string()),
                }
            }
            _ => return Err(malformed()),
        };
        if member.class.is_empty() || member.name.is_empty() {
            return Err(malformed());
        }
        Ok(member)
    }
}

impl Display for QualifiedMember {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.descriptor {
            Some(descriptor) => write!(f, "{} {} {}", self.class, self.name, descriptor),
            None => write!(f, "{} {}", self.class, self.name),
        }
    }
}

/// Errors for symbol parsing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SymbolError {
    /// Key is not `Class name [descriptor]`
    #[error("malformed mapping `{0}'")]
    MalformedMember(String),

    /// Descriptor required but not given
    #[error("mapping `{0}' requires a descriptor")]
    MissingDescriptor(String),
}
