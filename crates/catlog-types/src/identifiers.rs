//! Type-safe identifiers for categories and timers.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use crate::errors::{CatlogError, Result};

/// A validated category name.
///
/// Category names are opaque keys: any non-empty string without control
/// characters is accepted. Dots carry no meaning; the hierarchy comes only
/// from explicit parent declarations.
///
/// # Example
///
/// ```
/// use catlog_types::CategoryName;
///
/// let cat = CategoryName::new("db.pool").unwrap();
/// assert_eq!(cat.as_str(), "db.pool");
///
/// assert!(CategoryName::new("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a new validated category name.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the name is empty or contains control
    /// characters.
    pub fn new(name: impl AsRef<str>) -> Result<Self> {
        let name = name.as_ref();
        if !Self::is_valid(name) {
            return Err(CatlogError::InvalidArgument(format!(
                "Invalid category name '{}': must be non-empty and free of control characters",
                name.escape_debug()
            )));
        }
        Ok(Self(name.to_string()))
    }

    /// Check if a name is valid without allocating.
    pub fn is_valid(name: &str) -> bool {
        !name.is_empty() && !name.chars().any(char::is_control)
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CategoryName {
    type Err = CatlogError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for CategoryName {
    type Error = CatlogError;

    fn try_from(s: String) -> Result<Self> {
        if !Self::is_valid(&s) {
            return Self::new(s);
        }
        Ok(Self(s))
    }
}

impl TryFrom<&str> for CategoryName {
    type Error = CatlogError;

    fn try_from(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl From<CategoryName> for String {
    fn from(c: CategoryName) -> Self {
        c.0
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for CategoryName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Identity token for an in-flight timer.
///
/// Any caller-chosen name or number can key a timer; `TimerKey::unique()`
/// mints a key that cannot collide with anyone else's.
///
/// # Example
///
/// ```
/// use catlog_types::TimerKey;
///
/// let a: TimerKey = "request".into();
/// let b: TimerKey = 42u64.into();
/// assert_ne!(a, b);
/// assert_eq!(a.to_string(), "request");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerKey {
    /// A caller-chosen name
    Name(String),
    /// A caller-chosen number
    Id(u64),
    /// A generated unique key
    Uuid(Uuid),
}

impl TimerKey {
    /// Generate a fresh, globally unique timer key.
    pub fn unique() -> Self {
        TimerKey::Uuid(Uuid::new_v4())
    }
}

impl fmt::Display for TimerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerKey::Name(name) => write!(f, "{}", name),
            TimerKey::Id(id) => write!(f, "{}", id),
            TimerKey::Uuid(uuid) => write!(f, "{}", uuid),
        }
    }
}

impl From<&str> for TimerKey {
    fn from(s: &str) -> Self {
        TimerKey::Name(s.to_string())
    }
}

impl From<String> for TimerKey {
    fn from(s: String) -> Self {
        TimerKey::Name(s)
    }
}

impl From<u64> for TimerKey {
    fn from(id: u64) -> Self {
        TimerKey::Id(id)
    }
}

impl From<usize> for TimerKey {
    fn from(id: usize) -> Self {
        TimerKey::Id(id as u64)
    }
}

impl From<Uuid> for TimerKey {
    fn from(uuid: Uuid) -> Self {
        TimerKey::Uuid(uuid)
    }
}

impl From<&TimerKey> for TimerKey {
    fn from(key: &TimerKey) -> Self {
        key.clone()
    }
}
