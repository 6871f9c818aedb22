//! Composite cluster identifier carried through interactive buttons.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`ClusterKey`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ClusterKeyError {
    /// The input string is empty.
    #[error("cluster key cannot be empty")]
    Empty,
    /// The input does not contain a `/` separator.
    #[error("cluster key must have the form location/name")]
    MissingSeparator,
    /// The input contains more than one `/`.
    #[error("cluster key must contain exactly one '/'")]
    TooManySeparators,
    /// The location part (before `/`) is empty.
    #[error("cluster key location cannot be empty")]
    EmptyLocation,
    /// The name part (after `/`) is empty.
    #[error("cluster key name cannot be empty")]
    EmptyName,
}

/// A `location/name` pair identifying one cluster within a project.
///
/// This is the value attached to each delete button, so it round-trips
/// through the chat platform as a plain string.
///
/// ## Examples
///
/// ```
/// use cleanup_reminder_core::ClusterKey;
///
/// let key = ClusterKey::parse("us-central1-a/demo").unwrap();
/// assert_eq!(key.location(), "us-central1-a");
/// assert_eq!(key.name(), "demo");
/// assert_eq!(key.to_string(), "us-central1-a/demo");
///
/// assert!(ClusterKey::parse("demo").is_err());
/// assert!(ClusterKey::parse("/demo").is_err());
/// assert!(ClusterKey::parse("a/b/c").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClusterKey {
    location: String,
    name: String,
}

impl ClusterKey {
    /// Build a key from its parts.
    #[must_use]
    pub fn new(location: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            name: name.into(),
        }
    }

    /// Parse a key from its `location/name` form.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, does not contain exactly one
    /// `/`, or either half is empty.
    pub fn parse(s: &str) -> Result<Self, ClusterKeyError> {
        if s.is_empty() {
            return Err(ClusterKeyError::Empty);
        }

        let (location, name) = s
            .split_once('/')
            .ok_or(ClusterKeyError::MissingSeparator)?;

        if name.contains('/') {
            return Err(ClusterKeyError::TooManySeparators);
        }
        if location.is_empty() {
            return Err(ClusterKeyError::EmptyLocation);
        }
        if name.is_empty() {
            return Err(ClusterKeyError::EmptyName);
        }

        Ok(Self::new(location, name))
    }

    /// Zone or region part.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Cluster name part.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ClusterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.location, self.name)
    }
}

impl FromStr for ClusterKey {
    type Err = ClusterKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ClusterKey {
    type Error = ClusterKeyError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<ClusterKey> for String {
    fn from(key: ClusterKey) -> Self {
        key.to_string()
    }
}

impl From<&crate::ClusterRecord> for ClusterKey {
    fn from(record: &crate::ClusterRecord) -> Self {
        Self::new(record.location.clone(), record.name.clone())
    }
}
