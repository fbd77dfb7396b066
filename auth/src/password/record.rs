use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// Stored password hash, self-describing and opaque to callers.
///
/// Persisted verbatim by the user store; only the hasher reads its fields.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HashRecord(String);

impl HashRecord {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for HashRecord {
    fn from(record: String) -> Self {
        Self(record)
    }
}

impl From<&str> for HashRecord {
    fn from(record: &str) -> Self {
        Self(record.to_string())
    }
}

impl AsRef<str> for HashRecord {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HashRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for HashRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Algorithm and parameters only; salt and digest stay out of logs.
        if !self.0.starts_with('$') {
            return f.write_str("HashRecord([opaque])");
        }
        let head = self.0.split('$').take(4).collect::<Vec<_>>().join("$");
        write!(f, "HashRecord({}$...)", head)
    }
}

/// Outcome of checking a password against a stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PasswordVerdict {
    /// Correct password, record uses the current algorithm and cost.
    Match,
    /// Wrong password or unreadable record.
    NoMatch,
    /// Correct password, but the record should be re-hashed and replaced.
    MatchButWeak,
}

impl PasswordVerdict {
    /// True for `Match` and `MatchButWeak`.
    pub fn is_match(self) -> bool {
        matches!(self, PasswordVerdict::Match | PasswordVerdict::MatchButWeak)
    }

    pub fn needs_rehash(self) -> bool {
        self == PasswordVerdict::MatchButWeak
    }
}
