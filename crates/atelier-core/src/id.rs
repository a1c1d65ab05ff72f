//! Session and job identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Maximum accepted length for a caller-supplied session id.
const MAX_SESSION_ID_LEN: usize = 128;

/// Errors produced while validating or parsing identifiers.
#[derive(Debug, thiserror::Error)]
pub enum IdError {
    /// The session id failed validation.
    #[error("invalid session id {id:?}: {reason}")]
    InvalidSessionId {
        /// The rejected id.
        id: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The job id was not a valid UUID.
    #[error("invalid job id {0:?}")]
    InvalidJobId(String),
}

/// Opaque identifier for an isolated execution context.
///
/// Session ids are supplied by the caller (or generated), and become a single
/// path component under the sandbox root, so the accepted alphabet is
/// restricted: ASCII alphanumerics plus `-`, `_` and `.`, with the literal
/// `.` / `..` components rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    /// Validate and wrap a caller-supplied session id.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::InvalidSessionId`] if the id is empty, longer than
    /// 128 characters, contains characters outside `[A-Za-z0-9._-]`, or is a
    /// relative path component (`.` or `..`).
    pub fn new(id: impl Into<String>) -> Result<Self, IdError> {
        let id = id.into();
        let reject = |reason: &str| IdError::InvalidSessionId {
            id: id.clone(),
            reason: reason.to_string(),
        };

        if id.is_empty() {
            return Err(reject("must not be empty"));
        }
        if id.len() > MAX_SESSION_ID_LEN {
            return Err(reject("longer than 128 characters"));
        }
        if id == "." || id == ".." {
            return Err(reject("must not be a relative path component"));
        }
        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            return Err(reject(
                "only ASCII alphanumerics, '-', '_' and '.' are allowed",
            ));
        }

        Ok(Self(id))
    }

    /// Generate a fresh random session id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SessionId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for SessionId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

/// Unique identifier for a queued job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    /// Generate a fresh job id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for JobId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| IdError::InvalidJobId(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_simple_ids() {
        assert!(SessionId::new("s1").is_ok());
        assert!(SessionId::new("agent-42_build.v2").is_ok());
    }

    #[test]
    fn rejects_empty_id() {
        assert!(SessionId::new("").is_err());
    }

    #[test]
    fn rejects_path_separators() {
        assert!(SessionId::new("a/b").is_err());
        assert!(SessionId::new("a\\b").is_err());
    }

    #[test]
    fn rejects_relative_components() {
        assert!(SessionId::new(".").is_err());
        assert!(SessionId::new("..").is_err());
        // Embedded dots are fine; the id is a single component.
        assert!(SessionId::new("a..b").is_ok());
    }

    #[test]
    fn rejects_overlong_id() {
        let id = "x".repeat(129);
        assert!(SessionId::new(id).is_err());
    }

    #[test]
    fn generated_ids_are_valid_and_unique() {
        let a = SessionId::generate();
        let b = SessionId::generate();
        assert_ne!(a, b);
        assert!(SessionId::new(a.as_str()).is_ok());
    }

    #[test]
    fn session_id_serde_round_trip() {
        let id = SessionId::new("s1").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"s1\"");
        let back: SessionId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn session_id_serde_rejects_invalid() {
        let result: Result<SessionId, _> = serde_json::from_str("\"a/b\"");
        assert!(result.is_err());
    }

    #[test]
    fn job_id_parse_round_trip() {
        let id = JobId::new();
        let parsed: JobId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn job_id_rejects_garbage() {
        assert!("not-a-uuid".parse::<JobId>().is_err());
    }
}
