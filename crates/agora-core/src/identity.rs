//! Opaque caller identity.
//!
//! Identities are resolved by an external authentication collaborator
//! before any core operation runs; the core never inspects network
//! metadata. The string content is a stable external key (1:1 with an
//! account) and carries no meaning inside this system.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable, opaque identity of a caller.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallerIdentity(String);

impl CallerIdentity {
    /// Create an identity from the externally-resolved key.
    ///
    /// Rejects empty or whitespace-only keys.
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(CoreError::InvalidIdentity("empty identity key".into()));
        }
        Ok(Self(key))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_rejects_empty() {
        assert!(CallerIdentity::new("").is_err());
        assert!(CallerIdentity::new("   ").is_err());
    }

    #[test]
    fn test_identity_roundtrip() {
        let id = CallerIdentity::new("caller-42").unwrap();
        assert_eq!(id.as_str(), "caller-42");
        assert_eq!(id.to_string(), "caller-42");
    }
}
