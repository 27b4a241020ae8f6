//! Request identity.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque token identifying one pipeline invocation.
///
/// Every request gets a fresh UUID, which also keys the request-scoped
/// temporary directory. Two concurrent requests can never share a token,
/// so they can never observe each other's temporaries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestToken(pub String);

impl RequestToken {
    /// Generate a new unique token.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_unique() {
        let a = RequestToken::new();
        let b = RequestToken::new();
        assert_ne!(a, b);
    }
}
