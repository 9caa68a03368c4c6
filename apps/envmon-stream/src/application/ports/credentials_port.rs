//! Credential Port (Driven Port)
//!
//! Interface to the external identity provider that issues bearer tokens.

use std::fmt;

use async_trait::async_trait;

/// Bearer credential presented to the remote API.
///
/// The `Debug` implementation redacts the token for safe logging.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Wrap a raw token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingCredential`] when the token is blank.
    pub fn new(token: impl Into<String>) -> Result<Self, AuthError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(AuthError::MissingCredential);
        }
        Ok(Self(token))
    }

    /// The raw token value.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Value for an `Authorization` header.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BearerToken").field(&"[REDACTED]").finish()
    }
}

/// Authentication errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No credential is available (user not signed in).
    #[error("no credential available")]
    MissingCredential,
}

/// Port for obtaining bearer credentials.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Obtain the current bearer token.
    async fn bearer_token(&self) -> Result<BearerToken, AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_debug_is_redacted() {
        let token = BearerToken::new("super-secret").unwrap();
        let debug = format!("{token:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn blank_token_is_missing() {
        assert_eq!(BearerToken::new("   "), Err(AuthError::MissingCredential));
    }

    #[test]
    fn authorization_header_format() {
        let token = BearerToken::new("abc").unwrap();
        assert_eq!(token.authorization_header(), "Bearer abc");
    }
}
