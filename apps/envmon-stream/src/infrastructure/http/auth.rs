//! Static bearer-token provider.

use async_trait::async_trait;

use crate::application::ports::{AuthError, BearerToken, CredentialProvider};
use crate::infrastructure::config::Credentials;

/// Serves a single pre-issued token from configuration.
///
/// A missing token is reported on every request rather than at startup so
/// the stream session can surface it as `Unauthenticated`.
#[derive(Clone)]
pub struct StaticTokenProvider {
    token: Option<BearerToken>,
}

impl StaticTokenProvider {
    /// Create a provider for `token`. Blank tokens count as absent.
    #[must_use]
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.and_then(|t| BearerToken::new(t).ok()),
        }
    }

    /// Create a provider from configured credentials.
    #[must_use]
    pub fn from_credentials(credentials: &Credentials) -> Self {
        Self::new(credentials.api_token().map(str::to_string))
    }
}

impl std::fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenProvider")
            .field("configured", &self.token.is_some())
            .finish()
    }
}

#[async_trait]
impl CredentialProvider for StaticTokenProvider {
    async fn bearer_token(&self) -> Result<BearerToken, AuthError> {
        self.token.clone().ok_or(AuthError::MissingCredential)
    }
}
