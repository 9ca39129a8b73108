//! The persistence contract the grant flows call into.
//!
//! Instead of one large interface, the model is split into capabilities. Each grant type names the
//! capabilities it requires, so a grant can only be constructed for a model that provides them.
//! Every hook is async and may suspend; synchronous backends simply return ready futures.
//!
//! Hooks report failure through [`ModelError`]. An [`OAuthError`] raised by a hook reaches the
//! caller unchanged while any other error is wrapped as a `server_error` which keeps the original
//! as its `source`.
use std::error::Error as StdError;

use async_trait::async_trait;
use chrono::Duration;

use crate::code_grant::error::OAuthError;
use super::issuer::{AuthorizationCodeRecord, RefreshTokenRecord, Token};
use super::scope::Scope;

/// Identity of a client, as needed to check ownership of codes and refresh tokens.
pub trait ClientIdentity {
    /// The client identifier.
    fn id(&self) -> &str;
}

/// Names the host types a model works with.
pub trait Model: Send + Sync {
    /// The client entity, already authenticated by the caller.
    type Client: ClientIdentity + Send + Sync;

    /// The resource owner, or whatever principal a grant resolves to.
    type User: Send + Sync;

    /// The result of persisting a token, possibly enriched by the model.
    type SavedToken: Send;
}

/// Failure of a model hook.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// A deliberate rejection, forwarded to the caller as is.
    #[error(transparent)]
    OAuth(#[from] OAuthError),

    /// Any other failure of the backend.
    #[error("{0}")]
    Backend(#[source] Box<dyn StdError + Send + Sync + 'static>),
}

impl ModelError {
    /// Wrap an arbitrary backend error.
    pub fn backend<E>(error: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync + 'static>>,
    {
        ModelError::Backend(error.into())
    }
}

impl From<ModelError> for OAuthError {
    fn from(error: ModelError) -> Self {
        match error {
            ModelError::OAuth(error) => error,
            ModelError::Backend(cause) => {
                log::warn!("Model hook failed: {}", cause);
                OAuthError::server_error_from(cause)
            }
        }
    }
}

/// Persisting issued tokens, required by every grant type.
///
/// Besides saving, the model may take over generating token values and choosing lifetimes per
/// client. The provided methods fall back to the configured defaults.
#[async_trait]
pub trait TokenPersistence: Model {
    /// Store the token for the client and user, returning the record as saved.
    async fn save_token(
        &self, token: Token, client: &Self::Client, user: &Self::User,
    ) -> Result<Self::SavedToken, ModelError>;

    /// Generate a custom access token value, `None` to use the configured generator.
    async fn generate_access_token(
        &self, _client: &Self::Client, _user: &Self::User, _scope: &Scope,
    ) -> Result<Option<String>, ModelError> {
        Ok(None)
    }

    /// Generate a custom refresh token value, `None` to use the configured generator.
    async fn generate_refresh_token(
        &self, _client: &Self::Client, _user: &Self::User, _scope: &Scope,
    ) -> Result<Option<String>, ModelError> {
        Ok(None)
    }

    /// The access token lifetime for a client, `None` for the configured default.
    fn access_token_lifetime(&self, _client: &Self::Client) -> Option<Duration> {
        None
    }

    /// The refresh token lifetime for a client, `None` for the configured default.
    fn refresh_token_lifetime(&self, _client: &Self::Client) -> Option<Duration> {
        None
    }
}

/// Deciding which scope a user and client may obtain.
///
/// The provided implementation accepts any requested scope unchanged.
#[async_trait]
pub trait ScopeValidation: Model {
    /// Validate the requested scope, `None` when the request named none.
    ///
    /// Return the scope to grant, which may be narrower than requested or a default when nothing
    /// was requested. Returning `None` or an empty scope for a requested scope rejects the request.
    async fn validate_scope(
        &self, _user: &Self::User, _client: &Self::Client, scope: Option<&Scope>,
    ) -> Result<Option<Scope>, ModelError> {
        Ok(scope.cloned())
    }
}

/// Looking up resource owners by their credentials.
#[async_trait]
pub trait UserLookup: Model {
    /// Find the user with these credentials, `None` if they do not match.
    ///
    /// Comparing the password in constant time is the responsibility of the model.
    async fn get_user(&self, username: &str, password: &str)
        -> Result<Option<Self::User>, ModelError>;
}

/// Resolving the principal a client acts as.
#[async_trait]
pub trait ClientPrincipal: Model {
    /// The user tokens of this client are issued for, `None` to reject the client.
    async fn get_user_from_client(&self, client: &Self::Client)
        -> Result<Option<Self::User>, ModelError>;
}

/// Recovering and revoking refresh tokens.
#[async_trait]
pub trait RefreshTokenStore: Model {
    /// Recover the grant of a refresh token, `None` if unknown.
    async fn get_refresh_token(
        &self, refresh_token: &str,
    ) -> Result<Option<RefreshTokenRecord<Self::Client, Self::User>>, ModelError>;

    /// Invalidate a refresh token, returning `false` if it was no longer valid.
    async fn revoke_token(
        &self, record: &RefreshTokenRecord<Self::Client, Self::User>,
    ) -> Result<bool, ModelError>;
}

/// Recovering and revoking authorization codes.
#[async_trait]
pub trait AuthorizationCodeStore: Model {
    /// Recover the grant of an authorization code, `None` if unknown.
    async fn get_authorization_code(
        &self, code: &str,
    ) -> Result<Option<AuthorizationCodeRecord<Self::Client, Self::User>>, ModelError>;

    /// Invalidate the code, returning `false` if it had already been used or revoked.
    async fn revoke_authorization_code(
        &self, record: &AuthorizationCodeRecord<Self::Client, Self::User>,
    ) -> Result<bool, ModelError>;
}
