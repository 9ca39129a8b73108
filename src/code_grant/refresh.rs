//! The refresh token grant.
//!
//! A client trades a refresh token for a new access token ([RFC 6749 §6]). The new token carries
//! the scope of the refreshed grant unless the request narrows it.
//!
//! With rotation, the default, a new refresh token is issued and the old one is revoked. The new
//! token is saved before the old one is revoked so that the client never holds two invalid
//! tokens. Should revocation fail because the old token was used concurrently, the request is
//! rejected. Exactly one of several concurrent requests succeeds if the model revokes atomically.
//!
//! A rejected rotation leaves the already saved token pair in the model although the client never
//! receives it. It was issued to the same client and user as the presented refresh token, models
//! should expire or remove it. Each such rejection is logged with a warning.
//!
//! [RFC 6749 §6]: https://tools.ietf.org/html/rfc6749#section-6
use async_trait::async_trait;
use chrono::Utc;

use super::checked_param;
use super::engine::{Engine, GrantType, TokenGrant};
use super::error::OAuthError;
use crate::endpoint::request::Request;
use crate::options::GrantOptions;
use crate::primitives::format;
use crate::primitives::issuer::RefreshTokenRecord;
use crate::primitives::model::{ClientIdentity, RefreshTokenStore, ScopeValidation, TokenPersistence};

/// Issues tokens for `grant_type=refresh_token`.
pub type RefreshTokenGrant<M> = TokenGrant<M, RefreshToken>;

/// Redeems the `refresh_token` body parameter.
#[derive(Clone, Copy, Debug)]
pub struct RefreshToken {
    always_issue_new_refresh_token: bool,
}

impl RefreshToken {
    /// The grant type with refresh token rotation.
    pub fn new() -> Self {
        RefreshToken {
            always_issue_new_refresh_token: true,
        }
    }

    /// Keep refresh tokens valid instead of rotating them.
    ///
    /// Refreshing then issues only an access token and the client continues to use its refresh
    /// token until it expires.
    pub fn keep_refresh_token(&mut self) {
        self.always_issue_new_refresh_token = false;
    }

    /// Whether refresh tokens are rotated.
    pub fn rotates(&self) -> bool {
        self.always_issue_new_refresh_token
    }
}

impl Default for RefreshToken {
    fn default() -> Self {
        RefreshToken::new()
    }
}

impl<M> TokenGrant<M, RefreshToken>
where
    M: RefreshTokenStore + TokenPersistence + ScopeValidation,
{
    /// A refresh token grant handler with rotation, failing with `invalid_argument` for invalid
    /// options.
    pub fn new(options: GrantOptions<M>) -> Result<Self, OAuthError> {
        TokenGrant::with_grant(options, RefreshToken::new())
    }
}

#[async_trait]
impl<M> GrantType<M> for RefreshToken
where
    M: RefreshTokenStore + TokenPersistence + ScopeValidation,
{
    type Resolved = RefreshTokenRecord<M::Client, M::User>;

    fn name(&self) -> &'static str {
        "refresh_token"
    }

    fn issues_refresh_token(&self) -> bool {
        self.always_issue_new_refresh_token
    }

    async fn verify(
        &self, engine: &Engine<M>, request: &Request, client: &M::Client,
    ) -> Result<Self::Resolved, OAuthError> {
        let token = checked_param(request, "refresh_token", format::vschar)?;

        let record = engine
            .model()
            .get_refresh_token(token)
            .await?
            .ok_or_else(invalid)?;

        if record.client.id() != client.id() {
            log::debug!(
                "Refresh token of client {} presented by client {}",
                record.client.id(),
                client.id()
            );
            return Err(OAuthError::invalid_grant(
                "Invalid grant: refresh token was issued to another client",
            ));
        }

        match record.refresh_token_expires_at {
            Some(expires_at) if expires_at < Utc::now() => Err(OAuthError::invalid_grant(
                "Invalid grant: refresh token has expired",
            )),
            _ => Ok(record),
        }
    }

    async fn settle(&self, engine: &Engine<M>, record: Self::Resolved) -> Result<(), OAuthError> {
        if !self.always_issue_new_refresh_token {
            return Ok(());
        }

        match engine.model().revoke_token(&record).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                log::warn!(
                    "Refresh token of client {} was revoked concurrently, the token saved for \
                     scope `{}` was not handed out",
                    record.client.id(),
                    record.scope
                );
                Err(invalid())
            }
            Err(err) => {
                log::warn!(
                    "Revoking the refresh token of client {} failed, the token saved for scope \
                     `{}` was not handed out",
                    record.client.id(),
                    record.scope
                );
                Err(err.into())
            }
        }
    }
}

fn invalid() -> OAuthError {
    OAuthError::invalid_grant("Invalid grant: refresh token is invalid")
}
