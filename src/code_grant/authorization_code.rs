//! The authorization code grant.
//!
//! The client redeems a code it received through the authorization endpoint ([RFC 6749 §4.1.3]).
//! The token carries the scope the resource owner agreed to. Codes are single use, the code is
//! revoked before a token is issued.
//!
//! [RFC 6749 §4.1.3]: https://tools.ietf.org/html/rfc6749#section-4.1.3
use async_trait::async_trait;
use chrono::Utc;

use super::engine::{Engine, GrantType, TokenGrant};
use super::error::OAuthError;
use super::extensions::Pkce;
use super::{body_or_query_param, checked_param, optional_param};
use crate::endpoint::request::Request;
use crate::options::GrantOptions;
use crate::primitives::format;
use crate::primitives::issuer::AuthorizationCodeRecord;
use crate::primitives::model::{AuthorizationCodeStore, ClientIdentity, ScopeValidation, TokenPersistence};
use crate::primitives::scope::Scope;

/// Issues tokens for `grant_type=authorization_code`.
pub type AuthorizationCodeGrant<M> = TokenGrant<M, AuthorizationCode>;

/// Redeems the `code` body parameter.
#[derive(Clone, Copy, Debug, Default)]
pub struct AuthorizationCode {
    pkce: Pkce,
}

impl AuthorizationCode {
    /// The grant type, checking PKCE verifiers of codes that carry a challenge.
    pub fn new() -> Self {
        AuthorizationCode::default()
    }

    /// The grant type with a specific PKCE policy.
    pub fn with_pkce(pkce: Pkce) -> Self {
        AuthorizationCode { pkce }
    }

    /// The PKCE policy.
    pub fn pkce(&self) -> &Pkce {
        &self.pkce
    }
}

impl<M> TokenGrant<M, AuthorizationCode>
where
    M: AuthorizationCodeStore + TokenPersistence + ScopeValidation,
{
    /// An authorization code grant handler, failing with `invalid_argument` for invalid options.
    pub fn new(options: GrantOptions<M>) -> Result<Self, OAuthError> {
        TokenGrant::with_grant(options, AuthorizationCode::new())
    }
}

#[async_trait]
impl<M> GrantType<M> for AuthorizationCode
where
    M: AuthorizationCodeStore + TokenPersistence + ScopeValidation,
{
    type Resolved = AuthorizationCodeRecord<M::Client, M::User>;

    fn name(&self) -> &'static str {
        "authorization_code"
    }

    /// The scope is the one recorded with the code.
    fn requested_scope(&self, _: &Request) -> Result<Option<Scope>, OAuthError> {
        Ok(None)
    }

    async fn verify(
        &self, engine: &Engine<M>, request: &Request, client: &M::Client,
    ) -> Result<Self::Resolved, OAuthError> {
        let code = checked_param(request, "code", format::vschar)?;

        let record = engine
            .model()
            .get_authorization_code(code)
            .await?
            .ok_or_else(invalid)?;

        if record.client.id() != client.id() {
            log::debug!(
                "Authorization code of client {} presented by client {}",
                record.client.id(),
                client.id()
            );
            return Err(OAuthError::invalid_grant(
                "Invalid grant: authorization code was issued to another client",
            ));
        }

        if record.expires_at < Utc::now() {
            return Err(OAuthError::invalid_grant(
                "Invalid grant: authorization code has expired",
            ));
        }

        if let Some(expected) = record.redirect_uri.as_deref() {
            check_redirect_uri(request, expected)?;
        }

        let verifier = optional_param(request, "code_verifier")?;
        self.pkce.verify(
            record.code_challenge.as_deref(),
            record.code_challenge_method.as_deref(),
            verifier,
        )?;

        if !engine.model().revoke_authorization_code(&record).await? {
            log::warn!(
                "Authorization code of client {} was revoked concurrently",
                client.id()
            );
            return Err(invalid());
        }

        Ok(record)
    }
}

/// A code bound to a redirect uri must be redeemed with the same uri.
fn check_redirect_uri(request: &Request, expected: &str) -> Result<(), OAuthError> {
    let given = match body_or_query_param(request, "redirect_uri")? {
        Some(given) => given,
        None => {
            return Err(OAuthError::invalid_grant(
                "Invalid grant: `redirect_uri` is missing",
            ))
        }
    };

    if !format::uri(given) {
        return Err(OAuthError::invalid_request(
            "Invalid request: `redirect_uri` is not a valid URI",
        ));
    }

    if given != expected {
        return Err(OAuthError::invalid_grant(
            "Invalid grant: `redirect_uri` is invalid",
        ));
    }

    Ok(())
}

fn invalid() -> OAuthError {
    OAuthError::invalid_grant("Invalid grant: authorization code is invalid")
}
