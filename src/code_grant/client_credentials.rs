//! The client credentials grant.
//!
//! The client requests a token on its own behalf ([RFC 6749 §4.4]). Its credentials were already
//! checked by the caller, the model only names the principal tokens are issued for.
//!
//! [RFC 6749 §4.4]: https://tools.ietf.org/html/rfc6749#section-4.4
use async_trait::async_trait;

use super::engine::{Engine, GrantType, Principal, TokenGrant};
use super::error::OAuthError;
use crate::endpoint::request::Request;
use crate::options::GrantOptions;
use crate::primitives::model::{ClientIdentity, ClientPrincipal, ScopeValidation, TokenPersistence};

/// Issues tokens for `grant_type=client_credentials`.
pub type ClientCredentialsGrant<M> = TokenGrant<M, ClientCredentials>;

/// Resolves the principal of the authenticated client.
///
/// A refresh token SHOULD NOT be included, so none is issued unless explicitly allowed.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClientCredentials {
    allow_refresh_token: bool,
}

impl ClientCredentials {
    /// The grant type without refresh tokens.
    pub fn new() -> Self {
        ClientCredentials::default()
    }

    /// Also issue a refresh token with every access token.
    pub fn allow_refresh_token(&mut self) {
        self.allow_refresh_token = true;
    }
}

impl<M> TokenGrant<M, ClientCredentials>
where
    M: ClientPrincipal + TokenPersistence + ScopeValidation,
{
    /// A client credentials grant handler, failing with `invalid_argument` for invalid options.
    pub fn new(options: GrantOptions<M>) -> Result<Self, OAuthError> {
        TokenGrant::with_grant(options, ClientCredentials::new())
    }
}

#[async_trait]
impl<M> GrantType<M> for ClientCredentials
where
    M: ClientPrincipal + TokenPersistence + ScopeValidation,
{
    type Resolved = Principal<M::User>;

    fn name(&self) -> &'static str {
        "client_credentials"
    }

    fn issues_refresh_token(&self) -> bool {
        self.allow_refresh_token
    }

    async fn verify(
        &self, engine: &Engine<M>, _: &Request, client: &M::Client,
    ) -> Result<Self::Resolved, OAuthError> {
        match engine.model().get_user_from_client(client).await? {
            Some(user) => Ok(Principal(user)),
            None => {
                log::debug!("No principal for client {}", client.id());
                Err(OAuthError::invalid_grant("Invalid grant: user credentials are invalid"))
            }
        }
    }
}
