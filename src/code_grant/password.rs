//! The resource owner password credentials grant.
//!
//! The client collects the username and password of the resource owner and exchanges them for a
//! token directly ([RFC 6749 §4.3]). The model looks up the user, timing-safe comparison of the
//! password is its responsibility.
//!
//! [RFC 6749 §4.3]: https://tools.ietf.org/html/rfc6749#section-4.3
use async_trait::async_trait;

use super::engine::{Engine, GrantType, Principal, TokenGrant};
use super::error::OAuthError;
use super::body_param;
use crate::endpoint::request::Request;
use crate::options::GrantOptions;
use crate::primitives::format::FormatValidator;
use crate::primitives::model::{ScopeValidation, TokenPersistence, UserLookup};

/// Issues tokens for `grant_type=password`.
pub type PasswordGrant<M> = TokenGrant<M, Password>;

/// Verifies the `username` and `password` body parameters.
#[derive(Clone, Copy, Debug, Default)]
pub struct Password;

impl<M> TokenGrant<M, Password>
where
    M: UserLookup + TokenPersistence + ScopeValidation,
{
    /// A password grant handler, failing with `invalid_argument` for invalid options.
    pub fn new(options: GrantOptions<M>) -> Result<Self, OAuthError> {
        TokenGrant::with_grant(options, Password)
    }

    /// Resolve the user named by the credentials of a request.
    pub async fn get_user(&self, request: &Request) -> Result<M::User, OAuthError> {
        get_user(self.engine().model(), self.engine().credential_format(), request).await
    }
}

#[async_trait]
impl<M> GrantType<M> for Password
where
    M: UserLookup + TokenPersistence + ScopeValidation,
{
    type Resolved = Principal<M::User>;

    fn name(&self) -> &'static str {
        "password"
    }

    async fn verify(
        &self, engine: &Engine<M>, request: &Request, _: &M::Client,
    ) -> Result<Self::Resolved, OAuthError> {
        get_user(engine.model(), engine.credential_format(), request)
            .await
            .map(Principal)
    }
}

/// Resolve the user from the `username` and `password` body parameters.
///
/// Both parameters must be present before either is checked against the format.
pub async fn get_user<M>(model: &M, format: FormatValidator, request: &Request) -> Result<M::User, OAuthError>
where
    M: UserLookup + ?Sized,
{
    let username = body_param(request, "username")?;
    let password = body_param(request, "password")?;

    if !format(username) {
        return Err(OAuthError::invalid_parameter("username"));
    }

    if !format(password) {
        return Err(OAuthError::invalid_parameter("password"));
    }

    match model.get_user(username, password).await? {
        Some(user) => Ok(user),
        None => {
            log::debug!("Rejected password credentials");
            Err(OAuthError::invalid_grant("Invalid grant: user credentials are invalid"))
        }
    }
}
