//! The records exchanged with the model: issued tokens and the grants they are issued against.
//!
//! A [`Token`] is created fresh for every successful issuance and handed to the model, which owns
//! it from then on. The records are what the model returns when a flow redeems a previous grant.
use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::scope::Scope;
use super::Time;

/// Token parameters handed to the model for persistence.
///
/// Serializes with the camel-cased field names (`accessToken`, `accessTokenExpiresAt`, ..) that
/// hosts commonly store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    /// The bearer token.
    pub access_token: String,

    /// Expiration timestamp (Utc) of the bearer token.
    pub access_token_expires_at: Time,

    /// The refresh token, if the grant type offers one.
    pub refresh_token: Option<String>,

    /// Expiration timestamp (Utc) of the refresh token, set together with the token.
    pub refresh_token_expires_at: Option<Time>,

    /// The validated scope, possibly empty.
    pub scope: Scope,
}

impl Token {
    /// Determine if the access token can be refreshed.
    ///
    /// This returns `true` when a refresh token was issued alongside.
    pub fn refreshable(&self) -> bool {
        self.refresh_token.is_some()
    }

    /// The remaining lifetime of the access token, relative to some point in time.
    ///
    /// Token responses report a time to live instead of the timestamp.
    pub fn expires_in(&self, now: Time) -> Duration {
        self.access_token_expires_at.signed_duration_since(now)
    }
}

/// A previously issued refresh token, as recovered by the model.
#[derive(Clone, Debug)]
pub struct RefreshTokenRecord<C, U> {
    /// The refresh token value.
    pub refresh_token: String,

    /// Expiration timestamp (Utc), `None` for tokens which never expire.
    pub refresh_token_expires_at: Option<Time>,

    /// The scope originally granted with the token.
    pub scope: Scope,

    /// The client to which the token was issued.
    pub client: C,

    /// The resource owner of the original grant.
    pub user: U,
}

/// A previously issued authorization code, as recovered by the model.
#[derive(Clone, Debug)]
pub struct AuthorizationCodeRecord<C, U> {
    /// The code value.
    pub authorization_code: String,

    /// Expiration timestamp (Utc) of the code.
    pub expires_at: Time,

    /// The redirect uri given in the authorization request, if any.
    pub redirect_uri: Option<String>,

    /// The scope the resource owner agreed to.
    pub scope: Scope,

    /// The client to which the code was issued.
    pub client: C,

    /// The resource owner who authorized the client.
    pub user: U,

    /// The PKCE challenge of the authorization request.
    pub code_challenge: Option<String>,

    /// The PKCE method of the challenge, `plain` when absent.
    pub code_challenge_method: Option<String>,
}
