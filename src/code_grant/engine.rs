//! The issuance pipeline shared by all grant types.
//!
//! A grant type only verifies the credentials of a request, see [`GrantType`]. Everything else is
//! the same for all of them and happens in [`TokenGrant::handle`]:
//!
//! 1. The requested scope is parsed.
//! 2. The grant type verifies the credentials, resolving the user.
//! 3. The scope is bounded by a redeemed grant and validated by the model.
//! 4. Token values are generated and expiries computed, independent of each other.
//! 5. The token is handed to the model and its saved form returned.
//!
//! Failures of any step are returned as they are, the pipeline never retries.
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::code_grant::error::OAuthError;
use crate::code_grant::scope;
use crate::endpoint::request::Request;
use crate::options::GrantOptions;
use crate::primitives::format::FormatValidator;
use crate::primitives::generator::{RandomGenerator, TagToken};
use crate::primitives::issuer::{AuthorizationCodeRecord, RefreshTokenRecord, Token};
use crate::primitives::model::{ClientIdentity, ScopeValidation, TokenPersistence};
use crate::primitives::scope::Scope;
use crate::primitives::Time;

/// The outcome of verifying the credentials of a request.
pub trait Resolution<U>: Send + Sync {
    /// The principal the token is issued for.
    fn user(&self) -> &U;

    /// The scope of a redeemed grant, an upper bound for the issued scope.
    fn granted_scope(&self) -> Option<&Scope> {
        None
    }
}

/// Credentials which resolved to a principal without redeeming a previous grant.
#[derive(Clone, Debug)]
pub struct Principal<U>(pub U);

impl<U: Send + Sync> Resolution<U> for Principal<U> {
    fn user(&self) -> &U {
        &self.0
    }
}

impl<C: Send + Sync, U: Send + Sync> Resolution<U> for RefreshTokenRecord<C, U> {
    fn user(&self) -> &U {
        &self.user
    }

    fn granted_scope(&self) -> Option<&Scope> {
        Some(&self.scope)
    }
}

impl<C: Send + Sync, U: Send + Sync> Resolution<U> for AuthorizationCodeRecord<C, U> {
    fn user(&self) -> &U {
        &self.user
    }

    fn granted_scope(&self) -> Option<&Scope> {
        Some(&self.scope)
    }
}

/// The credential verification step of one grant type.
#[async_trait]
pub trait GrantType<M>: Send + Sync
where
    M: TokenPersistence + ScopeValidation,
{
    /// What successful verification yields.
    type Resolved: Resolution<M::User>;

    /// The `grant_type` value this grant type is selected with.
    fn name(&self) -> &'static str;

    /// Whether a refresh token is issued alongside the access token.
    fn issues_refresh_token(&self) -> bool {
        true
    }

    /// The scope named by the request, by default the `scope` body parameter.
    fn requested_scope(&self, request: &Request) -> Result<Option<Scope>, OAuthError> {
        scope::requested(request)
    }

    /// Check the credentials of the request for the already authenticated client.
    async fn verify(
        &self, engine: &Engine<M>, request: &Request, client: &M::Client,
    ) -> Result<Self::Resolved, OAuthError>;

    /// Finish the grant after the token has been saved.
    async fn settle(&self, _engine: &Engine<M>, _resolved: Self::Resolved) -> Result<(), OAuthError> {
        Ok(())
    }
}

/// The validated configuration and the model, shared by all steps of the pipeline.
pub struct Engine<M> {
    model: Arc<M>,
    access_token_lifetime: Duration,
    refresh_token_lifetime: Duration,
    require_scope: bool,
    credential_format: FormatValidator,
    generator: Arc<dyn TagToken>,
}

impl<M> Engine<M> {
    /// Validate the options.
    ///
    /// Fails with `invalid_argument` if the model is missing, a lifetime is not positive or too
    /// large to compute expiries with, or the token length is zero.
    pub fn new(options: GrantOptions<M>) -> Result<Self, OAuthError> {
        let GrantOptions {
            model,
            settings,
            credential_format,
            generator,
        } = options;

        let model = model.ok_or_else(|| OAuthError::missing_argument("model"))?;

        let access_token_lifetime = lifetime("access_token_lifetime", settings.access_token_lifetime)?;
        let refresh_token_lifetime = lifetime("refresh_token_lifetime", settings.refresh_token_lifetime)?;

        let generator = match generator {
            Some(generator) => generator,
            None if settings.token_length == 0 => {
                return Err(OAuthError::invalid_argument(
                    "Invalid argument: `token_length` must not be zero",
                ))
            }
            None => Arc::new(RandomGenerator::new(settings.token_length)),
        };

        Ok(Engine {
            model,
            access_token_lifetime,
            refresh_token_lifetime,
            require_scope: settings.require_scope,
            credential_format,
            generator,
        })
    }

    /// The persistence model.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// The format check for free-text credentials.
    pub fn credential_format(&self) -> FormatValidator {
        self.credential_format
    }

    /// The configured access token lifetime.
    pub fn access_token_lifetime(&self) -> Duration {
        self.access_token_lifetime
    }

    /// The configured refresh token lifetime.
    pub fn refresh_token_lifetime(&self) -> Duration {
        self.refresh_token_lifetime
    }

    fn generate(&self) -> Result<String, OAuthError> {
        self.generator.tag().map_err(|err| {
            log::warn!("Generating a token value failed: {}", err);
            OAuthError::server_error_from(err)
        })
    }
}

impl<M> Engine<M>
where
    M: TokenPersistence + ScopeValidation,
{
    /// Resolve the scope to issue, see the [`scope`] module.
    pub async fn resolve_scope(
        &self, requested: Option<Scope>, granted: Option<&Scope>, user: &M::User, client: &M::Client,
    ) -> Result<Scope, OAuthError> {
        let requested = scope::bounded(requested, granted)?;
        scope::validate(self.model(), user, client, requested, self.require_scope).await
    }

    /// The access token value, from the model or the generator.
    pub async fn generate_access_token(
        &self, client: &M::Client, user: &M::User, scope: &Scope,
    ) -> Result<String, OAuthError> {
        match self.model.generate_access_token(client, user, scope).await? {
            Some(token) => Ok(token),
            None => self.generate(),
        }
    }

    /// The refresh token value, from the model or the generator.
    pub async fn generate_refresh_token(
        &self, client: &M::Client, user: &M::User, scope: &Scope,
    ) -> Result<String, OAuthError> {
        match self.model.generate_refresh_token(client, user, scope).await? {
            Some(token) => Ok(token),
            None => self.generate(),
        }
    }

    /// When an access token issued at some point expires.
    ///
    /// Fails with `server_error` if a lifetime chosen by the model leaves the representable range.
    pub fn access_token_expires_at(&self, client: &M::Client, issued_at: Time) -> Result<Time, OAuthError> {
        let lifetime = self
            .model
            .access_token_lifetime(client)
            .unwrap_or(self.access_token_lifetime);
        expires_at("access", issued_at, lifetime)
    }

    /// When a refresh token issued at some point expires.
    ///
    /// Fails with `server_error` if a lifetime chosen by the model leaves the representable range.
    pub fn refresh_token_expires_at(&self, client: &M::Client, issued_at: Time) -> Result<Time, OAuthError> {
        let lifetime = self
            .model
            .refresh_token_lifetime(client)
            .unwrap_or(self.refresh_token_lifetime);
        expires_at("refresh", issued_at, lifetime)
    }

    /// Compose a token for the validated scope and hand it to the model.
    pub async fn save_token(
        &self, user: &M::User, client: &M::Client, scope: Scope, with_refresh_token: bool,
    ) -> Result<M::SavedToken, OAuthError> {
        let issued_at = Utc::now();

        let access_token = self.generate_access_token(client, user, &scope);
        let refresh_token = async {
            if with_refresh_token {
                self.generate_refresh_token(client, user, &scope).await.map(Some)
            } else {
                Ok(None)
            }
        };
        let (access_token, refresh_token) = futures::try_join!(access_token, refresh_token)?;

        let access_token_expires_at = self.access_token_expires_at(client, issued_at)?;
        let refresh_token_expires_at = refresh_token
            .as_ref()
            .map(|_| self.refresh_token_expires_at(client, issued_at))
            .transpose()?;

        let token = Token {
            access_token,
            access_token_expires_at,
            refresh_token,
            refresh_token_expires_at,
            scope,
        };

        log::debug!(
            "Saving token for client {}, scope `{}`, refreshable: {}",
            client.id(),
            token.scope,
            token.refreshable()
        );

        Ok(self.model.save_token(token, client, user).await?)
    }
}

/// A configured lifetime in seconds, positive and such that expiries stay representable.
fn lifetime(name: &str, seconds: i64) -> Result<Duration, OAuthError> {
    if seconds <= 0 {
        return Err(OAuthError::invalid_argument(format!(
            "Invalid argument: `{}` must be positive",
            name
        )));
    }

    Duration::try_seconds(seconds)
        .filter(|lifetime| Utc::now().checked_add_signed(*lifetime).is_some())
        .ok_or_else(|| OAuthError::invalid_argument(format!("Invalid argument: `{}` is too large", name)))
}

fn expires_at(kind: &str, issued_at: Time, lifetime: Duration) -> Result<Time, OAuthError> {
    issued_at.checked_add_signed(lifetime).ok_or_else(|| {
        log::warn!("The {} token lifetime {} exceeds the representable time range", kind, lifetime);
        OAuthError::server_error(format!("Server error: {} token expiry is out of range", kind))
    })
}

impl<M> fmt::Debug for Engine<M> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Engine")
            .field("access_token_lifetime", &self.access_token_lifetime)
            .field("refresh_token_lifetime", &self.refresh_token_lifetime)
            .field("require_scope", &self.require_scope)
            .finish()
    }
}

/// Issues tokens with one grant type.
///
/// Each grant type has its own constructor, for example the one of [`PasswordGrant`], which is
/// only available when the model provides the capabilities the grant type requires.
///
/// [`PasswordGrant`]: super::password::PasswordGrant
pub struct TokenGrant<M, G> {
    engine: Engine<M>,
    grant: G,
}

impl<M, G> TokenGrant<M, G>
where
    M: TokenPersistence + ScopeValidation,
    G: GrantType<M>,
{
    /// Validate the options and combine them with a grant type.
    pub fn with_grant(options: GrantOptions<M>, grant: G) -> Result<Self, OAuthError> {
        Ok(TokenGrant {
            engine: Engine::new(options)?,
            grant,
        })
    }

    /// The `grant_type` value this handler serves.
    pub fn grant_type(&self) -> &'static str {
        self.grant.name()
    }

    /// The pipeline shared with the grant type.
    pub fn engine(&self) -> &Engine<M> {
        &self.engine
    }

    /// The grant type.
    pub fn grant(&self) -> &G {
        &self.grant
    }

    /// Issue a token for a request of an authenticated client.
    ///
    /// Every call is an independent issuance, repeating a request issues another token or fails
    /// when the credentials were single-use.
    pub async fn handle(&self, request: &Request, client: &M::Client) -> Result<M::SavedToken, OAuthError> {
        let requested = self.grant.requested_scope(request)?;

        log::debug!(
            "Verifying `{}` grant for client {}",
            self.grant.name(),
            client.id()
        );
        let resolved = self.grant.verify(&self.engine, request, client).await?;

        let scope = self
            .engine
            .resolve_scope(requested, resolved.granted_scope(), resolved.user(), client)
            .await?;
        log::debug!("Resolved scope `{}` for client {}", scope, client.id());

        let saved = self
            .engine
            .save_token(
                resolved.user(),
                client,
                scope,
                self.grant.issues_refresh_token(),
            )
            .await?;

        self.grant.settle(&self.engine, resolved).await?;
        Ok(saved)
    }
}

impl<M, G: fmt::Debug> fmt::Debug for TokenGrant<M, G> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TokenGrant")
            .field("engine", &self.engine)
            .field("grant", &self.grant)
            .finish()
    }
}
