//! Configuration of a grant type.
//!
//! [`GrantSettings`] holds the plain values and can be loaded with any serde format, for example
//! from a configuration file. [`GrantOptions`] pairs the settings with the model and the policies
//! that are code rather than data.
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::primitives::format::{self, FormatValidator};
use crate::primitives::generator::TagToken;

/// The lifetime of access tokens when not configured, one hour.
pub const DEFAULT_ACCESS_TOKEN_LIFETIME: i64 = 60 * 60;

/// The lifetime of refresh tokens when not configured, two weeks.
pub const DEFAULT_REFRESH_TOKEN_LIFETIME: i64 = 60 * 60 * 24 * 14;

/// Bytes of randomness in a generated token value when not configured.
pub const DEFAULT_TOKEN_LENGTH: usize = 32;

/// Plain configuration values.
///
/// ```
/// # use oxide_grant::options::GrantSettings;
/// let settings: GrantSettings = serde_json::from_str(r#"{ "access_token_lifetime": 120 }"#).unwrap();
/// assert_eq!(settings.access_token_lifetime, 120);
/// assert_eq!(settings, GrantSettings { access_token_lifetime: 120, ..GrantSettings::default() });
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrantSettings {
    /// Seconds an access token stays valid.
    pub access_token_lifetime: i64,

    /// Seconds a refresh token stays valid.
    pub refresh_token_lifetime: i64,

    /// Bytes of randomness in each generated token value.
    pub token_length: usize,

    /// Reject issuing tokens whose resolved scope is empty.
    pub require_scope: bool,
}

impl Default for GrantSettings {
    fn default() -> Self {
        GrantSettings {
            access_token_lifetime: DEFAULT_ACCESS_TOKEN_LIFETIME,
            refresh_token_lifetime: DEFAULT_REFRESH_TOKEN_LIFETIME,
            token_length: DEFAULT_TOKEN_LENGTH,
            require_scope: false,
        }
    }
}

/// Everything a grant type is constructed from.
///
/// The options are validated when the grant type is constructed, a missing model or invalid
/// settings fail with `invalid_argument` then and not on the first request.
pub struct GrantOptions<M> {
    /// The persistence model.
    pub model: Option<Arc<M>>,

    /// Lifetimes, token length and scope policy.
    pub settings: GrantSettings,

    /// Format check for free-text credentials such as user names and passwords.
    pub credential_format: FormatValidator,

    /// Replaces the random generator for token values.
    pub generator: Option<Arc<dyn TagToken>>,
}

impl<M> GrantOptions<M> {
    /// Options with default settings for a model.
    pub fn new(model: Arc<M>) -> Self {
        GrantOptions {
            model: Some(model),
            ..GrantOptions::default()
        }
    }

    /// Replace all settings.
    pub fn settings(mut self, settings: GrantSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Set the access token lifetime in seconds.
    pub fn access_token_lifetime(mut self, seconds: i64) -> Self {
        self.settings.access_token_lifetime = seconds;
        self
    }

    /// Set the refresh token lifetime in seconds.
    pub fn refresh_token_lifetime(mut self, seconds: i64) -> Self {
        self.settings.refresh_token_lifetime = seconds;
        self
    }

    /// Replace the credential format check.
    pub fn credential_format(mut self, validator: FormatValidator) -> Self {
        self.credential_format = validator;
        self
    }

    /// Generate token values with a custom generator.
    pub fn generator(mut self, generator: Arc<dyn TagToken>) -> Self {
        self.generator = Some(generator);
        self
    }
}

impl<M> Default for GrantOptions<M> {
    /// Options without a model, constructing a grant type from these fails.
    fn default() -> Self {
        GrantOptions {
            model: None,
            settings: GrantSettings::default(),
            credential_format: format::uchar,
            generator: None,
        }
    }
}

impl<M> fmt::Debug for GrantOptions<M> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("GrantOptions")
            .field("model", &self.model.as_ref().map(|_| ".."))
            .field("settings", &self.settings)
            .field("generator", &self.generator.as_ref().map(|_| ".."))
            .finish()
    }
}
