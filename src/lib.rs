//! # oxide-grant
//!
//! The token issuing core of an OAuth2 authorization server: grant types, their errors and the
//! request representation they operate on, over a pluggable and async persistence model.
//!
//! ## About
//!
//! Issuing a token is the same for every grant type except for how the credentials of a request
//! are verified. This crate implements the shared pipeline once, resolving the scope, generating
//! token values, computing expiries and persisting the result, and combines it with a small
//! verification step per grant type. Rejections are reported as an [`OAuthError`] carrying the
//! http status, the machine readable code of [rfc6749] and a message.
//!
//! The transport is not part of this crate. A host authenticates the client, normalizes the
//! inbound message into a [`Request`] and selects the grant type by the `grant_type` parameter.
//!
//! ## Implementing a model
//!
//! Persistence is delegated to a model, split into the capabilities found in
//! [`primitives::model`]. A grant type can only be constructed for a model that implements the
//! capabilities it requires, the password grant for example needs [`UserLookup`] besides the
//! [`TokenPersistence`] and [`ScopeValidation`] every grant type uses.
//!
//! | Grant type | Handler | Capability |
//! |---|---|---|
//! | `password` | [`PasswordGrant`] | [`UserLookup`] |
//! | `client_credentials` | [`ClientCredentialsGrant`] | [`ClientPrincipal`] |
//! | `refresh_token` | [`RefreshTokenGrant`] | [`RefreshTokenStore`] |
//! | `authorization_code` | [`AuthorizationCodeGrant`] | [`AuthorizationCodeStore`] |
//!
//! Configuration is given as [`GrantOptions`], whose plain values can be loaded with serde.
//!
//! [rfc6749]: https://tools.ietf.org/html/rfc6749
//! [`OAuthError`]: code_grant::error::OAuthError
//! [`Request`]: endpoint::Request
//! [`GrantOptions`]: options::GrantOptions
//! [`UserLookup`]: primitives::model::UserLookup
//! [`TokenPersistence`]: primitives::model::TokenPersistence
//! [`ScopeValidation`]: primitives::model::ScopeValidation
//! [`ClientPrincipal`]: primitives::model::ClientPrincipal
//! [`RefreshTokenStore`]: primitives::model::RefreshTokenStore
//! [`AuthorizationCodeStore`]: primitives::model::AuthorizationCodeStore
//! [`PasswordGrant`]: code_grant::password::PasswordGrant
//! [`ClientCredentialsGrant`]: code_grant::client_credentials::ClientCredentialsGrant
//! [`RefreshTokenGrant`]: code_grant::refresh::RefreshTokenGrant
//! [`AuthorizationCodeGrant`]: code_grant::authorization_code::AuthorizationCodeGrant
#![warn(missing_docs)]

pub mod code_grant;
pub mod endpoint;
pub mod options;
pub mod primitives;

pub use crate::code_grant::error::{ErrorKind, OAuthError};
pub use crate::endpoint::Request;
pub use crate::options::{GrantOptions, GrantSettings};
