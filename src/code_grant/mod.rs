//! Available grant types and their shared issuance pipeline.
//!
//! Each grant type verifies the credentials of a token request in its own way and otherwise relies
//! on the [`engine`]. A handler for one grant type is a [`TokenGrant`] constructed from
//! [`GrantOptions`], for a model implementing the capabilities the grant type requires.
//!
//! [`TokenGrant`]: engine::TokenGrant
//! [`GrantOptions`]: crate::options::GrantOptions
use serde_json::Value;

use crate::endpoint::request::Request;
use crate::primitives::format::FormatValidator;

pub mod authorization_code;
pub mod client_credentials;
pub mod engine;
pub mod error;
pub mod extensions;
pub mod password;
pub mod refresh;
pub mod scope;

#[cfg(test)]
mod tests;

use self::error::OAuthError;

/// A required body parameter as text.
///
/// Absent, null and empty parameters are missing, any other value that is not a string is invalid.
fn body_param<'r>(request: &'r Request, name: &str) -> Result<&'r str, OAuthError> {
    match request.body_param(name) {
        None | Some(Value::Null) => Err(OAuthError::missing_parameter(name)),
        Some(Value::String(value)) if value.is_empty() => Err(OAuthError::missing_parameter(name)),
        Some(Value::String(value)) => Ok(value),
        Some(_) => Err(OAuthError::invalid_parameter(name)),
    }
}

/// A required body parameter which must also have a specific format.
fn checked_param<'r>(
    request: &'r Request, name: &str, format: FormatValidator,
) -> Result<&'r str, OAuthError> {
    let value = body_param(request, name)?;
    if format(value) {
        Ok(value)
    } else {
        Err(OAuthError::invalid_parameter(name))
    }
}

/// An optional body parameter.
fn optional_param<'r>(request: &'r Request, name: &str) -> Result<Option<&'r str>, OAuthError> {
    text_param(request.body_param(name), name)
}

/// An optional parameter, taken from the body and else from the query.
fn body_or_query_param<'r>(request: &'r Request, name: &str) -> Result<Option<&'r str>, OAuthError> {
    let value = request
        .body_param(name)
        .filter(|value| !value.is_null())
        .or_else(|| request.query_param(name));
    text_param(value, name)
}

fn text_param<'r>(value: Option<&'r Value>, name: &str) -> Result<Option<&'r str>, OAuthError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) if value.is_empty() => Ok(None),
        Some(Value::String(value)) => Ok(Some(value)),
        Some(_) => Err(OAuthError::invalid_parameter(name)),
    }
}
