//! Resolution of the scope a token is issued for.
//!
//! Resolving happens in three steps. The scope named by the request is parsed, then bounded by a
//! grant the request redeems, if any, and finally validated by the model for the user and client.
//! Only the model decides on defaults or narrowing, nothing here infers a scope on its own.
use serde_json::Value;

use crate::code_grant::error::OAuthError;
use crate::endpoint::request::Request;
use crate::primitives::model::ScopeValidation;
use crate::primitives::scope::Scope;

/// The scope named by the `scope` body parameter.
///
/// See [`parse`] for the accepted forms.
pub fn requested(request: &Request) -> Result<Option<Scope>, OAuthError> {
    parse(request.body_param("scope"))
}

/// Normalize a requested scope into its canonical form.
///
/// The scope may be absent, a space separated string or a list of individual scope-tokens. A
/// string which holds no scope-token and an empty list count as absent. Anything else, and any
/// scope-token with characters outside of the allowed set, fails with `invalid_scope`.
///
/// ```
/// # use oxide_grant::code_grant::scope::parse;
/// # use serde_json::json;
/// let scope = parse(Some(&json!("read  write read"))).unwrap().unwrap();
/// assert_eq!(scope.to_string(), "read write");
///
/// let scope = parse(Some(&json!(["read", "write"]))).unwrap().unwrap();
/// assert_eq!(scope.to_string(), "read write");
///
/// assert!(parse(None).unwrap().is_none());
/// assert!(parse(Some(&json!("read\\write"))).is_err());
/// ```
pub fn parse(value: Option<&Value>) -> Result<Option<Scope>, OAuthError> {
    let scope = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(encoded)) => encoded.parse::<Scope>().map_err(|_| invalid())?,
        Some(Value::Array(tokens)) => {
            let tokens = tokens
                .iter()
                .map(|token| token.as_str().ok_or_else(invalid))
                .collect::<Result<Vec<_>, _>>()?;
            Scope::from_tokens(tokens).map_err(|_| invalid())?
        }
        Some(_) => return Err(invalid()),
    };

    if scope.is_empty() {
        Ok(None)
    } else {
        Ok(Some(scope))
    }
}

/// Bound the requested scope by the scope of a redeemed grant.
///
/// Without a request the granted scope is carried forward. A request must not exceed the grant.
pub fn bounded(requested: Option<Scope>, granted: Option<&Scope>) -> Result<Option<Scope>, OAuthError> {
    match (requested, granted) {
        (None, granted) => Ok(granted.cloned()),
        (Some(requested), Some(granted)) if !requested.allow_access(granted) => Err(rejected()),
        (requested, _) => Ok(requested),
    }
}

/// Let the model validate the scope for a user and client.
///
/// When a scope was requested the model must confirm a non-empty scope, which becomes the
/// canonical scope even if narrower. When none was requested the model may supply a default and
/// an empty scope is permitted, unless `require_scope` is set.
pub async fn validate<M>(
    model: &M, user: &M::User, client: &M::Client, requested: Option<Scope>, require_scope: bool,
) -> Result<Scope, OAuthError>
where
    M: ScopeValidation + ?Sized,
{
    let declared = requested.is_some();
    let validated = model.validate_scope(user, client, requested.as_ref()).await?;

    let scope = match validated {
        Some(scope) if !scope.is_empty() => scope,
        _ if declared => return Err(rejected()),
        validated => validated.unwrap_or_default(),
    };

    if require_scope && scope.is_empty() {
        return Err(OAuthError::invalid_scope("Invalid scope: A scope is required"));
    }

    Ok(scope)
}

fn invalid() -> OAuthError {
    OAuthError::invalid_scope("Invalid parameter: `scope`")
}

fn rejected() -> OAuthError {
    OAuthError::invalid_scope("Invalid scope: Requested scope is invalid")
}
