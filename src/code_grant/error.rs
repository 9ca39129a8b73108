//! Errors defined in [rfc6749], extended by the codes a token issuing core reports on misuse.
//!
//! Every rejection produced by this crate is an [`OAuthError`]. It carries exactly the three
//! fields a host serializes into its response: the http `status`, the machine readable `code` and
//! a human readable `message`. The formal kind stays accessible for matching.
//!
//! [rfc6749]: https://tools.ietf.org/html/rfc6749#section-5.2
use std::borrow::Cow;
use std::error;
use std::fmt;
use std::sync::Arc;
use std::vec;

use serde::ser::{Serialize, SerializeStruct, Serializer};

/// All defined error codes.
///
/// Details also found in <https://tools.ietf.org/html/rfc6749#section-5.2>.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    /// The library was used incorrectly, for example configured without a model.
    ///
    /// This is not part of the rfc and indicates a programming error of the host.
    InvalidArgument,

    /// The request is missing a required parameter, includes an unsupported parameter value (other
    /// than grant type), repeats a parameter, includes multiple credentials, utilizes more than one
    /// mechanism for authenticating the client, or is otherwise malformed.
    InvalidRequest,

    /// Client authentication failed (e.g., unknown client, no client authentication included, or
    /// unsupported authentication method).
    InvalidClient,

    /// The provided authorization grant (e.g., authorization code, resource owner credentials) or
    /// refresh token is invalid, expired, revoked, does not match the redirection URI used in the
    /// authorization request, or was issued to another client.
    InvalidGrant,

    /// The requested scope is invalid, unknown, malformed, or exceeds the scope granted by the
    /// resource owner.
    InvalidScope,

    /// The authorization grant type is not supported by the authorization server.
    UnsupportedGrantType,

    /// The authorization server does not support obtaining an authorization code using this method.
    UnsupportedResponseType,

    /// The resource owner or authorization server denied the request.
    AccessDenied,

    /// The authorization server encountered an unexpected condition that prevented it from
    /// fulfilling the request.
    ServerError,
}

impl ErrorKind {
    fn description(self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::InvalidRequest => "invalid_request",
            ErrorKind::InvalidClient => "invalid_client",
            ErrorKind::InvalidGrant => "invalid_grant",
            ErrorKind::InvalidScope => "invalid_scope",
            ErrorKind::UnsupportedGrantType => "unsupported_grant_type",
            ErrorKind::UnsupportedResponseType => "unsupported_response_type",
            ErrorKind::AccessDenied => "access_denied",
            ErrorKind::ServerError => "server_error",
        }
    }

    /// The http status code reported when no override is given.
    pub fn default_status(self) -> u16 {
        match self {
            ErrorKind::InvalidArgument => 500,
            ErrorKind::ServerError => 503,
            _ => 400,
        }
    }
}

impl AsRef<str> for ErrorKind {
    fn as_ref(&self) -> &str {
        self.description()
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}

/// Caller supplied replacements for the defaults of an error kind.
///
/// Only read during construction of an [`OAuthError`], the error keeps its own copy.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ErrorOverrides {
    /// Replaces the default http status.
    pub status: Option<u16>,

    /// Replaces the default machine code.
    pub code: Option<Cow<'static, str>>,
}

/// A rejection of a request, as one member of the error taxonomy.
///
/// Constructed at the point where the problem is detected and propagated unchanged from there.
#[derive(Clone)]
pub struct OAuthError {
    kind: ErrorKind,
    status: u16,
    code: Cow<'static, str>,
    message: Cow<'static, str>,
    source: Option<Arc<dyn error::Error + Send + Sync + 'static>>,
}

impl OAuthError {
    /// Create an error of some kind with its default status and code.
    pub fn new<M: Into<Cow<'static, str>>>(kind: ErrorKind, message: M) -> Self {
        OAuthError {
            kind,
            status: kind.default_status(),
            code: Cow::Borrowed(kind.description()),
            message: message.into(),
            source: None,
        }
    }

    /// Create an error whose status or code differ from the defaults of its kind.
    pub fn with_overrides<M: Into<Cow<'static, str>>>(
        kind: ErrorKind, message: M, overrides: &ErrorOverrides,
    ) -> Self {
        let ErrorOverrides { status, code } = overrides.clone();
        let mut error = OAuthError::new(kind, message);
        if let Some(status) = status {
            error.status = status;
        }
        if let Some(code) = code {
            error.code = code;
        }
        error
    }

    /// A configuration or usage error of the library itself.
    pub fn invalid_argument<M: Into<Cow<'static, str>>>(message: M) -> Self {
        OAuthError::new(ErrorKind::InvalidArgument, message)
    }

    /// The request is malformed.
    pub fn invalid_request<M: Into<Cow<'static, str>>>(message: M) -> Self {
        OAuthError::new(ErrorKind::InvalidRequest, message)
    }

    /// The client could not be authenticated.
    pub fn invalid_client<M: Into<Cow<'static, str>>>(message: M) -> Self {
        OAuthError::new(ErrorKind::InvalidClient, message)
    }

    /// Well-formed credentials or grants that were rejected.
    pub fn invalid_grant<M: Into<Cow<'static, str>>>(message: M) -> Self {
        OAuthError::new(ErrorKind::InvalidGrant, message)
    }

    /// The scope was malformed or not allowed.
    pub fn invalid_scope<M: Into<Cow<'static, str>>>(message: M) -> Self {
        OAuthError::new(ErrorKind::InvalidScope, message)
    }

    /// The `grant_type` is not handled.
    pub fn unsupported_grant_type<M: Into<Cow<'static, str>>>(message: M) -> Self {
        OAuthError::new(ErrorKind::UnsupportedGrantType, message)
    }

    /// The `response_type` is not handled.
    pub fn unsupported_response_type<M: Into<Cow<'static, str>>>(message: M) -> Self {
        OAuthError::new(ErrorKind::UnsupportedResponseType, message)
    }

    /// The resource owner or the server denied the request.
    pub fn access_denied<M: Into<Cow<'static, str>>>(message: M) -> Self {
        OAuthError::new(ErrorKind::AccessDenied, message)
    }

    /// An unexpected failure without an underlying cause.
    pub fn server_error<M: Into<Cow<'static, str>>>(message: M) -> Self {
        OAuthError::new(ErrorKind::ServerError, message)
    }

    /// Wrap an unexpected failure, keeping it as the `source` of the error.
    pub fn server_error_from<E>(cause: E) -> Self
    where
        E: Into<Box<dyn error::Error + Send + Sync + 'static>>,
    {
        let cause: Arc<dyn error::Error + Send + Sync> = Arc::from(cause.into());
        let mut error = OAuthError::server_error(cause.to_string());
        error.source = Some(cause);
        error
    }

    /// A required argument of a constructor was absent.
    pub(crate) fn missing_argument(name: &str) -> Self {
        OAuthError::invalid_argument(format!("Missing parameter: `{}`", name))
    }

    /// A required request parameter was absent or empty.
    pub(crate) fn missing_parameter(name: &str) -> Self {
        OAuthError::invalid_request(format!("Missing parameter: `{}`", name))
    }

    /// A request parameter did not have the expected format.
    pub(crate) fn invalid_parameter(name: &str) -> Self {
        OAuthError::invalid_request(format!("Invalid parameter: `{}`", name))
    }

    /// Get the formal kind of error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The http status code of the response.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// The machine readable error code, `error` in the rfc.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// The explanation, `error_description` in the rfc.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Iterate over the key value pairs that describe this error.
    ///
    /// These pairs are meant for the json body of a Bad Request response.
    pub fn iter(&self) -> <&Self as IntoIterator>::IntoIter {
        self.into_iter()
    }
}

impl fmt::Debug for OAuthError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("OAuthError")
            .field("kind", &self.kind)
            .field("status", &self.status)
            .field("code", &self.code)
            .field("message", &self.message)
            .field("source", &self.source.as_ref().map(|err| err.to_string()))
            .finish()
    }
}

impl fmt::Display for OAuthError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl error::Error for OAuthError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|cause| cause.as_ref() as &(dyn error::Error + 'static))
    }
}

/// Serializes exactly the fields a client may see.
impl Serialize for OAuthError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("OAuthError", 3)?;
        state.serialize_field("status", &self.status)?;
        state.serialize_field("code", self.code.as_ref())?;
        state.serialize_field("message", self.message.as_ref())?;
        state.end()
    }
}

/// The error as key-value pairs.
impl IntoIterator for OAuthError {
    type Item = (&'static str, Cow<'static, str>);
    type IntoIter = vec::IntoIter<(&'static str, Cow<'static, str>)>;

    fn into_iter(self) -> Self::IntoIter {
        vec![("error", self.code), ("error_description", self.message)].into_iter()
    }
}

impl IntoIterator for &'_ OAuthError {
    type Item = (&'static str, Cow<'static, str>);
    type IntoIter = vec::IntoIter<(&'static str, Cow<'static, str>)>;

    fn into_iter(self) -> Self::IntoIter {
        vec![
            ("error", self.code.clone()),
            ("error_description", self.message.clone()),
        ]
        .into_iter()
    }
}
