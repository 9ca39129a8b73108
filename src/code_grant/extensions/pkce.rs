use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::code_grant::error::OAuthError;

/// Proof Key for Code Exchange by OAuth Public Clients
///
/// > Auth 2.0 public clients utilizing the Authorization Code Grant are
/// susceptible to the authorization code interception attack.  This
/// specification describes the attack as well as a technique to mitigate
/// against the threat through the use of Proof Key for Code Exchange
/// (PKCE, pronounced "pixy").
///
/// (from the respective [RFC 7636])
///
/// The challenge and its method are recorded with the authorization code by the model. When the
/// code is redeemed, the client presents the verifier the challenge was derived from.
///
/// The simple `plain` method only prevents attackers unable to snoop on the connection from
/// impersonating the client, while the `S256` method, which uses one-way hash functions, makes
/// any attack short of reading the victim client's memory infeasible.
///
/// Support for the `plain` method is OPTIONAL and must be turned on explicitely.
///
/// [RFC 7636]: https://tools.ietf.org/html/rfc7636
#[derive(Clone, Copy, Debug, Default)]
pub struct Pkce {
    required: bool,
    allow_plain: bool,
}

enum Method<'a> {
    Plain(&'a str),
    Sha256(&'a str),
}

impl Pkce {
    /// A pkce extensions which requires clients to use it.
    pub fn required() -> Pkce {
        Pkce {
            required: true,
            allow_plain: false,
        }
    }

    /// Pkce extension which will check verifiers if present but not require them.
    pub fn optional() -> Pkce {
        Pkce {
            required: false,
            allow_plain: false,
        }
    }

    /// Allow usage of the less secure `plain` verification method. This method is NOT secure
    /// an eavesdropping attacker such as rogue processes capturing a devices requests.
    pub fn allow_plain(&mut self) {
        self.allow_plain = true;
    }

    /// Whether codes without a challenge are rejected.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Verify a presented verifier against the recorded challenge.
    ///
    /// The method defaults to `plain` when none was recorded. A code with a challenge can only be
    /// redeemed with its verifier, and a verifier for a code without challenge is an error as
    /// well, since the client evidently expected a challenge to be recorded.
    pub fn verify(
        &self, challenge: Option<&str>, method: Option<&str>, verifier: Option<&str>,
    ) -> Result<(), OAuthError> {
        let (challenge, verifier) = match (challenge, verifier) {
            (None, _) if self.required => {
                return Err(OAuthError::invalid_grant(
                    "Invalid grant: authorization code was issued without a code challenge",
                ))
            }
            (None, None) => return Ok(()),
            (None, Some(_)) => {
                return Err(OAuthError::invalid_grant(
                    "Invalid grant: code verifier was provided without a challenge",
                ))
            }
            (Some(_), None) => {
                return Err(OAuthError::invalid_grant("Missing parameter: `code_verifier`"))
            }
            (Some(challenge), Some(verifier)) => (challenge, verifier),
        };

        if !is_verifier(verifier) {
            return Err(mismatch());
        }

        let method = Method::from_parameter(method.unwrap_or("plain"), challenge)?;
        method.assert_supported_method(self.allow_plain)?.verify(verifier)
    }
}

/// A verifier has 43 to 128 unreserved characters.
fn is_verifier(verifier: &str) -> bool {
    (43..=128).contains(&verifier.len())
        && verifier
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~'))
}

fn mismatch() -> OAuthError {
    OAuthError::invalid_grant("Invalid grant: code verifier is invalid")
}

fn unsupported() -> OAuthError {
    OAuthError::invalid_grant("Invalid grant: code challenge method is not supported")
}

/// Base 64 encoding without padding
fn b64encode(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

impl<'a> Method<'a> {
    fn from_parameter(method: &str, challenge: &'a str) -> Result<Self, OAuthError> {
        match method {
            "plain" => Ok(Method::Plain(challenge)),
            "S256" => Ok(Method::Sha256(challenge)),
            _ => Err(unsupported()),
        }
    }

    fn assert_supported_method(self, allow_plain: bool) -> Result<Self, OAuthError> {
        match (self, allow_plain) {
            (this, true) => Ok(this),
            (Method::Sha256(content), false) => Ok(Method::Sha256(content)),
            (Method::Plain(_), false) => Err(unsupported()),
        }
    }

    fn verify(&self, verifier: &str) -> Result<(), OAuthError> {
        let matches: bool = match self {
            Method::Plain(encoded) => encoded.as_bytes().ct_eq(verifier.as_bytes()).into(),
            Method::Sha256(encoded) => {
                let mut hasher = Sha256::new();
                hasher.update(verifier.as_bytes());
                let b64digest = b64encode(&hasher.finalize());
                encoded.as_bytes().ct_eq(b64digest.as_bytes()).into()
            }
        };

        if matches {
            Ok(())
        } else {
            Err(mismatch())
        }
    }
}
