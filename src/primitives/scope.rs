//! Defines the Scope type and parsing/formatting according to the rfc.
use std::{cmp, fmt, str};

use serde::{Deserialize, Serialize};

/// Scope of a given grant or token, a sequence of scope-tokens separated by spaces.
///
/// Scopes are interpreted as a conjunction of scope tokens, i.e. a scope is fulfilled if all of
/// its scope tokens are fulfilled.  This induces a partial ordering on scopes where scope `A`
/// is less or equal than scope `B` if all scope tokens of `A` are also found in `B`.
///
/// The tokens keep the order in which they were first given, duplicates are dropped. Equality
/// ignores the order, two scopes are equal when they contain the same tokens.
///
/// Example
/// ------
///
/// ```
/// # use oxide_grant::primitives::scope::Scope;
/// let granted   = "read write".parse::<Scope>().unwrap();
/// let requested = "read".parse::<Scope>().unwrap();
///
/// assert!(requested <= granted);
/// assert!(granted.privileged_to(&requested));
/// assert_eq!(granted, "write read".parse::<Scope>().unwrap());
/// ```
///
/// Scope-tokens are restricted to the following subset of ascii:
///   - The character '!'
///   - The character range '\x23' to '\x5b' which includes numbers and upper case letters
///   - The character range '\x5d' to '\x7e' which includes lower case letters
/// Individual scope-tokens are separated by spaces.
///
/// In particular, the characters '\x22' (`"`) and '\x5c' (`\`)  are not allowed.
#[derive(Clone, Default)]
pub struct Scope {
    tokens: Vec<String>,
}

impl Serialize for Scope {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Scope {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let string = String::deserialize(deserializer)?;
        string.parse().map_err(serde::de::Error::custom)
    }
}

impl Scope {
    fn invalid_scope_char(ch: char) -> bool {
        match ch {
            '\x21' => false,
            ch if ('\x23'..='\x5b').contains(&ch) => false,
            ch if ('\x5d'..='\x7e').contains(&ch) => false,
            _ => true,
        }
    }

    /// Build a scope from individual tokens.
    ///
    /// Each token must be non-empty and consist only of allowed characters, in particular it must
    /// not contain a space.
    pub fn from_tokens<I, S>(tokens: I) -> Result<Scope, ParseScopeErr>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut scope = Scope::default();
        for token in tokens {
            let token = token.as_ref();
            if token.is_empty() {
                return Err(ParseScopeErr::EmptyToken);
            }
            if let Some(ch) = token.chars().find(|&ch| Scope::invalid_scope_char(ch)) {
                return Err(ParseScopeErr::InvalidCharacter(ch));
            }
            scope.push(token);
        }
        Ok(scope)
    }

    fn push(&mut self, token: &str) {
        if !self.contains(token) {
            self.tokens.push(token.to_string());
        }
    }

    /// Determines if this scope has enough privileges to access some resource requiring the scope
    /// on the right side. This operation is equivalent to comparison via `>=`.
    pub fn privileged_to(&self, rhs: &Scope) -> bool {
        rhs <= self
    }

    /// Determines if a resource protected by this scope should allow access to a token with the
    /// grant on the right side. This operation is equivalent to comparison via `<=`.
    pub fn allow_access(&self, rhs: &Scope) -> bool {
        self <= rhs
    }

    /// The tokens present in both scopes, in the order of `self`.
    pub fn intersection(&self, rhs: &Scope) -> Scope {
        Scope {
            tokens: self
                .tokens
                .iter()
                .filter(|token| rhs.contains(token))
                .cloned()
                .collect(),
        }
    }

    /// Test if a single scope-token is part of this scope.
    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|own| own == token)
    }

    /// Whether no scope-token is present.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The number of distinct scope-tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Create an iterator over the individual scopes, in their canonical order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(AsRef::as_ref)
    }
}

/// Error returned from parsing a scope as encoded in a token request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseScopeErr {
    /// A character was encountered which is not allowed to appear in scope strings.
    ///
    /// In particular, the characters '\x22' (`"`) and '\x5c' (`\`)  are not allowed.
    InvalidCharacter(char),

    /// A scope-token given on its own was empty.
    EmptyToken,
}

impl str::FromStr for Scope {
    type Err = ParseScopeErr;

    fn from_str(string: &str) -> Result<Scope, ParseScopeErr> {
        if let Some(ch) = string
            .chars()
            .find(|&ch| ch != ' ' && Scope::invalid_scope_char(ch))
        {
            return Err(ParseScopeErr::InvalidCharacter(ch));
        }
        let mut scope = Scope::default();
        string
            .split(' ')
            .filter(|s| !s.is_empty())
            .for_each(|token| scope.push(token));
        Ok(scope)
    }
}

impl fmt::Display for ParseScopeErr {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match self {
            ParseScopeErr::InvalidCharacter(chr) => {
                write!(fmt, "Encountered invalid character in scope: {}", chr)
            }
            ParseScopeErr::EmptyToken => write!(fmt, "Encountered an empty scope token"),
        }
    }
}

impl std::error::Error for ParseScopeErr {}

impl fmt::Debug for Scope {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_tuple("Scope").field(&self.tokens).finish()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(&self.tokens.join(" "))
    }
}

impl PartialEq for Scope {
    fn eq(&self, rhs: &Self) -> bool {
        self.partial_cmp(rhs) == Some(cmp::Ordering::Equal)
    }
}

impl Eq for Scope {}

impl PartialOrd for Scope {
    fn partial_cmp(&self, rhs: &Self) -> Option<cmp::Ordering> {
        let intersect_count = self.intersection(rhs).len();
        if intersect_count == self.len() && intersect_count == rhs.len() {
            Some(cmp::Ordering::Equal)
        } else if intersect_count == self.len() {
            Some(cmp::Ordering::Less)
        } else if intersect_count == rhs.len() {
            Some(cmp::Ordering::Greater)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parsing() {
        let scope = Scope::from_tokens(&["default", "password", "email"]).unwrap();
        let formatted = scope.to_string();
        assert_eq!(formatted, "default password email");
        let parsed = formatted.parse::<Scope>().unwrap();
        assert_eq!(scope, parsed);

        let from_string = "email  password default email".parse::<Scope>().unwrap();
        assert_eq!(scope, from_string);
        assert_eq!(from_string.iter().collect::<Vec<_>>(), ["email", "password", "default"]);
    }

    #[test]
    fn test_invalid() {
        assert_eq!(
            "read \"write\"".parse::<Scope>().unwrap_err(),
            ParseScopeErr::InvalidCharacter('"')
        );
        assert_eq!(
            "back\\slash".parse::<Scope>().unwrap_err(),
            ParseScopeErr::InvalidCharacter('\\')
        );
        assert_eq!(
            Scope::from_tokens(&["read", ""]).unwrap_err(),
            ParseScopeErr::EmptyToken
        );
        assert_eq!(
            Scope::from_tokens(&["read write"]).unwrap_err(),
            ParseScopeErr::InvalidCharacter(' ')
        );
    }

    #[test]
    fn test_compare() {
        let scope_base = "cap1 cap2".parse::<Scope>().unwrap();
        let scope_less = "cap1".parse::<Scope>().unwrap();
        let scope_uncmp = "cap1 cap3".parse::<Scope>().unwrap();

        assert_eq!(scope_base.partial_cmp(&scope_less), Some(cmp::Ordering::Greater));
        assert_eq!(scope_less.partial_cmp(&scope_base), Some(cmp::Ordering::Less));

        assert_eq!(scope_base.partial_cmp(&scope_uncmp), None);
        assert_eq!(scope_uncmp.partial_cmp(&scope_base), None);

        assert_eq!(scope_base.partial_cmp(&scope_base), Some(cmp::Ordering::Equal));

        assert!(scope_base.privileged_to(&scope_less));
        assert!(scope_base.privileged_to(&scope_base));
        assert!(scope_less.allow_access(&scope_base));
        assert!(scope_base.allow_access(&scope_base));

        assert!(!scope_less.privileged_to(&scope_base));
        assert!(!scope_base.allow_access(&scope_less));

        assert!(!scope_less.privileged_to(&scope_uncmp));
        assert!(!scope_base.privileged_to(&scope_uncmp));
        assert!(!scope_uncmp.allow_access(&scope_less));
        assert!(!scope_uncmp.allow_access(&scope_base));
    }

    #[test]
    fn test_intersection() {
        let requested = "c b a".parse::<Scope>().unwrap();
        let allowed = "a c d".parse::<Scope>().unwrap();
        let both = requested.intersection(&allowed);
        assert_eq!(both.iter().collect::<Vec<_>>(), ["c", "a"]);
        assert!(Scope::default().is_empty());
    }

    #[test]
    fn deserialize_invalid_scope() {
        let deserialized = serde_json::from_str::<Scope>("\"\\\"\"");
        assert!(deserialized.is_err());
    }

    #[test]
    fn serializes_as_string() {
        let scope = "cap1 cap2 cap3".parse::<Scope>().unwrap();
        let serialized = serde_json::to_string(&scope).unwrap();
        assert_eq!(serialized, "\"cap1 cap2 cap3\"");
        let deserialized = serde_json::from_str::<Scope>(&serialized).unwrap();
        assert_eq!(scope, deserialized);
    }
}
