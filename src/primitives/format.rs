//! Character classes of request parameters, see [Appendix A] of the rfc.
//!
//! Each function returns `true` when the whole, non-empty value matches the class.
//!
//! [Appendix A]: https://tools.ietf.org/html/rfc6749#appendix-A
use url::Url;

/// A format check for a single free-text parameter value.
pub type FormatValidator = fn(&str) -> bool;

fn all(value: &str, class: impl Fn(char) -> bool) -> bool {
    !value.is_empty() && value.chars().all(class)
}

/// `VSCHAR = %x20-7E`, visible ascii including space.
pub fn vschar(value: &str) -> bool {
    all(value, |ch| ('\x20'..='\x7e').contains(&ch))
}

/// `NQCHAR = %x21 / %x23-5B / %x5D-7E`, visible ascii without quote and backslash.
pub fn nqchar(value: &str) -> bool {
    all(value, nqchar_class)
}

fn nqchar_class(ch: char) -> bool {
    ch == '\x21' || ('\x23'..='\x5b').contains(&ch) || ('\x5d'..='\x7e').contains(&ch)
}

/// `NQSCHAR = %x20-21 / %x23-5B / %x5D-7E`, like `NQCHAR` but also allowing a space.
pub fn nqschar(value: &str) -> bool {
    all(value, |ch| ch == ' ' || nqchar_class(ch))
}

/// `NCHAR = "-" / "." / "_" / DIGIT / ALPHA`.
pub fn nchar(value: &str) -> bool {
    all(value, |ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '.' || ch == '_')
}

/// `UNICODECHARNOCRLF`, any unicode scalar except control characters other than tab.
pub fn unicodecharnocrlf(value: &str) -> bool {
    all(value, |ch| ch == '\t' || !(ch < '\x20' || ch == '\x7f'))
}

/// Characters of user names and passwords.
///
/// Tab, visible ascii and all non-ascii unicode scalar values. Rust strings cannot contain
/// surrogates so the exclusion of `%xD800-DFFF` holds by construction.
pub fn uchar(value: &str) -> bool {
    all(value, |ch| match ch {
        '\t' | '\x20'..='\x7e' => true,
        '\u{fffe}' | '\u{ffff}' => false,
        ch => ch >= '\u{80}',
    })
}

/// An absolute URI.
pub fn uri(value: &str) -> bool {
    !value.is_empty() && Url::parse(value).is_ok()
}
