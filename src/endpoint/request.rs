//! The normalized view of an inbound token request.
//!
//! A host translates whatever its transport delivers into a [`RawRequest`], or hands over any
//! json-like value, and builds a [`Request`] from it once. The request is immutable afterwards.
//! Header names are compared case-insensitively, which is achieved by lower-casing them when the
//! request is constructed.
use std::collections::HashMap;

use mime::Mime;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::code_grant::error::OAuthError;

/// The parts of an inbound message before normalization.
///
/// Every field not named here is kept as an extension and copied into the request verbatim.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawRequest {
    /// Header fields, keys in any case.
    #[serde(default)]
    pub headers: Option<Map<String, Value>>,

    /// The http method.
    #[serde(default)]
    pub method: Option<Value>,

    /// The decoded query component of the url.
    #[serde(default)]
    pub query: Option<Map<String, Value>>,

    /// The decoded body parameters.
    #[serde(default)]
    pub body: Option<Map<String, Value>>,

    /// Additional fields supplied by the host.
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

/// An immutable, normalized request.
#[derive(Clone, Debug)]
pub struct Request {
    headers: HashMap<String, String>,
    method: String,
    query: Map<String, Value>,
    body: Map<String, Value>,
    extensions: Map<String, Value>,
}

impl Request {
    /// Normalize a raw request.
    ///
    /// Fails with `invalid_argument` naming the first of `headers`, `method` and `query` that is
    /// missing. An absent body is treated as an empty one.
    pub fn new(raw: RawRequest) -> Result<Self, OAuthError> {
        let RawRequest {
            headers,
            method,
            query,
            body,
            extensions,
        } = raw;

        let headers = headers.ok_or_else(|| OAuthError::missing_argument("headers"))?;
        let method = method.ok_or_else(|| OAuthError::missing_argument("method"))?;
        let query = query.ok_or_else(|| OAuthError::missing_argument("query"))?;

        // Later keys win when two names only differ in case.
        let headers = headers
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), header_value(value)))
            .collect();

        Ok(Request {
            headers,
            method: header_value(method),
            query,
            body: body.unwrap_or_default(),
            extensions,
        })
    }

    /// Normalize an arbitrary json value.
    ///
    /// Values that are not objects lack all required fields.
    pub fn from_value(value: Value) -> Result<Self, OAuthError> {
        let raw = match value {
            Value::Object(_) => serde_json::from_value(value)
                .map_err(|err| OAuthError::invalid_argument(format!("Invalid argument: {}", err)))?,
            _ => RawRequest::default(),
        };
        Request::new(raw)
    }

    /// Look up a header by its case-insensitive name.
    ///
    /// `referer` and `referrer` are interchangeable.
    pub fn get(&self, field: &str) -> Option<&str> {
        let field = field.to_ascii_lowercase();
        let value = match field.as_str() {
            "referer" | "referrer" => self
                .headers
                .get("referrer")
                .or_else(|| self.headers.get("referer")),
            _ => self.headers.get(&field),
        };
        value.map(String::as_str)
    }

    /// Match the declared `content-type` against candidate types.
    ///
    /// Candidates are full media types (`application/json`), wildcards (`application/*`, `*/*`),
    /// suffixes (`+json`) or one of the shorthands `json`, `urlencoded`, `form`, `html`, `text`,
    /// `xml` and `multipart`. Parameters of the declared type and the case of its base type are
    /// ignored.
    ///
    /// Returns the first matching candidate as given, or the declared base type if the candidate
    /// was a wildcard. Returns `None` if no content type was declared or nothing matches.
    pub fn is(&self, types: &[&str]) -> Option<String> {
        let declared = self.get("content-type")?.parse::<Mime>().ok()?;
        let actual = declared.essence_str().to_ascii_lowercase();

        types.iter().find_map(|candidate| {
            let expected = expand_type(candidate)?;
            if !media_type_matches(&expected, &actual) {
                return None;
            }
            if expected.contains('*') {
                Some(actual.clone())
            } else {
                Some(candidate.to_string())
            }
        })
    }

    /// All headers, by lower-cased name.
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// The http method.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The query parameters.
    pub fn query(&self) -> &Map<String, Value> {
        &self.query
    }

    /// The body parameters, empty if the message had no body.
    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    /// A single body parameter.
    pub fn body_param(&self, name: &str) -> Option<&Value> {
        self.body.get(name)
    }

    /// A single query parameter.
    pub fn query_param(&self, name: &str) -> Option<&Value> {
        self.query.get(name)
    }

    /// A field supplied by the host outside of the reserved ones.
    pub fn extension(&self, name: &str) -> Option<&Value> {
        self.extensions.get(name)
    }

    /// All fields supplied by the host outside of the reserved ones.
    pub fn extensions(&self) -> &Map<String, Value> {
        &self.extensions
    }
}

/// Header values end up as text, lists are joined as repeated headers would be.
fn header_value(value: Value) -> String {
    match value {
        Value::String(text) => text,
        Value::Array(values) => values
            .into_iter()
            .map(header_value)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn expand_type(candidate: &str) -> Option<String> {
    let candidate = candidate.trim().to_ascii_lowercase();
    if candidate.starts_with('+') {
        return Some(format!("*/*{}", candidate));
    }
    if candidate.contains('/') {
        return Some(candidate);
    }
    let expanded = match candidate.as_str() {
        "json" => "application/json",
        "urlencoded" | "form" => "application/x-www-form-urlencoded",
        "multipart" => "multipart/*",
        "html" => "text/html",
        "text" => "text/plain",
        "xml" => "application/xml",
        _ => return None,
    };
    Some(expanded.to_string())
}

fn media_type_matches(expected: &str, actual: &str) -> bool {
    let (expected_type, expected_sub) = match split_type(expected) {
        Some(parts) => parts,
        None => return false,
    };
    let (actual_type, actual_sub) = match split_type(actual) {
        Some(parts) => parts,
        None => return false,
    };

    if expected_type != "*" && expected_type != actual_type {
        return false;
    }

    if let Some(suffix) = expected_sub.strip_prefix("*+") {
        return actual_sub
            .rsplit_once('+')
            .map_or(false, |(_, actual_suffix)| actual_suffix == suffix);
    }

    expected_sub == "*" || expected_sub == actual_sub
}

fn split_type(media_type: &str) -> Option<(&str, &str)> {
    let (main, sub) = media_type.split_once('/')?;
    if main.is_empty() || sub.is_empty() {
        return None;
    }
    Some((main, sub))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::code_grant::error::ErrorKind;

    fn base_request() -> Value {
        json!({
            "query": { "foo": "bar" },
            "method": "GET",
            "headers": { "bar": "foo" },
            "body": { "foobar": "barfoo" },
        })
    }

    fn assert_missing(value: Value, field: &str) {
        let err = Request::from_value(value).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(err.message(), format!("Missing parameter: `{}`", field));
    }

    #[test]
    fn missing_fields_in_order() {
        assert_missing(Value::Null, "headers");
        assert_missing(json!({}), "headers");
        assert_missing(json!({ "method": "GET", "query": {} }), "headers");
        assert_missing(json!({ "headers": {} }), "method");
        assert_missing(json!({ "headers": {}, "query": {} }), "method");
        assert_missing(json!({ "headers": {}, "method": "GET" }), "query");
        assert_missing(json!({ "headers": null, "method": "GET", "query": {} }), "headers");
    }

    #[test]
    fn basic_request() {
        let request = Request::from_value(base_request()).unwrap();
        assert_eq!(request.get("bar"), Some("foo"));
        assert_eq!(request.method(), "GET");
        assert_eq!(request.query_param("foo"), Some(&json!("bar")));
        assert_eq!(request.body(), json!({ "foobar": "barfoo" }).as_object().unwrap());
    }

    #[test]
    fn absent_body_is_empty() {
        let mut value = base_request();
        value.as_object_mut().unwrap().remove("body");
        let request = Request::from_value(value).unwrap();
        assert!(request.body().is_empty());
    }

    #[test]
    fn header_names_are_lower_cased() {
        let mut value = base_request();
        value["headers"] = json!({ "Foo": "bar", "BAR": "foo" });
        let request = Request::from_value(value).unwrap();
        assert_eq!(request.get("foo"), Some("bar"));
        assert_eq!(request.get("bar"), Some("foo"));
        assert_eq!(request.get("FOO"), Some("bar"));
        assert!(!request.headers().contains_key("Foo"));
        assert!(!request.headers().contains_key("BAR"));
    }

    #[test]
    fn header_case_collision() {
        let mut value = base_request();
        // Keys are visited in sorted order, the lower-case name comes last.
        value["headers"] = json!({ "foo": "b", "Foo": "a" });
        let request = Request::from_value(value).unwrap();
        assert_eq!(request.get("foo"), Some("b"));
        assert_eq!(request.get("FOO"), Some("b"));
        assert_eq!(request.headers().len(), 1);
        assert!(request.headers().contains_key("foo"));
    }

    #[test]
    fn header_values_become_text() {
        let mut value = base_request();
        value["headers"] = json!({
            "Content-Length": 29,
            "Accept": ["text/html", "application/json"],
            "Referer": "https://client.example/",
        });
        let request = Request::from_value(value).unwrap();
        assert_eq!(request.get("content-length"), Some("29"));
        assert_eq!(request.get("accept"), Some("text/html, application/json"));
        assert_eq!(request.get("referrer"), Some("https://client.example/"));
    }

    #[test]
    fn extensions_are_copied() {
        let mut value = base_request();
        value["custom"] = json!({ "newFoo": "newBar" });
        value["custom2"] = json!({ "newBar": "newFoo" });
        let request = Request::from_value(value).unwrap();
        assert_eq!(request.extension("custom"), Some(&json!({ "newFoo": "newBar" })));
        assert_eq!(request.extension("custom2"), Some(&json!({ "newBar": "newFoo" })));
        assert!(request.extension("headers").is_none());
        assert_eq!(request.extensions().len(), 2);
    }

    #[test]
    fn content_type_matching() {
        let mut value = base_request();
        value["headers"]["Content-Type"] = json!("Application/X-WWW-Form-Urlencoded; charset=utf-8");
        let request = Request::from_value(value).unwrap();

        assert_eq!(
            request.is(&["application/x-www-form-urlencoded"]),
            Some("application/x-www-form-urlencoded".to_string())
        );
        assert_eq!(request.is(&["json", "urlencoded"]), Some("urlencoded".to_string()));
        assert_eq!(
            request.is(&["application/*"]),
            Some("application/x-www-form-urlencoded".to_string())
        );
        assert_eq!(request.is(&["application/json"]), None);
        assert_eq!(request.is(&[]), None);
    }

    #[test]
    fn content_type_suffix() {
        let mut value = base_request();
        value["headers"]["content-type"] = json!("application/vnd.api+json");
        let request = Request::from_value(value).unwrap();
        assert_eq!(request.is(&["+json"]), Some("application/vnd.api+json".to_string()));
        assert_eq!(request.is(&["json"]), None);
    }

    #[test]
    fn content_type_absent() {
        let request = Request::from_value(base_request()).unwrap();
        assert_eq!(request.is(&["json"]), None);
    }
}
