//! Incoming HTTP request type and query-string access.

use std::collections::HashMap;

use http::{HeaderMap, Method, Uri};

/// An incoming HTTP request, reduced to what handlers read.
///
/// The body is not retained: every route this service exposes is a `GET`.
pub struct Request {
    pub(crate) method: Method,
    pub(crate) uri: Uri,
    pub(crate) headers: HeaderMap,
    pub(crate) params: HashMap<String, String>,
}

impl Request {
    pub(crate) fn new(parts: http::request::Parts, params: HashMap<String, String>) -> Self {
        Self { method: parts.method, uri: parts.uri, headers: parts.headers, params }
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn uri(&self) -> &Uri { &self.uri }
    pub fn path(&self) -> &str { self.uri.path() }
    pub fn headers(&self) -> &HeaderMap { &self.headers }

    /// Header lookup. Values that are not visible ASCII are treated as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/libs/{variant}`, `req.param("variant")` on
    /// `/libs/linux-x64` returns `Some("linux-x64")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Decoded query-string parameters.
    pub fn query(&self) -> QueryParams {
        QueryParams::from_uri(&self.uri)
    }
}

/// Decoded query-string parameters.
///
/// Built from whatever the caller already has: a mapping parsed upstream
/// ([`from_map`](Self::from_map)), an absolute URL
/// ([`from_url`](Self::from_url)), or a request-target URI
/// ([`from_uri`](Self::from_uri)). Repeated names keep the last value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryParams(HashMap<String, String>);

impl QueryParams {
    pub fn from_map(map: HashMap<String, String>) -> Self {
        Self(map)
    }

    pub fn from_uri(uri: &Uri) -> Self {
        uri.query().map(Self::parse).unwrap_or_default()
    }

    /// Parses the query of an absolute URL such as
    /// `https://host/api/assets?platform=linux&arch=x64`.
    pub fn from_url(raw: &str) -> Result<Self, url::ParseError> {
        let url = url::Url::parse(raw)?;
        Ok(Self(url.query_pairs().into_owned().collect()))
    }

    /// Parses a bare `application/x-www-form-urlencoded` query string.
    pub fn parse(query: &str) -> Self {
        Self(url::form_urlencoded::parse(query.as_bytes()).into_owned().collect())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

impl From<HashMap<String, String>> for QueryParams {
    fn from(map: HashMap<String, String>) -> Self {
        Self::from_map(map)
    }
}
