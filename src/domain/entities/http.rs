//! HTTP request and response value objects.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io::Cursor;

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::domain::errors::TransportError;

/// Parses an absolute `http`/`https` URL.
///
/// # Errors
/// Returns `MissingUrl` for blank input and `InvalidUrl` for anything that is
/// not an absolute http(s) URL.
pub fn parse_http_url(raw: &str) -> Result<Url, TransportError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TransportError::MissingUrl);
    }

    let url = Url::parse(trimmed).map_err(|e| TransportError::invalid_url(trimmed, e.to_string()))?;

    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        "http" | "https" => Err(TransportError::invalid_url(trimmed, "missing host")),
        scheme => Err(TransportError::invalid_url(
            trimmed,
            format!("unsupported scheme {scheme}"),
        )),
    }
}

/// Request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Raw text with an optional content type.
    Text {
        /// Body text.
        content: String,
        /// Value for the `Content-Type` header.
        content_type: Option<String>,
    },
    /// `application/x-www-form-urlencoded` fields.
    Form(Vec<(String, String)>),
    /// JSON document.
    Json(serde_json::Value),
}

impl fmt::Display for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text { content, .. } => write!(f, "{content}"),
            Self::Form(fields) => {
                let pairs: Vec<String> = fields.iter().map(|(k, v)| format!("{k}={v}")).collect();
                write!(f, "{}", pairs.join("&"))
            }
            Self::Json(value) => write!(f, "{value}"),
        }
    }
}

/// A single outbound HTTP request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    url: Url,
    method: Method,
    body: Option<RequestBody>,
    headers: HashMap<String, String>,
    cookies: HashMap<String, String>,
    cancel: CancellationToken,
    additional_success: HashSet<StatusCode>,
}

impl HttpRequest {
    /// Creates a GET request after validating the URL.
    ///
    /// # Errors
    /// Returns error if the URL is blank or not an absolute http(s) URL.
    pub fn new(url: &str) -> Result<Self, TransportError> {
        parse_http_url(url).map(Self::from_url)
    }

    /// Creates a GET request for an already parsed URL.
    #[must_use]
    pub fn from_url(url: Url) -> Self {
        Self {
            url,
            method: Method::GET,
            body: None,
            headers: HashMap::new(),
            cookies: HashMap::new(),
            cancel: CancellationToken::new(),
            additional_success: HashSet::new(),
        }
    }

    /// Creates a HEAD request for an already parsed URL.
    #[must_use]
    pub fn head(url: Url) -> Self {
        Self::from_url(url).with_method(Method::HEAD)
    }

    /// Sets the request method.
    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Adds a header, replacing an earlier value for the same name.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Adds a cookie for the request host.
    #[must_use]
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    /// Threads a cancellation token through the request.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Treats an additional status code as success.
    #[must_use]
    pub fn with_success_status(mut self, status: StatusCode) -> Self {
        self.additional_success.insert(status);
        self
    }

    /// Returns the target URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Returns the method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the body, if any.
    #[must_use]
    pub const fn body(&self) -> Option<&RequestBody> {
        self.body.as_ref()
    }

    /// Returns caller-supplied headers.
    #[must_use]
    pub const fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Returns caller-supplied cookies.
    #[must_use]
    pub const fn cookies(&self) -> &HashMap<String, String> {
        &self.cookies
    }

    /// Returns the cancellation token.
    #[must_use]
    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Returns true for GET and HEAD without a body.
    #[must_use]
    pub fn is_idempotent_read(&self) -> bool {
        (self.method == Method::GET || self.method == Method::HEAD) && self.body.is_none()
    }

    /// Returns whether a status counts as success for this request.
    #[must_use]
    pub fn is_success(&self, status: StatusCode) -> bool {
        status.is_success() || self.additional_success.contains(&status)
    }
}

/// A cookie visible for the request URL after the exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseCookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: String,
}

impl ResponseCookie {
    /// Parses a `Cookie` header value (`a=1; b=2`).
    #[must_use]
    pub fn parse_header(header: &str) -> Vec<Self> {
        header
            .split(';')
            .filter_map(|pair| {
                let (name, value) = pair.trim().split_once('=')?;
                if name.is_empty() {
                    return None;
                }
                Some(Self {
                    name: name.to_string(),
                    value: value.to_string(),
                })
            })
            .collect()
    }
}

/// Normalized result of one request.
///
/// A failed round trip leaves everything at its default: `is_ok` false, no
/// status, no URL, empty body.
#[derive(Debug, Clone, Default)]
pub struct ResponseEnvelope {
    response_url: Option<Url>,
    is_ok: bool,
    status: Option<StatusCode>,
    headers: HeaderMap,
    content: String,
    bytes: Bytes,
    cookies: Vec<ResponseCookie>,
}

impl ResponseEnvelope {
    /// Envelope for a round trip that never completed.
    #[must_use]
    pub fn failed() -> Self {
        Self::default()
    }

    /// Envelope for a completed round trip.
    #[must_use]
    pub fn completed(
        response_url: Url,
        status: StatusCode,
        is_ok: bool,
        headers: HeaderMap,
        bytes: Bytes,
        cookies: Vec<ResponseCookie>,
    ) -> Self {
        let content = String::from_utf8_lossy(&bytes).into_owned();
        Self {
            response_url: Some(response_url),
            is_ok,
            status: Some(status),
            headers,
            content,
            bytes,
            cookies,
        }
    }

    /// Final URL after redirects.
    #[must_use]
    pub const fn response_url(&self) -> Option<&Url> {
        self.response_url.as_ref()
    }

    /// Whether the status was accepted as success.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.is_ok
    }

    /// Raw status code, absent when the round trip failed.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Body decoded as UTF-8 (lossy).
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Raw body bytes.
    #[must_use]
    pub const fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Returns a fresh reader over the body; may be called any number of times.
    #[must_use]
    pub fn content_stream(&self) -> Cursor<Bytes> {
        Cursor::new(self.bytes.clone())
    }

    /// Cookies known for the request URL after the exchange.
    #[must_use]
    pub fn cookies(&self) -> &[ResponseCookie] {
        &self.cookies
    }

    /// Returns true when the round trip itself completed.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        self.status.is_some()
    }

    /// Re-evaluates `is_ok` for another request's success rules.
    ///
    /// A failed round trip stays failed.
    #[must_use]
    pub fn judged_by(mut self, request: &HttpRequest) -> Self {
        self.is_ok = self.status.is_some_and(|status| request.is_success(status));
        self
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;

    #[test]
    fn test_parse_http_url_rejects_bad_input() {
        assert!(matches!(parse_http_url("  "), Err(TransportError::MissingUrl)));
        assert!(matches!(
            parse_http_url("/relative/path"),
            Err(TransportError::InvalidUrl { .. })
        ));
        assert!(matches!(
            parse_http_url("ftp://example.com/a.jpg"),
            Err(TransportError::InvalidUrl { .. })
        ));
        assert!(parse_http_url("https://example.com/a.jpg").is_ok());
    }

    #[test]
    fn test_request_defaults_to_get() {
        let request = HttpRequest::new("https://example.com/").unwrap();
        assert_eq!(request.method(), &Method::GET);
        assert!(request.is_idempotent_read());
        assert!(!request.cancellation().is_cancelled());
    }

    #[test]
    fn test_request_with_body_is_not_cacheable() {
        let request = HttpRequest::new("https://example.com/search")
            .unwrap()
            .with_method(Method::POST)
            .with_body(RequestBody::Form(vec![("q".into(), "name".into())]));
        assert!(!request.is_idempotent_read());
        assert_eq!(request.body().unwrap().to_string(), "q=name");
    }

    #[test]
    fn test_additional_success_status() {
        let request = HttpRequest::new("https://example.com/")
            .unwrap()
            .with_success_status(StatusCode::NOT_FOUND);
        assert!(request.is_success(StatusCode::OK));
        assert!(request.is_success(StatusCode::NOT_FOUND));
        assert!(!request.is_success(StatusCode::FORBIDDEN));
    }

    #[test]
    fn test_failed_envelope_is_empty() {
        let envelope = ResponseEnvelope::failed();
        assert!(!envelope.is_ok());
        assert!(envelope.status().is_none());
        assert!(envelope.response_url().is_none());
        assert!(envelope.bytes().is_empty());
        assert!(!envelope.is_completed());
    }

    #[test]
    fn test_content_stream_is_rereadable() {
        let envelope = ResponseEnvelope::completed(
            Url::parse("https://example.com/").unwrap(),
            StatusCode::OK,
            true,
            HeaderMap::new(),
            Bytes::from_static(b"hello"),
            Vec::new(),
        );

        for _ in 0..2 {
            let mut out = String::new();
            envelope.content_stream().read_to_string(&mut out).unwrap();
            assert_eq!(out, "hello");
        }
        assert_eq!(envelope.content(), "hello");
    }

    #[test]
    fn test_parse_cookie_header() {
        let cookies = ResponseCookie::parse_header("session=abc; cf_clearance=x=y; =bad");
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies[0].name, "session");
        assert_eq!(cookies[1].value, "x=y");
    }

    #[test]
    fn test_judged_by_uses_request_success_rules() {
        let url = Url::parse("https://example.com/maybe").unwrap();
        let lenient = HttpRequest::from_url(url.clone()).with_success_status(StatusCode::NOT_FOUND);
        let strict = HttpRequest::from_url(url.clone());

        let envelope = ResponseEnvelope::completed(
            url,
            StatusCode::NOT_FOUND,
            true,
            HeaderMap::new(),
            Bytes::new(),
            Vec::new(),
        );

        assert!(envelope.clone().judged_by(&lenient).is_ok());
        assert!(!envelope.judged_by(&strict).is_ok());
        assert!(!ResponseEnvelope::failed().judged_by(&lenient).is_ok());
    }
}
