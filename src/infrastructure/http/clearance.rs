//! Client for a FlareSolverr-compatible Cloudflare clearance service.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::header::{HeaderMap, SERVER};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::domain::entities::{ResponseCookie, parse_http_url};
use crate::domain::errors::{ClearanceError, TransportError};

/// Cookies and the user agent they are bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clearance {
    /// User agent the solver used; must accompany the cookies.
    pub user_agent: String,
    /// Cookies set during the solve.
    pub cookies: Vec<ResponseCookie>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SolveRequest<'a> {
    cmd: &'static str,
    url: &'a str,
    max_timeout: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    proxy: Option<SolveProxy<'a>>,
}

#[derive(Debug, Serialize)]
struct SolveProxy<'a> {
    url: &'a str,
}

#[derive(Debug, Deserialize)]
struct SolveResponse {
    status: String,
    #[serde(default)]
    message: String,
    solution: Option<Solution>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Solution {
    #[serde(default)]
    user_agent: String,
    #[serde(default)]
    cookies: Vec<SolutionCookie>,
}

#[derive(Debug, Deserialize)]
struct SolutionCookie {
    name: String,
    value: String,
}

/// Asks the clearance service to solve the bot challenge for a URL.
#[derive(Debug, Clone)]
pub struct ClearanceClient {
    endpoint: Url,
    client: Client,
    max_timeout: Duration,
    proxy_url: Option<String>,
}

impl ClearanceClient {
    /// Creates a client for the service at `base_url`.
    ///
    /// `client` should share the transport's proxy settings; `max_timeout`
    /// is the solver budget and must not exceed the transport timeout.
    ///
    /// # Errors
    /// Returns error if `base_url` is not an absolute http(s) URL.
    pub fn new(
        base_url: &str,
        client: Client,
        max_timeout: Duration,
        proxy_url: Option<String>,
    ) -> Result<Self, TransportError> {
        let mut base = parse_http_url(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base
            .join("v1")
            .map_err(|e| TransportError::invalid_url(base_url, e.to_string()))?;

        Ok(Self {
            endpoint,
            client,
            max_timeout,
            proxy_url,
        })
    }

    /// Returns the solver endpoint.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Solves the challenge guarding `url`.
    ///
    /// # Errors
    /// Returns error if the service is unreachable, answers with a non-success
    /// status, reports a solver failure or returns an unreadable body.
    pub async fn solve(&self, url: &Url) -> Result<Clearance, ClearanceError> {
        let max_timeout = u64::try_from(self.max_timeout.as_millis()).unwrap_or(u64::MAX);
        let payload = SolveRequest {
            cmd: "request.get",
            url: url.as_str(),
            max_timeout,
            proxy: self.proxy_url.as_deref().map(|url| SolveProxy { url }),
        };

        debug!(url = %url, endpoint = %self.endpoint, "Requesting clearance");

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&payload)
            .send()
            .await
            .map_err(|e| ClearanceError::request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClearanceError::Status {
                status: status.as_u16(),
            });
        }

        let body: SolveResponse = response
            .json()
            .await
            .map_err(|e| ClearanceError::decode(e.to_string()))?;

        if body.status != "ok" {
            return Err(ClearanceError::solver(body.message));
        }

        let solution = body
            .solution
            .ok_or_else(|| ClearanceError::decode("missing solution"))?;

        debug!(
            url = %url,
            cookies = solution.cookies.len(),
            "Clearance obtained"
        );

        Ok(Clearance {
            user_agent: solution.user_agent,
            cookies: solution
                .cookies
                .into_iter()
                .map(|c| ResponseCookie {
                    name: c.name,
                    value: c.value,
                })
                .collect(),
        })
    }
}

/// Returns true when a response is a Cloudflare bot challenge page.
#[must_use]
pub fn is_challenge(status: StatusCode, headers: &HeaderMap, body: &str) -> bool {
    static CHALLENGE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)<title>\s*(just a moment|attention required)|cf[-_]chl|challenge-platform")
            .unwrap()
    });

    if !matches!(
        status,
        StatusCode::FORBIDDEN | StatusCode::SERVICE_UNAVAILABLE | StatusCode::TOO_MANY_REQUESTS
    ) {
        return false;
    }

    let from_cloudflare = headers
        .get(SERVER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|server| server.to_ascii_lowercase().starts_with("cloudflare"));

    from_cloudflare && CHALLENGE_RE.is_match(body)
}
