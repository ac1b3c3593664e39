//! Transport port definition.

use async_trait::async_trait;

use crate::domain::entities::{HttpRequest, ResponseEnvelope};

/// Port for sending HTTP requests.
///
/// Implementations never fail: transport errors come back as
/// [`ResponseEnvelope::failed`]. Implementations must be safe to share
/// between concurrently running tasks.
#[async_trait]
pub trait TransportPort: Send + Sync {
    /// Sends one request and returns the normalized response.
    async fn send(&self, request: HttpRequest) -> ResponseEnvelope;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    use bytes::Bytes;
    use parking_lot::Mutex;
    use reqwest::header::HeaderMap;
    use reqwest::{Method, StatusCode};

    #[derive(Clone)]
    struct Script {
        status: Option<StatusCode>,
        body: Bytes,
        delay: Option<Duration>,
    }

    /// Scripted transport for testing.
    ///
    /// Responds per `(method, url)`; unscripted requests get a failed envelope.
    #[derive(Default)]
    pub struct MockTransport {
        scripts: Mutex<HashMap<(Method, String), Script>>,
        calls: Mutex<Vec<(Method, String)>>,
        cookies: Mutex<Vec<(String, String)>>,
    }

    impl MockTransport {
        /// Creates a transport with no scripted responses.
        pub fn new() -> Self {
            Self::default()
        }

        /// Scripts a response for a method and URL.
        pub fn respond(&self, method: Method, url: &str, status: StatusCode, body: impl Into<Bytes>) {
            self.scripts.lock().insert(
                (method, url.to_string()),
                Script {
                    status: Some(status),
                    body: body.into(),
                    delay: None,
                },
            );
        }

        /// Scripts a successful HEAD and a GET returning `body` for a URL.
        pub fn serve_image(&self, url: &str, body: impl Into<Bytes>) {
            self.respond(Method::HEAD, url, StatusCode::OK, Bytes::new());
            self.respond(Method::GET, url, StatusCode::OK, body);
        }

        /// Delays the response for a method and URL; cancellation cuts the delay short.
        pub fn delay(&self, method: Method, url: &str, delay: Duration) {
            let mut scripts = self.scripts.lock();
            let entry = scripts
                .entry((method, url.to_string()))
                .or_insert_with(|| Script {
                    status: None,
                    body: Bytes::new(),
                    delay: None,
                });
            entry.delay = Some(delay);
        }

        /// Returns how many requests were sent for a method and URL.
        pub fn calls_to(&self, method: &Method, url: &str) -> usize {
            self.calls
                .lock()
                .iter()
                .filter(|(m, u)| m == method && u == url)
                .count()
        }

        /// Returns every caller cookie that reached this transport, sorted.
        pub fn cookies_seen(&self) -> Vec<(String, String)> {
            let mut cookies = self.cookies.lock().clone();
            cookies.sort();
            cookies
        }

        /// Returns the total number of requests sent.
        pub fn total_calls(&self) -> usize {
            self.calls.lock().len()
        }
    }

    #[async_trait]
    impl TransportPort for MockTransport {
        async fn send(&self, request: HttpRequest) -> ResponseEnvelope {
            let key = (request.method().clone(), request.url().to_string());
            self.calls.lock().push(key.clone());
            self.cookies.lock().extend(
                request
                    .cookies()
                    .iter()
                    .map(|(name, value)| (name.clone(), value.clone())),
            );
            let script = self.scripts.lock().get(&key).cloned();

            let Some(script) = script else {
                return ResponseEnvelope::failed();
            };

            if let Some(delay) = script.delay {
                tokio::select! {
                    () = request.cancellation().cancelled() => return ResponseEnvelope::failed(),
                    () = tokio::time::sleep(delay) => {}
                }
            }

            match script.status {
                Some(status) => ResponseEnvelope::completed(
                    request.url().clone(),
                    status,
                    request.is_success(status),
                    HeaderMap::new(),
                    script.body,
                    Vec::new(),
                ),
                None => ResponseEnvelope::failed(),
            }
        }
    }
}
