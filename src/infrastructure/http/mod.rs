//! HTTP transport stack: reqwest client, clearance and response cache.

mod cache;
mod clearance;
mod client;
mod headers;

use std::sync::Arc;

pub use cache::{CacheStats, ResponseCache};
pub use clearance::{Clearance, ClearanceClient, is_challenge};
pub use client::{DEFAULT_USER_AGENT, HttpTransport};
pub use headers::{build_header_map, sanitize_cookie_part, sanitize_header_value};

use crate::domain::entities::parse_http_url;
use crate::domain::errors::TransportError;
use crate::domain::ports::TelemetryPort;
use crate::infrastructure::config::AppConfig;

/// Builds the process-wide transport: network client wrapped in the cache.
///
/// # Errors
/// Returns error if the HTTP, proxy or bypass settings are invalid.
pub fn build_transport(
    config: &AppConfig,
    telemetry: Arc<dyn TelemetryPort>,
) -> Result<Arc<ResponseCache>, TransportError> {
    let update_url = config
        .http
        .update_check_url
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_http_url)
        .transpose()?;

    let client = HttpTransport::new(&config.http, telemetry)?;

    Ok(Arc::new(ResponseCache::new(
        Arc::new(client),
        &config.cache,
        update_url.as_ref(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::NoopTelemetry;

    #[test]
    fn test_build_transport_with_defaults() {
        let transport = build_transport(&AppConfig::default(), Arc::new(NoopTelemetry)).unwrap();
        assert!(transport.is_empty());
    }

    #[test]
    fn test_build_transport_rejects_bad_update_url() {
        let mut config = AppConfig::default();
        config.http.update_check_url = Some("ftp://updates.test/".to_string());

        let err = build_transport(&config, Arc::new(NoopTelemetry)).err().unwrap();
        assert!(err.is_input_error());
    }
}
