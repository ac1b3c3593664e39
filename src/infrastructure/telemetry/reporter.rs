//! Background failure reporter.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use crate::domain::entities::parse_http_url;
use crate::domain::ports::TelemetryPort;
use crate::infrastructure::config::TelemetryConfig;

const SUBMIT_TIMEOUT: Duration = Duration::from_secs(10);

/// A single failure report.
#[derive(Debug, Clone, Serialize)]
pub struct FailureReport {
    /// Unique report id.
    pub id: Uuid,
    /// URL of the failed request.
    pub request: String,
    /// Error detail.
    pub error: String,
    /// When the failure was recorded.
    pub timestamp: DateTime<Utc>,
    /// Reporting application version.
    pub version: String,
}

impl FailureReport {
    /// Creates a report stamped with a fresh id and the current time.
    #[must_use]
    pub fn new(request: &str, error: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            request: request.to_string(),
            error: error.to_string(),
            timestamp: Utc::now(),
            version: crate::VERSION.to_string(),
        }
    }
}

/// Fire-and-forget [`TelemetryPort`] backed by a bounded queue.
///
/// A full queue drops the report. The worker stops once every reporter clone
/// is dropped and the queue is drained.
#[derive(Debug, Clone)]
pub struct TelemetryReporter {
    tx: mpsc::Sender<FailureReport>,
}

impl TelemetryReporter {
    /// Spawns the worker and returns the reporter with the worker handle.
    ///
    /// Must be called inside a Tokio runtime. An unusable endpoint is logged
    /// and the worker falls back to logging only.
    #[must_use]
    pub fn spawn(config: &TelemetryConfig) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let sink = config.endpoint.as_deref().and_then(ReportSink::new);

        let handle = tokio::spawn(run_worker(rx, sink));
        (Self { tx }, handle)
    }
}

impl TelemetryPort for TelemetryReporter {
    fn report_failure(&self, request_url: &str, error_detail: &str) {
        match self.tx.try_send(FailureReport::new(request_url, error_detail)) {
            Ok(()) => {}
            Err(TrySendError::Full(report)) => {
                warn!(request = %report.request, "Telemetry queue full, dropping report");
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Telemetry worker stopped, dropping report");
            }
        }
    }
}

struct ReportSink {
    client: Client,
    endpoint: Url,
}

impl ReportSink {
    fn new(endpoint: &str) -> Option<Self> {
        let endpoint = match parse_http_url(endpoint) {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "Ignoring telemetry endpoint");
                return None;
            }
        };

        let client = Client::builder()
            .timeout(SUBMIT_TIMEOUT)
            .user_agent(format!("{}/{}", crate::NAME, crate::VERSION))
            .build()
            .map_err(|e| warn!(error = %e, "Failed to create telemetry client"))
            .ok()?;

        Some(Self { client, endpoint })
    }

    async fn submit(&self, report: &FailureReport) {
        match self
            .client
            .post(self.endpoint.clone())
            .json(report)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                debug!(id = %report.id, "Failure report submitted");
            }
            Ok(response) => {
                warn!(id = %report.id, status = %response.status(), "Telemetry endpoint rejected report");
            }
            Err(e) => {
                warn!(id = %report.id, error = %e, "Failed to submit failure report");
            }
        }
    }
}

async fn run_worker(mut rx: mpsc::Receiver<FailureReport>, sink: Option<ReportSink>) {
    while let Some(report) = rx.recv().await {
        warn!(
            id = %report.id,
            request = %report.request,
            error = %report.error,
            "Request failure"
        );

        if let Some(sink) = &sink {
            sink.submit(&report).await;
        }
    }

    debug!("Telemetry worker stopped");
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;

    use super::*;

    fn config(endpoint: Option<String>, queue_capacity: usize) -> TelemetryConfig {
        TelemetryConfig {
            enabled: true,
            endpoint,
            queue_capacity,
        }
    }

    #[test]
    fn test_report_serializes_rfc3339() {
        let report = FailureReport::new("https://a.test/", "timed out");
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["request"], "https://a.test/");
        assert_eq!(json["error"], "timed out");
        assert_eq!(json["version"], crate::VERSION);
        let timestamp = json["timestamp"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(timestamp).is_ok());
        assert!(Uuid::parse_str(json["id"].as_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_worker_stops_when_reporter_dropped() {
        let (reporter, handle) = TelemetryReporter::spawn(&config(None, 4));
        reporter.report_failure("https://a.test/", "refused");
        drop(reporter);

        tokio_test::assert_ok!(tokio::time::timeout(Duration::from_secs(5), handle).await);
    }

    #[tokio::test]
    async fn test_reports_are_posted_to_endpoint() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/reports")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "request": "https://a.test/scene",
                "error": "connection refused",
            })))
            .with_status(202)
            .create_async()
            .await;

        let (reporter, handle) =
            TelemetryReporter::spawn(&config(Some(format!("{}/reports", server.url())), 4));
        reporter.report_failure("https://a.test/scene", "connection refused");
        drop(reporter);
        handle.await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_full_queue_drops_reports() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/reports")
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        let (reporter, handle) =
            TelemetryReporter::spawn(&config(Some(format!("{}/reports", server.url())), 1));
        // the worker has not run yet on this single-threaded runtime
        reporter.report_failure("https://a.test/1", "first");
        reporter.report_failure("https://a.test/2", "second");
        drop(reporter);
        handle.await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_invalid_endpoint_falls_back_to_logging() {
        let (reporter, handle) =
            TelemetryReporter::spawn(&config(Some("not a url".to_string()), 4));
        reporter.report_failure("https://a.test/", "refused");
        drop(reporter);
        handle.await.unwrap();
    }
}
