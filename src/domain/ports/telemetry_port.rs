//! Telemetry port definition.

/// Port for reporting request failures to an analytics sink.
///
/// Reporting is fire-and-forget: implementations must not block the caller
/// and must swallow their own failures.
#[cfg_attr(test, mockall::automock)]
pub trait TelemetryPort: Send + Sync {
    /// Records that a request to `request_url` failed with `error_detail`.
    fn report_failure(&self, request_url: &str, error_detail: &str);
}

/// Telemetry sink that discards every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTelemetry;

impl TelemetryPort for NoopTelemetry {
    fn report_failure(&self, _request_url: &str, _error_detail: &str) {}
}
