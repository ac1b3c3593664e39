//! Failure telemetry.

mod reporter;

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::debug;

pub use reporter::{FailureReport, TelemetryReporter};

use crate::domain::ports::{NoopTelemetry, TelemetryPort};
use crate::infrastructure::config::TelemetryConfig;

/// Builds the telemetry sink; disabled telemetry discards reports.
///
/// The returned handle, when present, completes after every clone of the
/// sink is dropped and pending reports are flushed.
#[must_use]
pub fn build_telemetry(config: &TelemetryConfig) -> (Arc<dyn TelemetryPort>, Option<JoinHandle<()>>) {
    if !config.enabled {
        debug!("Telemetry disabled");
        return (Arc::new(NoopTelemetry), None);
    }

    let (reporter, handle) = TelemetryReporter::spawn(config);
    (Arc::new(reporter), Some(handle))
}
