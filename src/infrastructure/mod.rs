//! Infrastructure layer with external service adapters.

/// Application configuration.
pub mod config;
/// HTTP transport, clearance and response cache.
pub mod http;
/// Failure telemetry.
pub mod telemetry;

pub use config::{AppConfig, CliArgs, Command, LogLevel, StorageManager};
pub use http::{CacheStats, HttpTransport, ResponseCache, build_transport};
pub use telemetry::{TelemetryReporter, build_telemetry};
