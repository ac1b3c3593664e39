//! Port definitions.

mod telemetry_port;
mod transport_port;

pub use telemetry_port::{NoopTelemetry, TelemetryPort};
pub use transport_port::TransportPort;
