//! Domain layer with core entities, port definitions and pure services.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;
/// Pure domain services.
pub mod services;

pub use entities::{CandidateImage, Dimensions, HttpRequest, ImageRole, ResponseEnvelope, ValidatedImage};
pub use errors::{ClearanceError, TransportError};
pub use ports::{TelemetryPort, TransportPort};
