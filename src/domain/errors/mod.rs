//! Domain error types.

mod clearance_error;
mod transport_error;

pub use clearance_error::ClearanceError;
pub use transport_error::TransportError;
