//! Clearance service error types.

use thiserror::Error;

/// Errors returned by the Cloudflare clearance service client.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum ClearanceError {
    #[error("clearance request failed: {message}")]
    Request { message: String },

    #[error("clearance service returned HTTP {status}")]
    Status { status: u16 },

    #[error("clearance solver reported failure: {message}")]
    Solver { message: String },

    #[error("failed to decode clearance response: {message}")]
    Decode { message: String },
}

impl ClearanceError {
    /// Creates request error.
    #[must_use]
    pub fn request(message: impl Into<String>) -> Self {
        Self::Request {
            message: message.into(),
        }
    }

    /// Creates solver error.
    #[must_use]
    pub fn solver(message: impl Into<String>) -> Self {
        Self::Solver {
            message: message.into(),
        }
    }

    /// Creates decode error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}
