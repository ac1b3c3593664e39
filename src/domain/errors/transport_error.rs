//! Transport construction and input error types.

use thiserror::Error;

/// Errors raised before a request ever reaches the network.
///
/// Sending never fails with this type: network failures are folded into a
/// failed [`ResponseEnvelope`](crate::domain::entities::ResponseEnvelope).
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum TransportError {
    #[error("missing url")]
    MissingUrl,

    #[error("invalid url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to build HTTP client: {message}")]
    ClientBuild { message: String },

    #[error("invalid proxy configuration: {message}")]
    Proxy { message: String },
}

impl TransportError {
    /// Creates invalid url error.
    #[must_use]
    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates client build error.
    #[must_use]
    pub fn client_build(message: impl Into<String>) -> Self {
        Self::ClientBuild {
            message: message.into(),
        }
    }

    /// Creates proxy error.
    #[must_use]
    pub fn proxy(message: impl Into<String>) -> Self {
        Self::Proxy {
            message: message.into(),
        }
    }

    /// Returns whether the error was caused by caller input rather than setup.
    #[must_use]
    pub const fn is_input_error(&self) -> bool {
        matches!(self, Self::MissingUrl | Self::InvalidUrl { .. })
    }
}
