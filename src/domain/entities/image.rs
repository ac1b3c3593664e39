//! Candidate and validated image entities.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use super::http::parse_http_url;
use crate::domain::errors::TransportError;

/// Role an image plays for a media item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageRole {
    /// Poster / cover art.
    Primary,
    /// Background art.
    Backdrop,
}

impl fmt::Display for ImageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Backdrop => write!(f, "backdrop"),
        }
    }
}

/// Pixel dimensions read from an image header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Creates dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// An image URL proposed for a role, not yet confirmed to exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateImage {
    /// Role of the image.
    pub role: ImageRole,
    /// Source URL.
    pub url: Url,
    /// Provider label shown to the user.
    pub provider: String,
    /// Dimensions reported by the scraper, if any.
    pub dimensions: Option<Dimensions>,
}

impl CandidateImage {
    /// Creates a candidate after validating the URL.
    ///
    /// # Errors
    /// Returns error if the URL is blank or not an absolute http(s) URL.
    pub fn new(url: &str, role: ImageRole) -> Result<Self, TransportError> {
        Ok(Self::from_url(parse_http_url(url)?, role))
    }

    /// Creates a candidate for an already parsed URL.
    #[must_use]
    pub const fn from_url(url: Url, role: ImageRole) -> Self {
        Self {
            role,
            url,
            provider: String::new(),
            dimensions: None,
        }
    }

    /// Sets the provider label.
    #[must_use]
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    /// Returns true when both candidates name the same (URL, role) pair.
    #[must_use]
    pub fn same_identity(&self, other: &Self) -> bool {
        self.role == other.role && self.url == other.url
    }
}

/// A candidate confirmed reachable, with measured dimensions when measurement ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedImage {
    /// Role of the image.
    pub role: ImageRole,
    /// Source URL.
    pub url: Url,
    /// Provider label.
    pub provider: String,
    /// Measured dimensions, `None` when measurement was skipped.
    pub dimensions: Option<Dimensions>,
}

impl ValidatedImage {
    /// Accepts a candidate with measured dimensions.
    #[must_use]
    pub fn measured(candidate: &CandidateImage, dimensions: Dimensions) -> Self {
        Self {
            role: candidate.role,
            url: candidate.url.clone(),
            provider: candidate.provider.clone(),
            dimensions: Some(dimensions),
        }
    }

    /// Accepts a candidate without measuring it.
    #[must_use]
    pub fn unmeasured(candidate: &CandidateImage) -> Self {
        Self {
            role: candidate.role,
            url: candidate.url.clone(),
            provider: candidate.provider.clone(),
            dimensions: candidate.dimensions,
        }
    }

    /// Copies this result onto another candidate sharing the same URL.
    #[must_use]
    pub fn linked_to(&self, candidate: &CandidateImage) -> Self {
        Self {
            role: candidate.role,
            url: candidate.url.clone(),
            provider: candidate.provider.clone(),
            dimensions: self.dimensions,
        }
    }
}

impl fmt::Display for ValidatedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.dimensions {
            Some(dims) => write!(f, "{} {} ({dims})", self.role, self.url),
            None => write!(f, "{} {} (unmeasured)", self.role, self.url),
        }
    }
}
