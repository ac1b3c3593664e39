//! Image validation DTOs.

use serde::Serialize;

use crate::domain::entities::{CandidateImage, ValidatedImage};

/// Why a candidate did not make it into the validated set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DropReason {
    /// HEAD request failed or returned a non-success status.
    Unreachable,
    /// GET request failed or returned a non-success status.
    DownloadFailed,
    /// Body is not a JPEG, PNG or GIF with a readable header.
    UnrecognizedFormat,
    /// Image is too narrow to be useful.
    BelowMinWidth {
        /// Measured width.
        width: u32,
    },
    /// Same URL was deferred to a primary image that was dropped.
    PrimaryDropped,
    /// The batch was cancelled before this image completed.
    Cancelled,
    /// The validation task itself failed.
    TaskFailed {
        /// Failure detail.
        detail: String,
    },
}

impl DropReason {
    /// Returns true for policy rejections, as opposed to missing data.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::UnrecognizedFormat | Self::BelowMinWidth { .. })
    }

    /// Returns human-readable description.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::Unreachable => "image not reachable".to_string(),
            Self::DownloadFailed => "image download failed".to_string(),
            Self::UnrecognizedFormat => "unrecognized image format".to_string(),
            Self::BelowMinWidth { width } => format!("width {width}px below minimum"),
            Self::PrimaryDropped => "matching primary image was dropped".to_string(),
            Self::Cancelled => "cancelled".to_string(),
            Self::TaskFailed { detail } => format!("validation task failed: {detail}"),
        }
    }
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// A candidate that was left out, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedImage {
    /// The candidate.
    pub image: CandidateImage,
    /// Why it was dropped.
    #[serde(flatten)]
    pub reason: DropReason,
}

/// Outcome of validating a batch of candidates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Images confirmed reachable (and measured, when measurement ran).
    pub validated: Vec<ValidatedImage>,
    /// Images left out.
    pub dropped: Vec<DroppedImage>,
}

impl ValidationReport {
    /// Returns the number of candidates processed after deduplication.
    #[must_use]
    pub fn processed(&self) -> usize {
        self.validated.len() + self.dropped.len()
    }
}
