//! Deduplication and fetch planning for image validation.
//!
//! Planning and resolution are synchronous; only the fetches between them
//! touch the network.

use std::collections::{HashMap, HashSet};

use url::Url;

use crate::application::dto::{DropReason, DroppedImage, ValidationReport};
use crate::domain::entities::{CandidateImage, ImageRole, ValidatedImage};

/// Result of validating a single fetched candidate.
pub type FetchOutcome = Result<ValidatedImage, DropReason>;

/// Removes (URL, role) duplicates, keeping the first occurrence.
///
/// Empty provider labels are filled with `default_provider`. When the first
/// backdrop is the same picture as the first primary it is moved to the end,
/// so a distinct image leads the backdrops.
#[must_use]
pub fn deduplicate(
    images: impl IntoIterator<Item = CandidateImage>,
    default_provider: &str,
) -> Vec<CandidateImage> {
    let mut seen: HashSet<(ImageRole, Url)> = HashSet::new();
    let mut clean: Vec<CandidateImage> = Vec::new();

    for mut image in images {
        if !seen.insert((image.role, image.url.clone())) {
            continue;
        }
        if image.provider.is_empty() {
            image.provider = default_provider.to_string();
        }
        clean.push(image);
    }

    let first_primary = clean.iter().find(|i| i.role == ImageRole::Primary);
    let first_backdrop = clean.iter().position(|i| i.role == ImageRole::Backdrop);

    if let (Some(primary), Some(index)) = (first_primary, first_backdrop)
        && primary.url == clean[index].url
    {
        let backdrop = clean.remove(index);
        clean.push(backdrop);
    }

    clean
}

#[derive(Debug, Clone)]
enum Slot {
    /// Needs its own HEAD/GET round.
    Fetch(CandidateImage),
    /// Backdrop sharing its URL with a primary; takes the primary's result.
    Linked(CandidateImage),
}

/// Two-phase plan: fetch independent candidates, then link role duplicates.
#[derive(Debug, Clone, Default)]
pub struct ValidationPlan {
    slots: Vec<Slot>,
}

impl ValidationPlan {
    /// Deduplicates the input and decides which candidates need a fetch.
    #[must_use]
    pub fn build(images: impl IntoIterator<Item = CandidateImage>, default_provider: &str) -> Self {
        let clean = deduplicate(images, default_provider);

        let (primaries, backdrops): (Vec<_>, Vec<_>) = clean
            .into_iter()
            .partition(|i| i.role == ImageRole::Primary);

        let primary_urls: HashSet<Url> = primaries.iter().map(|i| i.url.clone()).collect();

        let mut slots: Vec<Slot> = primaries.into_iter().map(Slot::Fetch).collect();
        slots.extend(backdrops.into_iter().map(|image| {
            if primary_urls.contains(&image.url) {
                Slot::Linked(image)
            } else {
                Slot::Fetch(image)
            }
        }));

        Self { slots }
    }

    /// Candidates that need a network round, with their slot index.
    pub fn fetches(&self) -> impl Iterator<Item = (usize, &CandidateImage)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| match slot {
            Slot::Fetch(image) => Some((index, image)),
            Slot::Linked(_) => None,
        })
    }

    /// Candidates that reuse a primary's result.
    pub fn linked(&self) -> impl Iterator<Item = &CandidateImage> {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Linked(image) => Some(image),
            Slot::Fetch(_) => None,
        })
    }

    /// Returns the candidate at a slot index.
    #[must_use]
    pub fn candidate(&self, index: usize) -> Option<&CandidateImage> {
        self.slots.get(index).map(|slot| match slot {
            Slot::Fetch(image) | Slot::Linked(image) => image,
        })
    }

    /// Number of candidates after deduplication.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true when there is nothing to validate.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Combines fetch outcomes, keyed by slot index, into the final report.
    ///
    /// Linked backdrops copy the dimensions of the validated primary with the
    /// same URL and are dropped when that primary was dropped. A fetch slot
    /// without an outcome counts as cancelled.
    #[must_use]
    pub fn resolve(&self, mut outcomes: HashMap<usize, FetchOutcome>) -> ValidationReport {
        let primaries: HashMap<&Url, ValidatedImage> = self
            .fetches()
            .filter(|(_, image)| image.role == ImageRole::Primary)
            .filter_map(|(index, image)| match outcomes.get(&index) {
                Some(Ok(validated)) => Some((&image.url, validated.clone())),
                _ => None,
            })
            .collect();

        let mut report = ValidationReport::default();

        for (index, slot) in self.slots.iter().enumerate() {
            let (image, outcome) = match slot {
                Slot::Fetch(image) => (
                    image,
                    outcomes
                        .remove(&index)
                        .unwrap_or(Err(DropReason::Cancelled)),
                ),
                Slot::Linked(image) => (
                    image,
                    primaries
                        .get(&image.url)
                        .map(|primary| primary.linked_to(image))
                        .ok_or(DropReason::PrimaryDropped),
                ),
            };

            match outcome {
                Ok(validated) => report.validated.push(validated),
                Err(reason) => report.dropped.push(DroppedImage {
                    image: image.clone(),
                    reason,
                }),
            }
        }

        report
    }
}
