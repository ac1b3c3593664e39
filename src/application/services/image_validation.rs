//! Concurrent validation and measurement of candidate images.

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::Method;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::validation_plan::{FetchOutcome, ValidationPlan};
use crate::application::dto::{DropReason, ValidationReport};
use crate::domain::entities::{CandidateImage, HttpRequest, ValidatedImage};
use crate::domain::ports::{TelemetryPort, TransportPort};
use crate::domain::services::image_geometry;

/// Images this narrow or narrower are dropped.
pub const DEFAULT_MIN_WIDTH: u32 = 100;

/// Provider label used when a scraper leaves it empty.
pub const DEFAULT_PROVIDER_NAME: &str = "mediafetch";

/// Validation policy.
#[derive(Debug, Clone)]
pub struct ValidationOptions {
    /// Check images over the network at all.
    pub validate: bool,
    /// Download images and read their dimensions.
    pub measure_size: bool,
    /// Accept images whose HEAD request fails, unmeasured.
    pub accept_unreachable: bool,
    /// Minimum width; images must be strictly wider.
    pub min_width: u32,
    /// Provider label for candidates without one.
    pub default_provider: String,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            validate: true,
            measure_size: true,
            accept_unreachable: false,
            min_width: DEFAULT_MIN_WIDTH,
            default_provider: DEFAULT_PROVIDER_NAME.to_string(),
        }
    }
}

/// Validates candidate images concurrently.
pub struct ImageValidator {
    transport: Arc<dyn TransportPort>,
    telemetry: Arc<dyn TelemetryPort>,
    options: Arc<ValidationOptions>,
}

impl std::fmt::Debug for ImageValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageValidator")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl ImageValidator {
    /// Creates a validator over a (usually cached) transport.
    #[must_use]
    pub fn new(
        transport: Arc<dyn TransportPort>,
        telemetry: Arc<dyn TelemetryPort>,
        options: ValidationOptions,
    ) -> Self {
        Self {
            transport,
            telemetry,
            options: Arc::new(options),
        }
    }

    /// Returns the active options.
    #[must_use]
    pub fn options(&self) -> &ValidationOptions {
        &self.options
    }

    /// Validates candidates and returns only the accepted images.
    pub async fn validate_all(
        &self,
        images: impl IntoIterator<Item = CandidateImage>,
        cancel: &CancellationToken,
    ) -> Vec<ValidatedImage> {
        self.validate(images, cancel).await.validated
    }

    /// Validates candidates and reports both accepted and dropped images.
    ///
    /// Every independent candidate is checked in its own task. One failing
    /// task never affects its siblings, and cancellation keeps the results
    /// that completed before it.
    pub async fn validate(
        &self,
        images: impl IntoIterator<Item = CandidateImage>,
        cancel: &CancellationToken,
    ) -> ValidationReport {
        let plan = ValidationPlan::build(images, &self.options.default_provider);
        if plan.is_empty() {
            return ValidationReport::default();
        }

        let mut tasks = JoinSet::new();
        let mut slots = HashMap::new();

        for (index, candidate) in plan.fetches() {
            let transport = Arc::clone(&self.transport);
            let options = Arc::clone(&self.options);
            let candidate = candidate.clone();
            let cancel = cancel.clone();

            let handle = tasks.spawn(async move {
                check_candidate(transport.as_ref(), &options, &candidate, &cancel).await
            });
            slots.insert(handle.id(), index);
        }

        debug!(
            candidates = plan.len(),
            tasks = slots.len(),
            "Validating images"
        );

        let mut outcomes: HashMap<usize, FetchOutcome> = HashMap::with_capacity(slots.len());

        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((id, outcome)) => {
                    if let Some(&index) = slots.get(&id) {
                        outcomes.insert(index, outcome);
                    }
                }
                Err(e) => {
                    let Some(&index) = slots.get(&e.id()) else {
                        continue;
                    };
                    let url = plan
                        .candidate(index)
                        .map(|c| c.url.to_string())
                        .unwrap_or_default();
                    error!(url = %url, error = %e, "Image validation task failed");
                    self.telemetry.report_failure(&url, &e.to_string());
                    outcomes.insert(
                        index,
                        Err(DropReason::TaskFailed {
                            detail: e.to_string(),
                        }),
                    );
                }
            }
        }

        let report = plan.resolve(outcomes);

        info!(
            validated = report.validated.len(),
            dropped = report.dropped.len(),
            cancelled = cancel.is_cancelled(),
            "Image validation finished"
        );

        report
    }
}

/// Checks one candidate: HEAD for reachability, then GET and header sniffing.
async fn check_candidate(
    transport: &dyn TransportPort,
    options: &ValidationOptions,
    candidate: &CandidateImage,
    cancel: &CancellationToken,
) -> FetchOutcome {
    if !options.validate {
        return Ok(ValidatedImage::unmeasured(candidate));
    }

    if cancel.is_cancelled() {
        return Err(DropReason::Cancelled);
    }

    let head = transport
        .send(
            HttpRequest::from_url(candidate.url.clone())
                .with_method(Method::HEAD)
                .with_cancellation(cancel.clone()),
        )
        .await;

    if !head.is_ok() {
        if cancel.is_cancelled() {
            return Err(DropReason::Cancelled);
        }
        if options.accept_unreachable {
            debug!(url = %candidate.url, "Accepting unreachable image unmeasured");
            return Ok(ValidatedImage::unmeasured(candidate));
        }
        debug!(url = %candidate.url, status = ?head.status(), "Image not reachable");
        return Err(DropReason::Unreachable);
    }

    if !options.measure_size {
        return Ok(ValidatedImage::unmeasured(candidate));
    }

    let body = transport
        .send(HttpRequest::from_url(candidate.url.clone()).with_cancellation(cancel.clone()))
        .await;

    if !body.is_ok() {
        if cancel.is_cancelled() {
            return Err(DropReason::Cancelled);
        }
        debug!(url = %candidate.url, status = ?body.status(), "Image download failed");
        return Err(DropReason::DownloadFailed);
    }

    match image_geometry::sniff(body.bytes()) {
        None => {
            warn!(
                url = %candidate.url,
                len = body.bytes().len(),
                "Unrecognized image format"
            );
            Err(DropReason::UnrecognizedFormat)
        }
        Some(dims) if dims.width <= options.min_width => {
            debug!(url = %candidate.url, size = %dims, "Image below minimum width");
            Err(DropReason::BelowMinWidth { width: dims.width })
        }
        Some(dims) => Ok(ValidatedImage::measured(candidate, dims)),
    }
}
