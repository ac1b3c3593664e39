//! Application services.

/// Concurrent image validation.
pub mod image_validation;
/// Deduplication and fetch planning.
pub mod validation_plan;

pub use image_validation::{
    DEFAULT_MIN_WIDTH, DEFAULT_PROVIDER_NAME, ImageValidator, ValidationOptions,
};
pub use validation_plan::{ValidationPlan, deduplicate};
