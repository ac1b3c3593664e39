//! Application layer with image validation services and DTOs.

/// Data transfer objects.
pub mod dto;
/// Application services.
pub mod services;

pub use dto::{DropReason, DroppedImage, ValidationReport};
pub use services::{ImageValidator, ValidationOptions};
