//! Data transfer objects.

mod validation_dto;

pub use validation_dto::{DropReason, DroppedImage, ValidationReport};
