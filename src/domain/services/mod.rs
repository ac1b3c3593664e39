//! Pure domain services.

/// Image header geometry.
pub mod image_geometry;

pub use image_geometry::{ImageFormat, detect_format, sniff};
