//! Domain entity definitions.

mod http;
mod image;

pub use http::{HttpRequest, RequestBody, ResponseCookie, ResponseEnvelope, parse_http_url};
pub use image::{CandidateImage, Dimensions, ImageRole, ValidatedImage};
