//! Mediafetch - cached HTTP transport and image validation for metadata scrapers.
//!
//! This crate provides the network layer a media metadata provider builds on:
//! a cookie-aware transport with optional proxy and Cloudflare clearance, an
//! in-memory response cache, and concurrent validation and measurement of
//! candidate poster and backdrop images.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing use cases and DTOs.
pub mod application;
/// Domain layer containing entities, errors, ports and pure services.
pub mod domain;
/// Infrastructure layer containing adapters for external services.
pub mod infrastructure;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "mediafetch";
