//! Application configuration.

/// Configuration model.
pub mod app_config;
/// Command-line arguments.
pub mod args;
/// Configuration file storage.
pub mod storage;

pub use app_config::{
    AppConfig, CacheConfig, HttpConfig, ImagesConfig, LogLevel, ProxyConfig, TelemetryConfig,
};
pub use args::{CliArgs, Command, FetchMethod};
pub use storage::{ConfigError, StorageManager};
