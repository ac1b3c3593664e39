//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::application::services::{DEFAULT_MIN_WIDTH, DEFAULT_PROVIDER_NAME, ValidationOptions};

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configuration file path.
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[serde(default)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// HTTP transport configuration.
    #[serde(default)]
    pub http: HttpConfig,

    /// Response cache configuration.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Image validation configuration.
    #[serde(default)]
    pub images: ImagesConfig,

    /// Failure reporting configuration.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// HTTP transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Whole-request timeout in seconds, body read included.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Base URL of a FlareSolverr-compatible clearance service.
    #[serde(default)]
    pub cloudflare_bypass_url: Option<String>,

    /// Accept any TLS certificate.
    #[serde(default)]
    pub disable_tls_verification: bool,

    /// Endpoint whose responses must never be served from cache.
    #[serde(default)]
    pub update_check_url: Option<String>,

    /// SOCKS5 proxy.
    #[serde(default)]
    pub proxy: ProxyConfig,
}

impl HttpConfig {
    /// Returns the whole-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Returns the bypass URL when one is configured.
    #[must_use]
    pub fn bypass_url(&self) -> Option<&str> {
        self.cloudflare_bypass_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            cloudflare_bypass_url: None,
            disable_tls_verification: false,
            update_check_url: None,
            proxy: ProxyConfig::default(),
        }
    }
}

/// SOCKS5 proxy configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Route traffic through the proxy.
    #[serde(default)]
    pub enabled: bool,

    /// Proxy host.
    #[serde(default)]
    pub host: String,

    /// Proxy port.
    #[serde(default)]
    pub port: u16,

    /// Optional login.
    #[serde(default)]
    pub login: Option<String>,

    /// Optional password.
    #[serde(default)]
    pub password: Option<String>,
}

impl ProxyConfig {
    /// Returns true when the proxy is enabled and has a host and port.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.enabled && !self.host.trim().is_empty() && self.port > 0
    }

    /// Returns login and password when both are set.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.login.as_deref(), self.password.as_deref()) {
            (Some(login), Some(password)) if !login.is_empty() && !password.is_empty() => {
                Some((login, password))
            }
            _ => None,
        }
    }
}

/// Response cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Bypass the cache entirely.
    #[serde(default)]
    pub disabled: bool,

    /// Age below which an entry is served without a network call.
    #[serde(default = "default_fresh_ttl_secs")]
    pub fresh_ttl_secs: u64,

    /// Extra age during which a stale entry is served while it refreshes.
    #[serde(default = "default_stale_grace_secs")]
    pub stale_grace_secs: u64,

    /// Lower bound for the fresh window.
    #[serde(default = "default_min_ttl_secs")]
    pub min_ttl_secs: u64,

    /// Maximum number of cached responses.
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
}

impl CacheConfig {
    /// Fresh window, never shorter than the floor.
    #[must_use]
    pub fn fresh_ttl(&self) -> Duration {
        Duration::from_secs(self.fresh_ttl_secs.max(self.min_ttl_secs))
    }

    /// Stale grace window.
    #[must_use]
    pub const fn stale_grace(&self) -> Duration {
        Duration::from_secs(self.stale_grace_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            disabled: false,
            fresh_ttl_secs: default_fresh_ttl_secs(),
            stale_grace_secs: default_stale_grace_secs(),
            min_ttl_secs: default_min_ttl_secs(),
            capacity: default_cache_capacity(),
        }
    }
}

/// Image validation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagesConfig {
    /// Skip network validation, accept every candidate.
    #[serde(default)]
    pub disable_validation: bool,

    /// Skip downloading and measuring.
    #[serde(default)]
    pub disable_size_check: bool,

    /// Accept candidates whose HEAD request fails.
    #[serde(default)]
    pub accept_unreachable: bool,

    /// Images must be strictly wider than this.
    #[serde(default = "default_min_width")]
    pub min_width: u32,

    /// Provider label for candidates without one.
    #[serde(default = "default_provider_name")]
    pub provider_name: String,
}

impl ImagesConfig {
    /// Converts to validation options.
    #[must_use]
    pub fn to_options(&self) -> ValidationOptions {
        ValidationOptions {
            validate: !self.disable_validation,
            measure_size: !self.disable_size_check,
            accept_unreachable: self.accept_unreachable,
            min_width: self.min_width,
            default_provider: self.provider_name.clone(),
        }
    }
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            disable_validation: false,
            disable_size_check: false,
            accept_unreachable: false,
            min_width: default_min_width(),
            provider_name: default_provider_name(),
        }
    }
}

/// Failure reporting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Report failures at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Endpoint receiving JSON failure reports.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Reports buffered before new ones are dropped.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: None,
            queue_capacity: default_queue_capacity(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_fresh_ttl_secs() -> u64 {
    60
}

fn default_stale_grace_secs() -> u64 {
    10
}

fn default_min_ttl_secs() -> u64 {
    5
}

fn default_cache_capacity() -> usize {
    256
}

fn default_min_width() -> u32 {
    DEFAULT_MIN_WIDTH
}

fn default_provider_name() -> String {
    DEFAULT_PROVIDER_NAME.to_string()
}

fn default_queue_capacity() -> usize {
    64
}

use super::args::CliArgs;

impl AppConfig {
    /// Merges CLI arguments into the configuration.
    pub fn merge_with_args(&mut self, args: &CliArgs) {
        if let Some(config_path) = &args.config {
            self.config = Some(config_path.clone());
        }
        if let Some(log_path) = &args.log_path {
            self.log_path = Some(log_path.clone());
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if args.no_cache {
            self.cache.disabled = true;
        }
        if let Some(bypass_url) = &args.bypass_url {
            self.http.cloudflare_bypass_url = Some(bypass_url.clone());
        }
        if args.insecure {
            self.http.disable_tls_verification = true;
        }
        if let Some(timeout) = args.timeout {
            self.http.timeout_secs = timeout;
        }
    }
}
