//! Command-line interface.

use super::app_config::LogLevel;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(
    name = "mediafetch",
    version,
    about = "Fetch media metadata pages and validate candidate images",
    long_about = None
)]
pub struct CliArgs {
    /// Configuration file path.
    #[arg(short, long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH", global = true)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum, global = true)]
    pub log_level: Option<LogLevel>,

    /// Disable the response cache.
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// Cloudflare clearance service base URL.
    #[arg(long, value_name = "URL", env = "MEDIAFETCH_BYPASS_URL", global = true)]
    pub bypass_url: Option<String>,

    /// Accept invalid TLS certificates.
    #[arg(long, global = true)]
    pub insecure: bool,

    /// Whole-request timeout in seconds.
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Send one request and print the response.
    Fetch {
        /// Target URL.
        url: String,

        /// Request method.
        #[arg(short = 'X', long, value_enum, default_value_t = FetchMethod::Get)]
        method: FetchMethod,

        /// Extra header as NAME=VALUE.
        #[arg(short = 'H', long = "header", value_name = "NAME=VALUE")]
        headers: Vec<String>,

        /// Cookie as NAME=VALUE.
        #[arg(short = 'b', long = "cookie", value_name = "NAME=VALUE")]
        cookies: Vec<String>,

        /// Request body.
        #[arg(short, long)]
        data: Option<String>,

        /// Additional status code to treat as success.
        #[arg(long = "accept-status", value_name = "CODE")]
        accept_status: Vec<u16>,

        /// Print only the status line and headers.
        #[arg(long)]
        head_only: bool,
    },

    /// Validate and measure candidate images.
    Validate {
        /// Primary (poster) image URL.
        #[arg(long = "primary", value_name = "URL")]
        primary: Vec<String>,

        /// Backdrop image URL.
        #[arg(long = "backdrop", value_name = "URL")]
        backdrop: Vec<String>,

        /// Provider label attached to every candidate.
        #[arg(long)]
        provider: Option<String>,
    },

    /// Print the format and dimensions of local image files.
    Sniff {
        /// Files to inspect.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

/// Request method for `fetch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FetchMethod {
    /// GET.
    Get,
    /// HEAD.
    Head,
    /// POST.
    Post,
}

impl FetchMethod {
    /// Converts to the HTTP method.
    #[must_use]
    pub fn to_method(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Head => reqwest::Method::HEAD,
            Self::Post => reqwest::Method::POST,
        }
    }
}

/// Splits a `NAME=VALUE` argument.
#[must_use]
pub fn split_pair(raw: &str) -> Option<(&str, &str)> {
    let (name, value) = raw.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name, value.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fetch_command() {
        let args = CliArgs::try_parse_from([
            "mediafetch",
            "--no-cache",
            "fetch",
            "https://example.com",
            "-X",
            "head",
            "-H",
            "Accept=text/html",
        ])
        .unwrap();

        assert!(args.no_cache);
        match args.command {
            Command::Fetch { url, method, headers, .. } => {
                assert_eq!(url, "https://example.com");
                assert_eq!(method, FetchMethod::Head);
                assert_eq!(headers, vec!["Accept=text/html"]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_validate_command() {
        let args = CliArgs::try_parse_from([
            "mediafetch",
            "validate",
            "--primary",
            "https://a.test/p.jpg",
            "--backdrop",
            "https://a.test/p.jpg",
            "--backdrop",
            "https://a.test/b.jpg",
        ])
        .unwrap();

        match args.command {
            Command::Validate { primary, backdrop, .. } => {
                assert_eq!(primary.len(), 1);
                assert_eq!(backdrop.len(), 2);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_split_pair() {
        assert_eq!(split_pair("a=b"), Some(("a", "b")));
        assert_eq!(split_pair("token=x=y"), Some(("token", "x=y")));
        assert_eq!(split_pair("=b"), None);
        assert_eq!(split_pair("novalue"), None);
    }
}
