use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, eyre};
use reqwest::StatusCode;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use mediafetch::application::ImageValidator;
use mediafetch::domain::entities::{CandidateImage, HttpRequest, ImageRole, RequestBody};
use mediafetch::domain::ports::{TelemetryPort, TransportPort};
use mediafetch::domain::services::{detect_format, sniff};
use mediafetch::infrastructure::config::FetchMethod;
use mediafetch::infrastructure::config::args::split_pair;
use mediafetch::infrastructure::{
    AppConfig, CliArgs, Command, ResponseCache, StorageManager, build_telemetry, build_transport,
};

const TELEMETRY_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = &config.log_path {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .init();
    }

    Ok(())
}

fn load_config(args: &CliArgs) -> Result<AppConfig> {
    let storage = StorageManager::new()?;
    let mut config = storage
        .load_config(args.config.as_deref())
        .wrap_err("failed to load configuration")?;
    config.merge_with_args(args);
    Ok(config)
}

fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            signal_cancel.cancel();
        }
    });

    cancel
}

struct FetchArgs {
    url: String,
    method: FetchMethod,
    headers: Vec<String>,
    cookies: Vec<String>,
    data: Option<String>,
    accept_status: Vec<u16>,
    head_only: bool,
}

fn build_request(args: &FetchArgs, cancel: &CancellationToken) -> Result<HttpRequest> {
    let mut request = HttpRequest::new(&args.url)?
        .with_method(args.method.to_method())
        .with_cancellation(cancel.clone());

    for raw in &args.headers {
        let (name, value) =
            split_pair(raw).ok_or_else(|| eyre!("invalid header {raw:?}, expected NAME=VALUE"))?;
        request = request.with_header(name, value);
    }

    for raw in &args.cookies {
        let (name, value) =
            split_pair(raw).ok_or_else(|| eyre!("invalid cookie {raw:?}, expected NAME=VALUE"))?;
        request = request.with_cookie(name, value);
    }

    if let Some(data) = &args.data {
        request = request.with_body(RequestBody::Text {
            content: data.clone(),
            content_type: None,
        });
    }

    for code in &args.accept_status {
        let status = StatusCode::from_u16(*code)
            .wrap_err_with(|| format!("invalid status code {code}"))?;
        request = request.with_success_status(status);
    }

    Ok(request)
}

async fn run_fetch(
    transport: &dyn TransportPort,
    args: &FetchArgs,
    cancel: &CancellationToken,
) -> Result<()> {
    let request = build_request(args, cancel)?;
    let envelope = transport.send(request).await;

    let Some(status) = envelope.status() else {
        if cancel.is_cancelled() {
            return Err(eyre!("request to {} cancelled", args.url));
        }
        return Err(eyre!("request to {} failed", args.url));
    };

    if let Some(url) = envelope.response_url() {
        println!("{status} {url}");
    } else {
        println!("{status}");
    }
    for (name, value) in envelope.headers() {
        println!("{name}: {}", String::from_utf8_lossy(value.as_bytes()));
    }
    for cookie in envelope.cookies() {
        println!("cookie: {}={}", cookie.name, cookie.value);
    }

    if !args.head_only {
        println!();
        println!("{}", envelope.content());
    }

    if envelope.is_ok() {
        Ok(())
    } else {
        Err(eyre!("{} answered {status}", args.url))
    }
}

async fn run_validate(
    validator: &ImageValidator,
    primary: &[String],
    backdrop: &[String],
    provider: Option<&str>,
    cancel: &CancellationToken,
) -> Result<()> {
    let mut candidates = Vec::with_capacity(primary.len() + backdrop.len());
    let roles = primary
        .iter()
        .map(|url| (url, ImageRole::Primary))
        .chain(backdrop.iter().map(|url| (url, ImageRole::Backdrop)));

    for (url, role) in roles {
        let mut candidate = CandidateImage::new(url, role)?;
        if let Some(provider) = provider {
            candidate = candidate.with_provider(provider);
        }
        candidates.push(candidate);
    }

    let report = validator.validate(candidates, cancel).await;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

async fn run_sniff(files: &[PathBuf]) -> Result<()> {
    for path in files {
        let bytes = tokio::fs::read(path)
            .await
            .wrap_err_with(|| format!("failed to read {}", path.display()))?;

        match (detect_format(&bytes), sniff(&bytes)) {
            (Some(format), Some(dimensions)) => {
                println!("{}: {format} {dimensions}", path.display());
            }
            _ => println!("{}: unrecognized", path.display()),
        }
    }

    Ok(())
}

async fn run(args: CliArgs, config: &AppConfig) -> Result<()> {
    if let Command::Sniff { files } = &args.command {
        return run_sniff(files).await;
    }

    let cancel = cancel_on_ctrl_c();
    let (telemetry, telemetry_worker) = build_telemetry(&config.telemetry);
    let cache: Arc<ResponseCache> = build_transport(config, Arc::clone(&telemetry))?;
    let transport: Arc<dyn TransportPort> = cache.clone();

    let result = match args.command {
        Command::Fetch {
            url,
            method,
            headers,
            cookies,
            data,
            accept_status,
            head_only,
        } => {
            let fetch = FetchArgs {
                url,
                method,
                headers,
                cookies,
                data,
                accept_status,
                head_only,
            };
            run_fetch(transport.as_ref(), &fetch, &cancel).await
        }
        Command::Validate {
            primary,
            backdrop,
            provider,
        } => {
            let validator = ImageValidator::new(
                Arc::clone(&transport),
                Arc::clone(&telemetry),
                config.images.to_options(),
            );
            run_validate(&validator, &primary, &backdrop, provider.as_deref(), &cancel).await
        }
        Command::Sniff { .. } => Ok(()),
    };

    debug!(stats = %cache.stats(), "Response cache");

    drop(transport);
    drop(cache);
    flush_telemetry(telemetry, telemetry_worker).await;

    result
}

async fn flush_telemetry(
    telemetry: Arc<dyn TelemetryPort>,
    worker: Option<tokio::task::JoinHandle<()>>,
) {
    drop(telemetry);
    if let Some(worker) = worker
        && tokio::time::timeout(TELEMETRY_FLUSH_TIMEOUT, worker).await.is_err()
    {
        warn!("Telemetry worker did not finish in time");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = CliArgs::parse();
    let config = load_config(&args)?;

    init_logging(&config)?;

    info!(version = mediafetch::VERSION, "Starting {}", mediafetch::NAME);

    run(args, &config).await
}
