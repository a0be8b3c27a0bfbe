mod backend;
mod errors;
mod measurements;
mod monitor;
mod results;

use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use clap::Parser;
use clap_verbosity_flag::{Verbosity, WarnLevel};
use log::{error, info, LevelFilter};
use url::Url;

use crate::backend::client::BASE_URL;
use crate::backend::cloudflare::{
    DEFAULT_DOWNLOAD_BYTES, DEFAULT_UPLOAD_BYTES, MAX_TRANSFER_BYTES,
};
use crate::backend::{BackendConfig, CloudflareBackend};
use crate::errors::{exit_codes, format_error_for_display, MeasurementError};
use crate::monitor::headless::{print_summary, run_once};
use crate::monitor::runner::{DEFAULT_ANIMATION_STEPS, MAX_ANIMATION_STEPS};
use crate::monitor::{
    DisplayMode, MonitorController, ProgressStyle, Runner, RunnerConfig,
};

/// Version string, with the git revision appended when it was known at
/// build time.
static VERSION: LazyLock<String> = LazyLock::new(|| {
    match option_env!("SPEED_MONITOR_BUILD_GIT_HASH") {
        Some(hash) => format!("{} (rev {})", env!("CARGO_PKG_VERSION"), hash),
        None => env!("CARGO_PKG_VERSION").to_string(),
    }
});

#[derive(Parser, Debug)]
#[command(author, version = VERSION.as_str(), about, long_about = None)]
struct Cli {
    #[command(flatten)]
    verbosity: Verbosity<WarnLevel>,

    /// Run a single test without the window and print the result as JSON
    #[arg(long)]
    json: bool,

    /// Run a single test without the window and print plain results
    #[arg(long)]
    headless: bool,

    /// How the progress bar advances during a test
    #[arg(long, value_enum, default_value_t = ProgressStyle::Animated)]
    progress: ProgressStyle,

    /// Seconds each phase's progress animation lasts
    #[arg(
        long,
        value_name = "SECS",
        default_value = "15",
        value_parser = parse_seconds
    )]
    animation_secs: Duration,

    /// Steps in each phase's progress animation
    #[arg(
        long,
        value_name = "N",
        default_value_t = DEFAULT_ANIMATION_STEPS,
        value_parser = clap::value_parser!(u32).range(0..=MAX_ANIMATION_STEPS as i64)
    )]
    animation_steps: u32,

    /// Bytes to fetch during the download phase
    #[arg(
        long,
        value_name = "BYTES",
        default_value_t = DEFAULT_DOWNLOAD_BYTES,
        value_parser = clap::value_parser!(u64).range(1..=MAX_TRANSFER_BYTES)
    )]
    download_bytes: u64,

    /// Bytes to send during the upload phase
    #[arg(
        long,
        value_name = "BYTES",
        default_value_t = DEFAULT_UPLOAD_BYTES,
        value_parser = clap::value_parser!(u64).range(1..=MAX_TRANSFER_BYTES)
    )]
    upload_bytes: u64,

    /// Base URL of the speed test server
    #[arg(
        long,
        value_name = "URL",
        default_value = BASE_URL,
        value_parser = parse_server_url
    )]
    server: Url,

    /// Milliseconds between window refreshes
    #[arg(
        long,
        value_name = "MS",
        default_value_t = 50,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    tick_ms: u64,

    /// Write logs to this file instead of stderr. While the window is on
    /// the same terminal as stderr, logs default to speed-monitor.log in the
    /// temporary directory.
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

fn parse_seconds(value: &str) -> Result<Duration, String> {
    let seconds: f64 =
        value.parse().map_err(|_| format!("`{}` is not a number", value))?;

    if !seconds.is_finite() || seconds < 0.0 {
        return Err(format!("`{}` is not a non-negative duration", value));
    }

    Duration::try_from_secs_f64(seconds)
        .map_err(|e| format!("`{}` is out of range: {}", value, e))
}

fn parse_server_url(value: &str) -> Result<Url, String> {
    let url = Url::parse(value).map_err(|e| format!("invalid URL: {}", e))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(format!("unsupported scheme `{}`", scheme)),
    }
}

/// Default log file while the window shares its terminal with stderr.
fn default_log_path() -> PathBuf {
    std::env::temp_dir().join("speed-monitor.log")
}

/// Where logs go: the explicit `--log-file`, the default log file when
/// stderr would draw over the window, or stderr (`None`).
fn log_path(
    log_file: Option<&Path>,
    mode: DisplayMode,
    stderr_is_terminal: bool,
) -> Option<PathBuf> {
    match log_file {
        Some(path) => Some(path.to_path_buf()),
        None if mode == DisplayMode::Tui && stderr_is_terminal => {
            Some(default_log_path())
        }
        None => None,
    }
}

/// Set up env_logger at the requested verbosity, honouring `RUST_LOG`.
///
/// An unusable `--log-file` is a configuration error. If the default log
/// file cannot be opened, logging is switched off rather than drawn over
/// the window.
fn init_logging(cli: &Cli, mode: DisplayMode) -> Result<(), MeasurementError> {
    let mut builder = env_logger::Builder::new();
    builder.format_timestamp_millis();

    let stderr_is_terminal = std::io::stderr().is_terminal();
    if let Some(path) = log_path(cli.log_file.as_deref(), mode, stderr_is_terminal) {
        match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(e) if cli.log_file.is_some() => {
                return Err(MeasurementError::config(format!(
                    "cannot open log file {}: {}",
                    path.display(),
                    e
                ))
                .with_suggestion(
                    "Check that the directory exists and is writable.",
                ));
            }
            Err(_) => {
                builder.filter_level(LevelFilter::Off).init();
                return Ok(());
            }
        }
    }

    builder
        .filter_level(cli.verbosity.log_level_filter())
        .parse_default_env()
        .init();

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let interactive = std::io::stdout().is_terminal() && !cli.headless;
    let mode = DisplayMode::detect(cli.json, interactive);

    if let Err(e) = init_logging(&cli, mode) {
        eprintln!(
            "{}",
            format_error_for_display(&e.message, e.suggestion.as_deref())
        );
        process::exit(e.exit_code());
    }

    process::exit(run(cli, mode).await);
}

async fn run(cli: Cli, mode: DisplayMode) -> i32 {
    info!("speed-monitor {} using {}", VERSION.as_str(), cli.server);

    let backend = Arc::new(CloudflareBackend::new(BackendConfig {
        base_url: cli.server,
        download_bytes: cli.download_bytes,
        upload_bytes: cli.upload_bytes,
    }));

    // Nobody watches a progress bar in headless output.
    let style = if mode.is_headless() {
        ProgressStyle::Stepped
    } else {
        cli.progress
    };
    let runner = Runner::new(RunnerConfig {
        style,
        animation_duration: cli.animation_secs,
        animation_steps: cli.animation_steps,
    });

    match mode {
        DisplayMode::Tui => {
            run_monitor(backend, runner, Duration::from_millis(cli.tick_ms))
        }
        DisplayMode::Plain | DisplayMode::Json => {
            run_headless(backend, runner, mode).await
        }
    }
}

fn run_monitor(
    backend: Arc<CloudflareBackend>,
    runner: Runner,
    tick: Duration,
) -> i32 {
    let mut controller = MonitorController::new();

    if let Err(e) = controller.init() {
        let _ = controller.cleanup();
        eprintln!(
            "{}",
            format_error_for_display(
                &format!("failed to set up the terminal: {}", e),
                Some("Use --headless when no interactive terminal is available."),
            )
        );
        return exit_codes::TERMINAL_ERROR;
    }

    let result = controller.run(backend, runner, tick);

    if let Err(e) = controller.cleanup() {
        error!("Failed to restore the terminal: {}", e);
    }

    match result {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            eprintln!("{}", format_error_for_display(&e.to_string(), None));
            exit_codes::TERMINAL_ERROR
        }
    }
}

async fn run_headless(
    backend: Arc<CloudflareBackend>,
    runner: Runner,
    mode: DisplayMode,
) -> i32 {
    tokio::select! {
        summary = run_once(backend, runner, mode) => {
            if mode == DisplayMode::Json {
                if let Err(e) = print_summary(&summary) {
                    error!("Failed to serialize results: {}", e);
                    return exit_codes::UNKNOWN_ERROR;
                }
            }
            summary.exit_code()
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
            exit_codes::INTERRUPTED
        }
    }
}
