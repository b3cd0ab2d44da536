//! Logging system initialization
//!
//! Uses the tracing ecosystem for structured logging with support for:
//! - Environment variable override (CODE4CARE_LOG)
//! - Pretty, compact or JSON console output
//! - Optional file output with daily rotation

use crate::config::LoggingConfig;
use crate::error::{Code4CareError, Result};
use std::path::PathBuf;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan, time::SystemTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

/// Environment variable that overrides the configured filter
pub const LOG_ENV_VAR: &str = "CODE4CARE_LOG";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
    Compact,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            "compact" => LogFormat::Compact,
            _ => LogFormat::Pretty,
        }
    }
}

/// Parse log level from string
pub fn parse_level(s: &str) -> Level {
    match s.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Get the default log directory path
fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("code4care")
        .join("logs")
}

/// Resolve the configured log directory, expanding `~`
fn log_dir(config: &LoggingConfig) -> PathBuf {
    config
        .file_path
        .as_deref()
        .map(|p| PathBuf::from(shellexpand::tilde(p).into_owned()))
        .unwrap_or_else(default_log_dir)
}

fn default_filter(config: &LoggingConfig) -> String {
    let level = parse_level(&config.level).as_str().to_lowercase();
    format!("code4care={level}")
}

fn console_layer(config: &LoggingConfig) -> BoxedLayer {
    match LogFormat::parse(&config.format) {
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_target(true)
                .with_level(true)
                .with_file(config.file_line)
                .with_line_number(config.file_line)
                .with_current_span(true);
            if config.timestamps {
                layer.with_timer(SystemTime).boxed()
            } else {
                layer.without_time().boxed()
            }
        }
        LogFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_target(true)
                .with_level(true)
                .with_file(config.file_line)
                .with_line_number(config.file_line)
                .with_ansi(true);
            if config.timestamps {
                layer.with_timer(SystemTime).boxed()
            } else {
                layer.without_time().boxed()
            }
        }
        LogFormat::Pretty => {
            let layer = fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_file(config.file_line)
                .with_line_number(config.file_line)
                .with_ansi(true);
            if config.timestamps {
                layer.with_timer(SystemTime).boxed()
            } else {
                layer.without_time().boxed()
            }
        }
    }
}

/// Initialize the logging system.
///
/// Returns the file writer guard when file output is enabled; keep it alive
/// for as long as logs should be flushed to disk.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(default_filter(config)));

    let mut layers: Vec<BoxedLayer> = vec![console_layer(config)];
    let mut guard = None;

    if config.file_output {
        let dir = log_dir(config);
        std::fs::create_dir_all(&dir)?;

        let appender = tracing_appender::rolling::daily(&dir, "code4care.log");
        let (writer, file_guard) = tracing_appender::non_blocking(appender);
        layers.push(
            fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false)
                .with_span_events(FmtSpan::CLOSE)
                .boxed(),
        );
        guard = Some(file_guard);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()
        .map_err(|e| Code4CareError::Logging(e.to_string()))?;

    tracing::info!(
        target: "code4care::init",
        level = %config.level,
        format = %config.format,
        file_output = config.file_output,
        "Logging initialized"
    );

    Ok(guard)
}
