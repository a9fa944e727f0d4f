//! Tracing subscriber setup.
//!
//! Logs go to stderr so command output on stdout stays clean. When a log
//! directory is configured, a daily-rolled file is written as well.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingSection;

pub const LOG_FILE_PREFIX: &str = "taskboard.log";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Filter directive in effect: `RUST_LOG` wins, then `--verbose`, then the
/// configured level.
pub fn filter_directive(settings: &LoggingSection, verbose: bool, rust_log: Option<&str>) -> String {
    match rust_log {
        Some(directive) if !directive.trim().is_empty() => directive.to_string(),
        _ if verbose => "debug".to_string(),
        _ => settings.level.clone(),
    }
}

/// Install the global subscriber. Keep the returned guard alive for the
/// life of the process or buffered file output is lost.
pub fn init_tracing(
    settings: &LoggingSection,
    log_dir: Option<&Path>,
    verbose: bool,
) -> Result<Option<WorkerGuard>> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let directive = filter_directive(settings, verbose, rust_log.as_deref());
    let filter = EnvFilter::try_new(&directive)
        .with_context(|| format!("Invalid log filter '{}'", directive))?;

    let mut layers: Vec<BoxedLayer> = Vec::new();
    let stderr = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);
    if settings.json {
        layers.push(stderr.json().boxed());
    } else {
        layers.push(stderr.boxed());
    }

    let mut guard = None;
    if let Some(dir) = log_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
        let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
        let (writer, worker_guard) = tracing_appender::non_blocking(appender);
        let file = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false);
        if settings.json {
            layers.push(file.json().boxed());
        } else {
            layers.push(file.boxed());
        }
        guard = Some(worker_guard);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .context("Failed to install tracing subscriber")?;
    Ok(guard)
}
