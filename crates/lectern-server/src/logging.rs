//! Logger construction.
//!
//! The transport runs over stdout, so log output goes to stderr or a
//! file, never stdout. `LOG_OUTPUT` picks the destination explicitly;
//! unset, containerized environments get stderr and local runs get the
//! default log file.

use std::path::PathBuf;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber. Returns the writer guard
/// when logging to a file; dropping it flushes buffered output.
pub fn init() -> anyhow::Result<Option<WorkerGuard>> {
    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let filter = EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("info"));

    let output = std::env::var("LOG_OUTPUT").unwrap_or_default();
    let output = if output.is_empty() {
        detect_environment()
    } else {
        output
    };

    match output.as_str() {
        "stderr" => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            Ok(None)
        }
        "file" => {
            let path = log_file_path()?;
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Ok(Some(guard))
        }
        other => anyhow::bail!("invalid LOG_OUTPUT: {other} (expected 'file' or 'stderr')"),
    }
}

fn log_file_path() -> anyhow::Result<PathBuf> {
    if let Ok(path) = std::env::var("LOG_FILE_PATH") {
        if !path.is_empty() {
            return Ok(PathBuf::from(path));
        }
    }
    let home = dirs::home_dir().context("failed to resolve home directory")?;
    Ok(home.join(".academic-mcp").join("academic.log"))
}

/// Containers log to stderr; local development defaults to a file so the
/// stdio transport stays quiet.
fn detect_environment() -> String {
    if std::path::Path::new("/.dockerenv").exists() {
        return "stderr".to_string();
    }
    if std::env::var("KUBERNETES_SERVICE_HOST").is_ok_and(|v| !v.is_empty()) {
        return "stderr".to_string();
    }
    "file".to_string()
}
