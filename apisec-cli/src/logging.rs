//! Tracing setup and daily rotation of the log file.
//!
//! The log file is `<log_path>/api_security_manager.log`. It is rotated at
//! startup when it was last written on an earlier day, keeping at most
//! [`MAX_ROTATED_FILES`] copies:
//!   api_security_manager.log → .log.1 → .log.2 → … → .log.7

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use apisec_core::LoggingConfig;

pub const LOG_FILE_NAME: &str = "api_security_manager.log";

/// Maximum number of rotated backup files to keep.
pub const MAX_ROTATED_FILES: usize = 7;

/// Install the global subscriber.
///
/// `RUST_LOG` overrides the configured level. Output always goes to stderr,
/// and additionally to the log file when `log_path` is configured.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_directive()));

    let mut rotated = None;
    let file_layer = match &config.log_path {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create log directory {}", dir.display()))?;
            let path = dir.join(LOG_FILE_NAME);
            if rotate_if_stale(&path, Local::now().date_naive(), MAX_ROTATED_FILES)
                .with_context(|| format!("failed to rotate {}", path.display()))?
            {
                rotated = Some(path.clone());
            }
            let file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .with(file_layer)
        .try_init()
        .context("failed to install the log subscriber")?;

    if let Some(path) = rotated {
        tracing::info!(path = %path.display(), "log file rotated");
    }
    Ok(())
}

/// Rotate `log_path` if it was last modified before `today`.
///
/// Rotation sequence (oldest first):
///   `<name>.<max_files>` deleted
///   `<name>.<n>` → `<name>.<n+1>` for n = max_files-1 … 1
///   `<name>` → `<name>.1`
///
/// Returns `true` if rotation occurred. A missing log file is not an error.
pub fn rotate_if_stale(log_path: &Path, today: NaiveDate, max_files: usize) -> io::Result<bool> {
    let modified = match fs::metadata(log_path) {
        Ok(meta) => meta.modified()?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };

    if DateTime::<Local>::from(modified).date_naive() >= today {
        return Ok(false);
    }

    let oldest = numbered_path(log_path, max_files);
    if oldest.exists() {
        fs::remove_file(&oldest)?;
    }

    for n in (1..max_files).rev() {
        let src = numbered_path(log_path, n);
        if src.exists() {
            fs::rename(&src, numbered_path(log_path, n + 1))?;
        }
    }

    fs::rename(log_path, numbered_path(log_path, 1))?;
    Ok(true)
}

/// Path of the `n`-th rotated copy of `base` (e.g. `api_security_manager.log.2`).
fn numbered_path(base: &Path, n: usize) -> PathBuf {
    let name = base
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(LOG_FILE_NAME);
    base.with_file_name(format!("{name}.{n}"))
}
