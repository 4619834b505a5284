//! Error types for apisec-sync.

use std::path::PathBuf;

use thiserror::Error;

use apisec_core::ServiceError;

use crate::status::RunReport;

/// Preconditions whose failure aborts a run.
#[derive(Debug, Error)]
pub enum RunError {
    /// The current inventory could not be read; nothing was fetched or changed.
    #[error("failed to read the existing APIs: {0}")]
    Inventory(#[source] ServiceError),

    /// No provider produced a single API, so no deletion can be trusted.
    ///
    /// Carries the finalized report so the provider errors stay visible.
    #[error("no API specifications were fetched; refusing to reconcile")]
    NothingFetched(Box<RunReport>),
}

/// Failure to persist the run report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("report JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience constructor for [`ReportError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ReportError {
    ReportError::Io {
        path: path.into(),
        source,
    }
}
