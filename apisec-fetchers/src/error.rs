//! Error types for apisec-fetchers.

use std::path::PathBuf;

use thiserror::Error;

use apisec_core::ProviderKind;

/// Why a provider could not produce its API specifications.
#[derive(Debug, Error)]
pub enum FetchError {
    /// No fetcher was registered for the configured provider kind.
    #[error("no fetcher registered for {0}")]
    NotRegistered(ProviderKind),

    /// A required setting is absent, not a string, or empty.
    #[error("missing required setting '{setting}'")]
    MissingSetting { setting: &'static str },

    /// The configured specification directory does not exist.
    #[error("specification directory not found at {path}")]
    NotFound { path: PathBuf },

    /// I/O failure while scanning the specification directory.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Connection failure, TLS failure, or timeout.
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// The provider answered with a non-success status.
    #[error("HTTP {code} from {url}: {body}")]
    Status { url: String, code: u16, body: String },

    /// The provider answered, but the body could not be decoded.
    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },

    /// Any failure reported by the AWS SDK.
    #[error("AWS API Gateway error: {0}")]
    Aws(String),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> FetchError {
    FetchError::Io {
        path: path.into(),
        source,
    }
}
