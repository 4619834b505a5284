//! Error types for apisec-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while loading or validating the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file did not exist at the expected path.
    #[error("configuration not found at {path}")]
    NotFound { path: PathBuf },

    /// Underlying I/O failure while reading the configuration file.
    #[error("failed to read configuration at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON parse error: `origin` is the file path or `inline configuration`.
    #[error("failed to parse {origin}: {source}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    /// YAML parse error for `.yaml` / `.yml` configuration files.
    #[error("failed to parse {origin}: {source}")]
    Yaml {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// A required field is absent or empty.
    #[error("configuration field '{field}' is required and must not be empty")]
    Missing { field: &'static str },

    /// A field is present but its value is unusable.
    #[error("configuration field '{field}' is invalid: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Why an identity could not be derived from a specification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// The document is not a mapping (e.g. a YAML scalar or a JSON array).
    #[error("specification is not an object")]
    NotAnObject,

    /// `host` or `basePath` is absent, not a string, or empty.
    #[error("specification has no usable '{field}' field")]
    MissingField { field: &'static str },
}

/// Failure of a single management-service call.
///
/// Carries one of the three kinds the reconciler distinguishes; all of them are
/// recorded the same way, the kind is kept for logging.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// Connection failure, TLS failure, or timeout.
    #[error("network error: {0}")]
    Network(String),

    /// The service answered with a non-success status.
    #[error("HTTP {code}: {body}")]
    Status { code: u16, body: String },

    /// The service answered, but the body could not be understood.
    #[error("malformed response: {0}")]
    Malformed(String),
}
