//! apisec core library: domain types, identity, configuration, errors.
//!
//! Public API surface:
//! - [`types`]: [`ApiIdentity`], [`ApiSpec`], inventory and desired-set maps
//! - [`config`]: [`Config`] loading and validation
//! - [`service`]: the [`ManagementService`] capability
//! - [`error`]: [`ConfigError`], [`IdentityError`], [`ServiceError`]

pub mod config;
pub mod error;
pub mod service;
pub mod types;

pub use config::{Config, LogLevel, LoggingConfig, ProviderConfig, ProviderKind, Settings};
pub use error::{ConfigError, IdentityError, ServiceError};
pub use service::ManagementService;
pub use types::{
    collect_specs, identity, ApiIdentity, ApiSpec, DesiredSet, ExistingInventory, RemoteId,
};
