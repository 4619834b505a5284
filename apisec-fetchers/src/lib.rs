//! Source providers for the desired set of API specifications.
//!
//! Each [`ProviderKind`] maps to one [`Fetcher`] through a static
//! [`FetcherRegistry`]. A fetcher turns its provider's opaque settings into a
//! [`DesiredSet`] or fails as a whole; individual documents without a usable
//! identity are dropped inside the fetcher.
//!
//! | Kind                | Source                                        |
//! |---------------------|-----------------------------------------------|
//! | `FileSystemFetcher` | JSON / YAML files in a local directory        |
//! | `ThreeScaleFetcher` | 3scale active docs                            |
//! | `AzureFetcher`      | Azure API Management swagger exports          |
//! | `AwsApiGwFetcher`   | AWS API Gateway stage exports                 |

pub mod aws;
pub mod azure;
pub mod error;
pub mod filesystem;
mod http;
mod settings;
pub mod three_scale;

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use apisec_core::{DesiredSet, ProviderKind, Settings};

pub use aws::AwsApiGatewayFetcher;
pub use azure::AzureFetcher;
pub use error::FetchError;
pub use filesystem::FileSystemFetcher;
pub use three_scale::ThreeScaleFetcher;

/// The fetch capability of one provider kind.
pub trait Fetcher {
    fn fetch(&self, settings: &Settings) -> Result<DesiredSet, FetchError>;
}

/// Static mapping from provider kind to fetcher.
///
/// Kinds are resolved through explicit registration; a kind nobody registered
/// fails with [`FetchError::NotRegistered`] at fetch time.
#[derive(Default)]
pub struct FetcherRegistry {
    fetchers: HashMap<ProviderKind, Box<dyn Fetcher>>,
}

impl FetcherRegistry {
    /// A registry with nothing registered.
    pub fn empty() -> Self {
        Self::default()
    }

    /// All shipped fetchers, using `timeout` for every remote call.
    pub fn builtin(timeout: Duration) -> Self {
        let mut registry = Self::empty();
        registry
            .register(ProviderKind::FileSystem, FileSystemFetcher)
            .register(ProviderKind::ThreeScale, ThreeScaleFetcher::new(timeout))
            .register(ProviderKind::Azure, AzureFetcher::new(timeout))
            .register(ProviderKind::AwsApiGateway, AwsApiGatewayFetcher::new(timeout));
        registry
    }

    /// Register `fetcher` for `kind`, replacing any previous registration.
    pub fn register(&mut self, kind: ProviderKind, fetcher: impl Fetcher + 'static) -> &mut Self {
        self.fetchers.insert(kind, Box::new(fetcher));
        self
    }

    pub fn get(&self, kind: ProviderKind) -> Option<&dyn Fetcher> {
        self.fetchers.get(&kind).map(|f| f.as_ref())
    }

    /// Resolve the fetcher for `kind` and run it.
    pub fn fetch(&self, kind: ProviderKind, settings: &Settings) -> Result<DesiredSet, FetchError> {
        self.get(kind)
            .ok_or(FetchError::NotRegistered(kind))?
            .fetch(settings)
    }

    /// Registered kinds, sorted.
    pub fn kinds(&self) -> Vec<ProviderKind> {
        let mut kinds: Vec<_> = self.fetchers.keys().copied().collect();
        kinds.sort();
        kinds
    }
}

impl fmt::Debug for FetcherRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetcherRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}
