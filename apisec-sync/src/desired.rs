//! Merge the outputs of every enabled provider into one desired set.

use apisec_core::{DesiredSet, ProviderConfig, ProviderKind};
use apisec_fetchers::FetcherRegistry;

/// How one enabled provider fared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderOutcome {
    pub kind: ProviderKind,
    /// Number of APIs it contributed; zero on failure.
    pub fetched: usize,
    pub error: Option<String>,
}

impl ProviderOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// The merged desired set plus one outcome per enabled provider.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub desired: DesiredSet,
    pub providers: Vec<ProviderOutcome>,
}

impl FetchOutcome {
    pub fn failed_providers(&self) -> usize {
        self.providers.iter().filter(|p| !p.is_success()).count()
    }
}

/// Run every enabled provider in configured order and merge their results.
///
/// A provider that errors, returns nothing, or has no registered fetcher is
/// recorded as failed and the remaining providers still run. On identity
/// collisions the later provider wins.
pub fn collect_desired(providers: &[ProviderConfig], registry: &FetcherRegistry) -> FetchOutcome {
    let mut outcome = FetchOutcome::default();

    for provider in providers {
        if !provider.active {
            tracing::debug!(provider = %provider.kind, "provider is disabled, skipping");
            continue;
        }
        tracing::info!(provider = %provider.kind, "fetching API specifications");

        let result = registry
            .fetch(provider.kind, &provider.settings)
            .map_err(|e| e.to_string())
            .and_then(|set| {
                if set.is_empty() {
                    Err("provider yielded no APIs".to_string())
                } else {
                    Ok(set)
                }
            });

        match result {
            Ok(set) => {
                let fetched = set.len();
                for (identity, spec) in set {
                    if outcome.desired.insert(identity.clone(), spec).is_some() {
                        tracing::warn!(
                            provider = %provider.kind,
                            identity = %identity,
                            "API already fetched from an earlier provider, replacing it"
                        );
                    }
                }
                tracing::info!(provider = %provider.kind, count = fetched, "provider succeeded");
                outcome.providers.push(ProviderOutcome {
                    kind: provider.kind,
                    fetched,
                    error: None,
                });
            }
            Err(message) => {
                tracing::error!(provider = %provider.kind, error = %message, "provider failed");
                outcome.providers.push(ProviderOutcome {
                    kind: provider.kind,
                    fetched: 0,
                    error: Some(message),
                });
            }
        }
    }

    tracing::info!(
        total = outcome.desired.len(),
        failed = outcome.failed_providers(),
        "collected desired API set"
    );
    outcome
}
