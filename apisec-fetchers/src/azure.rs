//! Azure API Management.
//!
//! Three requests per API: the service's API list, the swagger export link of
//! each API, then the swagger document behind that link. A failure on one API
//! is logged and the remaining APIs are still exported; only a failing list
//! call fails the provider.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use apisec_core::{collect_specs, ApiSpec, DesiredSet, ProviderKind, Settings};

use crate::error::FetchError;
use crate::http;
use crate::settings::{optional, required};
use crate::Fetcher;

const API_VERSION: &str = "2018-06-01-preview";

#[derive(Debug, Deserialize)]
struct ApiList {
    #[serde(default)]
    value: Vec<ApiEntry>,
}

#[derive(Debug, Deserialize)]
struct ApiEntry {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ExportLink {
    link: String,
}

#[derive(Debug)]
pub struct AzureFetcher {
    agent: ureq::Agent,
}

impl AzureFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: http::agent(timeout),
        }
    }

    fn export_spec(&self, service_url: &str, token: &str, api: &ApiEntry) -> Result<ApiSpec, FetchError> {
        let export: ExportLink = http::get_json(
            self.agent
                .get(&format!("{service_url}/apis/{}", api.name))
                .set("Authorization", token)
                .query("format", "swagger-link")
                .query("export", "true")
                .query("api-version", API_VERSION),
        )?;
        tracing::debug!(api = %api.id, link = %export.link, "downloading swagger export");
        let document: Value = http::get_json(self.agent.get(&export.link))?;
        Ok(ApiSpec::new(document))
    }
}

/// `https://<service>.management.azure-api.net` unless `management_endpoint`
/// overrides it (sovereign clouds, gateways).
fn service_url(endpoint: Option<&str>, subscription: &str, group: &str, service: &str) -> String {
    let endpoint = match endpoint {
        Some(e) => e.trim_end_matches('/').to_string(),
        None => format!("https://{service}.management.azure-api.net"),
    };
    format!(
        "{endpoint}/subscriptions/{subscription}/resourceGroups/{group}/providers/Microsoft.ApiManagement/service/{service}"
    )
}

impl Fetcher for AzureFetcher {
    fn fetch(&self, settings: &Settings) -> Result<DesiredSet, FetchError> {
        let subscription = required(settings, "subscription_id")?;
        let group = required(settings, "resource_group_name")?;
        let service = required(settings, "service_name")?;
        let token = required(settings, "access_token")?;
        let service_url = service_url(optional(settings, "management_endpoint"), subscription, group, service);
        tracing::debug!("fetching API specs from Azure");

        let apis: ApiList = http::get_json(
            self.agent
                .get(&format!("{service_url}/apis"))
                .set("Authorization", token)
                .query("api-version", API_VERSION),
        )?;
        tracing::debug!(count = apis.value.len(), "found APIs in Azure, fetching their details");

        let mut specs = Vec::new();
        for api in &apis.value {
            match self.export_spec(&service_url, token, api) {
                Ok(spec) => {
                    tracing::debug!(api = %api.id, "fetched API spec from Azure");
                    specs.push(spec);
                }
                Err(err) => tracing::error!(api = %api.id, error = %err, "failed to fetch API from Azure"),
            }
        }

        let fetched = collect_specs(ProviderKind::Azure.type_name(), specs);
        tracing::info!(count = fetched.len(), "fetched API specs from Azure");
        Ok(fetched)
    }
}
