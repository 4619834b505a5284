//! 3scale API management: active docs.
//!
//! `GET https://<three_scale_url>/admin/api/active_docs.json?access_token=…`
//! returns every active doc; each doc body is a Swagger document encoded as a
//! JSON string.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use apisec_core::{collect_specs, ApiSpec, DesiredSet, ProviderKind, Settings};

use crate::error::FetchError;
use crate::http;
use crate::settings::required;
use crate::Fetcher;

#[derive(Debug, Deserialize)]
struct ActiveDocs {
    #[serde(default)]
    api_docs: Vec<ActiveDocEntry>,
}

#[derive(Debug, Deserialize)]
struct ActiveDocEntry {
    api_doc: ActiveDoc,
}

#[derive(Debug, Deserialize)]
struct ActiveDoc {
    #[serde(default)]
    name: Option<String>,
    body: String,
}

#[derive(Debug)]
pub struct ThreeScaleFetcher {
    agent: ureq::Agent,
}

impl ThreeScaleFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: http::agent(timeout),
        }
    }
}

/// `url` is normally a bare admin host; a value carrying a scheme is used as-is.
fn active_docs_url(url: &str) -> String {
    let base = url.trim_end_matches('/');
    if base.contains("://") {
        format!("{base}/admin/api/active_docs.json")
    } else {
        format!("https://{base}/admin/api/active_docs.json")
    }
}

impl Fetcher for ThreeScaleFetcher {
    fn fetch(&self, settings: &Settings) -> Result<DesiredSet, FetchError> {
        let url = required(settings, "three_scale_url")?;
        let token = required(settings, "three_scale_access_token")?;
        tracing::debug!("fetching API specs from 3scale");

        let docs: ActiveDocs = http::get_json(
            self.agent
                .get(&active_docs_url(url))
                .query("access_token", token),
        )?;
        tracing::debug!(count = docs.api_docs.len(), "received 3scale active docs");

        let mut specs = Vec::new();
        for entry in docs.api_docs {
            let body = entry.api_doc.body.replace(['\r', '\n'], "");
            match serde_json::from_str::<Value>(body.trim()) {
                Ok(document) => specs.push(ApiSpec::new(document)),
                Err(err) => tracing::error!(
                    doc = entry.api_doc.name.as_deref().unwrap_or("<unnamed>"),
                    error = %err,
                    "skipping 3scale active doc with an unparsable body"
                ),
            }
        }

        let fetched = collect_specs(ProviderKind::ThreeScale.type_name(), specs);
        tracing::info!(count = fetched.len(), "fetched API specs from 3scale");
        Ok(fetched)
    }
}
