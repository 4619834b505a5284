use std::time::Duration;

use serde::Deserialize;

use apisec_core::{ApiIdentity, ApiSpec, Config, ExistingInventory, ManagementService, RemoteId, ServiceError};

use crate::multipart::{Form, Part};

/// Connection settings for the management service.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// `management_url/site_id`, without a trailing slash.
    pub base_url: String,
    pub api_id: String,
    pub api_key: String,
    pub violation_action: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: format!(
                "{}/{}",
                config.management_url.trim_end_matches('/'),
                config.site_id
            ),
            api_id: config.api_id.clone(),
            api_key: config.api_key.clone(),
            violation_action: config.specification_violation_action.clone(),
            timeout: config.timeout(),
        }
    }
}

/// HTTP management-service client.
///
/// Expects a REST API under `base_url`:
/// - `GET    <base>`      : list protected APIs
/// - `POST   <base>`      : protect a new API (multipart upload)
/// - `POST   <base>/<id>` : replace an API's specification
/// - `DELETE <base>/<id>` : stop protecting an API
pub struct HttpManagementClient {
    config: ClientConfig,
    agent: ureq::Agent,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    value: Vec<ListedApi>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListedApi {
    id: RemoteId,
    host_name: String,
    base_path: String,
}

impl HttpManagementClient {
    pub fn new(config: ClientConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        Self { config, agent }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(ClientConfig::from_config(config))
    }

    fn item_url(&self, id: &RemoteId) -> String {
        format!("{}/{}", self.config.base_url, id)
    }

    fn authorized(&self, request: ureq::Request) -> ureq::Request {
        request
            .query("api_id", &self.config.api_id)
            .query("api_key", &self.config.api_key)
    }

    fn upload_form(&self, spec: &ApiSpec) -> Result<Form, ServiceError> {
        let content = serde_json::to_vec(spec.document())
            .map_err(|e| ServiceError::Malformed(format!("cannot encode specification: {e}")))?;
        Ok(Form::encode(&[
            Part::file("fileContent", "swagger.json", "application/json", content),
            Part::text("validateHost", "false"),
            Part::text("specificationViolationAction", &self.config.violation_action),
        ]))
    }

    fn do_upload(&self, url: &str, spec: &ApiSpec) -> Result<(), ServiceError> {
        let form = self.upload_form(spec)?;
        tracing::debug!("POST {url} ({} bytes)", form.body.len());
        let request = self
            .authorized(self.agent.post(url))
            .set("Content-Type", &form.content_type());
        finish(request.send_bytes(&form.body)).map(drop)
    }
}

/// Map a ureq result onto the service error kinds, returning the body on 2xx.
fn finish(result: Result<ureq::Response, ureq::Error>) -> Result<String, ServiceError> {
    match result {
        Ok(response) => {
            let code = response.status();
            let body = response
                .into_string()
                .map_err(|e| ServiceError::Network(e.to_string()))?;
            tracing::debug!(status = code, "management service responded");
            Ok(body)
        }
        Err(ureq::Error::Status(code, response)) => Err(ServiceError::Status {
            code,
            body: response.into_string().unwrap_or_default(),
        }),
        Err(ureq::Error::Transport(t)) => Err(ServiceError::Network(transport_message(&t))),
    }
}

/// The failure without the request URL, whose query carries `api_key`.
fn transport_message(t: &ureq::Transport) -> String {
    let mut message = t.kind().to_string();
    if let Some(detail) = t.message() {
        message.push_str(": ");
        message.push_str(detail);
    }
    if let Some(source) = std::error::Error::source(t) {
        message.push_str(": ");
        message.push_str(&source.to_string());
    }
    message
}

/// Decode a list body into an inventory keyed by `hostName ++ basePath`.
pub fn parse_inventory(body: &str) -> Result<ExistingInventory, ServiceError> {
    let listed: ListResponse =
        serde_json::from_str(body).map_err(|e| ServiceError::Malformed(e.to_string()))?;
    Ok(listed
        .value
        .into_iter()
        .map(|api| {
            tracing::debug!(host = %api.host_name, base_path = %api.base_path, id = %api.id, "found protected API");
            (ApiIdentity::from_parts(&api.host_name, &api.base_path), api.id)
        })
        .collect())
}

impl ManagementService for HttpManagementClient {
    fn list(&self) -> Result<ExistingInventory, ServiceError> {
        let url = &self.config.base_url;
        tracing::debug!("GET {url}");
        let body = finish(self.authorized(self.agent.get(url)).call())?;
        parse_inventory(&body)
    }

    fn create(&self, spec: &ApiSpec) -> Result<(), ServiceError> {
        self.do_upload(&self.config.base_url, spec)
    }

    fn update(&self, id: &RemoteId, spec: &ApiSpec) -> Result<(), ServiceError> {
        self.do_upload(&self.item_url(id), spec)
    }

    fn delete(&self, id: &RemoteId) -> Result<(), ServiceError> {
        let url = self.item_url(id);
        tracing::debug!("DELETE {url}");
        finish(self.authorized(self.agent.delete(&url)).call()).map(drop)
    }
}
