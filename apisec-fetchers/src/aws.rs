//! AWS API Gateway (REST APIs).
//!
//! Every stage of every REST API is exported as Swagger with integration
//! extensions. The SDK is async; each fetch drives it on a current-thread
//! tokio runtime and blocks until the export finishes.

use std::time::Duration;

use aws_sdk_apigateway::config::timeout::TimeoutConfig;
use aws_sdk_apigateway::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_apigateway::error::DisplayErrorContext;
use aws_sdk_apigateway::Client;
use serde_json::Value;

use apisec_core::{collect_specs, ApiSpec, DesiredSet, ProviderKind, Settings};

use crate::error::FetchError;
use crate::settings::required;
use crate::Fetcher;

const PAGE_SIZE: i32 = 500;

#[derive(Debug)]
pub struct AwsApiGatewayFetcher {
    timeout: Duration,
}

impl AwsApiGatewayFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn client(&self, access_key_id: &str, secret_access_key: &str, region: &str) -> Client {
        let credentials = Credentials::new(access_key_id, secret_access_key, None, None, "apisec-config");
        let config = aws_sdk_apigateway::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(credentials)
            .timeout_config(
                TimeoutConfig::builder()
                    .operation_attempt_timeout(self.timeout)
                    .build(),
            )
            .build();
        Client::from_conf(config)
    }
}

impl Fetcher for AwsApiGatewayFetcher {
    fn fetch(&self, settings: &Settings) -> Result<DesiredSet, FetchError> {
        let access_key_id = required(settings, "aws_access_key_id")?;
        let secret_access_key = required(settings, "aws_secret_access_key")?;
        let region = required(settings, "aws_region")?;
        tracing::debug!(region, "fetching API specs from AWS API Gateway");

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| FetchError::Aws(format!("cannot start async runtime: {e}")))?;
        let client = self.client(access_key_id, secret_access_key, region);
        let specs = runtime.block_on(export_all(&client))?;

        let fetched = collect_specs(ProviderKind::AwsApiGateway.type_name(), specs);
        tracing::info!(count = fetched.len(), "fetched API specs from AWS API Gateway");
        Ok(fetched)
    }
}

async fn export_all(client: &Client) -> Result<Vec<ApiSpec>, FetchError> {
    let mut specs = Vec::new();
    let mut position: Option<String> = None;
    loop {
        let page = client
            .get_rest_apis()
            .limit(PAGE_SIZE)
            .set_position(position.take())
            .send()
            .await
            .map_err(aws_err)?;

        for api in page.items() {
            let Some(api_id) = api.id() else { continue };
            let stages = client
                .get_stages()
                .rest_api_id(api_id)
                .send()
                .await
                .map_err(aws_err)?;
            for stage in stages.item() {
                let Some(stage_name) = stage.stage_name() else { continue };
                match export_stage(client, api_id, stage_name).await {
                    Ok(spec) => {
                        tracing::debug!(api = api_id, stage = stage_name, "fetched swagger export");
                        specs.push(spec);
                    }
                    Err(err) => tracing::error!(
                        api = api_id,
                        stage = stage_name,
                        error = %err,
                        "failed to export stage from AWS API Gateway"
                    ),
                }
            }
        }

        position = page.position().map(str::to_string);
        if position.is_none() {
            break;
        }
    }
    Ok(specs)
}

async fn export_stage(client: &Client, api_id: &str, stage_name: &str) -> Result<ApiSpec, FetchError> {
    let export = client
        .get_export()
        .rest_api_id(api_id)
        .stage_name(stage_name)
        .export_type("swagger")
        .parameters("extensions", "integrations")
        .accepts("application/json")
        .send()
        .await
        .map_err(aws_err)?;
    let body = export
        .body()
        .ok_or_else(|| FetchError::Aws(format!("empty export for {api_id}/{stage_name}")))?;
    let document: Value = serde_json::from_slice(body.as_ref())
        .map_err(|e| FetchError::Aws(format!("export for {api_id}/{stage_name} is not JSON: {e}")))?;
    Ok(ApiSpec::new(document))
}

fn aws_err(err: impl std::error::Error) -> FetchError {
    FetchError::Aws(DisplayErrorContext(err).to_string())
}
