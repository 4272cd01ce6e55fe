//! Contentful management client.

use assetsync_config::CatalogConfig;
use assetsync_core::{CatalogClient, IdentityToken, RecordRef, RemoteAction, RemoteOperationError};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{CatalogError, Result};
use crate::wire::{self, Asset, Collection, Sys};

const MANAGEMENT_JSON: &str = "application/vnd.contentful.management.v1+json";
const VERSION_HEADER: &str = "X-Contentful-Version";

/// Polls of the asset after processing is triggered.
const PROCESSING_CHECKS: u32 = 5;

/// Contentful asset catalog.
#[derive(Debug, Clone)]
pub struct ContentfulClient {
    client: reqwest::Client,
    api_url: String,
    upload_url: String,
    space_id: String,
    environment: String,
    access_token: String,
    locale: String,
    page_size: u32,
    processing_wait: Duration,
}

impl ContentfulClient {
    /// Create a client from the catalog section of the configuration.
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        if !config.is_configured() {
            return Err(CatalogError::NotConfigured(
                "space_id and access_token are required".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            upload_url: config.upload_url.trim_end_matches('/').to_string(),
            space_id: config.space_id.clone(),
            environment: config.environment.clone(),
            access_token: config.access_token.clone(),
            locale: config.locale.clone(),
            page_size: config.page_size.max(1),
            processing_wait: Duration::from_millis(config.processing_wait_ms),
        })
    }

    fn assets_url(&self) -> String {
        format!(
            "{}/spaces/{}/environments/{}/assets",
            self.api_url, self.space_id, self.environment
        )
    }

    fn asset_url(&self, id: &str) -> String {
        format!("{}/{}", self.assets_url(), id)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.access_token)
    }

    async fn fetch_asset(&self, action: RemoteAction, id: &str) -> RemoteResult<Asset> {
        let response = send(action, id, self.request(Method::GET, &self.asset_url(id))).await?;
        parse(action, id, response).await
    }

    /// PUT the asset's fields back at its current version.
    async fn put_asset(&self, action: RemoteAction, asset: &Asset) -> RemoteResult<Asset> {
        let id = asset.sys.id.as_str();
        let version = asset.sys.version.unwrap_or_default();
        let request = self
            .request(Method::PUT, &self.asset_url(id))
            .header("Content-Type", MANAGEMENT_JSON)
            .header(VERSION_HEADER, version.to_string())
            .json(&asset.body());
        let response = send(action, id, request).await?;
        parse(action, id, response).await
    }

    async fn create_upload(&self, target: &str, bytes: Vec<u8>) -> RemoteResult<Sys> {
        let url = format!("{}/spaces/{}/uploads", self.upload_url, self.space_id);
        let request = self
            .request(Method::POST, &url)
            .header("Content-Type", "application/octet-stream")
            .body(bytes);
        let response = send(RemoteAction::Upload, target, request).await?;
        let upload: UploadResponse = parse(RemoteAction::Upload, target, response).await?;
        Ok(upload.sys)
    }

    /// Trigger processing of the localized file and wait until it has a URL.
    async fn process(&self, asset: &Asset) -> RemoteResult<()> {
        let id = asset.sys.id.as_str();
        let url = format!("{}/files/{}/process", self.asset_url(id), self.locale);
        let request = self
            .request(Method::PUT, &url)
            .header(VERSION_HEADER, asset.sys.version.unwrap_or_default().to_string());
        send(RemoteAction::Upload, id, request).await?;

        for attempt in 1..=PROCESSING_CHECKS {
            tokio::time::sleep(self.processing_wait).await;
            let current = self.fetch_asset(RemoteAction::Upload, id).await?;
            if current.is_processed(&self.locale) {
                debug!(asset = id, attempt, "asset processed");
                return Ok(());
            }
        }

        Err(RemoteOperationError::new(
            RemoteAction::Upload,
            id,
            format!("asset not processed after {} checks", PROCESSING_CHECKS),
        ))
    }
}

type RemoteResult<T> = std::result::Result<T, RemoteOperationError>;

#[derive(Debug, serde::Deserialize)]
struct UploadResponse {
    sys: Sys,
}

/// Send a request, turning transport errors and non-2xx statuses into
/// remote operation errors.
async fn send(action: RemoteAction, target: &str, request: RequestBuilder) -> RemoteResult<Response> {
    let response = request
        .send()
        .await
        .map_err(|e| RemoteOperationError::new(action, target, e.to_string()))?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(RemoteOperationError::new(
        action,
        target,
        format!("Contentful API error ({}): {}", status, error_message(&body)),
    ))
}

async fn parse<T: DeserializeOwned>(
    action: RemoteAction,
    target: &str,
    response: Response,
) -> RemoteResult<T> {
    response.json().await.map_err(|e| {
        RemoteOperationError::new(action, target, format!("failed to parse response: {}", e))
    })
}

/// The `message` of a Contentful error body, or the body itself.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl CatalogClient for ContentfulClient {
    async fn create_record(
        &self,
        display_name: &str,
        description: &str,
        file_name: &str,
    ) -> RemoteResult<RecordRef> {
        let body = wire::new_asset_body(&self.locale, display_name, description, file_name);
        let request = self
            .request(Method::POST, &self.assets_url())
            .header("Content-Type", MANAGEMENT_JSON)
            .json(&body);
        let response = send(RemoteAction::Create, file_name, request).await?;
        let asset: Asset = parse(RemoteAction::Create, file_name, response).await?;

        info!(asset = %asset.sys.id, file = file_name, "asset created");
        Ok(RecordRef::new(asset.sys.id, display_name))
    }

    async fn update_name(
        &self,
        token: &IdentityToken,
        display_name: &str,
        description: &str,
    ) -> RemoteResult<()> {
        let mut asset = self
            .fetch_asset(RemoteAction::UpdateName, token.as_str())
            .await?;
        asset.set_localized("title", &self.locale, Value::from(display_name));
        asset.set_localized("description", &self.locale, Value::from(description));
        self.put_asset(RemoteAction::UpdateName, &asset).await?;

        info!(asset = %token, title = display_name, "asset renamed");
        Ok(())
    }

    async fn delete_record(&self, token: &IdentityToken) -> RemoteResult<()> {
        let request = self.request(Method::DELETE, &self.asset_url(token.as_str()));
        send(RemoteAction::Delete, token.as_str(), request).await?;
        info!(asset = %token, "asset deleted");
        Ok(())
    }

    async fn upload_asset(
        &self,
        token: &IdentityToken,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> RemoteResult<()> {
        let size = bytes.len();
        let upload = self.create_upload(token.as_str(), bytes).await?;
        debug!(asset = %token, upload = %upload.id, size, "bytes uploaded");

        let mut asset = self.fetch_asset(RemoteAction::Upload, token.as_str()).await?;
        asset.set_localized("file", &self.locale, wire::upload_link(file_name, &upload.id));
        let asset = self.put_asset(RemoteAction::Upload, &asset).await?;

        self.process(&asset).await?;
        info!(asset = %token, file = file_name, "asset file replaced");
        Ok(())
    }

    async fn list_records(&self) -> RemoteResult<Vec<RecordRef>> {
        let url = self.assets_url();
        let mut records = Vec::new();
        let mut skip: u64 = 0;

        loop {
            let request = self.request(Method::GET, &url).query(&[
                ("skip", skip.to_string()),
                ("limit", self.page_size.to_string()),
            ]);
            let response = send(RemoteAction::List, "assets", request).await?;
            let page: Collection<Asset> = parse(RemoteAction::List, "assets", response).await?;

            let received = page.items.len() as u64;
            for asset in page.items {
                if asset.sys.id.trim().is_empty() {
                    warn!("skipping asset without id");
                    continue;
                }
                let title = asset.title(&self.locale);
                records.push(RecordRef::new(asset.sys.id, title));
            }

            skip += received;
            if received == 0 || skip >= page.total {
                break;
            }
        }

        debug!(count = records.len(), "assets listed");
        Ok(records)
    }
}
