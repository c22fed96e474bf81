// # Cloudflare DNS Backend
//
// Implements the `DnsBackend` capability over the Cloudflare API v4.
//
// ## API Reference
//
// - List DNS Records: GET `/zones/:zone_id/dns_records?type=...&name=...`
// - Create DNS Record: POST `/zones/:zone_id/dns_records`
// - Update DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`
//
// Every response carries a boolean `success`; failures carry an `errors`
// array of `{code, message}` pairs which are surfaced verbatim in the
// returned error.
//
// ## Security
//
// The API token never appears in logs; the Debug implementation redacts it.

use async_trait::async_trait;
use dnsup_core::backend::{DesiredRecord, DnsBackend, RemoteRecord};
use dnsup_core::config::{CloudflareConfig, RecordType};
use dnsup_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cloudflare API base URL
const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Cloudflare DNS backend
///
/// Stateless and single-shot: one API call per trait method, no retries,
/// no caching. Which call to make is the reconciler's decision.
pub struct CloudflareBackend {
    /// Cloudflare API token with Zone:DNS:Edit permission
    api_token: String,

    /// Zone the managed records live in
    zone_id: String,

    /// API base URL, overridable for tests
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

impl std::fmt::Debug for CloudflareBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareBackend")
            .field("api_token", &"<REDACTED>")
            .field("zone_id", &self.zone_id)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl CloudflareBackend {
    /// Create a backend from a provider configuration.
    ///
    /// Missing zone ID or API token is a configuration error, reported
    /// before any network activity.
    pub fn new(config: &CloudflareConfig) -> Result<Self> {
        let (zone_id, api_token) = config.credentials()?;
        Ok(Self::with_base_url(zone_id, api_token, CLOUDFLARE_API_BASE))
    }

    /// Create a backend against a specific base URL. Mainly useful for tests.
    fn with_base_url(zone_id: &str, api_token: &str, base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .expect("HTTP client initialization failed, please report this as a bug");

        Self {
            api_token: api_token.to_string(),
            zone_id: zone_id.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    fn records_url(&self) -> String {
        format!("{}/zones/{}/dns_records", self.base_url, self.zone_id)
    }

    /// Check a create/update response envelope, returning the failure detail.
    async fn write_result(response: reqwest::Response) -> std::result::Result<(), String> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unreadable error response".to_string());
            return Err(format!("HTTP {status}: {body}"));
        }

        let envelope: WriteResponse = response
            .json()
            .await
            .map_err(|e| format!("unexpected response: {e}"))?;
        if !envelope.success {
            return Err(join_errors(&envelope.errors));
        }
        Ok(())
    }
}

#[async_trait]
impl DnsBackend for CloudflareBackend {
    async fn describe(&self, fqdn: &str, record_type: RecordType) -> Result<Vec<RemoteRecord>> {
        let url = format!("{}?type={}&name={}", self.records_url(), record_type, fqdn);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| Error::describe(fqdn, format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unreadable error response".to_string());
            return Err(Error::describe(fqdn, format!("HTTP {status}: {body}")));
        }

        let list: ListResponse = response
            .json()
            .await
            .map_err(|e| Error::describe(fqdn, format!("unexpected response: {e}")))?;
        if !list.success {
            return Err(Error::describe(fqdn, join_errors(&list.errors)));
        }

        if let Some(info) = &list.result_info {
            tracing::debug!(
                "cloudflare reports {} {record_type} record(s) for {fqdn}",
                info.total_count
            );
        }

        Ok(list.result.into_iter().map(RemoteRecord::from).collect())
    }

    async fn create(&self, desired: &DesiredRecord) -> Result<()> {
        let response = self
            .client
            .post(self.records_url())
            .bearer_auth(&self.api_token)
            .json(&RecordPayload::from(desired))
            .send()
            .await
            .map_err(|e| Error::create(&desired.fqdn, format!("request failed: {e}")))?;

        Self::write_result(response)
            .await
            .map_err(|message| Error::create(&desired.fqdn, message))
    }

    async fn update(&self, record_id: &str, desired: &DesiredRecord) -> Result<()> {
        let url = format!("{}/{}", self.records_url(), record_id);
        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.api_token)
            .json(&RecordPayload::from(desired))
            .send()
            .await
            .map_err(|e| Error::update(&desired.fqdn, format!("request failed: {e}")))?;

        Self::write_result(response)
            .await
            .map_err(|message| Error::update(&desired.fqdn, message))
    }

    fn backend_name(&self) -> &'static str {
        "cloudflare"
    }
}

fn join_errors(errors: &[ApiError]) -> String {
    if errors.is_empty() {
        return "unspecified API error".to_string();
    }
    errors
        .iter()
        .map(|e| format!("{}: {}", e.code, e.message))
        .collect::<Vec<_>>()
        .join(", ")
}

// Cloudflare API types

/// Body of create and update requests; always the whole record
#[derive(Debug, Serialize)]
struct RecordPayload {
    #[serde(rename = "type")]
    record_type: String,
    name: String,
    content: String,
    ttl: u32,
    proxied: bool,
}

impl From<&DesiredRecord> for RecordPayload {
    fn from(desired: &DesiredRecord) -> Self {
        Self {
            record_type: desired.record_type.as_str().to_string(),
            name: desired.fqdn.clone(),
            content: desired.value.clone(),
            ttl: desired.ttl,
            proxied: desired.proxied,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiError>,
    #[serde(default)]
    result: Vec<ApiRecord>,
    result_info: Option<ResultInfo>,
}

#[derive(Debug, Deserialize)]
struct WriteResponse {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResultInfo {
    total_count: usize,
}

#[derive(Debug, Deserialize)]
struct ApiRecord {
    id: String,
    #[allow(dead_code)]
    #[serde(rename = "type")]
    record_type: String,
    #[allow(dead_code)]
    name: String,
    content: String,
    ttl: u32,
    #[serde(default)]
    proxied: bool,
}

impl From<ApiRecord> for RemoteRecord {
    fn from(record: ApiRecord) -> Self {
        Self {
            id: record.id,
            value: record.content,
            record_type: record.record_type,
            ttl: Some(record.ttl),
            proxied: Some(record.proxied),
        }
    }
}
