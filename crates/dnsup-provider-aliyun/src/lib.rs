// # Aliyun DNS Backend
//
// Implements the `DnsBackend` capability over the alidns RPC API.
//
// ## API Reference
//
// RPC actions against `https://alidns.aliyuncs.com/`:
//
// - `DescribeSubDomainRecords` (`SubDomain`, `Type`, `DomainName`)
// - `AddDomainRecord` (`DomainName`, `RR`, `Type`, `Value`)
// - `UpdateDomainRecord` (`RecordId`, `RR`, `Type`, `Value`)
//
// Success responses carry `TotalCount` / `DomainRecords.Record`; failures
// carry a `Code` plus an optional `Recommend` hint, which is surfaced in
// the returned error.
//
// Every request is signed; see `sign.rs`.
//
// ## Security
//
// The access key secret never appears in logs; the Debug implementation
// redacts it.

use async_trait::async_trait;
use chrono::Utc;
use dnsup_core::backend::{DesiredRecord, DnsBackend, RemoteRecord};
use dnsup_core::config::{AliyunConfig, RecordType};
use dnsup_core::{Error, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::time::Duration;

mod sign;

/// alidns RPC endpoint
const ALIYUN_API_ENDPOINT: &str = "https://alidns.aliyuncs.com";

/// alidns API version sent with every request
const API_VERSION: &str = "2015-01-09";

/// Default HTTP timeout for API requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Aliyun alidns backend
///
/// Stateless and single-shot: one signed RPC call per trait method, no
/// retries, no caching. Which call to make is the reconciler's decision.
pub struct AliyunBackend {
    /// Access key pair for request signing
    access_key_id: String,
    access_key_secret: String,

    /// Base domain, sent as `DomainName` on every action
    domain_name: String,

    /// RPC endpoint, overridable for tests
    endpoint: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

impl std::fmt::Debug for AliyunBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AliyunBackend")
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"<REDACTED>")
            .field("domain_name", &self.domain_name)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl AliyunBackend {
    /// Create a backend from a provider configuration.
    ///
    /// A missing access key half or domain name is a configuration error,
    /// reported before any network activity.
    pub fn new(config: &AliyunConfig) -> Result<Self> {
        let (access_key_id, access_key_secret) = config.credentials()?;
        let domain_name = config.domain.require_domain_name()?;
        Ok(Self::with_endpoint(
            access_key_id,
            access_key_secret,
            domain_name,
            ALIYUN_API_ENDPOINT,
        ))
    }

    /// Create a backend against a specific endpoint. Mainly useful for tests.
    fn with_endpoint(
        access_key_id: &str,
        access_key_secret: &str,
        domain_name: &str,
        endpoint: &str,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .expect("HTTP client initialization failed, please report this as a bug");

        Self {
            access_key_id: access_key_id.to_string(),
            access_key_secret: access_key_secret.to_string(),
            domain_name: domain_name.to_string(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Parameters every action carries, signature aside.
    fn common_params(&self, action: &str) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        params.insert("Action".to_string(), action.to_string());
        params.insert("Format".to_string(), "JSON".to_string());
        params.insert("Version".to_string(), API_VERSION.to_string());
        params.insert("AccessKeyId".to_string(), self.access_key_id.clone());
        params.insert("SignatureMethod".to_string(), "HMAC-SHA1".to_string());
        params.insert("SignatureVersion".to_string(), "1.0".to_string());
        params.insert(
            "Timestamp".to_string(),
            Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        );
        params.insert(
            "SignatureNonce".to_string(),
            format!("{:x}", rand::random::<u128>()),
        );
        params
    }

    /// Issue one signed RPC call; the failure string carries the provider's
    /// `Code` and its `Recommend` hint when present.
    async fn rpc<T: DeserializeOwned>(
        &self,
        params: BTreeMap<String, String>,
    ) -> std::result::Result<T, String> {
        let query = sign::signed_query(&params, &self.access_key_secret);
        let url = format!("{}/?{}", self.endpoint, query);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| format!("unreadable response: {e}"))?;

        // Failures are recognized by the Code field in the body; the HTTP
        // status varies by error class.
        if let Ok(failure) = serde_json::from_str::<FailureBody>(&body) {
            if let Some(code) = failure.code {
                return Err(format!(
                    "{code}: {}; recommended actions from aliyun: {}",
                    failure.message.as_deref().unwrap_or("no message"),
                    failure.recommend.as_deref().unwrap_or("none"),
                ));
            }
        }
        if !status.is_success() {
            return Err(format!("HTTP {status}: {body}"));
        }

        serde_json::from_str(&body).map_err(|e| format!("unexpected response: {e}"))
    }
}

#[async_trait]
impl DnsBackend for AliyunBackend {
    async fn describe(&self, fqdn: &str, record_type: RecordType) -> Result<Vec<RemoteRecord>> {
        let mut params = self.common_params("DescribeSubDomainRecords");
        params.insert("DomainName".to_string(), self.domain_name.clone());
        params.insert("SubDomain".to_string(), fqdn.to_string());
        params.insert("Type".to_string(), record_type.as_str().to_string());

        let response: DescribeResponse = self
            .rpc(params)
            .await
            .map_err(|message| Error::describe(fqdn, message))?;

        tracing::debug!(
            "aliyun reports {} {record_type} record(s) for {fqdn}",
            response.total_count
        );
        Ok(response
            .domain_records
            .records
            .into_iter()
            .map(RemoteRecord::from)
            .collect())
    }

    async fn create(&self, desired: &DesiredRecord) -> Result<()> {
        let mut params = self.common_params("AddDomainRecord");
        params.insert("DomainName".to_string(), self.domain_name.clone());
        params.insert("RR".to_string(), desired.subdomain.clone());
        params.insert("Type".to_string(), desired.record_type.as_str().to_string());
        params.insert("Value".to_string(), desired.value.clone());

        let response: MutationResponse = self
            .rpc(params)
            .await
            .map_err(|message| Error::create(&desired.fqdn, message))?;
        tracing::debug!(
            "aliyun created record {} for {}",
            response.record_id.as_deref().unwrap_or("(unknown)"),
            desired.fqdn
        );
        Ok(())
    }

    async fn update(&self, record_id: &str, desired: &DesiredRecord) -> Result<()> {
        let mut params = self.common_params("UpdateDomainRecord");
        params.insert("RecordId".to_string(), record_id.to_string());
        params.insert("RR".to_string(), desired.subdomain.clone());
        params.insert("Type".to_string(), desired.record_type.as_str().to_string());
        params.insert("Value".to_string(), desired.value.clone());

        let _: MutationResponse = self
            .rpc(params)
            .await
            .map_err(|message| Error::update(&desired.fqdn, message))?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "aliyun"
    }
}

// alidns API types

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeResponse {
    total_count: i64,
    domain_records: DomainRecords,
}

#[derive(Debug, Deserialize)]
struct DomainRecords {
    #[serde(rename = "Record", default)]
    records: Vec<ApiRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ApiRecord {
    record_id: String,
    #[allow(dead_code)]
    #[serde(rename = "RR")]
    rr: String,
    #[serde(rename = "Type")]
    record_type: String,
    value: String,
}

impl From<ApiRecord> for RemoteRecord {
    fn from(record: ApiRecord) -> Self {
        Self {
            id: record.record_id,
            value: record.value,
            record_type: record.record_type,
            // Updates never touch TTL or routing, so neither participates
            // in drift detection.
            ttl: None,
            proxied: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MutationResponse {
    record_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct FailureBody {
    code: Option<String>,
    message: Option<String>,
    recommend: Option<String>,
}
