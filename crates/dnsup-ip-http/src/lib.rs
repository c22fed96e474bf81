// # HTTP IP Resolver
//
// Fetches the caller's current public IP from an external service that
// echoes it as plain text (e.g. api.ipify.org, ifconfig.me/ip).
//
// The daemon resolves at most once per record type per run and hands the
// value to the reconciler, which never re-resolves mid-pass.

use dnsup_core::config::{IpUrls, RecordType};
use dnsup_core::{Error, Result};
use std::net::IpAddr;
use std::time::Duration;

/// Default HTTP timeout for IP lookups
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolves the current public IP from the configured lookup URLs
#[derive(Debug)]
pub struct HttpIpResolver {
    urls: IpUrls,
    client: reqwest::Client,
}

impl HttpIpResolver {
    /// Create a resolver over the configured lookup URLs
    pub fn new(urls: IpUrls) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .expect("HTTP client initialization failed, please report this as a bug");

        Self { urls, client }
    }

    /// Resolve the public IP for a record type from its configured URL.
    ///
    /// The response body is trimmed and parsed; an address of the wrong
    /// family for the record type is rejected rather than silently used.
    pub async fn resolve(&self, record_type: RecordType) -> Result<IpAddr> {
        let url = self
            .urls
            .url_for(record_type)
            .ok_or_else(|| Error::config(format!("no getIPUrls entry for {record_type} records")))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::ip_resolve(format!("request to {url} failed: {e}")))?;
        if !response.status().is_success() {
            return Err(Error::ip_resolve(format!(
                "{url} returned HTTP {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::ip_resolve(format!("failed to read response from {url}: {e}")))?;
        let text = body.trim();
        let ip: IpAddr = text
            .parse()
            .map_err(|_| Error::ip_resolve(format!("{url} returned an invalid IP address: {text:?}")))?;

        if !record_type.matches(&ip) {
            return Err(Error::ip_resolve(format!(
                "{url} returned {ip}, which is unusable for {record_type} records"
            )));
        }

        tracing::debug!("resolved current {record_type} address: {ip}");
        Ok(ip)
    }
}
