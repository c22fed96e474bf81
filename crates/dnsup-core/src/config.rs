//! Configuration types for the reconciler
//!
//! The settings file is JSON with camelCase keys. Shape errors (wrong types,
//! unknown provider tags) fail the whole load; *presence* of per-provider
//! required fields is checked when that provider's pass starts, so one bad
//! provider entry cannot take its siblings down with it.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::net::IpAddr;
use std::path::Path;

/// Top-level settings file
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Logging configuration
    #[serde(rename = "logSettings", default)]
    pub log: LogSettings,

    /// URLs returning the caller's public IP, one per address family
    #[serde(rename = "getIPUrls", default)]
    pub ip_urls: IpUrls,

    /// Provider configurations, processed in file order
    #[serde(rename = "domainSettings")]
    pub domains: Vec<ProviderConfig>,
}

impl Settings {
    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| Error::config(format!("cannot read settings file {}: {e}", path.display())))?;
        serde_json::from_str(&content)
            .map_err(|e| Error::config(format!("cannot parse settings file {}: {e}", path.display())))
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    /// Log level name (trace, debug, info, warn, error)
    #[serde(rename = "logLevel", default = "default_log_level")]
    pub level: String,

    /// Log file path; stderr when absent
    #[serde(rename = "logFileName", default)]
    pub file: Option<String>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Public-IP lookup URLs
///
/// Each entry is optional; a pass only needs the URL for its own record type.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IpUrls {
    #[serde(rename = "IPv4", default)]
    pub ipv4: Option<String>,

    #[serde(rename = "IPv6", default)]
    pub ipv6: Option<String>,
}

impl IpUrls {
    /// The lookup URL for a record type, if configured
    pub fn url_for(&self, record_type: RecordType) -> Option<&str> {
        match record_type {
            RecordType::A => self.ipv4.as_deref(),
            RecordType::Aaaa => self.ipv6.as_deref(),
        }
    }
}

/// DNS record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    /// A record (IPv4)
    A,
    /// AAAA record (IPv6)
    Aaaa,
}

impl RecordType {
    /// Wire spelling of the record type
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }

    /// Whether an address belongs to this record type's family
    pub fn matches(&self, ip: &IpAddr) -> bool {
        match self {
            RecordType::A => ip.is_ipv4(),
            RecordType::Aaaa => ip.is_ipv6(),
        }
    }
}

impl Default for RecordType {
    fn default() -> Self {
        RecordType::A
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-provider configuration, tagged by the `provider` field
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum ProviderConfig {
    /// Aliyun alidns backend
    Aliyun(AliyunConfig),
    /// Cloudflare v4 backend
    Cloudflare(CloudflareConfig),
}

impl ProviderConfig {
    /// The provider-independent part of the configuration
    pub fn domain(&self) -> &DomainConfig {
        match self {
            ProviderConfig::Aliyun(c) => &c.domain,
            ProviderConfig::Cloudflare(c) => &c.domain,
        }
    }

    /// Provider name for logging
    pub fn provider_name(&self) -> &'static str {
        match self {
            ProviderConfig::Aliyun(_) => "aliyun",
            ProviderConfig::Cloudflare(_) => "cloudflare",
        }
    }
}

/// Configuration shared by every provider
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainConfig {
    /// Whether this entry is processed at all
    #[serde(default)]
    pub enabled: bool,

    /// Base domain the subdomains hang under
    #[serde(default)]
    pub domain_name: Option<String>,

    /// Record type this entry manages
    #[serde(default)]
    pub record_type: RecordType,

    /// Whether a missing record may be created
    #[serde(default)]
    pub create_new_record: bool,

    /// Subdomains to reconcile, in order
    #[serde(default)]
    pub subdomains: Vec<SubdomainSpec>,
}

impl DomainConfig {
    /// The base domain, or a configuration error when it is missing
    pub fn require_domain_name(&self) -> Result<&str> {
        match self.domain_name.as_deref() {
            Some(name) if !name.trim().is_empty() => Ok(name),
            _ => Err(Error::config("missing domainName")),
        }
    }

    /// Fully-qualified name for one of this domain's subdomains
    pub fn fqdn(&self, subdomain: &str) -> String {
        match self.domain_name.as_deref() {
            Some(domain) => format!("{subdomain}.{domain}"),
            None => subdomain.to_string(),
        }
    }
}

/// Aliyun provider entry: common fields plus an access key pair
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AliyunConfig {
    #[serde(flatten)]
    pub domain: DomainConfig,

    #[serde(default)]
    pub access_key_id: Option<String>,

    #[serde(default)]
    pub access_key_secret: Option<String>,
}

impl AliyunConfig {
    /// The access key pair, or a configuration error when either half is missing
    pub fn credentials(&self) -> Result<(&str, &str)> {
        match (self.access_key_id.as_deref(), self.access_key_secret.as_deref()) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => Ok((id, secret)),
            _ => Err(Error::config("missing accessKeyId or accessKeySecret")),
        }
    }
}

/// Cloudflare provider entry: common fields plus zone and token
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudflareConfig {
    #[serde(flatten)]
    pub domain: DomainConfig,

    #[serde(default)]
    pub zone_id: Option<String>,

    #[serde(default)]
    pub api_token: Option<String>,
}

impl CloudflareConfig {
    /// Zone ID and API token, or a configuration error when either is missing
    pub fn credentials(&self) -> Result<(&str, &str)> {
        match (self.zone_id.as_deref(), self.api_token.as_deref()) {
            (Some(zone), Some(token)) if !zone.is_empty() && !token.is_empty() => Ok((zone, token)),
            _ => Err(Error::config("missing zoneId or apiToken")),
        }
    }
}

/// One subdomain to reconcile
///
/// In the settings file this is either a bare string (the name) or an object
/// carrying TTL and proxy overrides. TTL and proxied are honored by the
/// Cloudflare backend; a TTL of 1 means "automatic".
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "SubdomainSpecRepr")]
pub struct SubdomainSpec {
    pub name: String,
    pub ttl: u32,
    pub proxied: bool,
}

impl SubdomainSpec {
    /// Create a spec with default TTL and proxy settings
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ttl: default_ttl(),
            proxied: false,
        }
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    /// Enable or disable proxying
    pub fn with_proxied(mut self, proxied: bool) -> Self {
        self.proxied = proxied;
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SubdomainSpecRepr {
    Name(String),
    Full {
        name: String,
        #[serde(default = "default_ttl")]
        ttl: u32,
        #[serde(default)]
        proxied: bool,
    },
}

impl From<SubdomainSpecRepr> for SubdomainSpec {
    fn from(repr: SubdomainSpecRepr) -> Self {
        match repr {
            SubdomainSpecRepr::Name(name) => SubdomainSpec::new(name),
            SubdomainSpecRepr::Full { name, ttl, proxied } => SubdomainSpec { name, ttl, proxied },
        }
    }
}

fn default_ttl() -> u32 {
    1
}
