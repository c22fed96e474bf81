// # DNS Backend Trait
//
// Defines the capability the reconciler needs from a DNS provider:
// look records up, create one, update one in place. Implementations live in
// their own crates (`dnsup-provider-aliyun`, `dnsup-provider-cloudflare`)
// and own their wire formats and authentication.
//
// Backends are single-shot and stateless: one API call per invocation, no
// retries (there is no retry anywhere in this system), no caching of the
// provider's record set between calls.

use crate::config::RecordType;
use crate::error::Result;
use async_trait::async_trait;

/// A DNS record as the provider reports it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRecord {
    /// Provider-assigned record identifier, used to pin updates
    pub id: String,
    /// Record value (an IP address string)
    pub value: String,
    /// Record type as the provider spelled it
    pub record_type: String,
    /// TTL, when the backend's update path manages it
    pub ttl: Option<u32>,
    /// Proxy flag, when the backend's update path manages it
    pub proxied: Option<bool>,
}

impl RemoteRecord {
    /// Whether this record drifted from the desired state.
    ///
    /// The value is always compared (trimmed, as some providers pad it).
    /// TTL and the proxy flag participate only when the backend reported
    /// them; a backend whose updates never touch those fields reports
    /// `None` and they stay out of the decision.
    pub fn differs_from(&self, desired: &DesiredRecord) -> bool {
        if self.value.trim() != desired.value {
            return true;
        }
        if self.ttl.is_some_and(|ttl| ttl != desired.ttl) {
            return true;
        }
        self.proxied.is_some_and(|proxied| proxied != desired.proxied)
    }
}

/// The state a subdomain's record should end up in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredRecord {
    /// Subdomain label (the provider-side "RR" / host part)
    pub subdomain: String,
    /// Fully-qualified record name
    pub fqdn: String,
    /// Record type
    pub record_type: RecordType,
    /// Record value: the resolved public IP
    pub value: String,
    /// Desired TTL (1 = provider automatic)
    pub ttl: u32,
    /// Desired proxy flag
    pub proxied: bool,
}

/// Trait for DNS provider backends
///
/// Whether to call `create` or `update` is never this trait's decision;
/// the reconciler owns the describe → decide → act sequence.
#[async_trait]
pub trait DnsBackend: Send + Sync {
    /// Look up the records matching a name and type.
    ///
    /// The query filters by exact type match on the provider side. Zero,
    /// one, or many records may come back; counting them is the caller's
    /// job. A transport failure or provider-reported error is an
    /// `Error::Describe`.
    async fn describe(&self, fqdn: &str, record_type: RecordType) -> Result<Vec<RemoteRecord>>;

    /// Create a record for a name that has none.
    async fn create(&self, desired: &DesiredRecord) -> Result<()>;

    /// Update one existing record in place. The identifier pins the exact
    /// record to mutate; the full desired state is sent, not a diff.
    async fn update(&self, record_id: &str, desired: &DesiredRecord) -> Result<()>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}
