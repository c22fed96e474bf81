//! Test doubles and helpers for the reconciliation contract tests

use async_trait::async_trait;
use dnsup_core::backend::{DesiredRecord, DnsBackend, RemoteRecord};
use dnsup_core::config::{DomainConfig, RecordType, SubdomainSpec};
use dnsup_core::error::{Error, Result};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A scriptable DnsBackend that records every call
#[derive(Default)]
pub struct MockBackend {
    /// Records returned by describe, keyed by FQDN
    records: HashMap<String, Vec<RemoteRecord>>,
    /// FQDNs whose describe call reports a provider failure
    failing_describes: Vec<String>,
    /// Whether create calls are rejected
    fail_create: bool,
    /// Whether update calls are rejected
    fail_update: bool,
    /// Call counter for describe()
    describe_calls: AtomicUsize,
    /// Recorded create requests (attempts, including rejected ones)
    creates: Mutex<Vec<DesiredRecord>>,
    /// Recorded update requests (record id + desired state)
    updates: Mutex<Vec<(String, DesiredRecord)>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record to a FQDN's describe response
    pub fn with_record(mut self, fqdn: &str, record: RemoteRecord) -> Self {
        self.records.entry(fqdn.to_string()).or_default().push(record);
        self
    }

    /// Make describe fail for a FQDN
    pub fn with_failing_describe(mut self, fqdn: &str) -> Self {
        self.failing_describes.push(fqdn.to_string());
        self
    }

    /// Reject every create call
    pub fn rejecting_creates(mut self) -> Self {
        self.fail_create = true;
        self
    }

    /// Reject every update call
    pub fn rejecting_updates(mut self) -> Self {
        self.fail_update = true;
        self
    }

    /// Number of describe calls issued
    pub fn describe_calls(&self) -> usize {
        self.describe_calls.load(Ordering::SeqCst)
    }

    /// Create requests issued so far
    pub fn creates(&self) -> Vec<DesiredRecord> {
        self.creates.lock().unwrap().clone()
    }

    /// Update requests issued so far
    pub fn updates(&self) -> Vec<(String, DesiredRecord)> {
        self.updates.lock().unwrap().clone()
    }

    /// Total mutation requests (creates + updates) issued so far
    pub fn mutation_calls(&self) -> usize {
        self.creates.lock().unwrap().len() + self.updates.lock().unwrap().len()
    }
}

#[async_trait]
impl DnsBackend for MockBackend {
    async fn describe(&self, fqdn: &str, _record_type: RecordType) -> Result<Vec<RemoteRecord>> {
        self.describe_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_describes.iter().any(|f| f == fqdn) {
            return Err(Error::describe(fqdn, "provider reported a failure"));
        }
        Ok(self.records.get(fqdn).cloned().unwrap_or_default())
    }

    async fn create(&self, desired: &DesiredRecord) -> Result<()> {
        self.creates.lock().unwrap().push(desired.clone());
        if self.fail_create {
            return Err(Error::create(&desired.fqdn, "provider rejected the request"));
        }
        Ok(())
    }

    async fn update(&self, record_id: &str, desired: &DesiredRecord) -> Result<()> {
        self.updates
            .lock()
            .unwrap()
            .push((record_id.to_string(), desired.clone()));
        if self.fail_update {
            return Err(Error::update(&desired.fqdn, "provider rejected the request"));
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "mock"
    }
}

/// An A-record config under example.com
pub fn domain_config(create_new_record: bool, subdomains: Vec<SubdomainSpec>) -> DomainConfig {
    DomainConfig {
        enabled: true,
        domain_name: Some("example.com".to_string()),
        record_type: RecordType::A,
        create_new_record,
        subdomains,
    }
}

/// A record as a backend that manages TTL and proxying reports it
pub fn full_record(id: &str, value: &str, ttl: u32, proxied: bool) -> RemoteRecord {
    RemoteRecord {
        id: id.to_string(),
        value: value.to_string(),
        record_type: "A".to_string(),
        ttl: Some(ttl),
        proxied: Some(proxied),
    }
}

/// A record as a backend that only manages the value reports it
pub fn value_only_record(id: &str, value: &str) -> RemoteRecord {
    RemoteRecord {
        id: id.to_string(),
        value: value.to_string(),
        record_type: "A".to_string(),
        ttl: None,
        proxied: None,
    }
}
