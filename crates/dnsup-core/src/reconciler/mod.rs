//! Record reconciliation
//!
//! One `DomainReconciler` drives one provider configuration through one
//! pass: for every configured subdomain it asks the backend what exists,
//! decides between create / update / leave alone, and acts. The decision
//! tree has exactly three live branches on the record count:
//!
//! - `0`: create when allowed, otherwise a log-only no-op
//! - `1`: update in place when any compared field drifted, otherwise no-op
//! - `>1`: ambiguous; the records are left untouched and the subdomain
//!   fails this pass, since more than one match is never auto-resolved
//!
//! A subdomain's failure ends only that subdomain's pass; the driver always
//! moves on to the next entry.

use crate::backend::{DesiredRecord, DnsBackend};
use crate::config::{DomainConfig, SubdomainSpec};
use crate::error::{Error, Result};
use std::net::IpAddr;
use tracing::{error, info, warn};

/// What one subdomain's pass amounted to
#[derive(Debug)]
pub enum Outcome {
    /// Record exists and already matches the desired state
    Unchanged,
    /// No record existed; one was created
    Created,
    /// Record existed and was rewritten with the desired state
    Updated,
    /// No record existed and creation is disabled
    CreationDisabled,
    /// This subdomain's pass ended early
    Failed(Error),
}

impl Outcome {
    /// Whether this outcome is a failure
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }

    /// Short label for summary logging
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Unchanged => "unchanged",
            Outcome::Created => "created",
            Outcome::Updated => "updated",
            Outcome::CreationDisabled => "creation disabled",
            Outcome::Failed(_) => "failed",
        }
    }
}

/// Reconciles one provider configuration against one resolved IP
///
/// Everything the pass needs travels in this value: the backend handle,
/// the configuration, and the IP resolved before the pass began. The IP is
/// never re-resolved mid-pass.
pub struct DomainReconciler<'a> {
    backend: &'a dyn DnsBackend,
    domain: &'a DomainConfig,
    ip: IpAddr,
}

impl<'a> DomainReconciler<'a> {
    /// Create a reconciler for one pass
    pub fn new(backend: &'a dyn DnsBackend, domain: &'a DomainConfig, ip: IpAddr) -> Self {
        Self { backend, domain, ip }
    }

    /// Run the pass: iterate the configured subdomains in order.
    ///
    /// A disabled entry does nothing at all, network included. A missing
    /// domain name aborts the whole pass before any subdomain is touched.
    /// Per-subdomain failures are contained; the returned list pairs each
    /// subdomain name with what happened to it.
    pub async fn run_pass(&self) -> Result<Vec<(String, Outcome)>> {
        let label = self.domain.domain_name.as_deref().unwrap_or("(unnamed)");
        if !self.domain.enabled {
            info!("{} pass for {label} is disabled", self.backend.backend_name());
            return Ok(Vec::new());
        }
        let domain_name = self.domain.require_domain_name()?;

        info!(
            "starting {} pass for {} records under {domain_name}",
            self.backend.backend_name(),
            self.domain.record_type,
        );
        let mut outcomes = Vec::with_capacity(self.domain.subdomains.len());
        for spec in &self.domain.subdomains {
            let outcome = self.reconcile_subdomain(spec).await;
            outcomes.push((spec.name.clone(), outcome));
        }
        info!("pass for {domain_name} finished");
        Ok(outcomes)
    }

    /// Reconcile a single subdomain: describe, branch on the count, act.
    pub async fn reconcile_subdomain(&self, spec: &SubdomainSpec) -> Outcome {
        if spec.name.trim().is_empty() {
            error!(
                "subdomain entry without a name under {}",
                self.domain.domain_name.as_deref().unwrap_or("(unnamed)")
            );
            return Outcome::Failed(Error::config("subdomain name is empty"));
        }

        let desired = self.desired_record(spec);
        let records = match self.backend.describe(&desired.fqdn, self.domain.record_type).await {
            Ok(records) => records,
            Err(e) => {
                error!("{e}");
                return Outcome::Failed(e);
            }
        };

        match records.as_slice() {
            [] if self.domain.create_new_record => match self.backend.create(&desired).await {
                Ok(()) => {
                    info!(
                        "{} had no {} record, created one with value {}",
                        desired.fqdn, desired.record_type, desired.value
                    );
                    Outcome::Created
                }
                Err(e) => {
                    warn!("{e}");
                    Outcome::Failed(e)
                }
            },
            [] => {
                info!(
                    "{} has no {} record and record creation is disabled",
                    desired.fqdn, desired.record_type
                );
                Outcome::CreationDisabled
            }
            [existing] => {
                if !existing.differs_from(&desired) {
                    info!("{} record for {} did not change", desired.record_type, desired.fqdn);
                    return Outcome::Unchanged;
                }
                match self.backend.update(&existing.id, &desired).await {
                    Ok(()) => {
                        info!(
                            "updated the {} record for {} from {} to {}",
                            desired.record_type,
                            desired.fqdn,
                            existing.value.trim(),
                            desired.value
                        );
                        Outcome::Updated
                    }
                    Err(e) => {
                        warn!("{e}");
                        Outcome::Failed(e)
                    }
                }
            }
            many => {
                let err = Error::AmbiguousRecord {
                    fqdn: desired.fqdn.clone(),
                    record_type: self.domain.record_type,
                    count: many.len(),
                };
                error!("{err}");
                Outcome::Failed(err)
            }
        }
    }

    fn desired_record(&self, spec: &SubdomainSpec) -> DesiredRecord {
        DesiredRecord {
            subdomain: spec.name.clone(),
            fqdn: self.domain.fqdn(&spec.name),
            record_type: self.domain.record_type,
            value: self.ip.to_string(),
            ttl: spec.ttl,
            proxied: spec.proxied,
        }
    }
}
