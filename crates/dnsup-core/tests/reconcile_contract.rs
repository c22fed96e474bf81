//! Contract tests for the per-subdomain decision tree and the pass driver
//!
//! Constraints verified:
//! - exactly three live branches on the record count (none / one / many)
//! - "many" is never auto-resolved; the records stay untouched
//! - mutations carry the full desired state, never a diff
//! - one subdomain's failure never halts the rest of the pass
//! - disabled or misconfigured entries issue no network calls

mod common;

use common::*;
use dnsup_core::config::SubdomainSpec;
use dnsup_core::error::Error;
use dnsup_core::reconciler::{DomainReconciler, Outcome};
use std::net::IpAddr;

const RESOLVED_IP: &str = "203.0.113.5";

fn resolved_ip() -> IpAddr {
    RESOLVED_IP.parse().expect("test IP parses")
}

#[tokio::test]
async fn no_record_and_creation_disabled_is_a_noop() {
    let backend = MockBackend::new();
    let config = domain_config(false, vec![SubdomainSpec::new("home")]);
    let reconciler = DomainReconciler::new(&backend, &config, resolved_ip());

    let outcome = reconciler.reconcile_subdomain(&config.subdomains[0]).await;

    assert!(matches!(outcome, Outcome::CreationDisabled), "got {outcome:?}");
    assert_eq!(backend.mutation_calls(), 0, "no create or update may be issued");
}

#[tokio::test]
async fn no_record_and_creation_allowed_creates_with_the_resolved_ip() {
    let backend = MockBackend::new();
    let config = domain_config(true, vec![SubdomainSpec::new("home")]);
    let reconciler = DomainReconciler::new(&backend, &config, resolved_ip());

    let outcome = reconciler.reconcile_subdomain(&config.subdomains[0]).await;

    assert!(matches!(outcome, Outcome::Created), "got {outcome:?}");
    let creates = backend.creates();
    assert_eq!(creates.len(), 1, "exactly one create call");
    assert_eq!(creates[0].fqdn, "home.example.com");
    assert_eq!(creates[0].value, RESOLVED_IP);
    assert!(backend.updates().is_empty());
}

#[tokio::test]
async fn matching_record_is_left_alone() {
    let backend =
        MockBackend::new().with_record("home.example.com", full_record("rec-1", RESOLVED_IP, 1, false));
    let config = domain_config(true, vec![SubdomainSpec::new("home")]);
    let reconciler = DomainReconciler::new(&backend, &config, resolved_ip());

    let outcome = reconciler.reconcile_subdomain(&config.subdomains[0]).await;

    assert!(matches!(outcome, Outcome::Unchanged), "got {outcome:?}");
    assert_eq!(backend.mutation_calls(), 0, "a matching record must not be touched");
}

#[tokio::test]
async fn drifted_value_triggers_one_whole_record_update() {
    let backend = MockBackend::new()
        .with_record("home.example.com", full_record("rec-1", "198.51.100.7", 300, true));
    let spec = SubdomainSpec::new("home").with_ttl(300).with_proxied(true);
    let config = domain_config(false, vec![spec]);
    let reconciler = DomainReconciler::new(&backend, &config, resolved_ip());

    let outcome = reconciler.reconcile_subdomain(&config.subdomains[0]).await;

    assert!(matches!(outcome, Outcome::Updated), "got {outcome:?}");
    let updates = backend.updates();
    assert_eq!(updates.len(), 1, "exactly one update call");
    let (record_id, desired) = &updates[0];
    assert_eq!(record_id, "rec-1", "the identifier pins the record to mutate");
    // The update carries the full desired state, not just the changed value.
    assert_eq!(desired.value, RESOLVED_IP);
    assert_eq!(desired.ttl, 300);
    assert!(desired.proxied);
    assert!(backend.creates().is_empty());
}

#[tokio::test]
async fn drifted_ttl_alone_triggers_an_update() {
    let backend =
        MockBackend::new().with_record("home.example.com", full_record("rec-1", RESOLVED_IP, 3600, false));
    let config = domain_config(false, vec![SubdomainSpec::new("home")]);
    let reconciler = DomainReconciler::new(&backend, &config, resolved_ip());

    let outcome = reconciler.reconcile_subdomain(&config.subdomains[0]).await;

    assert!(matches!(outcome, Outcome::Updated), "got {outcome:?}");
    assert_eq!(backend.updates().len(), 1);
}

#[tokio::test]
async fn unreported_ttl_and_proxy_never_trigger_an_update() {
    // A backend whose update path does not manage TTL or proxying reports
    // neither, so only the value is compared.
    let backend =
        MockBackend::new().with_record("home.example.com", value_only_record("rec-1", RESOLVED_IP));
    let spec = SubdomainSpec::new("home").with_ttl(600).with_proxied(true);
    let config = domain_config(false, vec![spec]);
    let reconciler = DomainReconciler::new(&backend, &config, resolved_ip());

    let outcome = reconciler.reconcile_subdomain(&config.subdomains[0]).await;

    assert!(matches!(outcome, Outcome::Unchanged), "got {outcome:?}");
    assert_eq!(backend.mutation_calls(), 0);
}

#[tokio::test]
async fn multiple_records_fail_the_subdomain_without_mutation() {
    let backend = MockBackend::new()
        .with_record("dup.example.com", value_only_record("rec-1", "198.51.100.7"))
        .with_record("dup.example.com", value_only_record("rec-2", "198.51.100.8"));
    let config = domain_config(true, vec![SubdomainSpec::new("dup")]);
    let reconciler = DomainReconciler::new(&backend, &config, resolved_ip());

    let outcome = reconciler.reconcile_subdomain(&config.subdomains[0]).await;

    match outcome {
        Outcome::Failed(Error::AmbiguousRecord { count, .. }) => assert_eq!(count, 2),
        other => panic!("expected an ambiguity failure, got {other:?}"),
    }
    assert_eq!(backend.mutation_calls(), 0, "ambiguous records must stay untouched");
}

#[tokio::test]
async fn ambiguity_does_not_halt_the_rest_of_the_pass() {
    let backend = MockBackend::new()
        .with_record("dup.example.com", value_only_record("rec-1", "198.51.100.7"))
        .with_record("dup.example.com", value_only_record("rec-2", "198.51.100.8"))
        .with_record("ok.example.com", value_only_record("rec-3", RESOLVED_IP));
    let config = domain_config(true, vec![SubdomainSpec::new("dup"), SubdomainSpec::new("ok")]);
    let reconciler = DomainReconciler::new(&backend, &config, resolved_ip());

    let outcomes = reconciler.run_pass().await.expect("the pass itself succeeds");

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes[0].1.is_failure());
    assert!(matches!(outcomes[1].1, Outcome::Unchanged), "got {:?}", outcomes[1].1);
    assert_eq!(backend.describe_calls(), 2, "the second subdomain is still processed");
}

#[tokio::test]
async fn describe_failure_skips_create_and_update() {
    let backend = MockBackend::new().with_failing_describe("home.example.com");
    let config = domain_config(true, vec![SubdomainSpec::new("home")]);
    let reconciler = DomainReconciler::new(&backend, &config, resolved_ip());

    let outcome = reconciler.reconcile_subdomain(&config.subdomains[0]).await;

    assert!(
        matches!(outcome, Outcome::Failed(Error::Describe { .. })),
        "got {outcome:?}"
    );
    assert_eq!(backend.mutation_calls(), 0);
}

#[tokio::test]
async fn empty_subdomain_name_makes_no_network_calls() {
    let backend = MockBackend::new();
    let config = domain_config(true, vec![SubdomainSpec::new("  ")]);
    let reconciler = DomainReconciler::new(&backend, &config, resolved_ip());

    let outcome = reconciler.reconcile_subdomain(&config.subdomains[0]).await;

    assert!(matches!(outcome, Outcome::Failed(Error::Config(_))), "got {outcome:?}");
    assert_eq!(backend.describe_calls(), 0, "validation happens before any network call");
}

#[tokio::test]
async fn disabled_entry_is_fully_inert() {
    let backend = MockBackend::new();
    let mut config = domain_config(true, vec![SubdomainSpec::new("home")]);
    config.enabled = false;
    let reconciler = DomainReconciler::new(&backend, &config, resolved_ip());

    let outcomes = reconciler.run_pass().await.expect("a disabled pass is not an error");

    assert!(outcomes.is_empty());
    assert_eq!(backend.describe_calls(), 0, "a disabled entry must not touch the network");
}

#[tokio::test]
async fn missing_domain_name_aborts_the_whole_pass() {
    let backend = MockBackend::new();
    let mut config = domain_config(true, vec![SubdomainSpec::new("home")]);
    config.domain_name = None;
    let reconciler = DomainReconciler::new(&backend, &config, resolved_ip());

    let err = reconciler.run_pass().await.unwrap_err();

    assert!(matches!(err, Error::Config(_)), "got {err:?}");
    assert_eq!(backend.describe_calls(), 0, "no partial attempt on bad config");
}

#[tokio::test]
async fn rejected_create_fails_the_subdomain_but_not_its_siblings() {
    let backend = MockBackend::new()
        .with_record("ok.example.com", value_only_record("rec-1", RESOLVED_IP))
        .rejecting_creates();
    let config = domain_config(true, vec![SubdomainSpec::new("new"), SubdomainSpec::new("ok")]);
    let reconciler = DomainReconciler::new(&backend, &config, resolved_ip());

    let outcomes = reconciler.run_pass().await.expect("the pass itself succeeds");

    assert!(matches!(outcomes[0].1, Outcome::Failed(Error::Create { .. })));
    assert!(matches!(outcomes[1].1, Outcome::Unchanged), "got {:?}", outcomes[1].1);
    assert_eq!(backend.creates().len(), 1, "the rejected create was attempted once");
}

#[tokio::test]
async fn rejected_update_is_contained_to_its_subdomain() {
    let backend = MockBackend::new()
        .with_record("home.example.com", value_only_record("rec-1", "198.51.100.7"))
        .rejecting_updates();
    let config = domain_config(false, vec![SubdomainSpec::new("home")]);
    let reconciler = DomainReconciler::new(&backend, &config, resolved_ip());

    let outcome = reconciler.reconcile_subdomain(&config.subdomains[0]).await;

    assert!(matches!(outcome, Outcome::Failed(Error::Update { .. })), "got {outcome:?}");
}
