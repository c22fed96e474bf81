// # dnsupd - record reconciliation daemon
//
// This binary is a thin integration layer:
// 1. Load the settings file
// 2. Initialize logging
// 3. Resolve the public IP per record type (lazily, memoized)
// 4. Run one reconciliation pass per configured provider, in file order
//
// All reconciliation logic lives in dnsup-core; the provider wire formats
// live in their provider crates. Run it from cron or a systemd timer to get
// periodic reconciliation.
//
// ## Usage
//
// ```bash
// dnsupd [settings-file]
// ```
//
// The settings file defaults to `dnsup-settings.json` in the working
// directory. A missing or unparseable settings file exits with code 1;
// per-provider failures are logged and contained, they do not change the
// exit code.

use anyhow::Result;
use dnsup_core::DnsBackend;
use dnsup_core::config::{LogSettings, ProviderConfig, RecordType, Settings};
use dnsup_core::reconciler::DomainReconciler;
use dnsup_ip_http::HttpIpResolver;
use dnsup_provider_aliyun::AliyunBackend;
use dnsup_provider_cloudflare::CloudflareBackend;
use std::collections::HashMap;
use std::env;
use std::fs::File;
use std::net::IpAddr;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Settings file used when none is given on the command line
const DEFAULT_SETTINGS_PATH: &str = "dnsup-settings.json";

/// Exit codes for different termination scenarios
#[derive(Debug, Clone, Copy)]
enum DnsupExitCode {
    /// Clean shutdown (per-provider failures included; they are contained)
    CleanShutdown = 0,
    /// Settings file missing, unreadable, or unparseable
    ConfigError = 1,
    /// Runtime construction failed
    RuntimeError = 2,
}

impl From<DnsupExitCode> for ExitCode {
    fn from(code: DnsupExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    let settings_path = env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_SETTINGS_PATH.to_string());

    let settings = match Settings::load(&settings_path) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return DnsupExitCode::ConfigError.into();
        }
    };

    if let Err(e) = init_logging(&settings.log) {
        eprintln!("Failed to initialize logging: {e}");
        return DnsupExitCode::ConfigError.into();
    }

    info!("starting dnsupd with settings from {settings_path}");

    // A pass issues one request at a time and awaits each response, so a
    // current-thread runtime is all it takes.
    let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!("failed to create tokio runtime: {e}");
            return DnsupExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run_passes(&settings));

    info!("dnsupd finished");
    DnsupExitCode::CleanShutdown.into()
}

/// Initialize tracing from the settings file's log section.
///
/// Logs go to the configured file when one is set, to stderr otherwise.
fn init_logging(log: &LogSettings) -> Result<()> {
    let level = match log.level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder().with_max_level(level);
    match &log.file {
        Some(path) => {
            let file = File::create(path)?;
            let subscriber = builder.with_ansi(false).with_writer(Arc::new(file)).finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        None => {
            tracing::subscriber::set_global_default(builder.finish())?;
        }
    }
    Ok(())
}

/// Run one reconciliation pass per configured provider, in file order.
///
/// Provider failures are logged and contained; the next provider always
/// gets its turn.
async fn run_passes(settings: &Settings) {
    let resolver = HttpIpResolver::new(settings.ip_urls.clone());
    let mut resolved: HashMap<RecordType, IpAddr> = HashMap::new();

    for entry in &settings.domains {
        if let Err(e) = run_provider_pass(entry, &resolver, &mut resolved).await {
            error!(
                "{} pass for {} aborted: {e}",
                entry.provider_name(),
                entry.domain().domain_name.as_deref().unwrap_or("(unnamed)"),
            );
        }
    }
}

/// One provider's pass: resolve the IP, build the backend, reconcile.
async fn run_provider_pass(
    entry: &ProviderConfig,
    resolver: &HttpIpResolver,
    resolved: &mut HashMap<RecordType, IpAddr>,
) -> dnsup_core::Result<()> {
    let domain = entry.domain();
    if !domain.enabled {
        info!(
            "{} pass for {} is disabled",
            entry.provider_name(),
            domain.domain_name.as_deref().unwrap_or("(unnamed)"),
        );
        return Ok(());
    }

    // A provider missing required fields aborts here, before any network
    // activity on its behalf.
    domain.require_domain_name()?;
    let backend: Box<dyn DnsBackend> = match entry {
        ProviderConfig::Aliyun(config) => Box::new(AliyunBackend::new(config)?),
        ProviderConfig::Cloudflare(config) => Box::new(CloudflareBackend::new(config)?),
    };

    // Resolved once per record type per run and held for every pass that
    // uses it; disabled entries above never trigger a resolution.
    let ip = match resolved.get(&domain.record_type) {
        Some(ip) => *ip,
        None => {
            let ip = resolver.resolve(domain.record_type).await?;
            info!("current {} address: {ip}", domain.record_type);
            resolved.insert(domain.record_type, ip);
            ip
        }
    };

    let outcomes = DomainReconciler::new(backend.as_ref(), domain, ip)
        .run_pass()
        .await?;

    for (name, outcome) in &outcomes {
        debug!("{name}: {}", outcome.label());
    }
    let failures = outcomes.iter().filter(|(_, outcome)| outcome.is_failure()).count();
    if failures > 0 {
        warn!("{failures} of {} subdomain(s) failed this pass", outcomes.len());
    }

    Ok(())
}
