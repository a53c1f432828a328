//! Shared startup for the provisioning binaries

use crate::config::Settings;
use crate::network::NetworkConfig;
use crate::provision::{BatchReport, RunResult};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Log to stderr, filtered by `RUST_LOG` (default `warn`)
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Network settings for this run: proxies from the environment, TLS and
/// timeout from `settings`
#[must_use]
pub fn network_config(settings: &Settings) -> NetworkConfig {
    network_config_with(settings, |key| std::env::var(key).ok())
}

pub fn network_config_with(
    settings: &Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> NetworkConfig {
    let config = NetworkConfig::from_lookup(lookup)
        .with_timeout(Duration::from_secs(settings.network.timeout_secs));

    if settings.network.tls_verify {
        config
    } else {
        config.insecure()
    }
}

#[must_use]
pub fn proxy_line(network: &NetworkConfig) -> String {
    if network.proxy_installed() {
        format!("Using proxy ({})", network.describe())
    } else {
        "No proxy installed, using direct connection".to_string()
    }
}

pub fn announce_proxy(network: &NetworkConfig) {
    println!("{}", proxy_line(network));
    tracing::debug!("Network config: {network:?}");
}

/// Process exit code for a finished batch
#[must_use]
pub fn exit_code(report: &BatchReport, settings: &Settings) -> ExitCode {
    if settings.run.fail_when_all_failed && report.all_failed() {
        tracing::error!("All {} resource(s) failed", report.total());
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

/// Exit code for single-resource mode, treated as a batch of one
#[must_use]
pub fn single_exit_code(result: RunResult, settings: &Settings) -> ExitCode {
    exit_code(
        &BatchReport {
            results: vec![result],
        },
        settings,
    )
}
