//! Vitals Glimpse: a single HTTP endpoint reporting memory, disk and CPU utilization
//! of the machine (or container) it runs on, graded against configured thresholds.
//!
//! Every request is admitted by the [`security::AccessGate`] and then answered from a
//! fresh set of samples; nothing is cached between requests.
pub mod api;
pub mod config;
pub mod environment;
pub mod error;
pub mod fsutil;
pub mod sampler;
pub mod security;
pub mod stats;
pub mod vitals;

use clap::Parser;

use config::{Args, Config};
use sampler::{CpuSampler, CpuStrategy, DiskSampler, MemorySampler};
use security::AccessGate;
use vitals::VitalsResponder;

/// Runs the vitals service until it receives SIGINT or SIGTERM.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the listen address cannot be
/// bound, or the server fails while running.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::try_from(Args::parse()).map_err(error::Error::from)?;

    let runtime_env = environment::detect_runtime_environment(&config.rootfs);
    let strategy = CpuStrategy::select(runtime_env, &config.rootfs);

    let responder = VitalsResponder::new(
        config.thresholds,
        MemorySampler::new(&config.rootfs),
        DiskSampler::new(&config.rootfs),
        CpuSampler::new(strategy, &config.rootfs),
    );
    let gate = AccessGate::new(&config.security);

    log::info!("listening on {}", config.listen);
    log::info!(
        "thresholds: mem={}% disk={}% cpu={}%",
        config.thresholds.mem,
        config.thresholds.disk,
        config.thresholds.cpu
    );
    if gate.requires_api_key() {
        log::info!("API key: required");
    }
    if !gate.allowed_networks().is_empty() {
        let networks = gate
            .allowed_networks()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        log::info!("allowed networks: {}", networks.join(", "));
    }
    match gate.rate_limiter() {
        Some(limiter) => log::info!("rate limit: {} requests/minute per IP", limiter.limit()),
        None => log::info!("rate limit: disabled"),
    }
    log::info!("runtime environment: {runtime_env}, CPU source: {strategy}");

    api::APIServer::new(gate, responder)
        .listen(config.listen)
        .await?;
    log::info!("server stopped");
    Ok(())
}
