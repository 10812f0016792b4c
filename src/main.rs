//! hostpulse — a live host-resource monitor with per-process CPU spike
//! detection.
//!
//! Run with:  `RUST_LOG=info hostpulse`

mod export;

use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pulse_config::{default_path, load as load_config};
use pulse_core::top_spikes;
use pulse_monitor::{EngineOptions, MonitorHandle, SamplingEngine};
use pulse_provider::{SysinfoProcessProbe, SysinfoSystemProbe};

/// How many spikes a status line reports.
const TOP_SPIKES: usize = 5;

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG controls verbosity; info if unset.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("hostpulse v{} starting", env!("CARGO_PKG_VERSION"));

    let config = load_config(default_path())?;
    let options = EngineOptions {
        sample_interval: Duration::from_millis(config.sampling.interval_ms),
        detect_every: config.sampling.detect_every,
        history_capacity: config.sampling.history_size,
    };

    let handle = SamplingEngine::spawn(
        Box::new(SysinfoSystemProbe::new()),
        Box::new(SysinfoProcessProbe::new()),
        options,
    );

    // Report on the detection cadence: one status block per expected cycle.
    let status_interval = Duration::from_millis(
        config.sampling.interval_ms * config.sampling.detect_every.max(1),
    );
    let mut status = tokio::time::interval(status_interval);

    loop {
        tokio::select! {
            _ = status.tick() => log_status(&handle),
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    info!("shutting down");
    let path = export::write_snapshot(
        &config.export.directory,
        &handle.latest_snapshot(),
        &handle.latest_spikes(),
    )?;
    info!("snapshot written to {}", path.display());

    Ok(())
}

fn log_status(handle: &MonitorHandle) {
    let snapshot = handle.latest_snapshot();
    info!(
        cpu = format_args!("{:.1}%", snapshot.cpu_percent),
        ram = format_args!("{:.0}/{:.0} MB", snapshot.ram_used_mb, snapshot.ram_total_mb),
        disk = format_args!("{:.2} MB/s", snapshot.disk_mbps),
        net = format_args!("{:.1} KB/s", snapshot.net_kbps),
        "system"
    );

    for spike in top_spikes(&handle.latest_spikes(), TOP_SPIKES) {
        warn!(
            pid = spike.pid,
            name = %spike.name,
            current = format_args!("{:.1}%", spike.current),
            baseline = format_args!("{:.1}%", spike.baseline),
            multiplier = format_args!("x{:.1}", spike.multiplier),
            severity = %spike.severity(),
            "process CPU spike"
        );
    }
}
