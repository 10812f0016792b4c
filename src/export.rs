//! JSON snapshot export — a point-in-time dump of gauges and top spikes.

use std::path::{Path, PathBuf};

use chrono::{Local, Utc};
use serde::Serialize;

use pulse_core::{top_spikes, ProcessSpike, PulseError, Result, SystemSnapshot};

/// On-disk snapshot shape.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotRecord {
    timestamp: String,
    cpu_percent: f32,
    ram_used_mb: f32,
    ram_total_mb: f32,
    disk_mbps: f32,
    net_kbps: f32,
    /// Top spikes by multiplier, at most five.
    spikes: Vec<ProcessSpike>,
}

/// Write a timestamped snapshot file into `directory`, returning its path.
pub fn write_snapshot(
    directory: &Path,
    snapshot: &SystemSnapshot,
    spikes: &[ProcessSpike],
) -> Result<PathBuf> {
    let record = SnapshotRecord {
        timestamp: Utc::now().to_rfc3339(),
        cpu_percent: snapshot.cpu_percent,
        ram_used_mb: snapshot.ram_used_mb,
        ram_total_mb: snapshot.ram_total_mb,
        disk_mbps: snapshot.disk_mbps,
        net_kbps: snapshot.net_kbps,
        spikes: top_spikes(spikes, 5),
    };

    let json = serde_json::to_string_pretty(&record)
        .map_err(|e| PulseError::Export(format!("cannot serialize snapshot: {e}")))?;

    let filename = format!(
        "hostpulse_snapshot_{}.json",
        Local::now().format("%Y%m%d_%H%M%S")
    );
    let path = directory.join(filename);
    std::fs::write(&path, json)?;
    Ok(path)
}
