use serde::Serialize;

/// A point-in-time view of system-wide resource usage — gauges for the
/// current tick plus the bounded history of every tracked stream.
///
/// Produced once per sampling tick by the engine; consumers (status logging,
/// snapshot export) only ever see whole snapshots, never partial updates.
#[derive(Debug, Clone, Default)]
pub struct SystemSnapshot {
    /// System-wide CPU usage (0.0 – 100.0).
    pub cpu_percent: f32,
    /// RAM in use, in megabytes.
    pub ram_used_mb: f32,
    /// Total physical RAM in megabytes (queried once at startup).
    pub ram_total_mb: f32,
    /// Aggregate disk throughput (read + write) in MB/s.
    pub disk_mbps: f32,
    /// Aggregate network throughput (recv + sent) in KB/s.
    pub net_kbps: f32,
    /// CPU usage history, oldest first (%).
    pub cpu_history: Vec<f32>,
    /// RAM usage history, oldest first (%).
    pub ram_history: Vec<f32>,
    /// Disk throughput history, oldest first (MB/s).
    pub disk_history: Vec<f32>,
    /// Network throughput history, oldest first (KB/s).
    pub net_history: Vec<f32>,
}

impl SystemSnapshot {
    /// RAM usage as a percentage in `[0, 100]`.
    #[must_use]
    pub fn ram_percent(&self) -> f32 {
        if self.ram_total_mb == 0.0 {
            return 0.0;
        }
        self.ram_used_mb / self.ram_total_mb * 100.0
    }
}

/// A detected per-process CPU anomaly.
///
/// Immutable once constructed; the detector replaces the whole published set
/// every cycle rather than merging into it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessSpike {
    pub pid: u32,
    pub name: String,
    /// Instantaneous CPU usage at detection time (%, 100 = one full core).
    pub current: f32,
    /// EWMA baseline the reading was judged against (%).
    pub baseline: f32,
    /// `current / baseline`.
    pub multiplier: f32,
}

impl ProcessSpike {
    /// Display severity band — presentation only, plays no part in detection.
    #[must_use]
    pub fn severity(&self) -> Severity {
        if self.multiplier > 3.0 {
            Severity::High
        } else if self.multiplier > 2.5 {
            Severity::Medium
        } else {
            Severity::Info
        }
    }
}

/// Severity band for presenting a spike.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    High,
    Medium,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::High => write!(f, "high"),
            Severity::Medium => write!(f, "medium"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// Rank spikes for presentation: descending by multiplier, capped at `limit`.
///
/// The registry itself keeps arrival order; ranking is a consumer concern.
#[must_use]
pub fn top_spikes(spikes: &[ProcessSpike], limit: usize) -> Vec<ProcessSpike> {
    let mut ranked = spikes.to_vec();
    ranked.sort_by(|a, b| b.multiplier.total_cmp(&a.multiplier));
    ranked.truncate(limit);
    ranked
}
