use std::time::Instant;

use sysinfo::{Networks, System};

use crate::disk::{self, DiskCounters};
use crate::SystemProbe;
use pulse_core::{PulseError, Result};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Production [`SystemProbe`] backed by `sysinfo` plus `/proc/diskstats`.
///
/// Throughput readers keep the previous counter values and divide the delta
/// by the measured elapsed time, so call spacing does not skew the rates.
pub struct SysinfoSystemProbe {
    sys: System,
    networks: Networks,
    total_memory_mb: f32,
    disk_prev: Option<(DiskCounters, Instant)>,
    net_prev: Instant,
}

impl SysinfoSystemProbe {
    pub fn new() -> Self {
        let mut sys = System::new_all();
        sys.refresh_memory();

        let total_memory_mb = (sys.total_memory() as f64 / BYTES_PER_MB) as f32;
        tracing::debug!(total_memory_mb, "system probe initialized");

        // Prime the counters so the first tick reports a rate of zero
        // instead of cumulative-since-boot garbage.
        let disk_prev = disk::read_counters()
            .ok()
            .map(|counters| (counters, Instant::now()));

        Self {
            sys,
            networks: Networks::new_with_refreshed_list(),
            total_memory_mb,
            disk_prev,
            net_prev: Instant::now(),
        }
    }
}

impl Default for SysinfoSystemProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemProbe for SysinfoSystemProbe {
    fn cpu_percent(&mut self) -> Result<f32> {
        self.sys.refresh_cpu_usage();
        Ok(self.sys.global_cpu_usage())
    }

    fn available_memory_mb(&mut self) -> Result<f32> {
        self.sys.refresh_memory();
        Ok((self.sys.available_memory() as f64 / BYTES_PER_MB) as f32)
    }

    fn total_memory_mb(&self) -> f32 {
        self.total_memory_mb
    }

    fn disk_throughput(&mut self) -> Result<(f64, f64)> {
        let counters = disk::read_counters()
            .map_err(|e| PulseError::Probe(format!("cannot read /proc/diskstats: {e}")))?;
        let now = Instant::now();

        let rates = match self.disk_prev {
            Some((prev, at)) => {
                let secs = now.duration_since(at).as_secs_f64();
                if secs > 0.0 {
                    (
                        counters.read_bytes.saturating_sub(prev.read_bytes) as f64 / secs,
                        counters.write_bytes.saturating_sub(prev.write_bytes) as f64 / secs,
                    )
                } else {
                    (0.0, 0.0)
                }
            }
            None => (0.0, 0.0),
        };

        self.disk_prev = Some((counters, now));
        Ok(rates)
    }

    fn network_throughput(&mut self) -> Result<(f64, f64)> {
        // Per-interface `received()`/`transmitted()` reset on every refresh,
        // so each call sees only the bytes moved since the previous one.
        self.networks.refresh(false);
        let now = Instant::now();
        let secs = now.duration_since(self.net_prev).as_secs_f64();
        self.net_prev = now;

        if secs <= 0.0 {
            return Ok((0.0, 0.0));
        }

        let rx: u64 = self.networks.iter().map(|(_, data)| data.received()).sum();
        let tx: u64 = self.networks.iter().map(|(_, data)| data.transmitted()).sum();
        Ok((rx as f64 / secs, tx as f64 / secs))
    }
}
