use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

/// EWMA smoothing factor for per-process baselines.
const ALPHA: f32 = 0.1;

/// An entry not observed for this long is treated as brand new on its next
/// sighting, even if eviction somehow missed it.
const STALE_AFTER: Duration = Duration::from_secs(20);

/// Outcome of folding one CPU reading into a process's baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Observation {
    /// First sighting (or a stale re-sighting): the baseline was seeded with
    /// the raw reading and there is no comparison point yet, so the process
    /// cannot be judged anomalous this cycle.
    Cold,
    /// The baseline as it stood *before* this update — the value a spike is
    /// measured against, so a spike cannot raise its own comparison point
    /// within the cycle that detects it.
    Warm { prior: f32 },
}

#[derive(Debug, Clone, Copy)]
struct ProcessBaseline {
    avg_cpu: f32,
    last_observed: Instant,
}

/// Adaptive per-process CPU baselines, keyed by OS process id.
///
/// EWMA keeps the per-process state O(1): no history buffer per pid, and old
/// behavior fades out naturally as new readings arrive.
#[derive(Debug, Default)]
pub struct BaselineTracker {
    baselines: HashMap<u32, ProcessBaseline>,
}

impl BaselineTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one normalized CPU reading into the baseline for `pid`.
    pub fn observe(&mut self, pid: u32, current: f32, now: Instant) -> Observation {
        match self.baselines.get_mut(&pid) {
            Some(entry) if now.duration_since(entry.last_observed) <= STALE_AFTER => {
                let prior = entry.avg_cpu;
                entry.avg_cpu = ALPHA * current + (1.0 - ALPHA) * prior;
                entry.last_observed = now;
                Observation::Warm { prior }
            }
            _ => {
                self.baselines.insert(
                    pid,
                    ProcessBaseline {
                        avg_cpu: current,
                        last_observed: now,
                    },
                );
                Observation::Cold
            }
        }
    }

    /// Drop every tracked pid absent from the latest enumeration.
    ///
    /// Called once per detection cycle; without it, short-lived process churn
    /// grows the map without bound.
    pub fn reconcile(&mut self, live: &HashSet<u32>) {
        self.baselines.retain(|pid, _| live.contains(pid));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.baselines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.baselines.is_empty()
    }
}
