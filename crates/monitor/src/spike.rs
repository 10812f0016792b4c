use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use tracing::debug;

use crate::baseline::{BaselineTracker, Observation};
use pulse_core::ProcessSpike;
use pulse_provider::ProcessProbe;

// Fixed detection policy.
/// A reading must exceed its baseline by this factor to qualify.
const SPIKE_RATIO: f32 = 2.5;
/// Absolute usage floor (%): a tiny reading is never a spike, whatever the
/// multiplier says.
const MIN_CURRENT: f32 = 5.0;
/// Baseline floor (%): near-zero baselines would blow the multiplier up on
/// noise alone.
const MIN_BASELINE: f32 = 1.0;
/// Processes with no more cumulative CPU time than this (seconds) are
/// ignored; idle and just-started processes would only pollute baselines.
const MIN_CPU_TIME_SECS: f64 = 1.0;

/// The published spike set.
///
/// The detection worker is the sole writer and replaces the set wholesale;
/// readers (display, export) take cloned snapshots. The lock is scoped to
/// exactly that swap and that clone.
#[derive(Debug, Default)]
pub struct SpikeRegistry {
    spikes: RwLock<Vec<ProcessSpike>>,
}

impl SpikeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the active set in one swap — a reader sees either the full
    /// old set or the full new one, never a mix.
    pub fn publish(&self, spikes: Vec<ProcessSpike>) {
        *self.spikes.write() = spikes;
    }

    /// Snapshot of the active set, in arrival order.
    #[must_use]
    pub fn latest(&self) -> Vec<ProcessSpike> {
        self.spikes.read().clone()
    }
}

/// One anomaly-detection pass over the live process table.
///
/// Owns its probe and baselines outright for the duration of a cycle, so the
/// only shared state it ever touches is the registry it publishes to.
pub struct SpikeDetector {
    probe: Box<dyn ProcessProbe>,
    baselines: BaselineTracker,
    registry: Arc<SpikeRegistry>,
}

impl SpikeDetector {
    pub fn new(probe: Box<dyn ProcessProbe>, registry: Arc<SpikeRegistry>) -> Self {
        Self {
            probe,
            baselines: BaselineTracker::new(),
            registry,
        }
    }

    /// Run one detection cycle.
    ///
    /// A failed enumeration aborts the cycle with the registry untouched; a
    /// failed query for a single process (it exited mid-cycle) skips just
    /// that process.
    pub fn run_cycle(&mut self) {
        let now = Instant::now();

        let processes = match self.probe.processes() {
            Ok(list) => list,
            Err(e) => {
                debug!("process enumeration failed, cycle skipped: {e}");
                return;
            }
        };
        let cores = self.probe.logical_cores().max(1) as f32;

        let mut live = HashSet::with_capacity(processes.len());
        let mut candidates = Vec::new();

        for process in &processes {
            live.insert(process.pid);

            if process.cpu_time_secs <= MIN_CPU_TIME_SECS {
                continue;
            }

            // Normalize so 100 % means one full core regardless of core count.
            let current = match self.probe.process_cpu_percent(&process.name) {
                Ok(raw) => raw / cores,
                Err(_) => continue,
            };

            let Observation::Warm { prior: baseline } =
                self.baselines.observe(process.pid, current, now)
            else {
                continue;
            };

            if baseline > MIN_BASELINE && current > baseline * SPIKE_RATIO && current > MIN_CURRENT
            {
                candidates.push(ProcessSpike {
                    pid: process.pid,
                    name: process.name.clone(),
                    current,
                    baseline,
                    multiplier: current / baseline,
                });
            }
        }

        self.baselines.reconcile(&live);

        debug!(
            spikes = candidates.len(),
            tracked = self.baselines.len(),
            "detection cycle complete"
        );
        self.registry.publish(candidates);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::{PulseError, Result};
    use pulse_provider::ProcessSample;
    use std::collections::HashMap;

    /// Shared script: the test keeps a handle and rewrites readings between
    /// cycles while the detector owns the probe.
    #[derive(Default)]
    struct Script {
        processes: Vec<ProcessSample>,
        cpu_by_name: HashMap<String, f32>,
        fail_enumeration: bool,
    }

    struct ScriptedProbe {
        script: Arc<parking_lot::Mutex<Script>>,
        cores: usize,
    }

    impl ProcessProbe for ScriptedProbe {
        fn processes(&mut self) -> Result<Vec<ProcessSample>> {
            let script = self.script.lock();
            if script.fail_enumeration {
                return Err(PulseError::Probe("enumeration unavailable".into()));
            }
            Ok(script.processes.clone())
        }

        fn process_cpu_percent(&mut self, name: &str) -> Result<f32> {
            self.script
                .lock()
                .cpu_by_name
                .get(name)
                .copied()
                .ok_or_else(|| PulseError::Probe(format!("process '{name}' is gone")))
        }

        fn logical_cores(&self) -> usize {
            self.cores
        }
    }

    struct Rig {
        detector: SpikeDetector,
        registry: Arc<SpikeRegistry>,
        script: Arc<parking_lot::Mutex<Script>>,
    }

    impl Rig {
        fn new(cores: usize) -> Self {
            let script = Arc::new(parking_lot::Mutex::new(Script::default()));
            let registry = Arc::new(SpikeRegistry::new());
            let probe = ScriptedProbe {
                script: Arc::clone(&script),
                cores,
            };
            Self {
                detector: SpikeDetector::new(Box::new(probe), Arc::clone(&registry)),
                registry,
                script,
            }
        }

        fn with_process(self, pid: u32, name: &str, cpu_time_secs: f64, cpu: f32) -> Self {
            {
                let mut script = self.script.lock();
                script.processes.push(ProcessSample {
                    pid,
                    name: name.to_string(),
                    cpu_time_secs,
                });
                script.cpu_by_name.insert(name.to_string(), cpu);
            }
            self
        }

        fn set_cpu(&self, name: &str, cpu: f32) {
            self.script.lock().cpu_by_name.insert(name.to_string(), cpu);
        }
    }

    #[test]
    fn first_cycle_is_cold_second_can_spike() {
        let mut rig = Rig::new(1).with_process(10, "stress", 30.0, 2.0);

        rig.detector.run_cycle();
        assert!(rig.registry.latest().is_empty());

        rig.set_cpu("stress", 10.0);
        rig.detector.run_cycle();

        let spikes = rig.registry.latest();
        assert_eq!(spikes.len(), 1);
        assert_eq!(spikes[0].pid, 10);
        assert_eq!(spikes[0].baseline, 2.0);
        assert_eq!(spikes[0].current, 10.0);
        assert_eq!(spikes[0].multiplier, 5.0);
    }

    #[test]
    fn baseline_floor_is_strict() {
        // Baseline exactly 1.0: never a spike, however large the reading.
        let mut rig = Rig::new(1).with_process(1, "idleish", 10.0, 1.0);
        rig.detector.run_cycle();

        rig.set_cpu("idleish", 100.0);
        rig.detector.run_cycle();
        assert!(rig.registry.latest().is_empty());
    }

    #[test]
    fn ratio_boundary_is_strict() {
        // current == baseline * 2.5 exactly: not a spike.
        let mut rig = Rig::new(1).with_process(1, "svc", 10.0, 10.0);
        rig.detector.run_cycle();

        rig.set_cpu("svc", 25.0);
        rig.detector.run_cycle();
        assert!(rig.registry.latest().is_empty());
    }

    #[test]
    fn absolute_floor_is_strict() {
        // current == 5.0 exactly: not a spike even with the ratio cleared.
        let mut rig = Rig::new(1).with_process(1, "svc", 10.0, 1.9);
        rig.detector.run_cycle();

        rig.set_cpu("svc", 5.0);
        rig.detector.run_cycle();
        assert!(rig.registry.latest().is_empty());
    }

    #[test]
    fn comparison_uses_pre_update_baseline() {
        let mut rig = Rig::new(1).with_process(1, "svc", 10.0, 4.0);
        rig.detector.run_cycle();

        // Pre-update baseline 4.0: 11 > 4.0 * 2.5 passes. The post-update
        // value would be 0.1*11 + 0.9*4 = 4.7, and 11 > 4.7 * 2.5 fails.
        rig.set_cpu("svc", 11.0);
        rig.detector.run_cycle();

        let spikes = rig.registry.latest();
        assert_eq!(spikes.len(), 1);
        assert_eq!(spikes[0].baseline, 4.0);
    }

    #[test]
    fn normalizes_by_core_count() {
        let mut rig = Rig::new(4).with_process(1, "svc", 10.0, 8.0);
        rig.detector.run_cycle();

        // Raw 40 % over 4 cores is 10 % of one core against a 2 % baseline.
        rig.set_cpu("svc", 40.0);
        rig.detector.run_cycle();

        let spikes = rig.registry.latest();
        assert_eq!(spikes.len(), 1);
        assert_eq!(spikes[0].current, 10.0);
        assert_eq!(spikes[0].multiplier, 5.0);
    }

    #[test]
    fn enumeration_failure_leaves_registry_untouched() {
        let mut rig = Rig::new(1).with_process(10, "stress", 30.0, 2.0);
        rig.detector.run_cycle();
        rig.set_cpu("stress", 10.0);
        rig.detector.run_cycle();
        assert_eq!(rig.registry.latest().len(), 1);

        rig.script.lock().fail_enumeration = true;
        rig.detector.run_cycle();

        // Previous results stay visible, baselines survive.
        assert_eq!(rig.registry.latest().len(), 1);
        assert_eq!(rig.detector.baselines.len(), 1);
    }

    #[test]
    fn vanished_process_is_skipped_not_fatal() {
        let mut rig = Rig::new(1)
            .with_process(1, "gone", 10.0, 3.0)
            .with_process(2, "alive", 10.0, 2.0);
        // "gone" exits between enumeration and its CPU query.
        rig.script.lock().cpu_by_name.remove("gone");
        rig.detector.run_cycle();

        rig.set_cpu("alive", 10.0);
        rig.detector.run_cycle();

        let spikes = rig.registry.latest();
        assert_eq!(spikes.len(), 1);
        assert_eq!(spikes[0].name, "alive");
        // The vanished process never got a baseline.
        assert_eq!(rig.detector.baselines.len(), 1);
    }

    #[test]
    fn negligible_cpu_time_is_filtered_but_kept_alive() {
        let mut rig = Rig::new(1).with_process(1, "svc", 10.0, 4.0);
        rig.detector.run_cycle();
        assert_eq!(rig.detector.baselines.len(), 1);

        // Dropping to the cumulative-time floor skips the process without
        // evicting its baseline (it is still in the enumeration).
        rig.script.lock().processes[0].cpu_time_secs = 1.0;
        rig.detector.run_cycle();
        assert_eq!(rig.detector.baselines.len(), 1);

        rig.script.lock().processes[0].cpu_time_secs = 10.0;
        rig.set_cpu("svc", 11.0);
        rig.detector.run_cycle();
        assert_eq!(rig.registry.latest().len(), 1);
    }

    #[test]
    fn registry_is_replaced_wholesale() {
        let mut rig = Rig::new(1).with_process(10, "stress", 30.0, 2.0);
        rig.detector.run_cycle();
        rig.set_cpu("stress", 10.0);
        rig.detector.run_cycle();
        assert_eq!(rig.registry.latest().len(), 1);

        // Back to baseline-ish usage: the next cycle publishes an empty set.
        rig.set_cpu("stress", 2.0);
        rig.detector.run_cycle();
        assert!(rig.registry.latest().is_empty());
    }
}
