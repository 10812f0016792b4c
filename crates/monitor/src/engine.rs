use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time;
use tracing::debug;

use crate::history::MetricHistory;
use crate::spike::{SpikeDetector, SpikeRegistry};
use pulse_core::{ProcessSpike, SystemSnapshot};
use pulse_provider::{ProcessProbe, SystemProbe};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
const BYTES_PER_KB: f64 = 1024.0;

/// Cadence and capacity knobs. Detection thresholds are fixed policy and
/// deliberately absent.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Sampling tick interval.
    pub sample_interval: Duration,
    /// Run one detection cycle every Nth sampling tick.
    pub detect_every: u64,
    /// Capacity of each metric history window.
    pub history_capacity: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            sample_interval: Duration::from_secs(1),
            detect_every: 5,
            history_capacity: 120,
        }
    }
}

/// Read-side handle to a running [`SamplingEngine`].
///
/// Cheap to clone; safe to use from any thread. Consumers only ever receive
/// whole snapshots, never references into live engine state.
#[derive(Clone)]
pub struct MonitorHandle {
    snapshot_rx: watch::Receiver<SystemSnapshot>,
    registry: Arc<SpikeRegistry>,
}

impl MonitorHandle {
    /// Latest published system snapshot: current gauges plus the four
    /// history windows.
    #[must_use]
    pub fn latest_snapshot(&self) -> SystemSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Latest published spike set, in arrival order. Rank with
    /// [`pulse_core::top_spikes`] for presentation.
    #[must_use]
    pub fn latest_spikes(&self) -> Vec<ProcessSpike> {
        self.registry.latest()
    }
}

/// The orchestrator: a fixed sampling cadence feeding four rolling metric
/// histories, plus a slower detection cadence that runs at most one
/// asynchronous spike-detection cycle at a time.
pub struct SamplingEngine {
    system: Box<dyn SystemProbe>,
    options: EngineOptions,
    ram_total_mb: f32,

    cpu: MetricHistory,
    ram: MetricHistory,
    disk: MetricHistory,
    net: MetricHistory,

    cpu_now: f32,
    ram_used_now: f32,
    disk_now: f32,
    net_now: f32,

    tick_count: u64,
    /// Detector slot, doubling as the in-flight guard: an empty slot means a
    /// detection cycle is running and new triggers are dropped.
    detector: Option<SpikeDetector>,
    done_tx: mpsc::Sender<SpikeDetector>,
    done_rx: Option<mpsc::Receiver<SpikeDetector>>,

    snapshot_tx: watch::Sender<SystemSnapshot>,
}

impl SamplingEngine {
    pub fn new(
        system: Box<dyn SystemProbe>,
        process: Box<dyn ProcessProbe>,
        options: EngineOptions,
    ) -> (Self, MonitorHandle) {
        let options = EngineOptions {
            detect_every: options.detect_every.max(1),
            ..options
        };
        let registry = Arc::new(SpikeRegistry::new());
        let detector = SpikeDetector::new(process, Arc::clone(&registry));
        let ram_total_mb = system.total_memory_mb();

        let (snapshot_tx, snapshot_rx) = watch::channel(SystemSnapshot {
            ram_total_mb,
            ..SystemSnapshot::default()
        });
        let (done_tx, done_rx) = mpsc::channel(1);

        let capacity = options.history_capacity;
        let engine = Self {
            system,
            options,
            ram_total_mb,
            cpu: MetricHistory::new(capacity),
            ram: MetricHistory::new(capacity),
            disk: MetricHistory::new(capacity),
            net: MetricHistory::new(capacity),
            cpu_now: 0.0,
            ram_used_now: 0.0,
            disk_now: 0.0,
            net_now: 0.0,
            tick_count: 0,
            detector: Some(detector),
            done_tx,
            done_rx: Some(done_rx),
            snapshot_tx,
        };
        let handle = MonitorHandle {
            snapshot_rx,
            registry,
        };
        (engine, handle)
    }

    /// Construct an engine and detach it onto the runtime, returning only
    /// the consumer handle. The engine stops once every handle is dropped.
    pub fn spawn(
        system: Box<dyn SystemProbe>,
        process: Box<dyn ProcessProbe>,
        options: EngineOptions,
    ) -> MonitorHandle {
        let (engine, handle) = Self::new(system, process, options);
        tokio::spawn(engine.run());
        handle
    }

    /// Drive the engine until every snapshot receiver is dropped.
    pub async fn run(mut self) {
        let mut ticker = time::interval(self.options.sample_interval);
        let Some(mut done_rx) = self.done_rx.take() else {
            return;
        };

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if !self.on_tick() {
                        debug!("all snapshot receivers dropped; sampling engine stopping");
                        break;
                    }
                }
                Some(detector) = done_rx.recv() => self.on_detection_done(detector),
            }
        }
    }

    /// One sampling tick: read the four system metrics, feed the histories,
    /// fire the detection cadence, publish a fresh snapshot.
    ///
    /// Returns `false` once no consumer is left to publish to.
    fn on_tick(&mut self) -> bool {
        match self.system.cpu_percent() {
            Ok(pct) => {
                self.cpu_now = pct;
                self.cpu.push(pct);
            }
            Err(e) => debug!("no CPU sample this tick: {e}"),
        }

        match self.system.available_memory_mb() {
            Ok(available) => {
                self.ram_used_now = (self.ram_total_mb - available).max(0.0);
                let pct = if self.ram_total_mb > 0.0 {
                    self.ram_used_now / self.ram_total_mb * 100.0
                } else {
                    0.0
                };
                self.ram.push(pct);
            }
            Err(e) => debug!("no memory sample this tick: {e}"),
        }

        match self.system.disk_throughput() {
            Ok((read, write)) => {
                self.disk_now = ((read + write) / BYTES_PER_MB) as f32;
                self.disk.push(self.disk_now);
            }
            Err(e) => debug!("no disk sample this tick: {e}"),
        }

        match self.system.network_throughput() {
            Ok((rx, tx)) => {
                self.net_now = ((rx + tx) / BYTES_PER_KB) as f32;
                self.net.push(self.net_now);
            }
            Err(e) => debug!("no network sample this tick: {e}"),
        }

        self.tick_count += 1;
        if self.tick_count % self.options.detect_every == 0 {
            self.trigger_detection();
        }

        self.snapshot_tx.send(self.snapshot()).is_ok()
    }

    /// Launch one detection cycle on a blocking worker, unless a cycle is
    /// already in flight — then the trigger is dropped, never queued.
    fn trigger_detection(&mut self) {
        let Some(mut detector) = self.detector.take() else {
            debug!(tick = self.tick_count, "detection still in flight; trigger dropped");
            return;
        };

        let done = self.done_tx.clone();
        tokio::task::spawn_blocking(move || {
            detector.run_cycle();
            // The engine holds the receiver for as long as it runs; if it is
            // gone, the detector state no longer matters.
            let _ = done.blocking_send(detector);
        });
    }

    /// Completion callback, run back on the sampling cadence: restoring the
    /// slot re-arms the detection trigger.
    fn on_detection_done(&mut self, detector: SpikeDetector) {
        self.detector = Some(detector);
    }

    fn snapshot(&self) -> SystemSnapshot {
        SystemSnapshot {
            cpu_percent: self.cpu_now,
            ram_used_mb: self.ram_used_now,
            ram_total_mb: self.ram_total_mb,
            disk_mbps: self.disk_now,
            net_kbps: self.net_now,
            cpu_history: self.cpu.snapshot(),
            ram_history: self.ram.snapshot(),
            disk_history: self.disk.snapshot(),
            net_history: self.net.snapshot(),
        }
    }
}
