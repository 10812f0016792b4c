pub mod process;
pub mod system;

mod disk;

pub use process::SysinfoProcessProbe;
pub use system::SysinfoSystemProbe;

use pulse_core::Result;

/// One entry from a process enumeration.
#[derive(Debug, Clone)]
pub struct ProcessSample {
    pub pid: u32,
    pub name: String,
    /// Cumulative CPU time consumed by the process so far, in seconds.
    pub cpu_time_secs: f64,
}

/// Readers for the four system-wide metric streams.
///
/// Owned exclusively by the sampling cadence; every reader may fail
/// (permission, platform, transient), in which case the affected stream
/// simply receives no sample that tick.
pub trait SystemProbe: Send {
    /// System-wide CPU usage (0.0 – 100.0).
    fn cpu_percent(&mut self) -> Result<f32>;

    /// Currently available memory in megabytes.
    fn available_memory_mb(&mut self) -> Result<f32>;

    /// Total physical memory in megabytes, queried once at construction.
    fn total_memory_mb(&self) -> f32;

    /// Aggregate `(read, write)` disk throughput in bytes/second.
    fn disk_throughput(&mut self) -> Result<(f64, f64)>;

    /// Aggregate `(recv, sent)` network throughput in bytes/second.
    fn network_throughput(&mut self) -> Result<(f64, f64)>;
}

/// Process enumeration and per-process CPU readings.
///
/// Owned exclusively by the detection worker for the duration of a cycle.
pub trait ProcessProbe: Send {
    /// Enumerate currently running processes. An error here aborts the
    /// whole detection cycle.
    fn processes(&mut self) -> Result<Vec<ProcessSample>>;

    /// Instantaneous CPU usage for the named process, as a percentage that
    /// may exceed 100 on multi-core hosts; the caller normalizes by
    /// [`ProcessProbe::logical_cores`]. An error here (the process exited
    /// mid-query) skips just that process.
    fn process_cpu_percent(&mut self, name: &str) -> Result<f32>;

    /// Number of logical processors.
    fn logical_cores(&self) -> usize;
}
