use std::ffi::OsStr;

use sysinfo::{ProcessesToUpdate, System};

use crate::{ProcessProbe, ProcessSample};
use pulse_core::{PulseError, Result};

/// Production [`ProcessProbe`] backed by `sysinfo`.
pub struct SysinfoProcessProbe {
    sys: System,
}

impl SysinfoProcessProbe {
    pub fn new() -> Self {
        // `new_all` primes the process table so per-process CPU deltas are
        // meaningful from the first real detection cycle onward.
        Self {
            sys: System::new_all(),
        }
    }
}

impl Default for SysinfoProcessProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessProbe for SysinfoProcessProbe {
    fn processes(&mut self) -> Result<Vec<ProcessSample>> {
        self.sys.refresh_processes(ProcessesToUpdate::All, true);

        Ok(self
            .sys
            .processes()
            .values()
            .map(|p| ProcessSample {
                pid: p.pid().as_u32(),
                name: p.name().to_string_lossy().into_owned(),
                cpu_time_secs: p.accumulated_cpu_time() as f64 / 1000.0,
            })
            .collect())
    }

    fn process_cpu_percent(&mut self, name: &str) -> Result<f32> {
        // Several processes may share a name; report the busiest instance.
        self.sys
            .processes_by_exact_name(OsStr::new(name))
            .map(|p| p.cpu_usage())
            .max_by(f32::total_cmp)
            .ok_or_else(|| PulseError::Probe(format!("process '{name}' is gone")))
    }

    fn logical_cores(&self) -> usize {
        self.sys.cpus().len()
    }
}
