use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use pulse_core::{PulseError, Result};

/// Root configuration structure parsed from `hostpulse.toml`.
///
/// Cadences and window sizes are tunable; the spike-detection thresholds are
/// fixed policy and have no configuration surface.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PulseConfig {
    /// Sampling and detection cadence settings.
    pub sampling: SamplingConfig,
    /// Snapshot export settings.
    pub export: ExportConfig,
}

impl PulseConfig {
    /// Reject values the engine cannot run with.
    pub fn validated(self) -> Result<Self> {
        if self.sampling.interval_ms == 0 {
            return Err(PulseError::Config(
                "sampling.interval_ms must be at least 1".into(),
            ));
        }
        if self.sampling.detect_every == 0 {
            return Err(PulseError::Config(
                "sampling.detect_every must be at least 1".into(),
            ));
        }
        if self.sampling.history_size == 0 {
            return Err(PulseError::Config(
                "sampling.history_size must be at least 1".into(),
            ));
        }
        Ok(self)
    }
}

/// Sampling cadence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Sampling tick interval in milliseconds.
    pub interval_ms: u64,
    /// Run one spike-detection cycle every Nth sampling tick.
    pub detect_every: u64,
    /// Number of samples retained per metric stream.
    pub history_size: usize,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1_000,
            detect_every: 5,
            history_size: 120,
        }
    }
}

/// Snapshot export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory snapshot files are written into.
    pub directory: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
        }
    }
}
