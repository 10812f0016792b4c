pub mod baseline;
pub mod engine;
pub mod history;
pub mod spike;

pub use baseline::{BaselineTracker, Observation};
pub use engine::{EngineOptions, MonitorHandle, SamplingEngine};
pub use history::MetricHistory;
pub use spike::{SpikeDetector, SpikeRegistry};
