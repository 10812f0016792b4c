pub mod error;
pub mod state;

pub use error::{PulseError, Result};
pub use state::{top_spikes, ProcessSpike, Severity, SystemSnapshot};
