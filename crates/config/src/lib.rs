pub mod schema;

pub use schema::{ExportConfig, PulseConfig, SamplingConfig};

use pulse_core::{PulseError, Result};
use std::path::{Path, PathBuf};

/// Load and validate configuration from a TOML file.
///
/// A missing file is not an error: the monitor runs fine on defaults, so the
/// loader warns and falls back. A file that exists but does not parse, or
/// that carries values the engine cannot run with, is rejected.
pub fn load(path: impl AsRef<Path>) -> Result<PulseConfig> {
    let path = path.as_ref();
    let config = if path.exists() {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| PulseError::Config(format!("cannot read '{}': {e}", path.display())))?;
        toml::from_str(&raw).map_err(|e| PulseError::Config(format!("TOML parse error: {e}")))?
    } else {
        tracing::warn!("no config file at '{}'; using defaults", path.display());
        PulseConfig::default()
    };
    config.validated()
}

/// Default config path: `$XDG_CONFIG_HOME/hostpulse/hostpulse.toml`.
pub fn default_path() -> PathBuf {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let home = std::env::var_os("HOME").map_or_else(|| PathBuf::from("."), PathBuf::from);
            home.join(".config")
        })
        .join("hostpulse")
        .join("hostpulse.toml")
}
