use thiserror::Error;

/// Error type shared by every crate in the workspace.
#[derive(Debug, Error)]
pub enum PulseError {
    #[error("config error: {0}")]
    Config(String),

    #[error("probe error: {0}")]
    Probe(String),

    #[error("export error: {0}")]
    Export(String),

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

pub type Result<T, E = PulseError> = std::result::Result<T, E>;
