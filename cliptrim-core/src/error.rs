use thiserror::Error;

/// All errors produced by cliptrim-core.
#[derive(Debug, Error)]
pub enum CliptrimError {
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("buffer offset discontinuity: expected sample {expected}, got {got}")]
    StreamPosition { expected: u64, got: u64 },

    #[error("allocation failed: {0}")]
    Allocation(String),

    #[error("invariant violated: {0}")]
    Invariant(String),

    #[error("downstream sink rejected buffer: {0}")]
    Downstream(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CliptrimError>;
