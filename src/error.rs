use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by programmatic construction and the accelerated backend.
///
/// Configuration defects never reach this type: they are repaired by default
/// substitution when parameters are loaded.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid parameter handed to a constructor.
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    /// The accelerated backend could not build or run its kernels.
    #[error("accelerated backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Host and device particle buffers disagree in length.
    #[error("buffer length mismatch: expected {expected}, got {actual}")]
    BufferMismatch { expected: usize, actual: usize },
}
