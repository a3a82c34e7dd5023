use thiserror::Error;

use crate::algorithm::Algorithm;

#[derive(Error, Debug)]
pub enum DigestError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An engine was driven outside its init → update* → finalize contract
    #[error("{algorithm} engine in invalid state: {reason}")]
    InvalidState {
        algorithm: Algorithm,
        reason: &'static str,
    },

    /// A worker thread stopped answering before the run completed
    #[error("{0} worker exited unexpectedly")]
    WorkerLost(Algorithm),

    #[error("algorithm {0} requested more than once")]
    DuplicateAlgorithm(Algorithm),

    #[error("no algorithms requested")]
    NoAlgorithms,

    #[error("chunk size must be greater than zero")]
    ZeroChunkSize,

    #[error("failed to spawn worker")]
    Spawn(#[source] std::io::Error),
}

impl DigestError {
    /// True for faults raised by an engine or its worker rather than by the
    /// byte source.
    pub fn is_algorithm_fault(&self) -> bool {
        !matches!(self, DigestError::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, DigestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_failure_keeps_cause() {
        let err = DigestError::Spawn(std::io::Error::other("too many threads"));
        assert!(err.is_algorithm_fault());
        let cause = std::error::Error::source(&err).map(|e| e.to_string());
        assert_eq!(cause.as_deref(), Some("too many threads"));
    }
}
