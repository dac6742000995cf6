//! Error types for brr-speedtest.

use thiserror::Error;

use crate::data::Phase;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to build HTTP transport: {0}")]
    TransportSetup(String),

    #[error("failed to generate upload payload: {0}")]
    RandomSource(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected HTTP status {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("no usable samples: all {attempted} latency probes failed")]
    NoUsableSamples { attempted: usize },

    #[error("{phase}: {source}")]
    Phase {
        phase: Phase,
        #[source]
        source: Box<Error>,
    },

    #[error("measurement cancelled")]
    Cancelled,
}

impl Error {
    /// Wrap `self` with the phase it happened in.
    ///
    /// Cancellation is returned untouched so callers can always tell an
    /// aborted run from a broken one.
    pub fn in_phase(self, phase: Phase) -> Self {
        match self {
            Error::Cancelled => Error::Cancelled,
            other => Error::Phase {
                phase,
                source: Box::new(other),
            },
        }
    }

    /// Returns `true` if the run was aborted through its cancellation token.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Error::Cancelled => true,
            Error::Phase { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }

    /// The phase a fatal error was raised in, if it was wrapped.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Error::Phase { phase, .. } => Some(*phase),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_is_never_wrapped() {
        let err = Error::Cancelled.in_phase(Phase::Download);
        assert!(matches!(err, Error::Cancelled));
        assert!(err.is_cancelled());
        assert_eq!(err.phase(), None);
    }

    #[test]
    fn test_phase_context_is_attached() {
        let err = Error::NoUsableSamples { attempted: 20 }.in_phase(Phase::Latency);
        assert_eq!(err.phase(), Some(Phase::Latency));
        assert!(!err.is_cancelled());
        assert_eq!(
            err.to_string(),
            "latency: no usable samples: all 20 latency probes failed"
        );
    }
}
