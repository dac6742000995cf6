use std::fmt;

use serde::{Deserialize, Serialize};

/// Phases of a measurement run.
///
/// A run progresses through these phases strictly in order and never goes
/// back: Meta → Latency → Download → Upload → Done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Resolving the server and client identity.
    Meta,

    /// Sequential idle round-trip probes, before any load.
    Latency,

    /// Parallel downloads with loaded-latency probing alongside.
    Download,

    /// Parallel uploads with loaded-latency probing alongside.
    Upload,

    /// The result is complete.
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Meta => write!(f, "meta"),
            Phase::Latency => write!(f, "latency"),
            Phase::Download => write!(f, "download"),
            Phase::Upload => write!(f, "upload"),
            Phase::Done => write!(f, "done"),
        }
    }
}
