//! Pure computations over measurement data.
//!
//! Nothing in this module performs I/O or reads a clock: every function is
//! a deterministic transformation of its inputs, so results can always be
//! recomputed from their stored samples.

mod grade;
mod payload;
mod server_timing;
mod stats;
mod trace;
mod validation;
mod warmup;

pub use grade::{bufferbloat_grade, context_line, grade_from_delta};
pub use payload::{PAYLOAD_CHUNK_SIZE, PAYLOAD_SEED_SIZE, payload_chunks};
pub use server_timing::{SERVER_TIMING_HEADER, server_processing_ms};
pub use stats::{jitter, mbps, mean, median, percentile};
pub use trace::{TraceInfo, colo_city};
pub use validation::is_success;
pub use warmup::discard_warmup;
