use std::time::Duration;

use crate::data::Sample;

/// Drop the samples taken within `window` of the first sample.
///
/// When every sample falls inside the window the second half of the list
/// is used instead, or the whole list when it holds two samples or fewer,
/// so a non-empty input never yields an empty output.
pub fn discard_warmup(samples: &[Sample], window: Duration) -> &[Sample] {
    let Some(first) = samples.first() else {
        return samples;
    };

    let cutoff = first.timestamp.saturating_add(window);
    if let Some(start) = samples.iter().position(|s| s.timestamp >= cutoff) {
        return &samples[start..];
    }

    if samples.len() > 2 {
        &samples[samples.len() / 2..]
    } else {
        samples
    }
}
