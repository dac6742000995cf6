use std::time::Duration;

/// The `p`-th percentile (`0.0..=1.0`) of `data`.
///
/// Sorts a copy ascending and interpolates linearly between the two
/// closest ranks, `rank = p * (n - 1)`. `p <= 0` gives the minimum,
/// `p >= 1` the maximum, an empty slice gives `0.0`.
///
/// # Examples
///
/// ```
/// use brr_speedtest::core::percentile;
///
/// let data: Vec<f64> = (1..=10).map(f64::from).collect();
/// assert!((percentile(&data, 0.90) - 9.1).abs() < 1e-9);
/// assert_eq!(percentile(&data, 0.0), 1.0);
/// assert_eq!(percentile(&data, 1.0), 10.0);
/// ```
pub fn percentile(data: &[f64], p: f64) -> f64 {
    if data.is_empty() {
        return 0.0;
    }

    let mut sorted = data.to_vec();
    sorted.sort_by(f64::total_cmp);

    let last = sorted.len() - 1;
    if p <= 0.0 {
        return sorted[0];
    }
    if p >= 1.0 {
        return sorted[last];
    }

    let rank = p * last as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if upper > last || lower == upper {
        return sorted[lower.min(last)];
    }

    let frac = rank - lower as f64;
    sorted[lower] * (1.0 - frac) + sorted[upper] * frac
}

pub fn median(data: &[f64]) -> f64 {
    percentile(data, 0.5)
}

pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Population standard deviation of `data`, used as the jitter measure.
///
/// Fewer than two values give `0.0`.
pub fn jitter(data: &[f64]) -> f64 {
    if data.len() < 2 {
        return 0.0;
    }

    let avg = mean(data);
    let sum_sq: f64 = data.iter().map(|v| (v - avg).powi(2)).sum();
    (sum_sq / data.len() as f64).sqrt()
}

/// Megabits per second for `bytes` moved over `elapsed`.
///
/// Returns `None` unless both the byte delta and the time delta are
/// positive.
pub fn mbps(bytes: u64, elapsed: Duration) -> Option<f64> {
    let secs = elapsed.as_secs_f64();
    if bytes == 0 || secs <= 0.0 {
        return None;
    }
    Some(bytes as f64 * 8.0 / secs / 1e6)
}
