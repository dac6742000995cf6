/// Response header carrying the server's own processing time.
pub const SERVER_TIMING_HEADER: &str = "server-timing";

const REQUEST_DURATION_METRIC: &str = "cfRequestDuration";

/// Extract the server processing time in milliseconds from a
/// `Server-Timing` header value.
///
/// The header is a comma-separated list of `name;param=value` metrics; the
/// `dur` of the `cfRequestDuration` metric is used. Anything missing or
/// malformed gives `0.0`.
///
/// # Examples
///
/// ```
/// use brr_speedtest::core::server_processing_ms;
///
/// assert_eq!(server_processing_ms("cfRequestDuration;dur=12.5"), 12.5);
/// assert_eq!(server_processing_ms("cdn-cache;desc=HIT"), 0.0);
/// ```
pub fn server_processing_ms(header: &str) -> f64 {
    header
        .split(',')
        .filter_map(|metric| {
            let mut params = metric.split(';').map(str::trim);
            if params.next()? != REQUEST_DURATION_METRIC {
                return None;
            }
            params
                .filter_map(|param| param.strip_prefix("dur="))
                .find_map(|value| value.trim().parse::<f64>().ok())
        })
        .find(|dur| dur.is_finite() && *dur >= 0.0)
        .unwrap_or(0.0)
}
