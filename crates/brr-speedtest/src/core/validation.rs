/// Returns `true` if the HTTP status code is in the 2xx range.
///
/// Transfers and probes that get any other status are treated as failed.
///
/// # Examples
///
/// ```
/// use brr_speedtest::core::is_success;
///
/// assert!(is_success(200));
/// assert!(is_success(204));
/// assert!(!is_success(301));
/// assert!(!is_success(503));
/// ```
pub fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}
