use crate::core::stats::median;
use crate::data::{BufferbloatGrade, LatencyResult};

/// Upper bounds (exclusive, in ms of added latency) for each grade but the last.
const GRADE_THRESHOLDS: [(f64, BufferbloatGrade); 5] = [
    (5.0, BufferbloatGrade::APlus),
    (30.0, BufferbloatGrade::A),
    (60.0, BufferbloatGrade::B),
    (200.0, BufferbloatGrade::C),
    (400.0, BufferbloatGrade::D),
];

/// Map an RTT increase in milliseconds to a grade.
///
/// # Examples
///
/// ```
/// use brr_speedtest::BufferbloatGrade;
/// use brr_speedtest::core::grade_from_delta;
///
/// assert_eq!(grade_from_delta(4.9), BufferbloatGrade::APlus);
/// assert_eq!(grade_from_delta(30.0), BufferbloatGrade::B);
/// assert_eq!(grade_from_delta(400.0), BufferbloatGrade::F);
/// ```
pub fn grade_from_delta(delta_ms: f64) -> BufferbloatGrade {
    GRADE_THRESHOLDS
        .iter()
        .find(|(limit, _)| delta_ms < *limit)
        .map(|(_, grade)| *grade)
        .unwrap_or(BufferbloatGrade::F)
}

/// Grade the latency increase between idle and loaded measurements.
///
/// A missing input grades `F`. A loaded measurement without samples
/// grades `A+`. Otherwise the difference of the medians, clamped at zero,
/// goes through [`grade_from_delta`].
pub fn bufferbloat_grade(
    idle: Option<&LatencyResult>,
    loaded: Option<&LatencyResult>,
) -> BufferbloatGrade {
    let (Some(idle), Some(loaded)) = (idle, loaded) else {
        return BufferbloatGrade::F;
    };
    if loaded.is_empty() {
        return BufferbloatGrade::APlus;
    }

    let delta = median(&loaded.rtts()) - median(&idle.rtts());
    grade_from_delta(delta.max(0.0))
}

/// One-sentence verdict for a run. The first matching row wins.
pub fn context_line(download_mbps: f64, upload_mbps: f64, grade: BufferbloatGrade) -> &'static str {
    use BufferbloatGrade::*;

    let low_bloat = matches!(grade, APlus | A | B);
    let some_bloat = matches!(grade, C | D);

    if download_mbps >= 100.0 && upload_mbps >= 20.0 && matches!(grade, APlus | A) {
        "Excellent for 4K streaming, video calls, and gaming"
    } else if download_mbps >= 25.0 && low_bloat {
        "Great for 4K streaming and video calls"
    } else if download_mbps >= 25.0 && some_bloat {
        "Good speeds, but bufferbloat may affect video calls and gaming"
    } else if download_mbps >= 5.0 && low_bloat {
        "Good for HD streaming and video calls"
    } else if download_mbps >= 5.0 && some_bloat {
        "OK for HD streaming, bufferbloat may affect video calls"
    } else if download_mbps >= 1.0 {
        "Sufficient for basic browsing and SD streaming"
    } else {
        "Connection is very slow, may have trouble with most activities"
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::data::LatencySample;

    fn latency(rtts: &[f64]) -> LatencyResult {
        LatencyResult::from_samples(
            rtts.iter()
                .enumerate()
                .map(|(i, &rtt_ms)| LatencySample {
                    timestamp: Duration::from_millis(i as u64 * 400),
                    rtt_ms,
                })
                .collect(),
        )
    }

    #[test]
    fn test_bufferbloat_grade_cases() {
        let idle = latency(&[10.0, 12.0, 11.0]);
        let cases = [
            (&[12.0, 13.0, 14.0], BufferbloatGrade::APlus),
            (&[30.0, 35.0, 40.0], BufferbloatGrade::A),
            (&[60.0, 65.0, 70.0], BufferbloatGrade::B),
            (&[150.0, 200.0, 250.0], BufferbloatGrade::C),
            (&[350.0, 400.0, 450.0], BufferbloatGrade::D),
            (&[500.0, 600.0, 700.0], BufferbloatGrade::F),
        ];

        for (loaded, want) in cases {
            let got = bufferbloat_grade(Some(&idle), Some(&latency(loaded)));
            assert_eq!(got, want, "loaded {loaded:?}");
        }
    }

    #[test]
    fn test_missing_input_is_f() {
        let loaded = latency(&[100.0]);
        assert_eq!(bufferbloat_grade(None, Some(&loaded)), BufferbloatGrade::F);
        assert_eq!(bufferbloat_grade(Some(&loaded), None), BufferbloatGrade::F);
    }

    #[test]
    fn test_empty_loaded_is_a_plus() {
        let idle = latency(&[10.0]);
        let loaded = LatencyResult::default();
        assert_eq!(
            bufferbloat_grade(Some(&idle), Some(&loaded)),
            BufferbloatGrade::APlus
        );
    }

    #[test]
    fn test_negative_delta_is_clamped() {
        let idle = latency(&[80.0, 90.0]);
        let loaded = latency(&[20.0, 25.0]);
        assert_eq!(
            bufferbloat_grade(Some(&idle), Some(&loaded)),
            BufferbloatGrade::APlus
        );
    }

    #[test]
    fn test_grade_thresholds_are_exclusive() {
        assert_eq!(grade_from_delta(0.0), BufferbloatGrade::APlus);
        assert_eq!(grade_from_delta(5.0), BufferbloatGrade::A);
        assert_eq!(grade_from_delta(59.99), BufferbloatGrade::B);
        assert_eq!(grade_from_delta(60.0), BufferbloatGrade::C);
        assert_eq!(grade_from_delta(200.0), BufferbloatGrade::D);
        assert_eq!(grade_from_delta(10_000.0), BufferbloatGrade::F);
    }

    #[test]
    fn test_context_line_rows() {
        use BufferbloatGrade::*;

        let cases = [
            (250.0, 40.0, APlus, "Excellent for 4K streaming, video calls, and gaming"),
            (250.0, 5.0, A, "Great for 4K streaming and video calls"),
            (250.0, 40.0, B, "Great for 4K streaming and video calls"),
            (50.0, 10.0, D, "Good speeds, but bufferbloat may affect video calls and gaming"),
            (10.0, 2.0, APlus, "Good for HD streaming and video calls"),
            (10.0, 2.0, C, "OK for HD streaming, bufferbloat may affect video calls"),
            (50.0, 10.0, F, "Sufficient for basic browsing and SD streaming"),
            (1.0, 0.5, A, "Sufficient for basic browsing and SD streaming"),
            (0.5, 0.1, APlus, "Connection is very slow, may have trouble with most activities"),
        ];

        for (dl, ul, grade, want) in cases {
            assert_eq!(context_line(dl, ul, grade), want, "dl={dl} ul={ul} grade={grade}");
        }
    }
}
