use super::matching::correspond;
use crate::metrics::stats::median;

/// Median systematic delay of `detected` relative to `annotated`, in samples.
///
/// Each detection contributes `detected - nearest annotation`; the median of
/// those offsets is truncated toward zero. Subtracting the result from the
/// detections centres them on the annotations. Returns 0 when either side
/// is empty.
pub fn estimate_delay(detected: &[i64], annotated: &[i64]) -> i64 {
    let offsets: Vec<f64> = correspond(detected, annotated)
        .iter()
        .map(|m| -m.offset() as f64)
        .collect();
    median(&offsets).map(|m| m.trunc() as i64).unwrap_or(0)
}

/// Shifts every detection back by `delay` samples.
pub fn correct_delay(detected: &[i64], delay: i64) -> Vec<i64> {
    detected.iter().map(|&d| d - delay).collect()
}
