//! Tolerance-window detection statistics (sensitivity / PPV / F1).

use crate::error::{JmxError, JmxResult, SequenceRole};
use crate::metrics::jmx::estimate_delay;
use crate::signal::normalize_positions;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensitivityResult {
    pub delay_samples: i64,
    pub tolerance_samples: i64,
    pub true_positive: usize,
    pub false_positive: usize,
    pub false_negative: usize,
    /// Samples neither detected nor annotated.
    pub true_negative: usize,
    pub sensitivity: Option<f64>,
    pub positive_predictivity: Option<f64>,
    pub f1: Option<f64>,
}

fn ratio(num: usize, den: usize) -> Option<f64> {
    if den == 0 {
        None
    } else {
        Some(num as f64 / den as f64)
    }
}

/// Counts an annotation as detected when any detection falls within
/// `tolerance_samples` of the annotation shifted by the detector delay.
pub fn evaluate_sensitivity(
    detected: &[i64],
    annotated: &[i64],
    tolerance_samples: i64,
    n_samples: usize,
) -> JmxResult<SensitivityResult> {
    let detected = normalize_positions(detected);
    let annotated = normalize_positions(annotated);
    if detected.is_empty() {
        return Err(JmxError::EmptySequence {
            which: SequenceRole::Detected,
        });
    }
    if annotated.is_empty() {
        return Err(JmxError::EmptySequence {
            which: SequenceRole::Annotated,
        });
    }
    if tolerance_samples < 0 {
        return Err(JmxError::InvalidParameter {
            name: "tolerance_samples",
            value: tolerance_samples as f64,
        });
    }

    let delay = estimate_delay(&detected, &annotated);
    let tp = annotated
        .iter()
        .filter(|&&a| {
            let lo = a + delay - tolerance_samples;
            let hi = a + delay + tolerance_samples;
            let first = detected.partition_point(|&d| d < lo);
            first < detected.len() && detected[first] <= hi
        })
        .count()
        .min(detected.len());
    let fp = detected.len() - tp;
    let fn_ = annotated.len() - tp;
    let tn = n_samples.saturating_sub(tp + fp + fn_);

    let sensitivity = ratio(tp, tp + fn_);
    let positive_predictivity = ratio(tp, tp + fp);
    let f1 = ratio(2 * tp, 2 * tp + fp + fn_);

    Ok(SensitivityResult {
        delay_samples: delay,
        tolerance_samples,
        true_positive: tp,
        false_positive: fp,
        false_negative: fn_,
        true_negative: tn,
        sensitivity,
        positive_predictivity,
        f1,
    })
}
