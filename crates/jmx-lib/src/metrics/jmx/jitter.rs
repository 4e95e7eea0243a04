use super::matching::MatchedPair;
use crate::metrics::stats::median_abs_deviation;
use serde::{Deserialize, Serialize};

/// How a matched (detection, annotation) pair turns into a jitter sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JitterMode {
    /// Absolute offset between a detection and the annotation it claimed.
    Positional,
    /// Difference between consecutive detected and annotated intervals.
    #[default]
    Interval,
}

/// Jitter samples in seconds for the pairs produced by matching detections
/// onto annotations. Pairs must be in claim order.
pub fn jitter_samples(pairs: &[MatchedPair], fs: f64, mode: JitterMode) -> Vec<f64> {
    match mode {
        JitterMode::Positional => pairs
            .iter()
            .map(|p| (p.source_value - p.target_value).abs() as f64 / fs)
            .collect(),
        JitterMode::Interval => pairs
            .windows(2)
            .map(|w| {
                let detected = w[1].source_value - w[0].source_value;
                let annotated = w[1].target_value - w[0].target_value;
                (detected - annotated) as f64 / fs
            })
            .collect(),
    }
}

/// Median absolute deviation of the samples; `None` when there are none.
pub fn jitter_statistic(samples: &[f64], mad_scale: f64) -> Option<f64> {
    median_abs_deviation(samples, mad_scale)
}
