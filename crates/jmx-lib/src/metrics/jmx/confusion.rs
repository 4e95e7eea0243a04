use serde::{Deserialize, Serialize};

/// Confusion counts adapted to point events. TN is an estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfusionCounts {
    #[serde(rename = "true_positive")]
    pub tp: usize,
    #[serde(rename = "true_negative")]
    pub tn: f64,
    #[serde(rename = "false_positive")]
    pub fp: usize,
    #[serde(rename = "false_negative")]
    pub fn_: usize,
}

impl ConfusionCounts {
    /// Builds counts from the number of matched pairs and the sizes of the
    /// compared sequences, estimating TN from the number of beat slots the
    /// recording could hold at `max_heart_rate_bpm`.
    ///
    /// TN is clamped at zero, so for recordings too short to hold the counted
    /// beats the accuracy differs from the unclamped formula.
    pub fn estimate(
        matched: usize,
        annotations: usize,
        detections: usize,
        duration_s: f64,
        max_heart_rate_bpm: f64,
    ) -> Self {
        let tp = matched;
        let fn_ = annotations.saturating_sub(matched);
        let fp = detections.saturating_sub(matched);
        let max_beats = duration_s * max_heart_rate_bpm / 60.0;
        let tn = (max_beats - (tp + fp + fn_) as f64).max(0.0);
        Self { tp, tn, fp, fn_ }
    }

    pub fn total(&self) -> f64 {
        (self.tp + self.fp + self.fn_) as f64 + self.tn
    }

    /// (TP + TN) / total, undefined for an empty total.
    pub fn accuracy(&self) -> Option<f64> {
        let total = self.total();
        if total > 0.0 {
            Some((self.tp as f64 + self.tn) / total)
        } else {
            None
        }
    }
}
