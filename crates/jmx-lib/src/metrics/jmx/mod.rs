//! JMX analysis: jitter, missed beats and extra detections of a beat detector
//! against annotated ground truth, folded into a single score.
//!
//! The pipeline removes the detector's median delay, optionally trims the
//! edges of the recording, matches detections and annotations in both
//! directions, and derives jitter, confusion counts, accuracy and the
//! composite score `accuracy * jitter_score(jitter)`.

pub mod classify;
pub mod config;
pub mod confusion;
pub mod delay;
pub mod jitter;
pub mod matching;
pub mod score;
pub mod trim;

pub use classify::{classify_beats, BeatClassification, MissedBeat};
pub use config::JmxConfig;
pub use confusion::ConfusionCounts;
pub use delay::{correct_delay, estimate_delay};
pub use jitter::{jitter_samples, jitter_statistic, JitterMode};
pub use matching::{match_sequences, MatchedPair, NearestMatch, SequenceMatch};
pub use score::{jitter_score, jmx_score, JitterScoreMap};
pub use trim::{trim_after_detection, TrimMargins, Trimmed};

use crate::error::{JmxError, JmxResult, SequenceRole};
use crate::signal::normalize_positions;
use config::positive;
use serde::{Deserialize, Serialize};

/// Below this many events per side the result is flagged as low confidence.
pub const MIN_RELIABLE_EVENTS: usize = 10;

/// Non-fatal conditions attached to a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvaluationWarning {
    InsufficientData {
        detections: usize,
        annotations: usize,
    },
}

/// Result of evaluating one detector on one recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JmxReport {
    /// Median absolute deviation of the jitter samples (seconds).
    #[serde(rename = "jitter_seconds")]
    pub jitter_s: Option<f64>,
    pub accuracy: Option<f64>,
    /// `accuracy * jitter_score(jitter)`.
    #[serde(rename = "score")]
    pub jmx: Option<f64>,
    #[serde(flatten)]
    pub counts: ConfusionCounts,
    /// Delay subtracted from the detections before matching.
    pub delay_samples: i64,
    pub annotations_considered: usize,
    pub detections_considered: usize,
    pub jitter_sample_count: usize,
    pub missed_beats: Vec<MissedBeat>,
    pub extra_beats: Vec<i64>,
    #[serde(default)]
    pub warnings: Vec<EvaluationWarning>,
}

impl JmxReport {
    pub fn is_low_confidence(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, EvaluationWarning::InsufficientData { .. }))
    }
}

/// Evaluates `detected` against `annotated` for a recording of `n_samples`
/// samples at `fs` Hz.
///
/// Inputs are sorted and de-duplicated first. Positions after delay
/// correction are in annotation time.
pub fn evaluate(
    detected: &[i64],
    annotated: &[i64],
    fs: f64,
    n_samples: usize,
    cfg: &JmxConfig,
) -> JmxResult<JmxReport> {
    cfg.validate()?;
    positive("sampling_rate", fs)?;
    if n_samples == 0 {
        return Err(JmxError::InvalidParameter {
            name: "recording_length_samples",
            value: 0.0,
        });
    }

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

    let delay = estimate_delay(&detected, &annotated);
    let corrected = correct_delay(&detected, delay);

    let Trimmed {
        detections,
        annotations,
    } = if cfg.trim {
        trim_after_detection(&corrected, &annotated, cfg.margins())?
    } else {
        Trimmed {
            detections: corrected,
            annotations: annotated,
        }
    };

    let mut warnings = Vec::new();
    if detections.len() < MIN_RELIABLE_EVENTS || annotations.len() < MIN_RELIABLE_EVENTS {
        warnings.push(EvaluationWarning::InsufficientData {
            detections: detections.len(),
            annotations: annotations.len(),
        });
    }

    let used_anno = match_sequences(&detections, &annotations).used;
    let used_det = match_sequences(&annotations, &detections).used;
    let BeatClassification {
        missed_beats,
        extra_beats,
    } = classify_beats(&detections, &annotations, &used_anno, &used_det);

    let samples = jitter_samples(&used_anno, fs, cfg.jitter_mode);
    let jitter_s = jitter_statistic(&samples, cfg.mad_scale);

    let counts = ConfusionCounts::estimate(
        used_anno.len(),
        annotations.len(),
        detections.len(),
        n_samples as f64 / fs,
        cfg.max_heart_rate_bpm,
    );
    let accuracy = counts.accuracy();
    let jmx = match (jitter_s, accuracy) {
        (Some(j), Some(a)) => Some(jmx_score(j, a, cfg.reference_jitter_s)),
        _ => None,
    };

    Ok(JmxReport {
        jitter_s,
        accuracy,
        jmx,
        counts,
        delay_samples: delay,
        annotations_considered: annotations.len(),
        detections_considered: detections.len(),
        jitter_sample_count: samples.len(),
        missed_beats,
        extra_beats,
        warnings,
    })
}
