use super::matching::MatchedPair;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An annotated beat that no detection claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissedBeat {
    pub index: usize,
    pub position: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeatClassification {
    pub missed_beats: Vec<MissedBeat>,
    /// Detection positions that are not the nearest match of any annotation.
    pub extra_beats: Vec<i64>,
}

/// Splits beats into missed and extra using both matching directions.
///
/// `used_anno` comes from matching detections onto annotations,
/// `used_det` from matching annotations onto detections.
pub fn classify_beats(
    detections: &[i64],
    annotations: &[i64],
    used_anno: &[MatchedPair],
    used_det: &[MatchedPair],
) -> BeatClassification {
    let claimed: BTreeSet<usize> = used_anno.iter().map(|p| p.target_index).collect();
    let missed_beats = annotations
        .iter()
        .enumerate()
        .filter(|(idx, _)| !claimed.contains(idx))
        .map(|(index, &position)| MissedBeat { index, position })
        .collect();

    let paired: BTreeSet<i64> = used_det.iter().map(|p| p.target_value).collect();
    let extra_beats = detections
        .iter()
        .copied()
        .filter(|d| !paired.contains(d))
        .collect();

    BeatClassification {
        missed_beats,
        extra_beats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::jmx::matching::match_sequences;

    fn classify(detections: &[i64], annotations: &[i64]) -> BeatClassification {
        let used_anno = match_sequences(detections, annotations).used;
        let used_det = match_sequences(annotations, detections).used;
        classify_beats(detections, annotations, &used_anno, &used_det)
    }

    #[test]
    fn missed_beat_is_reported_by_position() {
        let out = classify(&[100, 600, 850], &[100, 350, 600, 850]);
        assert_eq!(
            out.missed_beats,
            vec![MissedBeat {
                index: 1,
                position: 350
            }]
        );
        assert!(out.extra_beats.is_empty());
    }

    #[test]
    fn extra_beat_is_reported() {
        let out = classify(&[100, 225, 350, 600], &[100, 350, 600]);
        assert_eq!(out.extra_beats, vec![225]);
        assert!(out.missed_beats.is_empty());
    }

    #[test]
    fn identical_sequences_are_clean() {
        let beats = [100, 350, 600, 850, 1100];
        let out = classify(&beats, &beats);
        assert_eq!(out, BeatClassification::default());
    }
}
