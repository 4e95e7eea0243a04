//! Nearest-neighbour correspondence between two sorted event sequences.

use serde::{Deserialize, Serialize};

/// Nearest element of the target sequence for one source element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NearestMatch {
    pub source_value: i64,
    pub target_index: usize,
    pub target_value: i64,
}

impl NearestMatch {
    /// Signed offset `target - source` in samples.
    pub fn offset(&self) -> i64 {
        self.target_value - self.source_value
    }
}

/// A source element that claimed a target element during deduplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedPair {
    pub source_index: usize,
    pub source_value: i64,
    pub target_index: usize,
    pub target_value: i64,
}

/// Both views of matching `source` onto `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceMatch {
    /// One entry per source element, in source order.
    pub nearest: Vec<NearestMatch>,
    /// Deduplicated pairs; target indices strictly increase.
    pub used: Vec<MatchedPair>,
}

/// Index of the element of `target` closest to `value`, ties going to the lower index.
///
/// `target` must be sorted ascending. Returns `None` for an empty target.
pub fn nearest_index(target: &[i64], value: i64) -> Option<usize> {
    if target.is_empty() {
        return None;
    }
    let upper = target.partition_point(|&t| t < value);
    if upper == 0 {
        return Some(0);
    }
    if upper == target.len() {
        return Some(target.len() - 1);
    }
    let below = value - target[upper - 1];
    let above = target[upper] - value;
    if below <= above {
        Some(upper - 1)
    } else {
        Some(upper)
    }
}

/// Nearest target element for every source element.
pub fn correspond(source: &[i64], target: &[i64]) -> Vec<NearestMatch> {
    source
        .iter()
        .filter_map(|&value| {
            nearest_index(target, value).map(|idx| NearestMatch {
                source_value: value,
                target_index: idx,
                target_value: target[idx],
            })
        })
        .collect()
}

/// Keeps a source element's match only if it lands strictly after the last
/// claimed target index; later duplicates of a claimed target are dropped.
pub fn dedup_matches(nearest: &[NearestMatch]) -> Vec<MatchedPair> {
    let mut used: Vec<MatchedPair> = Vec::new();
    for (source_index, m) in nearest.iter().enumerate() {
        let claim = match used.last() {
            None => true,
            Some(last) => m.target_index > last.target_index,
        };
        if claim {
            used.push(MatchedPair {
                source_index,
                source_value: m.source_value,
                target_index: m.target_index,
                target_value: m.target_value,
            });
        }
    }
    used
}

/// Runs the nearest search and the deduplication pass for `source` onto `target`.
pub fn match_sequences(source: &[i64], target: &[i64]) -> SequenceMatch {
    let nearest = correspond(source, target);
    let used = dedup_matches(&nearest);
    SequenceMatch { nearest, used }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn brute_force_nearest(target: &[i64], value: i64) -> usize {
        let mut best = 0;
        for (i, &t) in target.iter().enumerate() {
            if (t - value).abs() < (target[best] - value).abs() {
                best = i;
            }
        }
        best
    }

    fn random_sequence(rng: &mut StdRng, max_len: usize) -> Vec<i64> {
        let len = rng.gen_range(1..=max_len);
        let mut out: Vec<i64> = (0..len).map(|_| rng.gen_range(0..5_000)).collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    #[test]
    fn ties_go_to_lower_index() {
        let target = [100, 350, 600];
        assert_eq!(nearest_index(&target, 225), Some(0));
        assert_eq!(nearest_index(&target, 226), Some(1));
        assert_eq!(nearest_index(&target, -40), Some(0));
        assert_eq!(nearest_index(&target, 9_000), Some(2));
        assert_eq!(nearest_index(&[], 5), None);
    }

    #[test]
    fn binary_search_agrees_with_linear_scan() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let target = random_sequence(&mut rng, 40);
            let value = rng.gen_range(-100..5_100);
            assert_eq!(
                nearest_index(&target, value),
                Some(brute_force_nearest(&target, value)),
                "target {:?} value {}",
                target,
                value
            );
        }
    }

    #[test]
    fn duplicate_claims_are_dropped() {
        let detected = [100, 225, 350, 600];
        let annotated = [100, 350, 600];
        let result = match_sequences(&detected, &annotated);
        assert_eq!(result.nearest.len(), 4);
        assert_eq!(result.nearest[1].target_index, 0);
        let claimed: Vec<usize> = result.used.iter().map(|p| p.source_index).collect();
        assert_eq!(claimed, vec![0, 2, 3]);
    }

    #[test]
    fn single_source_is_always_used() {
        let result = match_sequences(&[40], &[10, 90]);
        assert_eq!(result.used.len(), 1);
        assert_eq!(result.used[0].target_index, 0);
    }

    #[test]
    fn used_count_is_bounded() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let source = random_sequence(&mut rng, 60);
            let target = random_sequence(&mut rng, 60);
            let result = match_sequences(&source, &target);
            assert!(result.used.len() <= source.len().min(target.len()));
            assert!(result
                .used
                .windows(2)
                .all(|w| w[0].target_index < w[1].target_index));
        }
    }
}
