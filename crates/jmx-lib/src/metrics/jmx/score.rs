//! Mapping from normalised jitter to a quality factor in [0, 1].

use std::sync::OnceLock;

/// `(jitter / reference jitter, score)` calibration points of the curve.
pub const CONTROL_POINTS: [(f64, f64); 4] = [(0.0, 1.0), (1.0, 0.8), (6.0, 0.2), (10.0, 0.0)];

/// Normalised jitter at and beyond which the score is zero.
pub const SATURATION: f64 = 10.0;

/// Cubic through [`CONTROL_POINTS`], stored in Newton form.
#[derive(Debug, Clone, PartialEq)]
pub struct JitterScoreMap {
    nodes: [f64; 4],
    coefficients: [f64; 4],
}

impl JitterScoreMap {
    /// Fits the interpolating cubic with divided differences.
    pub fn fit(points: &[(f64, f64); 4]) -> Self {
        let nodes = points.map(|(x, _)| x);
        let mut coefficients = points.map(|(_, y)| y);
        for order in 1..4 {
            for i in (order..4).rev() {
                coefficients[i] = (coefficients[i] - coefficients[i - 1])
                    / (nodes[i] - nodes[i - order]);
            }
        }
        Self {
            nodes,
            coefficients,
        }
    }

    /// The shared curve fitted once from [`CONTROL_POINTS`].
    pub fn standard() -> &'static JitterScoreMap {
        static MAP: OnceLock<JitterScoreMap> = OnceLock::new();
        MAP.get_or_init(|| JitterScoreMap::fit(&CONTROL_POINTS))
    }

    /// Evaluates the cubic without saturation.
    pub fn polynomial(&self, x: f64) -> f64 {
        let c = &self.coefficients;
        let n = &self.nodes;
        ((c[3] * (x - n[2]) + c[2]) * (x - n[1]) + c[1]) * (x - n[0]) + c[0]
    }

    /// Score for a normalised jitter `x`; exactly 0.0 from [`SATURATION`] on.
    pub fn score(&self, x: f64) -> f64 {
        if x >= SATURATION {
            0.0
        } else {
            self.polynomial(x)
        }
    }
}

/// Quality factor for `jitter_s` relative to `reference_jitter_s`.
pub fn jitter_score(jitter_s: f64, reference_jitter_s: f64) -> f64 {
    JitterScoreMap::standard().score(jitter_s / reference_jitter_s)
}

/// Composite JMX score: accuracy weighted by the jitter quality factor.
pub fn jmx_score(jitter_s: f64, accuracy: f64, reference_jitter_s: f64) -> f64 {
    accuracy * jitter_score(jitter_s, reference_jitter_s)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, tol: f64) {
        assert!((a - b).abs() <= tol, "{} vs {} (tol {})", a, b, tol);
    }

    #[test]
    fn zero_jitter_scores_exactly_one() {
        assert_eq!(JitterScoreMap::standard().score(0.0), 1.0);
        assert_eq!(jitter_score(0.0, 0.004), 1.0);
    }

    #[test]
    fn curve_passes_through_control_points() {
        let map = JitterScoreMap::standard();
        for (x, y) in CONTROL_POINTS {
            assert_close(map.polynomial(x), y, 1e-12);
        }
    }

    #[test]
    fn saturates_at_ten() {
        let map = JitterScoreMap::standard();
        for x in [10.0, 10.5, 42.0, 1e9, f64::INFINITY] {
            assert_eq!(map.score(x), 0.0);
        }
        assert_close(map.score(10.0 - 1e-9), 0.0, 1e-9);
    }

    #[test]
    fn decreases_monotonically_within_range() {
        let map = JitterScoreMap::standard();
        let mut previous = map.score(0.0);
        for step in 1..=1000 {
            let value = map.score(step as f64 * 0.01);
            assert!(value <= previous, "not monotone at {}", step);
            assert!((0.0..=1.0).contains(&value));
            previous = value;
        }
    }

    #[test]
    fn composite_score_scales_accuracy() {
        assert_close(jmx_score(0.004, 0.5, 0.004), 0.4, 1e-12);
        assert_eq!(jmx_score(0.0, 0.93, 0.012), 0.93);
    }
}
