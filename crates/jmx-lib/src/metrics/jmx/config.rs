use super::jitter::JitterMode;
use super::trim::TrimMargins;
use crate::error::{JmxError, JmxResult};
use crate::metrics::stats::NORMAL_MAD_SCALE;
use serde::{Deserialize, Serialize};

/// Calibration constants of a JMX evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JmxConfig {
    /// Drop the first/last annotated beats before matching.
    pub trim: bool,
    /// First annotation index kept when trimming.
    pub trim_start: usize,
    /// Last annotation index kept when trimming, counted from the end.
    pub trim_end: isize,
    /// Jitter (seconds) that maps to a score of 0.8. Use 0.012 for the looser legacy threshold.
    pub reference_jitter_s: f64,
    /// Upper bound on heart rate used to estimate true negatives.
    pub max_heart_rate_bpm: f64,
    pub jitter_mode: JitterMode,
    /// Multiplier applied to the median absolute deviation. The reference
    /// jitters are calibrated against the normal-consistent scale.
    pub mad_scale: f64,
}

impl Default for JmxConfig {
    fn default() -> Self {
        Self {
            trim: true,
            trim_start: 10,
            trim_end: -5,
            reference_jitter_s: 4e-3,
            max_heart_rate_bpm: 220.0,
            jitter_mode: JitterMode::Interval,
            mad_scale: NORMAL_MAD_SCALE,
        }
    }
}

impl JmxConfig {
    pub fn margins(&self) -> TrimMargins {
        TrimMargins::new(self.trim_start, self.trim_end)
    }

    pub fn validate(&self) -> JmxResult<()> {
        positive("reference_jitter_s", self.reference_jitter_s)?;
        positive("max_heart_rate_bpm", self.max_heart_rate_bpm)?;
        positive("mad_scale", self.mad_scale)?;
        Ok(())
    }
}

pub(crate) fn positive(name: &'static str, value: f64) -> JmxResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(JmxError::InvalidParameter { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: JmxConfig = toml::from_str("trim = false\nreference_jitter_s = 0.012\njitter_mode = \"positional\"").unwrap();
        assert!(!cfg.trim);
        assert_eq!(cfg.reference_jitter_s, 0.012);
        assert_eq!(cfg.jitter_mode, JitterMode::Positional);
        assert_eq!(cfg.max_heart_rate_bpm, 220.0);
        assert_eq!(cfg.margins(), TrimMargins::new(10, -5));
        assert_eq!(cfg.mad_scale, 1.4826);
    }

    #[test]
    fn rejects_non_positive_constants() {
        let cfg = JmxConfig {
            max_heart_rate_bpm: 0.0,
            ..JmxConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(JmxError::InvalidParameter {
                name: "max_heart_rate_bpm",
                value: 0.0
            })
        );
        assert!(JmxConfig::default().validate().is_ok());
    }
}
