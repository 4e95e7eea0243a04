use crate::{
    detectors::Detector,
    signal::{Events, TimeSeries},
};
use serde::{Deserialize, Serialize};

/// Parameters of the two moving average R-peak detector.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct TwoAverageConfig {
    /// Lower cutoff for the single-pole high-pass filter (Hz).
    pub lowcut_hz: f64,
    /// Upper cutoff for the single-pole low-pass filter (Hz).
    pub highcut_hz: f64,
    /// Short averaging window matching a QRS complex (seconds).
    pub qrs_window_s: f64,
    /// Long averaging window matching a whole beat (seconds).
    pub beat_window_s: f64,
    /// Threshold offset as a fraction of the mean signal energy.
    pub offset: f64,
    /// Minimum physiological RR distance / refractory period (seconds).
    pub min_rr_s: f64,
}

impl Default for TwoAverageConfig {
    fn default() -> Self {
        Self {
            lowcut_hz: 8.0,
            highcut_hz: 20.0,
            qrs_window_s: 0.097,
            beat_window_s: 0.611,
            offset: 0.08,
            min_rr_s: 0.3,
        }
    }
}

/// R-peak detector comparing a QRS-width energy average against a
/// beat-width one; regions where the short average dominates are QRS blocks.
#[derive(Debug, Clone, Default)]
pub struct TwoAverageDetector {
    pub config: TwoAverageConfig,
}

impl TwoAverageDetector {
    pub fn new(config: TwoAverageConfig) -> Self {
        Self { config }
    }
}

impl Detector for TwoAverageDetector {
    fn name(&self) -> &str {
        "two_average_detector"
    }

    fn detect(&self, signal: &TimeSeries) -> Events {
        detect_r_peaks(signal, &self.config)
    }
}

/// Detect R-peaks; returns sample indices in ascending order.
pub fn detect_r_peaks(ts: &TimeSeries, cfg: &TwoAverageConfig) -> Events {
    if ts.len() < 3 {
        return Events::from_indices(Vec::new());
    }
    let fs = ts.fs.max(1.0);
    let filtered = bandpass(&ts.data, fs, cfg.lowcut_hz, cfg.highcut_hz);
    let energy = square(&filtered);

    let qrs_win = ((cfg.qrs_window_s * fs).round() as usize).max(1);
    let beat_win = ((cfg.beat_window_s * fs).round() as usize).max(qrs_win);
    let ma_qrs = moving_average(&energy, qrs_win);
    let ma_beat = moving_average(&energy, beat_win);
    let offset = cfg.offset * energy.iter().sum::<f64>() / energy.len() as f64;

    let refractory = (cfg.min_rr_s * fs).round() as usize;
    let min_width = (qrs_win / 2).max(1);

    let mut peaks: Vec<usize> = Vec::new();
    let mut block_start: Option<usize> = None;
    for i in 0..=energy.len() {
        let active = i < energy.len() && ma_qrs[i] > ma_beat[i] + offset;
        match (active, block_start) {
            (true, None) => block_start = Some(i),
            (false, Some(start)) => {
                block_start = None;
                if i - start < min_width {
                    continue;
                }
                // trailing averages lag the beat, so look back one QRS window
                let from = start.saturating_sub(qrs_win);
                let peak = from + argmax(&ts.data[from..i]);
                let clear = peaks.last().map_or(true, |&last| peak >= last + refractory);
                if clear {
                    peaks.push(peak);
                }
            }
            _ => {}
        }
    }
    Events::from_indices(peaks)
}

fn argmax(data: &[f64]) -> usize {
    let mut idx = 0;
    for (i, &v) in data.iter().enumerate() {
        if v > data[idx] {
            idx = i;
        }
    }
    idx
}

fn bandpass(data: &[f64], fs: f64, low: f64, high: f64) -> Vec<f64> {
    let hp = if low > 0.0 {
        single_pole_highpass(data, fs, low)
    } else {
        data.to_vec()
    };
    if high <= 0.0 || high >= fs * 0.5 {
        hp
    } else {
        single_pole_lowpass(&hp, fs, high)
    }
}

fn single_pole_highpass(data: &[f64], fs: f64, cutoff: f64) -> Vec<f64> {
    let Some(&first) = data.first() else {
        return Vec::new();
    };
    let dt = 1.0 / fs;
    let rc = 1.0 / (2.0 * std::f64::consts::PI * cutoff.max(0.01));
    let alpha = rc / (rc + dt);
    let mut prev_y = 0.0;
    let mut prev_x = first;
    data.iter()
        .map(|&x| {
            prev_y = alpha * (prev_y + x - prev_x);
            prev_x = x;
            prev_y
        })
        .collect()
}

fn single_pole_lowpass(data: &[f64], fs: f64, cutoff: f64) -> Vec<f64> {
    let Some(&first) = data.first() else {
        return Vec::new();
    };
    let dt = 1.0 / fs;
    let rc = 1.0 / (2.0 * std::f64::consts::PI * cutoff.max(0.01));
    let alpha = dt / (rc + dt);
    let mut prev = first;
    data.iter()
        .map(|&x| {
            prev += alpha * (x - prev);
            prev
        })
        .collect()
}

fn square(data: &[f64]) -> Vec<f64> {
    data.iter().map(|x| x * x).collect()
}

/// Trailing moving average; the first `win - 1` outputs see a partial window.
fn moving_average(data: &[f64], win: usize) -> Vec<f64> {
    if win <= 1 {
        return data.to_vec();
    }
    let mut out = Vec::with_capacity(data.len());
    let mut acc = 0.0;
    for (i, &sample) in data.iter().enumerate() {
        acc += sample;
        if i >= win {
            acc -= data[i - win];
        }
        out.push(acc / win as f64);
    }
    out
}
