use crate::signal::{Events, TimeSeries};
use anyhow::{Context, Result};
use std::path::Path;

const SKIP: u8 = 59;
const AUX: u8 = 63;

/// One decoded entry of an MIT-format annotation file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WfdbAnnotation {
    pub sample: usize,
    pub code: u8,
}

impl WfdbAnnotation {
    /// Beat codes occupy 1..=58 in the MIT annotation table.
    pub fn is_beat(&self) -> bool {
        (1..SKIP).contains(&self.code)
    }
}

/// Load one signal of a WFDB record, converted to physical units.
pub fn load_wfdb_lead(header_path: &Path, lead: usize) -> Result<TimeSeries> {
    let (header, signals) = wfdb_rust::parse_wfdb(header_path);
    let raw = signals.get(lead).with_context(|| {
        format!(
            "WFDB record {} has {} signals, lead {} requested",
            header_path.display(),
            signals.len(),
            lead
        )
    })?;
    let spec = header
        .signal_specs
        .get(lead)
        .with_context(|| format!("missing signal spec for lead {}", lead))?;
    let gain = spec.adc_gain.unwrap_or(1.0) as f64;
    let baseline = spec.baseline.or(spec.adc_zero).unwrap_or(0) as f64;
    let fs = header
        .record
        .sampling_frequency
        .map(|f| f as f64)
        .unwrap_or(250.0);
    Ok(TimeSeries {
        fs,
        data: raw.iter().map(|&s| (s as f64 - baseline) / gain).collect(),
    })
}

/// Decode an MIT annotation byte stream. Truncated trailing records end the stream.
pub fn parse_wfdb_annotations(buf: &[u8]) -> Vec<WfdbAnnotation> {
    let mut words = buf
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));
    let mut out = Vec::new();
    let mut sample = 0usize;
    while let Some(word) = words.next() {
        let code = (word >> 10) as u8;
        let diff = (word & 0x03FF) as usize;
        match code {
            0 if diff == 0 => break,
            SKIP => {
                // 32-bit interval stored high word first
                let (Some(high), Some(low)) = (words.next(), words.next()) else {
                    break;
                };
                let skip = ((high as u32) << 16) | low as u32;
                sample = sample.wrapping_add(skip as usize);
            }
            60..=62 => {}
            AUX => {
                // payload of `diff` bytes padded to a whole word
                for _ in 0..diff.div_ceil(2) {
                    words.next();
                }
            }
            _ => {
                sample = sample.wrapping_add(diff);
                out.push(WfdbAnnotation { sample, code });
            }
        }
    }
    out
}

/// Read a WFDB annotation file (e.g. `.atr`) and keep only beat annotations.
pub fn load_wfdb_events(path: &Path) -> Result<Events> {
    let buf = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let beats = parse_wfdb_annotations(&buf)
        .into_iter()
        .filter(WfdbAnnotation::is_beat)
        .map(|ann| ann.sample)
        .collect();
    Ok(Events::from_indices(beats))
}
