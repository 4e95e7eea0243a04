//! TOML benchmark manifests describing which recordings to evaluate.
//!
//! ```toml
//! sensitivity_tolerance_s = 0.1
//!
//! [jmx]
//! reference_jitter_s = 0.004
//!
//! [[record]]
//! subject = "00"
//! experiment = "sitting"
//! lead = "einthoven_ii"
//! fs = 250.0
//! samples = "sub00_sitting.txt"
//! annotations = "sub00_sitting_anno.txt"
//! ```

use crate::batch::{BenchmarkConfig, Dataset, RecordKey, Recording};
use crate::io::{load_annotation_events, text, wfdb};
use crate::signal::TimeSeries;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct RecordEntry {
    pub subject: String,
    pub experiment: String,
    pub lead: String,
    /// Sampling rate of `samples`; WFDB records carry their own.
    #[serde(default)]
    pub fs: Option<f64>,
    #[serde(default)]
    pub samples: Option<PathBuf>,
    #[serde(default)]
    pub wfdb_header: Option<PathBuf>,
    #[serde(default)]
    pub wfdb_lead: usize,
    #[serde(default)]
    pub annotations: Option<PathBuf>,
}

impl RecordEntry {
    pub fn key(&self) -> RecordKey {
        RecordKey {
            subject: self.subject.clone(),
            experiment: self.experiment.clone(),
            lead: self.lead.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    #[serde(flatten)]
    pub config: BenchmarkConfig,
    #[serde(default, rename = "record")]
    pub records: Vec<RecordEntry>,
}

/// Dataset whose recordings are listed in a manifest; relative paths are
/// resolved against `root`.
#[derive(Debug, Clone)]
pub struct ManifestDataset {
    pub root: PathBuf,
    pub manifest: Manifest,
}

impl ManifestDataset {
    pub fn read(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest {}", path.display()))?;
        let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::parse(&contents, root).with_context(|| format!("parsing manifest {}", path.display()))
    }

    pub fn parse(contents: &str, root: PathBuf) -> Result<Self> {
        let manifest: Manifest = toml::from_str(contents)?;
        Ok(Self { root, manifest })
    }

    pub fn config(&self) -> &BenchmarkConfig {
        &self.manifest.config
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    fn load_signal(&self, entry: &RecordEntry) -> Result<TimeSeries> {
        if let Some(header) = &entry.wfdb_header {
            return wfdb::load_wfdb_lead(&self.resolve(header), entry.wfdb_lead);
        }
        let Some(samples) = &entry.samples else {
            bail!(
                "record {}/{}/{} needs `samples` or `wfdb_header`",
                entry.subject,
                entry.experiment,
                entry.lead
            );
        };
        let Some(fs) = entry.fs else {
            bail!("record {}/{}/{} needs `fs`", entry.subject, entry.experiment, entry.lead);
        };
        let data = text::read_f64_series(&self.resolve(samples))?;
        Ok(TimeSeries { fs, data })
    }
}

impl Dataset for ManifestDataset {
    fn keys(&self) -> Vec<RecordKey> {
        self.manifest.records.iter().map(RecordEntry::key).collect()
    }

    fn load(&self, key: &RecordKey) -> Result<Option<Recording>> {
        let entry = self
            .manifest
            .records
            .iter()
            .find(|e| e.key() == *key)
            .with_context(|| format!("no record for {:?}", key))?;
        let Some(annotations) = &entry.annotations else {
            return Ok(None);
        };
        let signal = self.load_signal(entry)?;
        let annotations = load_annotation_events(&self.resolve(annotations))?;
        Ok(Some(Recording {
            signal,
            annotations,
        }))
    }
}
