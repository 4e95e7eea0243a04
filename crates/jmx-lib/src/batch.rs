//! Benchmark driver: runs detectors over a dataset and collects JMX reports
//! and tolerance-window sensitivity keyed by (detector, lead, experiment).

use crate::detectors::Detector;
use crate::error::JmxResult;
use crate::metrics::jmx::{evaluate, JmxConfig, JmxReport, MIN_RELIABLE_EVENTS};
use crate::metrics::sensitivity::{evaluate_sensitivity, SensitivityResult};
use crate::metrics::stats::{mean, std_dev, t_test_greater};
use crate::signal::{Events, TimeSeries};
use anyhow::{ensure, Context, Result};
use csv::WriterBuilder;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Identifies one recording of a dataset.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    pub subject: String,
    pub experiment: String,
    pub lead: String,
}

/// Samples of one lead together with its ground-truth beats.
#[derive(Debug, Clone)]
pub struct Recording {
    pub signal: TimeSeries,
    pub annotations: Events,
}

/// Source of annotated recordings.
pub trait Dataset {
    fn keys(&self) -> Vec<RecordKey>;
    /// `Ok(None)` when the recording exists but has no annotations.
    fn load(&self, key: &RecordKey) -> Result<Option<Recording>>;
}

/// Settings of a benchmark run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkConfig {
    pub jmx: JmxConfig,
    /// Half-width of the sensitivity tolerance window (seconds).
    pub sensitivity_tolerance_s: f64,
    /// Sensitivity a detector group is tested against (fraction).
    pub min_sensitivity: f64,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            jmx: JmxConfig::default(),
            sensitivity_tolerance_s: 0.1,
            min_sensitivity: 0.9,
        }
    }
}

impl BenchmarkConfig {
    pub fn validate(&self) -> Result<()> {
        self.jmx.validate()?;
        ensure!(
            self.sensitivity_tolerance_s >= 0.0 && self.sensitivity_tolerance_s.is_finite(),
            "sensitivity_tolerance_s must be non-negative, got {}",
            self.sensitivity_tolerance_s
        );
        ensure!(
            (0.0..=1.0).contains(&self.min_sensitivity),
            "min_sensitivity must be within [0, 1], got {}",
            self.min_sensitivity
        );
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResultKey {
    pub detector: String,
    pub lead: String,
    pub experiment: String,
}

/// Outcome for one subject; exactly one of `report` / `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectResult {
    pub subject: String,
    pub report: Option<JmxReport>,
    pub error: Option<String>,
}

/// Sensitivity outcome for one subject; exactly one of `result` / `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivitySubject {
    pub subject: String,
    pub result: Option<SensitivityResult>,
    pub error: Option<String>,
}

/// Lead → experiment → subjects.
pub type Nested<'a, T> = BTreeMap<&'a str, BTreeMap<&'a str, &'a [T]>>;
type LeadMap<'a> = Nested<'a, SubjectResult>;

#[derive(Debug, Clone, Default)]
pub struct BenchmarkResults {
    pub entries: BTreeMap<ResultKey, Vec<SubjectResult>>,
    pub sensitivity: BTreeMap<ResultKey, Vec<SensitivitySubject>>,
}

/// Aggregate of one (detector, lead, experiment) group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub detector: String,
    pub lead: String,
    pub experiment: String,
    pub recordings: usize,
    /// Recordings with a defined JMX score.
    pub scored: usize,
    pub mean_jmx: Option<f64>,
    pub std_jmx: Option<f64>,
    pub mean_jitter_s: Option<f64>,
    pub mean_accuracy: Option<f64>,
    pub mean_missed: Option<f64>,
    pub mean_extra: Option<f64>,
    pub mean_sensitivity: Option<f64>,
    pub std_sensitivity: Option<f64>,
    pub mean_positive_predictivity: Option<f64>,
    /// One-sided t-test p-value for mean sensitivity above the minimum.
    pub sensitivity_p_value: Option<f64>,
}

/// Reference values across every evaluated recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalSummary {
    pub recordings: usize,
    pub failed: usize,
    pub mean_jitter_s: Option<f64>,
    pub mean_missed: Option<f64>,
    pub mean_extra: Option<f64>,
}

fn nest<'a, T>(entries: &'a BTreeMap<ResultKey, Vec<T>>, detector: &str) -> Nested<'a, T> {
    let mut out: Nested<'a, T> = BTreeMap::new();
    for (key, results) in entries.iter().filter(|(k, _)| k.detector == detector) {
        out.entry(key.lead.as_str())
            .or_default()
            .insert(key.experiment.as_str(), results.as_slice());
    }
    out
}

impl BenchmarkResults {
    pub fn insert(&mut self, key: ResultKey, result: SubjectResult) {
        self.entries.entry(key).or_default().push(result);
    }

    pub fn insert_sensitivity(&mut self, key: ResultKey, result: SensitivitySubject) {
        self.sensitivity.entry(key).or_default().push(result);
    }

    pub fn detectors(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(|k| k.detector.as_str()).collect();
        names.dedup();
        names
    }

    /// Lead → experiment → subjects for one detector.
    pub fn for_detector(&self, detector: &str) -> LeadMap<'_> {
        nest(&self.entries, detector)
    }

    /// Sensitivity results laid out like [`BenchmarkResults::for_detector`].
    pub fn sensitivity_for_detector(&self, detector: &str) -> Nested<'_, SensitivitySubject> {
        nest(&self.sensitivity, detector)
    }

    /// Detector → lead → experiment → subjects.
    pub fn nested(&self) -> BTreeMap<&str, LeadMap<'_>> {
        self.detectors()
            .into_iter()
            .map(|name| (name, self.for_detector(name)))
            .collect()
    }

    fn reports(results: &[SubjectResult]) -> impl Iterator<Item = &JmxReport> {
        results.iter().filter_map(|r| r.report.as_ref())
    }

    /// One summary per group; `min_sensitivity` is the null hypothesis of the
    /// sensitivity t-test.
    pub fn summarize(&self, min_sensitivity: f64) -> Vec<GroupSummary> {
        self.entries
            .iter()
            .map(|(key, results)| {
                let jmx: Vec<f64> = Self::reports(results).filter_map(|r| r.jmx).collect();
                let jitter: Vec<f64> = Self::reports(results).filter_map(|r| r.jitter_s).collect();
                let accuracy: Vec<f64> =
                    Self::reports(results).filter_map(|r| r.accuracy).collect();
                let missed: Vec<f64> = Self::reports(results)
                    .map(|r| r.missed_beats.len() as f64)
                    .collect();
                let extra: Vec<f64> = Self::reports(results)
                    .map(|r| r.extra_beats.len() as f64)
                    .collect();
                let sens: Vec<&SensitivityResult> = self
                    .sensitivity
                    .get(key)
                    .into_iter()
                    .flatten()
                    .filter_map(|s| s.result.as_ref())
                    .collect();
                let sensitivity: Vec<f64> = sens.iter().filter_map(|s| s.sensitivity).collect();
                let ppv: Vec<f64> = sens
                    .iter()
                    .filter_map(|s| s.positive_predictivity)
                    .collect();
                GroupSummary {
                    detector: key.detector.clone(),
                    lead: key.lead.clone(),
                    experiment: key.experiment.clone(),
                    recordings: results.len(),
                    scored: jmx.len(),
                    mean_jmx: mean(&jmx),
                    std_jmx: std_dev(&jmx),
                    mean_jitter_s: mean(&jitter),
                    mean_accuracy: mean(&accuracy),
                    mean_missed: mean(&missed),
                    mean_extra: mean(&extra),
                    mean_sensitivity: mean(&sensitivity),
                    std_sensitivity: std_dev(&sensitivity),
                    mean_positive_predictivity: mean(&ppv),
                    sensitivity_p_value: t_test_greater(&sensitivity, min_sensitivity),
                }
            })
            .collect()
    }

    pub fn global_summary(&self) -> GlobalSummary {
        let all: Vec<&SubjectResult> = self.entries.values().flatten().collect();
        let reports: Vec<&JmxReport> = all.iter().filter_map(|r| r.report.as_ref()).collect();
        let jitter: Vec<f64> = reports.iter().filter_map(|r| r.jitter_s).collect();
        let missed: Vec<f64> = reports.iter().map(|r| r.missed_beats.len() as f64).collect();
        let extra: Vec<f64> = reports.iter().map(|r| r.extra_beats.len() as f64).collect();
        GlobalSummary {
            recordings: all.len(),
            failed: all.len() - reports.len(),
            mean_jitter_s: mean(&jitter),
            mean_missed: mean(&missed),
            mean_extra: mean(&extra),
        }
    }
}

/// Scores `detected` against the annotations of `recording`.
pub fn evaluate_detections(
    detected: &Events,
    recording: &Recording,
    cfg: &JmxConfig,
) -> JmxResult<JmxReport> {
    evaluate(
        &detected.positions(),
        &recording.annotations.positions(),
        recording.signal.fs,
        recording.signal.len(),
        cfg,
    )
}

/// Tolerance-window sensitivity of `detected` with a window of
/// `tolerance_s` seconds either side of each annotation.
pub fn sensitivity_detections(
    detected: &Events,
    recording: &Recording,
    tolerance_s: f64,
) -> JmxResult<SensitivityResult> {
    let tolerance = (tolerance_s * recording.signal.fs).round() as i64;
    evaluate_sensitivity(
        &detected.positions(),
        &recording.annotations.positions(),
        tolerance,
        recording.signal.len(),
    )
}

/// Evaluates every detector on every annotated recording of `dataset`.
///
/// Per-recording evaluation failures are stored in the results; failing to
/// load a recording aborts the run.
pub fn run_benchmark(
    dataset: &dyn Dataset,
    detectors: &[Box<dyn Detector>],
    cfg: &BenchmarkConfig,
) -> Result<BenchmarkResults> {
    cfg.validate()?;
    let mut results = BenchmarkResults::default();
    for key in dataset.keys() {
        let recording = dataset
            .load(&key)
            .with_context(|| format!("loading subject {} {} {}", key.subject, key.experiment, key.lead))?;
        let Some(recording) = recording else {
            warn!(
                "no annotations for subject {}, {} ({}), skipping",
                key.subject, key.experiment, key.lead
            );
            continue;
        };
        for detector in detectors {
            info!(
                "analysing subject {}, {}, {}, {}",
                key.subject,
                key.experiment,
                key.lead,
                detector.name()
            );
            let detected = detector.detect(&recording.signal);
            let result = match evaluate_detections(&detected, &recording, &cfg.jmx) {
                Ok(report) => {
                    if report.is_low_confidence() {
                        warn!(
                            "less than {} beats while using {} on subject {}, {}, {}",
                            MIN_RELIABLE_EVENTS,
                            detector.name(),
                            key.subject,
                            key.lead,
                            key.experiment
                        );
                    }
                    SubjectResult {
                        subject: key.subject.clone(),
                        report: Some(report),
                        error: None,
                    }
                }
                Err(err) => {
                    warn!(
                        "{} failed on subject {}, {}, {}: {}",
                        detector.name(),
                        key.subject,
                        key.lead,
                        key.experiment,
                        err
                    );
                    SubjectResult {
                        subject: key.subject.clone(),
                        report: None,
                        error: Some(err.to_string()),
                    }
                }
            };
            let sensitivity =
                match sensitivity_detections(&detected, &recording, cfg.sensitivity_tolerance_s) {
                    Ok(result) => SensitivitySubject {
                        subject: key.subject.clone(),
                        result: Some(result),
                        error: None,
                    },
                    Err(err) => SensitivitySubject {
                        subject: key.subject.clone(),
                        result: None,
                        error: Some(err.to_string()),
                    },
                };
            let result_key = ResultKey {
                detector: detector.name().to_string(),
                lead: key.lead.clone(),
                experiment: key.experiment.clone(),
            };
            results.insert_sensitivity(result_key.clone(), sensitivity);
            results.insert(result_key, result);
        }
    }
    Ok(results)
}

pub fn write_summary_csv(path: &Path, summaries: &[GroupSummary]) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    for summary in summaries {
        writer.serialize(summary)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::ecg::{tests::synthetic_recording, TwoAverageDetector};
    use crate::detectors::FnDetector;
    use tempfile::tempdir;

    struct MemoryDataset {
        records: Vec<(RecordKey, Option<Recording>)>,
    }

    impl Dataset for MemoryDataset {
        fn keys(&self) -> Vec<RecordKey> {
            self.records.iter().map(|(k, _)| k.clone()).collect()
        }

        fn load(&self, key: &RecordKey) -> Result<Option<Recording>> {
            self.records
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, r)| r.clone())
                .with_context(|| format!("unknown record {:?}", key))
        }
    }

    fn key(subject: &str, experiment: &str) -> RecordKey {
        RecordKey {
            subject: subject.into(),
            experiment: experiment.into(),
            lead: "einthoven_ii".into(),
        }
    }

    fn recording(rr_s: f64, beats: usize) -> Recording {
        let rr = vec![rr_s; beats - 1];
        let (signal, truth) = synthetic_recording(250.0, &rr);
        Recording {
            signal,
            annotations: Events::from_indices(truth),
        }
    }

    fn dataset() -> MemoryDataset {
        MemoryDataset {
            records: vec![
                (key("00", "sitting"), Some(recording(0.8, 30))),
                (key("01", "sitting"), Some(recording(0.76, 30))),
                (key("01", "jogging"), None),
                (key("02", "jogging"), Some(recording(0.5, 40))),
            ],
        }
    }

    fn detectors() -> Vec<Box<dyn Detector>> {
        vec![
            Box::new(TwoAverageDetector::default()),
            Box::new(FnDetector::new("silent", |_: &TimeSeries| {
                Events::from_indices(Vec::new())
            })),
        ]
    }

    fn run() -> BenchmarkResults {
        run_benchmark(&dataset(), &detectors(), &BenchmarkConfig::default()).unwrap()
    }

    fn sensitivity_of(subject: &str, value: f64) -> SensitivitySubject {
        SensitivitySubject {
            subject: subject.into(),
            result: Some(SensitivityResult {
                delay_samples: 0,
                tolerance_samples: 25,
                true_positive: 0,
                false_positive: 0,
                false_negative: 0,
                true_negative: 0,
                sensitivity: Some(value),
                positive_predictivity: Some(1.0),
                f1: None,
            }),
            error: None,
        }
    }

    #[test]
    fn results_are_grouped_by_detector_lead_and_experiment() {
        let results = run();
        assert_eq!(results.detectors(), vec!["silent", "two_average_detector"]);
        let nested = results.nested();
        let two_avg = &nested["two_average_detector"]["einthoven_ii"];
        assert_eq!(two_avg["sitting"].len(), 2);
        assert_eq!(two_avg["jogging"].len(), 1);
        assert_eq!(two_avg["jogging"][0].subject, "02");
    }

    #[test]
    fn failed_detections_are_recorded_not_fatal() {
        let results = run();
        let silent = results.for_detector("silent");
        let sitting = silent["einthoven_ii"]["sitting"];
        assert!(sitting.iter().all(|r| r.report.is_none()));
        assert!(sitting[0].error.as_deref().unwrap().contains("empty"));
        let global = results.global_summary();
        assert_eq!(global.recordings, 6);
        assert_eq!(global.failed, 3);
    }

    #[test]
    fn sensitivity_is_nested_per_detector() {
        let results = run();
        let two_avg = results.sensitivity_for_detector("two_average_detector");
        let sitting = two_avg["einthoven_ii"]["sitting"];
        assert_eq!(sitting.len(), 2);
        assert_eq!(sitting[1].subject, "01");
        for subject in sitting.iter().chain(two_avg["einthoven_ii"]["jogging"]) {
            let result = subject.result.as_ref().unwrap();
            assert_eq!(result.tolerance_samples, 25);
            assert_eq!(result.sensitivity, Some(1.0));
            assert_eq!(result.false_positive, 0);
        }

        let silent = results.sensitivity_for_detector("silent");
        let failed = &silent["einthoven_ii"]["jogging"][0];
        assert!(failed.result.is_none());
        assert!(failed.error.as_deref().unwrap().contains("empty"));
    }

    #[test]
    fn clean_detector_scores_high() {
        let results = run();
        let summaries = results.summarize(0.9);
        let sitting = summaries
            .iter()
            .find(|s| s.detector == "two_average_detector" && s.experiment == "sitting")
            .unwrap();
        assert_eq!(sitting.recordings, 2);
        assert_eq!(sitting.scored, 2);
        assert_eq!(sitting.mean_missed, Some(0.0));
        assert_eq!(sitting.mean_extra, Some(0.0));
        assert!(sitting.mean_jmx.unwrap() > 0.9);
        assert_eq!(sitting.mean_sensitivity, Some(1.0));
        // identical sensitivities leave the t statistic undefined
        assert_eq!(sitting.sensitivity_p_value, None);
        let silent = summaries.iter().find(|s| s.detector == "silent").unwrap();
        assert_eq!(silent.mean_jmx, None);
        assert_eq!(silent.mean_sensitivity, None);
    }

    #[test]
    fn summary_tests_sensitivity_against_minimum() {
        let group = ResultKey {
            detector: "two_average_detector".into(),
            lead: "einthoven_ii".into(),
            experiment: "walking".into(),
        };
        let mut results = BenchmarkResults::default();
        for (i, value) in [0.91, 0.93, 0.95, 0.97].into_iter().enumerate() {
            let subject = format!("{:02}", i);
            results.insert(
                group.clone(),
                SubjectResult {
                    subject: subject.clone(),
                    report: None,
                    error: Some("not scored".into()),
                },
            );
            results.insert_sensitivity(group.clone(), sensitivity_of(&subject, value));
        }

        let summary = &results.summarize(0.9)[0];
        assert!((summary.mean_sensitivity.unwrap() - 0.94).abs() < 1e-12);
        let p = summary.sensitivity_p_value.unwrap();
        assert!(p > 0.025 && p < 0.05, "p = {}", p);
        let strict = &results.summarize(0.99)[0];
        assert!(strict.sensitivity_p_value.unwrap() > 0.95);
    }

    #[test]
    fn invalid_tolerance_is_rejected() {
        let cfg = BenchmarkConfig {
            sensitivity_tolerance_s: -0.1,
            ..BenchmarkConfig::default()
        };
        assert!(run_benchmark(&dataset(), &detectors(), &cfg).is_err());
    }

    #[test]
    fn summary_csv_has_header_and_rows() {
        let results = run();
        let dir = tempdir().unwrap();
        let path = dir.path().join("summary.csv");
        write_summary_csv(&path, &results.summarize(0.9)).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("detector,lead,experiment,recordings"));
        assert!(header.ends_with("mean_sensitivity,std_sensitivity,mean_positive_predictivity,sensitivity_p_value"));
        assert_eq!(lines.count(), 4);
    }
}
