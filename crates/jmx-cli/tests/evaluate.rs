use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use std::{error::Error, fs, path::PathBuf};
use tempfile::tempdir;

#[test]
fn evaluate_reports_delay_missed_and_extra() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("jmx");
    cmd.args([
        "evaluate",
        "--detections",
        &sample_path("test_data/delayed_detections.txt"),
        "--annotations",
        &sample_path("test_data/regular_annotations.txt"),
        "--fs",
        "250",
        "--n-samples",
        "8100",
    ]);
    let output = cmd.assert().success().get_output().stdout.clone();
    let report: Value = serde_json::from_slice(&output)?;

    assert_eq!(report["delay_samples"], 5);
    assert_eq!(report["annotations_considered"], 26);
    assert_eq!(report["detections_considered"], 26);
    assert_eq!(report["true_positive"], 25);
    assert_eq!(report["false_negative"], 1);
    assert_eq!(report["false_positive"], 1);
    assert_eq!(report["missed_beats"].as_array().map(Vec::len), Some(1));
    assert_eq!(report["missed_beats"][0]["position"], 4100);
    assert_eq!(report["extra_beats"], serde_json::json!([5175]));
    assert_eq!(report["jitter_seconds"].as_f64(), Some(0.0));
    assert_eq!(report["score"], report["accuracy"]);
    assert_eq!(report["warnings"], serde_json::json!([]));
    Ok(())
}

#[test]
fn evaluate_without_trim_considers_every_beat() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("jmx");
    cmd.args([
        "evaluate",
        "--detections",
        &sample_path("test_data/delayed_detections.txt"),
        "--annotations",
        &sample_path("test_data/regular_annotations.txt"),
        "--n-samples",
        "8100",
        "--no-trim",
        "--jitter-mode",
        "positional",
    ]);
    let output = cmd.assert().success().get_output().stdout.clone();
    let report: Value = serde_json::from_slice(&output)?;

    assert_eq!(report["annotations_considered"], 40);
    assert_eq!(report["detections_considered"], 40);
    assert_eq!(report["true_positive"], 39);
    assert_eq!(report["jitter_seconds"].as_f64(), Some(0.0));
    Ok(())
}

#[test]
fn evaluate_rejects_too_short_recording_for_trim() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let beats = dir.path().join("beats.txt");
    fs::write(&beats, "100\n350\n600\n850\n1100\n")?;
    let beats = beats.to_string_lossy().to_string();

    let mut cmd = cargo_bin_cmd!("jmx");
    cmd.args([
        "evaluate",
        "--detections",
        &beats,
        "--annotations",
        &beats,
        "--n-samples",
        "1250",
    ]);
    let output = cmd.assert().failure().get_output().stderr.clone();
    let stderr = String::from_utf8(output)?;
    assert!(stderr.contains("trim bounds"), "unexpected stderr: {}", stderr);
    Ok(())
}

#[test]
fn sensitivity_counts_hits_within_tolerance() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("jmx");
    cmd.args([
        "sensitivity",
        "--detections",
        &sample_path("test_data/delayed_detections.txt"),
        "--annotations",
        &sample_path("test_data/regular_annotations.txt"),
        "--fs",
        "250",
        "--n-samples",
        "8100",
        "--tolerance-s",
        "0.05",
    ]);
    let output = cmd.assert().success().get_output().stdout.clone();
    let result: Value = serde_json::from_slice(&output)?;

    assert_eq!(result["delay_samples"], 5);
    assert_eq!(result["tolerance_samples"], 13);
    assert_eq!(result["true_positive"], 39);
    assert_eq!(result["false_positive"], 1);
    assert_eq!(result["false_negative"], 1);
    assert_close(result["sensitivity"].as_f64().unwrap_or(0.0), 39.0 / 40.0, 1e-12);
    assert_close(
        result["positive_predictivity"].as_f64().unwrap_or(0.0),
        39.0 / 40.0,
        1e-12,
    );
    Ok(())
}

fn assert_close(a: f64, b: f64, tol: f64) {
    let diff = (a - b).abs();
    assert!(
        diff <= tol,
        "diff {} exceeded tol {} ({} vs {})",
        diff,
        tol,
        a,
        b
    );
}

fn workspace_root() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .expect("crates dir")
        .parent()
        .expect("workspace root")
        .to_path_buf()
}

fn sample_path(relative: &str) -> String {
    workspace_root()
        .join(relative)
        .to_string_lossy()
        .to_string()
}
