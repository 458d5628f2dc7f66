use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_emotion_cli"))
}

fn run(args: &[&str]) -> Output {
    cli().args(args).output().expect("failed to run emotion_cli")
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Temp dir holding synthetic artifacts under `artifacts/`
fn workspace() -> (TempDir, String) {
    let dir = TempDir::new().unwrap();
    let artifacts = path_arg(&dir.path().join("artifacts"));
    let output = run(&["synth-artifacts", "--out", &artifacts]);
    assert!(
        output.status.success(),
        "synth-artifacts exited with {:?}: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stderr)
    );
    (dir, artifacts)
}

fn synth_wav(dir: &Path, name: &str, args: &[&str]) -> String {
    let path = path_arg(&dir.join(name));
    let mut full = vec!["synth-wav", "--out", path.as_str()];
    full.extend_from_slice(args);
    let output = run(&full);
    assert!(output.status.success(), "synth-wav failed: {:?}", output);
    path
}

#[test]
fn predict_high_tone_is_happy() {
    let (dir, artifacts) = workspace();
    let wav = synth_wav(dir.path(), "bright.wav", &["--frequency", "5000", "--seconds", "2"]);

    let output = run(&["--artifacts-dir", &artifacts, "predict", "--file", &wav]);
    assert!(
        output.status.success(),
        "CLI exited with {:?}",
        output.status.code()
    );

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let json: Value = serde_json::from_str(stdout.trim()).expect("prediction report JSON");
    assert_eq!(json["result"]["status"], "success");
    assert_eq!(json["result"]["emotion"], "happy");
    assert!(json["result"]["confidence"].as_f64().unwrap_or_default() > 50.0);
}

#[test]
fn predict_detailed_reports_distribution() {
    let (dir, artifacts) = workspace();
    let wav = synth_wav(dir.path(), "low.wav", &["--frequency", "200"]);

    let output = run(&[
        "--artifacts-dir",
        &artifacts,
        "predict",
        "--file",
        &wav,
        "--detailed",
    ]);
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).expect("prediction report JSON");
    assert_eq!(json["result"]["emotion"], "calm");
    assert_eq!(json["result"]["distribution"].as_array().map(Vec::len), Some(2));
}

#[test]
fn predict_zero_byte_file_reports_failure() {
    let (dir, artifacts) = workspace();
    let wav = dir.path().join("empty.wav");
    std::fs::write(&wav, b"").unwrap();

    let output = run(&["--artifacts-dir", &artifacts, "predict", "--file", &path_arg(&wav)]);
    assert_eq!(output.status.code(), Some(2));

    let json: Value = serde_json::from_slice(&output.stdout).expect("prediction report JSON");
    assert_eq!(json["result"]["status"], "failure");
    assert_eq!(json["result"]["reason"], "decode");

    let stderr = String::from_utf8(output.stderr).expect("stderr UTF-8");
    assert!(stderr.contains("Error in processing the audio file."));
}

#[test]
fn predict_without_artifacts_exits_with_error() {
    let dir = TempDir::new().unwrap();
    let wav = synth_wav(dir.path(), "tone.wav", &[]);
    let missing = path_arg(&dir.path().join("no_artifacts"));

    let output = run(&["--artifacts-dir", &missing, "predict", "--file", &wav]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn features_reports_named_slices() {
    let dir = TempDir::new().unwrap();
    let wav = synth_wav(dir.path(), "noise.wav", &["--pattern", "white-noise"]);

    let output = run(&["features", "--file", &wav]);
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).expect("feature report JSON");
    assert_eq!(json["length"], 182);
    assert_eq!(json["chroma"].as_array().map(Vec::len), Some(12));
    assert_eq!(json["mfcc"].as_array().map(Vec::len), Some(40));
    assert_eq!(json["mel"].as_array().map(Vec::len), Some(128));
}

#[test]
fn inspect_summarizes_artifacts() {
    let (_dir, artifacts) = workspace();

    let output = run(&["--artifacts-dir", &artifacts, "inspect"]);
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).expect("inspect JSON");
    assert_eq!(json["feature_len"], 182);
    assert_eq!(json["scaler_dimension"], 182);
    assert_eq!(json["model_input_shape"], serde_json::json!([1, 182, 1]));
    assert_eq!(json["model_output_len"], 2);
    assert_eq!(json["labels"][1], "happy");
}

#[test]
fn check_fixtures_passes_and_detects_mismatch() {
    let (dir, artifacts) = workspace();
    let fixtures = dir.path().join("fixtures");
    std::fs::create_dir_all(&fixtures).unwrap();
    synth_wav(&fixtures, "bright.wav", &["--frequency", "5000"]);
    std::fs::write(fixtures.join("bright.expect.json"), r#"{ "label": "happy" }"#).unwrap();

    let fixtures_arg = path_arg(&fixtures);
    let output = run(&[
        "--artifacts-dir",
        &artifacts,
        "--fixtures-dir",
        &fixtures_arg,
        "check-fixtures",
    ]);
    assert!(
        output.status.success(),
        "check-fixtures exited with {:?}",
        output.status.code()
    );

    let wrong = dir.path().join("wrong.expect.json");
    std::fs::write(&wrong, r#"{ "label": "calm", "min_confidence": 10.0 }"#).unwrap();
    let output = run(&[
        "--artifacts-dir",
        &artifacts,
        "--fixtures-dir",
        &fixtures_arg,
        "check-fixtures",
        "--fixture",
        "bright",
        "--expect",
        &path_arg(&wrong),
    ]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8(output.stderr).expect("stderr UTF-8");
    assert!(
        stderr.contains("\"failures\""),
        "expected diff JSON in stderr, got {stderr}"
    );
}
