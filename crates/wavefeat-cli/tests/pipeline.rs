use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::{json, Value};
use std::{error::Error, fs, path::Path};
use tempfile::tempdir;

fn simulate_csv(path: &Path, beats: &str, fs_hz: &str) -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("wavefeat");
    cmd.args([
        "simulate", "--format", "csv", "--heart-rate", "60", "--beats", beats, "--fs", fs_hz,
    ]);
    let output = cmd.assert().success().get_output().stdout.clone();
    fs::write(path, output)?;
    Ok(())
}

#[test]
fn extract_reports_troughs_peaks_and_cycles() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let csv = dir.path().join("abp.csv");
    simulate_csv(&csv, "2.5", "10")?;

    let mut cmd = cargo_bin_cmd!("wavefeat");
    cmd.args(["extract", "--kind", "troughs", "--kind", "peaks", "--kind", "cycles", "--input"])
        .arg(&csv);
    let output = cmd.assert().success().get_output().stdout.clone();
    let actual: Value = serde_json::from_slice(&output)?;

    assert_eq!(actual["pressure"]["troughs"], json!([0, 10, 20]));
    assert_eq!(actual["pressure"]["peaks"], json!([3, 13, 23]));
    assert_eq!(
        actual["pressure"]["cycles"],
        json!([{ "start": 0, "end": 10 }, { "start": 10, "end": 20 }])
    );
    Ok(())
}

#[test]
fn extract_only_emits_requested_kinds() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let csv = dir.path().join("abp.csv");
    simulate_csv(&csv, "3", "50")?;

    let mut cmd = cargo_bin_cmd!("wavefeat");
    cmd.args(["extract", "--kind", "cycles", "--fs", "50", "--heart-rate", "60", "--input"])
        .arg(&csv);
    let output = cmd.assert().success().get_output().stdout.clone();
    let actual: Value = serde_json::from_slice(&output)?;
    let features = actual["pressure"].as_object().expect("feature map");
    assert_eq!(features.len(), 1);
    assert_eq!(actual["pressure"]["cycles"].as_array().map(Vec::len), Some(3));
    Ok(())
}

#[test]
fn extract_reads_samples_from_stdin() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("wavefeat");
    cmd.args(["extract", "--cycle-samples", "6"])
        .write_stdin("# jittery minima\n5\n4\n1\n1.2\n1.1\n3\n5\n4\n2\n0.5\n0.6\n0.55\n3\n5\n");
    let output = cmd.assert().success().get_output().stdout.clone();
    let actual: Value = serde_json::from_slice(&output)?;
    assert_eq!(actual, json!({ "signal": { "troughs": [2, 9] } }));
    Ok(())
}

#[test]
fn extract_fails_on_single_sample() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("one.txt");
    fs::write(&input, "80.0\n")?;
    let mut cmd = cargo_bin_cmd!("wavefeat");
    cmd.args(["extract", "--input"]).arg(&input);
    cmd.assert().failure();
    Ok(())
}

#[test]
fn extract_fails_on_unknown_column() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let csv = dir.path().join("abp.csv");
    simulate_csv(&csv, "2", "10")?;
    let mut cmd = cargo_bin_cmd!("wavefeat");
    cmd.args(["extract", "--column", "flow", "--input"]).arg(&csv);
    cmd.assert().failure();
    Ok(())
}
