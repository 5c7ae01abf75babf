//! Integration tests for `telemux analyze` and `telemux monitor`
#![allow(deprecated)] // suppress assert_cmd::Command::cargo_bin deprecation in tests

use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

/// Pulse deltas 10, 11, 9, 10, 10, 11, 9 and one 4830 outlier
fn sample_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Timestamp,Amplitude").unwrap();
    for (t, v) in [
        (100, 90),
        (105, 300),
        (110, 80),
        (115, 300),
        (121, 70),
        (125, 300),
        (130, 60),
        (140, 100),
        (150, 120),
        (161, 90),
        (170, 80),
        (300, 200),
        (5000, 50),
    ] {
        writeln!(file, "{},{}", t, v).unwrap();
    }
    writeln!(file, "700,not-a-number").unwrap();
    file
}

#[test]
fn test_analyze_text_report() {
    let file = sample_file();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("telemux");
    cmd.arg("analyze").arg(file.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Median time difference:"))
        .stdout(predicate::str::contains("Min time difference:                9"))
        .stdout(predicate::str::contains("Max time difference:                11"))
        .stdout(predicate::str::contains("1 outliers discarded"))
        .stdout(predicate::str::contains("Histogram"))
        .stderr(predicate::str::contains("Skipping malformed line"));
}

#[test]
fn test_analyze_json_report() {
    let file = sample_file();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("telemux");
    cmd.arg("analyze").arg(file.path()).arg("--format").arg("json");

    let output = cmd.output().unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["status"], "summary");
    assert_eq!(json["discarded"], 1);
    assert_eq!(
        json["summary"]["filtered"],
        serde_json::json!([10, 11, 9, 10, 10, 11, 9])
    );
    assert_eq!(json["summary"]["median"], 10.0);
}

#[test]
fn test_analyze_csv_report() {
    let file = sample_file();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("telemux");
    cmd.arg("analyze").arg(file.path()).arg("--format").arg("csv");

    cmd.assert()
        .success()
        .stdout(predicate::eq("delta\n10\n11\n9\n10\n10\n11\n9\n"));
}

#[test]
fn test_analyze_threshold_override() {
    let file = sample_file();

    // Only the pulse at t=5000 (amplitude 50) is below 55
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("telemux");
    cmd.arg("analyze").arg(file.path()).arg("--threshold").arg("55");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("No hall ping delta times were produced."));
}

#[test]
fn test_analyze_config_file() {
    let file = sample_file();
    let mut config = NamedTempFile::new().unwrap();
    writeln!(config, "[analysis]\nthreshold = 55").unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("telemux");
    cmd.arg("--config")
        .arg(config.path())
        .arg("analyze")
        .arg(file.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("No hall ping delta times were produced."));
}

#[test]
fn test_analyze_missing_file() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("telemux");
    cmd.arg("analyze").arg("/nonexistent/telemux/2_run.csv");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("cannot read analysis input"));
}

#[test]
fn test_analyze_rejects_negative_multiplier() {
    let file = sample_file();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("telemux");
    cmd.arg("analyze")
        .arg(file.path())
        .arg("--iqr-multiplier=-1");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("iqr_multiplier"));
}

#[test]
fn test_monitor_prints_selected_kinds() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("telemux");
    cmd.arg("monitor")
        .write_stdin("2,10,100\n1,11,5\n3,15,300\n2,30,100\n");

    cmd.assert()
        .success()
        .stdout(predicate::eq("2,100\n3,300\n2,100\n2 delta=20\n"));
}

#[test]
fn test_monitor_custom_kinds() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("telemux");
    cmd.arg("monitor")
        .arg("--kinds")
        .arg("1")
        .write_stdin("2,10,100\n1,11,5\n");

    cmd.assert().success().stdout(predicate::eq("1,5\n"));
}

#[test]
fn test_monitor_max_line_len() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("telemux");
    cmd.arg("monitor")
        .arg("--max-line-len")
        .arg("16")
        .write_stdin(format!("2,{},100\n2,5,90\n", "1".repeat(40)));

    cmd.assert().success().stdout(predicate::eq("2,90\n"));
}
