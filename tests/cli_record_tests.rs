//! Integration tests for `telemux record`
#![allow(deprecated)] // suppress assert_cmd::Command::cargo_bin deprecation in tests

use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// CSV files in `dir` whose name starts with `{kind}_`
fn sink_files(dir: &Path, kind: &str) -> Vec<PathBuf> {
    let prefix = format!("{}_", kind);
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| {
            let name = p.file_name().unwrap().to_string_lossy();
            name.starts_with(&prefix) && name.ends_with(".csv")
        })
        .collect();
    files.sort();
    files
}

#[test]
fn test_record_splits_stdin_by_kind() {
    let dir = tempfile::tempdir().unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("telemux");
    cmd.arg("record")
        .arg("--out-dir")
        .arg(dir.path())
        .write_stdin("2,100,200\n3,101,90\n2,102,100\nnot a record\n\n2,103,120\n");

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("4 records, 1 malformed lines"));

    let kind2 = sink_files(dir.path(), "2");
    assert_eq!(kind2.len(), 1);
    assert_eq!(
        fs::read_to_string(&kind2[0]).unwrap(),
        "Timestamp,Amplitude\n100,200\n102,100\n103,120\n"
    );

    let kind3 = sink_files(dir.path(), "3");
    assert_eq!(kind3.len(), 1);
    assert_eq!(
        fs::read_to_string(&kind3[0]).unwrap(),
        "Timestamp,Amplitude\n101,90\n"
    );
}

#[test]
fn test_record_reads_input_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("capture.txt");
    fs::write(&input, "7,1,5\r\n7,2,6\r\n").unwrap();
    let out = dir.path().join("out");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("telemux");
    cmd.arg("record")
        .arg("--input")
        .arg(&input)
        .arg("--out-dir")
        .arg(&out);

    cmd.assert().success();

    let files = sink_files(&out, "7");
    assert_eq!(files.len(), 1);
    assert_eq!(
        fs::read_to_string(&files[0]).unwrap(),
        "Timestamp,Amplitude\n1,5\n2,6\n"
    );
}

#[test]
fn test_record_discards_oversized_lines() {
    let dir = tempfile::tempdir().unwrap();
    let long = format!("2,{},1\n2,5,6\n", "1".repeat(200));

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("telemux");
    cmd.arg("record")
        .arg("--out-dir")
        .arg(dir.path())
        .arg("--max-line-len")
        .arg("64")
        .write_stdin(long);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("1 oversized lines"));

    let files = sink_files(dir.path(), "2");
    assert_eq!(
        fs::read_to_string(&files[0]).unwrap(),
        "Timestamp,Amplitude\n5,6\n"
    );
}

#[test]
fn test_record_empty_stream_creates_nothing() {
    let dir = tempfile::tempdir().unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("telemux");
    cmd.arg("record").arg("--out-dir").arg(dir.path()).write_stdin("");

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("0 records"));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_record_missing_input_fails() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("telemux");
    cmd.arg("record")
        .arg("--input")
        .arg("/nonexistent/telemux/device");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open input"));
}

#[test]
fn test_record_rejects_zero_line_bound() {
    let dir = tempfile::tempdir().unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("telemux");
    cmd.arg("record")
        .arg("--out-dir")
        .arg(dir.path())
        .arg("--max-line-len")
        .arg("0")
        .write_stdin("2,1,1\n");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("max_line_len"));
}

#[test]
fn test_record_kind_limit_drops_extra_kinds() {
    let dir = tempfile::tempdir().unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("telemux");
    cmd.arg("record")
        .arg("--out-dir")
        .arg(dir.path())
        .arg("--max-kinds")
        .arg("2")
        .write_stdin("2,1,1\n3,2,2\nx7,3,3\ny8,4,4\n2,5,5\n");

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("3 records"))
        .stderr(predicate::str::contains("2 over kind limit"));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
}

#[test]
fn test_record_lookalike_kinds_stay_separate() {
    let dir = tempfile::tempdir().unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("telemux");
    cmd.arg("record")
        .arg("--out-dir")
        .arg(dir.path())
        .write_stdin("a.b,1,10\na_b,2,20\na.b,3,30\n");

    cmd.assert().success();

    let dotted = sink_files(dir.path(), "a%2Eb");
    let underscored = sink_files(dir.path(), "a_b");
    assert_eq!(dotted.len(), 1);
    assert_eq!(underscored.len(), 1);
    assert_eq!(
        fs::read_to_string(&dotted[0]).unwrap(),
        "Timestamp,Amplitude\n1,10\n3,30\n"
    );
    assert_eq!(
        fs::read_to_string(&underscored[0]).unwrap(),
        "Timestamp,Amplitude\n2,20\n"
    );
}
