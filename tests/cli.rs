use std::fs::write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::{tempdir, NamedTempFile};

#[test]
fn help_lists_subcommands() {
    let mut cmd = Command::cargo_bin("aip2pdf").expect("Binary exists");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("sync").and(predicate::str::contains("assemble")));
}

#[test]
fn sync_fails_on_invalid_config() {
    let config = NamedTempFile::new().expect("Creating temp config file failed");
    write(
        config.path(),
        b"mirror:\n  root_url: not-a-url\n  output_dir: ./tmp\n",
    )
    .expect("Writing temp config failed");

    let mut cmd = Command::cargo_bin("aip2pdf").expect("Binary exists");
    cmd.arg("sync")
        .arg("--config")
        .arg(config.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("root_url"));
}

#[test]
fn sync_requires_config_flag() {
    let mut cmd = Command::cargo_bin("aip2pdf").expect("Binary exists");
    cmd.arg("sync").assert().failure();
}

#[test]
fn assemble_empty_directory_succeeds_without_output() {
    let dir = tempdir().unwrap();

    let mut cmd = Command::cargo_bin("aip2pdf").expect("Binary exists");
    cmd.arg("assemble")
        .arg("--dir")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No images to assemble"));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn assemble_missing_directory_fails() {
    let dir = tempdir().unwrap();

    let mut cmd = Command::cargo_bin("aip2pdf").expect("Binary exists");
    cmd.arg("assemble")
        .arg("--dir")
        .arg(dir.path().join("absent"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Assembly failed"));
}
