//! CLI tests: command functions called directly plus the binary itself
//! through assert_cmd.

#![allow(deprecated)] // Command::cargo_bin deprecation - no stable replacement yet

mod common;

use assert_cmd::Command;
use formpress::cli;
use formpress::FormpressError;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

fn fixture_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    common::write_fill_template(&dir.path().join("template3.xlsx"));
    common::write_clone_template(&dir.path().join("template-all.xlsx"));
    common::write_roster(&dir.path().join("data2.json"), &["An", "Binh", "Chi"]);
    dir
}

// ═══════════════════════════════════════════════════════════════════════════
// HELP AND VERSION
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("formpress").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("formpress"))
        .stdout(predicate::str::contains("COMMANDS"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("formpress").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("formpress"));
}

#[test]
fn test_fill_help() {
    let mut cmd = Command::cargo_bin("formpress").unwrap();
    cmd.args(["fill", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Fill the single-entry template"));
}

#[test]
fn test_clone_help() {
    let mut cmd = Command::cargo_bin("formpress").unwrap();
    cmd.args(["clone", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Clone the form sheet"));
}

#[test]
fn test_no_subcommand_fails_with_usage() {
    let mut cmd = Command::cargo_bin("formpress").unwrap();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

// ═══════════════════════════════════════════════════════════════════════════
// BINARY RUNS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_fill_binary_writes_output() {
    let dir = fixture_dir();
    let mut cmd = Command::cargo_bin("formpress").unwrap();
    cmd.current_dir(dir.path())
        .args(["fill", "data2.json", "--index", "1", "--verbose"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Written"))
        .stdout(predicate::str::contains("Binh"));
    assert!(dir.path().join("out/template3-filled.xlsx").exists());
}

#[test]
fn test_clone_binary_writes_output() {
    let dir = fixture_dir();
    let mut cmd = Command::cargo_bin("formpress").unwrap();
    cmd.current_dir(dir.path())
        .args([
            "clone",
            "data2.json",
            "--count",
            "2",
            "--output",
            "all.xlsx",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 sheet(s)"));
    assert!(dir.path().join("out/all.xlsx").exists());
}

#[test]
fn test_sheets_binary_lists_clones() {
    let dir = fixture_dir();
    Command::cargo_bin("formpress")
        .unwrap()
        .current_dir(dir.path())
        .args(["clone", "data2.json", "--output", "all.xlsx"])
        .assert()
        .success();

    let mut cmd = Command::cargo_bin("formpress").unwrap();
    cmd.current_dir(dir.path())
        .args(["sheets", "out/all.xlsx"])
        .assert()
        .success()
        .stdout(predicate::str::contains("form"))
        .stdout(predicate::str::contains("STT-0"))
        .stdout(predicate::str::contains("STT-2"));
}

#[test]
fn test_missing_data_file_fails() {
    let dir = TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("formpress").unwrap();
    cmd.current_dir(dir.path())
        .args(["fill", "absent.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("NotFound"));
}

#[test]
fn test_sheets_missing_workbook_fails() {
    let dir = TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("formpress").unwrap();
    cmd.current_dir(dir.path())
        .args(["sheets", "absent.xlsx"])
        .assert()
        .failure();
}

// ═══════════════════════════════════════════════════════════════════════════
// COMMAND FUNCTIONS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_fill_command_index_out_of_range() {
    let dir = fixture_dir();
    let err = cli::fill(
        dir.path().join("data2.json"),
        7,
        Some(dir.path().join("template3.xlsx")),
        None,
        dir.path().join("out"),
        "filled.xlsx".to_string(),
        false,
    )
    .unwrap_err();
    assert!(matches!(err, FormpressError::IndexOutOfRange(7, 3)));
}

#[test]
fn test_fill_command_empty_roster() {
    let dir = TempDir::new().unwrap();
    common::write_fill_template(&dir.path().join("template3.xlsx"));
    let roster = dir.path().join("empty.json");
    std::fs::write(&roster, "[]").unwrap();

    let err = cli::fill(
        roster,
        0,
        Some(dir.path().join("template3.xlsx")),
        None,
        dir.path().join("out"),
        "filled.xlsx".to_string(),
        false,
    )
    .unwrap_err();
    assert!(matches!(err, FormpressError::NoRecords));
}

#[test]
fn test_clone_command_start_beyond_roster() {
    let dir = fixture_dir();
    let err = cli::clone(
        dir.path().join("data2.json"),
        Some(dir.path().join("template-all.xlsx")),
        None,
        9,
        None,
        dir.path().join("out"),
        "all.xlsx".to_string(),
        false,
    )
    .unwrap_err();
    assert!(matches!(err, FormpressError::IndexOutOfRange(9, 3)));
}

#[test]
fn test_clone_command_count_clamped_to_roster() {
    let dir = fixture_dir();
    cli::clone(
        dir.path().join("data2.json"),
        Some(dir.path().join("template-all.xlsx")),
        None,
        1,
        Some(100),
        dir.path().join("out"),
        "all.xlsx".to_string(),
        false,
    )
    .unwrap();

    let workbook = formpress::excel::Workbook::open(&dir.path().join("out/all.xlsx")).unwrap();
    // Two remaining records from start index 1.
    assert_eq!(
        workbook.sheet_names(),
        vec!["form", "notes", "STT-0", "STT-1"]
    );
}

#[test]
fn test_sheets_command_lists_template() {
    let dir = fixture_dir();
    cli::sheets(dir.path().join("template-all.xlsx")).unwrap();
}

#[test]
fn test_fill_command_custom_template_path() {
    let dir = fixture_dir();
    let nested: PathBuf = dir.path().join("templates/custom.xlsx");
    std::fs::create_dir_all(nested.parent().unwrap()).unwrap();
    common::write_fill_template(&nested);

    cli::fill(
        dir.path().join("data2.json"),
        0,
        Some(nested),
        None,
        dir.path().join("out"),
        "custom-filled.xlsx".to_string(),
        false,
    )
    .unwrap();
    assert!(dir.path().join("out/custom-filled.xlsx").exists());
}
