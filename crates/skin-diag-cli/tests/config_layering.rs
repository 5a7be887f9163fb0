//! Integration tests for configuration layering.
//!
//! Tests the full priority chain: hardcoded defaults < XDG config < project config < CLI args

#![allow(clippy::unwrap_used)] // Test code uses unwrap for brevity
#![allow(deprecated)] // cargo_bin deprecation warning

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use skin_diag_test_support::SyntheticSkinBuilder;

/// A command whose XDG config home and cwd are `dir`.
fn skin_diag(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("skin-diag").unwrap();
    cmd.env("XDG_CONFIG_HOME", dir.join("xdg")).current_dir(dir);
    cmd
}

fn write_face(dir: &Path) -> PathBuf {
    let path = dir.join("face.png");
    SyntheticSkinBuilder::textured_face().build().save(&path).unwrap();
    path
}

fn write_xdg_config(dir: &Path, body: &str) {
    let xdg = dir.join("xdg").join("skin-diag");
    fs::create_dir_all(&xdg).unwrap();
    fs::write(xdg.join("config.toml"), body).unwrap();
}

#[test]
fn test_project_config_applies_format() {
    let dir = tempfile::tempdir().unwrap();
    let face = write_face(dir.path());
    fs::write(dir.path().join(".skin-diag.toml"), "[output]\nformat = 'json'\n").unwrap();

    skin_diag(dir.path())
        .arg(face)
        .assert()
        .code(0)
        .stdout(predicate::str::starts_with("["));
}

#[test]
fn test_cli_overrides_project_config() {
    let dir = tempfile::tempdir().unwrap();
    let face = write_face(dir.path());
    fs::write(dir.path().join(".skin-diag.toml"), "[output]\nformat = 'json'\n").unwrap();

    skin_diag(dir.path())
        .arg("--format")
        .arg("jsonl")
        .arg(face)
        .assert()
        .code(0)
        .stdout(predicate::str::starts_with("{"));
}

#[test]
fn test_project_config_found_in_parent_directory() {
    let dir = tempfile::tempdir().unwrap();
    let face = write_face(dir.path());
    fs::write(dir.path().join(".skin-diag.toml"), "[output]\nformat = 'json'\n").unwrap();
    let nested = dir.path().join("a").join("b");
    fs::create_dir_all(&nested).unwrap();

    let mut cmd = Command::cargo_bin("skin-diag").unwrap();
    cmd.env("XDG_CONFIG_HOME", dir.path().join("xdg"))
        .current_dir(&nested)
        .arg(face)
        .assert()
        .code(0)
        .stdout(predicate::str::starts_with("["));
}

#[cfg(target_os = "linux")]
#[test]
fn test_project_config_overrides_xdg_config() {
    let dir = tempfile::tempdir().unwrap();
    let face = write_face(dir.path());
    write_xdg_config(dir.path(), "[general]\nlanguage = 'cn'\n\n[output]\nformat = 'json'\n");
    fs::write(dir.path().join(".skin-diag.toml"), "[output]\nformat = 'jsonl'\n").unwrap();

    let output = skin_diag(dir.path()).arg(face).output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with('{'), "project format wins: {stdout}");

    // Language survives from the XDG layer
    let report: Value = serde_json::from_str(stdout.lines().next().unwrap()).unwrap();
    let texts = report["diagnosis"]["issues"][0]["evidence"]["evidence_short"]
        .as_array()
        .unwrap();
    assert!(texts
        .iter()
        .any(|t| t.as_str().unwrap().chars().any(|c| !c.is_ascii())));
}

#[test]
fn test_config_enables_module_card() {
    let dir = tempfile::tempdir().unwrap();
    let face = write_face(dir.path());
    fs::write(dir.path().join(".skin-diag.toml"), "[modules]\nenabled = true\n").unwrap();

    let output = skin_diag(dir.path()).arg(face).output().unwrap();
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    let usable = report["diagnosis"]["quality"]["grade"] != "fail";
    assert_eq!(report.get("module_card").is_some(), usable);
}

#[test]
fn test_invalid_config_value_warns_and_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let face = write_face(dir.path());
    fs::write(
        dir.path().join(".skin-diag.toml"),
        "[output]\nformat = 'xml'\n\n[modules]\ngrid = 9000\n",
    )
    .unwrap();

    skin_diag(dir.path())
        .arg(face)
        .assert()
        .code(0)
        .stderr(
            predicate::str::contains("output.format").and(predicate::str::contains("modules.grid")),
        )
        .stdout(predicate::str::starts_with("{"));
}

#[test]
fn test_unparseable_config_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let face = write_face(dir.path());
    fs::write(dir.path().join(".skin-diag.toml"), "[output\nformat = 'json'\n").unwrap();

    skin_diag(dir.path())
        .arg(face)
        .assert()
        .code(0)
        .stderr(predicate::str::contains("Failed to parse config file"))
        .stdout(predicate::str::starts_with("{"));
}
