//! Output format tests.
//!
//! Checks the JSON/JSONL shapes of photo reports.

#![allow(clippy::unwrap_used, clippy::expect_used)]
#![allow(deprecated)] // cargo_bin deprecation

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use skin_diag_test_support::SyntheticSkinBuilder;
use tempfile::TempDir;

fn skin_diag(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("skin-diag").unwrap();
    cmd.env("XDG_CONFIG_HOME", dir.join("xdg")).current_dir(dir);
    cmd
}

/// A temp dir with `count` textured faces named `face<i>.png`.
fn faces(count: usize) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let img = SyntheticSkinBuilder::textured_face().build();
    for i in 0..count {
        img.save(dir.path().join(format!("face{i}.png"))).unwrap();
    }
    dir
}

fn jsonl(dir: &Path, extra: &[&str]) -> Vec<Value> {
    let output = skin_diag(dir).args(extra).arg(dir).output().unwrap();
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).expect("each line is JSON"))
        .collect()
}

// === JSONL ===

#[test]
fn test_jsonl_format_single_object_per_line() {
    let dir = faces(1);
    let reports = jsonl(dir.path(), &[]);
    assert_eq!(reports.len(), 1);
    assert!(reports[0].is_object());
}

#[test]
fn test_jsonl_format_multiple_photos() {
    let dir = faces(3);
    let reports = jsonl(dir.path(), &["--format", "jsonl"]);
    assert_eq!(reports.len(), 3);
    let paths: Vec<&str> = reports.iter().map(|r| r["path"].as_str().unwrap()).collect();
    assert!(paths[0].ends_with("face0.png"));
    assert!(paths[2].ends_with("face2.png"));
}

// === JSON ===

#[test]
fn test_json_format_is_array() {
    let dir = faces(2);
    let output = skin_diag(dir.path())
        .arg("--format")
        .arg("json")
        .arg(dir.path())
        .output()
        .unwrap();
    let parsed: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 2);
}

#[test]
fn test_json_format_empty_array_for_no_photos() {
    let dir = tempfile::tempdir().unwrap();
    skin_diag(dir.path())
        .arg("--format")
        .arg("json")
        .arg(dir.path())
        .assert()
        .code(0)
        .stdout(predicate::str::starts_with("[]"));
}

#[test]
fn test_pretty_format_is_indented() {
    let dir = faces(1);
    skin_diag(dir.path())
        .args(["--format", "json", "--pretty"])
        .arg(dir.path())
        .assert()
        .stdout(predicate::str::contains("\n  {"));
}

#[test]
fn test_non_pretty_format_is_compact() {
    let dir = faces(1);
    let output = skin_diag(dir.path())
        .args(["--format", "json"])
        .arg(dir.path())
        .output()
        .unwrap();
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim().lines().count(), 1);
}

// === Report Shape ===

#[test]
fn test_success_report_fields() {
    let dir = faces(1);
    let report = &jsonl(dir.path(), &[])[0];

    assert_eq!(report["ok"], true);
    assert!(report.get("reason").is_none());
    let ts = report["timestamp"].as_str().unwrap();
    assert!(ts.contains('T') && (ts.ends_with('Z') || ts.contains('+')));

    let diagnosis = &report["diagnosis"];
    assert_eq!(diagnosis["schema_version"], "aurora.skin_diagnosis.v1");
    assert_eq!(report["policy"]["schema_version"], "aurora.skin_diagnosis_policy.v1");
    assert_eq!(report["internal"]["orig_size_px"]["w"], 256);
    assert!(report["internal"]["face_crop"]["crop_id"]
        .as_str()
        .unwrap()
        .starts_with("crop_"));
}

#[test]
fn test_issue_has_required_fields() {
    let dir = faces(1);
    let report = &jsonl(dir.path(), &[])[0];
    let issues = report["diagnosis"]["issues"].as_array().unwrap();
    let types: Vec<&str> = issues.iter().map(|i| i["issue_type"].as_str().unwrap()).collect();
    assert_eq!(types, ["acne", "redness", "pores", "dark_spots"]);

    for issue in issues {
        let level = issue["severity_level"].as_u64().unwrap();
        assert!(level <= 3);
        let confidence = issue["confidence"].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&confidence));
        for key in ["model_conf", "model_conf_calibrated", "quality_factor", "agreement_factor"] {
            assert!(issue["calibration"].get(key).is_some(), "missing {key}");
        }
        assert_eq!(issue["evidence"]["evidence_short"].as_array().unwrap().len(), 2);
    }
}

#[test]
fn test_failure_report_fields() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("broken.png"), vec![0u8; 128]).unwrap();

    let reports = jsonl(dir.path(), &[]);
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0]["ok"], false);
    assert_eq!(reports[0]["reason"], "decode_failed");
    assert!(reports[0]["error"].as_str().unwrap().contains("decode"));
    assert!(reports[0].get("diagnosis").is_none());
}

#[test]
fn test_module_card_shape() {
    let dir = faces(1);
    let report = &jsonl(dir.path(), &["--module-card"])[0];
    let Some(card) = report.get("module_card") else {
        assert_eq!(report["diagnosis"]["quality"]["grade"], "fail");
        return;
    };

    assert_eq!(card["type"], "photo_modules_v1");
    assert!(card["card_id"].as_str().unwrap().starts_with("photo_modules_crop_"));
    let modules = card["payload"]["modules"].as_array().unwrap();
    assert_eq!(modules.len(), 7);
    for module in modules {
        assert_eq!(module["mask_grid"], 64);
        assert!(!module["mask_rle_norm"].as_str().unwrap().is_empty());
        assert!(module.get("box").is_some());
    }
    assert_eq!(card["payload"]["disclaimers"]["non_medical"], true);
}

#[test]
fn test_module_card_absent_without_flag() {
    let dir = faces(1);
    let report = &jsonl(dir.path(), &[])[0];
    assert!(report.get("module_card").is_none());
}
