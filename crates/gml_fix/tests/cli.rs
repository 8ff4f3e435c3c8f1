//! End-to-end tests for the gml-fix binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn cli() -> Command {
    Command::cargo_bin("gml-fix").unwrap()
}

fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, content) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
    dir
}

#[test]
fn test_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("--remove-standalone-vertex-end"));
}

#[test]
fn test_reports_applied_fix() {
    let dir = project(&[("scripts/draw.gml", "gpu_set_blendmode(bm_add);\ndraw_self();\n")]);
    cli()
        .arg(dir.path())
        .args(["--select", "GM2000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("GM2000"))
        .stdout(predicate::str::contains("Applied 1 fix(es) in 1 file(s)"));
}

#[test]
fn test_json_output_is_one_object_per_fix() {
    let dir = project(&[("stray.gml", "break;\n")]);
    let output = cli()
        .arg(dir.path().join("stray.gml"))
        .args(["--select", "GM1000", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let records: Vec<serde_json::Value> = stdout.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["fix"]["id"], "GM1000");
    assert_eq!(records[0]["fix"]["automatic"], true);
    assert_eq!(records[0]["line"], 1);
    assert_eq!(records[0]["column"], 1);
}

#[test]
fn test_manual_records_hidden_by_default() {
    let dir = project(&[("clean.gml", "x = 1;\n")]);
    cli()
        .arg(dir.path())
        .args(["--select", "GM1000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No fixes needed!"))
        .stdout(predicate::str::contains("[GM1000]").not());

    cli()
        .arg(dir.path())
        .args(["--select", "GM1000", "--manual"])
        .assert()
        .success()
        .stdout(predicate::str::contains("manual"))
        .stdout(predicate::str::contains("[GM1000]"));
}

#[test]
fn test_custom_catalog() {
    let dir = project(&[
        ("catalog.json", r#"[{"id": "GM1000", "title": "Stray break"}]"#),
        ("stray.gml", "break;\n"),
    ]);
    cli()
        .arg(dir.path().join("stray.gml"))
        .arg("--catalog")
        .arg(dir.path().join("catalog.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Stray break"));
}

#[test]
fn test_unknown_id_warns() {
    let dir = project(&[("a.gml", "x = 1;\n")]);
    cli()
        .arg(dir.path())
        .args(["--select", "GM9999"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Unknown diagnostic id in --select: GM9999"));
}

#[test]
fn test_parse_failure_exits_nonzero() {
    let dir = project(&[("broken.gml", "x = ;\n"), ("ok.gml", "break;\n")]);
    cli()
        .arg(dir.path())
        .args(["--select", "GM1000"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("broken.gml"))
        .stdout(predicate::str::contains("ok.gml"));
}

#[test]
fn test_quiet_prints_nothing() {
    let dir = project(&[("stray.gml", "break;\n")]);
    cli()
        .arg(dir.path())
        .arg("--quiet")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_empty_directory() {
    let dir = TempDir::new().unwrap();
    cli()
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No GML files found"));
}
