//! Integration tests for the escheck binary

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const FIXTURES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");
const SPEC_HTML: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../escheck-core/tests/fixtures/spec.html"
);

fn escheck(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_escheck"))
        .args(args)
        .env("NO_COLOR", "1")
        .output()
        .expect("Failed to run escheck")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn scrape_to(dir: &Path) -> PathBuf {
    let data = dir.join("data.json");
    let output = escheck(&["scrape", SPEC_HTML, "-o", data.to_str().unwrap()]);
    assert!(output.status.success(), "scrape failed: {}", stderr(&output));
    data
}

fn check_args<'a>(catalog: &'a str, extra: &[&'a str]) -> Vec<&'a str> {
    let mut args = vec![
        "check",
        concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/content"),
        "-c",
        concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/config.yml"),
        "--catalog",
        catalog,
    ];
    args.extend_from_slice(extra);
    args
}

#[test]
fn test_scrape_writes_catalog_and_keeps_backups() {
    let dir = tempfile::tempdir().unwrap();
    let data = scrape_to(dir.path());

    let json = std::fs::read_to_string(&data).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let names: Vec<&str> = value
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"Array"));
    assert!(names.contains(&"parseInt()"));

    let again = escheck(&["scrape", SPEC_HTML, "-o", data.to_str().unwrap()]);
    assert!(again.status.success());
    assert!(stderr(&again).contains("No change"));
    assert!(!dir.path().join("data.bak.json").exists());

    std::fs::write(&data, "[]\n").unwrap();
    let changed = escheck(&["scrape", SPEC_HTML, "-o", data.to_str().unwrap()]);
    assert!(changed.status.success());
    assert_eq!(
        std::fs::read_to_string(dir.path().join("data.bak.json")).unwrap(),
        "[]\n"
    );
    assert_eq!(std::fs::read_to_string(&data).unwrap(), json);
}

#[test]
fn test_scrape_writes_toc() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data.json");
    let toc = dir.path().join("toc.json");
    let output = escheck(&[
        "scrape",
        SPEC_HTML,
        "-o",
        data.to_str().unwrap(),
        "--toc",
        toc.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "scrape failed: {}", stderr(&output));
    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&toc).unwrap()).unwrap();
    assert!(value.as_array().is_some_and(|sections| !sections.is_empty()));
}

#[test]
fn test_check_writes_json_report() {
    let dir = tempfile::tempdir().unwrap();
    let data = scrape_to(dir.path());
    let out_dir = dir.path().join("generated");

    let output = escheck(&check_args(
        data.to_str().unwrap(),
        &["-f", "json", "--out-dir", out_dir.to_str().unwrap()],
    ));
    assert!(output.status.success(), "check failed: {}", stderr(&output));

    let report = std::fs::read_to_string(out_dir.join("report.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&report).unwrap();
    let push = "files/en-us/web/javascript/reference/global_objects/array/push/index.md";
    assert_eq!(value[push]["title"], "Array.prototype.push()");
    assert_eq!(value[push]["rules"]["bad-dl"][0], "Bad dl");
    assert!(value["*"]["rules"]["spec-alignment"].is_array());
}

#[test]
fn test_check_groups_by_rule_in_html() {
    let dir = tempfile::tempdir().unwrap();
    let data = scrape_to(dir.path());
    let out_dir = dir.path().join("html");

    let output = escheck(&check_args(
        data.to_str().unwrap(),
        &["-f", "html", "--by", "rule", "--out-dir", out_dir.to_str().unwrap()],
    ));
    assert!(output.status.success(), "check failed: {}", stderr(&output));

    let html = std::fs::read_to_string(out_dir.join("index.html")).unwrap();
    assert!(html.contains("<summary><code>bad-dl</code>"));
}

#[test]
fn test_check_mode_fails_on_reports() {
    let dir = tempfile::tempdir().unwrap();
    let data = scrape_to(dir.path());

    let output = escheck(&check_args(data.to_str().unwrap(), &["--check"]));
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Syntax uses wrong language"));
}

#[test]
fn test_missing_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("config.yml");
    let output = escheck(&[
        "check",
        FIXTURES_DIR,
        "-c",
        missing.to_str().unwrap(),
    ]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Config file not found"));
}

#[test]
fn test_unknown_format_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let data = scrape_to(dir.path());
    let output = escheck(&check_args(data.to_str().unwrap(), &["-f", "markdown"]));
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Unknown format 'markdown'"));
}
