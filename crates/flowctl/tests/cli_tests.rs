//! End-to-end tests for the flowctl binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const QA: &str = r#"
apiVersion: flowpilot.dev/v1
kind: Flow
metadata:
  name: QA
spec:
  description: "answers questions"
  steps:
    - goal: answer
"#;

const INTERVIEWER: &str = r#"
apiVersion: flowpilot.dev/v1
kind: Flow
metadata:
  name: Interviewer
spec:
  description: "conducts an interview"
  patterns: ["interview", "phone\\s+screen"]
  steps:
    - goal: generate a problem
      plugins: [GenerateProblem]
    - goal: answer questions
      flow: QA
"#;

fn flows_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, content) in files {
        fs::write(dir.path().join(name), content).unwrap();
    }
    dir
}

fn flowctl(flows: &Path) -> Command {
    let mut cmd = Command::cargo_bin("flowctl").unwrap();
    cmd.env_remove("RUST_LOG").arg("--flows").arg(flows);
    cmd
}

fn demo_flows() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/flows")
}

#[test]
fn test_validate_reports_flows() {
    let dir = flows_dir(&[("qa.yaml", QA), ("interviewer.yaml", INTERVIEWER)]);

    flowctl(dir.path())
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("flow/Interviewer (2 steps) -> QA"))
        .stdout(predicate::str::contains("2 flows valid"));
}

#[test]
fn test_validate_fails_on_unresolved_reference() {
    let dir = flows_dir(&[("interviewer.yaml", INTERVIEWER)]);

    flowctl(dir.path())
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("QA"));
}

#[test]
fn test_validate_fails_on_duplicate_name() {
    let dir = flows_dir(&[("a.yaml", QA), ("b.yaml", QA)]);

    flowctl(dir.path()).arg("validate").assert().failure();
}

#[test]
fn test_get_flows_names() {
    let dir = flows_dir(&[("qa.yaml", QA), ("interviewer.yaml", INTERVIEWER)]);

    flowctl(dir.path())
        .args(["get", "flows", "-o", "name"])
        .assert()
        .success()
        .stdout(predicate::str::contains("flow/QA"))
        .stdout(predicate::str::contains("flow/Interviewer"));
}

#[test]
fn test_get_flows_json() {
    let dir = flows_dir(&[("qa.yaml", QA)]);

    let output = flowctl(dir.path())
        .args(["get", "flows", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let list: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(list["kind"], "FlowList");
    assert_eq!(list["items"][0]["metadata"]["name"], "QA");
}

#[test]
fn test_get_unknown_resource() {
    let dir = flows_dir(&[("qa.yaml", QA)]);

    flowctl(dir.path())
        .args(["get", "agents"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown resource type"));
}

#[test]
fn test_describe_flow() {
    let dir = flows_dir(&[("qa.yaml", QA), ("interviewer.yaml", INTERVIEWER)]);

    flowctl(dir.path())
        .args(["describe", "Interviewer"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Delegates to: QA"))
        .stdout(predicate::str::contains("Referenced Flows:"));
}

#[test]
fn test_describe_missing_flow() {
    let dir = flows_dir(&[("qa.yaml", QA)]);

    flowctl(dir.path())
        .args(["describe", "Billing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_classify_matches_pattern() {
    let dir = flows_dir(&[("qa.yaml", QA), ("interviewer.yaml", INTERVIEWER)]);

    flowctl(dir.path())
        .args(["classify", "Let's start the phone screen"])
        .assert()
        .success()
        .stdout("Interviewer\n");
}

#[test]
fn test_classify_falls_back_to_default() {
    let dir = flows_dir(&[("qa.yaml", QA), ("interviewer.yaml", INTERVIEWER)]);

    flowctl(dir.path())
        .args(["classify", "What's the longest river in the world"])
        .assert()
        .success()
        .stdout("QA\n");
}

#[test]
fn test_classify_with_config() {
    let dir = flows_dir(&[("qa.yaml", QA), ("interviewer.yaml", INTERVIEWER)]);
    let config_dir = TempDir::new().unwrap();
    let config = config_dir.path().join("router.yaml");
    fs::write(&config, "defaultFlow: Interviewer\n").unwrap();

    flowctl(dir.path())
        .args(["classify", "hello there", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout("Interviewer\n");
}

#[test]
fn test_classify_rejects_unknown_default_flow() {
    let dir = flows_dir(&[("qa.yaml", QA)]);
    let config_dir = TempDir::new().unwrap();
    let config = config_dir.path().join("router.yaml");
    fs::write(&config, "defaultFlow: Billing\nexamples: []\n").unwrap();

    flowctl(dir.path())
        .args(["classify", "hello", "-c"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Billing"));
}

#[test]
fn test_demo_flows_are_valid() {
    flowctl(&demo_flows())
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("flow/Interviewer (6 steps) -> QA"));
}

#[test]
fn test_completion_bash() {
    Command::cargo_bin("flowctl")
        .unwrap()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("flowctl"));
}
