use std::path::Path;

use assert_cmd::Command;

const FAKESTORE: &str = r#"
{
    "name": "fakestore",
    "output_path": "output",
    "api_base": "https://fakestoreapi.com",
    "variables": {"next_id": "1"},
    "requests": [
        {
            "desc": "add a product",
            "method": "POST",
            "endpoint": "/products",
            "body": {"price": "{{next_id}}"},
            "callback": "increment_id"
        },
        {
            "desc": "list products",
            "method": "GET",
            "endpoint": "/products",
            "params": {"sort": "desc"}
        }
    ]
}
"#;

fn write_project(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn quiver() -> Command {
    let bin = assert_cmd::cargo::cargo_bin!("quiver");
    Command::new(bin)
}

#[test]
fn validate_accepts_a_project_with_registered_callbacks() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_project(dir.path(), "project.json", FAKESTORE);

    let assert = quiver()
        .args([
            "validate",
            path.to_string_lossy().as_ref(),
            "--callback",
            "increment_id=increment:next_id",
        ])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(stdout.contains("valid project `fakestore`"));
}

#[test]
fn validate_rejects_an_unregistered_callback() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_project(dir.path(), "project.json", FAKESTORE);

    let assert = quiver()
        .args(["validate", path.to_string_lossy().as_ref()])
        .assert()
        .code(2); // VALIDATION_FAILED
    let stderr = String::from_utf8(assert.get_output().stderr.clone()).unwrap();
    assert!(stderr.contains("requests[0].callback"));
}

#[test]
fn validate_reports_violations_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_project(dir.path(), "project.json", FAKESTORE);

    let assert = quiver()
        .args([
            "validate",
            path.to_string_lossy().as_ref(),
            "--format",
            "json",
        ])
        .assert()
        .code(2);
    let result: serde_json::Value =
        serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(result["valid"], false);
    assert!(result["errors"][0]
        .as_str()
        .unwrap()
        .contains("increment_id"));
}

#[test]
fn validate_fails_on_a_missing_file() {
    quiver()
        .args(["validate", "/nonexistent/project.json"])
        .assert()
        .code(2);
}

#[test]
fn malformed_callback_spec_is_a_runtime_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_project(dir.path(), "project.json", FAKESTORE);

    quiver()
        .args([
            "validate",
            path.to_string_lossy().as_ref(),
            "--callback",
            "bump=explode:x",
        ])
        .assert()
        .code(4); // RUNTIME_ERROR
}

#[test]
fn requests_lists_every_request_with_its_index() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_project(dir.path(), "project.json", FAKESTORE);

    let assert = quiver()
        .args(["requests", path.to_string_lossy().as_ref()])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(stdout.contains("[0] POST /products - add a product"));
    assert!(stdout.contains("[1] GET /products - list products"));
}

#[test]
fn requests_emits_machine_readable_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_project(dir.path(), "project.json", FAKESTORE);

    let assert = quiver()
        .args([
            "requests",
            path.to_string_lossy().as_ref(),
            "--format",
            "json",
        ])
        .assert()
        .success();
    let result: serde_json::Value =
        serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(result["project"], "fakestore");
    assert_eq!(result["requests"].as_array().unwrap().len(), 2);
    assert_eq!(result["requests"][0]["callback"], "increment_id");
}

#[test]
fn yaml_projects_load_like_json_ones() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_project(
        dir.path(),
        "project.yaml",
        r#"
name: weather
api_base: https://api.example.com
requests:
  - desc: current conditions
    method: GET
    endpoint: /conditions
"#,
    );

    let assert = quiver()
        .args(["requests", path.to_string_lossy().as_ref()])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(stdout.contains("weather (1 requests)"));
}

#[test]
fn base_project_requests_show_through_the_child() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path(), "base.json", FAKESTORE);
    let child = write_project(
        dir.path(),
        "child.json",
        r#"{"name": "staging", "base_project": "base.json", "api_base": "https://staging.fakestoreapi.com"}"#,
    );

    let assert = quiver()
        .args(["requests", child.to_string_lossy().as_ref()])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(stdout.contains("staging (2 requests)"));
    assert!(stdout.contains("[0] POST /products"));
}
