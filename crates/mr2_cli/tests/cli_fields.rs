use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use mr2_core::codec;
use mr2_core::document::SaveDocument;
use serde_json::{Value, json};

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..")
}

fn sample_save_path() -> String {
    workspace_root()
        .join("tests/fixtures/sample.sav")
        .to_string_lossy()
        .to_string()
}

fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_mr2-se"))
        .args(args)
        .output()
        .expect("failed to run mr2-se CLI")
}

fn stdout_json(output: &std::process::Output) -> Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).expect("stdout should be valid JSON")
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

#[test]
fn default_output_prints_every_section() {
    let output = run_cli(&[&sample_save_path()]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(" ::: Resources :::"));
    assert!(stdout.contains(" ::: Buildings :::"));
    assert!(stdout.contains(" ::: Inventory :::"));
    assert!(stdout.contains(" ::: Equipment :::"));
    assert!(stdout.contains("gold: 12500"));
    assert!(stdout.contains("8x healingHerb [#0, #3]"));
}

#[test]
fn json_output_uses_canonical_section_order() {
    let output = run_cli(&["--json", &sample_save_path()]);
    assert!(output.status.success());

    let json = stdout_json(&output);
    let keys: Vec<&str> = json
        .as_object()
        .expect("json should be an object")
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(keys, vec!["resources", "buildings", "inventory", "equipment"]);
    assert_eq!(json["resources"]["mana"], 340.75);
}

#[test]
fn section_flags_limit_json_output() {
    let output = run_cli(&["--buildings", "--json", &sample_save_path()]);
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json.as_object().map(|o| o.len()), Some(1));
    assert_eq!(json["buildings"]["library"], json!({"current": 1, "turnedOn": 0}));
}

#[test]
fn structure_and_layers_report_document_shape() {
    let path = sample_save_path();
    let output = run_cli(&["--structure", "--layers", "--json", &path]);
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["structure"]["saveVersion"], "integer");
    assert_eq!(json["structure"]["gameState"], "mapping");
    let size = fs::metadata(&path).expect("fixture should exist").len();
    assert_eq!(json["layers"]["outer_base64"], size);
    assert!(json.get("resources").is_none());

    let output = run_cli(&["--structure", &path]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("settings: mapping"));
}

#[test]
fn edit_flags_require_output() {
    let output = run_cli(&["--set-resource", "gold=1", &sample_save_path()]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("require --output"));
}

#[test]
fn output_requires_an_edit() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let out = dir.path().join("edited.sav");
    let output = run_cli(&["--output", &path_arg(&out), &sample_save_path()]);
    assert_eq!(output.status.code(), Some(2));
    assert!(!out.exists());
}

#[test]
fn edits_are_written_and_reload_with_new_values() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let out = dir.path().join("edited.sav");

    let output = run_cli(&[
        "--set-resource",
        "gold=99999",
        "--set-resource",
        "wood=500.0",
        "--set-building",
        "manaSpring.turnedOn=2",
        "--set-item-amount",
        "2=5",
        "--set-item-quality",
        "2=3",
        "--set-equipment-quality",
        "weapon:0=7",
        "--output",
        &path_arg(&out),
        &sample_save_path(),
    ]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("gold: 12500 -> 99999"));
    assert!(stdout.contains("2.amount: 1 -> 5"));
    assert!(!stdout.contains("2.quality"));
    assert!(stdout.contains("Wrote edited save to"));

    let output = run_cli(&["--json", &path_arg(&out)]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["resources"]["gold"], 99999);
    assert!(json["resources"]["wood"].is_f64());
    assert_eq!(json["buildings"]["manaSpring"]["turnedOn"], 2);
    assert_eq!(json["inventory"][2]["amount"], 5);
    assert_eq!(json["inventory"][2]["quality"], 3);
    assert_eq!(json["equipment"]["weapon"][0]["quality"], 7);
}

#[test]
fn failed_edit_exits_without_writing() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let out = dir.path().join("edited.sav");

    let output = run_cli(&[
        "--set-equipment-quality",
        "armor:0=3",
        "--output",
        &path_arg(&out),
        &sample_save_path(),
    ]);
    assert_eq!(output.status.code(), Some(1));
    assert!(!out.exists());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error applying equipment edit"));

    let output = run_cli(&[
        "--set-resource",
        "platinum=5",
        "--output",
        &path_arg(&out),
        &sample_save_path(),
    ]);
    assert_eq!(output.status.code(), Some(1));
    assert!(!out.exists());
}

#[test]
fn malformed_assignment_is_a_usage_error() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let out = dir.path().join("edited.sav");
    let output = run_cli(&[
        "--set-building",
        "farm.level=3",
        "--output",
        &path_arg(&out),
        &sample_save_path(),
    ]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn export_then_import_raw_text() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let raw = dir.path().join("save.json");
    let out = dir.path().join("imported.sav");

    let output = run_cli(&["--export-raw", &path_arg(&raw), &sample_save_path()]);
    assert!(output.status.success());
    let text = fs::read_to_string(&raw).expect("raw export should exist");
    assert!(text.starts_with("{\n    \"saveVersion\": 42,"));

    fs::write(&raw, text.replace("\"stone\": 88", "\"stone\": 4000"))
        .expect("raw text should be writable");
    let output = run_cli(&[
        "--import-raw",
        &path_arg(&raw),
        "--output",
        &path_arg(&out),
        &sample_save_path(),
    ]);
    assert!(output.status.success());

    let output = run_cli(&["--resources", "--json", &path_arg(&out)]);
    let json = stdout_json(&output);
    assert_eq!(json["resources"]["stone"], 4000);
    assert_eq!(json["resources"]["gold"], 12500);
}

#[test]
fn bad_raw_import_warns_and_keeps_decoded_document() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let raw = dir.path().join("broken.json");
    let out = dir.path().join("kept.sav");
    fs::write(&raw, "{\"saveVersion\": 42,").expect("raw text should be writable");

    let output = run_cli(&[
        "--import-raw",
        &path_arg(&raw),
        "--output",
        &path_arg(&out),
        &sample_save_path(),
    ]);
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("keeping the decoded document"));

    let original = run_cli(&["--json", &sample_save_path()]);
    let kept = run_cli(&["--json", &path_arg(&out)]);
    assert_eq!(stdout_json(&kept), stdout_json(&original));
}

#[test]
fn missing_sections_are_reported() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let path = dir.path().join("bare.sav");
    let blob = codec::encode(&SaveDocument::new(json!({"player": {"name": "nobody"}})))
        .expect("document should encode");
    fs::write(&path, blob).expect("save should be writable");

    let output = run_cli(&[&path_arg(&path)]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No resources found in the save file!"));
    assert!(stdout.contains("No equipment found in the save file!"));

    let output = run_cli(&["--inventory", "--json", &path_arg(&path)]);
    assert_eq!(stdout_json(&output)["inventory"], Value::Null);
}

#[test]
fn undecodable_file_exits_with_error() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let path = dir.path().join("junk.sav");
    fs::write(&path, b"SGVsbG8=").expect("file should be writable");

    let output = run_cli(&[&path_arg(&path)]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error decoding save file"));
}
