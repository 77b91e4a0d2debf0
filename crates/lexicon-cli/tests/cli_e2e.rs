use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;

fn lexicon_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_lexicon"))
}

fn run(args: &[&str]) -> Output {
    Command::new(lexicon_bin())
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("spawn lexicon")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn write_datasets(dir: &Path, services: &str) {
    fs::write(
        dir.join("task-products.json"),
        r#"[
            {"taskProduct": "Hdr-images", "enhancement-order": ["Blur"]},
            {"taskProduct": "Previews", "enhancement-order": []}
        ]"#,
    )
    .unwrap();
    fs::write(
        dir.join("tasks.json"),
        r#"[
            {"task": "Blurring", "enhancement": "Blur",
             "inputs": ["Hdr-images"], "outputs": ["Hdr-images"],
             "responsibility_options": ["Operator"]},
            {"task": "Staging", "enhancement": "Stage",
             "inputs": ["Hdr-images"], "outputs": ["Previews"],
             "responsibility_options": []}
        ]"#,
    )
    .unwrap();
    fs::write(dir.join("services.json"), services).unwrap();
}

#[test]
fn run_converts_every_dataset_and_writes_the_store() {
    let dir = tempfile::tempdir().unwrap();
    write_datasets(
        dir.path(),
        r#"[{"Service": "Retouch", "taskProduct": "Hdr-images",
             "responsibility specification (Task:Responsibility)": "Blurring: Operator"}]"#,
    );

    let output = run(&["run", "--dir", dir.path().to_str().unwrap(), "--json"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let report: Value = serde_json::from_str(&stdout(&output)).unwrap();
    let statuses: Vec<&str> = report["datasets"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["outcome"]["status"].as_str().unwrap())
        .collect();
    assert_eq!(statuses, vec!["converted", "converted", "converted"]);

    let flat: Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("out/tasks.json")).unwrap())
            .unwrap();
    assert_eq!(flat[1]["responsibility_options"], "");

    let store: Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("knowledge.json")).unwrap())
            .unwrap();
    assert_eq!(store["task"], serde_json::json!(["Blurring", "Staging"]));
    assert_eq!(store["taskProduct_producers"]["Previews"], serde_json::json!(["Staging"]));
}

#[test]
fn run_exits_nonzero_when_a_dataset_fails_validation() {
    let dir = tempfile::tempdir().unwrap();
    write_datasets(dir.path(), r#"[{"Service": "Retouch", "task": "Blurign"}]"#);

    let output = run(&["run", "--dir", dir.path().to_str().unwrap()]);
    assert!(!output.status.success());
    let text = stdout(&output);
    assert!(text.contains("2 succeeded, 1 failed"), "{text}");
    assert!(text.contains("did you mean: Blurring (3)"), "{text}");
    assert!(!dir.path().join("out/services.json").exists());
}

#[test]
fn flatten_then_unflatten_restores_array_fields() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("tasks.json");
    fs::write(&input, r#"[{"task": "Blurring", "inputs": ["a", "b"], "outputs": []}]"#).unwrap();

    let flattened = run(&["flatten", input.to_str().unwrap()]);
    assert!(flattened.status.success());
    let rows: Value = serde_json::from_str(&stdout(&flattened)).unwrap();
    assert_eq!(rows[0]["inputs"], "a, b");
    assert_eq!(rows[0]["outputs"], "");

    let flat_path = dir.path().join("flat.json");
    fs::write(&flat_path, stdout(&flattened)).unwrap();
    let restored = run(&["unflatten", flat_path.to_str().unwrap()]);
    assert!(restored.status.success());
    let records: Value = serde_json::from_str(&stdout(&restored)).unwrap();
    assert_eq!(
        records,
        serde_json::json!([{"task": "Blurring", "inputs": ["a", "b"], "outputs": []}])
    );
}

#[test]
fn flatten_can_emit_a_table() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("tasks.json");
    fs::write(
        &input,
        r#"[{"task": "Blurring", "inputs": ["a", "b"]}, {"task": "Staging", "meta": {"owner": "x"}}]"#,
    )
    .unwrap();

    let output = run(&["flatten", "--tsv", input.to_str().unwrap()]);
    assert!(output.status.success());
    let lines: Vec<String> = stdout(&output).lines().map(str::to_string).collect();
    assert_eq!(lines[0], "task\tinputs\tmeta.owner");
    assert_eq!(lines[1], "Blurring\ta, b\t");
    assert_eq!(lines[2], "Staging\t\tx");
}

#[test]
fn validate_reports_json_with_suggestions() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("knowledge.json");
    fs::write(&store, r#"{"task": ["Blurring", "Staging"]}"#).unwrap();
    let input = dir.path().join("services.json");
    fs::write(&input, r#"[{"task": "Blurign"}]"#).unwrap();

    let output = run(&[
        "validate",
        "services",
        input.to_str().unwrap(),
        "--store",
        store.to_str().unwrap(),
        "--json",
    ]);
    assert!(!output.status.success());
    let report: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(report["errors"][0]["row"], 2);
    assert_eq!(report["errors"][0]["array_index"], 0);
    assert_eq!(report["errors"][0]["suggestions"][0]["candidate"], "Blurring");
}

#[test]
fn suggest_ranks_candidates() {
    let output = run(&["suggest", "Blurign", "Staging", "Blurring", "-k", "1"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "Blurring (3)");

    let none = run(&["suggest", "zzzzzzzz", "Blurring"]);
    assert!(!none.status.success());
}

#[test]
fn store_show_prints_one_field() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("knowledge.json");
    fs::write(&store, r#"{"task": ["Blurring", "Staging"]}"#).unwrap();

    let output = run(&["store", "show", "--store", store.to_str().unwrap(), "--field", "task"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "Blurring\nStaging\n");

    let missing = run(&["store", "show", "--store", store.to_str().unwrap(), "--field", "Service"]);
    assert!(!missing.status.success());
}
