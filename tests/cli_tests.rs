use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const V1_STORE: &str = r#"[
  {"id": "a1", "key_id": "ABCD", "timestamp": "2023-06-07T02:58:54Z",
   "description": "github.com", "identity": "alice", "ciphertext": "c2VjcmV0"},
  {"id": "b2", "key_id": "EFGH", "timestamp": "2023-06-08T10:00Z",
   "description": "gitlab.com", "ciphertext": "c2VjcmV0", "meta": "work account"}
]"#;

fn tartarus(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tartarus").unwrap();
    cmd.env_clear()
        .env("HOME", dir.path())
        .env("XDG_DATA_HOME", dir.path())
        .env("NO_COLOR", "1");
    cmd
}

fn store_file(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("store.json");
    fs::write(&path, V1_STORE).unwrap();
    path
}

#[test]
fn test_generate_prints_requested_length() {
    let dir = TempDir::new().unwrap();
    let output = tartarus(&dir)
        .args(["generate", "16"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let secret = String::from_utf8(output.stdout).unwrap();
    assert_eq!(secret.trim_end().chars().count(), 16);
}

#[test]
fn test_generate_without_character_classes_fails() {
    let dir = TempDir::new().unwrap();
    tartarus(&dir)
        .args(["generate", "--no-lowercase", "--no-uppercase", "--no-digits"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_missing_key_id_is_reported() {
    let dir = TempDir::new().unwrap();
    tartarus(&dir)
        .arg("count")
        .assert()
        .failure()
        .stderr(predicate::str::contains("TARTARUS_KEY_ID"));
}

#[test]
fn test_count_reads_existing_store() {
    let dir = TempDir::new().unwrap();
    let path = store_file(&dir);

    tartarus(&dir)
        .env("TARTARUS_KEY_ID", "ABCD")
        .env("TARTARUS_DATA_FILE", &path)
        .arg("count")
        .assert()
        .success()
        .stdout("2\n");

    tartarus(&dir)
        .args(["--key-id", "ABCD", "--file"])
        .arg(&path)
        .args(["count", "--for-key", "EFGH"])
        .assert()
        .success()
        .stdout("1\n");
}

#[test]
fn test_list_filters_by_description() {
    let dir = TempDir::new().unwrap();
    let path = store_file(&dir);

    tartarus(&dir)
        .env("TARTARUS_KEY_ID", "ABCD")
        .arg("--file")
        .arg(&path)
        .args(["list", "LAB"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gitlab.com"))
        .stdout(predicate::str::contains("work account"))
        .stdout(predicate::str::contains("github.com").not());
}

#[test]
fn test_missing_store_file_is_empty() {
    let dir = TempDir::new().unwrap();

    tartarus(&dir)
        .env("TARTARUS_KEY_ID", "ABCD")
        .arg("--file")
        .arg(dir.path().join("absent.json"))
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("(empty)"));
}

#[test]
fn test_migrate_to_v2_rewrites_file() {
    let dir = TempDir::new().unwrap();
    let path = store_file(&dir);

    tartarus(&dir)
        .env("TARTARUS_KEY_ID", "ABCD")
        .arg("--file")
        .arg(&path)
        .args(["migrate", "--to", "2"])
        .assert()
        .success();

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value["schema_version"], 2);
    assert_eq!(value["entries"].as_array().map(Vec::len), Some(2));
}

#[test]
fn test_corrupt_store_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.json");
    fs::write(&path, "{not json").unwrap();

    tartarus(&dir)
        .env("TARTARUS_KEY_ID", "ABCD")
        .arg("--file")
        .arg(&path)
        .arg("count")
        .assert()
        .failure();
}
