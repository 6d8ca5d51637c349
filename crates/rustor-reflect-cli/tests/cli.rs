//! End-to-end runs of the rustor-reflect binary

use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn rustor_reflect() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_rustor-reflect"));
    command.arg("--no-config");
    command
}

fn fixture() -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("Models.php"),
        r#"<?php
namespace App;

abstract class Model implements \Countable
{
    const TABLE = 'models';

    public function count(): int { return 0; }
}

final class User extends Model
{
    const TABLE = 'users';
    protected $role = 'member';
}
"#,
    )
    .unwrap();
    temp
}

#[test]
fn test_json_report() {
    let temp = fixture();
    let output = rustor_reflect()
        .arg(temp.path())
        .args(["--class", "App\\User", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let user = &json["classes"][0];
    assert_eq!(user["name"], "App\\User");
    assert_eq!(user["parents"][0], "App\\Model");
    assert_eq!(user["interfaces"][0], "Countable");
    assert_eq!(user["constants"][0]["value"], "users");
    assert_eq!(user["properties"][0]["default"], "member");
}

#[test]
fn test_missing_class_exits_with_error() {
    let temp = fixture();
    let output = rustor_reflect()
        .arg(temp.path())
        .args(["--class", "App\\Missing", "--json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["errors"][0]["class"], "App\\Missing");
}

#[test]
fn test_list_symbols() {
    let temp = fixture();
    let output = rustor_reflect()
        .arg(temp.path())
        .args(["--list", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<&str> = json["symbols"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["App\\Model", "App\\User"]);
}

#[test]
fn test_text_output() {
    let temp = fixture();
    let output = rustor_reflect()
        .arg(temp.path())
        .args(["--class", "App\\Model"])
        .env("NO_COLOR", "1")
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("abstract class App\\Model"));
    assert!(stdout.contains("TABLE = 'models'"));
    assert!(stdout.contains("instantiable=false"));
}
