use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const BLOG: &str = "Table users {
  id integer [primary key]
  username varchar
}

Table posts {
  id integer [primary key]
  user_id integer
}

Ref: posts.user_id > users.id
";

#[allow(deprecated)]
fn dbml2mmd() -> Command {
    Command::cargo_bin("dbml2mmd").unwrap()
}

fn write_input(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("input.dbml");
    fs::write(&path, BLOG).unwrap();
    path
}

#[test]
fn help_exits_zero() {
    dbml2mmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--theme"));
}

#[test]
fn version_exits_zero() {
    dbml2mmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"\d+\.\d+\.\d+").unwrap());
}

#[test]
fn converts_file_to_stdout() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir);
    dbml2mmd()
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"(?s)erDiagram.*users \{").unwrap())
        .stdout(predicate::str::contains("posts }o--|| users"));
}

#[test]
fn reads_stdin() {
    dbml2mmd()
        .write_stdin(BLOG)
        .assert()
        .success()
        .stdout(predicate::str::contains("integer user_id FK"));
}

#[test]
fn writes_output_file() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir);
    let output = dir.path().join("out.mmd");
    dbml2mmd()
        .arg("-o")
        .arg(&output)
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Output written to"));
    let written = fs::read_to_string(&output).unwrap();
    assert!(written.starts_with("erDiagram\n"));
}

#[test]
fn writes_html_file() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir);
    let output = dir.path().join("out.html");
    dbml2mmd()
        .args(["--html", "--theme", "dark", "-o"])
        .arg(&output)
        .arg(&input)
        .assert()
        .success();
    let written = fs::read_to_string(&output).unwrap();
    assert!(written.contains("<!DOCTYPE html>"));
    assert!(written.contains("mermaid.initialize"));
    assert!(written.contains("'theme': 'dark'"));
}

#[test]
fn theme_and_filter_flags() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir);
    dbml2mmd()
        .args(["--theme", "dark", "--only", "users"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("'theme': 'dark'"))
        .stdout(predicate::str::contains("posts").not());
}

#[test]
fn theme_from_env() {
    dbml2mmd()
        .env("DBML2MMD_THEME", "forest")
        .write_stdin(BLOG)
        .assert()
        .success()
        .stdout(predicate::str::contains("'theme': 'forest'"));
}

#[test]
fn missing_file_exits_one() {
    dbml2mmd()
        .arg("does-not-exist.dbml")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error: Failed to read does-not-exist.dbml"));
}

#[test]
fn parse_error_exits_one() {
    dbml2mmd()
        .write_stdin("just some prose")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error: Unexpected token 'just'"));
}

#[test]
fn unknown_theme_exits_one() {
    dbml2mmd()
        .args(["--theme", "solarized"])
        .write_stdin(BLOG)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unknown theme 'solarized'"));
}

#[test]
fn unknown_flag_exits_one() {
    dbml2mmd().arg("--bogus").assert().code(1);
}

#[test]
fn verbose_logs_to_stderr() {
    dbml2mmd()
        .env_remove("RUST_LOG")
        .arg("--verbose")
        .write_stdin(BLOG)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("erDiagram"))
        .stderr(predicate::str::contains("converting"));
}

#[test]
fn rust_log_overrides_verbose() {
    dbml2mmd()
        .env("RUST_LOG", "off")
        .arg("--verbose")
        .write_stdin(BLOG)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("erDiagram"))
        .stderr(predicate::str::is_empty());
}
