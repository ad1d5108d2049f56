use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

const HELLO: &str = "export void (vec<str> args) { IO.print(\"hi\"); }";

fn tinycomp() -> Command {
    Command::cargo_bin("tinycomp").expect("binary exists")
}

fn node_available() -> bool {
    std::process::Command::new("node")
        .arg("--version")
        .output()
        .is_ok_and(|output| output.status.success())
}

#[test]
fn compiles_file_to_output() {
    let dir = tempdir().expect("tempdir");
    let input_path = dir.path().join("hello.tc");
    fs::write(&input_path, HELLO).expect("write input");
    let output_path = dir.path().join("out").join("hello.js");

    tinycomp()
        .arg("--input")
        .arg(&input_path)
        .arg("--output")
        .arg(&output_path)
        .assert()
        .success();

    let js = fs::read_to_string(&output_path).expect("read output");
    assert!(js.starts_with("'use strict';\n"));
    assert!(js.contains("console.log(\"hi\");"));
    assert!(js.ends_with("a(process.argv.slice(1));\n"));
}

#[test]
fn reads_stdin_and_writes_stdout() {
    tinycomp()
        .write_stdin(HELLO)
        .assert()
        .success()
        .stdout(predicate::str::contains("function a(b) {"));
}

#[test]
fn reports_located_errors() {
    let dir = tempdir().expect("tempdir");
    let input_path = dir.path().join("bad.tc");
    fs::write(&input_path, "export void (vec<str> args) {\n  5;\n}").expect("write input");
    let output_path = dir.path().join("bad.js");

    tinycomp()
        .arg("--input")
        .arg(&input_path)
        .arg("--output")
        .arg(&output_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains(":2:3: cannot infer type of numeric literal"));

    assert!(!output_path.exists(), "no output is written on failure");
}

#[test]
fn stdin_errors_are_labeled() {
    tinycomp()
        .write_stdin("void f() {}")
        .assert()
        .failure()
        .stderr(predicate::str::contains("<stdin>:0:0: could not find an entry point"));
}

#[test]
fn reports_missing_input() {
    let dir = tempdir().expect("tempdir");
    tinycomp()
        .arg("--input")
        .arg(dir.path().join("missing.tc"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read input file"));
}

#[test]
fn run_requires_output() {
    tinycomp()
        .arg("--run")
        .write_stdin(HELLO)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--run requires --output"));
}

#[test]
fn runs_program_with_arguments() {
    if !node_available() {
        return;
    }
    let dir = tempdir().expect("tempdir");
    let input_path = dir.path().join("echo.tc");
    fs::write(
        &input_path,
        "export u8 (vec<str> args) { IO.print(args[1]); return 4; }",
    )
    .expect("write input");
    let output_path = dir.path().join("echo.js");

    tinycomp()
        .arg("--input")
        .arg(&input_path)
        .arg("--output")
        .arg(&output_path)
        .arg("--run")
        .arg("--")
        .arg("hello")
        .assert()
        .code(4)
        .stdout(predicate::str::contains("hello"));
}
