//! Command line behavior that settles before any network call: argument
//! validation, identifier parsing, and directory checks.

#![allow(deprecated)] // Command::cargo_bin, its replacement is not stable yet

use assert_cmd::Command;
use predicates::prelude::*;

fn bilidl() -> Command {
    Command::cargo_bin("bilidl").expect("binary 'bilidl' should be built")
}

#[test]
fn help_lists_the_subcommands() {
    bilidl()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("download"))
        .stdout(predicate::str::contains("info"))
        .stdout(predicate::str::contains("login"));
}

#[test]
fn download_requires_an_input() {
    bilidl()
        .arg("download")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn info_rejects_an_unknown_format() {
    bilidl()
        .args(["info", "BV1gs411B7y4", "--format", "toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn malformed_id_fails_before_any_request() {
    bilidl()
        .args(["download", "BVxyz"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid characters in id"));
}

#[test]
fn missing_output_directory_is_reported() {
    bilidl()
        .args(["download", "BV1gs411B7y4", "-d", "/nonexistent/bilidl-out"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("is not usable"));
}

#[test]
fn multiple_conflicts_with_an_explicit_filename() {
    bilidl()
        .args(["download", "BV1gs411B7y4", "--multiple", "--filename", "out.mp4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}
