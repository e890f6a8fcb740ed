//! Common utilities for CLI E2E tests.

#![allow(dead_code)]

use std::path::Path;
use std::process::Command;

/// Invoke the CLI with its data directory pointed at `home`.
pub fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_studytime-cli"))
        .args(args)
        .env("STUDYTIME_HOME", home)
        .env_remove("STUDYTIME_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

/// Invoke a CLI command and expect success.
pub fn run_cli_success(home: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(home, args);
    assert_eq!(
        code, 0,
        "CLI command failed with code {code}: {args:?}\nstderr: {stderr}"
    );
    stdout
}

/// Invoke a CLI command and expect failure.
pub fn run_cli_failure(home: &Path, args: &[&str]) -> (String, String, i32) {
    let (stdout, stderr, code) = run_cli(home, args);
    assert!(code != 0, "CLI command unexpectedly succeeded: {:?}", args);
    (stdout, stderr, code)
}

/// Parse JSON output from CLI.
pub fn parse_json(json: &str) -> serde_json::Value {
    serde_json::from_str(json).expect("Failed to parse JSON output")
}

/// Check if string contains substring
pub fn assert_contains(haystack: &str, needle: &str) {
    assert!(
        haystack.contains(needle),
        "Expected '{}' to contain '{}'",
        haystack,
        needle
    );
}
