//! Process-level tests for the `read-gmail` binary

use std::process::{Command, Output};
use tempfile::TempDir;

fn read_gmail(home: &TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_read-gmail"))
        .args(args)
        .env("MAIL_INTAKE_HOME", home.path())
        // Silence the logger so stderr carries only the direct report
        .env("RUST_LOG", "off")
        .output()
        .unwrap()
}

#[test]
fn test_missing_token_is_reported_on_stderr() {
    let home = TempDir::new().unwrap();

    let output = read_gmail(&home, &["--last"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No Gmail token found"), "stderr: {}", stderr);
    assert!(stderr.contains("gmail-authorize"));
    assert!(!home.path().join("data").exists());
}

#[test]
fn test_bare_invocation_prints_usage_and_succeeds() {
    let home = TempDir::new().unwrap();

    let output = read_gmail(&home, &[]);

    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("--last"));
    assert!(output.stderr.is_empty());
}
