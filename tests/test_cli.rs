//! Integration test: binary exit status and failure output

use std::process::Command;

#[test]
fn test_failure_reported_once_with_nonzero_exit() {
    let dir = tempfile::tempdir().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_card-fraud"))
        .args(["--no-color", "train", "--data-dir"])
        .arg(dir.path())
        .env("RUST_LOG", "off")
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stdout.matches("EXCEPTION").count(), 1);
    assert!(stdout.contains("creditcard.csv"));
    assert!(!stderr.contains("creditcard.csv"), "error repeated on stderr: {}", stderr);
}

#[test]
fn test_predict_without_model_warns_and_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_card-fraud"))
        .args(["--no-color", "predict", "--data-dir"])
        .arg(dir.path())
        .env("RUST_LOG", "off")
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("run training first"));
}
