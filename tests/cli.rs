use std::process::Command;

use tempfile::TempDir;

fn logextract() -> Command {
    Command::new(env!("CARGO_BIN_EXE_logextract"))
}

#[test]
fn test_no_arguments_prints_usage() {
    let dir = TempDir::new().unwrap();
    let output_dir = dir.path().join("output");

    let out = logextract()
        .env("LOGEXTRACT_OUTPUT_DIR", &output_dir)
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(1));
    assert_eq!(
        String::from_utf8_lossy(&out.stdout).trim(),
        "Usage: logextract <YYYY-MM-DD>"
    );
    assert!(!output_dir.exists());
}

#[test]
fn test_two_dates_print_usage() {
    let dir = TempDir::new().unwrap();
    let output_dir = dir.path().join("output");

    let out = logextract()
        .arg("--output-dir")
        .arg(&output_dir)
        .args(["2024-01-01", "2024-01-02"])
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stdout).contains("Usage: logextract <YYYY-MM-DD>"));
    assert!(!output_dir.exists());
}

#[test]
fn test_processing_errors_exit_successfully() {
    let dir = TempDir::new().unwrap();
    // a cached archive that is not a ZIP file: no download, caught error
    std::fs::write(dir.path().join("logs.zip"), b"plain text").unwrap();

    let out = logextract()
        .arg("--output-dir")
        .arg(dir.path())
        .arg("2024-01-01")
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Zip file already exists at"));
    assert!(stdout.contains("Unexpected error: Not a valid ZIP file"));
}
