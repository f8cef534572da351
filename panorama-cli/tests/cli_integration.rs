//! CLI integration tests for panorama-cli.
//!
//! These tests run the actual binary without a handler and check
//! outputs and exit codes.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a Command for the panorama binary, isolated from the caller's env.
fn panorama() -> Command {
    let mut cmd = Command::cargo_bin("panorama").unwrap();
    cmd.env_remove("PANORAMA_ENDPOINT")
        .env_remove("PANORAMA_PASSWORD")
        .env_remove("PANORAMA_TOKEN")
        .env_remove("PANORAMA_PUBLIC_URL")
        .env_remove("RUST_LOG");
    cmd
}

/// Endpoint nothing listens on.
const DEAD_ENDPOINT: &str = "http://127.0.0.1:9";

// ============================================================================
// Help and Version Tests
// ============================================================================

#[test]
fn test_help_displays_usage() {
    panorama()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Admin client for the VR panorama gallery"))
        .stdout(predicate::str::contains("upload"))
        .stdout(predicate::str::contains("delete"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("url"));
}

#[test]
fn test_version_displays_version() {
    panorama()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("panorama"));
}

#[test]
fn test_help_shows_exit_codes() {
    panorama()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Exit codes:"))
        .stdout(predicate::str::contains("69"))
        .stdout(predicate::str::contains("77"));
}

#[test]
fn test_upload_help_shows_options() {
    panorama()
        .args(["upload", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--resize"))
        .stdout(predicate::str::contains("--mobile"))
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("PANORAMA_ENDPOINT"));
}

#[test]
fn test_resize_conflicts_with_explicit_previews() {
    panorama()
        .args(["upload", "1", "a.jpg", "--resize", "--mobile", "m.webp"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("cannot be used with"));
}

// ============================================================================
// Url Command
// ============================================================================

#[test]
fn test_url_prints_public_link() {
    panorama()
        .args(["url", "42", "--public-url", "https://photos.example.com/"])
        .assert()
        .success()
        .stdout("https://photos.example.com/42/picture/1.jpg\n");
}

#[test]
fn test_url_reads_public_url_from_env() {
    panorama()
        .env("PANORAMA_PUBLIC_URL", "https://cdn.example.com")
        .args(["url", "7", "--file", "mobile.webp"])
        .assert()
        .success()
        .stdout("https://cdn.example.com/7/picture/mobile.webp\n");
}

#[test]
fn test_url_unknown_file_is_usage_error() {
    panorama()
        .args(["url", "7", "--file", "thumb.png"])
        .assert()
        .code(64)
        .stderr(predicate::str::contains("Unknown file"));
}

// ============================================================================
// Exit Code Tests
// ============================================================================

#[test]
fn test_invalid_id_returns_usage_error() {
    for bad in ["abc", "0", "1.5"] {
        panorama()
            .args(["url", bad])
            .assert()
            .code(64)
            .stderr(predicate::str::contains("Invalid photo ID"));
    }
}

#[test]
fn test_upload_without_credential_is_usage_error() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("pano.jpg");
    fs::write(&file, b"\xFF\xD8\xFF").unwrap();

    panorama()
        .args(["upload", "1", file.to_str().unwrap(), "--endpoint", DEAD_ENDPOINT])
        .assert()
        .code(64)
        .stderr(predicate::str::contains("No credential"));
}

#[test]
fn test_missing_file_returns_input_error() {
    panorama()
        .args(["upload", "1", "nonexistent_file.jpg", "--password", "pw", "--dry-run"])
        .assert()
        .code(66)
        .stderr(predicate::str::contains("Failed to read file"));
}

#[test]
fn test_non_image_returns_data_error() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("notes.txt");
    fs::write(&file, b"not a panorama").unwrap();

    panorama()
        .args(["upload", "1", file.to_str().unwrap(), "--dry-run"])
        .assert()
        .code(65)
        .stderr(predicate::str::contains("is not an image"));
}

#[test]
fn test_png_primary_without_resize_returns_data_error() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("pano.png");
    fs::write(&file, b"\x89PNG\r\n\x1a\n").unwrap();

    panorama()
        .args(["upload", "1", file.to_str().unwrap(), "--dry-run"])
        .assert()
        .code(65)
        .stderr(predicate::str::contains("1.jpg must be image/jpeg"))
        .stderr(predicate::str::contains("--resize"));
}

#[test]
fn test_jpeg_preview_returns_data_error() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("pano.jpg");
    let desktop = temp.path().join("wide.jpg");
    fs::write(&file, b"\xFF\xD8\xFF\xD9").unwrap();
    fs::write(&desktop, b"\xFF\xD8\xFF\xD9").unwrap();

    panorama()
        .args([
            "upload",
            "1",
            file.to_str().unwrap(),
            "--desktop",
            desktop.to_str().unwrap(),
            "--dry-run",
        ])
        .assert()
        .code(65)
        .stderr(predicate::str::contains("desktop.webp must be image/webp"));
}

#[test]
fn test_resize_of_undecodable_image_returns_data_error() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("broken.jpg");
    fs::write(&file, b"definitely not jpeg data").unwrap();

    panorama()
        .args(["upload", "1", file.to_str().unwrap(), "--resize", "--dry-run"])
        .assert()
        .code(65)
        .stderr(predicate::str::contains("Failed to render variants"));
}

#[test]
fn test_unreachable_handler_returns_network_error() {
    panorama()
        .args(["list", "--endpoint", DEAD_ENDPOINT, "--timeout", "5"])
        .assert()
        .code(69)
        .stderr(predicate::str::contains("Failed to reach"));
}

// ============================================================================
// Dry Run
// ============================================================================

#[test]
fn test_upload_dry_run_lists_parts() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("pano.jpg");
    let mobile = temp.path().join("small.webp");
    fs::write(&file, vec![0xFFu8; 4096]).unwrap();
    fs::write(&mobile, b"RIFF....WEBP").unwrap();

    panorama()
        .args([
            "upload",
            "12",
            file.to_str().unwrap(),
            "--mobile",
            mobile.to_str().unwrap(),
            "--dry-run",
            "--color",
            "never",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("[DRY RUN]"))
        .stdout(predicate::str::contains("12/picture/1.jpg (image/jpeg, 4.0 KB)"))
        .stdout(predicate::str::contains("12/picture/mobile.webp (image/webp"));
}

#[test]
fn test_delete_dry_run_needs_no_credential() {
    panorama()
        .args(["delete", "5", "--dry-run", "--endpoint", DEAD_ENDPOINT])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing was deleted"));
}

#[test]
fn test_color_never_no_ansi() {
    panorama()
        .args(["delete", "5", "--dry-run", "--color", "never"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\x1b[").not());
}
