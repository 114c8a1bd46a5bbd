//! Integration tests for the config workflow of the CLI.
//!
//! These run the real binary against config files in temporary
//! directories. The `run` command is not exercised here since it needs
//! gpsd and sensor hardware; the session itself is covered by the
//! library's `sampling_session` tests.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

/// Run a CLI command and capture output.
fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_crowdbike"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command")
}

/// Assert a command succeeded.
fn assert_success(output: &Output, context: &str) {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        panic!("{} failed:\nstdout: {}\nstderr: {}", context, stdout, stderr);
    }
}

fn init_config(config: &Path, data_dir: &Path, extra: &[&str]) -> Output {
    let mut args = vec![
        "--config",
        config.to_str().unwrap(),
        "init",
        "--bike-nr",
        "07",
        "--name",
        "jane",
        "--data-dir",
        data_dir.to_str().unwrap(),
    ];
    args.extend_from_slice(extra);
    run_cli(&args)
}

#[test]
fn test_init_creates_config() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let config = temp.path().join("kit").join("config.ini");
    let data_dir = temp.path().join("data");

    let output = init_config(&config, &data_dir, &["--pm-sensor", "--sampling-rate", "2.5"]);
    assert_success(&output, "init");

    let content = fs::read_to_string(&config).expect("config should be written");
    assert!(content.contains("bike_nr = 07"));
    assert!(content.contains("studentname = jane"));
    assert!(content.contains("pm_sensor = true"));
    assert!(content.contains("sampling_rate = 2.5"));
}

#[test]
fn test_init_refuses_existing_config() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let config = temp.path().join("config.ini");
    fs::write(&config, "[user]\n").unwrap();

    let output = init_config(&config, temp.path(), &[]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("already exists"), "stderr: {}", stderr);
    assert_eq!(fs::read_to_string(&config).unwrap(), "[user]\n");
}

#[test]
fn test_init_force_overwrites() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let config = temp.path().join("config.ini");
    fs::write(&config, "[user]\n").unwrap();

    let output = init_config(&config, temp.path(), &["--force"]);
    assert_success(&output, "init --force");

    assert!(fs::read_to_string(&config).unwrap().contains("bike_nr = 07"));
}

#[test]
fn test_init_rejects_non_positive_sampling_rate() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let config = temp.path().join("config.ini");

    for rate in ["0", "1e-10"] {
        let output = init_config(&config, temp.path(), &["--sampling-rate", rate]);

        assert!(!output.status.success(), "rate {} was accepted", rate);
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("sampling_rate"), "stderr: {}", stderr);
        assert!(!config.exists());
    }
}

#[test]
fn test_init_rejects_control_characters_in_bike_nr() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let config = temp.path().join("config.ini");

    let output = run_cli(&[
        "--config",
        config.to_str().unwrap(),
        "init",
        "--bike-nr",
        "07\nX",
        "--name",
        "jane",
        "--data-dir",
        temp.path().to_str().unwrap(),
    ]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("bike_nr"), "stderr: {}", stderr);
    assert!(!config.exists());
}

#[test]
fn test_check_shows_data_log_path() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let config = temp.path().join("config.ini");
    let data_dir = temp.path().join("data");
    assert_success(&init_config(&config, &data_dir, &[]), "init");

    let output = run_cli(&["--config", config.to_str().unwrap(), "check"]);
    assert_success(&output, "check");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Configuration OK"), "stdout: {}", stdout);
    assert!(stdout.contains("Data log:"));
    assert!(stdout.contains("07-jane-"));
    assert!(stdout.contains(".csv"));
}

#[test]
fn test_check_missing_config_suggests_init() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let config = temp.path().join("missing.ini");

    let output = run_cli(&["--config", config.to_str().unwrap(), "check"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not found"), "stderr: {}", stderr);
    assert!(stderr.contains("crowdbike init"));
}

#[test]
fn test_check_rejects_invalid_value() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let config = temp.path().join("config.ini");
    fs::write(
        &config,
        "[user]\nbike_nr = 07\nstudentname = jane\nlogfile_path = /tmp\nsampling_rate = fast\n",
    )
    .unwrap();

    let output = run_cli(&["--config", config.to_str().unwrap(), "check"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("sampling_rate"), "stderr: {}", stderr);
}

#[test]
fn test_check_rejects_missing_required_key() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let config = temp.path().join("config.ini");
    fs::write(&config, "[user]\nbike_nr = 07\nlogfile_path = /tmp\n").unwrap();

    let output = run_cli(&["--config", config.to_str().unwrap(), "check"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("studentname"), "stderr: {}", stderr);
}
