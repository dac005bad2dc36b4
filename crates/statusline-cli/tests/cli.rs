//! End-to-end tests for the `statusline` binary.

mod common;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use common::{snapshot_json, transcript_fixture, FIXTURE_SESSION};
use predicates::prelude::*;
use tempfile::TempDir;

fn statusline() -> Command {
    let mut cmd = cargo_bin_cmd!("statusline");
    cmd.env_remove("RUST_LOG").env_remove("NO_COLOR");
    cmd
}

#[test]
fn test_malformed_input_fails() {
    let temp_dir = TempDir::new().unwrap();

    statusline()
        .arg("--sessions-dir")
        .arg(temp_dir.path().join("sessions"))
        .write_stdin("{not json")
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Failed to decode input"));
}

#[test]
fn test_renders_snapshot_and_records_session() {
    let temp_dir = TempDir::new().unwrap();
    let project = temp_dir.path().join("widget");
    std::fs::create_dir_all(&project).unwrap();
    let sessions = temp_dir.path().join("sessions");

    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, "progress_bar_width = 20\nmessage_max_lines = 2\n").unwrap();

    let transcript = transcript_fixture("active_session");
    let input = snapshot_json("Opus 4.1", &project, Some(&transcript));

    statusline()
        .arg("--config")
        .arg(&config_path)
        .arg("--sessions-dir")
        .arg(&sessions)
        .arg("--no-color")
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::contains("[Opus 4.1]  widget"))
        .stdout(predicate::str::contains(
            "████████░░░░░░░░░░░░ 42% (84k) │ 0m\n",
        ))
        .stdout(predicate::str::contains(
            "> refactor the parser\n> keep the public API stable\n> ... (3 more lines)\n",
        ))
        .stdout(predicate::str::contains("\u{1b}[").not());

    assert!(sessions.join(format!("{}.json", FIXTURE_SESSION)).exists());
}

#[test]
fn test_no_color_env_disables_colors() {
    let temp_dir = TempDir::new().unwrap();
    let project = temp_dir.path().join("widget");
    std::fs::create_dir_all(&project).unwrap();

    statusline()
        .env("NO_COLOR", "1")
        .arg("--sessions-dir")
        .arg(temp_dir.path().join("sessions"))
        .arg("--layout")
        .arg("message_first")
        .write_stdin(snapshot_json(
            "Sonnet 4",
            &project,
            Some(&transcript_fixture("slash_command")),
        ))
        .assert()
        .success()
        .stdout(predicate::str::starts_with("> /review\n"))
        .stdout(predicate::str::contains("\u{1b}[").not());
}

#[test]
fn test_missing_config_file_fails() {
    let temp_dir = TempDir::new().unwrap();

    statusline()
        .arg("--config")
        .arg(temp_dir.path().join("absent.toml"))
        .write_stdin("{}")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config"));
}

#[cfg(target_os = "linux")]
#[test]
fn test_broken_default_config_falls_back() {
    let temp_dir = TempDir::new().unwrap();
    let config_home = temp_dir.path().join("xdg");
    std::fs::create_dir_all(config_home.join("statusline")).unwrap();
    std::fs::write(config_home.join("statusline").join("config.toml"), "colors = [").unwrap();
    let project = temp_dir.path().join("widget");
    std::fs::create_dir_all(&project).unwrap();

    statusline()
        .env("XDG_CONFIG_HOME", &config_home)
        .arg("--sessions-dir")
        .arg(temp_dir.path().join("sessions"))
        .arg("--no-color")
        .write_stdin(snapshot_json("Opus 4.1", &project, None))
        .assert()
        .success()
        .stdout(predicate::str::contains("░░░░░░░░░░ 0% (--) │ 0m\n"))
        .stderr(predicate::str::contains("using default configuration"));
}
