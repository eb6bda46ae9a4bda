//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary with a private config directory and verify
//! outputs.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_pomodoro"))
        .args(args)
        .env("POMODORO_CONFIG_DIR", dir)
        .env_remove("POMODORO_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_json(dir: &Path, args: &[&str]) -> serde_json::Value {
    let (stdout, stderr, code) = run_cli(dir, args);
    assert_eq!(code, 0, "CLI command {args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("Failed to parse JSON output")
}

fn event_names(report: &serde_json::Value) -> Vec<String> {
    report["events"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["type"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn test_timer_status_when_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let report = run_json(dir.path(), &["timer", "status"]);
    assert_eq!(report["label"], "[00] 00:00");
    assert_eq!(report["snapshot"]["mode"], "stopped");
    assert_eq!(report["glyphs"], "");
}

#[test]
fn test_timer_start_and_status() {
    let dir = tempfile::tempdir().unwrap();
    let report = run_json(dir.path(), &["timer", "start"]);
    assert_eq!(event_names(&report), ["work_started"]);
    assert_eq!(report["snapshot"]["mode"], "working");

    let report = run_json(dir.path(), &["timer", "status"]);
    assert_eq!(report["snapshot"]["mode"], "working");
    assert_eq!(report["glyphs"], "◖");
}

#[test]
fn test_timer_start_twice_fails() {
    let dir = tempfile::tempdir().unwrap();
    run_json(dir.path(), &["timer", "start"]);
    let (_, stderr, code) = run_cli(dir.path(), &["timer", "start"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("already running"), "stderr: {stderr}");
}

#[test]
fn test_timer_stop_when_stopped_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["timer", "stop"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("not running"), "stderr: {stderr}");
}

#[test]
fn test_timer_skip_restarts_work() {
    let dir = tempfile::tempdir().unwrap();
    run_json(dir.path(), &["timer", "start"]);
    let report = run_json(dir.path(), &["timer", "skip"]);
    assert_eq!(event_names(&report), ["stopped", "work_started"]);
}

#[test]
fn test_timer_toggle_and_reset() {
    let dir = tempfile::tempdir().unwrap();
    let report = run_json(dir.path(), &["timer", "toggle"]);
    assert_eq!(report["snapshot"]["mode"], "working");
    let report = run_json(dir.path(), &["timer", "reset"]);
    assert_eq!(
        event_names(&report),
        ["counters_reset", "stopped", "work_started"]
    );
    let report = run_json(dir.path(), &["timer", "toggle"]);
    assert_eq!(report["snapshot"]["mode"], "stopped");
}

#[test]
fn test_timer_idle_right_after_start_invalidates() {
    let dir = tempfile::tempdir().unwrap();
    run_json(dir.path(), &["timer", "start"]);
    let report = run_json(dir.path(), &["timer", "idle"]);
    assert_eq!(event_names(&report), ["idle_invalidated"]);
    assert_eq!(report["snapshot"]["mode"], "on_break");

    let report = run_json(dir.path(), &["timer", "active"]);
    assert_eq!(event_names(&report), ["break_ended", "work_started"]);
    assert_eq!(report["events"][0]["notify"], false);
}

#[test]
fn test_config_get_default() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["config", "get", "timer.pomodoro_duration"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "1500");
}

#[test]
fn test_config_set_then_get() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["config", "set", "timer.short_pause_duration", "60"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "ok");
    assert!(dir.path().join("config.toml").exists());

    let (stdout, _, _) = run_cli(dir.path(), &["config", "get", "timer.short_pause_duration"]);
    assert_eq!(stdout.trim(), "60");
}

#[test]
fn test_config_set_rejects_bad_values() {
    let dir = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(dir.path(), &["config", "set", "timer.pomodoro_duration", "0"]);
    assert_eq!(code, 1);
    let (_, _, code) = run_cli(dir.path(), &["config", "set", "ui.no_such_option", "1"]);
    assert_eq!(code, 1);
    let (_, _, code) = run_cli(dir.path(), &["config", "get", "ui.no_such_option"]);
    assert_eq!(code, 1);
}

#[test]
fn test_config_list() {
    let dir = tempfile::tempdir().unwrap();
    let report = run_json(dir.path(), &["config", "list"]);
    assert_eq!(report["version"], "0.2");
    assert_eq!(report["ui"]["key_toggle_timer"], "<Ctrl><Alt>P");
}

#[test]
fn test_config_path_uses_override_dir() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["config", "path"]);
    assert_eq!(code, 0);
    assert_eq!(Path::new(stdout.trim()), dir.path().join("config.toml"));
}

#[test]
fn test_run_quits_on_command() {
    let dir = tempfile::tempdir().unwrap();
    let mut child = Command::new(env!("CARGO_BIN_EXE_pomodoro"))
        .args(["run", "--stopped"])
        .env("POMODORO_CONFIG_DIR", dir.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn CLI");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"start\nquit\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("commands:"));
    assert!(stdout.contains("sessions completed: 0"));
}

#[test]
fn test_run_set_applies_and_saves_setting() {
    let dir = tempfile::tempdir().unwrap();
    let mut child = Command::new(env!("CARGO_BIN_EXE_pomodoro"))
        .args(["run", "--stopped"])
        .env("POMODORO_CONFIG_DIR", dir.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn CLI");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"set timer.short_pause_duration 60\nset timer.nope 1\nquit\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("timer.short_pause_duration = 60"), "stdout: {stdout}");

    let (stdout, _, _) = run_cli(dir.path(), &["config", "get", "timer.short_pause_duration"]);
    assert_eq!(stdout.trim(), "60");
}

#[test]
fn test_run_keeps_going_after_stdin_closes() {
    let dir = tempfile::tempdir().unwrap();
    let mut child = Command::new(env!("CARGO_BIN_EXE_pomodoro"))
        .args(["run"])
        .env("POMODORO_CONFIG_DIR", dir.path())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("Failed to spawn CLI");

    std::thread::sleep(std::time::Duration::from_millis(1500));
    let status = child.try_wait().unwrap();
    child.kill().unwrap();
    child.wait().unwrap();
    assert!(status.is_none(), "timer exited early: {status:?}");
}

#[test]
fn test_completions() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["completions", "bash"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("pomodoro"));
}
