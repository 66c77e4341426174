use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Burpee ladder: three rested burpee sets, then one push-up set
const BURPEE_SCRIPT: &str = "done\ntick 30\ndone\ntick 30\ndone\ntick 30\ndone\n";

fn setup_test_dir() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "").unwrap();
    (temp_dir, config_path)
}

fn cli(dir: &Path, config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("setwise").unwrap();
    cmd.arg("--data-dir")
        .arg(dir.join("data"))
        .arg("--config")
        .arg(config);
    cmd
}

fn journal_lines(dir: &Path) -> Vec<String> {
    let path = dir.join("data").join("sessions").join("journal.jsonl");
    fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(String::from)
        .collect()
}

fn write_workout(dir: &Path, name: &str, json: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, json).unwrap();
    path
}

#[test]
fn test_help() {
    let mut cmd = Command::cargo_bin("setwise").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Guided workout sessions"));
}

#[test]
fn test_list_shows_catalog() {
    let (temp_dir, config) = setup_test_dir();
    cli(temp_dir.path(), &config)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("full_body"))
        .stdout(predicate::str::contains("burpee_ladder"));
}

#[test]
fn test_run_to_completion_saves_summary() {
    let (temp_dir, config) = setup_test_dir();

    cli(temp_dir.path(), &config)
        .args(["run", "burpee_ladder", "--manual-ticks"])
        .write_stdin(BURPEE_SCRIPT)
        .assert()
        .success()
        .stdout(predicate::str::contains("Rest for 00:30"))
        .stdout(predicate::str::contains("Rest over!"))
        .stdout(predicate::str::contains("Workout complete"))
        .stdout(predicate::str::contains("Completed 4 of 4 sets"))
        .stdout(predicate::str::contains("Duration: 01:30"))
        .stdout(predicate::str::contains("Session saved"));

    let lines = journal_lines(temp_dir.path());
    assert_eq!(lines.len(), 2);
    let completed: serde_json::Value = serde_json::from_str(&lines[1]).unwrap();
    assert_eq!(completed["kind"], "completed");
    assert_eq!(completed["summary"]["workout_id"], "burpee_ladder");
    assert_eq!(completed["summary"]["completed_sets"], 4);
    assert_eq!(completed["summary"]["duration_seconds"], 90);
}

#[test]
fn test_history_and_export_after_run() {
    let (temp_dir, config) = setup_test_dir();

    cli(temp_dir.path(), &config)
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("No completed sessions yet."));

    cli(temp_dir.path(), &config)
        .args(["run", "burpee_ladder", "--manual-ticks"])
        .write_stdin(BURPEE_SCRIPT)
        .assert()
        .success();

    cli(temp_dir.path(), &config)
        .args(["history", "--days", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("burpee_ladder"))
        .stdout(predicate::str::contains("Completed 4 of 4 sets"));

    let csv_path = temp_dir.path().join("export.csv");
    cli(temp_dir.path(), &config)
        .arg("export")
        .arg(&csv_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 1 sessions"));

    let contents = fs::read_to_string(&csv_path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("session_id,workout_id"));
    assert!(lines[1].contains("burpee_ladder"));
}

#[test]
fn test_confirmed_exit_abandons_and_cancels_schedule() {
    let (temp_dir, config) = setup_test_dir();

    cli(temp_dir.path(), &config)
        .args(["schedule", "add", "mon-am", "core_blast"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Scheduled 'Core Blast' as mon-am"));

    cli(temp_dir.path(), &config)
        .args(["run", "--schedule", "mon-am", "--manual-ticks"])
        .write_stdin("done\nexit\ny\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Exit and discard this session?"))
        .stdout(predicate::str::contains("Session abandoned. Nothing was saved."));

    cli(temp_dir.path(), &config)
        .args(["schedule", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mon-am"))
        .stdout(predicate::str::contains("CANCELLED"));

    let lines = journal_lines(temp_dir.path());
    assert_eq!(lines.len(), 1, "only the session record should exist");
    assert!(lines[0].contains("\"created\""));
}

#[test]
fn test_declined_exit_keeps_session_running() {
    let (temp_dir, config) = setup_test_dir();

    cli(temp_dir.path(), &config)
        .args(["run", "full_body", "--manual-ticks"])
        .write_stdin("exit\nno\nstatus\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Carrying on."))
        .stdout(predicate::str::contains("Goblet Squat"))
        .stdout(predicate::str::contains("Session left unfinished; nothing was saved."));
}

#[test]
fn test_scheduled_run_marks_completed() {
    let (temp_dir, config) = setup_test_dir();

    cli(temp_dir.path(), &config)
        .args(["schedule", "add", "fri", "burpee_ladder"])
        .assert()
        .success();

    cli(temp_dir.path(), &config)
        .args(["run", "--schedule", "fri", "--manual-ticks"])
        .write_stdin(BURPEE_SCRIPT)
        .assert()
        .success()
        .stdout(predicate::str::contains("Session saved"));

    cli(temp_dir.path(), &config)
        .args(["schedule", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("COMPLETED"));
}

#[test]
fn test_duplicate_schedule_rejected() {
    let (temp_dir, config) = setup_test_dir();

    cli(temp_dir.path(), &config)
        .args(["schedule", "add", "tue", "full_body"])
        .assert()
        .success();

    cli(temp_dir.path(), &config)
        .args(["schedule", "add", "tue", "core_blast"])
        .assert()
        .failure();
}

#[test]
fn test_timed_workout_file_completes_on_expiry() {
    let (temp_dir, config) = setup_test_dir();
    let workout = write_workout(
        temp_dir.path(),
        "plank.json",
        r#"{"id": "plank_only", "name": "Plank Only", "exercises": [
            {"exercise_id": "plank", "name": "Plank", "order": 1, "sets": 1, "duration": 5}
        ]}"#,
    );

    cli(temp_dir.path(), &config)
        .arg("run")
        .arg(&workout)
        .arg("--manual-ticks")
        .write_stdin("tap\ntick 5\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("work timer: 00:05"))
        .stdout(predicate::str::contains("Time!"))
        .stdout(predicate::str::contains("plank set 1 done"))
        .stdout(predicate::str::contains("Duration: 00:05"));
}

#[test]
fn test_configured_kudos_are_shown() {
    let (temp_dir, config) = setup_test_dir();
    fs::write(
        &config,
        "[kudos]\nsession_started = [\"Warm up, champ\"]\n",
    )
    .unwrap();

    cli(temp_dir.path(), &config)
        .args(["run", "burpee_ladder", "--manual-ticks"])
        .write_stdin(BURPEE_SCRIPT)
        .assert()
        .success()
        .stdout(predicate::str::contains("Warm up, champ"))
        .stdout(predicate::str::contains("Workout complete. Great work!"));
}

#[test]
fn test_unknown_workout_fails() {
    let (temp_dir, config) = setup_test_dir();
    cli(temp_dir.path(), &config)
        .args(["run", "no_such_workout", "--manual-ticks"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("neither a built-in workout"));
}

#[test]
fn test_invalid_workout_file_fails() {
    let (temp_dir, config) = setup_test_dir();
    let workout = write_workout(
        temp_dir.path(),
        "gapped.json",
        r#"{"id": "gapped", "name": "Gapped", "exercises": [
            {"exercise_id": "a", "order": 1},
            {"exercise_id": "b", "order": 3}
        ]}"#,
    );

    cli(temp_dir.path(), &config)
        .arg("run")
        .arg(&workout)
        .arg("--manual-ticks")
        .assert()
        .failure();
    assert!(journal_lines(temp_dir.path()).is_empty());
}

#[test]
fn test_unsaved_summary_exits_nonzero() {
    let (temp_dir, config) = setup_test_dir();
    // A directory where the journal file should be makes every write fail
    fs::create_dir_all(temp_dir.path().join("data/sessions/journal.jsonl")).unwrap();
    let workout = write_workout(
        temp_dir.path(),
        "single.json",
        r#"{"id": "single", "name": "Single", "exercises": [
            {"exercise_id": "squat", "order": 1}
        ]}"#,
    );

    cli(temp_dir.path(), &config)
        .arg("run")
        .arg(&workout)
        .arg("--manual-ticks")
        .write_stdin("done\nretry\n")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Workout complete"))
        .stdout(predicate::str::contains("Couldn't save your workout"))
        .stderr(predicate::str::contains("Workout summary was not saved"));
}

#[test]
fn test_invalid_config_rejected() {
    let (temp_dir, config) = setup_test_dir();
    fs::write(&config, "[session]\nsubmit_attempts = 0\n").unwrap();

    cli(temp_dir.path(), &config)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("submit_attempts"));
}
