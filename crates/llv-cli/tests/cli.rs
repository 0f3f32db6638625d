//! CLI command integration tests.
//! Each test uses a temp directory via LLV_DATA_DIR for full isolation.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn llv_cmd(data_dir: &TempDir) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("llv").unwrap();
    cmd.env("LLV_DATA_DIR", data_dir.path());
    cmd
}

/// Write a small session file the way save_data would.
fn write_session(data_dir: &TempDir, name: &str) {
    let snapshot = serde_json::json!({
        "timestamp": "2026-08-26T12:00:00.000Z",
        "version": "1.0.0",
        "lines": {
            "wire": {
                "name": "wire",
                "from": "here",
                "to": "there",
                "rhythm": "steady",
                "created_at": "2026-08-26T12:00:00.000Z",
                "traces": []
            }
        },
        "loops": {},
        "vibes": {
            "mood": {
                "name": "mood",
                "energy": "calm",
                "frequency": 30.0,
                "rhythm": "ambient",
                "created_at": "2026-08-26T12:00:00.000Z",
                "pulses": []
            }
        },
        "contexts": {}
    });
    std::fs::write(
        data_dir.path().join(format!("{name}.json")),
        serde_json::to_string_pretty(&snapshot).unwrap(),
    )
    .unwrap();
}

#[test]
fn stats_no_session() {
    let dir = TempDir::new().unwrap();
    llv_cmd(&dir)
        .args(["stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no saved session"));
}

#[test]
fn stats_with_session() {
    let dir = TempDir::new().unwrap();
    write_session(&dir, "llv-session");

    llv_cmd(&dir)
        .args(["stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("lines:     1"))
        .stdout(predicate::str::contains("loops:     0"))
        .stdout(predicate::str::contains("vibes:     1"))
        .stdout(predicate::str::contains("contexts:  0"));
}

#[test]
fn stats_named_session() {
    let dir = TempDir::new().unwrap();
    write_session(&dir, "side-project");

    llv_cmd(&dir)
        .args(["stats", "side-project"])
        .assert()
        .success()
        .stdout(predicate::str::contains("side-project.json"))
        .stdout(predicate::str::contains("lines:     1"));

    // The default session is still absent.
    llv_cmd(&dir)
        .args(["stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no saved session"));
}

#[test]
fn show_no_session() {
    let dir = TempDir::new().unwrap();
    llv_cmd(&dir)
        .args(["show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(no saved session)"));
}

#[test]
fn show_renders_entities() {
    let dir = TempDir::new().unwrap();
    write_session(&dir, "llv-session");

    llv_cmd(&dir)
        .args(["show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("LINES-LOOPS-VIBES SYSTEM"))
        .stdout(predicate::str::contains("wire"))
        .stdout(predicate::str::contains("here → there"))
        .stdout(predicate::str::contains("mood"));
}

#[test]
fn show_time_window_flag() {
    let dir = TempDir::new().unwrap();
    write_session(&dir, "llv-session");

    llv_cmd(&dir)
        .args(["show", "--time-window", "4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("next 4 beats"));
}

#[test]
fn data_dir_flag_overrides_env() {
    let env_dir = TempDir::new().unwrap();
    let flag_dir = TempDir::new().unwrap();
    write_session(&flag_dir, "llv-session");

    // LLV_DATA_DIR points at an empty directory; --data-dir wins.
    llv_cmd(&env_dir)
        .arg("--data-dir")
        .arg(flag_dir.path())
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("lines:     1"));
}

#[test]
fn corrupt_session_is_reported() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("llv-session.json"), "{not json").unwrap();

    llv_cmd(&dir)
        .args(["stats"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load session"));
}

#[test]
fn unknown_subcommand_fails() {
    let dir = TempDir::new().unwrap();
    llv_cmd(&dir).args(["frobnicate"]).assert().failure();
}
