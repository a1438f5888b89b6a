//! E2E tests for the daily loop: init, today, done, undo, user, express and
//! summary.
//!
//! Each test runs the `hearth` binary in an isolated temp directory with a
//! pinned `--now`, so week and day boundaries are deterministic.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test Harness
// ---------------------------------------------------------------------------

/// Wednesday 2024-03-06, noon in Mexico City.
const NOW: &str = "2024-03-06T18:00:00Z";

const CATALOG: &str = r#"{
  "app": { "timezone": "America/Mexico_City" },
  "people": [
    { "id": "papa", "label": "Papá" },
    { "id": "mama", "label": "Mamá" }
  ],
  "tasks": [
    { "id": "lavar", "name": "Lavar trastes", "zone": "Cocina",
      "frequency": "daily", "assigned_to": "papa", "points": 2, "minutes": 10 },
    { "id": "barrer", "name": "Barrer", "zone": "General",
      "frequency": "daily", "assigned_to": "mama", "points": 1, "minutes": 5 },
    { "id": "basura", "name": "Sacar basura", "zone": "General",
      "frequency": "weekly_days", "days": ["wed"], "assigned_to": "",
      "points": 1, "minutes": 5 }
  ],
  "rewards": { "family_weekly_reward": "Helado" }
}"#;

fn hearth_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("hearth"));
    cmd.current_dir(dir);
    cmd.env("HEARTH_LOG", "error");
    cmd.env_remove("FORMAT");
    cmd
}

fn init_household(dir: &Path) {
    hearth_cmd(dir).args(["init"]).assert().success();
    std::fs::write(dir.join("config.json"), CATALOG).expect("write catalog");
}

/// Run a command with `--json --now NOW` and parse stdout.
fn json(dir: &Path, args: &[&str]) -> Value {
    let output = hearth_cmd(dir)
        .args(args)
        .args(["--json", "--now", NOW])
        .output()
        .expect("command should not crash");
    assert!(
        output.status.success(),
        "{args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid JSON")
}

fn pending_ids(board: &Value) -> Vec<String> {
    board["pending"]
        .as_array()
        .expect("pending array")
        .iter()
        .map(|item| item["task_id"].as_str().expect("task_id").to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn commands_fail_before_init() {
    let dir = TempDir::new().expect("tempdir");
    let output = hearth_cmd(dir.path())
        .args(["today", "--json"])
        .output()
        .expect("run");
    assert!(!output.status.success());
    let err: Value = serde_json::from_slice(&output.stderr).expect("error JSON on stderr");
    assert_eq!(err["error"]["error_code"], "E1001");
    assert!(
        err["error"]["suggestion"]
            .as_str()
            .is_some_and(|s| s.contains("hearth init"))
    );
}

#[test]
fn init_writes_skeleton() {
    let dir = TempDir::new().expect("tempdir");
    let report = json(dir.path(), &["init"]);
    assert_eq!(report["catalog_created"], true);
    assert!(dir.path().join(".hearth/config.toml").exists());
    assert!(dir.path().join("config.json").exists());

    hearth_cmd(dir.path())
        .args(["init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn today_defaults_to_first_person() {
    let dir = TempDir::new().expect("tempdir");
    init_household(dir.path());

    let board = json(dir.path(), &["today"]);
    assert_eq!(board["person_id"], "papa");
    assert_eq!(board["date_key"], "2024-03-06");
    assert_eq!(pending_ids(&board), vec!["lavar", "basura"]);

    let mama = json(dir.path(), &["today", "--user", "mama"]);
    assert_eq!(pending_ids(&mama), vec!["barrer", "basura"]);
}

#[test]
fn done_then_undo_round_trip() {
    let dir = TempDir::new().expect("tempdir");
    init_household(dir.path());

    let done = json(dir.path(), &["done", "lavar"]);
    assert_eq!(done["outcome"], "recorded");
    assert_eq!(done["log"]["userId"], "papa");
    assert_eq!(done["log"]["weekKey"], "2024-W10");
    assert_eq!(done["notice"]["level"], "info");

    let again = json(dir.path(), &["done", "lavar"]);
    assert_eq!(again["outcome"], "already_done");

    let board = json(dir.path(), &["today"]);
    assert_eq!(pending_ids(&board), vec!["basura"]);
    assert_eq!(board["done"][0]["task_id"], "lavar");
    assert_eq!(board["done"][0]["done_by"], "Papá");

    let undo = json(dir.path(), &["undo", "lavar"]);
    assert_eq!(undo["outcome"], "removed");
    let undo = json(dir.path(), &["undo", "lavar"]);
    assert_eq!(undo["outcome"], "nothing_to_undo");

    let board = json(dir.path(), &["today"]);
    assert_eq!(pending_ids(&board), vec!["lavar", "basura"]);
}

#[test]
fn done_unknown_task_fails_with_code() {
    let dir = TempDir::new().expect("tempdir");
    init_household(dir.path());

    let output = hearth_cmd(dir.path())
        .args(["done", "planchar", "--json", "--now", NOW])
        .output()
        .expect("run");
    assert!(!output.status.success());
    let err: Value = serde_json::from_slice(&output.stderr).expect("error JSON");
    assert_eq!(err["error"]["error_code"], "E2002");
}

#[test]
fn selected_user_persists() {
    let dir = TempDir::new().expect("tempdir");
    init_household(dir.path());

    let selected = json(dir.path(), &["user", "mama"]);
    assert_eq!(selected["current"], "mama");

    let board = json(dir.path(), &["today"]);
    assert_eq!(board["person_id"], "mama");

    let done = json(dir.path(), &["done", "basura"]);
    assert_eq!(done["log"]["userId"], "mama");

    hearth_cmd(dir.path())
        .args(["user", "fantasma"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("fantasma"));
}

#[test]
fn express_mode_toggles() {
    let dir = TempDir::new().expect("tempdir");
    init_household(dir.path());

    assert_eq!(json(dir.path(), &["express"])["express_enabled"], false);
    assert_eq!(json(dir.path(), &["express", "toggle"])["express_enabled"], true);
    assert_eq!(json(dir.path(), &["today"])["express_enabled"], true);
    assert_eq!(json(dir.path(), &["express", "off"])["express_enabled"], false);
}

#[test]
fn summary_reflects_completions() {
    let dir = TempDir::new().expect("tempdir");
    init_household(dir.path());

    json(dir.path(), &["done", "lavar"]);
    json(dir.path(), &["done", "basura"]);

    let summary = json(dir.path(), &["summary"]);
    assert_eq!(summary["week_key"], "2024-W10");
    assert_eq!(summary["family_reward"], "Helado");

    let papa = summary["contributions_week"]
        .as_array()
        .expect("contributions")
        .iter()
        .find(|row| row["user_id"] == "papa")
        .expect("papa contributed")
        .clone();
    assert_eq!(papa["count"], 2);
    assert!((papa["points"].as_f64().expect("points") - 3.0).abs() < f64::EPSILON);
}

#[test]
fn text_output_is_tab_separated() {
    let dir = TempDir::new().expect("tempdir");
    init_household(dir.path());

    hearth_cmd(dir.path())
        .env("FORMAT", "text")
        .args(["task", "list", "--now", NOW])
        .assert()
        .success()
        .stdout(predicate::str::contains("lavar\tLavar trastes\tCocina"));
}

#[test]
fn quiet_done_prints_nothing() {
    let dir = TempDir::new().expect("tempdir");
    init_household(dir.path());

    hearth_cmd(dir.path())
        .env("FORMAT", "text")
        .args(["-q", "done", "lavar", "--now", NOW])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}
