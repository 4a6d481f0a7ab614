#[allow(deprecated)]
use assert_cmd::Command;
use chrono::{Duration, Local};
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

// ─── helpers ───────────────────────────────────────────────────────

struct TestEnv {
    dir: TempDir,
}

impl TestEnv {
    fn new() -> Self {
        let dir = TempDir::new().expect("create tempdir");
        std::process::Command::new("git")
            .args(["init"])
            .current_dir(dir.path())
            .output()
            .expect("git init");
        Self { dir }
    }

    fn initialized() -> Self {
        let env = Self::new();
        env.run_ok(&["init"]);
        env
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("lectio-board").expect("binary");
        cmd.current_dir(self.dir.path());
        cmd.env_remove("LECTIO_BOARD_USER");
        cmd.env_remove("RUST_LOG");
        cmd
    }

    fn run_json(&self, args: &[&str]) -> Value {
        let mut a: Vec<&str> = args.to_vec();
        a.push("--json");
        let output = self.cmd().args(&a).output().expect("run");
        let stdout = String::from_utf8_lossy(&output.stdout);
        serde_json::from_str(&stdout)
            .unwrap_or_else(|e| panic!("parse JSON failed: {e}\nstdout: {stdout}"))
    }

    fn run_ok(&self, args: &[&str]) -> Value {
        let v = self.run_json(args);
        assert_eq!(v["success"], true, "expected success=true: {v}");
        v
    }

    fn run_err(&self, args: &[&str]) -> Value {
        let v = self.run_json(args);
        assert_eq!(v["success"], false, "expected success=false: {v}");
        v
    }

    fn add(&self, args: &[&str]) -> String {
        let mut a = vec!["task", "add"];
        a.extend_from_slice(args);
        let v = self.run_ok(&a);
        v["data"]["task"]["id"].as_str().unwrap().to_string()
    }

    fn write_file(&self, filename: &str, content: &[u8]) -> PathBuf {
        let p = self.dir.path().join(filename);
        fs::write(&p, content).expect("write file");
        p
    }

    fn import(&self, content: &str) -> Value {
        let output = self
            .cmd()
            .args(["task", "import", "--json"])
            .write_stdin(content.to_string())
            .output()
            .expect("task import");
        let stdout = String::from_utf8_lossy(&output.stdout);
        serde_json::from_str(&stdout)
            .unwrap_or_else(|e| panic!("parse JSON failed: {e}\nstdout: {stdout}"))
    }

    fn column_ids(&self, board: &Value, status: &str) -> Vec<String> {
        board["data"]["columns"]
            .as_array()
            .unwrap()
            .iter()
            .find(|c| c["status"] == status)
            .unwrap_or_else(|| panic!("no column {status}: {board}"))["tasks"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["id"].as_str().unwrap().to_string())
            .collect()
    }

    fn task_count(&self) -> usize {
        let v = self.run_ok(&["task", "list"]);
        v["data"]["tasks"].as_array().unwrap().len()
    }
}

fn days_from_today(days: i64) -> String {
    (Local::now().date_naive() + Duration::days(days))
        .format("%Y-%m-%d")
        .to_string()
}

const PNG_BYTES: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00,
];

// ─── 1. init ───────────────────────────────────────────────────────

#[test]
fn test_init() {
    let env = TestEnv::new();
    let v = env.run_ok(&["init"]);
    let path = v["data"]["path"].as_str().unwrap();
    assert!(path.ends_with(".lectio/board/board.db"));
    assert!(PathBuf::from(path).exists());
}

#[test]
fn test_init_idempotent() {
    let env = TestEnv::new();
    env.run_ok(&["init"]);
    let v = env.run_ok(&["init"]);
    assert!(v["data"]["path"].as_str().unwrap().contains("board.db"));
}

#[test]
fn test_init_required_before_commands() {
    let env = TestEnv::new();
    let v = env.run_err(&["task", "list"]);
    assert_eq!(v["error"]["code"], "NOT_INITIALIZED");
    let v = env.run_err(&["board"]);
    assert_eq!(v["error"]["code"], "NOT_INITIALIZED");
}

// ─── 2. add / show / list ─────────────────────────────────────────

#[test]
fn test_add_starts_in_proposed() {
    let env = TestEnv::initialized();
    let v = env.run_ok(&[
        "task", "add", "Record rosary meditation", "--description", "Sorrowful mysteries",
        "--priority", "high", "--assignee", "ana", "--due", "2030-01-15",
    ]);
    let task = &v["data"]["task"];
    assert_eq!(task["status"], "proposed");
    assert_eq!(task["priority"], "high");
    assert_eq!(task["assignee"], "ana");
    assert_eq!(task["due_date"], "2030-01-15");
    assert_eq!(task["description"], "Sorrowful mysteries");
    assert_eq!(task["overdue"], false);
    assert!(task["created_at"].as_str().is_some());
}

#[test]
fn test_add_defaults_to_medium_priority() {
    let env = TestEnv::initialized();
    let id = env.add(&["Daily quote"]);
    let v = env.run_ok(&["task", "show", &id]);
    assert_eq!(v["data"]["task"]["priority"], "medium");
    assert_eq!(v["data"]["task"]["assignee"], Value::Null);
}

#[test]
fn test_add_empty_title_rejected() {
    let env = TestEnv::initialized();
    let v = env.run_err(&["task", "add", "   "]);
    assert_eq!(v["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(env.task_count(), 0);
}

#[test]
fn test_add_empty_title_rejected_before_storage() {
    // Not initialized: a storage error would be NOT_INITIALIZED.
    let env = TestEnv::new();
    let v = env.run_err(&["task", "add", ""]);
    assert_eq!(v["error"]["code"], "VALIDATION_ERROR");
}

#[test]
fn test_add_invalid_fields_rejected() {
    let env = TestEnv::initialized();
    let v = env.run_err(&["task", "add", "T", "--priority", "urgent"]);
    assert_eq!(v["error"]["code"], "VALIDATION_ERROR");
    let v = env.run_err(&["task", "add", "T", "--due", "15/01/2030"]);
    assert_eq!(v["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(env.task_count(), 0);
}

#[test]
fn test_show_by_prefix_and_not_found() {
    let env = TestEnv::initialized();
    let id = env.add(&["Lectio reading"]);
    let v = env.run_ok(&["task", "show", &id[..20]]);
    assert_eq!(v["data"]["task"]["id"], id.as_str());
    let v = env.run_err(&["task", "show", "zzzz"]);
    assert_eq!(v["error"]["code"], "NOT_FOUND");
}

#[test]
fn test_list_keeps_creation_order() {
    let env = TestEnv::initialized();
    let a = env.add(&["First"]);
    let b = env.add(&["Second"]);
    let c = env.add(&["Third"]);
    let v = env.run_ok(&["task", "list"]);
    let ids: Vec<_> = v["data"]["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec![a, b, c]);
}

// ─── 3. filters ────────────────────────────────────────────────────

#[test]
fn test_search_is_case_insensitive() {
    let env = TestEnv::initialized();
    env.add(&["Translate quote", "--description", "Into PORTUGUESE"]);
    env.add(&["Retreat schedule"]);
    let v = env.run_ok(&["task", "list", "--search", "portuguese"]);
    assert_eq!(v["data"]["count"], 1);
    let v = env.run_ok(&["task", "list", "--search", "RETREAT"]);
    assert_eq!(v["data"]["tasks"][0]["title"], "Retreat schedule");
    let v = env.run_ok(&["task", "list", "--search", ""]);
    assert_eq!(v["data"]["count"], 2);
}

#[test]
fn test_filters_combine_with_and() {
    let env = TestEnv::initialized();
    env.add(&["A", "--priority", "high", "--assignee", "ana"]);
    env.add(&["B", "--priority", "high", "--assignee", "luis"]);
    env.add(&["C", "--priority", "low", "--assignee", "ana"]);
    let v = env.run_ok(&["task", "list", "--priority", "high", "--assignee", "ana"]);
    assert_eq!(v["data"]["count"], 1);
    assert_eq!(v["data"]["tasks"][0]["title"], "A");
    let v = env.run_ok(&["task", "list", "--priority", "all", "--assignee", "all"]);
    assert_eq!(v["data"]["count"], 3);
}

#[test]
fn test_unknown_filter_values_rejected() {
    let env = TestEnv::initialized();
    let v = env.run_err(&["board", "--status", "archived"]);
    assert_eq!(v["error"]["code"], "VALIDATION_ERROR");
    let v = env.run_err(&["board", "--quick", "someday"]);
    assert_eq!(v["error"]["code"], "VALIDATION_ERROR");
}

#[test]
fn test_overdue_lands_only_in_its_column() {
    let env = TestEnv::initialized();
    let old = env.add(&["Old task", "--due", "2020-01-01"]);
    env.add(&["Future task", "--due", "2999-01-01"]);
    let board = env.run_ok(&["board", "--quick", "overdue"]);
    assert_eq!(env.column_ids(&board, "proposed"), vec![old.clone()]);
    for status in ["in_progress", "testing", "done"] {
        assert!(env.column_ids(&board, status).is_empty());
    }
    assert_eq!(board["data"]["columns"][0]["tasks"][0]["overdue"], true);
}

#[test]
fn test_done_task_is_not_overdue() {
    let env = TestEnv::initialized();
    let id = env.add(&["Finished", "--due", "2020-01-01"]);
    env.run_ok(&["task", "move", &id, "done"]);
    let v = env.run_ok(&["task", "list", "--quick", "overdue"]);
    assert_eq!(v["data"]["count"], 0);
}

#[test]
fn test_this_week_window_is_inclusive() {
    let env = TestEnv::initialized();
    let today = env.add(&["Today", "--due", &days_from_today(0)]);
    let seven = env.add(&["Seven", "--due", &days_from_today(7)]);
    env.add(&["Eight", "--due", &days_from_today(8)]);
    env.add(&["Yesterday", "--due", &days_from_today(-1)]);
    env.add(&["Undated"]);
    let board = env.run_ok(&["board", "--quick", "this-week"]);
    assert_eq!(env.column_ids(&board, "proposed"), vec![today, seven]);
}

#[test]
fn test_my_filter_uses_current_user() {
    let env = TestEnv::initialized();
    let mine = env.add(&["Mine", "--assignee", "teresa"]);
    env.add(&["Theirs", "--assignee", "john"]);

    let v = env.run_ok(&["task", "list", "--quick", "my"]);
    assert_eq!(v["data"]["count"], 0, "no current user matches nothing");

    let v = env.run_ok(&["task", "list", "--quick", "my", "--user", "teresa"]);
    assert_eq!(v["data"]["tasks"][0]["id"], mine.as_str());

    env.run_ok(&["config", "set-user", "john"]);
    let v = env.run_ok(&["task", "list", "--quick", "my"]);
    assert_eq!(v["data"]["tasks"][0]["title"], "Theirs");

    let output = env
        .cmd()
        .args(["task", "list", "--quick", "my", "--json"])
        .env("LECTIO_BOARD_USER", "teresa")
        .output()
        .unwrap();
    let v: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(v["data"]["tasks"][0]["title"], "Mine");
}

#[test]
fn test_board_column_option() {
    let env = TestEnv::initialized();
    let a = env.add(&["A"]);
    env.add(&["B"]);
    env.run_ok(&["task", "move", &a, "testing"]);
    let board = env.run_ok(&["board", "--column", "testing"]);
    let columns = board["data"]["columns"].as_array().unwrap();
    assert_eq!(columns.len(), 1);
    assert_eq!(columns[0]["count"], 1);
    assert_eq!(columns[0]["tasks"][0]["id"], a.as_str());
}

#[test]
fn test_board_partitions_without_duplicates() {
    let env = TestEnv::initialized();
    let ids: Vec<String> = (0..6).map(|i| env.add(&[&format!("Task {i}")])).collect();
    env.run_ok(&["task", "move", &ids[1], "in_progress"]);
    env.run_ok(&["task", "move", &ids[2], "testing"]);
    env.run_ok(&["task", "move", &ids[3], "done"]);
    env.run_ok(&["task", "move", &ids[4], "done"]);

    let board = env.run_ok(&["board"]);
    let mut seen: Vec<String> = Vec::new();
    for status in ["proposed", "in_progress", "testing", "done"] {
        seen.extend(env.column_ids(&board, status));
    }
    seen.sort();
    let mut expected = ids.clone();
    expected.sort();
    assert_eq!(seen, expected);
}

#[test]
fn test_sort_by_priority() {
    let env = TestEnv::initialized();
    env.add(&["Low", "--priority", "low"]);
    env.add(&["High", "--priority", "high"]);
    env.add(&["Medium"]);
    let v = env.run_ok(&["task", "list", "--sort", "priority"]);
    let titles: Vec<_> = v["data"]["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, ["High", "Medium", "Low"]);
}

// ─── 4. move (drag and drop) ───────────────────────────────────────

#[test]
fn test_move_to_same_column_is_noop() {
    let env = TestEnv::initialized();
    let id = env.add(&["Stay"]);
    let before = env.run_ok(&["task", "show", &id]);
    let v = env.run_ok(&["task", "move", &id, "proposed"]);
    assert_eq!(v["data"]["moved"], false);
    let after = env.run_ok(&["task", "show", &id]);
    assert_eq!(before["data"]["task"]["updated_at"], after["data"]["task"]["updated_at"]);
}

#[test]
fn test_move_changes_column() {
    let env = TestEnv::initialized();
    let id = env.add(&["Go"]);
    let v = env.run_ok(&["task", "move", &id, "in_progress"]);
    assert_eq!(v["data"]["moved"], true);
    assert_eq!(v["data"]["from"], "proposed");
    assert_eq!(v["data"]["to"], "in_progress");
    let v = env.run_ok(&["task", "show", &id]);
    assert_eq!(v["data"]["task"]["status"], "in_progress");
}

#[test]
fn test_move_unknown_column_rejected() {
    let env = TestEnv::initialized();
    let id = env.add(&["Go"]);
    let v = env.run_err(&["task", "move", &id, "backlog"]);
    assert_eq!(v["error"]["code"], "VALIDATION_ERROR");
    let v = env.run_ok(&["task", "show", &id]);
    assert_eq!(v["data"]["task"]["status"], "proposed");
}

#[test]
fn test_move_unknown_task() {
    let env = TestEnv::initialized();
    let v = env.run_err(&["task", "move", "nope", "done"]);
    assert_eq!(v["error"]["code"], "NOT_FOUND");
}

// ─── 5. edit ───────────────────────────────────────────────────────

#[test]
fn test_edit_fields() {
    let env = TestEnv::initialized();
    let id = env.add(&["Draft", "--assignee", "ana", "--due", "2030-02-02"]);
    let v = env.run_ok(&[
        "task", "edit", &id, "--title", "Final", "--clear-assignee", "--priority", "low",
        "--status", "testing",
    ]);
    let task = &v["data"]["task"];
    assert_eq!(task["title"], "Final");
    assert_eq!(task["assignee"], Value::Null);
    assert_eq!(task["priority"], "low");
    assert_eq!(task["status"], "testing");
    assert_eq!(task["due_date"], "2030-02-02");

    let v = env.run_ok(&["task", "edit", &id, "--clear-due"]);
    assert_eq!(v["data"]["task"]["due_date"], Value::Null);
}

#[test]
fn test_edit_validation() {
    let env = TestEnv::initialized();
    let id = env.add(&["Keep me"]);
    let v = env.run_err(&["task", "edit", &id, "--title", " "]);
    assert_eq!(v["error"]["code"], "VALIDATION_ERROR");
    let v = env.run_err(&["task", "edit", &id]);
    assert_eq!(v["error"]["code"], "VALIDATION_ERROR");
    let v = env.run_err(&["task", "edit", &id, "--status", "archived"]);
    assert_eq!(v["error"]["code"], "VALIDATION_ERROR");
    let v = env.run_ok(&["task", "show", &id]);
    assert_eq!(v["data"]["task"]["title"], "Keep me");
}

// ─── 6. delete ─────────────────────────────────────────────────────

#[test]
fn test_delete_requires_confirmation() {
    let env = TestEnv::initialized();
    let id = env.add(&["Doomed"]);
    let v = env.run_err(&["task", "delete", &id]);
    assert_eq!(v["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(env.task_count(), 1);
}

#[test]
fn test_delete_is_idempotent() {
    let env = TestEnv::initialized();
    let id = env.add(&["Doomed"]);
    let v = env.run_ok(&["task", "delete", &id, "--yes"]);
    assert_eq!(v["data"]["already_deleted"], false);
    assert_eq!(env.task_count(), 0);
    let v = env.run_ok(&["task", "delete", &id, "--yes"]);
    assert_eq!(v["data"]["already_deleted"], true);
}

#[test]
fn test_blank_or_wildcard_reference_matches_nothing() {
    let env = TestEnv::initialized();
    let id = env.add(&["Only task"]);

    let v = env.run_err(&["task", "delete", "", "--yes"]);
    assert_eq!(v["error"]["code"], "VALIDATION_ERROR");
    let v = env.run_err(&["task", "move", "%", "done"]);
    assert_eq!(v["error"]["code"], "NOT_FOUND");
    let v = env.run_err(&["task", "show", "_"]);
    assert_eq!(v["error"]["code"], "NOT_FOUND");
    let v = env.run_ok(&["task", "delete", "%", "--yes"]);
    assert_eq!(v["data"]["already_deleted"], true);

    let v = env.run_ok(&["task", "show", &id]);
    assert_eq!(v["data"]["task"]["status"], "proposed");
    assert_eq!(env.task_count(), 1);
}

// ─── 7. images ─────────────────────────────────────────────────────

#[test]
fn test_add_with_image() {
    let env = TestEnv::initialized();
    let image = env.write_file("cover.png", PNG_BYTES);
    let v = env.run_ok(&["task", "add", "Illustrated", "--image", image.to_str().unwrap()]);
    let url = v["data"]["task"]["image_url"].as_str().unwrap();
    assert!(url.starts_with("file://"));
    assert!(url.ends_with(".png"));
    assert!(PathBuf::from(url.trim_start_matches("file://")).exists());
}

#[test]
fn test_non_image_rejected() {
    let env = TestEnv::initialized();
    let fake = env.write_file("fake.png", b"plain text, not a picture");
    let v = env.run_err(&["task", "add", "Illustrated", "--image", fake.to_str().unwrap()]);
    assert_eq!(v["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(env.task_count(), 0);
}

#[test]
fn test_oversized_image_rejected() {
    let env = TestEnv::initialized();
    let mut bytes = PNG_BYTES.to_vec();
    bytes.resize(5 * 1024 * 1024 + 1, 0);
    let big = env.write_file("big.png", &bytes);
    let id = env.add(&["Plain"]);
    let v = env.run_err(&["task", "edit", &id, "--image", big.to_str().unwrap()]);
    assert_eq!(v["error"]["code"], "VALIDATION_ERROR");
    assert!(v["error"]["message"].as_str().unwrap().contains("5MB"));
}

// ─── 8. import / export ───────────────────────────────────────────

#[test]
fn test_import_and_export() {
    let env = TestEnv::initialized();
    let v = env.import(
        &serde_json::json!([
            {"title": "Advent readings", "priority": "high", "due_date": "2030-12-01"},
            {"title": "Lent retreat", "status": "testing", "assignee": "luis"}
        ])
        .to_string(),
    );
    assert_eq!(v["success"], true, "{v}");
    assert_eq!(v["data"]["imported"], 2);

    let v = env.run_ok(&["task", "export"]);
    let tasks = v["data"]["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0]["status"], "proposed");
    assert_eq!(tasks[0]["due_date"], "2030-12-01");
    assert_eq!(tasks[1]["status"], "testing");

    // Export output feeds straight back into import.
    let output = env.cmd().args(["task", "export"]).output().unwrap();
    let v = env.import(&String::from_utf8_lossy(&output.stdout));
    assert_eq!(v["data"]["imported"], 2);
    assert_eq!(env.task_count(), 4);
}

#[test]
fn test_import_is_all_or_nothing() {
    let env = TestEnv::initialized();
    let v = env.import(r#"[{"title": "Fine"}, {"title": "Bad", "status": "backlog"}]"#);
    assert_eq!(v["success"], false);
    assert_eq!(v["error"]["code"], "VALIDATION_ERROR");
    let v = env.import(r#"{"tasks": [{"title": "Fine"}, {"title": ""}]}"#);
    assert_eq!(v["success"], false);
    assert_eq!(env.task_count(), 0);
}

// ─── 9. status / config / text output ─────────────────────────────

#[test]
fn test_status_counts() {
    let env = TestEnv::initialized();
    let a = env.add(&["A", "--due", "2020-01-01"]);
    let b = env.add(&["B"]);
    env.add(&["C"]);
    env.run_ok(&["task", "move", &a, "testing"]);
    env.run_ok(&["task", "move", &b, "done"]);
    let v = env.run_ok(&["status"]);
    let p = &v["data"]["progress"];
    assert_eq!(p["total"], 3);
    assert_eq!(p["proposed"], 1);
    assert_eq!(p["testing"], 1);
    assert_eq!(p["done"], 1);
    assert_eq!(p["overdue"], 1);
}

#[test]
fn test_config_set_and_clear_user() {
    let env = TestEnv::initialized();
    let v = env.run_ok(&["config", "set-user", "maria"]);
    assert_eq!(v["data"]["current_user"], "maria");
    let v = env.run_ok(&["config", "show", "--user", "jose"]);
    assert_eq!(v["data"]["current_user"], "maria");
    assert_eq!(v["data"]["effective_user"], "jose");
    env.run_ok(&["config", "clear-user"]);
    let v = env.run_ok(&["config", "show"]);
    assert_eq!(v["data"]["current_user"], Value::Null);
    let v = env.run_err(&["config", "set-user", " "]);
    assert_eq!(v["error"]["code"], "VALIDATION_ERROR");
}

#[test]
fn test_board_load_failure_uses_error_envelope() {
    let env = TestEnv::initialized();
    let id = env.add(&["Corrupted"]);
    let db = env.dir.path().join(".lectio/board/board.db");
    let conn = rusqlite::Connection::open(&db).unwrap();
    conn.execute("UPDATE tasks SET due_date = 'someday' WHERE id = ?1", [&id])
        .unwrap();
    drop(conn);

    let v = env.run_err(&["board"]);
    assert_eq!(v["error"]["code"], "TRANSPORT_ERROR");
    assert!(v["error"]["message"].as_str().is_some());
    env.cmd().args(["board"]).assert().failure().code(1);
}

#[test]
fn test_text_board_output() {
    let env = TestEnv::initialized();
    env.add(&["Rosary audio", "--due", "2020-01-01"]);
    env.cmd()
        .args(["board"])
        .assert()
        .success()
        .stdout(predicate::str::contains("== Proposed (1) =="))
        .stdout(predicate::str::contains("== Done (0) =="))
        .stdout(predicate::str::contains("[OVERDUE]"));
}

#[test]
fn test_text_error_output() {
    let env = TestEnv::initialized();
    env.cmd()
        .args(["task", "add", " "])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error: Task title must not be empty"));
}
