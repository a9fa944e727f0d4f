//! CLI tests for the taskboard binary.
//!
//! Commands that talk to a backend run against a stub server started on an
//! ephemeral port inside the test process.

use std::fs;
use std::net::SocketAddr;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use taskboard::stub::{StoreHandle, StubStore};
use tempfile::TempDir;

fn taskboard() -> Command {
    let mut cmd = cargo_bin_cmd!("taskboard");
    cmd.env_remove("TASKBOARD_URL")
        .env_remove("TASKBOARD_PROJECT")
        .env_remove("TASKBOARD_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

/// Keeps the runtime (and so the server) alive for the test's duration.
struct RunningStub {
    addr: SocketAddr,
    store: StoreHandle,
    _runtime: tokio::runtime::Runtime,
}

impl RunningStub {
    fn start(store: StubStore) -> Self {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let store = StoreHandle::new(store);
        let addr = runtime
            .block_on(taskboard::stub::spawn(store.clone()))
            .unwrap();
        Self {
            addr,
            store,
            _runtime: runtime,
        }
    }

    fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    fn cmd(&self, dir: &TempDir) -> Command {
        let mut cmd = taskboard();
        cmd.current_dir(dir.path()).args(["--url", &self.url()]);
        cmd
    }
}

// =============================================================================
// Basic CLI Tests
// =============================================================================

mod cli_basics {
    use super::*;

    #[test]
    fn test_help() {
        taskboard()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("move"));
    }

    #[test]
    fn test_version() {
        taskboard().arg("--version").assert().success();
    }

    #[test]
    fn test_move_rejects_unknown_column() {
        let dir = TempDir::new().unwrap();
        taskboard()
            .current_dir(dir.path())
            .args(["move", "1", "sideways"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("sideways"));
    }
}

// =============================================================================
// Config Tests
// =============================================================================

mod config {
    use super::*;

    #[test]
    fn test_config_show_defaults() {
        let dir = TempDir::new().unwrap();
        taskboard()
            .current_dir(dir.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No taskboard.toml found"))
            .stdout(predicate::str::contains("rollback = \"reload\""));
    }

    #[test]
    fn test_config_init_creates_toml() {
        let dir = TempDir::new().unwrap();
        taskboard()
            .current_dir(dir.path())
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Created taskboard.toml"));

        let content = fs::read_to_string(dir.path().join(".taskboard/taskboard.toml")).unwrap();
        assert!(content.contains("[server]"));
        assert!(content.contains("[board]"));

        taskboard()
            .current_dir(dir.path())
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("already exists"));
    }

    #[test]
    fn test_config_validate_reports_warnings() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(".taskboard")).unwrap();
        fs::write(
            dir.path().join(".taskboard/taskboard.toml"),
            "[server]\nbase_url = \"localhost:3141\"\n\n[board]\nretry_attempts = 0\n",
        )
        .unwrap();

        taskboard()
            .current_dir(dir.path())
            .args(["config", "validate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("should start with http://"))
            .stdout(predicate::str::contains("retry_attempts is 0"));
    }

    #[test]
    fn test_env_overrides_file_url() {
        let dir = TempDir::new().unwrap();
        taskboard()
            .current_dir(dir.path())
            .env("TASKBOARD_URL", "http://board.example:8080/")
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("base_url = \"http://board.example:8080\""));
    }
}

// =============================================================================
// Board Tests (against a live stub)
// =============================================================================

mod board {
    use super::*;
    use taskboard::common::{ActivityAction, Column};

    #[test]
    fn test_board_lists_demo_items() {
        let stub = RunningStub::start(StubStore::demo());
        let dir = TempDir::new().unwrap();
        stub.cmd(&dir)
            .arg("board")
            .assert()
            .success()
            .stdout(predicate::str::contains("Project 1 board"))
            .stdout(predicate::str::contains("Login with SSO"))
            .stdout(predicate::str::contains("Expedite"));
    }

    #[test]
    fn test_board_json_is_parseable() {
        let stub = RunningStub::start(StubStore::demo());
        let dir = TempDir::new().unwrap();
        let output = stub.cmd(&dir).args(["board", "--json"]).output().unwrap();
        assert!(output.status.success());
        let view: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(view["project_id"], 1);
        assert_eq!(view["columns"].as_array().unwrap().len(), 6);
    }

    #[test]
    fn test_move_persists_on_server() {
        let stub = RunningStub::start(StubStore::demo());
        let dir = TempDir::new().unwrap();
        stub.cmd(&dir)
            .args(["move", "1", "done", "--lane", "2", "--index", "0"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Moved"));
        let item = stub.store.with(|s| s.item(1)).unwrap();
        assert_eq!(item.column, Column::Done);
    }

    #[test]
    fn test_move_is_recorded_in_activity_log() {
        let stub = RunningStub::start(StubStore::demo());
        let dir = TempDir::new().unwrap();
        stub.cmd(&dir)
            .args(["move", "1", "done", "--lane", "2"])
            .assert()
            .success();

        // The process has exited, so the entry must already be stored.
        let actions: Vec<ActivityAction> = stub
            .store
            .with(|s| s.activity(1))
            .unwrap()
            .into_iter()
            .map(|e| e.action)
            .collect();
        assert_eq!(actions, vec![ActivityAction::Moved]);

        stub.cmd(&dir)
            .args(["activity", "1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("moved from"));
    }

    #[test]
    fn test_move_rejected_by_backend_fails() {
        let mut store = StubStore::demo();
        store.fail_moves(u32::MAX);
        let stub = RunningStub::start(store);
        let dir = TempDir::new().unwrap();
        stub.cmd(&dir)
            .args(["move", "1", "done", "--lane", "2"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("rejected the move of #1"));
        assert_eq!(stub.store.with(|s| s.item(1)).unwrap().column, Column::New);
    }

    #[test]
    fn test_move_to_same_place_is_noop() {
        let stub = RunningStub::start(StubStore::demo());
        let dir = TempDir::new().unwrap();
        stub.cmd(&dir)
            .args(["move", "1", "new", "--lane", "2", "--index", "0"])
            .assert()
            .success()
            .stdout(predicate::str::contains("already there"));
        assert_eq!(stub.store.with(|s| s.move_calls()), 0);
    }

    #[test]
    fn test_lanes_add_and_list() {
        let stub = RunningStub::start(StubStore::demo());
        let dir = TempDir::new().unwrap();
        stub.cmd(&dir)
            .args(["lanes", "add", "Blocked"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Created lane Blocked"));
        stub.cmd(&dir)
            .arg("lanes")
            .assert()
            .success()
            .stdout(predicate::str::contains("Blocked"))
            .stdout(predicate::str::contains("Standard"));
    }

    #[test]
    fn test_unreachable_backend_fails() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let dir = TempDir::new().unwrap();
        taskboard()
            .current_dir(dir.path())
            .args(["--url", &format!("http://{}", addr), "board"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to load board"));
    }
}

// =============================================================================
// Backlog, Team, Activity
// =============================================================================

mod planning {
    use super::*;

    #[test]
    fn test_backlog_shows_sprint_and_backlog() {
        let stub = RunningStub::start(StubStore::demo());
        let dir = TempDir::new().unwrap();
        stub.cmd(&dir)
            .arg("backlog")
            .assert()
            .success()
            .stdout(predicate::str::contains("Sprint 1"))
            .stdout(predicate::str::contains("Export board to CSV"));
    }

    #[test]
    fn test_backlog_plan_assigns_sprint() {
        let stub = RunningStub::start(StubStore::demo());
        let dir = TempDir::new().unwrap();
        stub.cmd(&dir)
            .args(["backlog", "plan", "7", "1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Planned #7 into sprint 1"));
        assert_eq!(stub.store.with(|s| s.item(7)).unwrap().sprint_id, Some(1));
    }

    #[test]
    fn test_team_lists_roles_and_changes_role() {
        let stub = RunningStub::start(StubStore::demo());
        let dir = TempDir::new().unwrap();
        stub.cmd(&dir)
            .arg("team")
            .assert()
            .success()
            .stdout(predicate::str::contains("Product Owner"))
            .stdout(predicate::str::contains("Kofi Mensah"));
        stub.cmd(&dir)
            .args(["team", "set-role", "3", "2"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Li Wei is now role 2"));
    }

    #[test]
    fn test_activity_and_comment_delete() {
        let mut store = StubStore::demo();
        let comment = store.add_comment(2, "needs copy review").unwrap();
        let stub = RunningStub::start(store);
        let dir = TempDir::new().unwrap();
        stub.cmd(&dir)
            .args(["activity", "2"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No activity for #2"));
        stub.cmd(&dir)
            .args(["activity", "2", "--delete-comment", &comment.to_string()])
            .assert()
            .success()
            .stdout(predicate::str::contains("Deleted comment"));
    }
}
