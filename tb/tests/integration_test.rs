//! Integration tests for TallyBoard
//!
//! These tests drive the board end to end: config → trackers → aggregator →
//! totals display, on a virtual clock, plus the `tb` binary itself.

use std::collections::HashMap;
use std::fs;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_cmd::Command;
use predicates::prelude::*;
use tallyboard::board::{Action, Board, TOTALS_LABEL};
use tallyboard::config::Config;
use tallyboard::console::RecordingSink;
use tallyboard::scheduler::ManualScheduler;
use tallyboard::tracker::{OutputSink, Phase, TrackerConfig, TrackerError};
use tempfile::TempDir;

/// Sinks handed out by the board, kept by label so tests can read them
#[derive(Default, Clone)]
struct Sinks(Arc<Mutex<HashMap<String, Arc<RecordingSink>>>>);

impl Sinks {
    fn make(&self, label: &str) -> Arc<dyn OutputSink> {
        let sink = Arc::new(RecordingSink::new());
        self.0.lock().unwrap().insert(label.to_string(), Arc::clone(&sink));
        sink
    }

    fn lines(&self, label: &str) -> Vec<String> {
        self.0.lock().unwrap().get(label).map(|s| s.lines()).unwrap_or_default()
    }
}

fn board_config() -> Config {
    Config {
        trackers: vec![
            TrackerConfig::named("red").with_delta(5.0).with_cycle(50, 100),
            TrackerConfig::named("blue").with_delta(3.0).with_cycle(20, 200),
            TrackerConfig::default(),
        ],
        ..Default::default()
    }
}

fn build(config: &Config) -> (Board, Arc<ManualScheduler>, Sinks) {
    let scheduler = Arc::new(ManualScheduler::new());
    let sinks = Sinks::default();
    let factory = sinks.clone();
    let board = Board::build(config, scheduler.clone(), move |label| factory.make(label));
    (board, scheduler, sinks)
}

// =============================================================================
// Board Tests
// =============================================================================

#[test]
fn test_board_reports_invalid_tracker_without_blocking_others() {
    let (board, _scheduler, sinks) = build(&board_config());

    assert_eq!(board.warnings(), vec![(2, TrackerError::MissingIdentifier)]);
    assert_eq!(
        board.phases(),
        vec![
            ("red".to_string(), Phase::Idle),
            ("blue".to_string(), Phase::Idle),
            (String::new(), Phase::Uninitialized),
        ]
    );
    assert_eq!(sinks.lines("red"), vec!["The red tracker has been initialized!"]);
    assert!(board.aggregator().is_empty());
}

#[test]
fn test_trigger_only_counts_while_active() {
    let (board, scheduler, sinks) = build(&board_config());

    let replies = board.dispatch(&Action::Trigger("red".to_string()));
    assert_eq!(replies, vec!["red is idle, wait for it to light up"]);
    assert!(!board.aggregator().contains("red"));

    scheduler.advance(Duration::from_millis(100));
    assert_eq!(board.tracker("red").map(|t| t.phase()), Some(Phase::Active));

    assert!(board.dispatch(&Action::Trigger("red".to_string())).is_empty());
    assert_eq!(board.aggregator().get("red").value, 5.0);
    assert_eq!(sinks.lines("red")[1], "red has been updated 1 time");
}

#[test]
fn test_grand_total_scenario_through_board() {
    let (board, _scheduler, sinks) = build(&board_config());

    board.dispatch(&Action::Add("red".to_string(), 5.0));
    board.dispatch(&Action::Add("blue".to_string(), 3.0));
    board.dispatch(&Action::Reset("red".to_string()));
    assert_eq!(board.dispatch(&Action::Delete("blue".to_string())), vec!["blue deleted"]);

    let totals: Vec<String> = sinks.lines(TOTALS_LABEL);
    assert_eq!(totals.len(), 4, "one totals line per mutation");
    assert!(totals[0].starts_with("no. of changes: 1 · grand total: 5 ·"));
    assert!(totals[1].starts_with("no. of changes: 2 · grand total: 8 ·"));
    assert!(totals[2].starts_with("no. of changes: 1 · grand total: 3 ·"));
    assert!(totals[3].starts_with("no. of changes: 0 · grand total: 0 ·"));

    let now = board.dispatch(&Action::Totals);
    assert!(now[0].starts_with("no. of changes: 0 · grand total: 0 ·"));
}

#[test]
fn test_undo_and_unknown_tracker() {
    let (board, _scheduler, _sinks) = build(&board_config());

    board.dispatch(&Action::Add("blue".to_string(), 10.0));
    board.dispatch(&Action::Undo("blue".to_string()));
    let blue = board.aggregator().get("blue");
    assert_eq!(blue.changed, 2);
    assert_eq!(blue.value, 7.0);

    assert_eq!(board.dispatch(&Action::Add("green".to_string(), 1.0)), vec!["no tracker named 'green'"]);
    assert_eq!(board.dispatch(&Action::Delete("green".to_string())), vec!["green has no counts to delete"]);
}

#[test]
fn test_list_shows_phase_and_counts() {
    let (board, scheduler, _sinks) = build(&board_config());
    scheduler.advance(Duration::from_millis(100));
    board.dispatch(&Action::Add("red".to_string(), 2.0));

    let list = board.dispatch(&Action::List);
    assert_eq!(list.len(), 3);
    assert!(list[0].starts_with("red: Active · 1 changes, total 2, updated "));
    assert_eq!(list[1], "blue: Idle · no changes yet");
    assert_eq!(list[2], "#2 Uninitialized: tracker has no identifier");
    assert!(!board.aggregator().contains("blue"), "listing creates no entries");
}

#[test]
fn test_independent_cycles_on_shared_clock() {
    let (board, scheduler, _sinks) = build(&board_config());

    // red: active [100,150); blue: active [200,220)
    scheduler.advance(Duration::from_millis(120));
    assert_eq!(board.tracker("red").unwrap().phase(), Phase::Active);
    assert_eq!(board.tracker("blue").unwrap().phase(), Phase::Idle);

    scheduler.advance(Duration::from_millis(90));
    assert_eq!(board.tracker("red").unwrap().phase(), Phase::Idle);
    assert_eq!(board.tracker("blue").unwrap().phase(), Phase::Active);

    scheduler.advance(Duration::from_millis(50));
    assert_eq!(board.tracker("red").unwrap().phase(), Phase::Active);
    assert_eq!(board.tracker("blue").unwrap().phase(), Phase::Idle);
}

#[test]
fn test_shutdown_stops_every_cycle() {
    let (board, scheduler, _sinks) = build(&board_config());
    assert_eq!(scheduler.pending(), 2);

    board.shutdown();
    assert_eq!(scheduler.pending(), 0);
    assert!(board.phases().iter().all(|(_, phase)| *phase == Phase::Uninitialized));
}

#[test]
fn test_hidden_totals_display() {
    let config = Config {
        show_totals: false,
        ..board_config()
    };
    let (board, _scheduler, sinks) = build(&config);
    board.dispatch(&Action::Add("red".to_string(), 1.0));
    assert!(sinks.lines(TOTALS_LABEL).is_empty());
    assert_eq!(board.aggregator().subscriber_count(), 0);
}

// =============================================================================
// Binary Tests
// =============================================================================

fn write_config(dir: &TempDir, yaml: &str) -> std::path::PathBuf {
    let path = dir.path().join("tallyboard.yml");
    fs::write(&path, yaml).expect("Failed to write config");
    path
}

fn tb(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tb").expect("tb binary");
    cmd.current_dir(dir.path()).env("XDG_DATA_HOME", dir.path()).env("HOME", dir.path());
    cmd
}

#[test]
fn test_cli_check_lists_trackers() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_config(
        &dir,
        "trackers:\n  - identifier: red\n    delta: 1\n  - delta: 2\n",
    );

    tb(&dir)
        .args(["check", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("red"))
        .stdout(predicate::str::contains("tracker has no identifier"))
        .stdout(predicate::str::contains("1 of 2 trackers ready"));
}

#[test]
fn test_cli_check_fails_without_valid_trackers() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_config(&dir, "trackers: []\n");

    tb(&dir)
        .args(["check", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No valid trackers configured"));
}

#[test]
fn test_cli_simulate_prints_transitions() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_config(
        &dir,
        "trackers:\n  - identifier: red\n    active-duration-ms: 50\n    idle-frequency-ms: 100\n",
    );

    tb(&dir)
        .args(["simulate", "-d", "300", "-s", "50", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Idle → Active"))
        .stdout(predicate::str::contains("Active → Idle"))
        .stdout(predicate::str::contains("2 activations in 300ms"));
}

#[test]
fn test_cli_simulate_prints_windows_shorter_than_step() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_config(
        &dir,
        "trackers:\n  - identifier: red\n    active-duration-ms: 50\n    idle-frequency-ms: 100\n",
    );

    // Default 1000ms step, 50ms active windows
    tb(&dir)
        .args(["simulate", "-d", "1000", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"\n\s+100ms  \S*red\S*: Idle → Active\n").unwrap())
        .stdout(predicate::str::is_match(r"\n\s+150ms  \S*red\S*: Active → Idle\n").unwrap())
        .stdout(predicate::str::is_match(r"\n\s+850ms  \S*red\S*: Idle → Active\n").unwrap())
        .stdout(predicate::str::contains("7 activations in 1000ms"));
}

#[test]
fn test_cli_run_reads_actions_from_stdin() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_config(&dir, "trackers:\n  - identifier: red\n    delta: 2\n");

    tb(&dir)
        .args(["run", "--config"])
        .arg(&path)
        .write_stdin("red 4\ntotals\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("The red tracker has been initialized!"))
        .stdout(predicate::str::contains("red has been updated 1 time"))
        .stdout(predicate::str::contains("grand total: 4"));
}
