#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A `cchook` invocation isolated from the developer's machine: its own
/// config dir and home, no SSH or tmux markers, no colour.
fn cchook(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("cchook").unwrap();
    cmd.current_dir(dir.path())
        .env("CLAUDE_CONFIG_DIR", claude_dir(dir))
        .env("HOME", dir.path())
        .env("NO_COLOR", "1")
        .env_remove("SSH_CONNECTION")
        .env_remove("SSH_CLIENT")
        .env_remove("SSH_TTY")
        .env_remove("TMUX")
        .env_remove("CLAUDE_NOTIFY_MODE")
        .env_remove("CLAUDE_NOTIFY_TOPIC")
        .env_remove("CLAUDE_NOTIFY_URL")
        .env_remove("RUST_LOG");
    cmd
}

fn claude_dir(dir: &TempDir) -> PathBuf {
    dir.path().join("claude")
}

fn write_config(dir: &TempDir, yaml: &str) {
    let path = claude_dir(dir).join("hooks/config.yaml");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, yaml).unwrap();
}

/// Quiet notifications: no audio player, log only.
const LOG_ONLY: &str = "notify:\n  sound:\n    enabled: false\n";

fn project(dir: &TempDir, branch: &str) -> PathBuf {
    let project = dir.path().join("my-app");
    std::fs::create_dir_all(project.join(".git")).unwrap();
    std::fs::write(
        project.join(".git/HEAD"),
        format!("ref: refs/heads/{branch}\n"),
    )
    .unwrap();
    project
}

fn transcript(dir: &TempDir, lines: &[&str]) -> PathBuf {
    let path = dir.path().join("session.jsonl");
    std::fs::write(&path, lines.join("\n")).unwrap();
    path
}

fn status_payload(model_id: &str, display: &str, cwd: &Path, transcript: &Path) -> String {
    serde_json::json!({
        "hook_event_name": "Status",
        "session_id": "abc123",
        "transcript_path": transcript,
        "cwd": cwd,
        "model": {"id": model_id, "display_name": display},
        "workspace": {"current_dir": cwd, "project_dir": cwd},
    })
    .to_string()
}

// ---------------------------------------------------------------------------
// cchook statusline
// ---------------------------------------------------------------------------

#[test]
fn statusline_reference_scenario() {
    let dir = TempDir::new().unwrap();
    let cwd = project(&dir, "main");
    let t = transcript(
        &dir,
        &[
            r#"{"type":"user","message":{"role":"user","content":"hi"}}"#,
            r#"{"type":"assistant","message":{"usage":{"input_tokens":10,"output_tokens":5}}}"#,
            r#"{"type":"assistant","message":{"usage":{"input_tokens":60000,"cache_creation_input_tokens":15000,"cache_read_input_tokens":25000,"output_tokens":900}}}"#,
        ],
    );

    cchook(&dir)
        .arg("statusline")
        .write_stdin(status_payload("claude-sonnet-4-5", "Sonnet 4.5", &cwd, &t))
        .assert()
        .success()
        .stdout("[Sonnet 4.5] my-app (main) | 100k tokens (50.0%) | 35% to compact\n");
}

#[test]
fn statusline_autocompact_off_counts_to_end() {
    let dir = TempDir::new().unwrap();
    let cwd = project(&dir, "main");
    let t = transcript(
        &dir,
        &[r#"{"type":"assistant","message":{"usage":{"input_tokens":100000}}}"#],
    );
    std::fs::create_dir_all(claude_dir(&dir)).unwrap();
    std::fs::write(
        claude_dir(&dir).join(".claude.json"),
        r#"{"autoCompactEnabled": false}"#,
    )
    .unwrap();

    cchook(&dir)
        .arg("statusline")
        .write_stdin(status_payload("claude-sonnet-4-5", "Sonnet 4.5", &cwd, &t))
        .assert()
        .success()
        .stdout(predicate::str::ends_with("| 50% to end\n"));
}

#[test]
fn statusline_extended_window() {
    let dir = TempDir::new().unwrap();
    let cwd = project(&dir, "main");
    let t = transcript(
        &dir,
        &[r#"{"type":"assistant","message":{"usage":{"input_tokens":250000}}}"#],
    );

    cchook(&dir)
        .arg("statusline")
        .write_stdin(status_payload("claude-sonnet-4-5[1m]", "Sonnet 4.5", &cwd, &t))
        .assert()
        .success()
        .stdout(predicate::str::contains("250k tokens (25.0%) | 74% to compact"));
}

#[test]
fn statusline_survives_malformed_stdin() {
    let dir = TempDir::new().unwrap();
    cchook(&dir)
        .arg("statusline")
        .write_stdin("{not json")
        .assert()
        .success()
        .stdout("[Claude] | 19k tokens (9.3%) | 88% to compact\n");
}

#[test]
fn statusline_missing_transcript_uses_base_overhead() {
    let dir = TempDir::new().unwrap();
    let cwd = project(&dir, "feature/x");
    let missing = dir.path().join("nope.jsonl");
    cchook(&dir)
        .arg("statusline")
        .write_stdin(status_payload("claude-opus-4-1", "Opus 4.1", &cwd, &missing))
        .assert()
        .success()
        .stdout("[Opus 4.1] my-app (feature/x) | 19k tokens (9.3%) | 88% to compact\n");
}

#[test]
fn statusline_colours_unless_disabled() {
    let dir = TempDir::new().unwrap();
    let cwd = project(&dir, "main");
    let t = transcript(
        &dir,
        &[r#"{"type":"assistant","message":{"usage":{"input_tokens":100000}}}"#],
    );
    let payload = status_payload("claude-sonnet-4-5", "Sonnet 4.5", &cwd, &t);

    cchook(&dir)
        .env_remove("NO_COLOR")
        .arg("statusline")
        .write_stdin(payload.clone())
        .assert()
        .success()
        .stdout(predicate::str::contains("\u{1b}["));

    cchook(&dir)
        .env_remove("NO_COLOR")
        .args(["statusline", "--no-color"])
        .write_stdin(payload)
        .assert()
        .success()
        .stdout(predicate::str::contains("\u{1b}[").not());
}

#[test]
fn statusline_json() {
    let dir = TempDir::new().unwrap();
    let cwd = project(&dir, "main");
    let t = transcript(
        &dir,
        &[r#"{"type":"assistant","message":{"usage":{"input_tokens":100000}}}"#],
    );
    let output = cchook(&dir)
        .args(["statusline", "--json"])
        .write_stdin(status_payload("claude-sonnet-4-5", "Sonnet 4.5", &cwd, &t))
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["branch"], "main");
    assert_eq!(value["budget"]["capacity"], 200000);
    assert_eq!(value["budget"]["total_tokens"], 100000);
}

// ---------------------------------------------------------------------------
// cchook notify
// ---------------------------------------------------------------------------

fn notification_payload(message: &str) -> String {
    serde_json::json!({
        "hook_event_name": "Notification",
        "session_id": "abc123",
        "cwd": "/work/my-app",
        "message": message,
    })
    .to_string()
}

#[test]
fn notify_mode_off_suppresses() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, LOG_ONLY);
    cchook(&dir)
        .env("CLAUDE_NOTIFY_MODE", "off")
        .args(["notify", "--json"])
        .write_stdin(notification_payload("Claude needs your permission to use Bash"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"mode_off\""));
    assert!(!claude_dir(&dir).join("logs/notifications.log").exists());
}

#[test]
fn notify_mode_on_logs_once_within_window() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, LOG_ONLY);
    let payload = notification_payload("Claude needs your permission to use Bash");

    cchook(&dir)
        .env("CLAUDE_NOTIFY_MODE", "on")
        .arg("notify")
        .write_stdin(payload.clone())
        .assert()
        .success()
        .stdout("");

    cchook(&dir)
        .env("CLAUDE_NOTIFY_MODE", "on")
        .args(["notify", "--json"])
        .write_stdin(payload)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"duplicate\""));

    let log = std::fs::read_to_string(claude_dir(&dir).join("logs/notifications.log")).unwrap();
    assert_eq!(log.lines().count(), 1);
    assert!(log.contains("[attention] Claude · my-app: Claude needs your permission to use Bash"));
    assert!(claude_dir(&dir)
        .join("hooks/state/last-notification.json")
        .exists());
}

#[test]
fn notify_stop_sends_completion() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, LOG_ONLY);
    cchook(&dir)
        .env("CLAUDE_NOTIFY_MODE", "on")
        .args(["notify", "--stop"])
        .write_stdin(r#"{"hook_event_name":"Stop","session_id":"abc123","cwd":"/work/my-app","stop_hook_active":false}"#)
        .assert()
        .success();
    let log = std::fs::read_to_string(claude_dir(&dir).join("logs/notifications.log")).unwrap();
    assert!(log.contains("[completion]"));
}

#[test]
fn notify_marker_file_beats_config() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "notify:\n  mode: on\n  sound:\n    enabled: false\n");
    std::fs::write(claude_dir(&dir).join("hooks/notify-mode"), "off\n").unwrap();
    cchook(&dir)
        .args(["notify", "--json"])
        .write_stdin(notification_payload("waiting"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"mode_source\": \"marker\""));
}

#[test]
fn notify_bad_payload_still_exits_zero() {
    let dir = TempDir::new().unwrap();
    cchook(&dir)
        .arg("notify")
        .write_stdin("[1, 2")
        .assert()
        .success()
        .stdout("");
}

// ---------------------------------------------------------------------------
// cchook format
// ---------------------------------------------------------------------------

#[cfg(unix)]
#[test]
fn format_runs_configured_override() {
    let dir = TempDir::new().unwrap();
    write_config(
        &dir,
        "format:\n  overrides:\n    txt: [\"sh\", \"-c\", \"echo formatted > \\\"$0\\\"\", \"{file}\"]\n",
    );
    let file = dir.path().join("notes.txt");
    std::fs::write(&file, "messy").unwrap();

    let payload = serde_json::json!({
        "tool_name": "Write",
        "tool_input": {"file_path": file, "content": "messy"},
    });
    cchook(&dir)
        .args(["format", "--json"])
        .write_stdin(payload.to_string())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"formatted\""));
    assert_eq!(std::fs::read_to_string(&file).unwrap().trim(), "formatted");
}

#[test]
fn format_ignores_other_tools() {
    let dir = TempDir::new().unwrap();
    cchook(&dir)
        .args(["format", "--json"])
        .write_stdin(r#"{"tool_name":"Read","tool_input":{"file_path":"/etc/hosts"}}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"skipped\""));
}

// ---------------------------------------------------------------------------
// cchook metrics
// ---------------------------------------------------------------------------

#[test]
fn metrics_counts_commits_and_edits() {
    let dir = TempDir::new().unwrap();
    let commit = serde_json::json!({
        "tool_name": "Bash",
        "tool_input": {"command": "git commit -m 'Add parser'"},
        "tool_response": {"stdout": "[main 1a2b3c4] Add parser\n 2 files changed", "stderr": ""},
    });
    let edit = serde_json::json!({
        "tool_name": "Edit",
        "tool_input": {"file_path": "/w/a.rs", "old_string": "a", "new_string": "a\nb"},
    });
    cchook(&dir)
        .arg("metrics")
        .write_stdin(commit.to_string())
        .assert()
        .success();
    cchook(&dir)
        .arg("metrics")
        .write_stdin(edit.to_string())
        .assert()
        .success();

    let path = claude_dir(&dir).join("monitoring/metrics-tracking.json");
    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(value["commits_total"], 1);
    assert_eq!(value["files_modified"], 1);
    assert_eq!(value["lines_added"], 1);
    assert!(value["last_updated"].as_str().unwrap().len() > 10);
}

#[test]
fn metrics_ignores_uncounted_events() {
    let dir = TempDir::new().unwrap();
    cchook(&dir)
        .arg("metrics")
        .write_stdin(r#"{"tool_name":"Glob","tool_input":{"pattern":"*.rs"}}"#)
        .assert()
        .success();
    assert!(!claude_dir(&dir)
        .join("monitoring/metrics-tracking.json")
        .exists());
}

// ---------------------------------------------------------------------------
// cchook remind / git-context
// ---------------------------------------------------------------------------

#[test]
fn remind_injects_matching_guides_once_per_session() {
    let dir = TempDir::new().unwrap();
    let guides = dir.path().join(".claude/guides");
    std::fs::create_dir_all(guides.join("always-active")).unwrap();
    std::fs::write(guides.join("always-active/foundation.md"), "Be precise.").unwrap();
    std::fs::write(guides.join("debug.md"), "Team debug checklist").unwrap();

    let payload = |prompt: &str| {
        serde_json::json!({
            "hook_event_name": "UserPromptSubmit",
            "session_id": "sess-1",
            "cwd": dir.path(),
            "prompt": prompt,
        })
        .to_string()
    };
    cchook(&dir)
        .arg("remind")
        .write_stdin(payload("the build is not working, can you debug it?"))
        .assert()
        .success()
        .stdout(predicate::str::contains("📋 Guides: **New:** FOUNDATION, DEBUG\n"))
        .stdout(predicate::str::contains("<developer-principles>\nBe precise.\n</developer-principles>"))
        .stdout(predicate::str::contains("<debugging-workflow>\nTeam debug checklist\n</debugging-workflow>"));

    assert!(claude_dir(&dir).join("hooks/state/workflow/sess-1.json").exists());

    cchook(&dir)
        .arg("remind")
        .write_stdin(payload("another bug"))
        .assert()
        .success()
        .stdout("");

    cchook(&dir)
        .arg("remind")
        .write_stdin(payload("explain how this module works"))
        .assert()
        .success()
        .stdout(predicate::str::contains("**New:** INVESTIGATION | **Already active:** DEBUG\n"))
        .stdout(predicate::str::contains("<developer-principles>").not());
}

#[test]
fn parallel_follows_plan_mode_once() {
    let dir = TempDir::new().unwrap();
    let payload = |tool: &str| {
        serde_json::json!({
            "hook_event_name": "PostToolUse",
            "session_id": "sess-2",
            "cwd": dir.path(),
            "tool_name": tool,
            "tool_input": {},
        })
        .to_string()
    };

    cchook(&dir)
        .arg("parallel")
        .write_stdin(payload("Edit"))
        .assert()
        .success()
        .stdout("");

    let output = cchook(&dir)
        .arg("parallel")
        .write_stdin(payload("ExitPlanMode"))
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["hookSpecificOutput"]["hookEventName"], "PostToolUse");
    let context = value["hookSpecificOutput"]["additionalContext"].as_str().unwrap();
    assert!(context.contains("**Parallelize the Plan**"));

    cchook(&dir)
        .arg("parallel")
        .write_stdin(payload("ExitPlanMode"))
        .assert()
        .success()
        .stdout("");
}

#[test]
fn remind_is_silent_without_triggers() {
    let dir = TempDir::new().unwrap();
    cchook(&dir)
        .arg("remind")
        .write_stdin(r#"{"prompt":"thanks, that looks right"}"#)
        .assert()
        .success()
        .stdout("");
}

#[test]
fn git_context_only_for_exact_prompt() {
    let dir = TempDir::new().unwrap();
    let payload = |prompt: &str| {
        serde_json::json!({"cwd": dir.path(), "prompt": prompt}).to_string()
    };

    cchook(&dir)
        .arg("git-context")
        .write_stdin(payload("/git push"))
        .assert()
        .success()
        .stdout("");

    // Not a repository: every section falls back to its placeholder.
    cchook(&dir)
        .arg("git-context")
        .write_stdin(payload("/git"))
        .assert()
        .success()
        .stdout(predicate::str::starts_with("/git\n"))
        .stdout(predicate::str::contains("(no staged changes)"))
        .stdout(predicate::str::contains("(no unstaged changes)"));
}

// ---------------------------------------------------------------------------
// cchook mode / config
// ---------------------------------------------------------------------------

#[test]
fn mode_persists_and_reports_source() {
    let dir = TempDir::new().unwrap();
    cchook(&dir)
        .arg("mode")
        .assert()
        .success()
        .stdout(predicate::str::contains("Notify mode: auto (from config)"));

    cchook(&dir)
        .args(["mode", "off"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Notify mode: off (from mode file)"));
    let marker = std::fs::read_to_string(claude_dir(&dir).join("hooks/notify-mode")).unwrap();
    assert_eq!(marker.trim(), "off");

    cchook(&dir)
        .env("CLAUDE_NOTIFY_MODE", "on")
        .arg("mode")
        .assert()
        .success()
        .stdout(predicate::str::contains("Notify mode: on (from CLAUDE_NOTIFY_MODE)"));
}

#[test]
fn mode_rejects_unknown_value() {
    let dir = TempDir::new().unwrap();
    cchook(&dir).args(["mode", "loud"]).assert().failure();
    assert!(!claude_dir(&dir).join("hooks/notify-mode").exists());
}

#[test]
fn config_path_and_show() {
    let dir = TempDir::new().unwrap();
    cchook(&dir)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::ends_with("hooks/config.yaml\n"));

    cchook(&dir)
        .env("CLAUDE_NOTIFY_TOPIC", "laptop")
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("topic: laptop"))
        .stdout(predicate::str::contains("dedup_seconds: 30"));
}

#[test]
fn config_validate_reports_errors() {
    let dir = TempDir::new().unwrap();
    cchook(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config is valid"));

    write_config(&dir, "notify:\n  push:\n    enabled: true\n");
    cchook(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[error] notify.push is enabled"))
        .stderr(predicate::str::contains("error: config validation found errors"));
}

#[test]
fn config_show_fails_on_broken_yaml() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "statusline: [unclosed\n");
    cchook(&dir)
        .args(["config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load hook config"));
}
