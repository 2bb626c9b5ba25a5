//! Bounded subprocess helpers.
//!
//! Every external command a hook runs (probes, formatters, git, sound
//! players) goes through here so none of them can hang the host: output is
//! drained on a reader thread and the child is killed once the timeout
//! passes.

use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use wait_timeout::ChildExt;

use crate::error::{HookError, Result};

/// Grace period for collecting output after the child exits.
const OUTPUT_COLLECTION_TIMEOUT: Duration = Duration::from_secs(1);

/// Run `program args...` and return its stdout. A non-zero exit is an error,
/// as is exceeding `timeout`.
pub fn run_capture(program: &str, args: &[&str], timeout: Duration) -> Result<String> {
    let mut cmd = Command::new(program);
    cmd.args(args);
    let (status, stdout) = run_with_timeout(cmd, program, timeout)?;
    if !status.success() {
        return Err(HookError::ToolSpawnFailed {
            program: program.to_string(),
            reason: format!("exited with {status}"),
        });
    }
    Ok(stdout)
}

/// Like [`run_capture`] but in `dir`, and returning stdout even on a
/// non-zero exit (git prints useful text either way).
pub fn run_capture_in(
    dir: &Path,
    program: &str,
    args: &[&str],
    timeout: Duration,
) -> Result<String> {
    let mut cmd = Command::new(program);
    cmd.args(args).current_dir(dir);
    let (_, stdout) = run_with_timeout(cmd, program, timeout)?;
    Ok(stdout)
}

/// Run an argv to completion, discarding output. Returns the exit status.
pub fn run_argv(argv: &[String], dir: Option<&Path>, timeout: Duration) -> Result<ExitStatus> {
    let Some((program, args)) = argv.split_first() else {
        return Err(HookError::ToolSpawnFailed {
            program: String::new(),
            reason: "empty command".to_string(),
        });
    };
    let mut cmd = Command::new(program);
    cmd.args(args);
    if let Some(dir) = dir {
        cmd.current_dir(dir);
    }
    let (status, _) = run_with_timeout(cmd, program, timeout)?;
    Ok(status)
}

/// Start a process and leave it running after we exit. Used for audio
/// playback, which outlives the hook.
pub fn spawn_detached(program: &str, args: &[&str]) -> Result<()> {
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
        .map_err(|e| HookError::ToolSpawnFailed {
            program: program.to_string(),
            reason: e.to_string(),
        })
}

fn run_with_timeout(
    mut cmd: Command,
    program: &str,
    timeout: Duration,
) -> Result<(ExitStatus, String)> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null());

    let mut child = cmd.spawn().map_err(|e| HookError::ToolSpawnFailed {
        program: program.to_string(),
        reason: e.to_string(),
    })?;

    let (tx, rx) = mpsc::channel();
    if let Some(mut stdout) = child.stdout.take() {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = stdout.read_to_end(&mut buf);
            let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
        });
    } else {
        let _ = tx.send(String::new());
    }

    match child.wait_timeout(timeout)? {
        Some(status) => {
            let stdout = rx
                .recv_timeout(OUTPUT_COLLECTION_TIMEOUT)
                .unwrap_or_default();
            Ok((status, stdout))
        }
        None => {
            kill(&mut child);
            Err(HookError::ToolTimedOut {
                program: program.to_string(),
                seconds: timeout.as_secs(),
            })
        }
    }
}

fn kill(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}
