//! Running tool-usage counters fed by PostToolUse events and read by an
//! external dashboard.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::io::atomic_write;
use crate::types::ToolUseInput;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    #[serde(default)]
    pub commits_total: u64,
    #[serde(default)]
    pub lines_added: u64,
    #[serde(default)]
    pub lines_removed: u64,
    #[serde(default)]
    pub files_modified: u64,
    /// Kept for dashboard compatibility; nothing in this tool blocks commands.
    #[serde(default)]
    pub commands_blocked: u64,
    #[serde(default)]
    pub git_failures: u64,
    /// RFC 3339, empty until the first save.
    #[serde(default)]
    pub last_updated: String,
}

/// Non-empty lines after trimming the whole text, counting interior blank
/// lines.
pub fn count_lines(text: &str) -> u64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        0
    } else {
        trimmed.split('\n').count() as u64
    }
}

impl Metrics {
    /// Load from `path`. A missing or corrupt file starts from zero.
    pub fn load(path: &Path) -> Self {
        let data = match std::fs::read_to_string(path) {
            Ok(d) => d,
            Err(_) => return Self::default(),
        };
        serde_json::from_str(&data).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "resetting corrupt metrics file");
            Self::default()
        })
    }

    pub fn save(&mut self, path: &Path) -> Result<()> {
        self.last_updated = chrono::Local::now().to_rfc3339();
        let data = serde_json::to_string_pretty(self)?;
        atomic_write(path, data.as_bytes())
    }

    /// Fold one tool event into the counters. Returns whether anything
    /// changed.
    pub fn apply(&mut self, event: &ToolUseInput) -> bool {
        match event.tool_name.as_str() {
            "Edit" => {
                self.files_modified += 1;
                let old = count_lines(event.input_str("old_string"));
                let new = count_lines(event.input_str("new_string"));
                if new > old {
                    self.lines_added += new - old;
                } else {
                    self.lines_removed += old - new;
                }
                true
            }
            "Write" => {
                self.files_modified += 1;
                self.lines_added += count_lines(event.input_str("content"));
                true
            }
            "Bash" => self.apply_command(
                event.input_str("command"),
                event.response_str("stdout"),
                event.response_str("stderr"),
            ),
            _ => false,
        }
    }

    fn apply_command(&mut self, command: &str, stdout: &str, stderr: &str) -> bool {
        let stderr = stderr.to_lowercase();
        if command.contains("git commit") {
            if stdout.contains('[') || stdout.to_lowercase().contains("create mode") {
                self.commits_total += 1;
                return true;
            }
            if stderr.contains("error") {
                self.git_failures += 1;
                return true;
            }
            return false;
        }
        if command.starts_with("git ") && (stderr.contains("error") || stderr.contains("fatal")) {
            self.git_failures += 1;
            return true;
        }
        false
    }
}

/// Load, apply and save when something changed. Returns the updated
/// counters, or `None` when the event was not counted.
pub fn record(path: &Path, event: &ToolUseInput) -> Result<Option<Metrics>> {
    let mut metrics = Metrics::load(path);
    if !metrics.apply(event) {
        return Ok(None);
    }
    metrics.save(path)?;
    Ok(Some(metrics))
}
