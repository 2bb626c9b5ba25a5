use crate::error::{HookError, Result};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const CLAUDE_DIR: &str = ".claude";
pub const GLOBAL_STATE_FILE: &str = ".claude.json";

pub const HOOKS_DIR: &str = "hooks";
pub const CONFIG_FILE: &str = "hooks/config.yaml";
pub const NOTIFY_MODE_FILE: &str = "hooks/notify-mode";
pub const LAST_NOTIFICATION_FILE: &str = "hooks/state/last-notification.json";
pub const NOTIFICATION_LOG: &str = "logs/notifications.log";
pub const METRICS_FILE: &str = "monitoring/metrics-tracking.json";
pub const WORKFLOW_STATE_DIR: &str = "hooks/state/workflow";

/// Per-project guide directory, relative to the project root.
pub const GUIDES_DIR: &str = ".claude/guides";

// ---------------------------------------------------------------------------
// ClaudeHome
// ---------------------------------------------------------------------------

/// Where the host keeps its per-user state.
///
/// `dir` is the configuration directory (`~/.claude` by default) and
/// `state_file` the host's global settings JSON, which lives next to the
/// directory by default but inside it when the directory was relocated with
/// `CLAUDE_CONFIG_DIR`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaudeHome {
    pub dir: PathBuf,
    pub state_file: PathBuf,
}

impl ClaudeHome {
    /// Use an explicitly configured directory.
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let state_file = dir.join(GLOBAL_STATE_FILE);
        ClaudeHome { dir, state_file }
    }

    /// Derive the default layout from the user's home directory.
    pub fn from_home(home: &Path) -> Self {
        ClaudeHome {
            dir: home.join(CLAUDE_DIR),
            state_file: home.join(GLOBAL_STATE_FILE),
        }
    }

    /// Resolve from `$HOME`.
    pub fn discover() -> Result<Self> {
        let home = home::home_dir().ok_or(HookError::HomeNotFound)?;
        Ok(Self::from_home(&home))
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    pub fn notify_mode_path(&self) -> PathBuf {
        self.dir.join(NOTIFY_MODE_FILE)
    }

    pub fn last_notification_path(&self) -> PathBuf {
        self.dir.join(LAST_NOTIFICATION_FILE)
    }

    pub fn notification_log_path(&self) -> PathBuf {
        self.dir.join(NOTIFICATION_LOG)
    }

    pub fn metrics_path(&self) -> PathBuf {
        self.dir.join(METRICS_FILE)
    }

    /// Ledger of the workflow guides already injected in `session_id`.
    /// `None` when the id is empty or has no filename-safe characters.
    pub fn workflow_state_path(&self, session_id: &str) -> Option<PathBuf> {
        let safe: String = session_id
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .collect();
        if safe.is_empty() {
            return None;
        }
        Some(self.dir.join(WORKFLOW_STATE_DIR).join(format!("{safe}.json")))
    }
}

pub fn guide_path(project: &Path, name: &str) -> PathBuf {
    project.join(GUIDES_DIR).join(format!("{name}.md"))
}

/// Last path component, used as a short project label. Falls back to the
/// whole path for roots like `/`.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
