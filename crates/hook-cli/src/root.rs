use hook_core::paths::ClaudeHome;
use std::path::{Path, PathBuf};

/// Resolve the host's configuration directory.
///
/// Priority:
/// 1. `--claude-dir` flag / `CLAUDE_CONFIG_DIR` env var (passed in as `explicit`)
/// 2. `~/.claude`, with the global state file at `~/.claude.json`
/// 3. `./.claude` when no home directory can be found
pub fn resolve_home(explicit: Option<&Path>) -> ClaudeHome {
    if let Some(p) = explicit.filter(|p| !p.as_os_str().is_empty()) {
        return ClaudeHome::at(p);
    }

    match ClaudeHome::discover() {
        Ok(home) => home,
        Err(e) => {
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            tracing::warn!(error = %e, cwd = %cwd.display(), "falling back to the working directory");
            ClaudeHome::from_home(&cwd)
        }
    }
}
