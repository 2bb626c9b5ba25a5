pub mod config;
pub mod format;
pub mod git_context;
pub mod metrics;
pub mod mode;
pub mod notify;
pub mod parallel;
pub mod remind;
pub mod statusline;

use anyhow::Context;
use std::io::Read;
use std::path::PathBuf;

/// The host writes one JSON object to stdin and closes it.
pub fn read_stdin() -> anyhow::Result<String> {
    let mut raw = String::new();
    std::io::stdin()
        .read_to_string(&mut raw)
        .context("failed to read hook payload from stdin")?;
    Ok(raw)
}

pub fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// The payload's `cwd`, else the process working directory.
pub fn working_dir(cwd: Option<&PathBuf>) -> Option<PathBuf> {
    cwd.cloned().or_else(|| std::env::current_dir().ok())
}
