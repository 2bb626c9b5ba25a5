//! Git helpers: the current branch for the status line (read straight from
//! `.git/HEAD`, no subprocess) and the `/git` prompt enrichment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::process::run_capture_in;

const GIT_TIMEOUT: Duration = Duration::from_secs(5);

/// The exact prompt that triggers enrichment.
pub const GIT_PROMPT: &str = "/git";

// ---------------------------------------------------------------------------
// Branch detection
// ---------------------------------------------------------------------------

/// Walk upward from `start` to the nearest `.git` and return the checked-out
/// branch, or the short commit hash for a detached HEAD.
pub fn current_branch(start: &Path) -> Option<String> {
    let git_dir = find_git_dir(start)?;
    let head = std::fs::read_to_string(git_dir.join("HEAD")).ok()?;
    parse_head(&head)
}

/// Locate the git directory, following the `gitdir:` indirection used by
/// worktrees and submodules.
pub fn find_git_dir(start: &Path) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(".git");
        if candidate.is_dir() {
            return Some(candidate);
        }
        if candidate.is_file() {
            let text = std::fs::read_to_string(&candidate).ok()?;
            let target = text.trim().strip_prefix("gitdir:")?.trim();
            let target = Path::new(target);
            return Some(if target.is_absolute() {
                target.to_path_buf()
            } else {
                dir.join(target)
            });
        }
        if !dir.pop() {
            return None;
        }
    }
}

pub fn parse_head(head: &str) -> Option<String> {
    let head = head.trim();
    if let Some(reference) = head.strip_prefix("ref:") {
        let reference = reference.trim();
        let name = reference.strip_prefix("refs/heads/").unwrap_or(reference);
        return (!name.is_empty()).then(|| name.to_string());
    }
    let is_hash = head.len() >= 7 && head.chars().all(|c| c.is_ascii_hexdigit());
    is_hash.then(|| head[..7].to_string())
}

// ---------------------------------------------------------------------------
// /git prompt enrichment
// ---------------------------------------------------------------------------

/// Snapshot of the repository state gathered for the `/git` prompt.
#[derive(Debug, Clone, Default)]
pub struct GitSnapshot {
    pub recent_commits: String,
    pub status: String,
    pub staged_diff: String,
    pub unstaged_diff: String,
    pub short_status: String,
}

impl GitSnapshot {
    /// Run the git queries in `dir`. A failing or slow query contributes an
    /// empty section.
    pub fn collect(dir: &Path) -> Self {
        let git = |args: &[&str]| {
            run_capture_in(dir, "git", args, GIT_TIMEOUT).unwrap_or_else(|e| {
                tracing::debug!(?args, error = %e, "git query failed");
                String::new()
            })
        };
        GitSnapshot {
            recent_commits: git(&["log", "--oneline", "-8"]),
            status: git(&["status"]),
            staged_diff: git(&["diff", "--cached"]),
            unstaged_diff: git(&["diff"]),
            short_status: git(&["status", "--short"]),
        }
    }
}

pub fn is_git_prompt(prompt: &str) -> bool {
    prompt.trim() == GIT_PROMPT
}

fn or_placeholder<'a>(text: &'a str, placeholder: &'a str) -> &'a str {
    if text.trim().is_empty() {
        placeholder
    } else {
        text.trim_end()
    }
}

/// The enriched prompt: the original command followed by commit-style
/// examples, a reminder to leave scratch files out, and the current state.
pub fn render_git_context(prompt: &str, snap: &GitSnapshot) -> String {
    format!(
        "{prompt}

## Leave out scratch files

Before committing, look for files that should not be committed: empty or
near-empty test files, temporary files created while experimenting, files
whose content is meaningless. Keep them out of the commits, then ask the user
whether to delete them once the other commits are done.

## Commit message style

Recent commits for style reference:
```
{commits}
```

## Current git state

### Status
```
{status}
```

### Staged changes (git diff --cached)
```
{staged}
```

### Unstaged changes (git diff)
```
{unstaged}
```

### Summary
```
{short}
```
",
        prompt = prompt.trim(),
        commits = or_placeholder(&snap.recent_commits, "(no commits yet)"),
        status = or_placeholder(&snap.status, "(status unavailable)"),
        staged = or_placeholder(&snap.staged_diff, "(no staged changes)"),
        unstaged = or_placeholder(&snap.unstaged_diff, "(no unstaged changes)"),
        short = or_placeholder(&snap.short_status, "(no changes)"),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
