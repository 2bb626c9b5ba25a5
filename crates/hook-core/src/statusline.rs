//! Status line assembly: model, directory, branch and context budget on one
//! line.

use colored::{Color, Colorize};
use serde::Serialize;

use crate::budget::{
    context_window_for, host_autocompact_enabled, BudgetLevel, UsageSnapshot,
    EXTENDED_CONTEXT_WINDOW,
};
use crate::config::HookConfig;
use crate::git::current_branch;
use crate::paths::{display_name, ClaudeHome};
use crate::types::StatusInput;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusLine {
    pub model: String,
    pub dir: Option<String>,
    pub branch: Option<String>,
    pub budget: UsageSnapshot,
}

impl StatusLine {
    /// Build from the host payload. Never fails: every missing piece has a
    /// fallback.
    pub fn build(input: &StatusInput, config: &HookConfig, home: &ClaudeHome) -> Self {
        let host_autocompact = host_autocompact_enabled(&home.state_file);
        let settings = config.statusline.budget_settings(host_autocompact);

        // The display name may carry the "1M context" marker when the id
        // does not.
        let display = input.model.display_name.as_str();
        let capacity_key = if input.model.id.is_empty()
            || context_window_for(display) == EXTENDED_CONTEXT_WINDOW
        {
            display
        } else {
            input.model.id.as_str()
        };
        let mut budget = UsageSnapshot::from_transcript(
            capacity_key,
            input.transcript_path.as_deref(),
            &settings,
        );
        if !input.model.id.is_empty() {
            budget.model_id = input.model.id.clone();
        }

        let model = [&input.model.display_name, &input.model.id]
            .into_iter()
            .find(|s| !s.is_empty())
            .cloned()
            .unwrap_or_else(|| "Claude".to_string());

        let dir = input.working_dir();
        let branch = if config.statusline.show_git_branch {
            dir.and_then(|d| current_branch(d))
        } else {
            None
        };

        StatusLine {
            model,
            dir: dir.map(|d| display_name(d)),
            branch,
            budget,
        }
    }

    /// Render the line. With `color` off the output is plain text.
    pub fn render(&self, color: bool) -> String {
        let paint = |text: String, c: Color| -> String {
            if color {
                text.color(c).to_string()
            } else {
                text
            }
        };

        let mut parts = vec![paint(format!("[{}]", self.model), Color::Cyan)];
        if let Some(dir) = &self.dir {
            parts.push(paint(dir.clone(), Color::Blue));
        }
        if let Some(branch) = &self.branch {
            parts.push(paint(format!("({branch})"), Color::Magenta));
        }
        let head = parts.join(" ");
        if !color {
            return format!("{head} | {}", self.budget.summary());
        }

        let usage = format!(
            "{} tokens ({}%)",
            self.budget.tokens_display(),
            self.budget.used_percent_display()
        );
        let usage = if self.budget.estimated {
            usage.dimmed().to_string()
        } else {
            usage
        };

        let remaining_color = match self.budget.level() {
            BudgetLevel::Comfortable => Color::Green,
            BudgetLevel::Tight => Color::Yellow,
            BudgetLevel::Critical => Color::Red,
        };
        let remaining = paint(self.budget.remaining_display(), remaining_color);

        format!("{head} | {usage} | {remaining}")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::parse_payload;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        home: ClaudeHome,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let home = ClaudeHome::at(dir.path().join("claude"));
        Fixture { dir, home }
    }

    fn transcript(f: &Fixture, input_tokens: u64) -> PathBuf {
        let path = f.dir.path().join("session.jsonl");
        std::fs::write(
            &path,
            format!(
                r#"{{"type":"assistant","message":{{"usage":{{"input_tokens":{input_tokens}}}}}}}"#
            ),
        )
        .unwrap();
        path
    }

    fn input(f: &Fixture, model_id: &str, display: &str, transcript: &Path) -> StatusInput {
        let project = f.dir.path().join("my-app");
        std::fs::create_dir_all(project.join(".git")).unwrap();
        std::fs::write(project.join(".git/HEAD"), "ref: refs/heads/main\n").unwrap();
        let raw = serde_json::json!({
            "model": {"id": model_id, "display_name": display},
            "workspace": {"current_dir": project},
            "transcript_path": transcript,
        });
        parse_payload(&raw.to_string()).unwrap()
    }

    #[test]
    fn plain_render_reference_scenario() {
        let f = fixture();
        let t = transcript(&f, 100_000);
        let line = StatusLine::build(
            &input(&f, "claude-sonnet-4-5", "Sonnet 4.5", &t),
            &HookConfig::default(),
            &f.home,
        );
        assert_eq!(
            line.render(false),
            "[Sonnet 4.5] my-app (main) | 100k tokens (50.0%) | 35% to compact"
        );
    }

    #[test]
    fn host_setting_switches_label() {
        let f = fixture();
        std::fs::create_dir_all(&f.home.dir).unwrap();
        std::fs::write(&f.home.state_file, r#"{"autoCompactEnabled": false}"#).unwrap();
        let t = transcript(&f, 100_000);
        let line = StatusLine::build(
            &input(&f, "claude-sonnet-4-5", "Sonnet 4.5", &t),
            &HookConfig::default(),
            &f.home,
        );
        assert!(line.render(false).ends_with("| 50% to end"));
    }

    #[test]
    fn display_name_can_select_extended_window() {
        let f = fixture();
        let t = transcript(&f, 100_000);
        let line = StatusLine::build(
            &input(&f, "claude-sonnet-4-5", "Sonnet 4.5 (1M context)", &t),
            &HookConfig::default(),
            &f.home,
        );
        assert_eq!(line.budget.capacity, 1_000_000);
        assert_eq!(line.budget.model_id, "claude-sonnet-4-5");
    }

    #[test]
    fn missing_everything_still_renders() {
        let f = fixture();
        let line = StatusLine::build(&StatusInput::default(), &HookConfig::default(), &f.home);
        assert_eq!(
            line.render(false),
            "[Claude] | 19k tokens (9.3%) | 88% to compact"
        );
    }

    #[test]
    fn branch_can_be_hidden() {
        let f = fixture();
        let t = transcript(&f, 1_000);
        let mut config = HookConfig::default();
        config.statusline.show_git_branch = false;
        let line = StatusLine::build(&input(&f, "m", "", &t), &config, &f.home);
        assert_eq!(line.branch, None);
        assert!(line.render(false).starts_with("[m] my-app |"));
    }
}
