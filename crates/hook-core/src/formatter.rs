//! Post-edit formatting: pick an installed formatter for the edited file's
//! extension and run it in place.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::{FormatConfig, FILE_PLACEHOLDER};
use crate::process::run_argv;
use crate::types::ToolUseInput;

/// Tools whose `file_path` input names a file that was just written.
pub const EDITING_TOOLS: &[&str] = &["Edit", "Write", "MultiEdit"];

const PRETTIER: &[&[&str]] = &[&["prettier", "--write", FILE_PLACEHOLDER]];

/// Built-in candidates per extension, most preferred first.
fn builtin_candidates(ext: &str) -> &'static [&'static [&'static str]] {
    match ext {
        "rs" => &[&["rustfmt", "--quiet", FILE_PLACEHOLDER]],
        "py" => &[
            &["ruff", "format", "--quiet", FILE_PLACEHOLDER],
            &["black", "--quiet", FILE_PLACEHOLDER],
        ],
        "js" | "jsx" | "ts" | "tsx" | "json" | "css" | "scss" | "html" | "md" | "yaml"
        | "yml" => PRETTIER,
        "go" => &[&["gofmt", "-w", FILE_PLACEHOLDER]],
        "swift" => &[
            &["swift-format", "-i", FILE_PLACEHOLDER],
            &["swiftformat", "--quiet", FILE_PLACEHOLDER],
        ],
        "sh" | "bash" => &[&["shfmt", "-w", FILE_PLACEHOLDER]],
        "toml" => &[&["taplo", "fmt", FILE_PLACEHOLDER]],
        _ => &[],
    }
}

/// Substitute `{file}` into `template`. A template without the placeholder
/// gets the path appended.
pub fn expand_argv(template: &[impl AsRef<str>], file: &Path) -> Vec<String> {
    let file = file.to_string_lossy();
    let mut substituted = false;
    let mut argv: Vec<String> = template
        .iter()
        .map(|arg| {
            let arg = arg.as_ref();
            if arg.contains(FILE_PLACEHOLDER) {
                substituted = true;
                arg.replace(FILE_PLACEHOLDER, &file)
            } else {
                arg.to_string()
            }
        })
        .collect();
    if !substituted {
        argv.push(file.into_owned());
    }
    argv
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
}

/// Choose the command for `file`, or `None` when nothing suitable is
/// installed. `installed` abstracts the `PATH` lookup.
pub fn select_command<F>(config: &FormatConfig, file: &Path, installed: F) -> Option<Vec<String>>
where
    F: Fn(&str) -> bool,
{
    let ext = extension(file)?;
    if let Some(template) = config.overrides.get(&ext) {
        return match template.first() {
            Some(program) if installed(program.as_str()) => {
                Some(expand_argv(template.as_slice(), file))
            }
            Some(program) => {
                tracing::debug!(%program, "configured formatter not installed");
                None
            }
            None => None,
        };
    }
    builtin_candidates(&ext)
        .iter()
        .find(|argv| installed(argv[0]))
        .map(|argv| expand_argv(*argv, file))
}

pub fn on_path(program: &str) -> bool {
    which::which(program).is_ok()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum FormatOutcome {
    Formatted { file: PathBuf, program: String },
    Failed { file: PathBuf, program: String, reason: String },
    NoFormatter { file: PathBuf },
    Skipped { reason: String },
}

/// Handle one PostToolUse event.
pub fn format_edited_file(input: &ToolUseInput, config: &FormatConfig) -> FormatOutcome {
    format_with(input, config, on_path)
}

pub fn format_with<F>(input: &ToolUseInput, config: &FormatConfig, installed: F) -> FormatOutcome
where
    F: Fn(&str) -> bool,
{
    let skipped = |reason: &str| FormatOutcome::Skipped {
        reason: reason.to_string(),
    };
    if !config.enabled {
        return skipped("formatting disabled");
    }
    if !EDITING_TOOLS.contains(&input.tool_name.as_str()) {
        return skipped("not an editing tool");
    }
    let raw = input.input_str("file_path");
    if raw.is_empty() {
        return skipped("no file_path");
    }
    let mut file = PathBuf::from(raw);
    if file.is_relative() {
        if let Some(cwd) = &input.cwd {
            file = cwd.join(file);
        }
    }
    if !file.is_file() {
        return skipped("file does not exist");
    }

    let Some(argv) = select_command(config, &file, installed) else {
        return FormatOutcome::NoFormatter { file };
    };
    let program = argv[0].clone();
    let dir = file.parent();
    let timeout = Duration::from_secs(config.timeout_seconds.max(1));
    match run(&argv, dir, timeout) {
        Ok(()) => FormatOutcome::Formatted { file, program },
        Err(reason) => FormatOutcome::Failed {
            file,
            program,
            reason,
        },
    }
}

fn run(argv: &[String], dir: Option<&Path>, timeout: Duration) -> std::result::Result<(), String> {
    let status = run_argv(argv, dir, timeout).map_err(|e| e.to_string())?;
    if status.success() {
        Ok(())
    } else {
        Err(format!("exited with {status}"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
