use crate::cmd::read_stdin;
use crate::output::print_json;
use anyhow::Context;
use hook_core::config::HookConfig;
use hook_core::formatter::{format_edited_file, FormatOutcome};
use hook_core::paths::ClaudeHome;
use hook_core::types::{parse_payload, ToolUseInput};

pub fn run(home: &ClaudeHome, json: bool) -> anyhow::Result<()> {
    let raw = read_stdin()?;
    let input: ToolUseInput = parse_payload(&raw).context("invalid PostToolUse payload")?;
    let config = HookConfig::load_or_default(home);

    let outcome = format_edited_file(&input, &config.format);
    match &outcome {
        FormatOutcome::Formatted { file, program } => {
            tracing::info!(file = %file.display(), %program, "formatted")
        }
        FormatOutcome::Failed {
            file,
            program,
            reason,
        } => tracing::warn!(file = %file.display(), %program, %reason, "formatter failed"),
        FormatOutcome::NoFormatter { file } => {
            tracing::debug!(file = %file.display(), "no formatter available")
        }
        FormatOutcome::Skipped { reason } => tracing::debug!(%reason, "format skipped"),
    }

    if json {
        print_json(&outcome)?;
    }
    Ok(())
}
