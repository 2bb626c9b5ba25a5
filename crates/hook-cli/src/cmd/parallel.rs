use crate::cmd::{read_stdin, working_dir};
use crate::output::print_json;
use anyhow::Context;
use hook_core::paths::ClaudeHome;
use hook_core::reminder::after_plan;
use hook_core::types::{parse_payload, ToolUseInput};

/// Replies in the host's structured PostToolUse format; prints nothing when
/// the guide is not due.
pub fn run(home: &ClaudeHome) -> anyhow::Result<()> {
    let raw = read_stdin()?;
    let input: ToolUseInput = parse_payload(&raw).context("invalid PostToolUse payload")?;
    let project = working_dir(input.cwd.as_ref());
    let ledger = input
        .session_id
        .as_deref()
        .and_then(|id| home.workflow_state_path(id));

    let Some(context) = after_plan(&input.tool_name, project.as_deref(), ledger.as_deref())
    else {
        return Ok(());
    };
    tracing::info!(tool = %input.tool_name, "injecting parallel guide");
    print_json(&serde_json::json!({
        "hookSpecificOutput": {
            "hookEventName": "PostToolUse",
            "additionalContext": context,
        }
    }))
}
