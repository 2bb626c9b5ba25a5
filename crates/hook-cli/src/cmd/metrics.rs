use crate::cmd::read_stdin;
use crate::output::print_json;
use anyhow::Context;
use hook_core::metrics::record;
use hook_core::paths::ClaudeHome;
use hook_core::types::{parse_payload, ToolUseInput};

pub fn run(home: &ClaudeHome, json: bool) -> anyhow::Result<()> {
    let raw = read_stdin()?;
    let input: ToolUseInput = parse_payload(&raw).context("invalid PostToolUse payload")?;
    let path = home.metrics_path();
    let updated = record(&path, &input)
        .with_context(|| format!("failed to update {}", path.display()))?;

    if json {
        print_json(&serde_json::json!({
            "updated": updated.is_some(),
            "metrics": updated,
        }))?;
    }
    Ok(())
}
