use crate::cmd::{read_stdin, working_dir};
use crate::output::print_json;
use anyhow::Context;
use hook_core::paths::ClaudeHome;
use hook_core::reminder::{remind, triggered};
use hook_core::types::{parse_payload, PromptInput};

pub fn run(home: &ClaudeHome, json: bool) -> anyhow::Result<()> {
    let raw = read_stdin()?;
    let input: PromptInput = parse_payload(&raw).context("invalid UserPromptSubmit payload")?;
    let project = working_dir(input.cwd.as_ref());
    let ledger = input
        .session_id
        .as_deref()
        .and_then(|id| home.workflow_state_path(id));
    if ledger.is_none() {
        tracing::debug!("no session id; guides are not deduplicated");
    }

    let injection = remind(&input.prompt, project.as_deref(), ledger.as_deref());

    if json {
        let names: Vec<_> = triggered(&input.prompt).iter().map(|g| g.name()).collect();
        return print_json(&serde_json::json!({
            "triggered": names,
            "new": injection.new,
            "already_active": injection.already_active,
        }));
    }
    if let Some(text) = injection.render() {
        println!("{text}");
    }
    Ok(())
}
