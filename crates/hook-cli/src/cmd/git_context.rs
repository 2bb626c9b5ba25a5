use crate::cmd::{read_stdin, working_dir};
use crate::output::print_json;
use anyhow::Context;
use hook_core::git::{is_git_prompt, render_git_context, GitSnapshot};
use hook_core::types::{parse_payload, PromptInput};

pub fn run(json: bool) -> anyhow::Result<()> {
    let raw = read_stdin()?;
    let input: PromptInput = parse_payload(&raw).context("invalid UserPromptSubmit payload")?;
    if !is_git_prompt(&input.prompt) {
        return Ok(());
    }
    let dir = working_dir(input.cwd.as_ref()).context("no working directory")?;
    let text = render_git_context(&input.prompt, &GitSnapshot::collect(&dir));

    if json {
        return print_json(&serde_json::json!({ "prompt": text }));
    }
    print!("{text}");
    Ok(())
}
