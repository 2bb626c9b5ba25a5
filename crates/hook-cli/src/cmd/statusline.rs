use crate::cmd::read_stdin;
use crate::output::print_json;
use hook_core::config::HookConfig;
use hook_core::paths::ClaudeHome;
use hook_core::statusline::StatusLine;
use hook_core::types::{parse_payload, StatusInput};

/// Always prints a line: a missing or malformed payload renders from
/// defaults.
pub fn run(home: &ClaudeHome, json: bool, color: bool) -> anyhow::Result<()> {
    let raw = read_stdin().unwrap_or_else(|e| {
        tracing::warn!("{e:#}");
        String::new()
    });
    let input: StatusInput = parse_payload(&raw).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "malformed status payload; using defaults");
        StatusInput::default()
    });

    let config = HookConfig::load_or_default(home);
    let line = StatusLine::build(&input, &config, home);

    if json {
        return print_json(&line);
    }
    println!("{}", line.render(color));
    Ok(())
}
