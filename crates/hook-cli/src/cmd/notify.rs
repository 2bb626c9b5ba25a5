use crate::cmd::{env_var, read_stdin};
use crate::output::print_json;
use anyhow::Context;
use hook_core::config::HookConfig;
use hook_core::notify::{dispatch, resolve_mode, sinks_for, Alert};
use hook_core::paths::ClaudeHome;
use hook_core::presence::SystemProbe;
use hook_core::types::{parse_payload, NotificationInput};

pub fn run(home: &ClaudeHome, stop: bool, json: bool) -> anyhow::Result<()> {
    let raw = read_stdin()?;
    let input: NotificationInput =
        parse_payload(&raw).context("invalid notification payload")?;

    let mut config = HookConfig::load_or_default(home);
    config.apply_env(env_var);
    let (mode, source) = resolve_mode(home, &config, env_var);

    let alert = if stop {
        Alert::completion(&input)
    } else {
        Alert::attention(&input)
    };
    let sinks = sinks_for(&config.notify, home);
    let outcome = dispatch(
        &alert,
        mode,
        &SystemProbe::default(),
        &config.notify,
        &sinks,
        &home.last_notification_path(),
        chrono::Utc::now().timestamp(),
    );
    tracing::info!(
        mode = mode.as_str(),
        source = source.as_str(),
        decision = ?outcome.decision,
        delivered = ?outcome.delivered,
        "notification handled"
    );

    if json {
        print_json(&serde_json::json!({
            "alert": alert,
            "mode_source": source,
            "outcome": outcome,
        }))?;
    }
    Ok(())
}
