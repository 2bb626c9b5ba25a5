use crate::cmd::env_var;
use crate::output::print_json;
use anyhow::Context;
use hook_core::config::{HookConfig, ENV_NOTIFY_MODE};
use hook_core::notify::{resolve_mode, write_mode_marker, ModeSource};
use hook_core::paths::ClaudeHome;
use hook_core::presence::{decide, observe, Decision, NotifyMode, Session, SystemProbe};

pub fn run(home: &ClaudeHome, mode: Option<NotifyMode>, json: bool) -> anyhow::Result<()> {
    if let Some(mode) = mode {
        write_mode_marker(home, mode).with_context(|| {
            format!("failed to write {}", home.notify_mode_path().display())
        })?;
    }

    let config = HookConfig::load(home).context("failed to load hook config")?;
    let (effective, source) = resolve_mode(home, &config, env_var);
    let session = observe(&SystemProbe::default());
    let decision = decide(effective, session);

    if json {
        return print_json(&serde_json::json!({
            "mode": effective,
            "source": source,
            "session": session,
            "decision": decision,
        }));
    }

    if let Some(requested) = mode {
        if source == ModeSource::Env && requested != effective {
            println!("note: {ENV_NOTIFY_MODE}={effective} overrides the saved mode '{requested}'");
        }
    }
    println!("Notify mode: {effective} (from {})", source.as_str());
    println!("Session:     {}", session_display(session));
    match decision {
        Decision::Fire => println!("An alert now:  would fire"),
        Decision::Suppress(reason) => {
            println!("An alert now:  would be suppressed ({})", reason.as_str())
        }
    }
    Ok(())
}

fn session_display(session: Session) -> String {
    match session {
        Session::Local {
            screen_locked,
            remote_session_active,
        } => {
            let lock = if screen_locked { "locked" } else { "unlocked" };
            let remote = if remote_session_active {
                ", remote login active"
            } else {
                ""
            };
            format!("local, screen {lock}{remote}")
        }
        Session::Remote {
            multiplexer_attached,
        } => {
            let attached = if multiplexer_attached {
                "attached"
            } else {
                "detached"
            };
            format!("remote, tmux {attached}")
        }
    }
}
