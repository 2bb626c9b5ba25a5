use crate::cmd::env_var;
use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use hook_core::config::{HookConfig, WarnLevel};
use hook_core::paths::ClaudeHome;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Print the effective configuration (file, defaults and env overrides)
    Show,

    /// Validate the config for common mistakes
    Validate,

    /// Print the config file location
    Path,
}

pub fn run(home: &ClaudeHome, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(home, json),
        ConfigSubcommand::Validate => validate(home, json),
        ConfigSubcommand::Path => path(home, json),
    }
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(home: &ClaudeHome, json: bool) -> anyhow::Result<()> {
    let mut config = HookConfig::load(home).context("failed to load hook config")?;
    config.apply_env(env_var);

    if json {
        return print_json(&config);
    }
    let yaml = serde_yaml::to_string(&config).context("failed to render config")?;
    print!("{yaml}");
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(home: &ClaudeHome, json: bool) -> anyhow::Result<()> {
    let mut config = HookConfig::load(home).context("failed to load hook config")?;
    config.apply_env(env_var);
    let warnings = config.validate();

    if json {
        let value = serde_json::json!({
            "warnings": warnings,
        });
        print_json(&value)?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    config.ensure_valid().context("config validation found errors")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// path
// ---------------------------------------------------------------------------

fn path(home: &ClaudeHome, json: bool) -> anyhow::Result<()> {
    let path = home.config_path();
    if json {
        return print_json(&serde_json::json!({
            "path": path,
            "exists": path.exists(),
        }));
    }
    println!("{}", path.display());
    Ok(())
}
