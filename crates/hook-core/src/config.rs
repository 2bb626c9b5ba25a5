use crate::budget::{
    BudgetSettings, DEFAULT_AUTOCOMPACT_RESERVE, DEFAULT_BASE_OVERHEAD, DEFAULT_CONTEXT_WINDOW,
};
use crate::error::{HookError, Result};
use crate::paths::ClaudeHome;
use crate::presence::NotifyMode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const ENV_NOTIFY_MODE: &str = "CLAUDE_NOTIFY_MODE";
pub const ENV_NOTIFY_TOPIC: &str = "CLAUDE_NOTIFY_TOPIC";
pub const ENV_NOTIFY_URL: &str = "CLAUDE_NOTIFY_URL";

/// Placeholder replaced by the edited file's path in formatter overrides.
pub const FILE_PLACEHOLDER: &str = "{file}";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// StatuslineConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatuslineConfig {
    #[serde(default = "default_reserve")]
    pub reserve_tokens: u64,
    #[serde(default = "default_base_overhead")]
    pub base_overhead_tokens: u64,
    /// Overrides the host's `autoCompactEnabled` setting when set.
    #[serde(default)]
    pub autocompact: Option<bool>,
    #[serde(default = "default_true")]
    pub show_git_branch: bool,
}

fn default_reserve() -> u64 {
    DEFAULT_AUTOCOMPACT_RESERVE
}

fn default_base_overhead() -> u64 {
    DEFAULT_BASE_OVERHEAD
}

fn default_true() -> bool {
    true
}

impl Default for StatuslineConfig {
    fn default() -> Self {
        Self {
            reserve_tokens: default_reserve(),
            base_overhead_tokens: default_base_overhead(),
            autocompact: None,
            show_git_branch: true,
        }
    }
}

impl StatuslineConfig {
    /// Budget settings, with `host_autocompact` used unless overridden here.
    pub fn budget_settings(&self, host_autocompact: bool) -> BudgetSettings {
        BudgetSettings {
            reserve_tokens: self.reserve_tokens,
            base_overhead_tokens: self.base_overhead_tokens,
            autocompact: self.autocompact.unwrap_or(host_autocompact),
        }
    }
}

// ---------------------------------------------------------------------------
// NotifyConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoundConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Audio file to play; the platform default when unset.
    #[serde(default)]
    pub file: Option<String>,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_push_url")]
    pub url: String,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default = "default_priority")]
    pub priority: String,
}

fn default_push_url() -> String {
    "https://ntfy.sh".to_string()
}

fn default_priority() -> String {
    "default".to_string()
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: default_push_url(),
            topic: None,
            priority: default_priority(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default)]
    pub mode: NotifyMode,
    #[serde(default = "default_dedup_seconds")]
    pub dedup_seconds: u64,
    #[serde(default)]
    pub sound: SoundConfig,
    #[serde(default)]
    pub push: PushConfig,
    #[serde(default)]
    pub log: LogConfig,
}

fn default_dedup_seconds() -> u64 {
    30
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            mode: NotifyMode::default(),
            dedup_seconds: default_dedup_seconds(),
            sound: SoundConfig::default(),
            push: PushConfig::default(),
            log: LogConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// FormatConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_format_timeout")]
    pub timeout_seconds: u64,
    /// Extension (without dot) → argv. `{file}` is replaced by the path.
    #[serde(default)]
    pub overrides: BTreeMap<String, Vec<String>>,
}

fn default_format_timeout() -> u64 {
    20
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_seconds: default_format_timeout(),
            overrides: BTreeMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// HookConfig (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HookConfig {
    #[serde(default)]
    pub statusline: StatuslineConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub format: FormatConfig,
}

impl HookConfig {
    /// Load `<claude_dir>/hooks/config.yaml`. A missing file is the default
    /// configuration.
    pub fn load(home: &ClaudeHome) -> Result<Self> {
        let path = home.config_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        Self::from_yaml(&data)
    }

    /// Like [`HookConfig::load`] but never fails: hooks must keep running
    /// with a broken config file.
    pub fn load_or_default(home: &ClaudeHome) -> Self {
        Self::load(home).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "ignoring unreadable hook config");
            Self::default()
        })
    }

    pub fn from_yaml(data: &str) -> Result<Self> {
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(data)?)
    }

    /// Apply the push relay overrides (`CLAUDE_NOTIFY_TOPIC`,
    /// `CLAUDE_NOTIFY_URL`). The mode is resolved separately because the
    /// marker file sits between the environment and this file.
    /// `lookup` abstracts the environment so tests can supply their own.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(topic) = lookup(ENV_NOTIFY_TOPIC).filter(|v| !v.trim().is_empty()) {
            self.notify.push.topic = Some(topic.trim().to_string());
            self.notify.push.enabled = true;
        }
        if let Some(url) = lookup(ENV_NOTIFY_URL).filter(|v| !v.trim().is_empty()) {
            self.notify.push.url = url.trim().trim_end_matches('/').to_string();
        }
    }

    /// Semantic checks that serde cannot express.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.statusline.reserve_tokens >= DEFAULT_CONTEXT_WINDOW {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "statusline.reserve_tokens ({}) must be smaller than the {} token context window",
                    self.statusline.reserve_tokens, DEFAULT_CONTEXT_WINDOW
                ),
            });
        }

        if self.statusline.base_overhead_tokens == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "statusline.base_overhead_tokens is 0; fresh sessions will show no usage"
                    .to_string(),
            });
        }

        let push = &self.notify.push;
        if push.enabled && push.topic.as_deref().map_or(true, |t| t.trim().is_empty()) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "notify.push is enabled but notify.push.topic is not set".to_string(),
            });
        }
        if !(push.url.starts_with("https://") || push.url.starts_with("http://")) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!("notify.push.url '{}' is not an http(s) URL", push.url),
            });
        } else if push.url.starts_with("http://") {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!("notify.push.url '{}' is not encrypted", push.url),
            });
        }

        for (ext, argv) in &self.format.overrides {
            if argv.is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("format.overrides.{ext} has an empty command"),
                });
            } else if !argv.iter().any(|a| a.contains(FILE_PLACEHOLDER)) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "format.overrides.{ext} never mentions {FILE_PLACEHOLDER}; the path will be appended"
                    ),
                });
            }
        }

        if self.format.timeout_seconds == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "format.timeout_seconds must be at least 1".to_string(),
            });
        }

        warnings
    }

    /// Fail on the first `Error`-level warning.
    pub fn ensure_valid(&self) -> Result<()> {
        match self
            .validate()
            .into_iter()
            .find(|w| w.level == WarnLevel::Error)
        {
            Some(w) => Err(HookError::InvalidConfig(w.message)),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
