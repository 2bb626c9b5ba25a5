//! Alert dispatch: resolve the mode, run the presence gate, drop repeats,
//! then hand the alert to every enabled sink.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::{HookConfig, NotifyConfig, ENV_NOTIFY_MODE};
use crate::error::{HookError, Result};
use crate::io::{append_text, atomic_write, locked_read, locked_write};
use crate::paths::{display_name, ClaudeHome};
use crate::presence::{evaluate, Decision, NotifyMode, PresenceProbe, SuppressReason};
use crate::process::spawn_detached;
use crate::types::NotificationInput;

const PUSH_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Alert
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// The assistant is waiting on the user (permission prompt, idle input).
    Attention,
    /// The assistant finished its turn.
    Completion,
}

impl AlertKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertKind::Attention => "attention",
            AlertKind::Completion => "completion",
        }
    }

    /// ntfy tag shortcode shown as an emoji on the phone.
    fn push_tag(self) -> &'static str {
        match self {
            AlertKind::Attention => "bell",
            AlertKind::Completion => "white_check_mark",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub title: String,
    pub message: String,
    pub project: Option<String>,
    pub session_id: Option<String>,
}

impl Alert {
    pub fn attention(input: &NotificationInput) -> Self {
        let message = input
            .message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or("Claude is waiting for your input")
            .trim()
            .to_string();
        Self::build(AlertKind::Attention, input, message)
    }

    pub fn completion(input: &NotificationInput) -> Self {
        Self::build(AlertKind::Completion, input, "Claude finished responding".to_string())
    }

    fn build(kind: AlertKind, input: &NotificationInput, message: String) -> Self {
        let project = input.cwd.as_deref().map(display_name);
        let title = match (&input.title, &project) {
            (Some(t), Some(p)) if !t.trim().is_empty() => format!("{} · {p}", t.trim()),
            (Some(t), None) if !t.trim().is_empty() => t.trim().to_string(),
            (_, Some(p)) => format!("Claude · {p}"),
            (_, None) => "Claude".to_string(),
        };
        Alert {
            kind,
            title,
            message,
            project,
            session_id: input.session_id.clone(),
        }
    }

    /// Identity used for duplicate suppression.
    pub fn key(&self) -> String {
        format!(
            "{}|{}|{}",
            self.kind.as_str(),
            self.session_id.as_deref().unwrap_or(""),
            self.message
        )
    }
}

// ---------------------------------------------------------------------------
// Mode resolution
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeSource {
    Env,
    Marker,
    Config,
}

impl ModeSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ModeSource::Env => ENV_NOTIFY_MODE,
            ModeSource::Marker => "mode file",
            ModeSource::Config => "config",
        }
    }
}

/// Effective mode: `CLAUDE_NOTIFY_MODE`, then the marker file, then the
/// config. An unparsable environment value or marker is skipped with a
/// warning rather than silencing alerts.
pub fn resolve_mode<F>(home: &ClaudeHome, config: &HookConfig, lookup: F) -> (NotifyMode, ModeSource)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup(ENV_NOTIFY_MODE).filter(|v| !v.trim().is_empty()) {
        match raw.parse::<NotifyMode>() {
            Ok(mode) => return (mode, ModeSource::Env),
            Err(e) => tracing::warn!(error = %e, "ignoring invalid CLAUDE_NOTIFY_MODE"),
        }
    }
    match read_mode_marker(home) {
        Ok(Some(mode)) => return (mode, ModeSource::Marker),
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "ignoring notify mode file"),
    }
    (config.notify.mode, ModeSource::Config)
}

pub fn read_mode_marker(home: &ClaudeHome) -> Result<Option<NotifyMode>> {
    let path = home.notify_mode_path();
    match std::fs::read_to_string(&path) {
        Ok(text) if text.trim().is_empty() => Ok(None),
        Ok(text) => text.parse().map(Some),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn write_mode_marker(home: &ClaudeHome, mode: NotifyMode) -> Result<()> {
    atomic_write(&home.notify_mode_path(), format!("{mode}\n").as_bytes())
}

// ---------------------------------------------------------------------------
// Dedup
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupMarker {
    pub key: String,
    /// Unix seconds.
    pub at: i64,
}

impl DedupMarker {
    pub fn suppresses(&self, key: &str, now: i64, window_secs: u64) -> bool {
        let age = now.saturating_sub(self.at);
        self.key == key && age >= 0 && (age as u64) < window_secs
    }
}

/// Check `key` against the marker at `path` and record it. Returns `true`
/// when the key was already seen inside the window, in which case the
/// marker is left untouched so the window is not extended.
pub fn seen_recently(path: &Path, key: &str, now: i64, window_secs: u64) -> Result<bool> {
    if window_secs == 0 {
        return Ok(false);
    }
    let previous = locked_read(path)?.and_then(|text| {
        serde_json::from_str::<DedupMarker>(&text)
            .map_err(|e| tracing::debug!(error = %e, "discarding corrupt dedup marker"))
            .ok()
    });
    if previous.is_some_and(|m| m.suppresses(key, now, window_secs)) {
        return Ok(true);
    }
    let marker = DedupMarker {
        key: key.to_string(),
        at: now,
    };
    locked_write(path, &serde_json::to_string(&marker)?)?;
    Ok(false)
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// One delivery channel for an alert.
pub trait Sink {
    fn name(&self) -> &'static str;
    fn deliver(&self, alert: &Alert) -> Result<()>;
}

pub struct SoundSink {
    pub file: Option<String>,
}

impl SoundSink {
    fn default_file(kind: AlertKind) -> &'static str {
        match (cfg!(target_os = "macos"), kind) {
            (true, AlertKind::Attention) => "/System/Library/Sounds/Glass.aiff",
            (true, AlertKind::Completion) => "/System/Library/Sounds/Hero.aiff",
            (false, AlertKind::Attention) => "/usr/share/sounds/freedesktop/stereo/message.oga",
            (false, AlertKind::Completion) => "/usr/share/sounds/freedesktop/stereo/complete.oga",
        }
    }

    fn player() -> Option<&'static str> {
        let candidates: &[&'static str] = if cfg!(target_os = "macos") {
            &["afplay"]
        } else {
            &["paplay", "aplay"]
        };
        candidates.iter().copied().find(|p| which::which(p).is_ok())
    }
}

impl Sink for SoundSink {
    fn name(&self) -> &'static str {
        "sound"
    }

    fn deliver(&self, alert: &Alert) -> Result<()> {
        let player = Self::player().ok_or_else(|| HookError::ToolSpawnFailed {
            program: "sound player".to_string(),
            reason: "no audio player installed".to_string(),
        })?;
        let file = self
            .file
            .as_deref()
            .unwrap_or_else(|| Self::default_file(alert.kind));
        spawn_detached(player, &[file])
    }
}

/// Posts to an ntfy-compatible relay: `POST <url>/<topic>` with the message
/// as the body.
pub struct PushSink {
    pub url: String,
    pub topic: String,
    pub priority: String,
    pub timeout: Duration,
}

/// HTTP header values must be ASCII.
fn header_safe(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '-' })
        .collect()
}

impl Sink for PushSink {
    fn name(&self) -> &'static str {
        "push"
    }

    fn deliver(&self, alert: &Alert) -> Result<()> {
        let endpoint = format!("{}/{}", self.url.trim_end_matches('/'), self.topic);
        let agent = ureq::AgentBuilder::new().timeout(self.timeout).build();
        agent
            .post(&endpoint)
            .set("Title", &header_safe(&alert.title))
            .set("Priority", &self.priority)
            .set("Tags", alert.kind.push_tag())
            .send_string(&alert.message)
            .map_err(|e| HookError::Http(e.to_string()))?;
        Ok(())
    }
}

pub struct LogSink {
    pub path: PathBuf,
}

impl Sink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    fn deliver(&self, alert: &Alert) -> Result<()> {
        let line = format!(
            "{} [{}] {}: {}\n",
            chrono::Local::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, false),
            alert.kind.as_str(),
            alert.title,
            alert.message
        );
        append_text(&self.path, &line)
    }
}

/// Enabled sinks for a config. Push needs a topic to be usable.
pub fn sinks_for(config: &NotifyConfig, home: &ClaudeHome) -> Vec<Box<dyn Sink>> {
    let mut sinks: Vec<Box<dyn Sink>> = Vec::new();
    if config.sound.enabled {
        sinks.push(Box::new(SoundSink {
            file: config.sound.file.clone(),
        }));
    }
    if config.push.enabled {
        match config.push.topic.as_deref().filter(|t| !t.trim().is_empty()) {
            Some(topic) => sinks.push(Box::new(PushSink {
                url: config.push.url.clone(),
                topic: topic.trim().to_string(),
                priority: config.push.priority.clone(),
                timeout: PUSH_TIMEOUT,
            })),
            None => tracing::debug!("push enabled without a topic; skipping"),
        }
    }
    if config.log.enabled {
        sinks.push(Box::new(LogSink {
            path: home.notification_log_path(),
        }));
    }
    sinks
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub mode: NotifyMode,
    pub decision: Decision,
    /// Sinks that accepted the alert.
    pub delivered: Vec<&'static str>,
}

/// Run the whole pipeline for one alert. Nothing here fails: sink errors
/// and an unusable dedup marker are logged at debug level.
pub fn dispatch(
    alert: &Alert,
    mode: NotifyMode,
    probe: &dyn PresenceProbe,
    config: &NotifyConfig,
    sinks: &[Box<dyn Sink>],
    dedup_path: &Path,
    now: i64,
) -> Outcome {
    let mut decision = evaluate(mode, probe);
    if decision.fires() {
        match seen_recently(dedup_path, &alert.key(), now, config.dedup_seconds) {
            Ok(true) => decision = Decision::Suppress(SuppressReason::Duplicate),
            Ok(false) => {}
            Err(e) => tracing::debug!(error = %e, "dedup marker unavailable"),
        }
    }

    let mut delivered = Vec::new();
    match decision {
        Decision::Fire => {
            for sink in sinks {
                match sink.deliver(alert) {
                    Ok(()) => delivered.push(sink.name()),
                    Err(e) => tracing::debug!(sink = sink.name(), error = %e, "sink failed"),
                }
            }
        }
        Decision::Suppress(reason) => {
            tracing::debug!(reason = reason.as_str(), kind = alert.kind.as_str(), "alert suppressed");
        }
    }

    Outcome {
        mode,
        decision,
        delivered,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
