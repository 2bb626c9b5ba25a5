//! Presence gate: should an attention signal fire, or is the user at the
//! keyboard already?
//!
//! The decision itself ([`decide`]) is a pure function over a
//! [`NotifyMode`] and an observed [`Session`]. Observation goes through the
//! [`PresenceProbe`] trait so the platform heuristics (screen lock, `who`,
//! tmux) stay out of the truth table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::HookError;
use crate::process::run_capture;

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

// ---------------------------------------------------------------------------
// NotifyMode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyMode {
    /// Always fire.
    On,
    /// Never fire.
    Off,
    /// Fire only when the user appears to be away.
    #[default]
    Auto,
}

impl NotifyMode {
    pub fn as_str(self) -> &'static str {
        match self {
            NotifyMode::On => "on",
            NotifyMode::Off => "off",
            NotifyMode::Auto => "auto",
        }
    }
}

impl fmt::Display for NotifyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotifyMode {
    type Err = HookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "on" => Ok(NotifyMode::On),
            "off" => Ok(NotifyMode::Off),
            "auto" => Ok(NotifyMode::Auto),
            other => Err(HookError::InvalidMode(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Session / Decision
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "context", rename_all = "snake_case")]
pub enum Session {
    Local {
        screen_locked: bool,
        /// Someone is logged in from another machine.
        remote_session_active: bool,
    },
    Remote {
        /// The enclosing tmux session has a client attached.
        multiplexer_attached: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressReason {
    ModeOff,
    ScreenUnlocked,
    RemoteSessionActive,
    MultiplexerAttached,
    Duplicate,
}

impl SuppressReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SuppressReason::ModeOff => "mode off",
            SuppressReason::ScreenUnlocked => "screen unlocked",
            SuppressReason::RemoteSessionActive => "remote session active",
            SuppressReason::MultiplexerAttached => "tmux client attached",
            SuppressReason::Duplicate => "duplicate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "reason", rename_all = "snake_case")]
pub enum Decision {
    Fire,
    Suppress(SuppressReason),
}

impl Decision {
    pub fn fires(self) -> bool {
        matches!(self, Decision::Fire)
    }
}

/// The presence truth table.
pub fn decide(mode: NotifyMode, session: Session) -> Decision {
    match mode {
        NotifyMode::On => Decision::Fire,
        NotifyMode::Off => Decision::Suppress(SuppressReason::ModeOff),
        NotifyMode::Auto => match session {
            Session::Local {
                screen_locked: false,
                ..
            } => Decision::Suppress(SuppressReason::ScreenUnlocked),
            Session::Local {
                screen_locked: true,
                remote_session_active: true,
            } => Decision::Suppress(SuppressReason::RemoteSessionActive),
            Session::Local {
                screen_locked: true,
                remote_session_active: false,
            } => Decision::Fire,
            Session::Remote {
                multiplexer_attached: true,
            } => Decision::Suppress(SuppressReason::MultiplexerAttached),
            Session::Remote {
                multiplexer_attached: false,
            } => Decision::Fire,
        },
    }
}

/// Observe the session and decide. Probes only run in `auto` mode, and only
/// the ones the table needs.
pub fn evaluate(mode: NotifyMode, probe: &dyn PresenceProbe) -> Decision {
    match mode {
        NotifyMode::On | NotifyMode::Off => {
            // The session is irrelevant; any value gives the same answer.
            decide(
                mode,
                Session::Remote {
                    multiplexer_attached: true,
                },
            )
        }
        NotifyMode::Auto => decide(mode, observe(probe)),
    }
}

pub fn observe(probe: &dyn PresenceProbe) -> Session {
    if probe.is_remote() {
        return Session::Remote {
            multiplexer_attached: probe.multiplexer_attached(),
        };
    }
    let screen_locked = probe.screen_locked();
    Session::Local {
        screen_locked,
        // Only consulted when locked.
        remote_session_active: screen_locked && probe.remote_session_active(),
    }
}

// ---------------------------------------------------------------------------
// PresenceProbe
// ---------------------------------------------------------------------------

/// Platform heuristics. Implementations must not fail: when a signal cannot
/// be read, report the value that assumes the user is present.
pub trait PresenceProbe {
    fn is_remote(&self) -> bool;
    fn screen_locked(&self) -> bool;
    fn remote_session_active(&self) -> bool;
    fn multiplexer_attached(&self) -> bool;
}

/// Probes the real machine via environment variables and small commands.
pub struct SystemProbe {
    env: Box<dyn Fn(&str) -> Option<String>>,
}

impl Default for SystemProbe {
    fn default() -> Self {
        Self::with_env(|k| std::env::var(k).ok())
    }
}

impl SystemProbe {
    pub fn with_env<F>(env: F) -> Self
    where
        F: Fn(&str) -> Option<String> + 'static,
    {
        SystemProbe { env: Box::new(env) }
    }

    fn var(&self, key: &str) -> Option<String> {
        (self.env)(key).filter(|v| !v.is_empty())
    }
}

impl PresenceProbe for SystemProbe {
    fn is_remote(&self) -> bool {
        ["SSH_CONNECTION", "SSH_CLIENT", "SSH_TTY"]
            .iter()
            .any(|k| self.var(k).is_some())
    }

    fn screen_locked(&self) -> bool {
        if cfg!(target_os = "macos") {
            run_capture("ioreg", &["-n", "Root", "-d1"], PROBE_TIMEOUT)
                .map(|out| ioreg_reports_locked(&out))
                .unwrap_or(false)
        } else {
            let session = self
                .var("XDG_SESSION_ID")
                .unwrap_or_else(|| "self".to_string());
            run_capture(
                "loginctl",
                &["show-session", &session, "-p", "LockedHint"],
                PROBE_TIMEOUT,
            )
            .map(|out| loginctl_reports_locked(&out))
            .unwrap_or(false)
        }
    }

    fn remote_session_active(&self) -> bool {
        run_capture("who", &[], PROBE_TIMEOUT)
            .map(|out| who_lists_remote_session(&out))
            .unwrap_or(false)
    }

    fn multiplexer_attached(&self) -> bool {
        if self.var("TMUX").is_none() {
            // A plain SSH terminal is in front of someone.
            return true;
        }
        run_capture(
            "tmux",
            &["display-message", "-p", "#{session_attached}"],
            PROBE_TIMEOUT,
        )
        .ok()
        .and_then(|out| out.trim().parse::<u32>().ok())
        .map_or(true, |clients| clients > 0)
    }
}

// ---------------------------------------------------------------------------
// Output parsers
// ---------------------------------------------------------------------------

/// `ioreg -n Root -d1` lists `"CGSSessionScreenIsLocked"=Yes` inside the
/// console user dictionary while the screen is locked.
pub fn ioreg_reports_locked(output: &str) -> bool {
    output.contains("\"CGSSessionScreenIsLocked\"=Yes")
}

/// `loginctl show-session <id> -p LockedHint` prints `LockedHint=yes`.
pub fn loginctl_reports_locked(output: &str) -> bool {
    output
        .lines()
        .any(|l| l.trim().eq_ignore_ascii_case("LockedHint=yes"))
}

/// `who` appends `(host)` to sessions opened from elsewhere. Local X
/// displays (`(:0)`) and tmux panes (`(tmux(123).%0)`) do not count.
pub fn who_lists_remote_session(output: &str) -> bool {
    output.lines().any(|line| {
        let Some(open) = line.find('(') else {
            return false;
        };
        let host = line[open + 1..].trim_end().trim_end_matches(')');
        !(host.is_empty() || host.starts_with(':') || host.starts_with("tmux"))
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
