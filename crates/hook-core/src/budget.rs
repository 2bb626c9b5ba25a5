//! Context budget calculator.
//!
//! Given a model id and the last recorded token usage, works out how much of
//! the context window is in use and how much headroom is left before the host
//! auto-compacts (or, with auto-compaction off, before the window is full).
//!
//! Every failure on the input side collapses into "no usage yet", which is
//! shown as a fixed base overhead rather than zero: a fresh session already
//! carries the system prompt and tool definitions.

use claude_transcript::TokenUsage;
use serde::Serialize;
use std::path::Path;

use crate::tokens::{format_percent_tenths, format_tokens};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const DEFAULT_CONTEXT_WINDOW: u64 = 200_000;
pub const EXTENDED_CONTEXT_WINDOW: u64 = 1_000_000;

/// Tokens the host holds back before auto-compaction fires.
pub const DEFAULT_AUTOCOMPACT_RESERVE: u64 = 45_000;

/// Stand-in for the fixed system-prompt cost when no usage is recorded yet.
pub const DEFAULT_BASE_OVERHEAD: u64 = 18_500;

/// Key in the host's global settings JSON.
pub const AUTOCOMPACT_SETTING: &str = "autoCompactEnabled";

/// Select the context window for a model identifier or display name.
///
/// Long-context variants are marked with a `[1m]` suffix (`sonnet[1m]`), a
/// `-1m` id suffix, or "1M context" in the display name.
pub fn context_window_for(model: &str) -> u64 {
    let m = model.to_ascii_lowercase();
    if m.contains("[1m]") || m.contains("-1m") || m.contains("1m context") {
        EXTENDED_CONTEXT_WINDOW
    } else {
        DEFAULT_CONTEXT_WINDOW
    }
}

/// Read `autoCompactEnabled` from the host settings file.
///
/// A missing file, unparsable JSON, or a missing or non-boolean key all mean
/// `true`, matching the host's own default.
pub fn host_autocompact_enabled(state_file: &Path) -> bool {
    let Ok(text) = std::fs::read_to_string(state_file) else {
        return true;
    };
    let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) else {
        tracing::debug!(path = %state_file.display(), "host settings are not valid JSON");
        return true;
    };
    value
        .get(AUTOCOMPACT_SETTING)
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(true)
}

// ---------------------------------------------------------------------------
// BudgetSettings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetSettings {
    pub reserve_tokens: u64,
    pub base_overhead_tokens: u64,
    pub autocompact: bool,
}

impl Default for BudgetSettings {
    fn default() -> Self {
        Self {
            reserve_tokens: DEFAULT_AUTOCOMPACT_RESERVE,
            base_overhead_tokens: DEFAULT_BASE_OVERHEAD,
            autocompact: true,
        }
    }
}

// ---------------------------------------------------------------------------
// UsageSnapshot
// ---------------------------------------------------------------------------

/// Headroom bands used to colour the remaining percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetLevel {
    Comfortable,
    Tight,
    Critical,
}

/// One invocation's view of the context window. Recomputed from scratch on
/// every call; nothing is cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageSnapshot {
    pub model_id: String,
    pub capacity: u64,
    pub autocompact: bool,
    /// Effective reserve. Always smaller than `capacity`.
    pub reserve: u64,
    pub total_tokens: u64,
    /// True when `total_tokens` is the base overhead placeholder.
    pub estimated: bool,
}

impl UsageSnapshot {
    pub fn compute(model_id: &str, usage: Option<&TokenUsage>, settings: &BudgetSettings) -> Self {
        let capacity = context_window_for(model_id);

        let reserve = if settings.reserve_tokens >= capacity {
            tracing::warn!(
                reserve = settings.reserve_tokens,
                capacity,
                "autocompact reserve exceeds the context window; ignoring it"
            );
            0
        } else {
            settings.reserve_tokens
        };

        let recorded = usage.map(TokenUsage::context_tokens).unwrap_or(0);
        let (total_tokens, estimated) = if recorded == 0 {
            (settings.base_overhead_tokens, true)
        } else {
            (recorded, false)
        };

        UsageSnapshot {
            model_id: model_id.to_string(),
            capacity,
            autocompact: settings.autocompact,
            reserve,
            total_tokens,
            estimated,
        }
    }

    /// Read the transcript and compute. Any transcript problem is treated as
    /// "no usage yet".
    pub fn from_transcript(
        model_id: &str,
        transcript: Option<&Path>,
        settings: &BudgetSettings,
    ) -> Self {
        let usage = transcript.and_then(|path| match claude_transcript::last_usage(path) {
            Ok(record) => record.map(|r| r.usage),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "transcript unavailable");
                None
            }
        });
        Self::compute(model_id, usage.as_ref(), settings)
    }

    pub fn used_fraction(&self) -> f64 {
        self.total_tokens as f64 / self.capacity as f64
    }

    /// Denominator for the remaining percentage.
    pub fn usable_budget(&self) -> u64 {
        if self.autocompact {
            self.capacity - self.reserve
        } else {
            self.capacity
        }
    }

    pub fn remaining_tokens(&self) -> u64 {
        self.usable_budget().saturating_sub(self.total_tokens)
    }

    pub fn remaining_fraction(&self) -> f64 {
        self.remaining_tokens() as f64 / self.usable_budget() as f64
    }

    /// Remaining percentage rounded to the nearest integer, within 0..=100.
    pub fn remaining_percent(&self) -> u64 {
        let usable = self.usable_budget();
        let pct = (self.remaining_tokens() * 100 + usable / 2) / usable;
        pct.min(100)
    }

    pub fn remaining_label(&self) -> &'static str {
        if self.autocompact {
            "to compact"
        } else {
            "to end"
        }
    }

    pub fn level(&self) -> BudgetLevel {
        match self.remaining_percent() {
            p if p > 40 => BudgetLevel::Comfortable,
            p if p > 15 => BudgetLevel::Tight,
            _ => BudgetLevel::Critical,
        }
    }

    pub fn tokens_display(&self) -> String {
        format_tokens(self.total_tokens)
    }

    pub fn used_percent_display(&self) -> String {
        format_percent_tenths(self.total_tokens, self.capacity)
    }

    pub fn remaining_display(&self) -> String {
        format!("{}% {}", self.remaining_percent(), self.remaining_label())
    }

    /// Uncoloured summary, e.g. `100k tokens (50.0%) | 35% to compact`.
    pub fn summary(&self) -> String {
        format!(
            "{} tokens ({}%) | {}",
            self.tokens_display(),
            self.used_percent_display(),
            self.remaining_display()
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
