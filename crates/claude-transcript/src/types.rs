use serde::{Deserialize, Serialize};

// ─── Outer entry enum ─────────────────────────────────────────────────────

/// One line of the host's session transcript (`<session>.jsonl`).
/// Discriminated by the JSON `"type"` field.
///
/// The host writes many bookkeeping entries (`file-history-snapshot`,
/// `queue-operation`, ...) that carry nothing this crate needs; they all land
/// in [`TranscriptEntry::Unknown`] instead of failing the parse.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TranscriptEntry {
    User(UserEntry),
    Assistant(AssistantEntry),
    System(SystemEntry),
    Summary(SummaryEntry),
    #[serde(other)]
    Unknown,
}

impl TranscriptEntry {
    /// Returns `Some(&AssistantEntry)` for assistant turns.
    pub fn as_assistant(&self) -> Option<&AssistantEntry> {
        if let TranscriptEntry::Assistant(a) = self {
            Some(a)
        } else {
            None
        }
    }
}

// ─── Assistant entries ────────────────────────────────────────────────────

/// `type = "assistant"`: one model response, with the usage the API reported
/// for it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssistantEntry {
    pub message: AssistantContent,
    /// Sub-agent turns are logged into the same file with this flag set.
    #[serde(default, rename = "isSidechain")]
    pub is_sidechain: bool,
    /// Synthetic entries the host writes when an API call failed. Their usage
    /// is all zeros.
    #[serde(default, rename = "isApiErrorMessage")]
    pub is_api_error_message: bool,
    #[serde(default, rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl AssistantEntry {
    /// Usage for this turn, if it counts towards the main context window.
    pub fn main_chain_usage(&self) -> Option<&TokenUsage> {
        if self.is_sidechain || self.is_api_error_message {
            return None;
        }
        self.message.usage.as_ref()
    }
}

/// The subset of the API `Message` object the transcript stores that we read.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssistantContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_creation_input_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_read_input_tokens: Option<u64>,
}

impl TokenUsage {
    /// Tokens occupying the context window after this turn: fresh input plus
    /// everything written to or served from the prompt cache. Output tokens
    /// are excluded.
    pub fn context_tokens(&self) -> u64 {
        self.input_tokens
            .saturating_add(self.cache_creation_input_tokens.unwrap_or(0))
            .saturating_add(self.cache_read_input_tokens.unwrap_or(0))
    }
}

// ─── Other entries ────────────────────────────────────────────────────────

/// `type = "user"`: prompts and tool results. Only the metadata is kept.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserEntry {
    #[serde(default, rename = "isSidechain")]
    pub is_sidechain: bool,
    #[serde(default, rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
}

/// `type = "system"`, e.g. compaction boundaries and hook output.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SystemEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// `type = "summary"`: the title line the host writes for resumed sessions.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SummaryEntry {
    pub summary: String,
    #[serde(default, rename = "leafUuid", skip_serializing_if = "Option::is_none")]
    pub leaf_uuid: Option<String>,
}

/// The usage figures of the most recent main-chain assistant turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageRecord {
    pub usage: TokenUsage,
    pub model: Option<String>,
}
