//! `claude-transcript`: typed access to the assistant host's session
//! transcript.
//!
//! The host appends one JSON object per line to
//! `~/.claude/projects/<project>/<session>.jsonl`. Hooks receive the path in
//! their stdin payload (`transcript_path`). This crate models the entries we
//! care about and finds the most recent token usage record, which drives the
//! status line's context budget.
//!
//! ```text
//! <session>.jsonl
//!     │  one JSON object per line
//!     ▼
//! TranscriptEntry   ← tagged by "type"; unknown types tolerated
//!     │
//!     ▼
//! last_usage()      ← last main-chain assistant turn → UsageRecord
//! ```

pub mod error;
pub mod reader;
pub mod types;


pub use error::TranscriptError;
pub use reader::{last_usage, last_usage_from, last_usage_from_end, parse_line};
pub use types::{
    AssistantContent, AssistantEntry, SummaryEntry, SystemEntry, TokenUsage, TranscriptEntry,
    UsageRecord, UserEntry,
};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, TranscriptError>;
