//! Stdin payloads the host sends to each hook.
//!
//! Every field is optional: the host adds fields between releases and a hook
//! must still work with whatever subset it receives.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Result;

/// Parse a payload, treating empty input as the all-defaults payload.
pub fn parse_payload<T: DeserializeOwned + Default>(raw: &str) -> Result<T> {
    if raw.trim().is_empty() {
        return Ok(T::default());
    }
    Ok(serde_json::from_str(raw)?)
}

// ─── Status line ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ModelInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WorkspaceInfo {
    #[serde(default)]
    pub current_dir: Option<PathBuf>,
    #[serde(default)]
    pub project_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StatusInput {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub transcript_path: Option<PathBuf>,
    #[serde(default)]
    pub cwd: Option<PathBuf>,
    #[serde(default)]
    pub model: ModelInfo,
    #[serde(default)]
    pub workspace: WorkspaceInfo,
    #[serde(default)]
    pub version: Option<String>,
}

impl StatusInput {
    /// The directory the session is working in.
    pub fn working_dir(&self) -> Option<&PathBuf> {
        self.workspace.current_dir.as_ref().or(self.cwd.as_ref())
    }
}

// ─── Notification / Stop ──────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NotificationInput {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub transcript_path: Option<PathBuf>,
    #[serde(default)]
    pub cwd: Option<PathBuf>,
    #[serde(default)]
    pub hook_event_name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

// ─── PostToolUse ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolUseInput {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub cwd: Option<PathBuf>,
    #[serde(default)]
    pub tool_name: String,
    /// Tool inputs are schema-polymorphic (varies per tool), so Value is correct here.
    #[serde(default)]
    pub tool_input: serde_json::Value,
    #[serde(default)]
    pub tool_response: serde_json::Value,
}

impl ToolUseInput {
    pub fn input_str(&self, key: &str) -> &str {
        self.tool_input
            .get(key)
            .and_then(serde_json::Value::as_str)
            .unwrap_or("")
    }

    pub fn response_str(&self, key: &str) -> &str {
        self.tool_response
            .get(key)
            .and_then(serde_json::Value::as_str)
            .unwrap_or("")
    }
}

// ─── UserPromptSubmit ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PromptInput {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub cwd: Option<PathBuf>,
    #[serde(default)]
    pub prompt: String,
}
