use thiserror::Error;

#[derive(Debug, Error)]
pub enum HookError {
    #[error("home directory not found: set HOME or CLAUDE_CONFIG_DIR")]
    HomeNotFound,

    #[error("invalid notification mode '{0}': expected on, off or auto")]
    InvalidMode(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("failed to spawn {program}: {reason}")]
    ToolSpawnFailed { program: String, reason: String },

    #[error("{program} timed out after {seconds}s")]
    ToolTimedOut { program: String, seconds: u64 },

    #[error("notification relay error: {0}")]
    Http(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HookError>;
