use thiserror::Error;

#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse transcript line {line_no}: {source}")]
    Parse {
        line_no: usize,
        #[source]
        source: serde_json::Error,
    },
}
