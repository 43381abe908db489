use std::path::PathBuf;

/// Result type for ocusage-providers operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the providers layer
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Session storage exists but could not be enumerated
    #[error("Failed to read session storage at {}: {source}", .path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Storage root could not be resolved
    #[error(transparent)]
    Core(#[from] ocusage_core::Error),

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Failure of a single `opencode export` call
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Session directory is gone; the subprocess is never started
    #[error("Session directory does not exist: {}", .0.display())]
    MissingDirectory(PathBuf),

    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Export command exited with {}: {stderr}", exit_code_label(.code))]
    NonZeroExit { code: Option<i32>, stderr: String },

    /// Output contained no `{`
    #[error("Export output contains no JSON document")]
    NoJson,

    #[error("Malformed export JSON: {0}")]
    Json(#[source] serde_json::Error),

    /// JSON parsed but does not match the session export shape
    #[error("Export does not match session schema: {0}")]
    Schema(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    /// Captured stderr of a failed subprocess, if any
    pub fn stderr(&self) -> Option<&str> {
        match self {
            ExportError::NonZeroExit { stderr, .. } if !stderr.is_empty() => Some(stderr),
            _ => None,
        }
    }

    /// Whether another attempt could succeed
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ExportError::MissingDirectory(_))
    }
}

fn exit_code_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "a signal".to_string(),
    }
}
