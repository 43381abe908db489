/// Result type for ocusage-runtime operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the runtime layer
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The export tool cannot be run; nothing else is attempted
    #[error("{program} is not available ({reason}). {hint}")]
    ToolUnavailable {
        program: String,
        reason: String,
        hint: &'static str,
    },

    /// Provider layer error
    #[error(transparent)]
    Provider(#[from] ocusage_providers::Error),

    /// Path resolution error
    #[error(transparent)]
    Core(#[from] ocusage_core::Error),

    /// IO operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid operation or state
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}
