use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Full session detail as materialized by `opencode export`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionExport {
    pub id: String,
    pub messages: Vec<Message>,
}

/// Message author role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    /// Any role this tool does not know about
    Other(String),
}

impl Role {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "user" => Role::User,
            "assistant" => Role::Assistant,
            other => Role::Other(other.to_string()),
        }
    }

    pub fn is_assistant(&self) -> bool {
        matches!(self, Role::Assistant)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Other(raw) => write!(f, "{}", raw),
        }
    }
}

/// One message of an exported session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub session_id: String,
    pub role: Role,
    pub created: Option<DateTime<Utc>>,
    pub completed: Option<DateTime<Utc>>,
    pub model_id: Option<String>,
    pub tokens: Option<TokenCounts>,
    pub path: Option<MessagePath>,
}

impl Message {
    /// Completion instant when present, otherwise creation instant
    pub fn effective_time(&self) -> Option<DateTime<Utc>> {
        self.completed.or(self.created)
    }

    pub fn cwd(&self) -> Option<&str> {
        self.path
            .as_ref()
            .map(|p| p.cwd.to_str().unwrap_or_default())
            .filter(|cwd| !cwd.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePath {
    pub cwd: PathBuf,
    pub root: Option<PathBuf>,
}

/// Token counts reported for an assistant message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCounts {
    pub input: u64,
    pub output: u64,
    pub reasoning: u64,
    pub cache: CacheTokens,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheTokens {
    pub read: u64,
    pub write: u64,
}

impl TokenCounts {
    /// True when any of the five counters is non-zero
    pub fn is_billable(&self) -> bool {
        self.input > 0
            || self.output > 0
            || self.reasoning > 0
            || self.cache.read > 0
            || self.cache.write > 0
    }
}
