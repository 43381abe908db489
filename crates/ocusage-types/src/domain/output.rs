use serde::{Deserialize, Serialize};

/// Source tool name used in request ids and the flat grouping directory
pub const TOOL_NAME: &str = "opencode";

/// Model placeholder for messages that do not record one
pub const UNKNOWN_MODEL: &str = "unknown";

/// One line of a Claude Code project log, as read by ccusage
///
/// Never carries a cost field: pricing is left to the consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputLine {
    pub timestamp: String,
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    pub request_id: String,
    pub message: OutputMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputMessage {
    pub id: String,
    pub model: String,
    pub usage: OutputUsage,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_read_input_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_creation_input_tokens: Option<u64>,
}

impl OutputLine {
    /// `<tool>:<sessionId>:<messageId>`
    pub fn request_id(session_id: &str, message_id: &str) -> String {
        format!("{}:{}:{}", TOOL_NAME, session_id, message_id)
    }
}
