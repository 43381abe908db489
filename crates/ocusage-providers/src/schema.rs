//! Raw OpenCode JSON shapes.
//!
//! Everything read from disk or from `opencode export` passes through these
//! structs and is converted into `ocusage_types` values here; nothing past
//! this module sees untyped JSON.

use chrono::{DateTime, Utc};
use ocusage_types::{CacheTokens, Message, MessagePath, Role, SessionExport, SessionListItem, TokenCounts};
use serde::Deserialize;
use std::path::PathBuf;

use crate::ExportError;

// --- storage/session/<project>/<id>.json ---

#[derive(Debug, Deserialize)]
pub struct RawSessionInfo {
    pub id: String,
    #[serde(rename = "projectID")]
    pub project_id: String,
    pub directory: String,
    #[serde(default)]
    pub title: Option<String>,
    pub time: RawSessionTime,
}

#[derive(Debug, Deserialize)]
pub struct RawSessionTime {
    pub created: i64,
    pub updated: i64,
}

impl RawSessionInfo {
    /// Returns None when a timestamp is outside the representable range
    pub fn into_list_item(self) -> Option<SessionListItem> {
        Some(SessionListItem {
            created: DateTime::from_timestamp_millis(self.time.created)?,
            updated: DateTime::from_timestamp_millis(self.time.updated)?,
            id: self.id,
            title: self.title,
            project_id: self.project_id,
            directory: PathBuf::from(self.directory),
        })
    }
}

// --- opencode export <id> ---

#[derive(Debug, Deserialize)]
pub struct RawExport {
    pub info: RawExportInfo,
    pub messages: Vec<RawMessageEnvelope>,
}

#[derive(Debug, Deserialize)]
pub struct RawExportInfo {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct RawMessageEnvelope {
    pub info: RawMessage,
    // Message parts (text, tool calls, ...) carry no usage data
    #[serde(default)]
    pub parts: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct RawMessage {
    pub id: String,
    #[serde(rename = "sessionID")]
    pub session_id: String,
    pub role: String,
    #[serde(default)]
    pub time: RawMessageTime,
    #[serde(rename = "modelID", default)]
    pub model_id: Option<String>,
    #[serde(default)]
    pub tokens: Option<RawTokens>,
    #[serde(default)]
    pub path: Option<RawPath>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawMessageTime {
    #[serde(default)]
    pub created: Option<i64>,
    #[serde(default)]
    pub completed: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawTokens {
    #[serde(default)]
    pub input: u64,
    #[serde(default)]
    pub output: u64,
    #[serde(default)]
    pub reasoning: u64,
    #[serde(default)]
    pub cache: RawCacheTokens,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawCacheTokens {
    #[serde(default)]
    pub read: u64,
    #[serde(default)]
    pub write: u64,
}

#[derive(Debug, Deserialize)]
pub struct RawPath {
    pub cwd: String,
    #[serde(default)]
    pub root: Option<String>,
}

impl RawExport {
    /// Convert into the domain export.
    ///
    /// With `validate`, cross-field rules are checked too: every message
    /// belongs to this session, has a non-empty id and a known role.
    pub fn into_export(self, validate: bool) -> Result<SessionExport, ExportError> {
        let session_id = self.info.id;
        if validate && session_id.is_empty() {
            return Err(ExportError::Schema("info.id is empty".to_string()));
        }

        let mut messages = Vec::with_capacity(self.messages.len());
        for (index, envelope) in self.messages.into_iter().enumerate() {
            let raw = envelope.info;

            if validate {
                if raw.id.is_empty() {
                    return Err(ExportError::Schema(format!("messages[{}].info.id is empty", index)));
                }
                if raw.session_id != session_id {
                    return Err(ExportError::Schema(format!(
                        "message {} belongs to session {}, expected {}",
                        raw.id, raw.session_id, session_id
                    )));
                }
                if !matches!(raw.role.as_str(), "user" | "assistant") {
                    return Err(ExportError::Schema(format!(
                        "message {} has unknown role {:?}",
                        raw.id, raw.role
                    )));
                }
            }

            messages.push(Message {
                created: millis_to_instant(&raw.id, raw.time.created)?,
                completed: millis_to_instant(&raw.id, raw.time.completed)?,
                role: Role::parse(&raw.role),
                model_id: raw.model_id.filter(|m| !m.is_empty()),
                tokens: raw.tokens.map(|t| TokenCounts {
                    input: t.input,
                    output: t.output,
                    reasoning: t.reasoning,
                    cache: CacheTokens {
                        read: t.cache.read,
                        write: t.cache.write,
                    },
                }),
                path: raw.path.map(|p| MessagePath {
                    cwd: PathBuf::from(p.cwd),
                    root: p.root.map(PathBuf::from),
                }),
                id: raw.id,
                session_id: raw.session_id,
            });
        }

        Ok(SessionExport {
            id: session_id,
            messages,
        })
    }
}

fn millis_to_instant(
    message_id: &str,
    millis: Option<i64>,
) -> Result<Option<DateTime<Utc>>, ExportError> {
    match millis {
        None => Ok(None),
        Some(ms) => DateTime::from_timestamp_millis(ms).map(Some).ok_or_else(|| {
            ExportError::Schema(format!(
                "message {} has out-of-range timestamp {}",
                message_id, ms
            ))
        }),
    }
}
