//! Builders for OpenCode storage metadata and `opencode export` payloads.

use serde_json::{Value, json};
use std::path::Path;

/// 2025-01-04T14:13:20Z in milliseconds
pub const T0: i64 = 1_736_000_000_000;

/// One `storage/session/<project>/<id>.json` entry
#[derive(Debug, Clone)]
pub struct SessionFixture {
    pub id: String,
    pub project_id: String,
    /// Working directory name, created under the world's work root
    pub directory: String,
    pub title: Option<String>,
    pub created_ms: i64,
    pub updated_ms: i64,
}

impl SessionFixture {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            project_id: "proj_default".to_string(),
            directory: "app".to_string(),
            title: Some(format!("Session {}", id)),
            created_ms: T0,
            updated_ms: T0,
        }
    }

    pub fn project(mut self, project_id: &str) -> Self {
        self.project_id = project_id.to_string();
        self
    }

    pub fn directory(mut self, name: &str) -> Self {
        self.directory = name.to_string();
        self
    }

    pub fn untitled(mut self) -> Self {
        self.title = None;
        self
    }

    /// Created and updated both `offset_ms` after [`T0`]
    pub fn at(mut self, offset_ms: i64) -> Self {
        self.created_ms = T0 + offset_ms;
        self.updated_ms = T0 + offset_ms;
        self
    }

    pub fn updated(mut self, offset_ms: i64) -> Self {
        self.updated_ms = T0 + offset_ms;
        self
    }

    pub fn metadata(&self, directory: &Path) -> Value {
        let mut value = json!({
            "id": self.id,
            "projectID": self.project_id,
            "directory": directory.to_string_lossy(),
            "time": { "created": self.created_ms, "updated": self.updated_ms },
        });
        if let Some(title) = &self.title {
            value["title"] = json!(title);
        }
        value
    }
}

/// Payload printed by the fake `opencode export <id>`
#[derive(Debug, Clone)]
pub struct ExportFixture {
    session_id: String,
    messages: Vec<Value>,
}

impl ExportFixture {
    pub fn new(session_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            messages: Vec::new(),
        }
    }

    pub fn user(mut self, id: &str, offset_ms: i64) -> Self {
        self.messages.push(json!({
            "info": {
                "id": id,
                "sessionID": self.session_id,
                "role": "user",
                "time": { "created": T0 + offset_ms },
            },
            "parts": [{ "type": "text", "text": "hello" }],
        }));
        self
    }

    /// Assistant message completed `offset_ms` after [`T0`]
    pub fn assistant(self, id: &str, offset_ms: i64, input: u64, output: u64) -> Self {
        self.assistant_with(id, offset_ms, json!({
            "input": input,
            "output": output,
            "reasoning": 0,
            "cache": { "read": 0, "write": 0 },
        }))
    }

    pub fn assistant_with(mut self, id: &str, offset_ms: i64, tokens: Value) -> Self {
        self.messages.push(json!({
            "info": {
                "id": id,
                "sessionID": self.session_id,
                "role": "assistant",
                "time": { "created": T0 + offset_ms - 1_000, "completed": T0 + offset_ms },
                "modelID": "claude-sonnet-4",
                "providerID": "anthropic",
                "tokens": tokens,
                "path": { "cwd": "/work/app", "root": "/work/app" },
            },
            "parts": [],
        }));
        self
    }

    pub fn to_json(&self) -> Value {
        json!({
            "info": { "id": self.session_id, "title": "fixture" },
            "messages": self.messages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_shape() {
        let meta = SessionFixture::new("ses_1")
            .project("p1")
            .updated(5_000)
            .metadata(Path::new("/work/app"));
        assert_eq!(meta["projectID"], "p1");
        assert_eq!(meta["directory"], "/work/app");
        assert_eq!(meta["time"]["updated"], T0 + 5_000);
        assert_eq!(meta["title"], "Session ses_1");
    }

    #[test]
    fn test_untitled_omits_title() {
        let meta = SessionFixture::new("ses_1")
            .untitled()
            .metadata(Path::new("/w"));
        assert!(meta.get("title").is_none());
    }

    #[test]
    fn test_export_messages_belong_to_session() {
        let export = ExportFixture::new("ses_1")
            .user("msg_u", 0)
            .assistant("msg_a", 1_000, 10, 5)
            .to_json();
        let messages = export["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().all(|m| m["info"]["sessionID"] == "ses_1"));
        assert_eq!(messages[1]["info"]["time"]["completed"], T0 + 1_000);
    }
}
