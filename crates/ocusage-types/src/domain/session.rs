use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Session metadata discovered in OpenCode storage
///
/// Mirrors one `storage/session/<project>/<id>.json` record. Built fresh
/// on every discovery scan and never written back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionListItem {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub project_id: String,
    /// Working directory the session was recorded in; `opencode export`
    /// must run from here.
    pub directory: PathBuf,
}

impl SessionListItem {
    /// Title for display, falling back to the session id
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: Option<&str>) -> SessionListItem {
        let ts = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
        SessionListItem {
            id: "ses_abc".to_string(),
            title: title.map(str::to_string),
            created: ts,
            updated: ts,
            project_id: "proj".to_string(),
            directory: PathBuf::from("/work/app"),
        }
    }

    #[test]
    fn test_display_title_falls_back_to_id() {
        assert_eq!(item(Some("Fix build")).display_title(), "Fix build");
        assert_eq!(item(Some("   ")).display_title(), "ses_abc");
        assert_eq!(item(None).display_title(), "ses_abc");
    }
}
