use serde::{Deserialize, Serialize};

/// Run-level counters for one export batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportStats {
    pub sessions_discovered: usize,
    pub sessions_exported: usize,
    pub sessions_skipped: usize,
    pub messages_converted: usize,
    pub messages_skipped: usize,
    pub errors: Vec<String>,
    /// Set when the error-rate guard stopped scheduling new sessions
    #[serde(default)]
    pub aborted: bool,
}

impl ExportStats {
    pub fn sessions_failed(&self) -> usize {
        self.errors.len()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
