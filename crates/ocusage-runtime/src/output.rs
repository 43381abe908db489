//! Output layout: `<out>/projects/<group>/<session id>.jsonl`

use ocusage_types::{GroupingStrategy, OutputLine, SessionListItem, TOOL_NAME};
use std::path::{Path, PathBuf};

use crate::Result;

/// Directory under the output root that ccusage scans
pub const PROJECTS_DIR: &str = "projects";

/// Subdirectory name for a session under the given strategy
pub fn group_subdir(session: &SessionListItem, strategy: GroupingStrategy) -> String {
    match strategy {
        GroupingStrategy::Flat => TOOL_NAME.to_string(),
        GroupingStrategy::Project => format!("{}-{}", TOOL_NAME, sanitize(&session.project_id)),
        GroupingStrategy::Directory => {
            format!("{}-{}", TOOL_NAME, ocusage_core::directory_hash(&session.directory))
        }
    }
}

pub fn session_output_dir(
    output_root: &Path,
    session: &SessionListItem,
    strategy: GroupingStrategy,
) -> PathBuf {
    output_root
        .join(PROJECTS_DIR)
        .join(group_subdir(session, strategy))
}

pub fn session_output_path(
    output_root: &Path,
    session: &SessionListItem,
    strategy: GroupingStrategy,
) -> PathBuf {
    session_output_dir(output_root, session, strategy).join(format!("{}.jsonl", sanitize(&session.id)))
}

/// Write a session's lines; the parent directory must already exist
pub async fn write_session_file(path: &Path, lines: &[OutputLine]) -> Result<()> {
    let content = ocusage_engine::to_jsonl(lines).map_err(std::io::Error::other)?;
    tokio::fs::write(path, content).await?;
    Ok(())
}

/// Keep names filesystem-safe: anything outside `[A-Za-z0-9._-]` becomes `_`
fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    match cleaned.as_str() {
        "" | "." | ".." => format!("_{}", cleaned),
        _ => cleaned,
    }
}
