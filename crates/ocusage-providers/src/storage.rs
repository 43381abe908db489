use chrono::{DateTime, Utc};
use futures::future::join_all;
use ocusage_types::SessionListItem;
use std::path::{Path, PathBuf};

use crate::schema::RawSessionInfo;
use crate::{Error, Result};

/// Discover OpenCode sessions, oldest first.
///
/// Resolves the storage root (override > env > platform default) and scans
/// `<root>/session/<project>/<id>.json`. A missing root yields no sessions.
pub async fn list_sessions(
    since: Option<DateTime<Utc>>,
    storage_override: Option<&Path>,
) -> Result<Vec<SessionListItem>> {
    let root = ocusage_core::resolve_storage_root(storage_override)?;
    list_sessions_in(&root, since).await
}

/// Scan an already resolved storage root
pub async fn list_sessions_in(
    storage_root: &Path,
    since: Option<DateTime<Utc>>,
) -> Result<Vec<SessionListItem>> {
    let session_root = storage_root.join("session");
    if !is_dir(&session_root).await {
        tracing::debug!(path = %session_root.display(), "OpenCode session storage not found");
        return Ok(Vec::new());
    }

    let project_dirs = read_dir_entries(&session_root)
        .await?
        .into_iter()
        .filter(|(_, is_dir)| *is_dir)
        .map(|(path, _)| path);

    let per_project = join_all(project_dirs.map(scan_project_dir)).await;

    let mut sessions = Vec::new();
    for project_sessions in per_project {
        sessions.extend(project_sessions?);
    }

    if let Some(cutoff) = since {
        sessions.retain(|s| s.created >= cutoff);
    }

    // Oldest first; ties broken by id so the order never depends on the filesystem
    sessions.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id)));

    tracing::debug!(count = sessions.len(), root = %storage_root.display(), "Discovered sessions");
    Ok(sessions)
}

async fn scan_project_dir(dir: PathBuf) -> Result<Vec<SessionListItem>> {
    let files: Vec<PathBuf> = read_dir_entries(&dir)
        .await?
        .into_iter()
        .filter(|(path, is_dir)| !*is_dir && path.extension().is_some_and(|e| e == "json"))
        .map(|(path, _)| path)
        .collect();

    let parsed = join_all(files.iter().map(|path| read_session_file(path))).await;
    Ok(parsed.into_iter().flatten().collect())
}

/// Read one metadata file; unreadable or invalid files are skipped
async fn read_session_file(path: &Path) -> Option<SessionListItem> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "Skipping unreadable session file");
            return None;
        }
    };

    match serde_json::from_str::<RawSessionInfo>(&content) {
        Ok(raw) => raw.into_list_item(),
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "Skipping invalid session file");
            None
        }
    }
}

async fn read_dir_entries(dir: &Path) -> Result<Vec<(PathBuf, bool)>> {
    let storage_err = |source| Error::Storage {
        path: dir.to_path_buf(),
        source,
    };

    let mut reader = tokio::fs::read_dir(dir).await.map_err(storage_err)?;
    let mut entries = Vec::new();
    while let Some(entry) = reader.next_entry().await.map_err(storage_err)? {
        let is_dir = entry
            .file_type()
            .await
            .map(|t| t.is_dir())
            .map_err(storage_err)?;
        entries.push((entry.path(), is_dir));
    }
    Ok(entries)
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
}
