use ocusage_types::SessionExport;
use serde::Deserialize;
use serde_json::error::Category;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use crate::ExportError;
use crate::schema::RawExport;

/// Source of full session detail
///
/// The pipeline only talks to this trait, so tests can script exports
/// without spawning processes.
pub trait SessionExporter: Send + Sync + 'static {
    /// Check the export tool is reachable; returns its version string
    fn probe(&self) -> impl Future<Output = Result<String, ExportError>> + Send;

    /// Materialize one session's messages
    fn export(
        &self,
        session_id: &str,
        directory: &Path,
    ) -> impl Future<Output = Result<SessionExport, ExportError>> + Send;
}

/// Runs `opencode export <id>` from the session's own directory
#[derive(Debug, Clone)]
pub struct OpenCodeExporter {
    program: PathBuf,
    validate: bool,
}

impl Default for OpenCodeExporter {
    fn default() -> Self {
        Self::new("opencode")
    }
}

impl OpenCodeExporter {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            validate: true,
        }
    }

    /// Toggle the cross-field schema checks on parsed exports
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn spawn_error(&self, source: std::io::Error) -> ExportError {
        ExportError::Spawn {
            program: self.program.display().to_string(),
            source,
        }
    }
}

impl SessionExporter for OpenCodeExporter {
    async fn probe(&self) -> Result<String, ExportError> {
        let output = Command::new(&self.program)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(ExportError::NonZeroExit {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn export(&self, session_id: &str, directory: &Path) -> Result<SessionExport, ExportError> {
        let is_dir = tokio::fs::metadata(directory)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !is_dir {
            return Err(ExportError::MissingDirectory(directory.to_path_buf()));
        }

        // stdout goes to a file: opencode does not flush reliably into a pipe.
        // The file is removed when `capture` drops, on every path out of here.
        let capture = tempfile::NamedTempFile::new()?;
        let stdout = capture.reopen()?;

        let output = Command::new(&self.program)
            .arg("export")
            .arg(session_id)
            .current_dir(directory)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(ExportError::NonZeroExit {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let text = tokio::fs::read_to_string(capture.path()).await?;
        tracing::trace!(session_id, bytes = text.len(), "Captured export output");
        parse_export_output(&text, self.validate)
    }
}

/// Parse export output that may be preceded by banner text.
///
/// Parsing starts at the first `{`; anything after the document is ignored.
/// Syntax errors map to `Json`, shape mismatches to `Schema`.
pub fn parse_export_output(text: &str, validate: bool) -> Result<SessionExport, ExportError> {
    let start = text.find('{').ok_or(ExportError::NoJson)?;

    let mut deserializer = serde_json::Deserializer::from_str(&text[start..]);
    let raw = RawExport::deserialize(&mut deserializer).map_err(|err| match err.classify() {
        Category::Data => ExportError::Schema(err.to_string()),
        Category::Io | Category::Syntax | Category::Eof => ExportError::Json(err),
    })?;

    raw.into_export(validate)
}
