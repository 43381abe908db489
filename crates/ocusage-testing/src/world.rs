//! TestWorld pattern for declarative integration test setup.
//!
//! A world owns one temp directory laid out as:
//!
//! ```text
//! <tmp>/opencode-data/storage/session/<project>/<id>.json
//! <tmp>/fixtures/<id>.json        export payloads for the fake opencode
//! <tmp>/bin/opencode              the fake executable
//! <tmp>/work/<name>/              session working directories
//! <tmp>/out/                      export output root
//! <tmp>/config.toml               points output_dir at <tmp>/out
//! ```

use anyhow::{Context, Result};
use assert_cmd::Command;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tempfile::TempDir;
use walkdir::WalkDir;

use crate::fake_opencode;
use crate::fixtures::{ExportFixture, SessionFixture};

/// Declarative test environment builder.
///
/// # Example
/// ```no_run
/// use ocusage_testing::{ExportFixture, SessionFixture, TestWorld};
///
/// let world = TestWorld::new()
///     .with_session(
///         SessionFixture::new("ses_1"),
///         ExportFixture::new("ses_1").assistant("msg_1", 1_000, 10, 5),
///     );
///
/// let result = world.run(&["export"]).unwrap();
/// assert!(result.success());
/// ```
pub struct TestWorld {
    temp_dir: TempDir,
    data_dir: PathBuf,
    fixtures_dir: PathBuf,
    opencode_bin: PathBuf,
    work_root: PathBuf,
    output_dir: PathBuf,
    config_path: PathBuf,
    env_vars: HashMap<String, String>,
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorld {
    /// Create a new isolated test environment.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let base = temp_dir.path().to_path_buf();

        let data_dir = base.join("opencode-data");
        let fixtures_dir = base.join("fixtures");
        let bin_dir = base.join("bin");
        let work_root = base.join("work");
        let output_dir = base.join("out");
        let config_path = base.join("config.toml");

        for dir in [
            data_dir.join("storage").join("session"),
            fixtures_dir.clone(),
            bin_dir.clone(),
            work_root.clone(),
        ] {
            std::fs::create_dir_all(&dir).expect("Failed to create world dir");
        }

        let opencode_bin = bin_dir.join("opencode");
        fake_opencode::install(&opencode_bin, &fixtures_dir).expect("Failed to install fake opencode");

        std::fs::write(
            &config_path,
            format!("output_dir = {:?}\n", output_dir.to_string_lossy()),
        )
        .expect("Failed to write config");

        Self {
            temp_dir,
            data_dir,
            fixtures_dir,
            opencode_bin,
            work_root,
            output_dir,
            config_path,
            env_vars: HashMap::new(),
        }
    }

    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Value for `OPENCODE_DATA_DIR`
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn storage_root(&self) -> PathBuf {
        self.data_dir.join("storage")
    }

    pub fn opencode_bin(&self) -> &Path {
        &self.opencode_bin
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn fixtures_dir(&self) -> &Path {
        &self.fixtures_dir
    }

    /// Working directory for a session, created on first use
    pub fn work_dir(&self, name: &str) -> PathBuf {
        let dir = self.work_root.join(name);
        std::fs::create_dir_all(&dir).expect("Failed to create work dir");
        dir
    }

    /// Set an environment variable for CLI execution.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(key.into(), value.into());
        self
    }

    /// Register a session in storage and give the fake opencode its export.
    pub fn with_session(self, session: SessionFixture, export: ExportFixture) -> Self {
        self.add_session(&session, &export)
            .expect("Failed to add session");
        self
    }

    /// Register a session whose export always fails.
    pub fn with_failing_session(self, session: SessionFixture) -> Self {
        self.write_metadata(&session)
            .and_then(|_| self.mark_failing(&session.id))
            .expect("Failed to add failing session");
        self
    }

    /// Register a session whose working directory does not exist.
    pub fn with_orphaned_session(self, session: SessionFixture) -> Self {
        let directory = self.work_root.join("deleted").join(&session.directory);
        let path = self.metadata_path(&session);
        std::fs::create_dir_all(path.parent().expect("metadata path has a parent"))
            .and_then(|_| std::fs::write(&path, session.metadata(&directory).to_string()))
            .expect("Failed to add orphaned session");
        self
    }

    pub fn add_session(&self, session: &SessionFixture, export: &ExportFixture) -> Result<()> {
        self.write_metadata(session)?;
        std::fs::write(
            self.fixtures_dir.join(format!("{}.json", session.id)),
            serde_json::to_string_pretty(&export.to_json())?,
        )?;
        Ok(())
    }

    pub fn mark_failing(&self, session_id: &str) -> Result<()> {
        std::fs::write(self.fixtures_dir.join(format!("{}.fail", session_id)), "")?;
        Ok(())
    }

    /// Drop a non-JSON file into storage next to the real sessions.
    pub fn add_corrupt_metadata(&self, project_id: &str, name: &str) -> Result<()> {
        let dir = self.storage_root().join("session").join(project_id);
        std::fs::create_dir_all(&dir)?;
        std::fs::write(dir.join(name), "{ not json")?;
        Ok(())
    }

    fn metadata_path(&self, session: &SessionFixture) -> PathBuf {
        self.storage_root()
            .join("session")
            .join(&session.project_id)
            .join(format!("{}.json", session.id))
    }

    fn write_metadata(&self, session: &SessionFixture) -> Result<()> {
        let directory = self.work_dir(&session.directory);
        let path = self.metadata_path(session);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, session.metadata(&directory).to_string())?;
        Ok(())
    }

    /// `(session id, cwd)` for every `opencode export` the fake received
    pub fn export_calls(&self) -> Vec<(String, String)> {
        fake_opencode::recorded_calls(&self.fixtures_dir)
    }

    /// Output files relative to the output root, sorted
    pub fn output_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(&self.output_dir)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "jsonl"))
            .filter_map(|entry| {
                entry
                    .path()
                    .strip_prefix(&self.output_dir)
                    .ok()
                    .map(Path::to_path_buf)
            })
            .collect();
        files.sort();
        files
    }

    /// Find the one output file for a session, whatever its group directory
    pub fn output_file_for(&self, session_id: &str) -> Option<PathBuf> {
        let name = format!("{}.jsonl", session_id);
        self.output_files()
            .into_iter()
            .find(|p| p.file_name().is_some_and(|f| f == name.as_str()))
            .map(|p| self.output_dir.join(p))
    }

    /// Parse every line of an output file
    pub fn read_lines(&self, path: &Path) -> Result<Vec<Value>> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        content
            .lines()
            .map(|line| serde_json::from_str(line).map_err(Into::into))
            .collect()
    }

    /// Set a file's mtime, for incremental-export tests
    pub fn set_mtime(&self, path: &Path, time: SystemTime) -> Result<()> {
        filetime::set_file_mtime(path, filetime::FileTime::from_system_time(time))?;
        Ok(())
    }

    /// Configure a CLI command with this test environment's settings.
    ///
    /// The caller must provide the base command (e.g., from `cargo_bin_cmd!("ocusage")`).
    pub fn configure_command<'a>(&self, cmd: &'a mut Command) -> &'a mut Command {
        cmd.current_dir(self.temp_dir.path())
            .env("HOME", self.temp_dir.path())
            .env("XDG_DATA_HOME", self.temp_dir.path().join("xdg-data"))
            .env("XDG_CONFIG_HOME", self.temp_dir.path().join("xdg-config"))
            .env("OPENCODE_DATA_DIR", &self.data_dir)
            .env("OCUSAGE_OPENCODE_BIN", &self.opencode_bin)
            .env("OCUSAGE_CONFIG", &self.config_path)
            .env_remove("RUST_LOG");

        for (key, value) in &self.env_vars {
            cmd.env(key, value);
        }

        cmd
    }

    /// Execute the `ocusage` binary in this world.
    ///
    /// Uses `Command::cargo_bin()`, which needs the binary built by cargo test.
    #[allow(deprecated)]
    pub fn run(&self, args: &[&str]) -> Result<CliResult> {
        let mut cmd = Command::cargo_bin("ocusage")
            .map_err(|e| anyhow::anyhow!("Failed to find ocusage binary: {}", e))?;

        self.configure_command(&mut cmd);
        cmd.args(args);

        let output = cmd.output()?;

        Ok(CliResult {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Result of a CLI command execution.
#[derive(Debug)]
pub struct CliResult {
    pub status: std::process::ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CliResult {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }

    /// Parse stdout as JSON.
    pub fn json(&self) -> Result<Value> {
        Ok(serde_json::from_str(&self.stdout)?)
    }

    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn stderr(&self) -> &str {
        &self.stderr
    }
}
