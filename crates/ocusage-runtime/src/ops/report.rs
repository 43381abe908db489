use std::ffi::OsString;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;

use crate::{Error, Result};

const CCUSAGE_HINT: &str =
    "Install ccusage (npm install -g ccusage) or point --ccusage-bin at the executable";

/// ccusage reads Claude Code logs from `$CLAUDE_CONFIG_DIR/projects`
pub const CLAUDE_CONFIG_DIR_ENV: &str = "CLAUDE_CONFIG_DIR";

/// Run the report tool against an export directory, inheriting stdio
pub async fn run_report(
    program: &Path,
    output_dir: &Path,
    args: &[OsString],
) -> Result<ExitStatus> {
    tracing::debug!(program = %program.display(), output_dir = %output_dir.display(), "Running report");

    Command::new(program)
        .args(args)
        .env(CLAUDE_CONFIG_DIR_ENV, output_dir)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await
        .map_err(|err| Error::ToolUnavailable {
            program: program.display().to_string(),
            reason: err.to_string(),
            hint: CCUSAGE_HINT,
        })
}
