pub mod config;
pub mod export;
pub mod report;
pub mod sessions;

use anyhow::{Context, Result};
use ocusage_runtime::Config;
use std::process::{ExitCode, ExitStatus};

fn load_config() -> Result<Config> {
    let path = Config::default_path()?;
    Config::load_from(&path).with_context(|| format!("Failed to load {}", path.display()))
}

/// Propagate a child's exit status; signals map to failure
fn exit_code(status: ExitStatus) -> ExitCode {
    match status.code() {
        Some(0) => ExitCode::SUCCESS,
        Some(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        None => ExitCode::FAILURE,
    }
}
