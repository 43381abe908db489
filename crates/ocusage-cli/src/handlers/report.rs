use super::{exit_code, load_config};
use anyhow::Result;
use ocusage_runtime::{ExportOptions, run_report};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

pub const DEFAULT_REPORT_BIN: &str = "ccusage";
pub const DEFAULT_REPORT_COMMAND: &str = "daily";

pub async fn handle(
    output_dir: Option<PathBuf>,
    ccusage_bin: Option<PathBuf>,
    args: Vec<OsString>,
) -> Result<ExitCode> {
    let output_dir = match output_dir {
        Some(dir) => dir,
        None => ExportOptions::from_config(&load_config()?)?.output_dir,
    };

    if !output_dir.join(ocusage_runtime::output::PROJECTS_DIR).is_dir() {
        tracing::warn!(
            output_dir = %output_dir.display(),
            "No exported sessions found; run `ocusage export` first"
        );
    }

    let args = if args.is_empty() {
        vec![OsString::from(DEFAULT_REPORT_COMMAND)]
    } else {
        args
    };

    report(ccusage_bin.as_deref(), &output_dir, &args).await
}

pub(crate) async fn report(
    ccusage_bin: Option<&Path>,
    output_dir: &Path,
    args: &[OsString],
) -> Result<ExitCode> {
    let program = ccusage_bin.unwrap_or(Path::new(DEFAULT_REPORT_BIN));
    let status = run_report(program, output_dir, args).await?;
    Ok(exit_code(status))
}
