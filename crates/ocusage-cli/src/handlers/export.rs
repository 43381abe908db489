use super::{load_config, report};
use crate::presentation;
use crate::{EXIT_SESSION_ERRORS, ExportArgs};
use anyhow::Result;
use chrono::{DateTime, Utc};
use is_terminal::IsTerminal;
use ocusage_runtime::{Config, ExportOptions, run_export};
use std::ffi::OsString;
use std::process::ExitCode;

pub async fn handle(args: ExportArgs, verbose: bool) -> Result<ExitCode> {
    let config = load_config()?;
    let options = build_options(&config, &args, verbose, Utc::now())?;

    let stats = run_export(&options).await?;

    let color = std::io::stdout().is_terminal();
    print!("{}", presentation::render_export(&stats, &options, color));

    let mut code = if stats.has_errors() {
        ExitCode::from(EXIT_SESSION_ERRORS)
    } else {
        ExitCode::SUCCESS
    };

    if args.report && !options.dry_run {
        let report_code = report::report(
            args.ccusage_bin.as_deref(),
            &options.output_dir,
            &[OsString::from(report::DEFAULT_REPORT_COMMAND)],
        )
        .await?;
        if !stats.has_errors() {
            code = report_code;
        }
    }

    Ok(code)
}

/// Config-derived options with command-line flags applied on top
fn build_options(
    config: &Config,
    args: &ExportArgs,
    verbose: bool,
    now: DateTime<Utc>,
) -> Result<ExportOptions> {
    let mut options = ExportOptions::from_config(config)?;

    if let Some(dir) = &args.output_dir {
        options.output_dir = dir.clone();
    }
    if let Some(dir) = &args.filter.storage_dir {
        options.storage_root = Some(dir.clone());
    }
    if let Some(bin) = &args.opencode_bin {
        options.opencode_bin = bin.clone();
    }
    if let Some(grouping) = args.grouping {
        options.grouping = grouping;
    }
    if let Some(concurrency) = args.concurrency {
        options.concurrency = Some(concurrency);
    }
    if let Some(max_retries) = args.max_retries {
        options.retry.max_retries = max_retries;
    }
    if args.no_reasoning {
        options.include_reasoning_in_output = false;
    }

    options.since = args.filter.cutoff(now);
    options.overwrite = args.overwrite;
    options.incremental = args.incremental;
    options.skip_validation = args.skip_validation;
    options.dry_run = args.dry_run;
    options.verbose = verbose;

    Ok(options)
}
