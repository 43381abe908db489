use super::args::{Cli, Commands};
use super::handlers;
use super::logging;
use anyhow::{Context, Result};
use std::process::ExitCode;

/// `export` finished but some sessions failed
pub const EXIT_SESSION_ERRORS: u8 = 2;

pub fn run(cli: Cli) -> Result<ExitCode> {
    let dry_run = matches!(&cli.command, Commands::Export(args) if args.dry_run);
    logging::init(cli.verbose, dry_run);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let verbose = cli.verbose;
    runtime.block_on(async move {
        match cli.command {
            Commands::Export(args) => handlers::export::handle(args, verbose).await,
            Commands::Sessions { filter, json } => handlers::sessions::handle(filter, json).await,
            Commands::Report {
                output_dir,
                ccusage_bin,
                args,
            } => handlers::report::handle(output_dir, ccusage_bin, args).await,
            Commands::Config { command } => handlers::config::handle(command),
        }
    })
}
