use chrono::{DateTime, Days, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use ocusage_types::GroupingStrategy;
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ocusage")]
#[command(about = "Export OpenCode sessions as Claude Code usage logs for ccusage", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Debug logging and a full run summary
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Export sessions into `<output>/projects/<group>/<session>.jsonl`
    Export(ExportArgs),

    /// List discovered sessions, oldest first
    Sessions {
        #[command(flatten)]
        filter: SessionFilterArgs,

        #[arg(long)]
        json: bool,
    },

    /// Run ccusage against the exported logs
    Report {
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        #[arg(long)]
        ccusage_bin: Option<PathBuf>,

        /// Passed through to ccusage (default: daily)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<OsString>,
    },

    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Write a starter config file
    Init {
        #[arg(long)]
        force: bool,
    },

    /// Print the config file location
    Path,
}

/// A century of history is more than any OpenCode install has
const MAX_DAYS: i64 = 36_500;

#[derive(Args, Debug, Clone, Default)]
pub struct SessionFilterArgs {
    /// Only sessions created at or after this instant (RFC 3339 or YYYY-MM-DD)
    #[arg(long, value_parser = parse_since)]
    pub since: Option<DateTime<Utc>>,

    /// Only sessions created in the last N days
    #[arg(long, value_parser = clap::value_parser!(u32).range(..=MAX_DAYS))]
    pub days: Option<u32>,

    /// OpenCode storage directory
    #[arg(long)]
    pub storage_dir: Option<PathBuf>,
}

impl SessionFilterArgs {
    /// The effective cutoff; when both are given the later one wins
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let relative = self.days.map(|d| {
            now.checked_sub_days(Days::new(u64::from(d)))
                .unwrap_or(DateTime::<Utc>::MIN_UTC)
        });
        match (self.since, relative) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct ExportArgs {
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Replace existing session files
    #[arg(long)]
    pub overwrite: bool,

    #[command(flatten)]
    pub filter: SessionFilterArgs,

    /// Count only visible output tokens, not reasoning tokens
    #[arg(long)]
    pub no_reasoning: bool,

    /// Parallel exports (default: from CPU count)
    #[arg(short = 'j', long, value_parser = parse_concurrency)]
    pub concurrency: Option<usize>,

    /// With --overwrite, skip files newer than the session's last update
    #[arg(long)]
    pub incremental: bool,

    #[arg(long)]
    pub skip_validation: bool,

    /// Show what would be written without writing
    #[arg(long)]
    pub dry_run: bool,

    #[arg(long)]
    pub grouping: Option<GroupingStrategy>,

    #[arg(long)]
    pub max_retries: Option<u32>,

    #[arg(long)]
    pub opencode_bin: Option<PathBuf>,

    /// Run `ccusage daily` afterwards
    #[arg(long)]
    pub report: bool,

    #[arg(long)]
    pub ccusage_bin: Option<PathBuf>,
}

fn parse_since(value: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("invalid date '{}' (expected RFC 3339 or YYYY-MM-DD)", value))
}

fn parse_concurrency(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("'{}' is not a positive integer", value)),
    }
}
