pub mod config;
pub mod error;
pub mod ops;
pub mod output;

pub use config::{Config, ExportOptions};
pub use error::{Error, Result};
pub use ops::{
    DRY_RUN_TARGET, ExportService, MAX_ERROR_RATE, MIN_ERROR_SAMPLE, resolve_concurrency,
    run_export, run_report,
};
pub use output::{group_subdir, session_output_dir, session_output_path};

// Discovery is used directly by the CLI's `sessions` command
pub use ocusage_providers::{OpenCodeExporter, RetryPolicy, SessionExporter, list_sessions};
