pub mod export;
pub mod report;

pub use export::{
    DRY_RUN_TARGET, ExportService, MAX_ERROR_RATE, MIN_ERROR_SAMPLE, resolve_concurrency,
    run_export,
};
pub use report::run_report;
