use chrono::{DateTime, Utc};
use futures::FutureExt;
use ocusage_engine::{ConvertOptions, convert_session};
use ocusage_providers::{OpenCodeExporter, SessionExporter, export_session_with_retry};
use ocusage_types::{ExportStats, SessionListItem};
use std::any::Any;
use std::collections::BTreeSet;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::output::{session_output_dir, session_output_path, write_session_file};
use crate::{Error, ExportOptions, Result};

/// Sessions that must finish before the error rate is trusted
pub const MIN_ERROR_SAMPLE: usize = 10;

/// Failed / processed ratio above which no new sessions are started
pub const MAX_ERROR_RATE: f64 = 0.25;

/// Tracing target for dry-run write descriptions
pub const DRY_RUN_TARGET: &str = "ocusage::dry_run";

const MIN_AUTO_CONCURRENCY: usize = 8;
const MAX_AUTO_CONCURRENCY: usize = 32;

const OPENCODE_HINT: &str = "Install OpenCode (https://opencode.ai) \
    or point --opencode-bin / OCUSAGE_OPENCODE_BIN at the executable";

/// Export with the real `opencode` executable
pub async fn run_export(options: &ExportOptions) -> Result<ExportStats> {
    let exporter = OpenCodeExporter::new(&options.opencode_bin)
        .with_validation(!options.skip_validation);
    ExportService::new(exporter, options.clone()).run().await
}

/// Explicit positive value (capped at what a semaphore can hold), else twice
/// the CPU count within [8, 32].
///
/// Export is bound by subprocess I/O, so running more tasks than cores pays
/// off; the ceiling keeps opencode and the filesystem from being swamped.
pub fn resolve_concurrency(requested: Option<usize>) -> usize {
    match requested {
        Some(n) if n > 0 => n.min(Semaphore::MAX_PERMITS),
        _ => {
            let cpus = std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1);
            (cpus * 2).clamp(MIN_AUTO_CONCURRENCY, MAX_AUTO_CONCURRENCY)
        }
    }
}

/// Discovery → bounded parallel export → convert → write
pub struct ExportService<E> {
    exporter: Arc<E>,
    options: Arc<ExportOptions>,
}

impl<E: SessionExporter> ExportService<E> {
    pub fn new(exporter: E, options: ExportOptions) -> Self {
        Self {
            exporter: Arc::new(exporter),
            options: Arc::new(options),
        }
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Full run: preflight, discovery, export
    pub async fn run(&self) -> Result<ExportStats> {
        let version = self.preflight().await?;
        tracing::debug!(version = %version, "Export tool available");

        let sessions = ocusage_providers::list_sessions(
            self.options.since,
            self.options.storage_root.as_deref(),
        )
        .await?;

        self.export_sessions(sessions).await
    }

    /// The one fatal precondition: the export tool must answer `--version`
    pub async fn preflight(&self) -> Result<String> {
        self.exporter
            .probe()
            .await
            .map_err(|err| Error::ToolUnavailable {
                program: self.options.opencode_bin.display().to_string(),
                reason: err.to_string(),
                hint: OPENCODE_HINT,
            })
    }

    /// Export already discovered sessions.
    ///
    /// Permits are taken in discovery order before a task starts, and the
    /// abort flag is checked right after; tasks already running when it
    /// trips are left to finish.
    pub async fn export_sessions(&self, sessions: Vec<SessionListItem>) -> Result<ExportStats> {
        let mut stats = ExportStats {
            sessions_discovered: sessions.len(),
            ..Default::default()
        };
        if sessions.is_empty() {
            return Ok(stats);
        }

        let concurrency = resolve_concurrency(self.options.concurrency).min(sessions.len());
        tracing::debug!(sessions = sessions.len(), concurrency, "Starting export");

        if !self.options.dry_run {
            self.prepare_output_dirs(&sessions).await?;
        }

        let semaphore = Arc::new(Semaphore::new(concurrency));
        let tally = Arc::new(BatchTally::default());
        let mut scheduled = Vec::with_capacity(sessions.len());

        for session in sessions {
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|err| Error::InvalidOperation(err.to_string()))?;

            if tally.is_aborted() {
                scheduled.push((
                    session.id,
                    Scheduled::Done(SessionOutcome::Skipped {
                        reason: SkipReason::Aborted,
                        messages_skipped: 0,
                    }),
                ));
                continue;
            }

            let job = SessionJob {
                exporter: Arc::clone(&self.exporter),
                options: Arc::clone(&self.options),
            };
            let task_tally = Arc::clone(&tally);
            let id = session.id.clone();
            let handle = tokio::spawn(async move {
                let outcome = AssertUnwindSafe(job.process(&session))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|panic| {
                        SessionOutcome::Failed(format!(
                            "Session {}: task panicked: {}",
                            session.id,
                            panic_message(panic.as_ref())
                        ))
                    });
                task_tally.record(outcome.is_failure());
                // Released only after the tally saw this outcome
                drop(permit);
                outcome
            });
            scheduled.push((id, Scheduled::Running(handle)));
        }

        for (session_id, entry) in scheduled {
            let outcome = match entry {
                Scheduled::Done(outcome) => outcome,
                Scheduled::Running(handle) => handle.await.unwrap_or_else(|err| {
                    SessionOutcome::Failed(format!("Session {}: task failed: {}", session_id, err))
                }),
            };
            outcome.apply_to(&session_id, &mut stats);
        }

        stats.aborted = tally.is_aborted();
        Ok(stats)
    }

    /// Create every output directory up front so concurrent tasks never race on mkdir
    async fn prepare_output_dirs(&self, sessions: &[SessionListItem]) -> Result<()> {
        let dirs: BTreeSet<_> = sessions
            .iter()
            .map(|s| session_output_dir(&self.options.output_dir, s, self.options.grouping))
            .collect();

        for dir in dirs {
            tokio::fs::create_dir_all(&dir).await?;
        }
        Ok(())
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

enum Scheduled {
    Done(SessionOutcome),
    Running(JoinHandle<SessionOutcome>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SkipReason {
    Exists,
    UpToDate,
    NoBillableMessages,
    Aborted,
}

#[derive(Debug)]
enum SessionOutcome {
    Exported {
        messages_converted: usize,
        messages_skipped: usize,
    },
    Skipped {
        reason: SkipReason,
        messages_skipped: usize,
    },
    Failed(String),
}

impl SessionOutcome {
    fn is_failure(&self) -> bool {
        matches!(self, SessionOutcome::Failed(_))
    }

    fn apply_to(self, session_id: &str, stats: &mut ExportStats) {
        match self {
            SessionOutcome::Exported {
                messages_converted,
                messages_skipped,
            } => {
                stats.sessions_exported += 1;
                stats.messages_converted += messages_converted;
                stats.messages_skipped += messages_skipped;
            }
            SessionOutcome::Skipped {
                reason,
                messages_skipped,
            } => {
                tracing::debug!(session_id, ?reason, "Skipped session");
                stats.sessions_skipped += 1;
                stats.messages_skipped += messages_skipped;
            }
            SessionOutcome::Failed(error) => stats.errors.push(error),
        }
    }
}

/// Per-session work, owned by one spawned task
struct SessionJob<E> {
    exporter: Arc<E>,
    options: Arc<ExportOptions>,
}

impl<E: SessionExporter> SessionJob<E> {
    async fn process(&self, session: &SessionListItem) -> SessionOutcome {
        let options = &self.options;
        let path = session_output_path(&options.output_dir, session, options.grouping);

        if let Some(reason) = self.skip_reason(session, &path).await {
            return SessionOutcome::Skipped {
                reason,
                messages_skipped: 0,
            };
        }

        let Some(export) = export_session_with_retry(
            self.exporter.as_ref(),
            &session.id,
            &session.directory,
            &options.retry,
        )
        .await
        else {
            return SessionOutcome::Failed(format!(
                "Session {} ({}): export failed",
                session.id,
                session.directory.display()
            ));
        };

        let conversion = convert_session(
            &export,
            &ConvertOptions {
                include_reasoning_in_output: options.include_reasoning_in_output,
            },
        );

        if conversion.lines.is_empty() {
            return SessionOutcome::Skipped {
                reason: SkipReason::NoBillableMessages,
                messages_skipped: conversion.skipped,
            };
        }

        if options.dry_run {
            tracing::info!(
                target: DRY_RUN_TARGET,
                session_id = %session.id,
                path = %path.display(),
                lines = conversion.lines.len(),
                "Would write session file"
            );
        } else if let Err(err) = write_session_file(&path, &conversion.lines).await {
            return SessionOutcome::Failed(format!(
                "Session {}: failed to write {}: {}",
                session.id,
                path.display(),
                err
            ));
        }

        tracing::debug!(
            session_id = %session.id,
            lines = conversion.lines.len(),
            skipped = conversion.skipped,
            "Exported session"
        );
        SessionOutcome::Exported {
            messages_converted: conversion.lines.len(),
            messages_skipped: conversion.skipped,
        }
    }

    /// Cheap checks that avoid spawning the exporter at all
    async fn skip_reason(&self, session: &SessionListItem, path: &Path) -> Option<SkipReason> {
        let metadata = tokio::fs::metadata(path).await.ok()?;

        if !self.options.overwrite {
            return Some(SkipReason::Exists);
        }

        if self.options.incremental {
            let modified: DateTime<Utc> = metadata.modified().ok()?.into();
            if modified >= session.updated {
                return Some(SkipReason::UpToDate);
            }
        }

        None
    }
}

/// Shared between session tasks: completion counts and the abort flag
#[derive(Default)]
struct BatchTally {
    counts: Mutex<TallyCounts>,
    aborted: AtomicBool,
}

#[derive(Default)]
struct TallyCounts {
    processed: usize,
    failed: usize,
}

impl BatchTally {
    fn record(&self, failed: bool) {
        let mut counts = self.counts.lock().unwrap_or_else(|e| e.into_inner());
        counts.processed += 1;
        if failed {
            counts.failed += 1;
        }

        if should_abort(counts.processed, counts.failed) && !self.aborted.swap(true, Ordering::SeqCst)
        {
            tracing::warn!(
                processed = counts.processed,
                failed = counts.failed,
                error_rate = %format!("{:.0}%", error_rate(counts.processed, counts.failed) * 100.0),
                "Error rate too high; remaining sessions will not be started"
            );
        }
    }

    fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }
}

fn error_rate(processed: usize, failed: usize) -> f64 {
    if processed == 0 {
        0.0
    } else {
        failed as f64 / processed as f64
    }
}

fn should_abort(processed: usize, failed: usize) -> bool {
    processed >= MIN_ERROR_SAMPLE && error_rate(processed, failed) > MAX_ERROR_RATE
}
