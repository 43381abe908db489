use ocusage_types::SessionExport;
use std::future::Future;
use std::path::Path;
use std::time::Duration;

use crate::{ExportError, SessionExporter};

pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

const WARN_ERROR_LEN: usize = 200;
const WARN_STDERR_LEN: usize = 500;

/// Bounded retry: `max_retries` extra attempts with a fixed delay in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Run `op` until it succeeds, attempts run out, or it fails with an
    /// error `is_retryable` rejects. Returns the last error with the number
    /// of attempts made.
    pub async fn run<T, E, F, Fut>(
        &self,
        mut op: F,
        is_retryable: impl Fn(&E) -> bool,
    ) -> Result<T, (E, u32)>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) if attempt >= self.max_attempts() || !is_retryable(&err) => {
                    return Err((err, attempt));
                }
                Err(_) => {
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Export a session, retrying per `policy`.
///
/// Exhaustion is not an error: it logs a warning and returns `None`, so the
/// caller can count the session as failed and move on.
pub async fn export_session_with_retry<E: SessionExporter>(
    exporter: &E,
    session_id: &str,
    directory: &Path,
    policy: &RetryPolicy,
) -> Option<SessionExport> {
    let result = policy
        .run(
            |attempt| {
                if attempt > 1 {
                    tracing::debug!(session_id, attempt, "Retrying session export");
                }
                exporter.export(session_id, directory)
            },
            ExportError::is_retryable,
        )
        .await;

    match result {
        Ok(export) => Some(export),
        Err((err, attempts)) => {
            let error = truncate(&err.to_string(), WARN_ERROR_LEN);
            match err.stderr() {
                Some(stderr) => tracing::warn!(
                    session_id,
                    attempts,
                    error = %error,
                    stderr = %truncate(stderr, WARN_STDERR_LEN),
                    "Session export failed"
                ),
                None => tracing::warn!(session_id, attempts, error = %error, "Session export failed"),
            }
            None
        }
    }
}

/// Shorten to at most `max_chars` characters, marking the cut with `...`
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept)
}
