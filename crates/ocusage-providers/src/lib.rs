// Error types
pub mod error;

// Raw OpenCode JSON schemas and boundary validation
pub mod schema;

// Session discovery in OpenCode storage
pub mod storage;

// `opencode export` subprocess adapter
pub mod exporter;

// Bounded retry policy
pub mod retry;

pub use error::{Error, ExportError, Result};
pub use exporter::{OpenCodeExporter, SessionExporter, parse_export_output};
pub use retry::{RetryPolicy, export_session_with_retry, truncate};
pub use storage::{list_sessions, list_sessions_in};
