mod export;
mod grouping;
mod output;
mod session;
mod stats;

pub use export::{CacheTokens, Message, MessagePath, Role, SessionExport, TokenCounts};
pub use grouping::{DirectoryHash, GroupingStrategy};
pub use output::{OutputLine, OutputMessage, OutputUsage, TOOL_NAME, UNKNOWN_MODEL};
pub use session::SessionListItem;
pub use stats::ExportStats;
