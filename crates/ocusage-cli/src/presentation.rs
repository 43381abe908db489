//! Plain-text rendering for command output.

use ocusage_runtime::ExportOptions;
use ocusage_types::{ExportStats, SessionListItem};
use owo_colors::OwoColorize;
use std::fmt::Write;

struct Palette {
    color: bool,
}

impl Palette {
    fn ok(&self, s: &str) -> String {
        if self.color { s.green().to_string() } else { s.to_string() }
    }

    fn warn(&self, s: &str) -> String {
        if self.color { s.yellow().to_string() } else { s.to_string() }
    }

    fn err(&self, s: &str) -> String {
        if self.color { s.red().to_string() } else { s.to_string() }
    }

    fn bold(&self, s: &str) -> String {
        if self.color { s.bold().to_string() } else { s.to_string() }
    }
}

/// One line for a clean run; the full table when verbose or anything went wrong
pub fn render_export(stats: &ExportStats, options: &ExportOptions, color: bool) -> String {
    let p = Palette { color };
    let dir = options.output_dir.display();

    if stats.sessions_discovered == 0 {
        return "No sessions found.\n".to_string();
    }

    if !options.verbose && !stats.has_errors() && !stats.aborted {
        let verb = if options.dry_run { "Would export" } else { "Exported" };
        return format!(
            "{} {} {} sessions ({} messages) to {}\n",
            p.ok("✓"),
            verb,
            stats.sessions_exported,
            stats.messages_converted,
            dir
        );
    }

    let mut out = String::new();
    let title = if options.dry_run { "Export summary (dry run)" } else { "Export summary" };
    let _ = writeln!(out, "{}", p.bold(title));
    let _ = writeln!(out, "  Output:              {}", dir);
    let _ = writeln!(out, "  Sessions found:      {}", stats.sessions_discovered);
    let _ = writeln!(out, "  Exported:            {}", stats.sessions_exported);
    let _ = writeln!(out, "  Skipped:             {}", stats.sessions_skipped);
    let failed = stats.sessions_failed().to_string();
    let failed = if stats.has_errors() { p.err(&failed) } else { failed };
    let _ = writeln!(out, "  Failed:              {}", failed);
    let _ = writeln!(out, "  Messages converted:  {}", stats.messages_converted);
    let _ = writeln!(out, "  Messages skipped:    {}", stats.messages_skipped);

    if stats.aborted {
        let _ = writeln!(
            out,
            "{}",
            p.warn("Stopped early: error rate too high, remaining sessions were not started")
        );
    }

    if stats.has_errors() {
        let _ = writeln!(out, "{}", p.bold("Errors:"));
        for error in &stats.errors {
            let _ = writeln!(out, "  - {}", error);
        }
    }

    out
}

pub fn render_sessions(sessions: &[SessionListItem]) -> String {
    if sessions.is_empty() {
        return "No sessions found.\n".to_string();
    }

    let mut out = String::new();
    for s in sessions {
        let _ = writeln!(
            out,
            "{}  {}  {}  {}  {}",
            s.id,
            s.created.format("%Y-%m-%d %H:%M"),
            s.project_id,
            s.directory.display(),
            s.display_title()
        );
    }
    out
}
