use chrono::SecondsFormat;
use ocusage_types::{
    Message, OutputLine, OutputMessage, OutputUsage, SessionExport, UNKNOWN_MODEL,
};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Count reasoning tokens as output tokens
    pub include_reasoning_in_output: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            include_reasoning_in_output: true,
        }
    }
}

/// Result of converting one session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversion {
    pub lines: Vec<OutputLine>,
    /// Messages rejected by any filter
    pub skipped: usize,
}

/// Convert a session export into usage lines.
///
/// Keeps assistant messages with billable tokens and a usable timestamp,
/// drops repeats of the same (message id, timestamp) pair, and returns the
/// lines in timestamp order.
pub fn convert_session(export: &SessionExport, options: &ConvertOptions) -> Conversion {
    let mut seen: HashSet<(&str, String)> = HashSet::new();
    let mut lines = Vec::new();
    let mut skipped = 0;

    for message in &export.messages {
        let Some((line, timestamp)) = convert_message(&export.id, message, options) else {
            skipped += 1;
            continue;
        };

        if !seen.insert((message.id.as_str(), timestamp)) {
            skipped += 1;
            continue;
        }

        lines.push(line);
    }

    // Fixed-width ISO timestamps sort correctly as strings; sort_by is stable
    lines.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

    Conversion { lines, skipped }
}

fn convert_message(
    session_id: &str,
    message: &Message,
    options: &ConvertOptions,
) -> Option<(OutputLine, String)> {
    if !message.role.is_assistant() {
        return None;
    }

    let tokens = message.tokens.filter(|t| t.is_billable())?;
    let timestamp = message
        .effective_time()?
        .to_rfc3339_opts(SecondsFormat::Millis, true);

    let output_tokens = if options.include_reasoning_in_output {
        tokens.output.saturating_add(tokens.reasoning)
    } else {
        tokens.output
    };

    let line = OutputLine {
        timestamp: timestamp.clone(),
        session_id: session_id.to_string(),
        cwd: message.cwd().map(str::to_string),
        request_id: OutputLine::request_id(session_id, &message.id),
        message: OutputMessage {
            id: message.id.clone(),
            model: message
                .model_id
                .clone()
                .unwrap_or_else(|| UNKNOWN_MODEL.to_string()),
            usage: OutputUsage {
                input_tokens: tokens.input,
                output_tokens,
                cache_read_input_tokens: positive(tokens.cache.read),
                cache_creation_input_tokens: positive(tokens.cache.write),
            },
        },
    };

    Some((line, timestamp))
}

fn positive(value: u64) -> Option<u64> {
    (value > 0).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use ocusage_types::{CacheTokens, MessagePath, Role, TokenCounts};
    use std::path::PathBuf;

    const T0: i64 = 1_736_000_000_000;

    fn tokens(input: u64, output: u64, reasoning: u64, read: u64, write: u64) -> TokenCounts {
        TokenCounts {
            input,
            output,
            reasoning,
            cache: CacheTokens { read, write },
        }
    }

    fn assistant(id: &str, offset_ms: i64, tokens: TokenCounts) -> Message {
        Message {
            id: id.to_string(),
            session_id: "ses_1".to_string(),
            role: Role::Assistant,
            created: DateTime::from_timestamp_millis(T0 + offset_ms - 500),
            completed: DateTime::from_timestamp_millis(T0 + offset_ms),
            model_id: Some("claude-sonnet-4".to_string()),
            tokens: Some(tokens),
            path: Some(MessagePath {
                cwd: PathBuf::from("/work/app"),
                root: Some(PathBuf::from("/work/app")),
            }),
        }
    }

    fn user(id: &str, offset_ms: i64) -> Message {
        Message {
            role: Role::User,
            tokens: Some(tokens(100, 0, 0, 0, 0)),
            model_id: None,
            ..assistant(id, offset_ms, TokenCounts::default())
        }
    }

    fn export(messages: Vec<Message>) -> SessionExport {
        SessionExport {
            id: "ses_1".to_string(),
            messages,
        }
    }

    #[test]
    fn test_end_to_end_mixed_session() {
        let session = export(vec![
            user("msg_u1", 0),
            assistant("msg_a1", 1_000, tokens(1200, 300, 50, 0, 0)),
            assistant("msg_a2", 2_000, tokens(0, 0, 0, 0, 0)),
            assistant("msg_a3", 3_000, tokens(0, 0, 0, 0, 15000)),
            user("msg_u2", 3_500),
            assistant("msg_a4", 4_000, tokens(800, 120, 0, 4000, 0)),
            assistant("msg_a5", 5_000, tokens(10, 5, 0, 0, 0)),
            assistant("msg_a6", 6_000, tokens(20, 7, 3, 100, 200)),
        ]);

        let result = convert_session(&session, &ConvertOptions::default());

        assert_eq!(result.lines.len(), 5);
        assert_eq!(result.skipped, 3);

        let cache_only = result
            .lines
            .iter()
            .find(|l| l.message.id == "msg_a3")
            .unwrap();
        assert_eq!(cache_only.message.usage.input_tokens, 0);
        assert_eq!(cache_only.message.usage.output_tokens, 0);
        assert_eq!(cache_only.message.usage.cache_creation_input_tokens, Some(15000));
        assert_eq!(cache_only.message.usage.cache_read_input_tokens, None);
    }

    #[test]
    fn test_user_messages_never_converted() {
        let session = export(vec![user("msg_u1", 0), user("msg_u2", 10)]);
        let result = convert_session(&session, &ConvertOptions::default());
        assert!(result.lines.is_empty());
        assert_eq!(result.skipped, 2);
    }

    #[test]
    fn test_missing_tokens_or_timestamp_is_skipped() {
        let mut no_tokens = assistant("msg_1", 0, TokenCounts::default());
        no_tokens.tokens = None;
        let mut no_time = assistant("msg_2", 0, tokens(1, 1, 0, 0, 0));
        no_time.created = None;
        no_time.completed = None;

        let result = convert_session(&export(vec![no_tokens, no_time]), &ConvertOptions::default());
        assert!(result.lines.is_empty());
        assert_eq!(result.skipped, 2);
    }

    #[test]
    fn test_duplicate_id_and_timestamp_keeps_first() {
        let first = assistant("msg_1", 1_000, tokens(10, 1, 0, 0, 0));
        let duplicate = assistant("msg_1", 1_000, tokens(99, 99, 0, 0, 0));
        let same_id_later = assistant("msg_1", 2_000, tokens(5, 5, 0, 0, 0));

        let result = convert_session(
            &export(vec![first, duplicate, same_id_later]),
            &ConvertOptions::default(),
        );

        assert_eq!(result.lines.len(), 2);
        assert_eq!(result.skipped, 1);
        assert_eq!(result.lines[0].message.usage.input_tokens, 10);
    }

    #[test]
    fn test_reasoning_toggle() {
        let session = export(vec![assistant("msg_1", 0, tokens(10, 100, 40, 0, 0))]);

        let with = convert_session(&session, &ConvertOptions { include_reasoning_in_output: true });
        assert_eq!(with.lines[0].message.usage.output_tokens, 140);

        let without = convert_session(&session, &ConvertOptions { include_reasoning_in_output: false });
        assert_eq!(without.lines[0].message.usage.output_tokens, 100);
    }

    #[test]
    fn test_reasoning_sum_saturates() {
        let session = export(vec![assistant("msg_1", 0, tokens(1, u64::MAX, 1, 0, 0))]);
        let result = convert_session(&session, &ConvertOptions::default());
        assert_eq!(result.lines[0].message.usage.output_tokens, u64::MAX);
    }

    #[test]
    fn test_reasoning_only_message_is_billable() {
        let session = export(vec![assistant("msg_1", 0, tokens(0, 0, 25, 0, 0))]);
        let result = convert_session(&session, &ConvertOptions { include_reasoning_in_output: false });
        assert_eq!(result.lines.len(), 1);
        assert_eq!(result.lines[0].message.usage.output_tokens, 0);
    }

    #[test]
    fn test_lines_sorted_by_timestamp_and_creation_fallback() {
        let mut late = assistant("msg_late", 9_000, tokens(1, 1, 0, 0, 0));
        late.completed = None;
        let early = assistant("msg_early", 1_000, tokens(1, 1, 0, 0, 0));

        let result = convert_session(&export(vec![late, early]), &ConvertOptions::default());
        let ids: Vec<_> = result.lines.iter().map(|l| l.message.id.as_str()).collect();
        assert_eq!(ids, ["msg_early", "msg_late"]);

        // Falls back to created (completion minus 500ms in the fixture)
        let expected = DateTime::from_timestamp_millis(T0 + 8_500)
            .unwrap()
            .to_rfc3339_opts(SecondsFormat::Millis, true);
        assert_eq!(result.lines[1].timestamp, expected);
    }

    #[test]
    fn test_missing_model_and_cwd() {
        let mut msg = assistant("msg_1", 0, tokens(1, 1, 0, 0, 0));
        msg.model_id = None;
        msg.path = None;

        let result = convert_session(&export(vec![msg]), &ConvertOptions::default());
        let line = &result.lines[0];
        assert_eq!(line.message.model, "unknown");
        assert_eq!(line.cwd, None);
        assert_eq!(line.request_id, "opencode:ses_1:msg_1");
    }

    #[test]
    fn test_timestamp_format() {
        let session = export(vec![assistant("msg_1", 0, tokens(1, 1, 0, 0, 0))]);
        let result = convert_session(&session, &ConvertOptions::default());
        insta::assert_snapshot!(result.lines[0].timestamp, @"2025-01-04T14:13:20.000Z");
    }
}
