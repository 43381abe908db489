use serde::Serialize;

/// Serialize records as JSON Lines: one compact object per line, each
/// newline-terminated. No records means an empty string.
pub fn to_jsonl<T: Serialize>(records: &[T]) -> serde_json::Result<String> {
    let mut out = String::new();
    for record in records {
        out.push_str(&serde_json::to_string(record)?);
        out.push('\n');
    }
    Ok(out)
}
