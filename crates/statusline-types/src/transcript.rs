//! Best-effort view over one line of the assistant's JSONL transcript.
//!
//! Transcript lines are written by another program and their schema drifts, so nothing here
//! fails on a missing or mistyped field; accessors just return `None` or zero.

use serde_json::Value;

/// Token counts that occupy the context window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub cache_read_input_tokens: u64,
    pub cache_creation_input_tokens: u64,
}

impl TokenUsage {
    /// Total tokens currently held in the context window.
    pub fn context_tokens(&self) -> u64 {
        self.input_tokens
            .saturating_add(self.cache_read_input_tokens)
            .saturating_add(self.cache_creation_input_tokens)
    }
}

/// One parsed transcript record.
#[derive(Debug, Clone)]
pub struct TranscriptLine {
    value: Value,
}

impl TranscriptLine {
    /// Parse a raw line. Blank lines and invalid JSON yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        serde_json::from_str::<Value>(line)
            .ok()
            .filter(Value::is_object)
            .map(|value| Self { value })
    }

    /// Records produced by nested agent or tool activity.
    pub fn is_sidechain(&self) -> bool {
        self.value
            .get("isSidechain")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn session_id(&self) -> Option<&str> {
        self.value.get("sessionId").and_then(Value::as_str)
    }

    pub fn entry_type(&self) -> Option<&str> {
        self.value.get("type").and_then(Value::as_str)
    }

    pub fn role(&self) -> Option<&str> {
        self.message()?.get("role").and_then(Value::as_str)
    }

    /// Message content, only when it is a plain string.
    pub fn content_text(&self) -> Option<&str> {
        self.message()?.get("content").and_then(Value::as_str)
    }

    /// Usage block of the message, if the record carries one.
    pub fn usage(&self) -> Option<TokenUsage> {
        let usage = self.message()?.get("usage")?.as_object()?;
        let field = |name: &str| usage.get(name).map(token_count).unwrap_or(0);

        Some(TokenUsage {
            input_tokens: field("input_tokens"),
            cache_read_input_tokens: field("cache_read_input_tokens"),
            cache_creation_input_tokens: field("cache_creation_input_tokens"),
        })
    }

    fn message(&self) -> Option<&Value> {
        self.value.get("message").filter(|m| m.is_object())
    }
}

/// Non-numeric and negative values count as zero.
fn token_count(value: &Value) -> u64 {
    value
        .as_u64()
        .or_else(|| {
            value
                .as_f64()
                .filter(|n| n.is_finite() && *n > 0.0)
                .map(|n| n as u64)
        })
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_blank_and_invalid() {
        assert!(TranscriptLine::parse("").is_none());
        assert!(TranscriptLine::parse("   ").is_none());
        assert!(TranscriptLine::parse("{not json").is_none());
        assert!(TranscriptLine::parse("[1,2,3]").is_none());
    }

    #[test]
    fn test_user_record_accessors() {
        let line = TranscriptLine::parse(
            r#"{"type":"user","sessionId":"s1","isSidechain":false,"message":{"role":"user","content":"fix the tests"}}"#,
        )
        .unwrap();

        assert_eq!(line.entry_type(), Some("user"));
        assert_eq!(line.session_id(), Some("s1"));
        assert_eq!(line.role(), Some("user"));
        assert_eq!(line.content_text(), Some("fix the tests"));
        assert!(!line.is_sidechain());
        assert!(line.usage().is_none());
    }

    #[test]
    fn test_usage_tolerates_mistyped_fields() {
        let line = TranscriptLine::parse(
            r#"{"message":{"usage":{"input_tokens":120,"cache_read_input_tokens":"lots","cache_creation_input_tokens":30.0,"output_tokens":999}}}"#,
        )
        .unwrap();

        let usage = line.usage().unwrap();
        assert_eq!(usage.input_tokens, 120);
        assert_eq!(usage.cache_read_input_tokens, 0);
        assert_eq!(usage.cache_creation_input_tokens, 30);
        assert_eq!(usage.context_tokens(), 150);
    }

    #[test]
    fn test_mistyped_structure_reads_as_absent() {
        let line = TranscriptLine::parse(
            r#"{"isSidechain":"yes","sessionId":7,"message":"flat string"}"#,
        )
        .unwrap();

        assert!(!line.is_sidechain());
        assert!(line.session_id().is_none());
        assert!(line.role().is_none());
        assert!(line.usage().is_none());
    }

    #[test]
    fn test_array_content_is_not_text() {
        let line = TranscriptLine::parse(
            r#"{"message":{"role":"user","content":[{"type":"tool_result","content":"ok"}]}}"#,
        )
        .unwrap();
        assert!(line.content_text().is_none());
    }
}
