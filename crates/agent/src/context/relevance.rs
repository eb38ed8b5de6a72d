//! Token-overlap relevance filter over the session's context buffer.
//!
//! This is deliberately a cheap lexical pass, separate from the embedding
//! search over the exemplar corpus: it resurfaces earlier turns of *this*
//! conversation that share the detected emotion or a content word with the
//! current message.

use super::conversation::truncate_chars;
use heartline_core::session::{ContextBuffer, ContextEntry};

/// How many trailing entries are scanned.
pub const SCAN_WINDOW: usize = 10;

/// How many matches are rendered (the most recent ones).
pub const MAX_MATCHES: usize = 3;

/// Characters kept from each side of a rendered match.
pub const PREVIEW_CHARS: usize = 100;

/// Query tokens must be longer than this to count as a content word.
const MIN_TOKEN_CHARS: usize = 3;

/// Render the earlier turns relevant to `query` and `emotion`, one per line.
///
/// An entry matches when its emotion equals `emotion`, or when any
/// whitespace token of the lowercased query longer than 3 characters is a
/// substring of its lowercased user message. Returns `""` when nothing matches.
pub fn relevant(query: &str, emotion: &str, buffer: &ContextBuffer) -> String {
    let query_lower = query.to_lowercase();
    let tokens: Vec<&str> = query_lower
        .split_whitespace()
        .filter(|w| w.chars().count() > MIN_TOKEN_CHARS)
        .collect();

    let matches: Vec<String> = buffer
        .last_n(SCAN_WINDOW)
        .filter(|entry| is_match(entry, emotion, &tokens))
        .map(render_entry)
        .collect();

    let start = matches.len().saturating_sub(MAX_MATCHES);
    matches[start..].join("\n")
}

fn is_match(entry: &ContextEntry, emotion: &str, tokens: &[&str]) -> bool {
    if entry.emotion == emotion {
        return true;
    }
    let message = entry.user_message.to_lowercase();
    tokens.iter().any(|t| message.contains(t))
}

fn render_entry(entry: &ContextEntry) -> String {
    format!(
        "Previous: {}... -> {}...",
        truncate_chars(&entry.user_message, PREVIEW_CHARS),
        truncate_chars(&entry.bot_response, PREVIEW_CHARS)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(message: &str, emotion: &str) -> ContextEntry {
        ContextEntry::new(message, format!("reply to {message}"), emotion, "Some Issue")
    }

    #[test]
    fn empty_buffer_is_empty() {
        assert_eq!(relevant("anything at all", "sad", &ContextBuffer::new()), "");
    }

    #[test]
    fn single_emotion_match_among_five() {
        let mut buf = ContextBuffer::new();
        buf.push(entry("I love gardening", "joyful"));
        buf.push(entry("My cat is sick", "sad"));
        buf.push(entry("The exam went fine", "content"));
        buf.push(entry("Deadlines everywhere", "anxiety"));
        buf.push(entry("Had pizza tonight", "content"));

        let out = relevant("feeling anxious about work", "anxiety", &buf);
        assert_eq!(out.lines().count(), 1);
        assert_eq!(
            out,
            "Previous: Deadlines everywhere... -> reply to Deadlines everywhere..."
        );
    }

    #[test]
    fn keyword_overlap_matches_substring() {
        let mut buf = ContextBuffer::new();
        buf.push(entry("My boss keeps piling on WORKLOAD", "angry"));
        let out = relevant("so much work today", "sad", &buf);
        assert!(out.starts_with("Previous: My boss keeps piling on WORKLOAD..."));
    }

    #[test]
    fn short_tokens_ignored() {
        let mut buf = ContextBuffer::new();
        buf.push(entry("I am so sad and the day was bad", "sad"));
        // every query token has <= 3 characters, and emotion differs
        assert_eq!(relevant("I am so bad", "joyful", &buf), "");
    }

    #[test]
    fn keeps_last_three_matches_in_buffer_order() {
        let mut buf = ContextBuffer::new();
        for i in 0..6 {
            buf.push(entry(&format!("turn {i}"), "lonely"));
        }
        let out = relevant("hello", "lonely", &buf);
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Previous: turn 3..."));
        assert!(lines[2].starts_with("Previous: turn 5..."));
    }

    #[test]
    fn only_last_ten_entries_scanned() {
        let mut buf = ContextBuffer::new();
        buf.push(entry("remember the hiking trip", "nostalgic"));
        for i in 0..10 {
            buf.push(entry(&format!("filler {i}"), "neutral"));
        }
        assert_eq!(relevant("that hiking trip", "happy", &buf), "");
    }

    #[test]
    fn previews_capped_at_hundred_chars() {
        let mut buf = ContextBuffer::new();
        let long = "x".repeat(150);
        buf.push(ContextEntry::new(long.clone(), long, "sad", "Grief"));
        let out = relevant("q", "sad", &buf);
        let expected = format!("Previous: {}... -> {}...", "x".repeat(100), "x".repeat(100));
        assert_eq!(out, expected);
    }
}
