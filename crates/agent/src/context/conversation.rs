//! Conversation window rendering.

use heartline_core::message::Turn;

/// Turns rendered into classifier and response prompts by default.
pub const DEFAULT_HISTORY_TURNS: usize = 10;

/// Per-turn content limit in rendered history, in characters.
pub const TURN_CHAR_LIMIT: usize = 200;

/// The first `max_chars` characters of `s`. Never splits a code point.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Render the last `max_turns` turns as `"User: ..."` / `"Assistant: ..."`
/// lines. Content over 200 characters is cut and suffixed with `"..."`.
pub fn render_history(turns: &[Turn], max_turns: usize) -> String {
    let start = turns.len().saturating_sub(max_turns);
    turns[start..]
        .iter()
        .map(|turn| {
            let content = if turn.content.chars().count() > TURN_CHAR_LIMIT {
                format!("{}...", truncate_chars(&turn.content, TURN_CHAR_LIMIT))
            } else {
                turn.content.clone()
            };
            format!("{}: {}", turn.role.label(), content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_log_renders_empty() {
        assert_eq!(render_history(&[], 10), "");
    }

    #[test]
    fn renders_role_labels_in_order() {
        let turns = vec![
            Turn::user("I've been so tired lately"),
            Turn::assistant("That sounds exhausting."),
        ];
        assert_eq!(
            render_history(&turns, 10),
            "User: I've been so tired lately\nAssistant: That sounds exhausting."
        );
    }

    #[test]
    fn keeps_only_last_window() {
        let turns: Vec<Turn> = (0..15).map(|i| Turn::user(format!("m{i}"))).collect();
        let rendered = render_history(&turns, 10);
        let lines: Vec<_> = rendered.lines().collect();
        assert_eq!(lines.len(), 10);
        assert_eq!(lines[0], "User: m5");
        assert_eq!(lines[9], "User: m14");
    }

    #[test]
    fn long_content_truncated_with_ellipsis() {
        let long = "a".repeat(250);
        let rendered = render_history(&[Turn::user(long)], 10);
        let content = rendered.strip_prefix("User: ").unwrap();
        assert_eq!(content.chars().count(), 203);
        assert!(content.ends_with("..."));
    }

    #[test]
    fn exactly_limit_is_untouched() {
        let exact = "b".repeat(200);
        let rendered = render_history(&[Turn::assistant(exact.clone())], 10);
        assert_eq!(rendered, format!("Assistant: {exact}"));
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let s = "é".repeat(201);
        let rendered = render_history(&[Turn::user(s)], 10);
        let content = rendered.strip_prefix("User: ").unwrap();
        assert_eq!(content.chars().count(), 203);
        assert!(content.starts_with("éé"));
    }

    #[test]
    fn truncate_chars_short_input() {
        assert_eq!(truncate_chars("abc", 100), "abc");
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("", 3), "");
    }
}
