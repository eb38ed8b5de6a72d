//! Output cleaning for the response and activity calls.
//!
//! The response model is told not to suggest activities, but sometimes does
//! anyway. [`separate_response_and_activities`] strips that tail with a
//! two-state line scanner; [`clean_activities`] normalizes the activity
//! call's list output.

/// A line containing one of these AND one of [`ACTION_WORDS`] starts the
/// activity section.
pub const SECTION_KEYWORDS: &[&str] = &[
    "activities",
    "suggestions",
    "try these",
    "consider",
    "here are some",
];

pub const ACTION_WORDS: &[&str] = &["help", "try", "do", "practice"];

/// Maximum activities kept per turn.
pub const MAX_ACTIVITIES: usize = 5;

/// Activities must be longer than this many characters.
const MIN_ACTIVITY_CHARS: usize = 10;

/// Scanner state over response lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Still inside the empathetic narrative; non-list lines are kept.
    Narrative,
    /// An activity section header was seen; everything after is dropped.
    Discard,
}

/// What the scanner does with one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineAction {
    Keep,
    Drop,
}

impl ScanState {
    /// Consume one line, returning the next state and what to do with the line.
    pub fn step(self, line: &str) -> (ScanState, LineAction) {
        match self {
            ScanState::Discard => (ScanState::Discard, LineAction::Drop),
            ScanState::Narrative => {
                if is_section_header(line) {
                    (ScanState::Discard, LineAction::Drop)
                } else if is_list_item(line) {
                    (ScanState::Narrative, LineAction::Drop)
                } else {
                    (ScanState::Narrative, LineAction::Keep)
                }
            }
        }
    }
}

fn is_section_header(line: &str) -> bool {
    let lower = line.to_lowercase();
    let lower = lower.trim();
    SECTION_KEYWORDS.iter().any(|k| lower.contains(k))
        && ACTION_WORDS.iter().any(|k| lower.contains(k))
}

/// `•`, `-`, `*`, or `<digits>.` at the start of the trimmed line.
fn is_list_item(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.starts_with(['•', '-', '*']) {
        return true;
    }
    let digits = trimmed.chars().take_while(|c| c.is_ascii_digit()).count();
    digits > 0 && trimmed[digits..].starts_with('.')
}

/// Keep the narrative part of a model response, dropping list items and
/// everything after an activity-section header. Kept lines are verbatim;
/// the joined result is trimmed.
pub fn separate_response_and_activities(raw: &str) -> String {
    let mut state = ScanState::Narrative;
    let mut kept = Vec::new();

    for line in raw.split('\n') {
        let (next, action) = state.step(line);
        if action == LineAction::Keep {
            kept.push(line);
        }
        state = next;
    }

    kept.join("\n").trim().to_string()
}

/// Split the activity call's output into at most five distinct suggestions.
///
/// Each line is trimmed and stripped of its leading run of bullets, digits,
/// dots, and whitespace. Lines of 10 characters or fewer are dropped, as are
/// exact duplicates.
pub fn clean_activities(raw: &str) -> Vec<String> {
    let mut activities: Vec<String> = Vec::new();

    for line in raw.trim().split('\n') {
        let cleaned = line
            .trim()
            .trim_start_matches(|c: char| {
                matches!(c, '•' | '-' | '*' | '.') || c.is_ascii_digit() || c.is_whitespace()
            });

        if cleaned.chars().count() > MIN_ACTIVITY_CHARS
            && !activities.iter().any(|a| a == cleaned)
        {
            activities.push(cleaned.to_string());
        }
    }

    activities.truncate(MAX_ACTIVITIES);
    activities
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_activity_section() {
        let raw = "I hear you.\nHere are some activities that will help you:\n- Breathe\n- Walk";
        assert_eq!(separate_response_and_activities(raw), "I hear you.");
    }

    #[test]
    fn plain_narrative_is_unchanged() {
        let raw = "That sounds really hard.\n\nI'm here with you, and it's okay to feel this way.";
        assert_eq!(separate_response_and_activities(raw), raw);
    }

    #[test]
    fn idempotent_on_clean_text() {
        let raw = "  It makes sense you're upset.\nLosing a friend hurts.  ";
        let once = separate_response_and_activities(raw);
        assert_eq!(separate_response_and_activities(&once), once);
    }

    #[test]
    fn list_lines_dropped_but_narrative_resumes() {
        let raw = "First thought.\n* a bullet\n2. numbered\n• dot\nSecond thought.";
        assert_eq!(
            separate_response_and_activities(raw),
            "First thought.\nSecond thought."
        );
    }

    #[test]
    fn header_needs_both_keyword_groups() {
        // "consider" without any action word stays
        let raw = "Consider how far you've come.\nYou matter.";
        assert_eq!(separate_response_and_activities(raw), raw);
    }

    #[test]
    fn header_rule_is_literal() {
        // "consider" + "do" (inside "doing") is a header even mid-narrative
        let raw = "I'm glad you reached out.\nConsider what you're doing for yourself.\nYou are not alone.";
        assert_eq!(separate_response_and_activities(raw), "I'm glad you reached out.");
    }

    #[test]
    fn number_without_dot_is_narrative() {
        let raw = "2 weeks is a long time to feel this way.";
        assert_eq!(separate_response_and_activities(raw), raw);
    }

    #[test]
    fn state_machine_steps() {
        let (s, a) = ScanState::Narrative.step("You can try these suggestions:");
        assert_eq!((s, a), (ScanState::Discard, LineAction::Drop));
        let (s, a) = s.step("Anything at all");
        assert_eq!((s, a), (ScanState::Discard, LineAction::Drop));
        let (s, a) = ScanState::Narrative.step("- item");
        assert_eq!((s, a), (ScanState::Narrative, LineAction::Drop));
    }

    #[test]
    fn activities_strip_markers() {
        let raw = "Take 5 deep breaths.\n- Go for a walk\n1. Call a friend";
        assert_eq!(
            clean_activities(raw),
            vec!["Take 5 deep breaths.", "Go for a walk", "Call a friend"]
        );
    }

    #[test]
    fn activities_dedup_short_and_cap() {
        let raw = "• Stretch\n\
                   Journal for ten minutes\n\
                   Journal for ten minutes\n\
                   Drink a glass of water\n\
                   Step outside for fresh air\n\
                   Text someone you trust\n\
                   Make a cup of herbal tea\n\
                   Read a chapter of a book";
        let acts = clean_activities(raw);
        assert_eq!(acts.len(), 5);
        assert_eq!(acts[0], "Journal for ten minutes");
        assert!(!acts.contains(&"Stretch".to_string()));
        assert_eq!(acts.iter().filter(|a| *a == "Journal for ten minutes").count(), 1);
    }

    #[test]
    fn activities_leading_numbers_are_stripped_literally() {
        assert_eq!(
            clean_activities("10-minute walk outside today"),
            vec!["minute walk outside today"]
        );
    }

    #[test]
    fn activities_keep_leading_fractions() {
        assert_eq!(
            clean_activities("½ cup of warm tea before bed"),
            vec!["½ cup of warm tea before bed"]
        );
    }

    #[test]
    fn activity_length_threshold() {
        // Exactly ten characters is too short; eleven is kept.
        assert_eq!("Breathe in".chars().count(), 10);
        assert_eq!("Breathe out".chars().count(), 11);
        assert_eq!(clean_activities("- Breathe in\n- Breathe out"), vec!["Breathe out"]);
    }

    #[test]
    fn empty_activity_output() {
        assert!(clean_activities("").is_empty());
        assert!(clean_activities("\n\n  \n").is_empty());
    }
}
