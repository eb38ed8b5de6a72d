//! Issue labelling via one constrained generation call.

use std::sync::Arc;

use heartline_core::generation::Generator;
use tracing::{debug, warn};

use super::{Classification, ClassificationFallback};
use crate::context::prompt::issue_prompt;

/// Longest issue answer accepted before the emotion-based replacement.
pub const MAX_ISSUE_CHARS: usize = 25;

/// Upper-case the first cased character of every run of cased characters and
/// lower-case the rest. Apostrophes and digits break runs, so `"it's"`
/// becomes `"It'S"`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_cased = false;

    for c in s.chars() {
        let cased = c.is_uppercase() || c.is_lowercase();
        if cased && !prev_cased {
            out.extend(c.to_uppercase());
        } else if cased {
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
        prev_cased = cased;
    }

    out
}

/// Strip surrounding quotes, dashes and whitespace from a model answer.
fn strip_answer(raw: &str) -> &str {
    raw.trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '-' || c.is_whitespace())
}

/// Names the concern behind a message in 2-4 words.
pub struct IssueClassifier {
    generator: Arc<dyn Generator>,
}

impl IssueClassifier {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }

    pub async fn classify(&self, emotion: &str, message: &str, history: &str) -> Classification {
        let prompt = issue_prompt(emotion, message, history);

        let answer = match self.generator.generate("issue", &prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, emotion, "issue generation failed");
                return Classification::fallback(
                    format!("{} Related", title_case(emotion)),
                    ClassificationFallback::IssueFailed {
                        reason: e.to_string(),
                    },
                );
            }
        };

        let stripped = strip_answer(&answer);
        if stripped.is_empty() {
            warn!(emotion, "issue answer was empty");
            return Classification::fallback(
                format!("{} Related", title_case(emotion)),
                ClassificationFallback::IssueFailed {
                    reason: "empty answer".into(),
                },
            );
        }

        if stripped.chars().count() > MAX_ISSUE_CHARS {
            warn!(answer = stripped, "issue answer too long, using emotion");
            return Classification::fallback(
                title_case(&format!("{} Issues", title_case(emotion))),
                ClassificationFallback::IssueTooLong {
                    answer: stripped.to_string(),
                },
            );
        }

        let label = title_case(stripped);
        debug!(issue = %label, "issue classified");
        Classification::exact(label)
    }
}
