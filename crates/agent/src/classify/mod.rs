//! Per-turn labelling: the emotion from the nearest exemplar, the issue
//! from a constrained generation call.
//!
//! Neither classifier ever fails. When a fallback value is substituted the
//! result carries a [`ClassificationFallback`] so the turn can report it.

pub mod emotion;
pub mod issue;

pub use emotion::EmotionClassifier;
pub use issue::{IssueClassifier, title_case};

use serde::Serialize;

/// A marker that a fallback value was substituted during a turn.
///
/// Not an error: the turn completed, but some step degraded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassificationFallback {
    /// Emotion fell back to `"neutral"`.
    EmotionDefaulted { reason: String },
    /// The issue answer was over the length limit and was replaced.
    IssueTooLong { answer: String },
    /// Issue generation failed or came back empty.
    IssueFailed { reason: String },
    SummaryFailed { reason: String },
    /// RAG context was left empty.
    RetrievalUnavailable { reason: String },
    /// No empathetic response; the outcome carries an inline notice instead.
    ResponseFailed { reason: String },
    /// Cleaning removed every line; no reply was recorded.
    ResponseEmpty,
    ActivitiesFailed { reason: String },
}

impl std::fmt::Display for ClassificationFallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmotionDefaulted { reason } => write!(f, "emotion defaulted: {reason}"),
            Self::IssueTooLong { answer } => write!(f, "issue answer too long: {answer}"),
            Self::IssueFailed { reason } => write!(f, "issue fallback: {reason}"),
            Self::SummaryFailed { reason } => write!(f, "summary failed: {reason}"),
            Self::RetrievalUnavailable { reason } => write!(f, "retrieval unavailable: {reason}"),
            Self::ResponseFailed { reason } => write!(f, "response failed: {reason}"),
            Self::ResponseEmpty => f.write_str("reply had no narrative text"),
            Self::ActivitiesFailed { reason } => write!(f, "activities failed: {reason}"),
        }
    }
}

/// A label plus the fallback taken to produce it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub label: String,
    pub fallback: Option<ClassificationFallback>,
}

impl Classification {
    pub fn exact(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            fallback: None,
        }
    }

    pub fn fallback(label: impl Into<String>, fallback: ClassificationFallback) -> Self {
        Self {
            label: label.into(),
            fallback: Some(fallback),
        }
    }
}
