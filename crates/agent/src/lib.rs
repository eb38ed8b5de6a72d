//! The empathetic turn pipeline for Heartline.
//!
//! Each user message runs through one sequential pass:
//!
//! 1. **Classify** the emotion (nearest exemplar) and the issue (one
//!    constrained generation)
//! 2. **Assemble context**: rendered history, rolling summary, retrieved
//!    exemplars, and relevant earlier turns
//! 3. **Generate** the empathetic reply and strip any activity list from it
//! 4. **Generate** activity suggestions separately
//! 5. **Commit** the turn to the caller's [`SessionState`](heartline_core::SessionState)
//!
//! Every external failure degrades to a fallback value; a turn never errors.

pub mod classify;
pub mod companion;
pub mod context;

#[cfg(test)]
mod test_helpers;

pub use classify::{Classification, ClassificationFallback, EmotionClassifier, IssueClassifier};
pub use companion::{EmpathyAgent, TurnOutcome};
pub use context::{
    ConversationSummarizer, ScanState, clean_activities, relevant, render_history,
    separate_response_and_activities,
};
