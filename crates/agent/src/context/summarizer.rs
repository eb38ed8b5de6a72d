//! Rolling conversation summary.

use std::sync::Arc;

use heartline_core::error::GenerationError;
use heartline_core::generation::Generator;
use heartline_core::message::Turn;
use tracing::{debug, warn};

use super::conversation::render_history;
use super::prompt::summary_prompt;

/// Turns rendered into the summary prompt by default.
pub const DEFAULT_SUMMARY_WINDOW: usize = 8;

/// No summary is attempted below this many turns.
pub const MIN_TURNS_FOR_SUMMARY: usize = 4;

/// Condenses the turn log into a 2-3 sentence summary with one generation
/// call.
pub struct ConversationSummarizer {
    generator: Arc<dyn Generator>,
    window: usize,
}

impl ConversationSummarizer {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self {
            generator,
            window: DEFAULT_SUMMARY_WINDOW,
        }
    }

    /// How many trailing turns the summary prompt sees.
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window.max(1);
        self
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// `Ok(None)` when the log is too short to summarize; otherwise the
    /// trimmed summary text, which may be empty.
    pub async fn try_summarize(&self, turns: &[Turn]) -> Result<Option<String>, GenerationError> {
        if turns.len() < MIN_TURNS_FOR_SUMMARY {
            debug!(turns = turns.len(), "summary skipped, too few turns");
            return Ok(None);
        }

        let history = render_history(turns, self.window);
        let text = self
            .generator
            .generate("summary", &summary_prompt(&history))
            .await?;

        Ok(Some(text.trim().to_string()))
    }

    /// Like [`try_summarize`](Self::try_summarize) but never fails: short
    /// logs and generation errors both yield `""`.
    pub async fn maybe_summarize(&self, turns: &[Turn]) -> String {
        match self.try_summarize(turns).await {
            Ok(summary) => summary.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "summary generation failed");
                String::new()
            }
        }
    }
}
