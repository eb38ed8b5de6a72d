//! The empathetic turn pipeline.
//!
//! # Flow
//!
//! 1. Label the emotion from the nearest exemplar
//! 2. Summarize the history that precedes this message
//! 3. Name the issue with one constrained generation
//! 4. Retrieve top-K exemplars and filter earlier turns for relevance
//! 5. Generate the empathetic reply and strip any activity tail from it
//! 6. Generate activity suggestions
//! 7. Commit everything to the session
//!
//! External failures never escape: each step degrades to its fallback and
//! the substitution is recorded on the [`TurnOutcome`].

use std::sync::Arc;
use std::time::Duration;

use heartline_config::AppConfig;
use heartline_core::exemplar::Retriever;
use heartline_core::generation::Generator;
use heartline_core::message::Turn;
use heartline_core::session::{ContextEntry, SessionState};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::classify::emotion::{DEFAULT_RETRIEVAL_TIMEOUT, retrieve_within};
use crate::classify::{ClassificationFallback, EmotionClassifier, IssueClassifier};
use crate::context::cleaning::{clean_activities, separate_response_and_activities};
use crate::context::conversation::{DEFAULT_HISTORY_TURNS, render_history};
use crate::context::prompt::{ResponsePromptInput, activity_context, activity_prompt, response_prompt};
use crate::context::relevance::relevant;
use crate::context::summarizer::{ConversationSummarizer, DEFAULT_SUMMARY_WINDOW};

/// Exemplars woven into the response prompt by default.
pub const DEFAULT_TOP_K: usize = 3;

const EMPTY_REPLY_CAUSE: &str = "the reply contained only activity suggestions";

/// Everything a turn produced, for the host to display.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    /// The cleaned empathetic reply; `None` when generation failed
    pub response: Option<String>,
    pub emotion: String,
    pub issue: String,
    pub activities: Vec<String>,
    /// The session's rolling summary after this turn
    pub summary: String,
    /// Shown in place of a reply when the response call failed
    pub notice: Option<String>,
    pub fallbacks: Vec<ClassificationFallback>,
    /// How many exemplars were woven into the prompt
    pub exemplars_used: usize,
}

impl TurnOutcome {
    /// The text to show the user: the reply, or the inline notice.
    pub fn display_text(&self) -> &str {
        self.response
            .as_deref()
            .or(self.notice.as_deref())
            .unwrap_or_default()
    }
}

/// The empathetic agent. Holds only shared service handles; all
/// conversation state lives in the [`SessionState`] passed to each turn, so
/// one agent can serve many sessions.
pub struct EmpathyAgent {
    generator: Arc<dyn Generator>,
    retriever: Arc<dyn Retriever>,
    emotions: EmotionClassifier,
    issues: IssueClassifier,
    summarizer: ConversationSummarizer,
    history_turns: usize,
    top_k: usize,
    retrieval_timeout: Duration,
}

impl EmpathyAgent {
    pub fn new(generator: Arc<dyn Generator>, retriever: Arc<dyn Retriever>) -> Self {
        Self {
            emotions: EmotionClassifier::new(retriever.clone()),
            issues: IssueClassifier::new(generator.clone()),
            summarizer: ConversationSummarizer::new(generator.clone()),
            generator,
            retriever,
            history_turns: DEFAULT_HISTORY_TURNS,
            top_k: DEFAULT_TOP_K,
            retrieval_timeout: DEFAULT_RETRIEVAL_TIMEOUT,
        }
    }

    /// An agent with windows, top-K, and retrieval timeout taken from config.
    pub fn from_config(
        generator: Arc<dyn Generator>,
        retriever: Arc<dyn Retriever>,
        config: &AppConfig,
    ) -> Self {
        Self::new(generator, retriever)
            .with_history_turns(config.conversation.history_turns)
            .with_summary_turns(config.conversation.summary_turns)
            .with_top_k(config.index.top_k)
            .with_retrieval_timeout(Duration::from_secs(config.runtime.retrieval_timeout_secs))
    }

    /// Turns rendered into the issue, response, and activity prompts.
    pub fn with_history_turns(mut self, turns: usize) -> Self {
        self.history_turns = turns.max(1);
        self
    }

    /// Turns rendered into the summary prompt.
    pub fn with_summary_turns(mut self, turns: usize) -> Self {
        self.summarizer = ConversationSummarizer::new(self.generator.clone()).with_window(turns);
        self
    }

    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = k.max(1);
        self
    }

    /// Bound on every index query, including the emotion lookup.
    pub fn with_retrieval_timeout(mut self, timeout: Duration) -> Self {
        self.retrieval_timeout = timeout;
        self.emotions = EmotionClassifier::new(self.retriever.clone()).with_timeout(timeout);
        self
    }

    /// Run one turn against `state`. Never fails; the session is updated
    /// only after every external call has returned.
    pub async fn process_turn(&self, state: &mut SessionState, message: &str) -> TurnOutcome {
        let session = state.id;
        info!(%session, turn = state.turns.len(), "turn started");

        let mut fallbacks = Vec::new();
        let prior = state.turns.as_slice();

        let emotion = self.emotions.classify(message).await;
        fallbacks.extend(emotion.fallback);
        let emotion = emotion.label;

        let summary = match self.summarizer.try_summarize(prior).await {
            Ok(summary) => summary.unwrap_or_default(),
            Err(e) => {
                warn!(%session, error = %e, "summary unavailable, keeping previous");
                fallbacks.push(ClassificationFallback::SummaryFailed {
                    reason: e.to_string(),
                });
                String::new()
            }
        };

        let history = render_history(prior, self.history_turns);

        let issue = self.issues.classify(&emotion, message, &history).await;
        fallbacks.extend(issue.fallback);
        let issue = issue.label;
        debug!(%session, %emotion, %issue, "turn labelled");

        let exemplars = match retrieve_within(
            self.retriever.as_ref(),
            message,
            self.top_k,
            self.retrieval_timeout,
        )
        .await
        {
            Ok(hits) => hits,
            Err(e) => {
                warn!(%session, error = %e, "retrieval failed, continuing without exemplars");
                fallbacks.push(ClassificationFallback::RetrievalUnavailable {
                    reason: e.to_string(),
                });
                Vec::new()
            }
        };
        let rag_context = exemplars
            .iter()
            .map(|hit| hit.record.document())
            .collect::<Vec<_>>()
            .join("\n\n");

        let relevant_context = relevant(message, &emotion, &state.contexts);
        let effective_summary = if summary.is_empty() {
            state.summary.as_str()
        } else {
            summary.as_str()
        };

        let prompt = response_prompt(&ResponsePromptInput {
            rag_context: &rag_context,
            history: &history,
            summary: effective_summary,
            relevant_context: &relevant_context,
            emotion: &emotion,
            user_message: message,
        });

        // Err carries the cause shown in the inline notice.
        let response: Result<String, String> =
            match self.generator.generate("response", &prompt).await {
                Ok(raw) => {
                    let cleaned = separate_response_and_activities(&raw);
                    if cleaned.is_empty() {
                        warn!(%session, "cleaning left no narrative text, recording no reply");
                        fallbacks.push(ClassificationFallback::ResponseEmpty);
                        Err(EMPTY_REPLY_CAUSE.to_string())
                    } else {
                        Ok(cleaned)
                    }
                }
                Err(e) => {
                    warn!(%session, error = %e, "response generation failed");
                    fallbacks.push(ClassificationFallback::ResponseFailed {
                        reason: e.to_string(),
                    });
                    Err(e.to_string())
                }
            };

        let activities = if response.is_ok() {
            let ctx = activity_context(&history, &issue);
            match self
                .generator
                .generate("activities", &activity_prompt(&emotion, message, &ctx))
                .await
            {
                Ok(raw) => clean_activities(&raw),
                Err(e) => {
                    warn!(%session, error = %e, "activity generation failed");
                    fallbacks.push(ClassificationFallback::ActivitiesFailed {
                        reason: e.to_string(),
                    });
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        // Commit.
        state.push_turn(Turn::user(message));
        state.current_emotion = emotion.clone();
        state.current_issue = issue.clone();
        if !summary.is_empty() {
            state.summary = summary;
        }

        let (response, notice) = match response {
            Ok(text) => {
                state.current_activities = activities.clone();
                state
                    .contexts
                    .push(ContextEntry::new(message, text.clone(), emotion.clone(), issue.clone()));
                state.push_turn(Turn::assistant(text.clone()));
                (Some(text), None)
            }
            Err(e) => (None, Some(format!("Error generating response: {e}"))),
        };

        info!(
            %session,
            %emotion,
            %issue,
            answered = response.is_some(),
            activities = activities.len(),
            fallbacks = fallbacks.len(),
            "turn complete"
        );

        TurnOutcome {
            response,
            emotion,
            issue,
            activities,
            summary: state.summary.clone(),
            notice,
            fallbacks,
            exemplars_used: exemplars.len(),
        }
    }
}
