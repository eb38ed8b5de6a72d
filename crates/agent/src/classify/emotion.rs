//! Nearest-neighbour emotion labelling.

use std::sync::Arc;
use std::time::Duration;

use heartline_core::error::IndexError;
use heartline_core::exemplar::{Retriever, ScoredExemplar};
use heartline_core::session::DEFAULT_EMOTION;
use tracing::{debug, warn};

use super::{Classification, ClassificationFallback};

/// Default bound on a single index query.
pub const DEFAULT_RETRIEVAL_TIMEOUT: Duration = Duration::from_secs(10);

/// Run `retrieve(query, k)` under a timeout. An elapsed timeout is reported
/// as [`IndexError::Unavailable`], the same class as a failed query.
pub async fn retrieve_within(
    retriever: &dyn Retriever,
    query: &str,
    k: usize,
    timeout: Duration,
) -> Result<Vec<ScoredExemplar>, IndexError> {
    match tokio::time::timeout(timeout, retriever.retrieve(query, k)).await {
        Ok(result) => result,
        Err(_) => Err(IndexError::Unavailable(format!(
            "{} did not answer within {}ms",
            retriever.name(),
            timeout.as_millis()
        ))),
    }
}

/// Labels a message with the emotion of its nearest exemplar.
pub struct EmotionClassifier {
    retriever: Arc<dyn Retriever>,
    timeout: Duration,
}

impl EmotionClassifier {
    pub fn new(retriever: Arc<dyn Retriever>) -> Self {
        Self {
            retriever,
            timeout: DEFAULT_RETRIEVAL_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The nearest exemplar's emotion, or `"neutral"` when the index is
    /// empty, unreachable, or the stored label is blank.
    pub async fn classify(&self, message: &str) -> Classification {
        let nearest = match retrieve_within(self.retriever.as_ref(), message, 1, self.timeout).await {
            Ok(hits) => hits.into_iter().next(),
            Err(e) => {
                warn!(error = %e, "emotion lookup failed, using default");
                return Classification::fallback(
                    DEFAULT_EMOTION,
                    ClassificationFallback::EmotionDefaulted {
                        reason: e.to_string(),
                    },
                );
            }
        };

        match nearest {
            Some(hit) if !hit.record.emotion.trim().is_empty() => {
                debug!(emotion = %hit.record.emotion, score = hit.score, id = %hit.id, "emotion classified");
                Classification::exact(hit.record.emotion)
            }
            Some(hit) => {
                warn!(id = %hit.id, "nearest exemplar has no emotion label");
                Classification::fallback(
                    DEFAULT_EMOTION,
                    ClassificationFallback::EmotionDefaulted {
                        reason: format!("exemplar {} has a blank emotion", hit.id),
                    },
                )
            }
            None => {
                debug!("no exemplars returned, emotion defaults");
                Classification::fallback(
                    DEFAULT_EMOTION,
                    ClassificationFallback::EmotionDefaulted {
                        reason: "no exemplars returned".into(),
                    },
                )
            }
        }
    }
}
