//! Deterministic fakes for the agent's capability seams.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use heartline_core::error::{GenerationError, IndexError, ProviderError};
use heartline_core::exemplar::{ExemplarRecord, Retriever, ScoredExemplar};
use heartline_core::generation::Generator;

enum Script {
    /// Returned on every call
    Always(Result<String, ProviderError>),
    /// Consumed one per call; the last entry repeats
    Queue(VecDeque<Result<String, ProviderError>>),
}

/// A generator scripted per call site. Unscripted call sites fail with
/// `NotConfigured`. Every call is recorded.
pub struct ScriptedGenerator {
    scripts: Mutex<HashMap<String, Script>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Always answer `text` at `call_site`.
    pub fn reply(self, call_site: &str, text: &str) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(call_site.into(), Script::Always(Ok(text.into())));
        self
    }

    /// Answer `texts` in order at `call_site`.
    pub fn replies(self, call_site: &str, texts: &[&str]) -> Self {
        let queue = texts.iter().map(|t| Ok(t.to_string())).collect();
        self.scripts
            .lock()
            .unwrap()
            .insert(call_site.into(), Script::Queue(queue));
        self
    }

    /// Always fail at `call_site`.
    pub fn failing(self, call_site: &str) -> Self {
        self.scripts.lock().unwrap().insert(
            call_site.into(),
            Script::Always(Err(ProviderError::Network("connection refused".into()))),
        );
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Call sites in the order they were invoked.
    pub fn call_sites(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(s, _)| s.clone()).collect()
    }

    /// Prompts sent to `call_site`, oldest first.
    pub fn calls_for(&self, call_site: &str) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| s == call_site)
            .map(|(_, p)| p.clone())
            .collect()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, call_site: &str, prompt: &str) -> Result<String, GenerationError> {
        self.calls
            .lock()
            .unwrap()
            .push((call_site.to_string(), prompt.to_string()));

        let mut scripts = self.scripts.lock().unwrap();
        let result = match scripts.get_mut(call_site) {
            Some(Script::Always(r)) => r.clone(),
            Some(Script::Queue(q)) if q.len() > 1 => q.pop_front().unwrap(),
            Some(Script::Queue(q)) => q
                .front()
                .cloned()
                .unwrap_or(Err(ProviderError::EmptyResponse)),
            None => Err(ProviderError::NotConfigured(format!("no script for {call_site}"))),
        };

        result.map_err(|e| GenerationError::new(call_site, 1, e))
    }
}

/// A retriever over a fixed, already-ranked exemplar list.
pub struct StaticRetriever {
    exemplars: Vec<ScoredExemplar>,
    unavailable: bool,
    delay: Option<Duration>,
    queries: Mutex<Vec<(String, usize)>>,
}

impl StaticRetriever {
    /// `(context, response, emotion)` triples, nearest first.
    pub fn new(records: Vec<(&str, &str, &str)>) -> Self {
        let count = records.len();
        let exemplars = records
            .into_iter()
            .enumerate()
            .map(|(i, (c, r, e))| ScoredExemplar {
                id: i.to_string(),
                record: ExemplarRecord::new(c, r, e),
                score: 1.0 - i as f32 / (count as f32 + 1.0),
            })
            .collect();

        Self {
            exemplars,
            unavailable: false,
            delay: None,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Every query fails with `IndexError::Unavailable`.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::new(vec![])
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn queries(&self) -> Vec<(String, usize)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Retriever for StaticRetriever {
    fn name(&self) -> &str {
        "static"
    }

    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ScoredExemplar>, IndexError> {
        self.queries.lock().unwrap().push((query.to_string(), k));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.unavailable {
            return Err(IndexError::Unavailable("collection empathetic_data not found".into()));
        }

        Ok(self.exemplars.iter().take(k).cloned().collect())
    }
}
