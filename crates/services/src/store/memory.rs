use std::collections::HashMap;

use async_trait::async_trait;
use dashmap::DashMap;

use carelink_captions::{LexiconStore, TranscriptStore};

/// Transcript store for tests and datastore-less deployments. Keeps
/// per-session lines in insertion order.
#[derive(Default)]
pub struct InMemoryTranscriptStore {
    sessions: DashMap<String, Vec<String>>,
}

impl InMemoryTranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self, session_id: &str) -> Vec<String> {
        self.sessions
            .get(session_id)
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TranscriptStore for InMemoryTranscriptStore {
    async fn append(&self, session_id: &str, entry: &str) -> anyhow::Result<()> {
        self.sessions
            .entry(session_id.to_string())
            .or_default()
            .push(entry.to_string());
        Ok(())
    }
}

/// Exact-match lexicon backed by a fixed table. Used when no datastore is
/// configured; the similarity threshold is ignored since matches are exact.
pub struct StaticLexicon {
    terms: HashMap<String, String>,
}

impl StaticLexicon {
    pub fn new(terms: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            terms: terms
                .into_iter()
                .map(|(k, v)| (k.to_lowercase(), v))
                .collect(),
        }
    }

    pub fn empty() -> Self {
        Self {
            terms: HashMap::new(),
        }
    }
}

#[async_trait]
impl LexiconStore for StaticLexicon {
    async fn lookup_term(&self, term: &str, _threshold: f32) -> anyhow::Result<Option<String>> {
        Ok(self.terms.get(&term.to_lowercase()).cloned())
    }
}
