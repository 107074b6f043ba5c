use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

/// Similarity threshold for accepting a lexicon match.
pub const SIMILARITY_THRESHOLD: f32 = 0.85;

const TRAILING_PUNCTUATION: &[char] = &['.', ',', '!', '?', ';', ':'];

/// Read-only lookup into the community lexicon: regional/colloquial terms
/// mapped to canonical English terms, searched by embedding similarity.
#[async_trait]
pub trait LexiconStore: Send + Sync + 'static {
    /// Returns the canonical term for `term` when a match scores above
    /// `threshold`, `None` otherwise.
    async fn lookup_term(&self, term: &str, threshold: f32) -> anyhow::Result<Option<String>>;
}

/// Replaces regional terms in a transcript with their canonical
/// equivalents, token by token, preserving trailing punctuation.
///
/// Non-critical by contract: any store failure degrades to returning the
/// input unchanged.
pub struct LexiconCorrector {
    store: Arc<dyn LexiconStore>,
    threshold: f32,
}

impl LexiconCorrector {
    pub fn new(store: Arc<dyn LexiconStore>, threshold: f32) -> Self {
        Self { store, threshold }
    }

    pub async fn correct(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return text.to_string();
        }

        let mut corrected: Vec<String> = Vec::new();
        for token in text.split_whitespace() {
            let stem = token.trim_end_matches(TRAILING_PUNCTUATION);
            if stem.is_empty() {
                corrected.push(token.to_string());
                continue;
            }
            let suffix = &token[stem.len()..];

            match self.store.lookup_term(stem, self.threshold).await {
                Ok(Some(replacement)) => {
                    debug!(term = stem, %replacement, "Lexicon replacement");
                    corrected.push(format!("{replacement}{suffix}"));
                }
                Ok(None) => corrected.push(token.to_string()),
                Err(e) => {
                    warn!(%e, "Lexicon lookup failed, keeping original text");
                    return text.to_string();
                }
            }
        }

        corrected.join(" ")
    }
}
