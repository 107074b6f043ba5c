use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use carelink_captions::{LexiconStore, TranscriptStore};

/// Transcript persistence against the consultations datastore:
/// `POST {base}/consultations/{session_id}/transcript`.
pub struct HttpTranscriptStore {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpTranscriptStore {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            http: reqwest::Client::builder().timeout(timeout).build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl TranscriptStore for HttpTranscriptStore {
    async fn append(&self, session_id: &str, entry: &str) -> anyhow::Result<()> {
        let url = format!("{}/consultations/{}/transcript", self.base_url, session_id);
        let mut request = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "entry": entry }));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("Transcript datastore returned {status}: {detail}");
        }
        debug!(session = session_id, "Transcript entry appended");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct LexiconMatch {
    english_term: Option<String>,
}

/// Lexicon lookups against the datastore's similarity search:
/// `POST {base}/lexicon/search` with a term and a score threshold.
pub struct HttpLexiconStore {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpLexiconStore {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            http: reqwest::Client::builder().timeout(timeout).build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl LexiconStore for HttpLexiconStore {
    async fn lookup_term(&self, term: &str, threshold: f32) -> anyhow::Result<Option<String>> {
        let url = format!("{}/lexicon/search", self.base_url);
        let mut request = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "term": term, "threshold": threshold }));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("Lexicon datastore returned {status}: {detail}");
        }

        let parsed: LexiconMatch = response.json().await?;
        Ok(parsed.english_term)
    }
}
