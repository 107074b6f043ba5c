use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::asr::categorize_error;

/// A pluggable cross-language translation provider.
#[async_trait]
pub trait TranslationProvider: Send + Sync + 'static {
    async fn translate(&self, text: &str, source: &str, target: &str) -> anyhow::Result<String>;

    fn name(&self) -> &str;
}

/// Translation stage with passthrough-on-failure semantics.
///
/// Identical source/target short-circuits without a provider call; a
/// missing or failing provider returns the input unchanged. As long as a
/// transcript exists, the translated text is never empty.
pub struct Translator {
    provider: Option<Arc<dyn TranslationProvider>>,
}

impl Translator {
    pub fn new(provider: Option<Arc<dyn TranslationProvider>>) -> Self {
        Self { provider }
    }

    pub async fn translate(&self, text: &str, source: &str, target: &str) -> String {
        if source == target {
            debug!(language = source, "Source and target languages match, skipping translation");
            return text.to_string();
        }

        let Some(provider) = self.provider.as_deref() else {
            warn!("No translation provider configured, returning original text");
            return text.to_string();
        };

        let started = Instant::now();
        match provider.translate(text, source, target).await {
            Ok(translated) if !translated.trim().is_empty() => {
                info!(
                    provider = provider.name(),
                    source,
                    target,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Translated utterance"
                );
                translated
            }
            Ok(_) => {
                warn!(provider = provider.name(), "Translation returned empty text, keeping original");
                text.to_string()
            }
            Err(e) => {
                warn!(
                    provider = provider.name(),
                    category = categorize_error(&e),
                    error = %e,
                    "Translation failed, returning original text"
                );
                text.to_string()
            }
        }
    }
}

const DEFAULT_ENDPOINT: &str = "https://translation.googleapis.com/language/translate/v2";

/// Google Cloud Translation over its v2 REST surface.
pub struct GoogleTranslateProvider {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl GoogleTranslateProvider {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            http: reqwest::Client::builder().timeout(timeout).build()?,
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    data: TranslateData,
}

#[derive(Debug, Deserialize)]
struct TranslateData {
    translations: Vec<TranslationEntry>,
}

#[derive(Debug, Deserialize)]
struct TranslationEntry {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

#[async_trait]
impl TranslationProvider for GoogleTranslateProvider {
    async fn translate(&self, text: &str, source: &str, target: &str) -> anyhow::Result<String> {
        let body = serde_json::json!({
            "q": text,
            "source": source,
            "target": target,
            "format": "text",
        });

        let response = self
            .http
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("Google Translate returned {status}: {detail}");
        }

        let parsed: TranslateResponse = response.json().await?;
        parsed
            .data
            .translations
            .into_iter()
            .next()
            .map(|entry| entry.translated_text)
            .ok_or_else(|| anyhow::anyhow!("Google Translate returned no translations"))
    }

    fn name(&self) -> &str {
        "google-translate"
    }
}
