use std::time::{Duration, Instant};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use tracing::{debug, info};

use super::{AsrProvider, RecognitionConfig};

const DEFAULT_ENDPOINT: &str = "https://speech.googleapis.com/v1/speech:recognize";

/// Primary ASR: Google Cloud Speech-to-Text over its REST surface.
///
/// Uses the enhanced `latest_long` model with automatic punctuation; the
/// profanity filter stays off so clinical vocabulary is not masked.
pub struct GoogleSttProvider {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl GoogleSttProvider {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            http: reqwest::Client::builder().timeout(timeout).build()?,
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognizeResult>,
}

#[derive(Debug, Deserialize)]
struct RecognizeResult {
    #[serde(default)]
    alternatives: Vec<RecognizeAlternative>,
}

#[derive(Debug, Deserialize)]
struct RecognizeAlternative {
    #[serde(default)]
    transcript: String,
}

#[async_trait::async_trait]
impl AsrProvider for GoogleSttProvider {
    async fn recognize(
        &self,
        audio: &[u8],
        config: &RecognitionConfig,
    ) -> anyhow::Result<Option<String>> {
        let mut recognition = serde_json::json!({
            "encoding": config.encoding.as_str(),
            "languageCode": config.language_code,
            "alternativeLanguageCodes": config.alternative_language_codes,
            "enableAutomaticPunctuation": true,
            "model": "latest_long",
            "useEnhanced": true,
            "maxAlternatives": 1,
            "profanityFilter": false,
            "audioChannelCount": 1,
        });
        if let Some(rate) = config.sample_rate_hz {
            recognition["sampleRateHertz"] = serde_json::json!(rate);
        }

        let body = serde_json::json!({
            "config": recognition,
            "audio": { "content": BASE64.encode(audio) },
        });

        debug!(
            encoding = config.encoding.as_str(),
            language = %config.language_code,
            audio_len = audio.len(),
            "Sending recognition request to Google STT"
        );

        let started = Instant::now();
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
            anyhow::bail!("Google STT returned {status}: {detail}");
        }

        let parsed: RecognizeResponse = response.json().await?;
        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            results = parsed.results.len(),
            "Google STT response"
        );

        let transcript = parsed
            .results
            .iter()
            .filter_map(|result| result.alternatives.first())
            .map(|alt| alt.transcript.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let transcript = transcript.trim().to_string();

        if transcript.is_empty() {
            debug!("Google STT returned no results (silence or unclear audio)");
            return Ok(None);
        }
        Ok(Some(transcript))
    }

    fn name(&self) -> &str {
        "google-stt"
    }
}
