use std::time::{Duration, Instant};

use reqwest::multipart::{Form, Part};
use tracing::{debug, info};

use super::{AsrProvider, RecognitionConfig};

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/audio/transcriptions";

/// Fallback ASR: OpenAI Whisper. Takes the audio as-is (Whisper sniffs the
/// container itself) and ignores the language configuration — the model
/// auto-detects, which is what makes it a serviceable fallback for
/// code-switched speech the primary mis-handles.
pub struct WhisperProvider {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl WhisperProvider {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            http: reqwest::Client::builder().timeout(timeout).build()?,
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl AsrProvider for WhisperProvider {
    async fn recognize(
        &self,
        audio: &[u8],
        _config: &RecognitionConfig,
    ) -> anyhow::Result<Option<String>> {
        let form = Form::new()
            .text("model", "whisper-1")
            .text("response_format", "text")
            .part("file", Part::bytes(audio.to_vec()).file_name("audio.wav"));

        debug!(audio_len = audio.len(), "Sending recognition request to Whisper");

        let started = Instant::now();
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("Whisper returned {status}: {detail}");
        }

        let transcript = response.text().await?.trim().to_string();
        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            empty = transcript.is_empty(),
            "Whisper response"
        );

        if transcript.is_empty() {
            return Ok(None);
        }
        Ok(Some(transcript))
    }

    fn name(&self) -> &str {
        "whisper"
    }
}
