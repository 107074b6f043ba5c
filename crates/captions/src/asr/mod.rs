pub mod google;
pub mod whisper;

use async_trait::async_trait;

/// Audio encoding tag sent along with a recognition request.
///
/// `Linear16` is the canonical post-normalization encoding; the Opus
/// variants are the best-effort tags used when conversion degraded and the
/// original container bytes are sent instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioEncoding {
    Linear16,
    Flac,
    WebmOpus,
    OggOpus,
}

impl AudioEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioEncoding::Linear16 => "LINEAR16",
            AudioEncoding::Flac => "FLAC",
            AudioEncoding::WebmOpus => "WEBM_OPUS",
            AudioEncoding::OggOpus => "OGG_OPUS",
        }
    }
}

/// Per-call recognition parameters. The language fields are derived from
/// the speaker role by the engine.
#[derive(Debug, Clone)]
pub struct RecognitionConfig {
    pub encoding: AudioEncoding,
    /// Required for LINEAR16/FLAC; `None` lets the provider detect it for
    /// container formats.
    pub sample_rate_hz: Option<u32>,
    pub language_code: String,
    /// Alternate languages for code-switched speech.
    pub alternative_language_codes: Vec<String>,
}

/// A pluggable speech-recognition provider.
///
/// `Ok(None)` is a valid, non-error outcome meaning "no speech detected" —
/// it is how silence and unintelligible audio surface. Provider failures
/// (quota, auth, malformed audio, timeouts) are `Err` and are downgraded to
/// a categorized log line by the engine, never raised past it.
#[async_trait]
pub trait AsrProvider: Send + Sync + 'static {
    async fn recognize(
        &self,
        audio: &[u8],
        config: &RecognitionConfig,
    ) -> anyhow::Result<Option<String>>;

    fn name(&self) -> &str;
}

/// Maps a provider error to a coarse category for structured logging.
pub fn categorize_error(err: &anyhow::Error) -> &'static str {
    let message = err.to_string().to_lowercase();
    if message.contains("quota") || message.contains("limit") || message.contains("429") {
        "quota"
    } else if message.contains("credential")
        || message.contains("authentication")
        || message.contains("api key")
        || message.contains("401")
        || message.contains("403")
    {
        "auth"
    } else if message.contains("timed out") || message.contains("timeout") {
        "timeout"
    } else if message.contains("invalid") && message.contains("audio") {
        "format"
    } else {
        "other"
    }
}
