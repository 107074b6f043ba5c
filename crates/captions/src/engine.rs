use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::Role;
use crate::asr::{AsrProvider, AudioEncoding, RecognitionConfig, categorize_error};

/// Language configuration for one speaker role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageProfile {
    /// Primary recognition language (BCP-47, e.g. "hi-IN").
    pub language_code: String,
    /// Alternates for code-switched speech.
    #[serde(default)]
    pub alternates: Vec<String>,
    /// Short translation code (ISO 639-1, e.g. "hi").
    pub short_code: String,
}

/// Per-role language profiles. The defaults model the deployed sessions:
/// the patient speaks Hindi, the doctor code-switches between English and
/// Hindi, so the doctor profile carries an alternate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub doctor: LanguageProfile,
    pub patient: LanguageProfile,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            doctor: LanguageProfile {
                language_code: "en-IN".to_string(),
                alternates: vec!["hi-IN".to_string()],
                short_code: "en".to_string(),
            },
            patient: LanguageProfile {
                language_code: "hi-IN".to_string(),
                alternates: vec![],
                short_code: "hi".to_string(),
            },
        }
    }
}

/// Which provider of the chain produced a transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineSource {
    Primary,
    Fallback,
}

/// A successful transcription. Absence (`None` from the engine) means "no
/// speech detected" and is not an error.
#[derive(Debug, Clone)]
pub struct Transcription {
    pub text: String,
    pub source: EngineSource,
    pub language_code: String,
}

/// Primary/fallback ASR chain with per-role language configuration.
///
/// Provider errors never escape: they are logged with a category
/// (quota/auth/format/timeout) and treated as "no result" so the chain can
/// continue to the next provider.
pub struct TranscriptionEngine {
    primary: Arc<dyn AsrProvider>,
    fallback: Option<Arc<dyn AsrProvider>>,
    config: EngineConfig,
}

impl TranscriptionEngine {
    pub fn new(
        primary: Arc<dyn AsrProvider>,
        fallback: Option<Arc<dyn AsrProvider>>,
        config: EngineConfig,
    ) -> Self {
        info!(
            primary = primary.name(),
            fallback = fallback.as_deref().map(|f| f.name()),
            "Transcription engine created"
        );
        Self {
            primary,
            fallback,
            config,
        }
    }

    /// The language profile configured for a role.
    pub fn profile(&self, role: Role) -> &LanguageProfile {
        match role {
            Role::Doctor => &self.config.doctor,
            Role::Patient => &self.config.patient,
        }
    }

    /// Transcribes a chunk. `audio` is canonical PCM when conversion
    /// succeeded, or the original container bytes tagged with a best-effort
    /// encoding otherwise.
    ///
    /// Returns `None` when no provider produced speech — the expected
    /// outcome for silence, which short-circuits the rest of the pipeline.
    pub async fn transcribe(
        &self,
        audio: &[u8],
        encoding: AudioEncoding,
        sample_rate_hz: Option<u32>,
        role: Role,
    ) -> Option<Transcription> {
        let profile = self.profile(role);
        let request = RecognitionConfig {
            encoding,
            sample_rate_hz,
            language_code: profile.language_code.clone(),
            alternative_language_codes: profile.alternates.clone(),
        };

        debug!(
            role = %role,
            language = %request.language_code,
            alternates = ?request.alternative_language_codes,
            "Transcribing chunk"
        );

        if let Some(text) = self.run_provider(&*self.primary, audio, &request).await {
            return Some(Transcription {
                text,
                source: EngineSource::Primary,
                language_code: profile.language_code.clone(),
            });
        }

        let fallback = self.fallback.as_deref()?;
        warn!(
            primary = self.primary.name(),
            fallback = fallback.name(),
            "Primary ASR produced no transcript, trying fallback"
        );
        if let Some(text) = self.run_provider(fallback, audio, &request).await {
            info!(fallback = fallback.name(), "Fallback ASR succeeded");
            return Some(Transcription {
                text,
                source: EngineSource::Fallback,
                language_code: profile.language_code.clone(),
            });
        }

        debug!("All ASR providers returned no transcript");
        None
    }

    async fn run_provider(
        &self,
        provider: &dyn AsrProvider,
        audio: &[u8],
        request: &RecognitionConfig,
    ) -> Option<String> {
        match provider.recognize(audio, request).await {
            Ok(Some(text)) => {
                let text = text.trim().to_string();
                if text.is_empty() {
                    None
                } else {
                    Some(text)
                }
            }
            Ok(None) => None,
            Err(e) => {
                warn!(
                    provider = provider.name(),
                    category = categorize_error(&e),
                    error = %e,
                    "ASR provider failed"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedAsr {
        reply: Result<Option<&'static str>, &'static str>,
        calls: AtomicUsize,
    }

    impl ScriptedAsr {
        fn new(reply: Result<Option<&'static str>, &'static str>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl AsrProvider for ScriptedAsr {
        async fn recognize(
            &self,
            _audio: &[u8],
            _config: &RecognitionConfig,
        ) -> anyhow::Result<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.reply {
                Ok(reply) => Ok(reply.map(str::to_string)),
                Err(message) => Err(anyhow::anyhow!(message)),
            }
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn engine(
        primary: Arc<ScriptedAsr>,
        fallback: Option<Arc<ScriptedAsr>>,
    ) -> TranscriptionEngine {
        TranscriptionEngine::new(
            primary,
            fallback.map(|f| f as Arc<dyn AsrProvider>),
            EngineConfig::default(),
        )
    }

    #[tokio::test]
    async fn primary_transcript_skips_fallback() {
        let primary = ScriptedAsr::new(Ok(Some("bukhar hai")));
        let fallback = ScriptedAsr::new(Ok(Some("unused")));
        let engine = engine(primary.clone(), Some(fallback.clone()));

        let result = engine
            .transcribe(&[0u8; 64], AudioEncoding::Linear16, Some(16_000), Role::Patient)
            .await
            .unwrap();
        assert_eq!(result.text, "bukhar hai");
        assert_eq!(result.source, EngineSource::Primary);
        assert_eq!(result.language_code, "hi-IN");
        assert_eq!(fallback.calls(), 0);
    }

    #[tokio::test]
    async fn primary_silence_falls_back() {
        let primary = ScriptedAsr::new(Ok(None));
        let fallback = ScriptedAsr::new(Ok(Some("take two tablets")));
        let engine = engine(primary.clone(), Some(fallback.clone()));

        let result = engine
            .transcribe(&[0u8; 64], AudioEncoding::Linear16, Some(16_000), Role::Doctor)
            .await
            .unwrap();
        assert_eq!(result.source, EngineSource::Fallback);
        assert_eq!(primary.calls(), 1);
        assert_eq!(fallback.calls(), 1);
    }

    #[tokio::test]
    async fn primary_error_is_absorbed_and_falls_back() {
        let primary = ScriptedAsr::new(Err("quota exceeded"));
        let fallback = ScriptedAsr::new(Ok(Some("hello")));
        let engine = engine(primary, Some(fallback.clone()));

        let result = engine
            .transcribe(&[0u8; 64], AudioEncoding::WebmOpus, None, Role::Doctor)
            .await
            .unwrap();
        assert_eq!(result.text, "hello");
        assert_eq!(result.source, EngineSource::Fallback);
    }

    #[tokio::test]
    async fn both_empty_is_no_speech_not_error() {
        let primary = ScriptedAsr::new(Ok(None));
        let fallback = ScriptedAsr::new(Ok(None));
        let engine = engine(primary, Some(fallback));

        let result = engine
            .transcribe(&[0u8; 64], AudioEncoding::Linear16, Some(16_000), Role::Patient)
            .await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn no_fallback_configured() {
        let primary = ScriptedAsr::new(Ok(None));
        let engine = engine(primary.clone(), None);

        let result = engine
            .transcribe(&[0u8; 64], AudioEncoding::Linear16, Some(16_000), Role::Patient)
            .await;
        assert!(result.is_none());
        assert_eq!(primary.calls(), 1);
    }

    #[test]
    fn role_profiles_carry_code_switching_alternates() {
        let config = EngineConfig::default();
        assert_eq!(config.doctor.language_code, "en-IN");
        assert_eq!(config.doctor.alternates, vec!["hi-IN".to_string()]);
        assert!(config.patient.alternates.is_empty());
    }
}
