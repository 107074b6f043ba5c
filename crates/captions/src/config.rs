use serde::{Deserialize, Serialize};

use crate::engine::EngineConfig;

/// Tunables for the caption pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionConfig {
    /// Chunks smaller than this are treated as connection keep-alive
    /// noise and skipped before format sniffing.
    pub min_chunk_bytes: usize,
    /// ffmpeg binary used for audio normalization.
    pub ffmpeg_binary: String,
    /// Hard ceiling on a single ffmpeg invocation.
    pub convert_timeout_secs: u64,
    /// HTTP timeout applied to ASR and translation providers.
    pub provider_timeout_secs: u64,
    /// Fuzzy-match threshold for medical lexicon correction.
    pub lexicon_threshold: f32,
    pub languages: EngineConfig,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            min_chunk_bytes: 100,
            ffmpeg_binary: "ffmpeg".to_string(),
            convert_timeout_secs: 10,
            provider_timeout_secs: 10,
            lexicon_threshold: crate::lexicon::SIMILARITY_THRESHOLD,
            languages: EngineConfig::default(),
        }
    }
}
