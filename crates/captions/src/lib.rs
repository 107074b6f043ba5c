pub mod asr;
pub mod config;
pub mod convert;
pub mod engine;
pub mod format;
pub mod lexicon;
pub mod pipeline;
pub mod transcript;
pub mod translate;

pub use asr::{AsrProvider, AudioEncoding, RecognitionConfig};
pub use config::CaptionConfig;
pub use convert::FfmpegConverter;
pub use engine::{EngineSource, Transcription, TranscriptionEngine};
pub use format::{AudioFormat, DetectedFormat};
pub use lexicon::{LexiconCorrector, LexiconStore};
pub use pipeline::{CaptionPipeline, PipelineOutcome, StageTimings};
pub use transcript::TranscriptStore;
pub use translate::{TranslationProvider, Translator};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The two participant roles of a consultation session.
///
/// Exactly one connection per role may be active at a time; the session
/// registry supersedes a prior connection when the same role re-joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Doctor,
    Patient,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Doctor => "doctor",
            Role::Patient => "patient",
        }
    }

    /// The other participant of the session.
    pub fn counterpart(&self) -> Role {
        match self {
            Role::Doctor => Role::Patient,
            Role::Patient => Role::Doctor,
        }
    }
}

impl std::str::FromStr for Role {
    type Err = InvalidRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "doctor" => Ok(Role::Doctor),
            "patient" => Ok(Role::Patient),
            other => Err(InvalidRole(other.to_string())),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid role '{0}', expected 'doctor' or 'patient'")]
pub struct InvalidRole(pub String);

/// A raw audio chunk received from one participant.
///
/// Ephemeral: dropped after the pipeline finishes with it, never persisted.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    pub bytes: Vec<u8>,
    pub session_id: String,
    pub role: Role,
    pub received_at: DateTime<Utc>,
}

impl AudioChunk {
    pub fn new(bytes: Vec<u8>, session_id: impl Into<String>, role: Role) -> Self {
        Self {
            bytes,
            session_id: session_id.into(),
            role,
            received_at: Utc::now(),
        }
    }
}

/// The caption delivered to session participants after a chunk has been
/// transcribed and translated.
///
/// Both text fields are always non-empty: `translated_text` falls back to
/// `original_text` when translation degrades.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionMessage {
    pub speaker: Role,
    pub original_text: String,
    pub translated_text: String,
    /// Milliseconds since epoch at chunk arrival; `null` tolerated on the wire.
    pub timestamp: Option<i64>,
}
