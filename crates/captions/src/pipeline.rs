use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::asr::AudioEncoding;
use crate::config::CaptionConfig;
use crate::convert::{FfmpegConverter, TARGET_SAMPLE_RATE};
use crate::engine::TranscriptionEngine;
use crate::format::{self, AudioFormat};
use crate::lexicon::LexiconCorrector;
use crate::transcript::{self, TranscriptStore};
use crate::translate::Translator;
use crate::{AudioChunk, CaptionMessage};

/// Outcome of processing one audio chunk. Only `Caption` produces a
/// broadcast; every other variant ends the chunk quietly.
#[derive(Debug)]
pub enum PipelineOutcome {
    /// Chunk was below the minimum size and never entered the pipeline.
    Skipped,
    /// Audio decoded but no provider heard speech in it.
    NoSpeech,
    Caption(CaptionMessage),
    /// An unexpected stage failure. The session stays up; only this chunk
    /// is lost.
    Failed { reason: String },
}

/// Per-stage wall-clock timings, logged once per captioned chunk.
#[derive(Debug, Default)]
pub struct StageTimings {
    pub convert_ms: u128,
    pub asr_ms: u128,
    pub lexicon_ms: u128,
    pub translate_ms: u128,
}

/// The per-chunk caption pipeline: sniff, normalize, transcribe, correct,
/// translate, persist. Each chunk is independent; a failure at any stage
/// never takes the session down.
pub struct CaptionPipeline {
    config: CaptionConfig,
    converter: Option<FfmpegConverter>,
    engine: TranscriptionEngine,
    lexicon: Option<LexiconCorrector>,
    translator: Translator,
    transcript: Option<Arc<dyn TranscriptStore>>,
}

impl CaptionPipeline {
    pub fn new(
        config: CaptionConfig,
        converter: Option<FfmpegConverter>,
        engine: TranscriptionEngine,
        lexicon: Option<LexiconCorrector>,
        translator: Translator,
        transcript: Option<Arc<dyn TranscriptStore>>,
    ) -> Self {
        Self {
            config,
            converter,
            engine,
            lexicon,
            translator,
            transcript,
        }
    }

    /// Runs one chunk through the full pipeline.
    pub async fn process_chunk(&self, chunk: &AudioChunk) -> PipelineOutcome {
        if chunk.bytes.len() < self.config.min_chunk_bytes {
            debug!(
                session = %chunk.session_id,
                size = chunk.bytes.len(),
                "Chunk below minimum size, skipping"
            );
            return PipelineOutcome::Skipped;
        }

        let started = Instant::now();
        let mut timings = StageTimings::default();

        let detected = format::detect(&chunk.bytes);
        debug!(
            session = %chunk.session_id,
            role = %chunk.role,
            format = detected.format.as_str(),
            needs_conversion = detected.needs_conversion,
            sample_rate = detected.sample_rate_hz,
            size = chunk.bytes.len(),
            "Audio chunk received"
        );

        // Normalize to 16 kHz mono s16le PCM when possible. A failed or
        // unavailable conversion falls back to the original bytes tagged
        // with a container encoding so the provider can try decoding them
        // itself.
        let (audio, encoding, sample_rate_hz) = if detected.needs_conversion {
            let stage = Instant::now();
            let converted = match &self.converter {
                Some(converter) => converter.to_pcm(&chunk.bytes, TARGET_SAMPLE_RATE).await,
                None => None,
            };
            timings.convert_ms = stage.elapsed().as_millis();
            match converted {
                Some(pcm) => (pcm, AudioEncoding::Linear16, Some(TARGET_SAMPLE_RATE)),
                None => {
                    warn!(
                        session = %chunk.session_id,
                        format = detected.format.as_str(),
                        "Conversion unavailable, sending original bytes to provider"
                    );
                    let encoding = match detected.format {
                        AudioFormat::Ogg => AudioEncoding::OggOpus,
                        _ => AudioEncoding::WebmOpus,
                    };
                    (chunk.bytes.clone(), encoding, None)
                }
            }
        } else {
            match detected.format {
                AudioFormat::Flac => (chunk.bytes.clone(), AudioEncoding::Flac, None),
                _ => (
                    chunk.bytes.clone(),
                    AudioEncoding::Linear16,
                    Some(detected.sample_rate_hz),
                ),
            }
        };

        let stage = Instant::now();
        let transcription = self
            .engine
            .transcribe(&audio, encoding, sample_rate_hz, chunk.role)
            .await;
        timings.asr_ms = stage.elapsed().as_millis();

        let Some(transcription) = transcription else {
            debug!(session = %chunk.session_id, "No speech detected in chunk");
            return PipelineOutcome::NoSpeech;
        };
        let raw_text = transcription.text;

        let stage = Instant::now();
        let corrected = match &self.lexicon {
            Some(lexicon) => lexicon.correct(&raw_text).await,
            None => raw_text.clone(),
        };
        timings.lexicon_ms = stage.elapsed().as_millis();

        let source_lang = &self.engine.profile(chunk.role).short_code;
        let target_lang = &self.engine.profile(chunk.role.counterpart()).short_code;
        let stage = Instant::now();
        let translated = self
            .translator
            .translate(&corrected, source_lang, target_lang)
            .await;
        timings.translate_ms = stage.elapsed().as_millis();

        // Best-effort persistence: the caption still goes out when the
        // transcript write fails.
        if let Some(store) = &self.transcript {
            let entry = transcript::format_entry(chunk.role, &corrected);
            if let Err(e) = store.append(&chunk.session_id, &entry).await {
                warn!(session = %chunk.session_id, error = %e, "Transcript append failed");
            }
        }

        info!(
            session = %chunk.session_id,
            role = %chunk.role,
            source = ?transcription.source,
            convert_ms = timings.convert_ms as u64,
            asr_ms = timings.asr_ms as u64,
            lexicon_ms = timings.lexicon_ms as u64,
            translate_ms = timings.translate_ms as u64,
            total_ms = started.elapsed().as_millis() as u64,
            "Chunk captioned"
        );

        PipelineOutcome::Caption(CaptionMessage {
            speaker: chunk.role,
            original_text: raw_text,
            translated_text: translated,
            timestamp: Some(chunk.received_at.timestamp_millis()),
        })
    }
}
