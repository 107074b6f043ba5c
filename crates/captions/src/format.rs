use tracing::{debug, warn};

/// Default sample rate assumed when a container does not carry one.
pub const DEFAULT_SAMPLE_RATE: u32 = 16_000;

/// Audio codec/container class recognised by the sniffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Wav,
    Webm,
    Ogg,
    Flac,
    Pcm,
    Unknown,
}

impl AudioFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "wav",
            AudioFormat::Webm => "webm",
            AudioFormat::Ogg => "ogg",
            AudioFormat::Flac => "flac",
            AudioFormat::Pcm => "pcm",
            AudioFormat::Unknown => "unknown",
        }
    }
}

/// Result of sniffing a raw chunk: what it is, whether the normalizer must
/// run before ASR, and the sample rate embedded in the container (or the
/// default when none is extractable).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectedFormat {
    pub format: AudioFormat,
    pub needs_conversion: bool,
    pub sample_rate_hz: u32,
}

impl DetectedFormat {
    fn new(format: AudioFormat, needs_conversion: bool, sample_rate_hz: u32) -> Self {
        Self {
            format,
            needs_conversion,
            sample_rate_hz,
        }
    }
}

/// Classifies raw bytes by magic-number signature, in priority order:
/// WAV (`RIFF..WAVE`), WebM/Matroska (EBML start bytes), OGG (`OggS`),
/// FLAC (`fLaC`), then a raw-PCM size heuristic. Inputs with no
/// recognisable signature default to WebM/Opus, the most common producer
/// format (browser MediaRecorder), rather than erroring.
pub fn detect(bytes: &[u8]) -> DetectedFormat {
    if bytes.len() < 4 {
        debug!(len = bytes.len(), "Chunk too short to classify");
        return DetectedFormat::new(AudioFormat::Unknown, true, DEFAULT_SAMPLE_RATE);
    }

    // WAV: 'RIFF' at offset 0, 'WAVE' at offset 8. Sample rate is a
    // little-endian u32 at offset 24 of the fmt header.
    if bytes.len() > 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE" {
        let sample_rate = read_le_u32(bytes, 24)
            .filter(|rate| *rate > 0)
            .unwrap_or(DEFAULT_SAMPLE_RATE);
        debug!(sample_rate, len = bytes.len(), "Detected WAV");
        return DetectedFormat::new(AudioFormat::Wav, true, sample_rate);
    }

    // WebM/Matroska: EBML start bytes 1A 45 DF A3. If an OpusHead marker is
    // present, the Opus input sample rate is a little-endian u32 at offset
    // 12 past the marker.
    if &bytes[0..4] == [0x1A, 0x45, 0xDF, 0xA3] {
        let sample_rate = find_marker(bytes, b"OpusHead")
            .and_then(|pos| read_le_u32(bytes, pos + 12))
            .filter(|rate| *rate > 0)
            .unwrap_or(DEFAULT_SAMPLE_RATE);
        debug!(sample_rate, len = bytes.len(), "Detected WebM/Opus");
        return DetectedFormat::new(AudioFormat::Webm, true, sample_rate);
    }

    // OGG: sample rate not extractable without parsing pages, use default.
    if &bytes[0..4] == b"OggS" {
        debug!(len = bytes.len(), "Detected OGG Opus");
        return DetectedFormat::new(AudioFormat::Ogg, true, DEFAULT_SAMPLE_RATE);
    }

    // FLAC is accepted by the ASR providers directly, no conversion.
    if &bytes[0..4] == b"fLaC" {
        debug!(len = bytes.len(), "Detected FLAC");
        return DetectedFormat::new(AudioFormat::Flac, false, DEFAULT_SAMPLE_RATE);
    }

    // Raw PCM heuristic: headerless 16-bit samples arrive as an even byte
    // count of plausible size. Bytes 0x1A / 0x42 in the lead-in are common
    // in truncated Matroska streams, treat those as WebM instead.
    if bytes.len() % 2 == 0 && (8_000..=192_000).contains(&bytes.len()) {
        if bytes[0..4].iter().any(|b| *b == 0x1A || *b == 0x42) {
            debug!(len = bytes.len(), "No signature but Matroska markers, assuming WebM");
            return DetectedFormat::new(AudioFormat::Webm, true, DEFAULT_SAMPLE_RATE);
        }
        debug!(len = bytes.len(), "Assuming raw PCM (16-bit mono)");
        return DetectedFormat::new(AudioFormat::Pcm, false, DEFAULT_SAMPLE_RATE);
    }

    warn!(
        len = bytes.len(),
        header = %hex_prefix(bytes, 16),
        "Unknown audio format, assuming WebM/Opus"
    );
    DetectedFormat::new(AudioFormat::Webm, true, DEFAULT_SAMPLE_RATE)
}

fn read_le_u32(bytes: &[u8], offset: usize) -> Option<u32> {
    let slice = bytes.get(offset..offset + 4)?;
    Some(u32::from_le_bytes(slice.try_into().ok()?))
}

fn find_marker(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn hex_prefix(bytes: &[u8], n: usize) -> String {
    bytes
        .iter()
        .take(n)
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}
