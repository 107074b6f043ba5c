use std::io::Write;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tracing::{debug, info, warn};

/// Canonical encoding for everything downstream of normalization:
/// 16 kHz, mono, 16-bit signed little-endian PCM.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Converts container/codec audio (WebM/Opus, OGG, WAV) to canonical PCM by
/// shelling out to ffmpeg with a bounded timeout.
///
/// Conversion never errors: every failure mode (binary missing, timeout,
/// non-zero exit, empty output) collapses to `None`, and the orchestrator
/// falls back to sending the original bytes with a best-effort codec tag.
/// Scratch files are unlinked on every exit path, including timeouts.
pub struct FfmpegConverter {
    binary: String,
    timeout: Duration,
}

impl FfmpegConverter {
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    /// Probes for a working ffmpeg binary. Used at startup for a log-only
    /// availability check; conversion itself re-discovers failure per call.
    pub async fn probe(&self) -> bool {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(_) => return false,
        };
        matches!(
            tokio::time::timeout(Duration::from_secs(5), child.wait_with_output()).await,
            Ok(Ok(output)) if output.status.success()
        )
    }

    /// Decodes `audio` to canonical PCM at `target_sample_rate`.
    ///
    /// Returns `None` on any failure; never panics or propagates an error.
    pub async fn to_pcm(&self, audio: &[u8], target_sample_rate: u32) -> Option<Vec<u8>> {
        let started = Instant::now();

        let input = match tempfile::Builder::new().suffix(".webm").tempfile() {
            Ok(file) => file,
            Err(e) => {
                warn!(%e, "Failed to create conversion input file");
                return None;
            }
        };
        if let Err(e) = input.as_file().write_all(audio) {
            warn!(%e, "Failed to write conversion input");
            return None;
        }

        let output = match tempfile::Builder::new().suffix(".raw").tempfile() {
            Ok(file) => file,
            Err(e) => {
                warn!(%e, "Failed to create conversion output file");
                return None;
            }
        };

        let mut cmd = Command::new(&self.binary);
        cmd.args(["-hide_banner", "-loglevel", "error", "-y", "-i"])
            .arg(input.path())
            .args(["-ar", &target_sample_rate.to_string()])
            .args(["-ac", "1"])
            .args(["-f", "s16le"])
            .args(["-acodec", "pcm_s16le"])
            .arg(output.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(%e, binary = %self.binary, "ffmpeg not available, cannot convert audio");
                return None;
            }
        };

        // kill_on_drop reaps the child if the timeout fires and the
        // wait_with_output future is dropped.
        let result = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    timeout_secs = self.timeout.as_secs(),
                    input_len = audio.len(),
                    "ffmpeg conversion timed out"
                );
                return None;
            }
        };

        let out = match result {
            Ok(out) => out,
            Err(e) => {
                warn!(%e, "ffmpeg process error");
                return None;
            }
        };

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            warn!(
                status = %out.status,
                stderr = %stderr.trim(),
                input_len = audio.len(),
                "ffmpeg conversion failed"
            );
            return None;
        }

        let pcm = match tokio::fs::read(output.path()).await {
            Ok(pcm) => pcm,
            Err(e) => {
                warn!(%e, "Failed to read conversion output");
                return None;
            }
        };

        if pcm.is_empty() {
            warn!(input_len = audio.len(), "ffmpeg produced empty output");
            return None;
        }

        let duration_secs = pcm.len() as f64 / (target_sample_rate as f64 * 2.0);
        info!(
            input_len = audio.len(),
            pcm_len = pcm.len(),
            duration_secs = format!("{duration_secs:.2}"),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Converted audio to canonical PCM"
        );
        debug!(sample_rate = target_sample_rate, channels = 1, "Conversion parameters");

        Some(pcm)
    }
}
