use async_trait::async_trait;

use crate::Role;

/// Durable store for per-consultation transcript lines.
///
/// Appends are best-effort from the pipeline's point of view: a failed
/// write is logged and the caption still goes out.
#[async_trait]
pub trait TranscriptStore: Send + Sync + 'static {
    async fn append(&self, session_id: &str, entry: &str) -> anyhow::Result<()>;
}

/// Formats one utterance as a transcript line, e.g. `[DOCTOR]: take rest`.
pub fn format_entry(role: Role, text: &str) -> String {
    format!("[{}]: {}", role.as_str().to_uppercase(), text)
}
