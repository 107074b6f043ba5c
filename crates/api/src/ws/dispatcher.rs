use chrono::Utc;
use tracing::{debug, warn};

use carelink_captions::{CaptionMessage, Role};

use super::registry::{LeaveOutcome, SessionRegistry};

pub fn connected_frame(session_id: &str, role: Role) -> serde_json::Value {
    serde_json::json!({
        "type": "connected",
        "session_id": session_id,
        "user_type": role.as_str(),
    })
}

pub fn participant_joined_frame(role: Role) -> serde_json::Value {
    serde_json::json!({
        "type": "participant_joined",
        "user_type": role.as_str(),
    })
}

pub fn participant_left_frame(role: Role) -> serde_json::Value {
    serde_json::json!({
        "type": "participant_left",
        "user_type": role.as_str(),
    })
}

pub fn pong_frame() -> serde_json::Value {
    serde_json::json!({ "type": "pong" })
}

pub fn error_frame(message: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "error",
        "message": message,
    })
}

/// Fans a caption out to every connected participant of the session,
/// including the speaker, so the speaker sees what was heard.
///
/// A caption without original text is dropped whole rather than partially
/// broadcast. Recipients whose send fails are removed from the room.
/// Returns the number of successful deliveries.
pub async fn broadcast_caption(
    registry: &SessionRegistry,
    session_id: &str,
    caption: &CaptionMessage,
) -> usize {
    if caption.original_text.trim().is_empty() {
        warn!(session = session_id, "Dropping caption with empty original text");
        return 0;
    }

    let translated = if caption.translated_text.trim().is_empty() {
        caption.original_text.as_str()
    } else {
        caption.translated_text.as_str()
    };
    let timestamp = caption
        .timestamp
        .unwrap_or_else(|| Utc::now().timestamp_millis());

    let frame = serde_json::json!({
        "type": "caption",
        "speaker": caption.speaker.as_str(),
        "original_text": caption.original_text,
        "translated_text": translated,
        "timestamp": timestamp,
    });

    let mut delivered = 0;
    let mut evictions: Vec<(Role, LeaveOutcome)> = Vec::new();
    for (role, sink) in registry.sinks(session_id) {
        match sink.send_json(&frame).await {
            Ok(()) => {
                debug!(session = session_id, recipient = %role, "Caption delivered");
                delivered += 1;
            }
            Err(e) => {
                warn!(
                    session = session_id,
                    recipient = %role,
                    error = %e,
                    "Caption delivery failed, removing participant"
                );
                if let Some(outcome) = registry.leave_if_current(session_id, role, &sink) {
                    evictions.push((role, outcome));
                }
            }
        }
    }

    // Survivors learn about evicted participants, same as an explicit leave.
    for (role, outcome) in evictions {
        for (_, peer) in outcome.peers {
            let _ = peer.send_json(&participant_left_frame(role)).await;
        }
    }
    delivered
}
