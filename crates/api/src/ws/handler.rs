use std::sync::Arc;

use axum::{
    extract::{
        Path, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::{IntoResponse, Response},
};
use futures::StreamExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use carelink_captions::{AudioChunk, Role, pipeline::PipelineOutcome};

use super::dispatcher;
use super::registry::{CaptionSink, WsSink};
use crate::error::ApiError;
use crate::state::AppState;

pub async fn caption_upgrade(
    State(state): State<AppState>,
    Path((session_id, role)): Path<(String, String)>,
    ws: WebSocketUpgrade,
) -> Response {
    let role: Role = match role.parse() {
        Ok(role) => role,
        Err(e) => return ApiError::BadRequest(e.to_string()).into_response(),
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state, session_id, role))
}

async fn handle_socket(socket: WebSocket, state: AppState, session_id: String, role: Role) {
    let connection_id = Uuid::new_v4().to_string();
    info!(session = %session_id, %role, %connection_id, "WebSocket connected");

    let (sender, mut receiver) = socket.split();
    let sink: Arc<dyn CaptionSink> = WsSink::new(Arc::new(Mutex::new(sender)));

    let joined = state.registry.join(&session_id, role, sink.clone());
    if let Some(old) = joined.superseded {
        info!(session = %session_id, %role, "Superseding prior connection for role");
        old.close().await;
    }

    let _ = sink
        .send_json(&dispatcher::connected_frame(&session_id, role))
        .await;

    // Both sides learn about each other: the existing participant hears
    // about the joiner, the joiner hears who is already in the room.
    for (peer_role, peer) in &joined.peers {
        let _ = peer
            .send_json(&dispatcher::participant_joined_frame(role))
            .await;
        let _ = sink
            .send_json(&dispatcher::participant_joined_frame(*peer_role))
            .await;
    }

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Binary(data)) => {
                let chunk = AudioChunk::new(data.to_vec(), &session_id, role);
                process_chunk(&state, &session_id, &sink, chunk).await;
            }
            Ok(Message::Text(text)) => {
                handle_control(&sink, &session_id, role, text.as_str()).await;
            }
            Ok(Message::Ping(data)) => {
                sink.pong(data.to_vec()).await;
            }
            Ok(Message::Close(_)) => {
                break;
            }
            Err(e) => {
                warn!(session = %session_id, %role, %e, "WebSocket error");
                break;
            }
            _ => {}
        }
    }

    if let Some(left) = state.registry.leave_if_current(&session_id, role, &sink) {
        for (_, peer) in left.peers {
            let _ = peer
                .send_json(&dispatcher::participant_left_frame(role))
                .await;
        }
    }
    info!(session = %session_id, %role, %connection_id, "WebSocket disconnected");
}

/// Runs one chunk through the pipeline on its own task so a panic in any
/// stage is confined to that chunk, then dispatches the outcome. The
/// receive loop stays sequential: one chunk at a time per connection.
async fn process_chunk(
    state: &AppState,
    session_id: &str,
    sink: &Arc<dyn CaptionSink>,
    chunk: AudioChunk,
) {
    let pipeline = state.pipeline.clone();
    let outcome = match tokio::spawn(async move { pipeline.process_chunk(&chunk).await }).await {
        Ok(outcome) => outcome,
        Err(e) => PipelineOutcome::Failed {
            reason: e.to_string(),
        },
    };

    match outcome {
        PipelineOutcome::Caption(caption) => {
            dispatcher::broadcast_caption(&state.registry, session_id, &caption).await;
        }
        PipelineOutcome::Skipped | PipelineOutcome::NoSpeech => {}
        PipelineOutcome::Failed { reason } => {
            warn!(session = %session_id, %reason, "Chunk processing failed");
            let _ = sink
                .send_json(&dispatcher::error_frame("Failed to generate caption"))
                .await;
        }
    }
}

async fn handle_control(sink: &Arc<dyn CaptionSink>, session_id: &str, role: Role, text: &str) {
    let Ok(message) = serde_json::from_str::<serde_json::Value>(text) else {
        debug!(session = %session_id, %role, "Ignoring non-JSON control frame");
        return;
    };

    match message.get("type").and_then(|t| t.as_str()) {
        Some("ping") => {
            let _ = sink.send_json(&dispatcher::pong_frame()).await;
        }
        other => {
            debug!(session = %session_id, %role, kind = ?other, "Ignoring unrecognized control message");
        }
    }
}
