use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use dashmap::DashMap;
use futures::SinkExt;
use futures::stream::SplitSink;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use carelink_captions::Role;

pub type WsSender = Arc<Mutex<SplitSink<WebSocket, Message>>>;

/// Outbound half of a participant connection.
///
/// The registry only ever sees this trait, so membership logic can be
/// tested with in-memory sinks instead of live sockets.
#[async_trait]
pub trait CaptionSink: Send + Sync + 'static {
    async fn send_json(&self, message: &serde_json::Value) -> anyhow::Result<()>;

    async fn close(&self);

    /// Answer a transport-level ping. Non-socket sinks ignore it.
    async fn pong(&self, _data: Vec<u8>) {}
}

/// The real sink: a shared write half of an axum WebSocket.
pub struct WsSink {
    sender: WsSender,
}

impl WsSink {
    pub fn new(sender: WsSender) -> Arc<Self> {
        Arc::new(Self { sender })
    }
}

#[async_trait]
impl CaptionSink for WsSink {
    async fn send_json(&self, message: &serde_json::Value) -> anyhow::Result<()> {
        let text = serde_json::to_string(message)?;
        let mut guard = self.sender.lock().await;
        guard.send(Message::text(text)).await?;
        Ok(())
    }

    async fn close(&self) {
        let mut guard = self.sender.lock().await;
        let _ = guard.send(Message::Close(None)).await;
    }

    async fn pong(&self, data: Vec<u8>) {
        let mut guard = self.sender.lock().await;
        let _ = guard.send(Message::Pong(data.into())).await;
    }
}

/// What `join` displaced and who was already in the room.
pub struct JoinOutcome {
    /// Prior sink for the same role, superseded by this join.
    pub superseded: Option<Arc<dyn CaptionSink>>,
    /// Participants present before the join.
    pub peers: Vec<(Role, Arc<dyn CaptionSink>)>,
}

pub struct LeaveOutcome {
    pub removed: Arc<dyn CaptionSink>,
    /// Participants still in the room after the leave.
    pub peers: Vec<(Role, Arc<dyn CaptionSink>)>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub participants: Vec<Role>,
}

/// Active consultation sessions: session id to at most one sink per role.
///
/// Guards are never held across an await; callers get cloned `Arc` sinks
/// and do their sending outside the map.
pub struct SessionRegistry {
    sessions: DashMap<String, HashMap<Role, Arc<dyn CaptionSink>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Adds a connection for `role`, superseding any prior connection for
    /// the same role. Membership never exceeds one sink per role.
    pub fn join(&self, session_id: &str, role: Role, sink: Arc<dyn CaptionSink>) -> JoinOutcome {
        let mut room = self.sessions.entry(session_id.to_string()).or_default();
        let peers = room
            .iter()
            .filter(|(r, _)| **r != role)
            .map(|(r, s)| (*r, s.clone()))
            .collect();
        let superseded = room.insert(role, sink);
        info!(session = session_id, %role, participants = room.len(), "Participant joined session");
        JoinOutcome { superseded, peers }
    }

    /// Removes `role` from the session and deletes the session record when
    /// it empties.
    pub fn leave(&self, session_id: &str, role: Role) -> Option<LeaveOutcome> {
        let outcome = {
            let mut room = self.sessions.get_mut(session_id)?;
            let removed = room.remove(&role)?;
            let peers = room.iter().map(|(r, s)| (*r, s.clone())).collect();
            LeaveOutcome { removed, peers }
        };
        self.sessions
            .remove_if(session_id, |_, room| room.is_empty());
        info!(session = session_id, %role, "Participant left session");
        Some(outcome)
    }

    /// Like `leave`, but only when `sink` is still the registered
    /// connection for the role. A superseded connection's disconnect must
    /// not evict its replacement.
    pub fn leave_if_current(
        &self,
        session_id: &str,
        role: Role,
        sink: &Arc<dyn CaptionSink>,
    ) -> Option<LeaveOutcome> {
        {
            let room = self.sessions.get(session_id)?;
            let current = room.get(&role)?;
            if !Arc::ptr_eq(current, sink) {
                debug!(session = session_id, %role, "Stale connection closed, keeping replacement");
                return None;
            }
        }
        self.leave(session_id, role)
    }

    /// Delivers a message to the counterpart of `sender_role`, if
    /// connected. A failed delivery counts as a disconnect: the recipient
    /// is removed from the room before this returns `false`.
    pub async fn broadcast_to_other(
        &self,
        session_id: &str,
        sender_role: Role,
        message: &serde_json::Value,
    ) -> bool {
        let other = sender_role.counterpart();
        let Some(sink) = self.sink_for(session_id, other) else {
            return false;
        };
        match sink.send_json(message).await {
            Ok(()) => true,
            Err(e) => {
                warn!(session = session_id, role = %other, error = %e, "Send failed, removing participant");
                if let Some(outcome) = self.leave_if_current(session_id, other, &sink) {
                    for (_, peer) in outcome.peers {
                        let _ = peer
                            .send_json(&super::dispatcher::participant_left_frame(other))
                            .await;
                    }
                }
                false
            }
        }
    }

    pub fn sink_for(&self, session_id: &str, role: Role) -> Option<Arc<dyn CaptionSink>> {
        self.sessions.get(session_id)?.get(&role).cloned()
    }

    /// Snapshot of every connected sink in a session.
    pub fn sinks(&self, session_id: &str) -> Vec<(Role, Arc<dyn CaptionSink>)> {
        self.sessions
            .get(session_id)
            .map(|room| room.iter().map(|(r, s)| (*r, s.clone())).collect())
            .unwrap_or_default()
    }

    pub fn members(&self, session_id: &str) -> Vec<Role> {
        self.sessions
            .get(session_id)
            .map(|room| room.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn summary(&self, session_id: &str) -> Option<SessionSummary> {
        self.sessions.get(session_id).map(|room| SessionSummary {
            session_id: session_id.to_string(),
            participants: room.keys().copied().collect(),
        })
    }

    pub fn summaries(&self) -> Vec<SessionSummary> {
        self.sessions
            .iter()
            .map(|entry| SessionSummary {
                session_id: entry.key().clone(),
                participants: entry.value().keys().copied().collect(),
            })
            .collect()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
