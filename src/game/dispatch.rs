//! Outbound message routing to connected clients

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::ws::protocol::ServerMsg;

use super::SessionId;

/// Where a message produced by the simulation should go
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// Only this session
    Unicast(SessionId, ServerMsg),
    /// Every connected session
    Broadcast(ServerMsg),
    /// Every connected session except the origin
    BroadcastExcept(SessionId, ServerMsg),
}

/// Per-connection outboxes, keyed by session id
#[derive(Default)]
pub struct ConnectionRegistry {
    outboxes: HashMap<SessionId, mpsc::Sender<ServerMsg>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, session_id: SessionId, outbox: mpsc::Sender<ServerMsg>) {
        if self.outboxes.insert(session_id, outbox).is_some() {
            warn!(session_id = %session_id, "Replaced existing outbox");
        }
    }

    pub fn unregister(&mut self, session_id: &SessionId) {
        self.outboxes.remove(session_id);
    }

    pub fn is_empty(&self) -> bool {
        self.outboxes.is_empty()
    }

    /// Deliver a dispatch without waiting on any receiver
    pub fn deliver(&self, dispatch: Dispatch) {
        match dispatch {
            Dispatch::Unicast(to, msg) => {
                if let Some(outbox) = self.outboxes.get(&to) {
                    Self::push(&to, outbox, msg);
                }
            }
            Dispatch::Broadcast(msg) => {
                for (session_id, outbox) in &self.outboxes {
                    Self::push(session_id, outbox, msg.clone());
                }
            }
            Dispatch::BroadcastExcept(origin, msg) => {
                for (session_id, outbox) in self.outboxes.iter().filter(|(id, _)| **id != origin) {
                    Self::push(session_id, outbox, msg.clone());
                }
            }
        }
    }

    fn push(session_id: &SessionId, outbox: &mpsc::Sender<ServerMsg>, msg: ServerMsg) {
        match outbox.try_send(msg) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(msg)) => {
                warn!(
                    session_id = %session_id,
                    event = msg.event_name(),
                    "Outbox full, dropping message"
                );
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!(session_id = %session_id, "Outbox closed");
            }
        }
    }
}
