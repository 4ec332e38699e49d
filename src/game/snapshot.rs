//! Snapshot building for network transmission

use std::collections::HashMap;

use crate::ws::protocol::{InitPayload, ServerMsg, UpdatePayload};

use super::obstacles::obstacles;
use super::{Bullet, Player, SessionId};

/// Builds the state payloads sent to clients
pub struct SnapshotBuilder;

impl SnapshotBuilder {
    /// Full state for a new connection, obstacles included
    pub fn init(players: &HashMap<SessionId, Player>, bullets: &[Bullet]) -> ServerMsg {
        ServerMsg::Init(InitPayload {
            players: players.clone(),
            bullets: bullets.to_vec(),
            obstacles: obstacles(),
        })
    }

    /// Per-tick state, without obstacles
    pub fn update(players: &HashMap<SessionId, Player>, bullets: &[Bullet]) -> ServerMsg {
        ServerMsg::Update(UpdatePayload {
            players: players.clone(),
            bullets: bullets.to_vec(),
        })
    }
}
