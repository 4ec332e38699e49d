//! Arena state and authoritative tick loop

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::util::time::{unix_millis, TICK_DURATION};
use crate::ws::protocol::{Direction, InputPayload, ServerMsg};

use super::combat::{Bullet, CombatSystem};
use super::dispatch::{ConnectionRegistry, Dispatch};
use super::physics::PhysicsSystem;
use super::snapshot::SnapshotBuilder;
use super::SessionId;

/// Spawn x is drawn from this range
pub const SPAWN_X_MIN: f64 = 100.0;
pub const SPAWN_X_MAX: f64 = 1100.0;
/// Every tank spawns on this row
pub const SPAWN_Y: f64 = 700.0;

/// Queued commands before transport senders wait
const COMMAND_CHANNEL_CAPACITY: usize = 1024;

/// Player state in the arena (authoritative, also the wire shape)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: SessionId,
    /// Top-left corner of the tank
    pub x: f64,
    pub y: f64,
    pub direction: Direction,
    /// Display color, `#rrggbb`
    pub color: String,
    /// Time of the last bullet fired in milliseconds, 0 if never
    pub last_fire: u64,
}

impl Player {
    pub fn spawn(id: SessionId, rng: &mut ChaCha8Rng) -> Self {
        Self {
            id,
            x: rng.gen_range(SPAWN_X_MIN..SPAWN_X_MAX),
            y: SPAWN_Y,
            direction: Direction::Up,
            color: format!("#{:06x}", rng.gen_range(0..0xFF_FFFFu32)),
            last_fire: 0,
        }
    }
}

/// Arena state (owned by the arena task)
pub struct ArenaState {
    pub players: HashMap<SessionId, Player>,
    /// Live bullets in creation order
    pub bullets: Vec<Bullet>,
    rng: ChaCha8Rng,
    next_bullet_id: u64,
}

impl ArenaState {
    pub fn new(seed: u64) -> Self {
        Self {
            players: HashMap::new(),
            bullets: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            next_bullet_id: 1,
        }
    }

    /// Add a player for a new session.
    ///
    /// The newcomer gets the full state, everyone else hears about the newcomer.
    pub fn on_connect(&mut self, session_id: SessionId) -> Vec<Dispatch> {
        let mut dispatches = Vec::with_capacity(2);

        if let Entry::Vacant(slot) = self.players.entry(session_id) {
            let player = Player::spawn(session_id, &mut self.rng);
            slot.insert(player.clone());
            dispatches.push(Dispatch::BroadcastExcept(
                session_id,
                ServerMsg::PlayerJoined(player),
            ));
        }

        dispatches.insert(
            0,
            Dispatch::Unicast(session_id, SnapshotBuilder::init(&self.players, &self.bullets)),
        );
        dispatches
    }

    /// Apply one input frame. Inputs for unknown sessions are ignored.
    pub fn on_input(
        &mut self,
        session_id: SessionId,
        input: &InputPayload,
        now: u64,
    ) -> Vec<Dispatch> {
        let Some(player) = self.players.get_mut(&session_id) else {
            return Vec::new();
        };

        let (x, y) = PhysicsSystem::move_tank(player.x, player.y, input);
        player.x = x;
        player.y = y;

        if let Some(direction) = input.direction {
            player.direction = direction;
        }

        if input.fire && CombatSystem::can_fire(player.last_fire, now) {
            let bullet = Bullet::fire(
                self.next_bullet_id,
                session_id,
                player.x,
                player.y,
                player.direction,
                now,
            );
            self.next_bullet_id += 1;
            player.last_fire = now;
            self.bullets.push(bullet.clone());

            debug!(session_id = %session_id, bullet_id = bullet.id, "Bullet fired");
            return vec![Dispatch::Broadcast(ServerMsg::BulletCreated(bullet))];
        }

        Vec::new()
    }

    /// Remove a player. Unknown sessions produce nothing.
    pub fn on_disconnect(&mut self, session_id: SessionId) -> Vec<Dispatch> {
        match self.players.remove(&session_id) {
            Some(_) => vec![Dispatch::Broadcast(ServerMsg::PlayerLeft(session_id))],
            None => Vec::new(),
        }
    }

    /// Advance bullets and produce the state broadcast
    pub fn tick(&mut self, now: u64) -> Dispatch {
        CombatSystem::update_bullets(&mut self.bullets, now);
        Dispatch::Broadcast(SnapshotBuilder::update(&self.players, &self.bullets))
    }
}

/// Commands from the transport layer to the arena task
#[derive(Debug)]
pub enum ArenaCommand {
    Connect {
        session_id: SessionId,
        outbox: mpsc::Sender<ServerMsg>,
    },
    Input {
        session_id: SessionId,
        input: InputPayload,
    },
    Disconnect {
        session_id: SessionId,
    },
}

/// Arena errors
#[derive(Debug, thiserror::Error)]
pub enum ArenaError {
    #[error("Arena task is no longer running")]
    Closed,
}

/// Handle to the running arena
#[derive(Clone)]
pub struct ArenaHandle {
    command_tx: mpsc::Sender<ArenaCommand>,
    player_count: Arc<AtomicUsize>,
}

impl ArenaHandle {
    pub fn player_count(&self) -> usize {
        self.player_count.load(Ordering::Relaxed)
    }

    pub async fn connect(
        &self,
        session_id: SessionId,
        outbox: mpsc::Sender<ServerMsg>,
    ) -> Result<(), ArenaError> {
        self.send(ArenaCommand::Connect { session_id, outbox }).await
    }

    pub async fn input(&self, session_id: SessionId, input: InputPayload) -> Result<(), ArenaError> {
        self.send(ArenaCommand::Input { session_id, input }).await
    }

    pub async fn disconnect(&self, session_id: SessionId) -> Result<(), ArenaError> {
        self.send(ArenaCommand::Disconnect { session_id }).await
    }

    async fn send(&self, command: ArenaCommand) -> Result<(), ArenaError> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| ArenaError::Closed)
    }
}

/// The authoritative arena task
pub struct GameArena {
    state: ArenaState,
    command_rx: mpsc::Receiver<ArenaCommand>,
    connections: ConnectionRegistry,
    player_count: Arc<AtomicUsize>,
}

impl GameArena {
    /// Create a new arena
    pub fn new(seed: u64) -> (Self, ArenaHandle) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let player_count = Arc::new(AtomicUsize::new(0));

        let handle = ArenaHandle {
            command_tx,
            player_count: player_count.clone(),
        };

        let arena = Self {
            state: ArenaState::new(seed),
            command_rx,
            connections: ConnectionRegistry::new(),
            player_count,
        };

        (arena, handle)
    }

    /// Run commands and the fixed-rate tick until shutdown or all handles drop
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(tick_ms = TICK_DURATION.as_secs_f64() * 1000.0, "Arena started");

        let mut tick_interval = interval(TICK_DURATION);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    info!("Arena shutting down");
                    break;
                }
                command = self.command_rx.recv() => {
                    match command {
                        Some(command) => self.handle_command(command),
                        None => {
                            info!("All arena handles dropped, stopping");
                            break;
                        }
                    }
                }
                _ = tick_interval.tick() => {
                    let update = self.state.tick(unix_millis());
                    if !self.connections.is_empty() {
                        self.connections.deliver(update);
                    }
                }
            }
        }
    }

    fn handle_command(&mut self, command: ArenaCommand) {
        let dispatches = match command {
            ArenaCommand::Connect { session_id, outbox } => {
                self.connections.register(session_id, outbox);
                let dispatches = self.state.on_connect(session_id);
                info!(
                    session_id = %session_id,
                    player_count = self.state.players.len(),
                    "Player connected"
                );
                dispatches
            }
            ArenaCommand::Input { session_id, input } => {
                self.state.on_input(session_id, &input, unix_millis())
            }
            ArenaCommand::Disconnect { session_id } => {
                self.connections.unregister(&session_id);
                let dispatches = self.state.on_disconnect(session_id);
                info!(
                    session_id = %session_id,
                    player_count = self.state.players.len(),
                    "Player disconnected"
                );
                dispatches
            }
        };

        self.player_count
            .store(self.state.players.len(), Ordering::Relaxed);

        for dispatch in dispatches {
            self.connections.deliver(dispatch);
        }
    }
}
