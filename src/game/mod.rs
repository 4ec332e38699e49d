//! Game simulation modules

pub mod arena;
pub mod combat;
pub mod dispatch;
pub mod obstacles;
pub mod physics;
pub mod snapshot;

pub use arena::{ArenaHandle, GameArena, Player};
pub use combat::Bullet;
pub use obstacles::Obstacle;

use uuid::Uuid;

/// Opaque per-connection id issued by the transport, doubles as player id
pub type SessionId = Uuid;
