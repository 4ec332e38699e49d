//! Combat system - firing cooldown and bullet lifecycle

use serde::{Deserialize, Serialize};

use crate::util::time::elapsed_ms;
use crate::ws::protocol::Direction;

use super::physics::{PhysicsSystem, TANK_SIZE};
use super::SessionId;

/// Minimum time between two shots from the same tank
pub const FIRE_COOLDOWN_MS: u64 = 500;
/// Bullet travel per tick
pub const BULLET_SPEED: f64 = 8.0;
/// Bullets older than this are removed
pub const BULLET_MAX_AGE_MS: u64 = 2500;
/// Muzzle distance from the tank center
pub const MUZZLE_OFFSET: f64 = 35.0;

/// Active bullet in the arena
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bullet {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub speed_x: f64,
    pub speed_y: f64,
    pub owner: SessionId,
    /// Creation time in milliseconds
    pub timestamp: u64,
}

impl Bullet {
    /// Create a bullet leaving the muzzle of a tank at (tank_x, tank_y)
    pub fn fire(
        id: u64,
        owner: SessionId,
        tank_x: f64,
        tank_y: f64,
        direction: Direction,
        now: u64,
    ) -> Self {
        let angle = direction.angle_radians();
        let (sin, cos) = angle.sin_cos();
        let center = TANK_SIZE / 2.0;

        Self {
            id,
            x: tank_x + center + sin * MUZZLE_OFFSET,
            y: tank_y + center - cos * MUZZLE_OFFSET,
            speed_x: sin * BULLET_SPEED,
            speed_y: -cos * BULLET_SPEED,
            owner,
            timestamp: now,
        }
    }

    /// Move by one tick of velocity
    pub fn advance(&mut self) {
        self.x += self.speed_x;
        self.y += self.speed_y;
    }

    /// Whether the bullet survives this tick: inside the world and not expired
    pub fn is_live(&self, now: u64) -> bool {
        PhysicsSystem::in_world(self.x, self.y)
            && elapsed_ms(self.timestamp, now) < BULLET_MAX_AGE_MS
    }
}

/// Combat system for managing weapons
pub struct CombatSystem;

impl CombatSystem {
    /// Check if a tank can fire (cooldown strictly elapsed)
    pub fn can_fire(last_fire: u64, now: u64) -> bool {
        elapsed_ms(last_fire, now) > FIRE_COOLDOWN_MS
    }

    /// Advance every bullet and drop the ones that left the world or expired
    pub fn update_bullets(bullets: &mut Vec<Bullet>, now: u64) {
        bullets.retain_mut(|bullet| {
            bullet.advance();
            bullet.is_live(now)
        });
    }
}
