//! Tank movement and world bounds

use crate::ws::protocol::InputPayload;

/// World width in pixels
pub const WORLD_WIDTH: f64 = 1200.0;
/// World height in pixels
pub const WORLD_HEIGHT: f64 = 800.0;
/// Tank side length; positions are the tank's top-left corner
pub const TANK_SIZE: f64 = 50.0;
/// Distance moved per input on each pressed axis
pub const MOVE_SPEED: f64 = 5.0;

/// Largest x a tank may occupy
pub const MAX_TANK_X: f64 = WORLD_WIDTH - TANK_SIZE;
/// Largest y a tank may occupy
pub const MAX_TANK_Y: f64 = WORLD_HEIGHT - TANK_SIZE;

/// Physics system for tank movement
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Apply one input's movement to a position.
    ///
    /// Axes are independent and diagonals are not normalized. An axis whose
    /// candidate leaves the world keeps its old value rather than being
    /// clamped to the edge.
    /// Returns (new_x, new_y)
    pub fn move_tank(x: f64, y: f64, input: &InputPayload) -> (f64, f64) {
        let mut candidate_x = x;
        let mut candidate_y = y;

        if input.up {
            candidate_y -= MOVE_SPEED;
        }
        if input.down {
            candidate_y += MOVE_SPEED;
        }
        if input.left {
            candidate_x -= MOVE_SPEED;
        }
        if input.right {
            candidate_x += MOVE_SPEED;
        }

        let new_x = if (0.0..=MAX_TANK_X).contains(&candidate_x) {
            candidate_x
        } else {
            x
        };
        let new_y = if (0.0..=MAX_TANK_Y).contains(&candidate_y) {
            candidate_y
        } else {
            y
        };

        (new_x, new_y)
    }

    /// Check if a point lies inside the world rectangle (edges included)
    pub fn in_world(x: f64, y: f64) -> bool {
        (0.0..=WORLD_WIDTH).contains(&x) && (0.0..=WORLD_HEIGHT).contains(&y)
    }
}
