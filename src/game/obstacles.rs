//! Fixed obstacle layout shared by every client

use serde::{Deserialize, Serialize};

/// Axis-aligned wall. Clients draw and collide against these, the server does not.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Obstacle {
    const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }
}

const LAYOUT: [Obstacle; 10] = [
    Obstacle::new(400.0, 300.0, 400.0, 40.0),
    Obstacle::new(500.0, 200.0, 40.0, 400.0),
    Obstacle::new(100.0, 100.0, 120.0, 80.0),
    Obstacle::new(50.0, 600.0, 200.0, 40.0),
    Obstacle::new(950.0, 100.0, 120.0, 80.0),
    Obstacle::new(900.0, 600.0, 200.0, 40.0),
    Obstacle::new(400.0, 50.0, 120.0, 40.0),
    Obstacle::new(400.0, 710.0, 120.0, 40.0),
    Obstacle::new(200.0, 400.0, 80.0, 80.0),
    Obstacle::new(920.0, 400.0, 80.0, 80.0),
];

/// The obstacle set sent in every `init`
pub fn obstacles() -> Vec<Obstacle> {
    LAYOUT.to_vec()
}
