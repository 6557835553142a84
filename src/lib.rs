//! Circle Rush - top-down survival shooter simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, collisions, progression)
//! - `tuning`: Data-driven game balance
//! - `settings`: Gameplay gates (spawning, shooting, abilities, events)
//! - `scores`: Score store contract and local leaderboard

pub mod error;
pub mod scores;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use error::{ConfigError, ScoreError, SimError};
pub use scores::{Leaderboard, ScoreStore};
pub use settings::Settings;
pub use tuning::Tuning;

use glam::Vec2;
use rand::Rng;

/// Game configuration constants (defaults for `Tuning`)
pub mod consts {
    /// Fixed simulation rate (ticks per second)
    pub const TICK_RATE: f32 = 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Playfield dimensions
    pub const ARENA_WIDTH: f32 = 1280.0;
    pub const ARENA_HEIGHT: f32 = 720.0;

    /// Sub-pixel tolerance for every distance-based collision test
    pub const COLLISION_EPSILON: f32 = 0.5;

    /// Player defaults
    pub const PLAYER_RADIUS: f32 = 15.0;
    pub const PLAYER_ACCELERATION: f32 = 0.6;
    pub const PLAYER_MAX_SPEED: f32 = 5.0;
    pub const FRICTION: f32 = 0.9;
    pub const PLAYER_MAX_LIFE: f32 = 100.0;
    pub const PLAYER_MAX_HEAT: f32 = 100.0;

    /// Bullet defaults
    pub const BULLET_RADIUS: f32 = 5.0;
    pub const BULLET_SPEED: f32 = 10.0;
    /// Ticks between automatic shots
    pub const SHOOT_COOLDOWN: f32 = 15.0;
    pub const BASE_DAMAGE: f32 = 10.0;
    pub const CRIT_CHANCE: f32 = 5.0;
    pub const CRIT_MULTIPLIER: f32 = 2.0;

    /// Enemy defaults
    pub const ENEMY_SPEED: f32 = 1.5;
    pub const ENEMY_AGGRO_RADIUS: f32 = 450.0;
    pub const ENEMY_MIN_RADIUS: f32 = 8.0;
    pub const ENEMY_EASE: f32 = 0.04;
    pub const CONTACT_DAMAGE: f32 = 10.0;
    /// Ticks an enemy waits before it can hurt the player again
    pub const CONTACT_COOLDOWN: u32 = 30;
    /// Seconds between timed enemy spawns
    pub const ENEMY_SPAWN_INTERVAL: f32 = 1.2;

    /// Progression
    pub const XP_PER_KILL: f32 = 5.0;
    pub const XP_FIRST_LEVEL: f32 = 100.0;
    pub const XP_GROWTH: f32 = 1.25;
    pub const SCORE_PER_RADIUS: f32 = 10.0;

    /// Heat gauge
    pub const HEAT_PER_KILL: f32 = 8.0;
    pub const HEAT_LOG_FACTOR: f32 = 1.0;
    pub const HEAT_DECAY: f32 = 0.05;

    /// Items
    pub const MAX_ITEMS: usize = 3;
    pub const ITEM_LIFETIME_TICKS: u32 = 540;
    pub const ITEM_RADIUS: f32 = 10.0;
}

/// Rotate a vector counter-clockwise by `angle` radians
#[inline]
pub fn rotate(v: Vec2, angle: f32) -> Vec2 {
    Vec2::from_angle(angle).rotate(v)
}

/// Uniform random point inside `size`, keeping `margin` away from every edge
pub fn random_coords<R: Rng + ?Sized>(rng: &mut R, size: Vec2, margin: f32) -> Vec2 {
    let max_x = (size.x - margin).max(margin);
    let max_y = (size.y - margin).max(margin);
    Vec2::new(
        rng.random_range(margin..=max_x),
        rng.random_range(margin..=max_y),
    )
}

/// Random point on the arena border, offset `margin` outward (for spawns)
pub fn random_edge_coords<R: Rng + ?Sized>(rng: &mut R, size: Vec2, margin: f32) -> Vec2 {
    match rng.random_range(0..4u8) {
        0 => Vec2::new(rng.random_range(0.0..=size.x), -margin),
        1 => Vec2::new(rng.random_range(0.0..=size.x), size.y + margin),
        2 => Vec2::new(-margin, rng.random_range(0.0..=size.y)),
        _ => Vec2::new(size.x + margin, rng.random_range(0.0..=size.y)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_rotate_quarter_turn() {
        let v = rotate(Vec2::new(1.0, 0.0), FRAC_PI_2);
        assert!(v.x.abs() < 1e-5);
        assert!((v.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_random_coords_respects_margin() {
        let mut rng = Pcg32::seed_from_u64(7);
        let size = Vec2::new(200.0, 100.0);
        for _ in 0..1000 {
            let p = random_coords(&mut rng, size, 10.0);
            assert!(p.x >= 10.0 && p.x <= 190.0);
            assert!(p.y >= 10.0 && p.y <= 90.0);
        }
    }

    #[test]
    fn test_edge_coords_are_outside_arena() {
        let mut rng = Pcg32::seed_from_u64(3);
        let size = Vec2::new(200.0, 100.0);
        for _ in 0..200 {
            let p = random_edge_coords(&mut rng, size, 20.0);
            let outside = p.x < 0.0 || p.y < 0.0 || p.x > size.x || p.y > size.y;
            assert!(outside, "{p:?} should be off-screen");
        }
    }
}
