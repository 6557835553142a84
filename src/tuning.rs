//! Data-driven game balance
//!
//! Every constant the simulation reads lives here so tests and tools can
//! override it. Missing JSON fields fall back to `consts`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Timing ===
    /// Simulation ticks per second
    pub tick_rate: f32,
    /// Maximum ticks run for one rendered frame
    pub max_substeps: u32,

    // === Arena ===
    pub arena_width: f32,
    pub arena_height: f32,
    pub epsilon: f32,

    // === Player ===
    pub player_radius: f32,
    pub acceleration: f32,
    pub max_speed: f32,
    pub friction: f32,
    pub max_life: f32,
    pub max_heat: f32,

    // === Bullets ===
    pub bullet_radius: f32,
    pub bullet_speed: f32,
    pub shoot_cooldown: f32,
    pub base_damage: f32,
    pub crit_chance: f32,
    pub crit_multiplier: f32,

    // === Enemies ===
    pub enemy_speed: f32,
    pub aggro_radius: f32,
    pub enemy_min_radius: f32,
    pub enemy_ease: f32,
    /// Extra follow speed per player level (fraction of base)
    pub enemy_level_scaling: f32,
    pub contact_damage: f32,
    pub contact_cooldown: u32,
    /// Knockback applied to the player, in multiples of enemy velocity
    pub knockback: f32,
    pub spawn_interval: f32,
    pub min_spawn_interval: f32,
    /// Interval multiplier applied every `spawn_speedup_kills`
    pub spawn_speedup: f32,
    pub spawn_speedup_kills: u32,

    // === Progression ===
    pub xp_per_kill: f32,
    pub xp_first_level: f32,
    pub xp_growth: f32,
    pub score_per_radius: f32,

    // === Heat ===
    pub heat_per_kill: f32,
    pub heat_log_factor: f32,
    pub heat_decay: f32,
    pub heat_burst_base: u32,
    pub heat_burst_per_level: u32,

    // === Items ===
    pub max_items: usize,
    pub item_every_kills: u32,
    pub item_lifetime: u32,
    pub item_radius: f32,

    // === Scripted events ===
    /// Seconds between random world events
    pub event_interval: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            tick_rate: TICK_RATE,
            max_substeps: MAX_SUBSTEPS,

            arena_width: ARENA_WIDTH,
            arena_height: ARENA_HEIGHT,
            epsilon: COLLISION_EPSILON,

            player_radius: PLAYER_RADIUS,
            acceleration: PLAYER_ACCELERATION,
            max_speed: PLAYER_MAX_SPEED,
            friction: FRICTION,
            max_life: PLAYER_MAX_LIFE,
            max_heat: PLAYER_MAX_HEAT,

            bullet_radius: BULLET_RADIUS,
            bullet_speed: BULLET_SPEED,
            shoot_cooldown: SHOOT_COOLDOWN,
            base_damage: BASE_DAMAGE,
            crit_chance: CRIT_CHANCE,
            crit_multiplier: CRIT_MULTIPLIER,

            enemy_speed: ENEMY_SPEED,
            aggro_radius: ENEMY_AGGRO_RADIUS,
            enemy_min_radius: ENEMY_MIN_RADIUS,
            enemy_ease: ENEMY_EASE,
            enemy_level_scaling: 0.05,
            contact_damage: CONTACT_DAMAGE,
            contact_cooldown: CONTACT_COOLDOWN,
            knockback: 3.0,
            spawn_interval: ENEMY_SPAWN_INTERVAL,
            min_spawn_interval: 0.25,
            spawn_speedup: 0.9,
            spawn_speedup_kills: 20,

            xp_per_kill: XP_PER_KILL,
            xp_first_level: XP_FIRST_LEVEL,
            xp_growth: XP_GROWTH,
            score_per_radius: SCORE_PER_RADIUS,

            heat_per_kill: HEAT_PER_KILL,
            heat_log_factor: HEAT_LOG_FACTOR,
            heat_decay: HEAT_DECAY,
            heat_burst_base: 6,
            heat_burst_per_level: 2,

            max_items: MAX_ITEMS,
            item_every_kills: 10,
            item_lifetime: ITEM_LIFETIME_TICKS,
            item_radius: ITEM_RADIUS,

            event_interval: 45.0,
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) JSON override and validate it
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values that would break the fixed-step loop or geometry
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tick_rate.is_finite() && self.tick_rate > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "tick_rate must be positive, got {}",
                self.tick_rate
            )));
        }
        if self.max_substeps == 0 {
            return Err(ConfigError::Invalid("max_substeps must be at least 1".into()));
        }
        if self.arena_width <= self.player_radius * 2.0
            || self.arena_height <= self.player_radius * 2.0
        {
            return Err(ConfigError::Invalid("arena smaller than the player".into()));
        }
        if !(0.0..=1.0).contains(&self.friction) {
            return Err(ConfigError::Invalid(format!(
                "friction must be within [0, 1], got {}",
                self.friction
            )));
        }
        if self.xp_growth < 1.0 {
            return Err(ConfigError::Invalid("xp_growth must be >= 1".into()));
        }
        if self.enemy_min_radius < 0.0 || self.bullet_radius < 0.0 {
            return Err(ConfigError::Invalid("radii must not be negative".into()));
        }
        Ok(())
    }

    /// Duration of one tick in seconds
    #[inline]
    pub fn tick_dt(&self) -> f32 {
        1.0 / self.tick_rate
    }

    #[inline]
    pub fn arena_size(&self) -> Vec2 {
        Vec2::new(self.arena_width, self.arena_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_override_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "tick_rate": 120.0, "friction": 0.5 }"#).unwrap();
        assert_eq!(tuning.tick_rate, 120.0);
        assert_eq!(tuning.friction, 0.5);
        assert_eq!(tuning.enemy_min_radius, ENEMY_MIN_RADIUS);
    }

    #[test]
    fn test_invalid_tick_rate_rejected() {
        let err = Tuning::from_json(r#"{ "tick_rate": 0.0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = Tuning::from_json("{ tick_rate: ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_json_round_trip_preserves_values() {
        let mut tuning = Tuning::default();
        tuning.heat_decay = 0.2;
        let back = Tuning::from_json(&tuning.to_json().unwrap()).unwrap();
        assert_eq!(back, tuning);
    }
}
