//! Enemies: chase the player, shrink when shot, die below a minimum radius

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::{Body, Entity, UpdateCtx};
use crate::error::SimError;
use crate::tuning::Tuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyKind {
    Grunt,
    /// Scripted-event boss; shoots at the player
    Boss,
}

/// Which sprite set to draw, relative to the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Facing {
    LeftNeutral,
    LeftAbove,
    LeftBelow,
    RightNeutral,
    RightAbove,
    RightBelow,
}

impl Facing {
    fn index(self) -> usize {
        self as usize
    }

    /// Face toward the player; above/below once the vertical offset
    /// exceeds `dead_zone`
    fn toward(delta: Vec2, dead_zone: f32) -> Self {
        let right = delta.x >= 0.0;
        match (right, delta.y < -dead_zone, delta.y > dead_zone) {
            (false, true, _) => Facing::LeftAbove,
            (false, _, true) => Facing::LeftBelow,
            (false, _, _) => Facing::LeftNeutral,
            (true, true, _) => Facing::RightAbove,
            (true, _, true) => Facing::RightBelow,
            (true, _, _) => Facing::RightNeutral,
        }
    }
}

const SPRITES: [[&str; 2]; 6] = [
    ["enemy_left_0", "enemy_left_1"],
    ["enemy_left_up_0", "enemy_left_up_1"],
    ["enemy_left_down_0", "enemy_left_down_1"],
    ["enemy_right_0", "enemy_right_1"],
    ["enemy_right_up_0", "enemy_right_up_1"],
    ["enemy_right_down_0", "enemy_right_down_1"],
];

/// Spawn template for timed enemy spawns
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Archetype {
    pub name: &'static str,
    pub radius: f32,
    pub weight: u32,
    pub speed: f32,
    pub color: u32,
}

pub const ARCHETYPES: [Archetype; 4] = [
    Archetype { name: "small", radius: 15.0, weight: 9, speed: 1.3, color: 0xff6b6b },
    Archetype { name: "medium", radius: 25.0, weight: 6, speed: 1.0, color: 0xf06595 },
    Archetype { name: "large", radius: 35.0, weight: 4, speed: 0.8, color: 0xcc5de8 },
    Archetype { name: "huge", radius: 45.0, weight: 2, speed: 0.6, color: 0x845ef7 },
];

#[derive(Debug, Clone, PartialEq)]
pub struct Enemy {
    pub body: Body,
    pub kind: EnemyKind,
    /// Radius at spawn; drives kill value and XP
    pub initial_radius: f32,
    /// Destroyed once damage would leave the radius at or below this
    pub min_radius: f32,
    pub aggro_radius: f32,
    pub follow_speed: f32,
    pub ease: f32,
    pub level_scaling: f32,
    /// Ticks until this enemy can hurt the player again
    pub contact_timer: u32,
    /// Boss shot countdown (ticks)
    pub fire_timer: u32,
    pub facing: Facing,
    frame: usize,
    frame_timer: u32,
}

impl Enemy {
    const FRAME_TICKS: u32 = 12;
    pub const BOSS_RADIUS: f32 = 90.0;
    pub const BOSS_FIRE_TICKS: u32 = 90;

    pub fn new(id: u32, pos: Vec2, radius: f32, speed: f32, color: u32, tuning: &Tuning) -> Self {
        Self {
            body: Body::new(id, pos, radius, color),
            kind: EnemyKind::Grunt,
            initial_radius: radius.max(0.0),
            min_radius: tuning.enemy_min_radius,
            aggro_radius: tuning.aggro_radius,
            follow_speed: tuning.enemy_speed * speed,
            ease: tuning.enemy_ease,
            level_scaling: tuning.enemy_level_scaling,
            contact_timer: 0,
            fire_timer: 0,
            facing: Facing::RightNeutral,
            frame: 0,
            frame_timer: 0,
        }
    }

    pub fn from_archetype(id: u32, pos: Vec2, archetype: &Archetype, tuning: &Tuning) -> Self {
        Self::new(id, pos, archetype.radius, archetype.speed, archetype.color, tuning)
    }

    pub fn boss(id: u32, pos: Vec2, tuning: &Tuning) -> Self {
        let mut boss = Self::new(id, pos, Self::BOSS_RADIUS, 0.5, 0x212529, tuning);
        boss.kind = EnemyKind::Boss;
        boss.min_radius = tuning.enemy_min_radius * 3.0;
        boss.aggro_radius = f32::INFINITY;
        boss.fire_timer = Self::BOSS_FIRE_TICKS;
        boss.body.sprite = Some("boss");
        boss
    }

    /// Score for destroying this enemy (scaled from its spawn radius)
    pub fn kill_value(&self, score_per_radius: f32) -> u64 {
        (self.initial_radius * score_per_radius).round().max(0.0) as u64
    }

    /// Shrink by `damage`. Returns true if this destroys the enemy.
    pub fn apply_damage(&mut self, damage: f32) -> bool {
        let remaining = self.body.radius - damage;
        self.body.set_radius(remaining);
        remaining <= self.min_radius
    }

    /// Boss shot countdown; true when a shot is due
    pub fn tick_fire(&mut self) -> bool {
        if self.kind != EnemyKind::Boss {
            return false;
        }
        self.fire_timer = self.fire_timer.saturating_sub(1);
        if self.fire_timer == 0 {
            self.fire_timer = Self::BOSS_FIRE_TICKS;
            true
        } else {
            false
        }
    }

    fn animate(&mut self, to_player: Vec2) {
        self.frame_timer += 1;
        if self.frame_timer >= Self::FRAME_TICKS {
            self.frame_timer = 0;
            self.frame ^= 1;
        }
        if self.kind == EnemyKind::Grunt {
            self.facing = Facing::toward(to_player, self.body.radius);
            self.body.sprite = Some(SPRITES[self.facing.index()][self.frame]);
        }
    }
}

impl Entity for Enemy {
    fn body(&self) -> &Body {
        &self.body
    }
    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn update(&mut self, ctx: &UpdateCtx) -> Result<(), SimError> {
        self.body.integrate();
        // A poisoned axis would stay NaN through the easing below
        if !self.body.vel.x.is_finite() {
            self.body.vel.x = 0.0;
        }
        if !self.body.vel.y.is_finite() {
            self.body.vel.y = 0.0;
        }

        let to_player = ctx.player_pos - self.body.pos;
        if to_player.length() <= self.aggro_radius {
            // Ease toward a chase velocity that speeds up with player level
            let scale = 1.0 + self.level_scaling * ctx.player_level.saturating_sub(1) as f32;
            let desired = to_player.normalize_or_zero() * self.follow_speed * scale;
            self.body.vel += (desired - self.body.vel) * self.ease;
        }

        self.contact_timer = self.contact_timer.saturating_sub(1);
        self.animate(to_player);
        Ok(())
    }
}
