//! The player: input-driven movement, combat stats, and progression

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::ability::{AbilityKind, HeldAbility};
use super::entity::Body;
use super::item::{HeldItem, ItemType};
use crate::error::SimError;
use crate::tuning::Tuning;

/// Stat a bonus or item can modify
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatKey {
    MaxLife,
    Damage,
    CritChance,
    CritMultiplier,
    BulletSpeed,
    ShootCooldown,
    MaxSpeed,
    Acceleration,
    XpMultiplier,
    MaxHeat,
    AbilityDamage(AbilityKind),
    AbilityCooldown(AbilityKind),
    AbilitySize(AbilityKind),
}

/// Directional keys currently held
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputState {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

impl InputState {
    pub fn any(&self) -> bool {
        self.left || self.right || self.up || self.down
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

#[derive(Debug, Clone)]
pub struct Player {
    pub body: Body,

    // === Movement ===
    pub acceleration: f32,
    pub friction: f32,
    pub max_speed: f32,

    // === Combat ===
    pub bullet_speed: f32,
    pub bullet_radius: f32,
    /// Ticks between shots
    pub shoot_cooldown: f32,
    /// Ticks until the next shot is allowed
    pub shoot_timer: f32,
    pub damage: f32,
    /// Percent
    pub crit_chance: f32,
    pub crit_multiplier: f32,

    // === Survival ===
    pub life: f32,
    pub max_life: f32,
    pub heat: f32,
    pub max_heat: f32,

    // === Progression ===
    pub level: u32,
    pub xp: f32,
    pub xp_to_next: f32,
    pub xp_multiplier: f32,
    pub kills: u32,

    pub items: Vec<HeldItem>,
    pub abilities: Vec<HeldAbility>,

    // === Input ===
    pub input: InputState,
    pub mouse: Vec2,
    /// Fire button held
    pub firing: bool,
    /// One-shot fire request, consumed by the next tick
    pub fire_requested: bool,
}

impl Player {
    pub fn new(id: u32, tuning: &Tuning) -> Self {
        let center = tuning.arena_size() * 0.5;
        Self {
            body: Body::new(id, center, tuning.player_radius, 0x4361ee),
            acceleration: tuning.acceleration,
            friction: tuning.friction,
            max_speed: tuning.max_speed,
            bullet_speed: tuning.bullet_speed,
            bullet_radius: tuning.bullet_radius,
            shoot_cooldown: tuning.shoot_cooldown,
            shoot_timer: 0.0,
            damage: tuning.base_damage,
            crit_chance: tuning.crit_chance,
            crit_multiplier: tuning.crit_multiplier,
            life: tuning.max_life,
            max_life: tuning.max_life,
            heat: 0.0,
            max_heat: tuning.max_heat,
            level: 1,
            xp: 0.0,
            xp_to_next: tuning.xp_first_level,
            xp_multiplier: 1.0,
            kills: 0,
            items: Vec::new(),
            abilities: Vec::new(),
            input: InputState::default(),
            mouse: center,
            firing: false,
            fire_requested: false,
        }
    }

    pub fn set_direction(&mut self, dir: Direction, pressed: bool) {
        match dir {
            Direction::Left => self.input.left = pressed,
            Direction::Right => self.input.right = pressed,
            Direction::Up => self.input.up = pressed,
            Direction::Down => self.input.down = pressed,
        }
    }

    /// Movement step: accelerate from input, clamp, apply friction when no
    /// key is held, integrate, then keep the circle inside the arena.
    pub fn update(&mut self, arena: Vec2) {
        let vel = &mut self.body.vel;
        if !vel.x.is_finite() {
            vel.x = 0.0;
        }
        if !vel.y.is_finite() {
            vel.y = 0.0;
        }

        if self.input.left {
            vel.x -= self.acceleration;
        }
        if self.input.right {
            vel.x += self.acceleration;
        }
        if self.input.up {
            vel.y -= self.acceleration;
        }
        if self.input.down {
            vel.y += self.acceleration;
        }

        let max = self.max_speed.max(0.0);
        *vel = vel.clamp(Vec2::splat(-max), Vec2::splat(max));

        if !self.input.any() {
            *vel *= self.friction;
        }

        self.body.integrate();
        self.contain(arena);
    }

    /// Clamp into the arena, bouncing velocity off any edge crossed
    pub fn contain(&mut self, arena: Vec2) {
        let r = self.body.radius;
        let body = &mut self.body;

        if body.pos.x - r < 0.0 {
            body.pos.x = r;
            body.vel.x = body.vel.x.abs();
        } else if body.pos.x + r > arena.x {
            body.pos.x = arena.x - r;
            body.vel.x = -body.vel.x.abs();
        }
        if body.pos.y - r < 0.0 {
            body.pos.y = r;
            body.vel.y = body.vel.y.abs();
        } else if body.pos.y + r > arena.y {
            body.pos.y = arena.y - r;
            body.vel.y = -body.vel.y.abs();
        }
    }

    /// Returns the life left
    pub fn take_damage(&mut self, amount: f32) -> f32 {
        self.life = (self.life - amount.max(0.0)).clamp(0.0, self.max_life);
        self.life
    }

    pub fn heal(&mut self, amount: f32) {
        self.life = (self.life + amount.max(0.0)).min(self.max_life);
    }

    pub fn is_dead(&self) -> bool {
        self.life <= 0.0
    }

    pub fn add_heat(&mut self, amount: f32) {
        self.heat = (self.heat + amount).clamp(0.0, self.max_heat);
    }

    pub fn has_ability(&self, kind: AbilityKind) -> bool {
        self.abilities.iter().any(|a| a.kind == kind)
    }

    pub fn ability_mut(&mut self, kind: AbilityKind) -> Option<&mut HeldAbility> {
        self.abilities.iter_mut().find(|a| a.kind == kind)
    }

    pub fn has_stat(&self, key: StatKey) -> bool {
        match key {
            StatKey::AbilityDamage(kind)
            | StatKey::AbilityCooldown(kind)
            | StatKey::AbilitySize(kind) => self.has_ability(kind),
            _ => true,
        }
    }

    pub fn stat_mut(&mut self, key: StatKey) -> Result<&mut f32, SimError> {
        let stat = match key {
            StatKey::MaxLife => &mut self.max_life,
            StatKey::Damage => &mut self.damage,
            StatKey::CritChance => &mut self.crit_chance,
            StatKey::CritMultiplier => &mut self.crit_multiplier,
            StatKey::BulletSpeed => &mut self.bullet_speed,
            StatKey::ShootCooldown => &mut self.shoot_cooldown,
            StatKey::MaxSpeed => &mut self.max_speed,
            StatKey::Acceleration => &mut self.acceleration,
            StatKey::XpMultiplier => &mut self.xp_multiplier,
            StatKey::MaxHeat => &mut self.max_heat,
            StatKey::AbilityDamage(kind) => &mut self.held(kind, key)?.damage,
            StatKey::AbilityCooldown(kind) => &mut self.held(kind, key)?.cooldown,
            StatKey::AbilitySize(kind) => &mut self.held(kind, key)?.size,
        };
        Ok(stat)
    }

    fn held(&mut self, kind: AbilityKind, key: StatKey) -> Result<&mut HeldAbility, SimError> {
        self.ability_mut(kind)
            .ok_or_else(|| SimError::UnknownStat(format!("{key:?}")))
    }

    /// Add `amount` to a stat, then restore the life/heat invariants
    pub fn apply_stat(&mut self, key: StatKey, amount: f32) -> Result<(), SimError> {
        *self.stat_mut(key)? += amount;
        self.max_life = self.max_life.max(1.0);
        self.life = self.life.min(self.max_life);
        self.heat = self.heat.min(self.max_heat);
        Ok(())
    }

    /// Take a copy of `def` into the inventory and apply its effects.
    ///
    /// Returns the ability the item triggers, if any.
    pub fn pick_up(&mut self, def: &ItemType) -> Option<AbilityKind> {
        let held = HeldItem::new(def);
        for &(key, amount) in &held.def.modifiers {
            if let Err(e) = self.apply_stat(key, amount) {
                log::error!("Item {} has a bad modifier: {e}", held.def.name);
            }
        }
        self.heal(held.def.heal);
        let trigger = held.def.triggers;
        self.items.push(held);
        trigger
    }

    /// Count down temporary items, reverting the ones that run out
    pub fn tick_items(&mut self) {
        let mut expired = Vec::new();
        self.items.retain_mut(|item| match item.remaining.as_mut() {
            Some(left) => {
                *left = left.saturating_sub(1);
                if *left == 0 {
                    expired.push(item.def.clone());
                    false
                } else {
                    true
                }
            }
            None => true,
        });

        for def in expired {
            for &(key, amount) in &def.modifiers {
                if let Err(e) = self.apply_stat(key, -amount) {
                    log::error!("Could not revert {}: {e}", def.name);
                }
            }
            log::debug!("Item {} wore off", def.name);
        }
    }

    /// Shots are never faster than one per tick
    pub fn effective_shoot_cooldown(&self) -> f32 {
        self.shoot_cooldown.max(1.0)
    }
}
