//! Held abilities and the timed effects they leave in the world
//!
//! An ability owned by the player counts down its cooldown each tick and,
//! when ready, spawns an `AbilityEffect`. Effects carry an explicit shape
//! tag that the collision pass reads; each kind grows and decays in its own
//! way and is removed once its duration runs out.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI, TAU};

use super::collision::OrientedRect;
use super::entity::{Body, Entity, UpdateCtx};
use crate::error::SimError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbilityKind {
    Kamehameha,
    SolarFlare,
    Slash,
    Vortex,
    Turret,
}

impl AbilityKind {
    pub fn name(&self) -> &'static str {
        match self {
            AbilityKind::Kamehameha => "Kamehameha",
            AbilityKind::SolarFlare => "Solar Flare",
            AbilityKind::Slash => "Slash",
            AbilityKind::Vortex => "Vortex",
            AbilityKind::Turret => "Turret",
        }
    }

    /// (damage, cooldown ticks, size)
    fn base_stats(&self) -> (f32, f32, f32) {
        match self {
            AbilityKind::Kamehameha => (25.0, 300.0, 30.0),
            AbilityKind::SolarFlare => (0.0, 360.0, 120.0),
            AbilityKind::Slash => (15.0, 120.0, 70.0),
            AbilityKind::Vortex => (0.0, 480.0, 60.0),
            AbilityKind::Turret => (8.0, 600.0, 12.0),
        }
    }

    /// Cap on simultaneous instances; spawns past the cap are dropped
    pub fn max_instances(&self) -> Option<usize> {
        match self {
            AbilityKind::Vortex => Some(2),
            AbilityKind::Turret => Some(3),
            _ => None,
        }
    }
}

/// An ability the player owns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeldAbility {
    pub kind: AbilityKind,
    pub damage: f32,
    /// Ticks between activations
    pub cooldown: f32,
    pub size: f32,
    /// Ticks until the next activation
    pub timer: f32,
}

impl HeldAbility {
    pub fn new(kind: AbilityKind) -> Self {
        let (damage, cooldown, size) = kind.base_stats();
        Self {
            kind,
            damage,
            cooldown,
            size,
            timer: cooldown,
        }
    }

    /// Count down one tick; true when the ability fires (and rearms)
    pub fn tick(&mut self) -> bool {
        self.timer -= 1.0;
        if self.timer <= 0.0 {
            self.timer = self.cooldown.max(1.0);
            true
        } else {
            false
        }
    }

    /// Make a shortened cooldown take effect now instead of next cycle
    pub fn restart(&mut self) {
        self.timer = self.timer.min(self.cooldown.max(1.0));
    }
}

/// Collision shape tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectShape {
    Circle,
    OrientedRect,
}

/// Concrete area an effect covers this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitArea {
    Circle { center: Vec2, radius: f32 },
    Rect(OrientedRect),
}

#[derive(Debug, Clone, PartialEq)]
pub enum EffectKind {
    /// Beam from the player toward `angle`; grows, then thins out
    Beam {
        angle: f32,
        length: f32,
        max_length: f32,
        width: f32,
    },
    /// Expanding ring centred where it was cast; grows, then fades
    Explosion { max_radius: f32 },
    /// Blade sweeping an arc around the player
    Slash {
        angle: f32,
        sweep: f32,
        length: f32,
        width: f32,
    },
    /// Stationary well that drags enemies in
    Vortex { pull: f32, spin: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AbilityEffect {
    pub body: Body,
    pub ability: AbilityKind,
    pub kind: EffectKind,
    pub shape: EffectShape,
    pub damage: f32,
    /// Ticks left
    pub duration: u32,
    /// Ticks before the same enemy can be hit again (`None`: once only)
    pub rehit: Option<u64>,
    hits: Vec<(u32, u64)>,
}

impl AbilityEffect {
    const BEAM_DURATION: u32 = 60;
    const BEAM_SHRINK_BELOW: u32 = 20;
    const EXPLOSION_DURATION: u32 = 45;
    const SLASH_DURATION: u32 = 18;
    const VORTEX_DURATION: u32 = 300;

    /// Build the effect for `held`, cast from `origin` toward `aim`
    pub fn cast(id: u32, held: &HeldAbility, origin: Vec2, aim: Vec2, at: Vec2) -> Option<Self> {
        let angle = {
            let d = aim - origin;
            if d.length_squared() > f32::EPSILON {
                d.y.atan2(d.x)
            } else {
                0.0
            }
        };

        let (kind, shape, duration, rehit, pos, radius, color) = match held.kind {
            AbilityKind::Kamehameha => (
                EffectKind::Beam {
                    angle,
                    length: 0.0,
                    max_length: 900.0,
                    width: held.size,
                },
                EffectShape::OrientedRect,
                Self::BEAM_DURATION,
                Some(15),
                origin,
                0.0,
                0x4cc9f0,
            ),
            AbilityKind::SolarFlare => (
                EffectKind::Explosion {
                    max_radius: held.size,
                },
                EffectShape::Circle,
                Self::EXPLOSION_DURATION,
                None,
                origin,
                1.0,
                0xffd166,
            ),
            AbilityKind::Slash => (
                EffectKind::Slash {
                    angle: angle - FRAC_PI_2,
                    sweep: PI / Self::SLASH_DURATION as f32,
                    length: held.size,
                    width: 12.0,
                },
                EffectShape::OrientedRect,
                Self::SLASH_DURATION,
                None,
                origin,
                0.0,
                0xe0e0e0,
            ),
            AbilityKind::Vortex => (
                EffectKind::Vortex {
                    pull: 0.4,
                    spin: 0.0,
                },
                EffectShape::Circle,
                Self::VORTEX_DURATION,
                Some(30),
                at,
                held.size,
                0x9d4edd,
            ),
            // Turrets are world entities, not effects
            AbilityKind::Turret => return None,
        };

        Some(Self {
            body: Body::new(id, pos, radius, color),
            ability: held.kind,
            kind,
            shape,
            damage: held.damage,
            duration,
            rehit,
            hits: Vec::new(),
        })
    }

    pub fn hit_area(&self) -> HitArea {
        match self.kind {
            EffectKind::Beam {
                angle,
                length,
                width,
                ..
            } => HitArea::Rect(OrientedRect::from_origin(self.body.pos, angle, length, width)),
            EffectKind::Slash {
                angle,
                length,
                width,
                ..
            } => HitArea::Rect(OrientedRect::from_origin(self.body.pos, angle, length, width)),
            EffectKind::Explosion { .. } | EffectKind::Vortex { .. } => HitArea::Circle {
                center: self.body.pos,
                radius: self.body.radius,
            },
        }
    }

    /// Whether `enemy_id` may be hit at `tick`; records the hit if so
    pub fn try_hit(&mut self, enemy_id: u32, tick: u64) -> bool {
        match self.hits.iter_mut().find(|(id, _)| *id == enemy_id) {
            Some((_, last)) => match self.rehit {
                Some(interval) if tick >= *last + interval => {
                    *last = tick;
                    true
                }
                _ => false,
            },
            None => {
                self.hits.push((enemy_id, tick));
                true
            }
        }
    }

    /// Acceleration a vortex applies to something at `pos`
    pub fn pull_on(&self, pos: Vec2) -> Vec2 {
        match self.kind {
            EffectKind::Vortex { pull, .. } => {
                let to_center = self.body.pos - pos;
                let dist = to_center.length();
                let range = self.body.radius * 2.0;
                if dist > f32::EPSILON && dist < range {
                    to_center / dist * pull * (1.0 - dist / range)
                } else {
                    Vec2::ZERO
                }
            }
            _ => Vec2::ZERO,
        }
    }
}

impl Entity for AbilityEffect {
    fn body(&self) -> &Body {
        &self.body
    }
    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn update(&mut self, ctx: &UpdateCtx) -> Result<(), SimError> {
        let remaining = self.duration;
        match &mut self.kind {
            EffectKind::Beam {
                length,
                max_length,
                width,
                ..
            } => {
                self.body.pos = ctx.player_pos;
                if remaining > Self::BEAM_SHRINK_BELOW {
                    *length = (*length + 60.0).min(*max_length);
                } else {
                    *width *= 0.85;
                }
            }
            EffectKind::Explosion { max_radius } => {
                if self.body.radius < *max_radius {
                    let grown = self.body.radius + *max_radius / 10.0;
                    self.body.set_radius(grown.min(*max_radius));
                } else {
                    self.body.fade(0.05);
                }
            }
            EffectKind::Slash { angle, sweep, .. } => {
                self.body.pos = ctx.player_pos;
                *angle = (*angle + *sweep) % TAU;
            }
            EffectKind::Vortex { spin, .. } => {
                *spin = (*spin + 0.1) % TAU;
            }
        }

        if !self.body.radius.is_finite() {
            return Err(SimError::Degenerate {
                id: self.body.id,
                reason: "effect radius",
            });
        }

        self.duration = self.duration.saturating_sub(1);
        if self.duration == 0 {
            self.body.removed = true;
        }
        Ok(())
    }
}
