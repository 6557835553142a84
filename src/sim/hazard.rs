//! Stationary world entities: player turrets, black holes, and walls

use glam::Vec2;

use super::collision::Rect;
use super::entity::{Body, Entity, UpdateCtx};
use crate::error::SimError;

/// Auto-firing turret dropped by the Turret ability
#[derive(Debug, Clone, PartialEq)]
pub struct Turret {
    pub body: Body,
    pub damage: f32,
    pub range: f32,
    /// Ticks between shots
    pub cooldown: u32,
    timer: u32,
    ticks_left: u32,
}

impl Turret {
    pub const LIFETIME: u32 = 900;
    pub const RANGE: f32 = 350.0;
    pub const COOLDOWN: u32 = 30;

    pub fn new(id: u32, pos: Vec2, radius: f32, damage: f32) -> Self {
        let mut body = Body::new(id, pos, radius, 0x8ecae6);
        body.sprite = Some("turret");
        Self {
            body,
            damage,
            range: Self::RANGE,
            cooldown: Self::COOLDOWN,
            timer: Self::COOLDOWN,
            ticks_left: Self::LIFETIME,
        }
    }

    /// Shot countdown; true when the turret may fire this tick
    pub fn ready(&mut self) -> bool {
        self.timer = self.timer.saturating_sub(1);
        if self.timer == 0 {
            self.timer = self.cooldown.max(1);
            true
        } else {
            false
        }
    }

    /// Closest target within range
    pub fn pick_target(&self, targets: impl Iterator<Item = Vec2>) -> Option<Vec2> {
        targets
            .filter(|t| t.distance(self.body.pos) <= self.range)
            .min_by(|a, b| {
                a.distance_squared(self.body.pos)
                    .total_cmp(&b.distance_squared(self.body.pos))
            })
    }
}

impl Entity for Turret {
    fn body(&self) -> &Body {
        &self.body
    }
    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn update(&mut self, _ctx: &UpdateCtx) -> Result<(), SimError> {
        self.ticks_left = self.ticks_left.saturating_sub(1);
        if self.ticks_left == 0 {
            self.body.removed = true;
        }
        Ok(())
    }
}

/// Gravity well that drags the player and enemies in
#[derive(Debug, Clone, PartialEq)]
pub struct BlackHole {
    pub body: Body,
    /// Peak acceleration at the edge of the core
    pub pull: f32,
    /// Influence radius
    pub range: f32,
    pub contact_damage: f32,
    /// Ticks until the core can hurt the player again
    pub contact_timer: u32,
    ticks_left: u32,
}

impl BlackHole {
    pub const LIFETIME: u32 = 600;

    pub fn new(id: u32, pos: Vec2) -> Self {
        let mut body = Body::new(id, pos, 30.0, 0x10002b);
        body.sprite = Some("black_hole");
        Self {
            body,
            pull: 0.35,
            range: 320.0,
            contact_damage: 15.0,
            contact_timer: 0,
            ticks_left: Self::LIFETIME,
        }
    }

    /// Acceleration toward the core for something at `pos`; stronger closer in
    pub fn pull_on(&self, pos: Vec2) -> Vec2 {
        let to_core = self.body.pos - pos;
        let dist = to_core.length();
        if dist <= f32::EPSILON || dist >= self.range {
            return Vec2::ZERO;
        }
        to_core / dist * self.pull * (1.0 - dist / self.range)
    }
}

impl Entity for BlackHole {
    fn body(&self) -> &Body {
        &self.body
    }
    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn update(&mut self, _ctx: &UpdateCtx) -> Result<(), SimError> {
        self.contact_timer = self.contact_timer.saturating_sub(1);
        self.ticks_left = self.ticks_left.saturating_sub(1);
        if self.ticks_left < 60 {
            self.body.fade(1.0 / 60.0);
        }
        if self.ticks_left == 0 {
            self.body.removed = true;
        }
        Ok(())
    }
}

/// Temporary rectangular obstacle
#[derive(Debug, Clone, PartialEq)]
pub struct Wall {
    pub body: Body,
    pub rect: Rect,
    ticks_left: u32,
}

impl Wall {
    pub const LIFETIME: u32 = 720;

    pub fn new(id: u32, rect: Rect) -> Self {
        Self {
            body: Body::new(id, rect.center(), 0.0, 0x6c757d),
            rect,
            ticks_left: Self::LIFETIME,
        }
    }
}

impl Entity for Wall {
    fn body(&self) -> &Body {
        &self.body
    }
    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn update(&mut self, _ctx: &UpdateCtx) -> Result<(), SimError> {
        if self.rect.size.x < 0.0 || self.rect.size.y < 0.0 {
            return Err(SimError::Degenerate {
                id: self.body.id,
                reason: "negative wall size",
            });
        }
        self.ticks_left = self.ticks_left.saturating_sub(1);
        if self.ticks_left == 0 {
            self.body.removed = true;
        }
        Ok(())
    }
}
