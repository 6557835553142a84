//! Moving-circle base body and the simple entity kinds
//!
//! Everything in the world is a `Body` (a circle with velocity) plus
//! per-kind state. Kinds implement `Entity` so an `EntityStore` can step
//! and compact them uniformly.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Rect;
use crate::error::SimError;

/// Read-only view of the world handed to every entity update
#[derive(Debug, Clone, Copy)]
pub struct UpdateCtx {
    pub player_pos: Vec2,
    pub player_radius: f32,
    pub player_level: u32,
    pub arena: Vec2,
    pub tick: u64,
}

impl UpdateCtx {
    pub fn arena_rect(&self) -> Rect {
        Rect::new(Vec2::ZERO, self.arena)
    }
}

/// Base moving circle
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub id: u32,
    pub pos: Vec2,
    /// Position at the start of the current tick (for interpolation)
    pub prev_pos: Vec2,
    pub radius: f32,
    pub color: u32,
    pub vel: Vec2,
    /// Opacity in [0, 1]
    pub alpha: f32,
    pub sprite: Option<&'static str>,
    /// Flagged for removal at the end of the current pass
    pub removed: bool,
}

impl Body {
    pub fn new(id: u32, pos: Vec2, radius: f32, color: u32) -> Self {
        Self {
            id,
            pos,
            prev_pos: pos,
            radius: radius.max(0.0),
            color,
            vel: Vec2::ZERO,
            alpha: 1.0,
            sprite: None,
            removed: false,
        }
    }

    pub fn with_vel(mut self, vel: Vec2) -> Self {
        self.vel = vel;
        self
    }

    /// Advance position by velocity. A non-finite velocity axis is ignored
    /// for this tick rather than written into the position.
    pub fn integrate(&mut self) {
        if self.vel.x.is_finite() {
            self.pos.x += self.vel.x;
        }
        if self.vel.y.is_finite() {
            self.pos.y += self.vel.y;
        }
    }

    /// Remember where this tick started
    #[inline]
    pub fn snapshot(&mut self) {
        self.prev_pos = self.pos;
    }

    /// Position blended between the last two ticks; `alpha` in [0, 1)
    #[inline]
    pub fn render_pos(&self, alpha: f32) -> Vec2 {
        self.prev_pos.lerp(self.pos, alpha.clamp(0.0, 1.0))
    }

    pub fn set_radius(&mut self, radius: f32) {
        self.radius = radius.max(0.0);
    }

    pub fn fade(&mut self, amount: f32) {
        self.alpha = (self.alpha - amount).clamp(0.0, 1.0);
    }

    /// Whole circle is outside `rect`
    pub fn is_outside(&self, rect: &Rect) -> bool {
        let max = rect.max();
        self.pos.x + self.radius < rect.min.x
            || self.pos.x - self.radius > max.x
            || self.pos.y + self.radius < rect.min.y
            || self.pos.y - self.radius > max.y
    }
}

/// Capability set every stored entity provides
pub trait Entity {
    fn body(&self) -> &Body;
    fn body_mut(&mut self) -> &mut Body;

    /// Advance one tick. An error drops this entity only.
    fn update(&mut self, ctx: &UpdateCtx) -> Result<(), SimError>;

    fn is_expired(&self) -> bool {
        self.body().removed
    }
}

/// Who fired a bullet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BulletOwner {
    Player,
    Enemy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bullet {
    pub body: Body,
    pub owner: BulletOwner,
    /// Damage captured when fired
    pub damage: f32,
}

impl Bullet {
    pub const PLAYER_COLOR: u32 = 0xffe066;
    pub const ENEMY_COLOR: u32 = 0xff4d4d;

    pub fn new(id: u32, owner: BulletOwner, pos: Vec2, vel: Vec2, radius: f32, damage: f32) -> Self {
        let color = match owner {
            BulletOwner::Player => Self::PLAYER_COLOR,
            BulletOwner::Enemy => Self::ENEMY_COLOR,
        };
        Self {
            body: Body::new(id, pos, radius, color).with_vel(vel),
            owner,
            damage,
        }
    }
}

impl Entity for Bullet {
    fn body(&self) -> &Body {
        &self.body
    }
    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn update(&mut self, ctx: &UpdateCtx) -> Result<(), SimError> {
        self.body.integrate();
        if self.body.is_outside(&ctx.arena_rect()) {
            self.body.removed = true;
        }
        Ok(())
    }
}

/// Visual spark; no gameplay effect
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub body: Body,
}

impl Particle {
    pub const FADE: f32 = 0.02;
    pub const FRICTION: f32 = 0.97;

    pub fn new(id: u32, pos: Vec2, vel: Vec2, radius: f32, color: u32) -> Self {
        Self {
            body: Body::new(id, pos, radius, color).with_vel(vel),
        }
    }
}

impl Entity for Particle {
    fn body(&self) -> &Body {
        &self.body
    }
    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn update(&mut self, _ctx: &UpdateCtx) -> Result<(), SimError> {
        self.body.integrate();
        self.body.vel *= Self::FRICTION;
        self.body.fade(Self::FADE);
        if self.body.alpha <= 0.0 {
            self.body.removed = true;
        }
        Ok(())
    }
}

/// Floating damage number
#[derive(Debug, Clone, PartialEq)]
pub struct DamageText {
    pub body: Body,
    pub text: String,
    pub crit: bool,
}

impl DamageText {
    pub const FADE: f32 = 0.025;

    pub fn new(id: u32, pos: Vec2, amount: f32, crit: bool) -> Self {
        let color = if crit { 0xff9f1c } else { 0xffffff };
        Self {
            body: Body::new(id, pos, 0.0, color),
            text: format!("{}", amount as i64),
            crit,
        }
    }
}

impl Entity for DamageText {
    fn body(&self) -> &Body {
        &self.body
    }
    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn update(&mut self, _ctx: &UpdateCtx) -> Result<(), SimError> {
        self.body.fade(Self::FADE);
        if self.body.alpha <= 0.0 {
            self.body.removed = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> UpdateCtx {
        UpdateCtx {
            player_pos: Vec2::new(50.0, 50.0),
            player_radius: 10.0,
            player_level: 1,
            arena: Vec2::new(100.0, 100.0),
            tick: 0,
        }
    }

    #[test]
    fn test_nan_velocity_axis_ignored() {
        let mut body = Body::new(1, Vec2::new(10.0, 10.0), 5.0, 0).with_vel(Vec2::new(f32::NAN, 2.0));
        body.integrate();
        assert_eq!(body.pos, Vec2::new(10.0, 12.0));
    }

    #[test]
    fn test_radius_never_negative() {
        let mut body = Body::new(1, Vec2::ZERO, -3.0, 0);
        assert_eq!(body.radius, 0.0);
        body.set_radius(-1.0);
        assert_eq!(body.radius, 0.0);
    }

    #[test]
    fn test_render_pos_interpolates() {
        let mut body = Body::new(1, Vec2::ZERO, 5.0, 0).with_vel(Vec2::new(10.0, 0.0));
        body.snapshot();
        body.integrate();
        assert_eq!(body.render_pos(0.25), Vec2::new(2.5, 0.0));
    }

    #[test]
    fn test_bullet_removed_only_when_fully_outside() {
        let mut bullet = Bullet::new(1, BulletOwner::Player, Vec2::new(98.0, 50.0), Vec2::new(5.0, 0.0), 5.0, 10.0);
        bullet.update(&ctx()).unwrap();
        // Center at 103, left edge at 98: still partly visible
        assert!(!bullet.is_expired());
        bullet.update(&ctx()).unwrap();
        assert!(bullet.is_expired());
    }

    #[test]
    fn test_particle_fades_out() {
        let mut p = Particle::new(1, Vec2::ZERO, Vec2::new(1.0, 0.0), 2.0, 0);
        let mut ticks = 0;
        while !p.is_expired() {
            p.update(&ctx()).unwrap();
            ticks += 1;
            assert!(ticks < 1000);
        }
        assert!(p.body.alpha <= 0.0);
        assert!(p.body.vel.x < 1.0);
    }

    #[test]
    fn test_damage_text_does_not_move() {
        let mut text = DamageText::new(1, Vec2::new(5.0, 5.0), 15.0, false);
        assert_eq!(text.text, "15");
        text.update(&ctx()).unwrap();
        assert_eq!(text.body.pos, Vec2::new(5.0, 5.0));
        assert!(text.body.alpha < 1.0);
    }
}
