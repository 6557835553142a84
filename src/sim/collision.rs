//! Collision tests for circles, rectangles, and oriented rectangles
//!
//! Every test uses the same tolerance convention:
//! `distance - radius_a - radius_b < epsilon`, so touching counts as a hit
//! even when float rounding leaves a sub-pixel gap.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::rotate;

/// Axis-aligned rectangle (min corner + size)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(min: Vec2, size: Vec2) -> Self {
        Self { min, size }
    }

    pub fn from_center(center: Vec2, half: Vec2) -> Self {
        Self {
            min: center - half,
            size: half * 2.0,
        }
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.min + self.size * 0.5
    }

    /// Closest point inside the rectangle to `p`
    #[inline]
    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        p.clamp(self.min, self.max())
    }
}

/// Rectangle rotated by `angle` around its center
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientedRect {
    pub center: Vec2,
    pub half: Vec2,
    pub angle: f32,
}

impl OrientedRect {
    /// A rectangle of `length` x `width` extending from `origin` along `angle`
    pub fn from_origin(origin: Vec2, angle: f32, length: f32, width: f32) -> Self {
        let dir = Vec2::from_angle(angle);
        Self {
            center: origin + dir * (length * 0.5),
            half: Vec2::new(length * 0.5, width * 0.5),
            angle,
        }
    }

    /// `p` expressed in the rectangle's local, axis-aligned frame
    #[inline]
    pub fn to_local(&self, p: Vec2) -> Vec2 {
        rotate(p - self.center, -self.angle)
    }
}

/// Circle-circle overlap
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32, epsilon: f32) -> bool {
    a.distance(b) - ra - rb < epsilon
}

/// Circle vs axis-aligned rectangle
#[inline]
pub fn circle_rect(center: Vec2, radius: f32, rect: &Rect, epsilon: f32) -> bool {
    center.distance(rect.closest_point(center)) - radius < epsilon
}

/// Circle vs oriented rectangle: rotate the circle into the rectangle's
/// frame, then test against the axis-aligned box.
pub fn circle_oriented_rect(center: Vec2, radius: f32, obb: &OrientedRect, epsilon: f32) -> bool {
    let local = obb.to_local(center);
    let rect = Rect::from_center(Vec2::ZERO, obb.half);
    circle_rect(local, radius, &rect, epsilon)
}

/// Minimum translation that pushes a circle out of a rectangle, if they overlap
pub fn push_out_of_rect(center: Vec2, radius: f32, rect: &Rect) -> Option<Vec2> {
    let closest = rect.closest_point(center);
    let delta = center - closest;
    let dist = delta.length();

    if dist >= radius {
        return None;
    }
    if dist > f32::EPSILON {
        return Some(delta / dist * (radius - dist));
    }

    // Center is inside the rectangle: exit through the nearest side
    let max = rect.max();
    let exits = [
        Vec2::new(rect.min.x - radius - center.x, 0.0),
        Vec2::new(max.x + radius - center.x, 0.0),
        Vec2::new(0.0, rect.min.y - radius - center.y),
        Vec2::new(0.0, max.y + radius - center.y),
    ];
    exits
        .into_iter()
        .min_by(|a, b| a.length_squared().total_cmp(&b.length_squared()))
}
