//! World pickups and the item type registry

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::ability::AbilityKind;
use super::entity::{Body, Entity, UpdateCtx};
use super::player::StatKey;
use crate::error::SimError;

/// Item definition. Pickups and the player's inventory hold their own
/// copies, so nothing downstream can edit the registry entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemType {
    pub name: String,
    /// Drop weight
    pub weight: u32,
    /// Permanent items never expire from the inventory
    pub permanent: bool,
    /// Ticks a temporary item stays active once picked up
    pub duration: u32,
    /// Stat deltas applied on pickup (and reverted on expiry if temporary)
    pub modifiers: Vec<(StatKey, f32)>,
    /// Life restored on pickup
    #[serde(default)]
    pub heal: f32,
    /// Ability effect fired once on pickup
    #[serde(default)]
    pub triggers: Option<AbilityKind>,
    pub color: u32,
}

/// Built-in drop table
pub fn item_catalog() -> Vec<ItemType> {
    vec![
        ItemType {
            name: "Medkit".into(),
            weight: 5,
            permanent: false,
            duration: 1,
            modifiers: Vec::new(),
            heal: 25.0,
            triggers: None,
            color: 0x06d6a0,
        },
        ItemType {
            name: "Heart".into(),
            weight: 1,
            permanent: true,
            duration: 0,
            modifiers: vec![(StatKey::MaxLife, 10.0)],
            heal: 10.0,
            triggers: None,
            color: 0xef476f,
        },
        ItemType {
            name: "Overclock".into(),
            weight: 3,
            permanent: false,
            duration: 600,
            modifiers: vec![(StatKey::Damage, 5.0)],
            heal: 0.0,
            triggers: None,
            color: 0xf78c6b,
        },
        ItemType {
            name: "Adrenaline".into(),
            weight: 3,
            permanent: false,
            duration: 480,
            modifiers: vec![(StatKey::ShootCooldown, -5.0), (StatKey::MaxSpeed, 1.0)],
            heal: 0.0,
            triggers: None,
            color: 0xffd166,
        },
        ItemType {
            name: "Nova".into(),
            weight: 2,
            permanent: false,
            duration: 1,
            modifiers: Vec::new(),
            heal: 0.0,
            triggers: Some(AbilityKind::SolarFlare),
            color: 0xfca311,
        },
    ]
}

/// An item lying in the world
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub body: Body,
    pub def: ItemType,
    origin: Vec2,
    angle: f32,
    age: u32,
    lifetime: u32,
}

impl Item {
    const SPIN: f32 = 0.03;
    const MAX_DRIFT: f32 = 24.0;

    pub fn new(id: u32, pos: Vec2, def: ItemType, radius: f32, lifetime: u32) -> Self {
        let color = def.color;
        Self {
            body: Body::new(id, pos, radius, color),
            def,
            origin: pos,
            angle: 0.0,
            age: 0,
            lifetime,
        }
    }

    pub fn age(&self) -> u32 {
        self.age
    }
}

impl Entity for Item {
    fn body(&self) -> &Body {
        &self.body
    }
    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn update(&mut self, _ctx: &UpdateCtx) -> Result<(), SimError> {
        // Spiral outward around the spawn point
        self.angle += Self::SPIN;
        let drift = (self.angle * 2.0).min(Self::MAX_DRIFT);
        self.body.pos = self.origin + Vec2::from_angle(self.angle) * drift;

        self.age += 1;
        if self.age >= self.lifetime {
            self.body.removed = true;
        }
        Ok(())
    }
}

/// An item in the player's inventory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeldItem {
    pub def: ItemType,
    /// Ticks left; `None` for permanent items
    pub remaining: Option<u32>,
}

impl HeldItem {
    pub fn new(def: &ItemType) -> Self {
        Self {
            remaining: (!def.permanent).then_some(def.duration),
            def: def.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> UpdateCtx {
        UpdateCtx {
            player_pos: Vec2::ZERO,
            player_radius: 15.0,
            player_level: 1,
            arena: Vec2::new(1280.0, 720.0),
            tick: 0,
        }
    }

    #[test]
    fn test_item_expires_after_lifetime() {
        let def = item_catalog().remove(0);
        let mut item = Item::new(1, Vec2::new(100.0, 100.0), def, 10.0, 540);
        for _ in 0..539 {
            item.update(&ctx()).unwrap();
        }
        assert!(!item.is_expired());
        item.update(&ctx()).unwrap();
        assert!(item.is_expired());
    }

    #[test]
    fn test_item_drifts_near_origin() {
        let def = item_catalog().remove(0);
        let origin = Vec2::new(100.0, 100.0);
        let mut item = Item::new(1, origin, def, 10.0, 540);
        for _ in 0..300 {
            item.update(&ctx()).unwrap();
            assert!(item.body.pos.distance(origin) <= Item::MAX_DRIFT + 1e-3);
        }
        assert!(item.body.pos != origin);
    }

    #[test]
    fn test_held_item_is_a_copy() {
        let registry = item_catalog();
        let mut held = HeldItem::new(&registry[2]);
        held.def.duration = 1;
        held.remaining = Some(1);
        assert_eq!(registry[2].duration, 600);
        assert_eq!(item_catalog()[2], registry[2]);
    }

    #[test]
    fn test_permanent_items_have_no_timer() {
        let registry = item_catalog();
        let heart = registry.iter().find(|d| d.name == "Heart").unwrap();
        assert_eq!(HeldItem::new(heart).remaining, None);
    }
}
