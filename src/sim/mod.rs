//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only (the state's `Pcg32`)
//! - Stable iteration order (insertion order per store)
//! - No rendering, audio, or platform dependencies

pub mod ability;
pub mod bonus;
pub mod collision;
pub mod enemy;
pub mod entity;
pub mod events;
pub mod hazard;
pub mod hooks;
pub mod item;
pub mod player;
pub mod state;
pub mod store;
pub mod tick;
pub mod weighted;

pub use ability::{AbilityEffect, AbilityKind, EffectShape, HeldAbility};
pub use bonus::{BonusDef, BonusKind, BonusOffer, BonusPool, Rarity};
pub use collision::{OrientedRect, Rect, circle_oriented_rect, circle_rect, circles_overlap};
pub use enemy::{Enemy, EnemyKind};
pub use entity::{Body, Bullet, BulletOwner, DamageText, Entity, Particle, UpdateCtx};
pub use events::{EventDef, EventRegistry, EventStore, EventTrigger, ScriptedEvent};
pub use hazard::{BlackHole, Turret, Wall};
pub use hooks::{GameHooks, NoHooks};
pub use item::{Item, ItemType};
pub use player::{Direction, InputState, Player, StatKey};
pub use state::{GamePhase, GameState};
pub use store::EntityStore;
pub use tick::{FixedTimestep, tick};
pub use weighted::WeightTable;
