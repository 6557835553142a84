//! Game state and session lifecycle
//!
//! One `GameState` lives for the whole process. It owns the player, every
//! entity store, the progression pool, and the scripted events; nothing in
//! the simulation is global. `start_new_game` resets it in place.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use super::ability::{AbilityEffect, AbilityKind, HeldAbility};
use super::bonus::{BonusOffer, BonusPool, apply_bonus, generate_offers};
use super::collision::Rect;
use super::enemy::{ARCHETYPES, Enemy};
use super::entity::{Bullet, BulletOwner, DamageText, Particle, UpdateCtx};
use super::events::{EventRegistry, EventStore, EventTrigger};
use super::hazard::{BlackHole, Turret, Wall};
use super::hooks::{GameHooks, NoHooks};
use super::item::{Item, ItemType, item_catalog};
use super::player::{Direction, Player};
use super::store::EntityStore;
use super::weighted::pick_by;
use crate::error::SimError;
use crate::settings::Settings;
use crate::tuning::Tuning;
use crate::{random_coords, random_edge_coords, rotate};

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Running,
    /// Level-up screen is up; ticks are suspended until a pick is made
    OfferingBonuses,
    Paused,
    GameOver,
}

/// Work that must not run mid-scan, executed at the end of the tick
pub type Deferred = Box<dyn FnOnce(&mut GameState)>;

pub struct GameState {
    pub seed: u64,
    pub rng: Pcg32,
    pub tuning: Tuning,
    pub settings: Settings,
    pub phase: GamePhase,
    pub score: u64,
    /// Ticks simulated this session
    pub time_ticks: u64,

    pub player: Player,

    // === Entity stores ===
    pub enemies: EntityStore<Enemy>,
    pub bullets: EntityStore<Bullet>,
    pub enemy_bullets: EntityStore<Bullet>,
    pub particles: EntityStore<Particle>,
    pub damage_texts: EntityStore<DamageText>,
    pub items: EntityStore<Item>,
    pub effects: EntityStore<AbilityEffect>,
    pub turrets: EntityStore<Turret>,
    pub black_holes: EntityStore<BlackHole>,
    pub walls: EntityStore<Wall>,

    // === Progression ===
    pub bonus_pool: BonusPool,
    pub item_types: Vec<ItemType>,
    pub pending_offers: Vec<BonusOffer>,
    /// Set the moment a level-up is detected; combat resolution stays
    /// frozen until the offer is resolved
    pub level_up_pending: bool,

    // === Scripted events ===
    pub events: EventStore,
    pub event_registry: EventRegistry,

    // === Timers (seconds) ===
    pub spawn_interval: f32,
    pub spawn_timer: f32,
    pub event_timer: f32,

    pub(super) deferred: Vec<Deferred>,
    pub(super) hooks: Box<dyn GameHooks>,
    next_id: u32,
}

impl GameState {
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        log::info!("Session started with seed {seed}");
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            settings: Settings::default(),
            phase: GamePhase::Running,
            score: 0,
            time_ticks: 0,
            player: Player::new(1, &tuning),
            enemies: EntityStore::new(),
            bullets: EntityStore::new(),
            enemy_bullets: EntityStore::new(),
            particles: EntityStore::new(),
            damage_texts: EntityStore::new(),
            items: EntityStore::new(),
            effects: EntityStore::new(),
            turrets: EntityStore::new(),
            black_holes: EntityStore::new(),
            walls: EntityStore::new(),
            bonus_pool: BonusPool::default(),
            item_types: item_catalog(),
            pending_offers: Vec::new(),
            level_up_pending: false,
            events: EventStore::default(),
            event_registry: EventRegistry::default(),
            spawn_interval: tuning.spawn_interval,
            spawn_timer: tuning.spawn_interval,
            event_timer: tuning.event_interval,
            deferred: Vec::new(),
            hooks: Box::new(NoHooks),
            next_id: 2,
            tuning,
        }
    }

    pub fn with_hooks(mut self, hooks: impl GameHooks + 'static) -> Self {
        self.hooks = Box::new(hooks);
        self
    }

    pub fn set_hooks(&mut self, hooks: Box<dyn GameHooks>) {
        self.hooks = hooks;
    }

    /// Reset everything for a fresh run. The RNG stream carries on, so a
    /// seeded process still replays identically.
    pub fn start_new_game(&mut self) {
        self.phase = GamePhase::Running;
        self.score = 0;
        self.time_ticks = 0;
        self.settings = Settings::default();

        self.next_id = 1;
        let id = self.next_entity_id();
        self.player = Player::new(id, &self.tuning);

        self.enemies.clear();
        self.bullets.clear();
        self.enemy_bullets.clear();
        self.particles.clear();
        self.damage_texts.clear();
        self.items.clear();
        self.effects.clear();
        self.turrets.clear();
        self.black_holes.clear();
        self.walls.clear();

        self.bonus_pool = BonusPool::default();
        self.pending_offers.clear();
        self.level_up_pending = false;
        self.events.clear();
        self.deferred.clear();

        self.spawn_interval = self.tuning.spawn_interval;
        self.spawn_timer = self.spawn_interval;
        self.event_timer = self.tuning.event_interval;

        log::info!("New game started");
        self.notify_life();
        self.notify_stats();
    }

    /// Generate a unique entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    pub fn update_ctx(&self) -> UpdateCtx {
        UpdateCtx {
            player_pos: self.player.body.pos,
            player_radius: self.player.body.radius,
            player_level: self.player.level,
            arena: self.tuning.arena_size(),
            tick: self.time_ticks,
        }
    }

    // === Deferred actions ===

    pub fn defer(&mut self, action: impl FnOnce(&mut GameState) + 'static) {
        self.deferred.push(Box::new(action));
    }

    /// Run everything queued so far. Actions queued while draining wait for
    /// the next drain.
    pub fn drain_deferred(&mut self) {
        let queued = std::mem::take(&mut self.deferred);
        for action in queued {
            action(self);
        }
    }

    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }

    // === Lifecycle ===

    pub fn is_running(&self) -> bool {
        self.phase == GamePhase::Running
    }

    pub fn pause(&mut self) {
        if self.phase == GamePhase::Running {
            self.phase = GamePhase::Paused;
            self.player.input.reset();
            log::info!("Paused");
        }
    }

    pub fn resume(&mut self) {
        if self.phase == GamePhase::Paused {
            self.phase = GamePhase::Running;
            log::info!("Resumed");
        }
    }

    pub fn end_game(&mut self) {
        if self.phase == GamePhase::GameOver {
            return;
        }
        self.phase = GamePhase::GameOver;
        self.player.input.reset();
        self.player.firing = false;
        log::info!(
            "Game over: score {}, kills {}, level {}",
            self.score,
            self.player.kills,
            self.player.level
        );
        self.notify_life();
        self.hooks.game_over(self.score, self.player.kills);
    }

    // === Input ===

    pub fn set_direction(&mut self, dir: Direction, pressed: bool) {
        self.player.set_direction(dir, pressed);
    }

    pub fn set_mouse(&mut self, pos: Vec2) {
        self.player.mouse = pos;
    }

    pub fn set_firing(&mut self, firing: bool) {
        self.player.firing = firing;
    }

    /// Request a single shot on the next tick. Refused while shooting is
    /// gated off or the game is not running.
    pub fn fire(&mut self) -> bool {
        if !self.settings.shoot_enabled || !self.is_running() {
            return false;
        }
        self.player.fire_requested = true;
        true
    }

    // === Spawning ===

    /// Spawn a weighted-random archetype just off a random arena edge
    pub fn spawn_enemy(&mut self) -> Result<u32, SimError> {
        let archetype = *pick_by(&ARCHETYPES[..], &mut self.rng, |a| a.weight)?;
        let pos = random_edge_coords(&mut self.rng, self.tuning.arena_size(), archetype.radius);
        let id = self.next_entity_id();
        self.enemies
            .add(Enemy::from_archetype(id, pos, &archetype, &self.tuning));
        Ok(id)
    }

    pub fn spawn_enemies(&mut self, count: u32) {
        for _ in 0..count {
            if let Err(e) = self.spawn_enemy() {
                log::error!("Enemy spawn failed: {e}");
                break;
            }
        }
    }

    pub fn spawn_enemy_at(&mut self, pos: Vec2, radius: f32) -> u32 {
        let id = self.next_entity_id();
        self.enemies
            .add(Enemy::new(id, pos, radius, 1.0, ARCHETYPES[0].color, &self.tuning));
        id
    }

    pub fn spawn_boss(&mut self) -> u32 {
        let pos = random_edge_coords(&mut self.rng, self.tuning.arena_size(), Enemy::BOSS_RADIUS);
        let id = self.next_entity_id();
        self.enemies.add(Enemy::boss(id, pos, &self.tuning));
        log::info!("Boss {id} spawned at ({:.0}, {:.0})", pos.x, pos.y);
        id
    }

    /// Drop a weighted-random item somewhere in the arena, unless the item
    /// cap is reached
    pub fn spawn_item(&mut self) -> Result<Option<u32>, SimError> {
        if self.items.live_count() >= self.tuning.max_items {
            return Ok(None);
        }
        let def = pick_by(&self.item_types, &mut self.rng, |d| d.weight)?.clone();
        let pos = random_coords(&mut self.rng, self.tuning.arena_size(), 60.0);
        Ok(Some(self.spawn_item_at(pos, def)))
    }

    pub fn spawn_item_at(&mut self, pos: Vec2, def: ItemType) -> u32 {
        let id = self.next_entity_id();
        log::debug!("Item {} dropped", def.name);
        self.items.add(Item::new(
            id,
            pos,
            def,
            self.tuning.item_radius,
            self.tuning.item_lifetime,
        ));
        id
    }

    pub fn spawn_black_hole(&mut self) -> u32 {
        let pos = random_coords(&mut self.rng, self.tuning.arena_size(), 150.0);
        let id = self.next_entity_id();
        self.black_holes.add(BlackHole::new(id, pos));
        id
    }

    /// Drop `count` bar-shaped walls at random spots
    pub fn spawn_walls(&mut self, count: u32) {
        let arena = self.tuning.arena_size();
        for _ in 0..count {
            let long = self.rng.random_range(160.0..=320.0);
            let size = if self.rng.random_bool(0.5) {
                Vec2::new(long, 24.0)
            } else {
                Vec2::new(24.0, long)
            };
            let center = random_coords(&mut self.rng, arena, long * 0.5 + 20.0);
            let id = self.next_entity_id();
            self.walls.add(Wall::new(id, Rect::from_center(center, size * 0.5)));
        }
    }

    /// Add a bullet travelling along `dir` from `from`
    pub fn spawn_bullet(&mut self, owner: BulletOwner, from: Vec2, dir: Vec2, damage: f32) -> u32 {
        let dir = dir.try_normalize().unwrap_or(Vec2::X);
        let id = self.next_entity_id();
        match owner {
            BulletOwner::Player => {
                let vel = dir * self.player.bullet_speed;
                let radius = self.player.bullet_radius;
                self.bullets
                    .add(Bullet::new(id, owner, from, vel, radius, damage));
            }
            BulletOwner::Enemy => {
                let vel = dir * self.tuning.bullet_speed * 0.6;
                let radius = self.tuning.bullet_radius * 1.5;
                self.enemy_bullets
                    .add(Bullet::new(id, owner, from, vel, radius, damage));
            }
        }
        id
    }

    /// Player shot toward `target`, leaving from the edge of the player
    pub fn fire_bullet(&mut self, target: Vec2) -> u32 {
        let origin = self.player.body.pos;
        let dir = (target - origin).try_normalize().unwrap_or(Vec2::X);
        let from = origin + dir * self.player.body.radius;
        let damage = self.player.damage;
        self.spawn_bullet(BulletOwner::Player, from, dir, damage)
    }

    /// One activation of `held`. Returns false when its instance cap
    /// suppresses the spawn.
    pub fn trigger_ability(&mut self, held: &HeldAbility) -> bool {
        let active = match held.kind {
            AbilityKind::Turret => self.turrets.live_count(),
            kind => self.effects.live().filter(|e| e.ability == kind).count(),
        };
        if let Some(cap) = held.kind.max_instances() {
            if active >= cap {
                log::debug!("{} suppressed ({active} active)", held.kind.name());
                return false;
            }
        }

        let origin = self.player.body.pos;
        let id = self.next_entity_id();
        if held.kind == AbilityKind::Turret {
            self.turrets
                .add(Turret::new(id, origin, held.size, held.damage));
            return true;
        }

        let at = if held.kind == AbilityKind::Vortex {
            let dist = self.rng.random_range(60.0..=160.0);
            let angle = self.rng.random_range(0.0..TAU);
            let arena = self.tuning.arena_size();
            (origin + rotate(Vec2::new(dist, 0.0), angle)).clamp(Vec2::ZERO, arena)
        } else {
            origin
        };

        match AbilityEffect::cast(id, held, origin, self.player.mouse, at) {
            Some(effect) => {
                self.effects.add(effect);
                true
            }
            None => false,
        }
    }

    // === Progression ===

    /// Consume one level's worth of XP and put up the bonus offer
    pub fn begin_level_up(&mut self) {
        if self.phase == GamePhase::GameOver {
            return;
        }
        let player = &mut self.player;
        player.xp -= player.xp_to_next;
        player.level += 1;
        player.xp_to_next *= self.tuning.xp_growth;
        // Keys released during the pause must not stick
        player.input.reset();
        player.firing = false;
        player.fire_requested = false;
        let level = player.level;

        match generate_offers(&self.bonus_pool, &self.player, &mut self.rng) {
            Ok(offers) if !offers.is_empty() => {
                let names: Vec<&str> = offers.iter().map(|o| o.name()).collect();
                log::info!("Level {level}: offering {names:?}");
                self.pending_offers = offers;
                self.phase = GamePhase::OfferingBonuses;
                self.hooks.show_level_up(&self.pending_offers);
            }
            Ok(_) => {
                log::info!("Level {level}: bonus pool exhausted");
                self.level_up_pending = false;
            }
            Err(e) => {
                log::error!("Level {level}: could not generate offers: {e}");
                self.level_up_pending = false;
            }
        }
        self.notify_stats();
    }

    /// Resolve the pending level-up with offer `index`
    pub fn select_bonus(&mut self, index: usize) -> Result<(), SimError> {
        if self.phase != GamePhase::OfferingBonuses {
            return Err(SimError::NotOfferingBonuses);
        }
        let offered = self.pending_offers.len();
        let offer = self
            .pending_offers
            .get(index)
            .cloned()
            .ok_or(SimError::InvalidSelection { index, offered })?;

        if let Err(e) = apply_bonus(&mut self.player, &mut self.bonus_pool, &offer) {
            log::error!("Bonus {} could not be applied: {e}", offer.name());
            return Err(e);
        }
        log::info!("Selected {} ({:?})", offer.name(), offer.rarity());

        self.pending_offers.clear();
        self.level_up_pending = false;
        self.phase = GamePhase::Running;
        self.hooks.hide_level_up();
        self.notify_life();

        // Enough XP banked for another level
        if self.player.xp >= self.player.xp_to_next {
            self.level_up_pending = true;
            self.begin_level_up();
        }
        Ok(())
    }

    // === Scripted events ===

    /// Start a registered event by name
    pub fn activate_event(&mut self, name: &str) -> Result<(), SimError> {
        let event = self.event_registry.instantiate(name).inspect_err(|e| {
            log::error!("Cannot activate event: {e}");
        })?;
        self.events.add(event);
        Ok(())
    }

    pub fn apply_trigger(&mut self, trigger: &EventTrigger) {
        match *trigger {
            EventTrigger::SpawnEnemies { count } => self.spawn_enemies(count),
            EventTrigger::SpawnBoss => {
                self.spawn_boss();
            }
            EventTrigger::SpawnBlackHole => {
                self.spawn_black_hole();
            }
            EventTrigger::SpawnWalls { count } => self.spawn_walls(count),
            EventTrigger::DropItems { count } => {
                for _ in 0..count {
                    if let Err(e) = self.spawn_item() {
                        log::error!("Item drop failed: {e}");
                        break;
                    }
                }
            }
            EventTrigger::HealPlayer { amount } => {
                self.player.heal(amount);
                self.notify_life();
            }
        }
    }

    // === Hooks ===

    pub(super) fn notify_life(&mut self) {
        self.hooks
            .player_life_changed(self.player.life, self.player.max_life);
    }

    pub(super) fn notify_stats(&mut self) {
        self.hooks
            .stats_changed(self.score, self.player.kills, self.player.level);
    }
}
