//! Fixed timestep simulation tick
//!
//! `tick` advances the state by exactly one step. `FixedTimestep` turns
//! wall-clock frame time into whole ticks plus a render interpolation
//! fraction.

use glam::Vec2;
use rand::Rng;
use std::f32::consts::TAU;

use super::ability::{AbilityEffect, AbilityKind, EffectShape, HeldAbility, HitArea};
use super::collision::{circle_oriented_rect, circle_rect, circles_overlap, push_out_of_rect};
use super::enemy::Enemy;
use super::entity::{BulletOwner, DamageText, Entity, Particle, UpdateCtx};
use super::state::GameState;
use crate::tuning::Tuning;

/// One damaging hit, queued for its particles and damage number
struct Hit {
    pos: Vec2,
    radius: f32,
    color: u32,
    damage: f32,
    crit: bool,
}

impl Hit {
    fn on(enemy: &Enemy, damage: f32, crit: bool) -> Self {
        Self {
            pos: enemy.body.pos,
            radius: enemy.body.radius,
            color: enemy.body.color,
            damage,
            crit,
        }
    }
}

/// One destroyed enemy
struct Kill {
    /// Kill count including this one
    ordinal: u32,
    pos: Vec2,
    initial_radius: f32,
    color: u32,
}

#[derive(Default)]
struct Resolution {
    hits: Vec<Hit>,
    kills: Vec<Kill>,
    life_changed: bool,
}

/// Crit roll, then floor
fn roll_damage<R: Rng + ?Sized>(rng: &mut R, base: f32, crit_chance: f32, crit_multiplier: f32) -> (f32, bool) {
    let crit = rng.random::<f32>() * 100.0 < crit_chance;
    let damage = if crit { base * crit_multiplier } else { base };
    (damage.floor().max(0.0), crit)
}

fn effect_touches(effect: &AbilityEffect, enemy: &Enemy, epsilon: f32) -> bool {
    match effect.hit_area() {
        HitArea::Circle { center, radius } => {
            circles_overlap(center, radius, enemy.body.pos, enemy.body.radius, epsilon)
        }
        HitArea::Rect(obb) => circle_oriented_rect(enemy.body.pos, enemy.body.radius, &obb, epsilon),
    }
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState) {
    if !state.is_running() {
        return;
    }
    state.time_ticks += 1;

    // 1. Player
    step_player(state);
    let ctx = state.update_ctx();

    // 2. Bullets
    state.bullets.update(&ctx);
    state.enemy_bullets.update(&ctx);
    block_bullets(state);

    // 3-5. Enemies, contact, and combat resolution
    let was_pending = state.level_up_pending;
    let resolution = resolve_enemies(state, &ctx);
    if resolution.life_changed {
        state.notify_life();
    }
    for hit in &resolution.hits {
        spawn_hit_feedback(state, hit);
    }
    for kill in &resolution.kills {
        on_enemy_destroyed(state, kill);
    }
    if state.player.is_dead() {
        state.end_game();
        return;
    }
    if state.level_up_pending && !was_pending {
        state.defer(|s| s.begin_level_up());
    }

    // 6. Cosmetics
    state.particles.update(&ctx);
    state.damage_texts.update(&ctx);

    // 7. Items
    collect_items(state, &ctx);

    // 8. Effects and hazards
    state.effects.update(&ctx);
    state.turrets.update(&ctx);
    state.black_holes.update(&ctx);
    state.walls.update(&ctx);
    apply_hazards(state);
    if !state.level_up_pending {
        enemy_bullet_hits(state);
    }
    if state.player.is_dead() {
        state.end_game();
        return;
    }

    // 9. Heat decay
    state.player.heat = (state.player.heat - state.tuning.heat_decay).max(0.0);

    run_timers(state);

    // 10. Deferred actions
    state.drain_deferred();
}

fn step_player(state: &mut GameState) {
    let arena = state.tuning.arena_size();
    let player = &mut state.player;
    player.body.snapshot();
    player.update(arena);

    for wall in state.walls.live() {
        if let Some(push) = push_out_of_rect(player.body.pos, player.body.radius, &wall.rect) {
            player.body.pos += push;
        }
    }
    player.contain(arena);
    player.tick_items();
}

/// Walls swallow player bullets
fn block_bullets(state: &mut GameState) {
    let epsilon = state.tuning.epsilon;
    for bullet in state.bullets.iter_mut() {
        let blocked = state
            .walls
            .live()
            .any(|w| circle_rect(bullet.body.pos, bullet.body.radius, &w.rect, epsilon));
        if blocked {
            bullet.body.removed = true;
        }
    }
}

/// Enemy pass: player contact, integration, then bullet and effect hits.
///
/// Removals are only flagged here; both stores are compacted once the
/// whole pass is over. Once a level-up is pending, remaining enemies still
/// move but nothing more is resolved.
fn resolve_enemies(state: &mut GameState, ctx: &UpdateCtx) -> Resolution {
    let GameState {
        enemies,
        bullets,
        effects,
        player,
        rng,
        tuning,
        score,
        level_up_pending,
        ..
    } = state;
    let mut out = Resolution::default();

    for enemy in enemies.iter_mut() {
        if enemy.is_expired() {
            continue;
        }
        enemy.body.snapshot();

        if !*level_up_pending
            && enemy.contact_timer == 0
            && circles_overlap(
                enemy.body.pos,
                enemy.body.radius,
                player.body.pos,
                player.body.radius,
                tuning.epsilon,
            )
        {
            enemy.contact_timer = tuning.contact_cooldown;
            player.take_damage(tuning.contact_damage);
            player.body.vel += enemy.body.vel * tuning.knockback;
            out.life_changed = true;
            if player.is_dead() {
                break;
            }
        }

        if let Err(e) = enemy.update(ctx) {
            log::warn!("Skipping enemy {}: {e}", enemy.body.id);
            enemy.body.removed = true;
            continue;
        }

        if *level_up_pending {
            continue;
        }

        let mut destroyed = false;
        for bullet in bullets.iter_mut() {
            if bullet.is_expired()
                || !circles_overlap(
                    bullet.body.pos,
                    bullet.body.radius,
                    enemy.body.pos,
                    enemy.body.radius,
                    tuning.epsilon,
                )
            {
                continue;
            }
            bullet.body.removed = true;
            let (damage, crit) = roll_damage(rng, bullet.damage, player.crit_chance, player.crit_multiplier);
            out.hits.push(Hit::on(enemy, damage, crit));
            if enemy.apply_damage(damage) {
                destroyed = true;
                break;
            }
        }

        if !destroyed {
            for effect in effects.iter_mut() {
                if effect.is_expired()
                    || !effect_touches(effect, enemy, tuning.epsilon)
                    || !effect.try_hit(enemy.body.id, ctx.tick)
                {
                    continue;
                }
                // Beams and blades carry their own damage; areas use the player's
                let base = match effect.shape {
                    EffectShape::OrientedRect => effect.damage,
                    EffectShape::Circle => player.damage,
                };
                let (damage, crit) = roll_damage(rng, base, player.crit_chance, player.crit_multiplier);
                if damage <= 0.0 {
                    continue;
                }
                out.hits.push(Hit::on(enemy, damage, crit));
                if enemy.apply_damage(damage) {
                    destroyed = true;
                    break;
                }
            }
        }

        if destroyed {
            enemy.body.removed = true;
            player.kills += 1;
            player.xp += (tuning.xp_per_kill + enemy.initial_radius) * player.xp_multiplier;
            *score += enemy.kill_value(tuning.score_per_radius);
            out.kills.push(Kill {
                ordinal: player.kills,
                pos: enemy.body.pos,
                initial_radius: enemy.initial_radius,
                color: enemy.body.color,
            });
            if player.xp >= player.xp_to_next {
                *level_up_pending = true;
            }
        }
    }

    enemies.compact();
    bullets.compact();
    out
}

fn burst<R: Rng + ?Sized>(rng: &mut R, pos: Vec2, count: usize, color: u32) -> Vec<(Vec2, Vec2, f32, u32)> {
    (0..count)
        .map(|_| {
            let angle = rng.random_range(0.0..TAU);
            let speed = rng.random_range(1.0..4.0);
            let radius = rng.random_range(1.5..3.5);
            (pos, Vec2::from_angle(angle) * speed, radius, color)
        })
        .collect()
}

fn spawn_particles(state: &mut GameState, pos: Vec2, count: usize, color: u32) {
    for (pos, vel, radius, color) in burst(&mut state.rng, pos, count, color) {
        let id = state.next_entity_id();
        state.particles.add(Particle::new(id, pos, vel, radius, color));
    }
}

fn spawn_hit_feedback(state: &mut GameState, hit: &Hit) {
    let count = (hit.radius / 4.0).clamp(3.0, 12.0) as usize;
    spawn_particles(state, hit.pos, count, hit.color);
    let id = state.next_entity_id();
    let text_pos = hit.pos - Vec2::new(0.0, hit.radius);
    state
        .damage_texts
        .add(DamageText::new(id, text_pos, hit.damage, hit.crit));
}

/// Progression side effects of one kill
fn on_enemy_destroyed(state: &mut GameState, kill: &Kill) {
    let count = (kill.initial_radius / 2.0).clamp(6.0, 24.0) as usize;
    spawn_particles(state, kill.pos, count, kill.color);

    let Tuning {
        heat_per_kill,
        heat_log_factor,
        heat_burst_base,
        heat_burst_per_level,
        spawn_speedup,
        spawn_speedup_kills,
        min_spawn_interval,
        item_every_kills,
        ..
    } = state.tuning;
    let kills = kill.ordinal;

    // Diminishing heat per kill
    let gain = (heat_per_kill - heat_log_factor * (1.0 + kills as f32).ln()).max(0.0);
    state.player.add_heat(gain);
    if state.player.heat >= state.player.max_heat {
        state.player.heat = 0.0;
        let count = heat_burst_base + state.player.level * heat_burst_per_level;
        log::info!("Heat burst: {count} enemies incoming");
        state.defer(move |s| {
            if s.settings.spawn_enabled {
                s.spawn_enemies(count);
            }
        });
    }

    if spawn_speedup_kills > 0 && kills % spawn_speedup_kills == 0 {
        state.spawn_interval = (state.spawn_interval * spawn_speedup).max(min_spawn_interval);
        log::debug!("Spawn interval now {:.2}s", state.spawn_interval);
    }

    if item_every_kills > 0 && kills % item_every_kills == 0 {
        if let Err(e) = state.spawn_item() {
            log::error!("Item drop failed: {e}");
        }
    }

    state.notify_stats();
}

/// Pick up anything the player overlaps, then drift and age the rest
fn collect_items(state: &mut GameState, ctx: &UpdateCtx) {
    let player_pos = state.player.body.pos;
    let player_radius = state.player.body.radius;
    let mut picked = Vec::new();
    for item in state.items.iter_mut() {
        if item.is_expired() {
            continue;
        }
        if item.body.pos.distance(player_pos) - item.body.radius - player_radius < 1.0 {
            item.body.removed = true;
            picked.push(item.def.clone());
        }
    }
    state.items.update(ctx);

    for def in picked {
        log::debug!("Picked up {}", def.name);
        if let Some(kind) = state.player.pick_up(&def) {
            let held = state
                .player
                .abilities
                .iter()
                .find(|a| a.kind == kind)
                .cloned()
                .unwrap_or_else(|| HeldAbility::new(kind));
            state.trigger_ability(&held);
        }
        state.notify_life();
    }
}

/// Gravity from black holes and vortices, black hole contact damage
fn apply_hazards(state: &mut GameState) {
    let GameState {
        black_holes,
        effects,
        enemies,
        player,
        tuning,
        level_up_pending,
        ..
    } = state;
    let mut life_changed = false;

    for hole in black_holes.iter_mut() {
        if hole.is_expired() {
            continue;
        }
        player.body.vel += hole.pull_on(player.body.pos);
        for enemy in enemies.iter_mut() {
            enemy.body.vel += hole.pull_on(enemy.body.pos);
        }
        if !*level_up_pending
            && hole.contact_timer == 0
            && circles_overlap(
                hole.body.pos,
                hole.body.radius,
                player.body.pos,
                player.body.radius,
                tuning.epsilon,
            )
        {
            hole.contact_timer = tuning.contact_cooldown;
            player.take_damage(hole.contact_damage);
            life_changed = true;
        }
    }

    for effect in effects.live() {
        for enemy in enemies.iter_mut() {
            enemy.body.vel += effect.pull_on(enemy.body.pos);
        }
    }

    if life_changed {
        state.notify_life();
    }
}

fn enemy_bullet_hits(state: &mut GameState) {
    let player = &mut state.player;
    let mut hit = false;
    for bullet in state.enemy_bullets.iter_mut() {
        if bullet.is_expired()
            || !circles_overlap(
                bullet.body.pos,
                bullet.body.radius,
                player.body.pos,
                player.body.radius,
                state.tuning.epsilon,
            )
        {
            continue;
        }
        bullet.body.removed = true;
        player.take_damage(bullet.damage);
        hit = true;
    }
    state.enemy_bullets.compact();
    if hit {
        state.notify_life();
    }
}

/// Countdowns that only ever add entities: shooting, abilities, turrets,
/// boss fire, enemy spawns, and world events
fn run_timers(state: &mut GameState) {
    let dt = state.tuning.tick_dt();

    // Shooting
    let player = &mut state.player;
    player.shoot_timer = (player.shoot_timer - 1.0).max(0.0);
    let wants_shot = player.firing || player.fire_requested;
    player.fire_requested = false;
    if wants_shot && state.settings.shoot_enabled && state.player.shoot_timer <= 0.0 {
        let target = state.player.mouse;
        state.fire_bullet(target);
        state.player.shoot_timer = state.player.effective_shoot_cooldown();
    }

    // Abilities
    if state.settings.abilities_enabled {
        let ready: Vec<HeldAbility> = state
            .player
            .abilities
            .iter_mut()
            .filter_map(|a| a.tick().then(|| a.clone()))
            .collect();
        for held in ready {
            state.trigger_ability(&held);
        }
    }

    // Turrets
    let targets: Vec<Vec2> = state.enemies.live().map(|e| e.body.pos).collect();
    let mut shots = Vec::new();
    for turret in state.turrets.iter_mut() {
        if turret.is_expired() || !turret.ready() {
            continue;
        }
        if let Some(target) = turret.pick_target(targets.iter().copied()) {
            shots.push((turret.body.pos, target - turret.body.pos, turret.damage));
        }
    }
    for (from, dir, damage) in shots {
        state.spawn_bullet(BulletOwner::Player, from, dir, damage);
    }

    // Boss fire
    let player_pos = state.player.body.pos;
    let boss_shots: Vec<Vec2> = state
        .enemies
        .iter_mut()
        .filter(|e| !e.is_expired())
        .filter_map(|e| e.tick_fire().then_some(e.body.pos))
        .collect();
    let boss_damage = state.tuning.contact_damage;
    for from in boss_shots {
        state.spawn_bullet(BulletOwner::Enemy, from, player_pos - from, boss_damage);
    }

    // Enemy spawns
    state.spawn_timer -= dt;
    if state.spawn_timer <= 0.0 {
        state.spawn_timer += state.spawn_interval.max(dt);
        if state.settings.spawn_enabled {
            state.spawn_enemies(1);
        }
    }

    // World events
    state.event_timer -= dt;
    if state.event_timer <= 0.0 {
        state.event_timer = state.tuning.event_interval.max(dt);
        if state.settings.events_enabled {
            let active = state.events.active_names();
            match state.event_registry.pick_random(&mut state.rng, &active) {
                Ok(Some(event)) => state.events.add(event),
                Ok(None) => log::debug!("No world event eligible"),
                Err(e) => log::error!("World event pick failed: {e}"),
            }
        }
    }
    let step = state.events.update(dt, &state.event_registry);
    for trigger in &step.triggers {
        state.apply_trigger(trigger);
    }
}

/// Drives `tick` from wall-clock frame time
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    accumulator: f32,
    tick_dt: f32,
    max_substeps: u32,
}

impl FixedTimestep {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            accumulator: 0.0,
            tick_dt: tuning.tick_dt(),
            max_substeps: tuning.max_substeps.max(1),
        }
    }

    pub fn tick_dt(&self) -> f32 {
        self.tick_dt
    }

    /// Run as many whole ticks as `elapsed` seconds cover (capped), and
    /// return the leftover fraction of a tick for render interpolation.
    pub fn advance(&mut self, state: &mut GameState, elapsed: f32) -> f32 {
        if !state.is_running() {
            // No stray tick once play resumes
            self.accumulator = 0.0;
            return 0.0;
        }
        if elapsed.is_finite() && elapsed > 0.0 {
            self.accumulator += elapsed;
        }

        let mut substeps = 0;
        while self.accumulator >= self.tick_dt && substeps < self.max_substeps {
            tick(state);
            self.accumulator -= self.tick_dt;
            substeps += 1;
            if !state.is_running() {
                self.accumulator = 0.0;
                return 0.0;
            }
        }

        if self.accumulator >= self.tick_dt {
            log::debug!(
                "Dropping {:.1} ticks of lag",
                self.accumulator / self.tick_dt
            );
            self.accumulator %= self.tick_dt;
        }
        (self.accumulator / self.tick_dt).clamp(0.0, 1.0 - f32::EPSILON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::bonus::BonusOffer;
    use crate::sim::collision::Rect;
    use crate::sim::enemy::EnemyKind;
    use crate::sim::entity::Bullet;
    use crate::sim::hazard::{BlackHole, Wall};
    use crate::sim::hooks::GameHooks;
    use crate::sim::player::Direction;
    use crate::sim::state::GamePhase;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn quiet_state() -> GameState {
        let mut state = GameState::new(12345, Tuning::default());
        state.settings = Settings::quiet();
        state.player.crit_chance = 0.0;
        state
    }

    /// Stationary player bullet sitting on `pos`
    fn place_bullet(state: &mut GameState, pos: Vec2, damage: f32) {
        let id = state.next_entity_id();
        state
            .bullets
            .add(Bullet::new(id, BulletOwner::Player, pos, Vec2::ZERO, 5.0, damage));
    }

    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<String>>>);

    impl GameHooks for Recorder {
        fn show_level_up(&mut self, offers: &[BonusOffer]) {
            self.0.borrow_mut().push(format!("show {}", offers.len()));
        }
        fn hide_level_up(&mut self) {
            self.0.borrow_mut().push("hide".into());
        }
        fn game_over(&mut self, score: u64, kills: u32) {
            self.0.borrow_mut().push(format!("game_over {score} {kills}"));
        }
    }

    #[test]
    fn test_bullet_destroys_enemy_end_to_end() {
        let mut state = quiet_state();
        state.player.damage = 15.0;
        let enemy_pos = state.player.body.pos + Vec2::new(60.0, 0.0);
        state.spawn_enemy_at(enemy_pos, 30.0);
        state.enemies.get_mut(0).unwrap().min_radius = 20.0;
        state.fire_bullet(enemy_pos);

        tick(&mut state);

        assert!(state.enemies.is_empty());
        assert!(state.bullets.is_empty());
        assert_eq!(state.score, 300);
        assert_eq!(state.player.kills, 1);
        assert_eq!(state.damage_texts.len(), 1);
        let text = state.damage_texts.iter().next().unwrap();
        assert_eq!(text.text, "15");
        assert!(!text.crit);
        assert!(!state.particles.is_empty());
    }

    #[test]
    fn test_bullet_shrinks_surviving_enemy() {
        let mut state = quiet_state();
        let pos = state.player.body.pos + Vec2::new(200.0, 0.0);
        state.spawn_enemy_at(pos, 30.0);
        place_bullet(&mut state, pos, 10.0);
        tick(&mut state);
        let enemy = state.enemies.iter().next().unwrap();
        assert_eq!(enemy.body.radius, 20.0);
        assert_eq!(state.score, 0);
        assert!(state.bullets.is_empty());
    }

    #[test]
    fn test_multiple_hits_destroy_exactly_once() {
        let mut state = quiet_state();
        let pos = state.player.body.pos + Vec2::new(200.0, 0.0);
        state.spawn_enemy_at(pos, 30.0);
        state.enemies.get_mut(0).unwrap().min_radius = 20.0;
        for _ in 0..4 {
            place_bullet(&mut state, pos, 4.0);
        }

        tick(&mut state);

        assert!(state.enemies.is_empty());
        assert_eq!(state.player.kills, 1);
        assert_eq!(state.score, 300);
        // Third bullet finished it; the fourth was never spent
        assert_eq!(state.damage_texts.len(), 3);
        assert_eq!(state.bullets.len(), 1);
    }

    #[test]
    fn test_crit_multiplies_and_floors() {
        let mut rng = rand_pcg::Pcg32::new(1, 1);
        assert_eq!(roll_damage(&mut rng, 7.9, 100.0, 2.0), (15.0, true));
        assert_eq!(roll_damage(&mut rng, 7.9, 0.0, 2.0), (7.0, false));
    }

    #[test]
    fn test_contact_damages_and_knocks_back_with_cooldown() {
        let mut state = quiet_state();
        let pos = state.player.body.pos;
        state.spawn_enemy_at(pos + Vec2::new(20.0, 0.0), 20.0);
        state.enemies.get_mut(0).unwrap().body.vel = Vec2::new(-1.0, 0.0);

        tick(&mut state);
        let life = state.player.life;
        assert_eq!(life, state.player.max_life - state.tuning.contact_damage);
        assert!(state.player.body.vel.x < 0.0);

        // Still overlapping, but the enemy is on cooldown
        tick(&mut state);
        assert_eq!(state.player.life, life);
    }

    #[test]
    fn test_lethal_contact_ends_game_immediately() {
        let recorder = Recorder::default();
        let log = recorder.0.clone();
        let mut state = GameState::new(9, Tuning::default()).with_hooks(recorder);
        state.settings = Settings::quiet();
        state.score = 120;
        state.player.life = 5.0;
        let pos = state.player.body.pos;
        state.spawn_enemy_at(pos, 20.0);

        tick(&mut state);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.player.life, 0.0);
        assert_eq!(log.borrow().as_slice(), ["game_over 120 0"]);

        let ticks = state.time_ticks;
        tick(&mut state);
        assert_eq!(state.time_ticks, ticks);
    }

    #[test]
    fn test_level_up_freezes_combat_until_selection() {
        let recorder = Recorder::default();
        let log = recorder.0.clone();
        let mut state = GameState::new(12345, Tuning::default()).with_hooks(recorder);
        state.settings = Settings::quiet();
        state.player.crit_chance = 0.0;
        state.player.xp = state.player.xp_to_next - 1.0;

        let p = state.player.body.pos;
        for offset in [Vec2::new(200.0, 0.0), Vec2::new(-200.0, 0.0)] {
            state.spawn_enemy_at(p + offset, 20.0);
            place_bullet(&mut state, p + offset, 50.0);
        }
        // Resolved after the level-up is detected: must not hurt the player
        state.spawn_enemy_at(p, 20.0);
        let id = state.next_entity_id();
        state
            .enemy_bullets
            .add(Bullet::new(id, BulletOwner::Enemy, p, Vec2::ZERO, 5.0, 7.0));
        let id = state.next_entity_id();
        let mut hole = BlackHole::new(id, p);
        hole.body.radius = 10.0;
        state.black_holes.add(hole);
        let max_life = state.player.max_life;

        tick(&mut state);
        assert_eq!(state.phase, GamePhase::OfferingBonuses);
        assert_eq!(state.score, 200);
        assert_eq!(state.enemies.len(), 2);
        assert_eq!(state.bullets.len(), 1);
        assert_eq!(state.pending_offers.len(), 3);
        assert_eq!(state.player.level, 2);
        assert_eq!(state.player.life, max_life);

        // Nothing moves or scores while the offer is up
        let ticks = state.time_ticks;
        for _ in 0..10 {
            tick(&mut state);
        }
        assert_eq!(state.time_ticks, ticks);
        assert_eq!(state.score, 200);
        assert_eq!(state.enemies.len(), 2);
        assert_eq!(state.player.life, max_life);

        state.select_bonus(0).unwrap();
        tick(&mut state);
        assert_eq!(state.score, 400);
        assert_eq!(state.enemies.len(), 1);
        assert!(state.player.life < state.player.max_life);
        assert_eq!(log.borrow().as_slice(), ["show 3", "hide"]);
    }

    #[test]
    fn test_item_pickup_copies_definition() {
        let mut state = quiet_state();
        let overclock = state.item_types[2].clone();
        let base_damage = state.player.damage;
        let pos = state.player.body.pos;
        state.spawn_item_at(pos, overclock);

        tick(&mut state);
        assert!(state.items.is_empty());
        assert_eq!(state.player.items.len(), 1);
        assert_eq!(state.player.damage, base_damage + 5.0);

        state.player.items[0].def.duration = 3;
        assert_eq!(state.item_types[2].duration, 600);
    }

    #[test]
    fn test_distant_item_is_not_collected() {
        let mut state = quiet_state();
        let medkit = state.item_types[0].clone();
        let pos = state.player.body.pos + Vec2::new(300.0, 0.0);
        state.spawn_item_at(pos, medkit);
        tick(&mut state);
        assert_eq!(state.items.len(), 1);
        assert!(state.player.items.is_empty());
    }

    #[test]
    fn test_nova_item_casts_solar_flare() {
        let mut state = quiet_state();
        let nova = state
            .item_types
            .iter()
            .find(|d| d.name == "Nova")
            .cloned()
            .unwrap();
        let pos = state.player.body.pos;
        state.spawn_item_at(pos, nova);
        tick(&mut state);
        assert_eq!(state.effects.len(), 1);
        assert_eq!(
            state.effects.iter().next().unwrap().ability,
            AbilityKind::SolarFlare
        );
    }

    #[test]
    fn test_heat_threshold_triggers_burst() {
        let mut state = quiet_state();
        state.settings.spawn_enabled = true;
        state.player.heat = state.player.max_heat - 1.0;
        let pos = state.player.body.pos + Vec2::new(200.0, 0.0);
        state.spawn_enemy_at(pos, 20.0);
        place_bullet(&mut state, pos, 50.0);

        tick(&mut state);

        let expected = state.tuning.heat_burst_base + state.tuning.heat_burst_per_level;
        assert_eq!(state.enemies.len(), expected as usize);
        assert_eq!(state.player.heat, 0.0);
    }

    #[test]
    fn test_heat_decays_to_zero() {
        let mut state = quiet_state();
        state.player.heat = 0.12;
        for _ in 0..5 {
            tick(&mut state);
        }
        assert_eq!(state.player.heat, 0.0);
    }

    #[test]
    fn test_spawn_interval_speeds_up_every_twenty_kills() {
        let mut state = quiet_state();
        let before = state.spawn_interval;
        state.player.kills = 19;
        let pos = state.player.body.pos + Vec2::new(200.0, 0.0);
        state.spawn_enemy_at(pos, 20.0);
        place_bullet(&mut state, pos, 50.0);
        tick(&mut state);
        assert!((state.spawn_interval - before * state.tuning.spawn_speedup).abs() < 1e-5);
    }

    /// Two enemies destroyed by bullets in the same tick
    fn double_kill(state: &mut GameState) {
        let p = state.player.body.pos;
        for offset in [Vec2::new(200.0, 0.0), Vec2::new(0.0, 150.0)] {
            state.spawn_enemy_at(p + offset, 20.0);
            place_bullet(state, p + offset, 50.0);
        }
        tick(state);
        assert!(state.enemies.is_empty());
    }

    #[test]
    fn test_speedup_when_double_kill_crosses_twenty() {
        let mut state = quiet_state();
        let before = state.spawn_interval;
        state.player.kills = 19;
        double_kill(&mut state);
        assert_eq!(state.player.kills, 21);
        assert!((state.spawn_interval - before * state.tuning.spawn_speedup).abs() < 1e-5);
    }

    #[test]
    fn test_speedup_once_when_double_kill_lands_on_twenty() {
        let mut state = quiet_state();
        let before = state.spawn_interval;
        state.player.kills = 18;
        double_kill(&mut state);
        assert_eq!(state.player.kills, 20);
        assert!((state.spawn_interval - before * state.tuning.spawn_speedup).abs() < 1e-5);
    }

    #[test]
    fn test_item_drops_every_ten_kills() {
        let mut state = quiet_state();
        // Corner spot, clear of every drop point
        state.player.body.pos = Vec2::splat(state.player.body.radius + 1.0);
        state.player.kills = 9;
        double_kill(&mut state);
        assert_eq!(state.player.kills, 11);
        assert_eq!(state.items.len(), 1);

        state.player.kills = 12;
        double_kill(&mut state);
        assert_eq!(state.items.len(), 1);
    }

    #[test]
    fn test_heat_gain_uses_each_kills_own_count() {
        let mut state = quiet_state();
        let t = state.tuning.clone();
        state.player.kills = 4;
        double_kill(&mut state);
        let gain = |k: f32| (t.heat_per_kill - t.heat_log_factor * (1.0 + k).ln()).max(0.0);
        let expected = (gain(5.0) + gain(6.0) - t.heat_decay).max(0.0);
        assert!((state.player.heat - expected).abs() < 1e-4);
    }

    #[test]
    fn test_timed_spawns_respect_gate() {
        let mut state = quiet_state();
        let ticks = (state.tuning.spawn_interval * state.tuning.tick_rate) as usize + 2;
        for _ in 0..ticks {
            tick(&mut state);
        }
        assert!(state.enemies.is_empty());

        state.settings.spawn_enabled = true;
        for _ in 0..ticks {
            tick(&mut state);
        }
        assert!(!state.enemies.is_empty());
    }

    #[test]
    fn test_held_fire_shoots_on_cooldown() {
        let mut state = quiet_state();
        state.set_mouse(Vec2::new(1200.0, 360.0));
        state.set_firing(true);
        let ticks = state.player.shoot_cooldown as usize * 2;
        for _ in 0..ticks {
            tick(&mut state);
        }
        assert_eq!(state.bullets.len(), 2);
        assert!(state.bullets.iter().all(|b| b.body.vel.x > 0.0));
    }

    #[test]
    fn test_single_fire_request_is_consumed() {
        let mut state = quiet_state();
        assert!(state.fire());
        tick(&mut state);
        assert_eq!(state.bullets.len(), 1);
        assert!(!state.player.fire_requested);
        tick(&mut state);
        assert_eq!(state.bullets.len(), 1);
    }

    #[test]
    fn test_ability_fires_when_enabled() {
        let mut state = quiet_state();
        let mut held = HeldAbility::new(AbilityKind::Slash);
        held.timer = 1.0;
        state.player.abilities.push(held);

        tick(&mut state);
        assert!(state.effects.is_empty());

        state.settings.abilities_enabled = true;
        state.player.abilities[0].timer = 1.0;
        tick(&mut state);
        assert_eq!(state.effects.len(), 1);
    }

    #[test]
    fn test_beam_deals_its_own_damage() {
        let mut state = quiet_state();
        state.player.damage = 1.0;
        let p = state.player.body.pos;
        let enemy_pos = p + Vec2::new(100.0, 0.0);
        state.spawn_enemy_at(enemy_pos, 40.0);
        state.set_mouse(enemy_pos);
        let held = HeldAbility::new(AbilityKind::Kamehameha);
        assert!(state.trigger_ability(&held));

        // First tick grows the beam, second resolves the hit
        tick(&mut state);
        tick(&mut state);
        let enemy = state.enemies.iter().next().unwrap();
        assert_eq!(enemy.body.radius, 40.0 - held.damage);
    }

    #[test]
    fn test_enemy_bullet_hurts_player() {
        let mut state = quiet_state();
        let pos = state.player.body.pos;
        state.spawn_bullet(BulletOwner::Enemy, pos, Vec2::X, 7.0);
        tick(&mut state);
        assert_eq!(state.player.life, state.player.max_life - 7.0);
        assert!(state.enemy_bullets.is_empty());
    }

    #[test]
    fn test_wall_pushes_player_out() {
        let mut state = quiet_state();
        let p = state.player.body.pos;
        let id = state.next_entity_id();
        state.walls.add(Wall::new(
            id,
            Rect::from_center(p + Vec2::new(10.0, 0.0), Vec2::new(20.0, 50.0)),
        ));
        tick(&mut state);
        assert!((state.player.body.pos.x - (p.x - 25.0)).abs() < 1e-3);
    }

    #[test]
    fn test_wall_blocks_bullets() {
        let mut state = quiet_state();
        let p = state.player.body.pos + Vec2::new(200.0, 0.0);
        let id = state.next_entity_id();
        state
            .walls
            .add(Wall::new(id, Rect::from_center(p, Vec2::new(20.0, 20.0))));
        place_bullet(&mut state, p, 10.0);
        tick(&mut state);
        assert!(state.bullets.is_empty());
    }

    #[test]
    fn test_boss_event_chain() {
        let mut state = quiet_state();
        state.activate_event("Boss Warning").unwrap();
        let ticks = (3.5 * state.tuning.tick_rate) as usize;
        for _ in 0..ticks {
            tick(&mut state);
        }
        assert!(!state.events.is_active("Boss Warning"));
        assert!(state.events.is_active("Boss Fight"));
        assert!(state.enemies.iter().any(|e| e.kind == EnemyKind::Boss));
    }

    #[test]
    fn test_swarm_event_spawns_enemies() {
        let mut state = quiet_state();
        state.activate_event("Swarm").unwrap();
        tick(&mut state);
        assert_eq!(state.enemies.len(), 8);
    }

    #[test]
    fn test_paused_state_does_not_tick() {
        let mut state = quiet_state();
        state.pause();
        tick(&mut state);
        assert_eq!(state.time_ticks, 0);
        state.resume();
        tick(&mut state);
        assert_eq!(state.time_ticks, 1);
    }

    #[test]
    fn test_same_seed_same_outcome() {
        fn run(seed: u64) -> (u64, u32, Vec2, Vec<Vec2>) {
            let mut state = GameState::new(seed, Tuning::default());
            state.set_mouse(Vec2::new(900.0, 200.0));
            state.set_firing(true);
            for i in 0..900u32 {
                state.set_direction(Direction::Left, (i / 60) % 2 == 0);
                state.set_direction(Direction::Right, (i / 60) % 2 == 1);
                tick(&mut state);
                if state.phase == GamePhase::OfferingBonuses {
                    state.select_bonus(0).unwrap();
                }
                if state.phase == GamePhase::GameOver {
                    break;
                }
            }
            let enemies = state.enemies.iter().map(|e| e.body.pos).collect();
            (state.score, state.player.kills, state.player.body.pos, enemies)
        }
        assert_eq!(run(77), run(77));
    }

    #[test]
    fn test_fixed_timestep_runs_whole_ticks() {
        let mut state = quiet_state();
        let mut stepper = FixedTimestep::new(&state.tuning);
        let alpha = stepper.advance(&mut state, 0.04);
        assert_eq!(state.time_ticks, 2);
        assert!((alpha - 0.4).abs() < 1e-3);
    }

    #[test]
    fn test_fixed_timestep_caps_substeps() {
        let mut state = quiet_state();
        let mut stepper = FixedTimestep::new(&state.tuning);
        let alpha = stepper.advance(&mut state, 5.0);
        assert_eq!(state.time_ticks, state.tuning.max_substeps as u64);
        assert!((0.0..1.0).contains(&alpha));
    }

    #[test]
    fn test_fixed_timestep_holds_while_paused() {
        let mut state = quiet_state();
        let mut stepper = FixedTimestep::new(&state.tuning);
        state.pause();
        assert_eq!(stepper.advance(&mut state, 0.5), 0.0);
        state.resume();
        stepper.advance(&mut state, 0.001);
        assert_eq!(state.time_ticks, 0);
    }
}
