//! Circle Rush headless runner
//!
//! Plays sessions with a simple autopilot so the simulation can be exercised
//! (and profiled) without a renderer.
//!
//! Usage: `circle-rush [seed] [tuning.json] [leaderboard.json]`

use std::path::Path;

use circle_rush::scores::submit_final_score;
use circle_rush::sim::{Direction, FixedTimestep, GamePhase, GameState};
use circle_rush::{Leaderboard, ScoreStore, Tuning};

/// Frame budget per session (five minutes at 60 fps)
const MAX_FRAMES: u32 = 60 * 60 * 5;
/// Simulated display frame time
const FRAME_DT: f32 = 1.0 / 60.0;

fn load_tuning(path: Option<&str>) -> Tuning {
    let Some(path) = path else {
        return Tuning::default();
    };
    let loaded = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|json| Tuning::from_json(&json).map_err(|e| e.to_string()));
    match loaded {
        Ok(tuning) => {
            log::info!("Loaded tuning from {path}");
            tuning
        }
        Err(e) => {
            log::warn!("Using default tuning ({path}: {e})");
            Tuning::default()
        }
    }
}

fn load_leaderboard(path: Option<&str>) -> Leaderboard {
    let board = path
        .filter(|p| Path::new(p).exists())
        .and_then(|p| std::fs::read_to_string(p).ok())
        .and_then(|json| match Leaderboard::from_json(&json) {
            Ok(board) => Some(board),
            Err(e) => {
                log::warn!("Ignoring leaderboard file: {e}");
                None
            }
        });
    board.unwrap_or_else(|| Leaderboard::new("autopilot"))
}

/// Steer away from the closest enemy, aim at it, and keep the trigger held
fn autopilot(state: &mut GameState) {
    let pos = state.player.body.pos;
    let nearest = state
        .enemies
        .live()
        .map(|e| e.body.pos)
        .min_by(|a, b| a.distance_squared(pos).total_cmp(&b.distance_squared(pos)));

    let Some(target) = nearest else {
        state.player.input.reset();
        state.set_firing(false);
        return;
    };

    let away = pos - target;
    let danger = away.length() < 220.0;
    state.set_direction(Direction::Left, danger && away.x < 0.0);
    state.set_direction(Direction::Right, danger && away.x > 0.0);
    state.set_direction(Direction::Up, danger && away.y < 0.0);
    state.set_direction(Direction::Down, danger && away.y > 0.0);
    state.set_mouse(target);
    state.set_firing(true);
}

fn play(state: &mut GameState) {
    let mut stepper = FixedTimestep::new(&state.tuning);
    for frame in 0..MAX_FRAMES {
        match state.phase {
            GamePhase::GameOver => return,
            GamePhase::OfferingBonuses => {
                // Highest rarity on offer, first one on ties
                let pick = state
                    .pending_offers
                    .iter()
                    .enumerate()
                    .max_by_key(|(i, o)| (o.rarity(), std::cmp::Reverse(*i)))
                    .map(|(i, _)| i)
                    .unwrap_or(0);
                if let Err(e) = state.select_bonus(pick) {
                    log::error!("Autopilot could not pick a bonus: {e}");
                    return;
                }
                continue;
            }
            _ => {}
        }

        autopilot(state);
        // Hitch every few seconds to exercise catch-up
        let elapsed = if frame % 240 == 239 { FRAME_DT * 4.0 } else { FRAME_DT };
        let alpha = stepper.advance(state, elapsed);
        if frame % 600 == 0 {
            let render_pos = state.player.body.render_pos(alpha);
            log::debug!(
                "t={}s player=({:.0}, {:.0}) life={:.0} enemies={} score={}",
                frame / 60,
                render_pos.x,
                render_pos.y,
                state.player.life,
                state.enemies.len(),
                state.score
            );
        }
    }
    log::info!("Frame budget spent, ending session");
    state.end_game();
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let seed = args
        .first()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0x5eed);
    let tuning = load_tuning(args.get(1).map(String::as_str));
    let leaderboard_path = args.get(2).map(String::as_str);
    let mut leaderboard = load_leaderboard(leaderboard_path);

    log::info!("Circle Rush (headless) starting...");
    let mut state = GameState::new(seed, tuning);
    play(&mut state);

    let survived = state.time_ticks as f32 / state.tuning.tick_rate;
    log::info!(
        "Run finished: score {} | kills {} | level {} | {:.1}s survived",
        state.score,
        state.player.kills,
        state.player.level,
        survived
    );

    if let Some(rank) = leaderboard.potential_rank(state.score) {
        log::info!("New leaderboard rank: #{rank}");
    }
    submit_final_score(&mut leaderboard, state.score, state.player.kills);
    match leaderboard.load_top_scores() {
        Ok(top) => {
            for (i, entry) in top.iter().enumerate() {
                log::info!("{:>2}. {:<12} {:>8} ({} kills)", i + 1, entry.username, entry.score, entry.kills);
            }
        }
        Err(e) => log::warn!("Could not load top scores: {e}"),
    }

    if let Some(path) = leaderboard_path {
        match leaderboard.to_json() {
            Ok(json) => {
                if let Err(e) = std::fs::write(path, json) {
                    log::warn!("Could not save leaderboard to {path}: {e}");
                }
            }
            Err(e) => log::warn!("Could not serialize leaderboard: {e}"),
        }
    }
}
