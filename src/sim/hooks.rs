//! Notifications for the HUD / level-up screen
//!
//! The simulation never reads anything back through these; they exist so a
//! front end can react without polling every field each frame.

use super::bonus::BonusOffer;

pub trait GameHooks {
    fn player_life_changed(&mut self, _life: f32, _max_life: f32) {}

    fn stats_changed(&mut self, _score: u64, _kills: u32, _level: u32) {}

    /// Offers are pending; answer with `GameState::select_bonus`
    fn show_level_up(&mut self, _offers: &[BonusOffer]) {}

    fn hide_level_up(&mut self) {}

    fn game_over(&mut self, _score: u64, _kills: u32) {}
}

/// Headless default
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl GameHooks for NoHooks {}
