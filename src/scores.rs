//! Score store contract and local leaderboard
//!
//! The remote leaderboard is an external collaborator; the simulation only
//! talks to it through `ScoreStore`, and only from game-over/menu states.

use serde::{Deserialize, Serialize};

use crate::error::ScoreError;

/// Maximum number of scores returned by `load_top_scores`
pub const MAX_HIGH_SCORES: usize = 10;

/// A single leaderboard row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub username: String,
    pub score: u64,
    #[serde(default)]
    pub kills: u32,
}

/// Persistence collaborator for final scores
pub trait ScoreStore {
    /// Submit a finished run. `Ok(false)` means the store declined it.
    fn submit_score(&mut self, score: u64, kills: u32) -> Result<bool, ScoreError>;
    /// Top scores, descending by score
    fn load_top_scores(&self) -> Result<Vec<ScoreEntry>, ScoreError>;
    /// Best score of one user (0 if they never submitted)
    fn load_player_best_score(&self, user_id: &str) -> Result<u64, ScoreError>;
}

/// Submit a final score, absorbing store failures.
///
/// Failures are logged and reported as `false`; game state is never touched.
pub fn submit_final_score(store: &mut dyn ScoreStore, score: u64, kills: u32) -> bool {
    match store.submit_score(score, kills) {
        Ok(accepted) => {
            log::info!("Score {score} ({kills} kills) submitted, accepted: {accepted}");
            accepted
        }
        Err(e) => {
            log::warn!("Score submission failed: {e}");
            false
        }
    }
}

/// In-memory leaderboard for one local user
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Leaderboard {
    /// Name recorded with every submission
    pub username: String,
    /// All submissions, sorted descending by score
    pub entries: Vec<ScoreEntry>,
}

impl Leaderboard {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            entries: Vec::new(),
        }
    }

    /// Rank a score would achieve on the top list (1-indexed)
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if score == 0 {
            return None;
        }
        let rank = self
            .entries
            .iter()
            .position(|e| score > e.score)
            .unwrap_or(self.entries.len())
            + 1;
        (rank <= MAX_HIGH_SCORES).then_some(rank)
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    pub fn from_json(json: &str) -> Result<Self, ScoreError> {
        serde_json::from_str(json).map_err(|e| ScoreError::Unavailable(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, ScoreError> {
        serde_json::to_string(self).map_err(|e| ScoreError::Unavailable(e.to_string()))
    }
}

impl ScoreStore for Leaderboard {
    fn submit_score(&mut self, score: u64, kills: u32) -> Result<bool, ScoreError> {
        if self.username.is_empty() {
            return Err(ScoreError::Rejected("not signed in".into()));
        }
        if score == 0 {
            return Ok(false);
        }

        let entry = ScoreEntry {
            username: self.username.clone(),
            score,
            kills,
        };
        // Stable: equal scores keep submission order
        let pos = self
            .entries
            .iter()
            .position(|e| score > e.score)
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, entry);
        Ok(true)
    }

    fn load_top_scores(&self) -> Result<Vec<ScoreEntry>, ScoreError> {
        Ok(self.entries.iter().take(MAX_HIGH_SCORES).cloned().collect())
    }

    fn load_player_best_score(&self, user_id: &str) -> Result<u64, ScoreError> {
        Ok(self
            .entries
            .iter()
            .filter(|e| e.username == user_id)
            .map(|e| e.score)
            .max()
            .unwrap_or(0))
    }
}
