//! Error types
//!
//! Simulation errors are content/configuration bugs: the offending operation
//! aborts and the caller logs it. Score store errors are transient and are
//! absorbed at the boundary.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    #[error("weighted pick needs at least one positive weight")]
    EmptyWeights,
    #[error("scripted event `{0}` is not registered")]
    UnknownEvent(String),
    #[error("player has no stat `{0}`")]
    UnknownStat(String),
    #[error("bonus index {index} out of range ({offered} offered)")]
    InvalidSelection { index: usize, offered: usize },
    #[error("no bonus offer is pending")]
    NotOfferingBonuses,
    #[error("entity {id} has degenerate geometry: {reason}")]
    Degenerate { id: u32, reason: &'static str },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScoreError {
    #[error("score store unavailable: {0}")]
    Unavailable(String),
    #[error("score rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}
