//! Gameplay gates
//!
//! Runtime toggles the UI (or a test) flips to switch whole subsystems on
//! and off. Reset to defaults at every game start.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Timed and heat-triggered enemy spawns
    pub spawn_enabled: bool,
    /// Player shooting (manual trigger and held fire)
    pub shoot_enabled: bool,
    /// Held abilities firing on their cooldowns
    pub abilities_enabled: bool,
    /// Random scripted world events
    pub events_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            spawn_enabled: true,
            shoot_enabled: true,
            abilities_enabled: true,
            events_enabled: true,
        }
    }
}

impl Settings {
    /// Shooting only; tests switch on the rest as needed
    pub fn quiet() -> Self {
        Self {
            spawn_enabled: false,
            shoot_enabled: true,
            abilities_enabled: false,
            events_enabled: false,
        }
    }

    pub fn from_json(json: &str) -> Option<Self> {
        match serde_json::from_str(json) {
            Ok(settings) => Some(settings),
            Err(e) => {
                log::warn!("Ignoring malformed settings: {e}");
                None
            }
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
