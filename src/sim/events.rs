//! Scripted world events
//!
//! An event counts down in seconds. Each time the countdown runs out it
//! fires its triggers and rearms, until its activation budget is spent;
//! then it runs its exit triggers, leaves the store, and optionally starts
//! a successor (warning -> boss fight -> aftermath).

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::weighted::WeightTable;
use crate::error::SimError;

/// World change an event performs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventTrigger {
    SpawnEnemies { count: u32 },
    SpawnBoss,
    SpawnBlackHole,
    SpawnWalls { count: u32 },
    DropItems { count: u32 },
    HealPlayer { amount: f32 },
}

/// Presentation cue for the renderer while the event is active
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventVisual {
    Banner(String),
    ScreenTint(u32),
    Shake(f32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDef {
    pub name: String,
    /// Random-selection weight; 0 means chain-only
    pub weight: u32,
    /// Seconds between activations
    pub cooldown: f32,
    /// Seconds before the first activation
    #[serde(default)]
    pub delay: f32,
    /// Number of activations before the event retires
    pub activations: u32,
    pub triggers: Vec<EventTrigger>,
    #[serde(default)]
    pub visuals: Vec<EventVisual>,
    #[serde(default)]
    pub on_exit: Vec<EventTrigger>,
    /// Event started when this one retires
    #[serde(default)]
    pub next: Option<String>,
}

/// A running event
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedEvent {
    pub def: EventDef,
    /// Seconds until the next activation (or retirement)
    pub remaining: f32,
    /// Activations left
    pub budget: u32,
}

impl ScriptedEvent {
    pub fn new(def: EventDef) -> Self {
        Self {
            remaining: def.delay,
            budget: def.activations,
            def,
        }
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }
}

/// All known events by name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRegistry {
    defs: Vec<EventDef>,
}

impl Default for EventRegistry {
    fn default() -> Self {
        Self {
            defs: event_catalog(),
        }
    }
}

impl EventRegistry {
    pub fn new(defs: Vec<EventDef>) -> Self {
        Self { defs }
    }

    pub fn get(&self, name: &str) -> Result<&EventDef, SimError> {
        self.defs
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| SimError::UnknownEvent(name.to_string()))
    }

    pub fn instantiate(&self, name: &str) -> Result<ScriptedEvent, SimError> {
        Ok(ScriptedEvent::new(self.get(name)?.clone()))
    }

    /// Every `next` link must name a registered event
    pub fn validate(&self) -> Result<(), SimError> {
        for def in &self.defs {
            if let Some(next) = &def.next {
                self.get(next)?;
            }
        }
        Ok(())
    }

    /// Weighted pick among randomly selectable events not in `exclude`.
    /// `Ok(None)` when nothing is eligible.
    pub fn pick_random<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        exclude: &[&str],
    ) -> Result<Option<ScriptedEvent>, SimError> {
        let eligible: Vec<&EventDef> = self
            .defs
            .iter()
            .filter(|d| d.weight > 0 && !exclude.contains(&d.name.as_str()))
            .collect();
        if eligible.is_empty() {
            return Ok(None);
        }
        let weights: Vec<u32> = eligible.iter().map(|d| d.weight).collect();
        let idx = WeightTable::new(&weights)?.sample(rng);
        Ok(Some(ScriptedEvent::new(eligible[idx].clone())))
    }
}

/// What one store update produced
#[derive(Debug, Default)]
pub struct EventStep {
    /// Triggers to run, in firing order
    pub triggers: Vec<EventTrigger>,
    /// Chain links that could not be followed
    pub errors: Vec<SimError>,
}

#[derive(Debug, Clone, Default)]
pub struct EventStore {
    events: Vec<ScriptedEvent>,
}

impl EventStore {
    pub fn add(&mut self, event: ScriptedEvent) {
        log::info!("Event {} started", event.name());
        self.events.push(event);
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.events.iter().any(|e| e.name() == name)
    }

    pub fn active_names(&self) -> Vec<&str> {
        self.events.iter().map(|e| e.name()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScriptedEvent> {
        self.events.iter()
    }

    /// Visual cues of every active event
    pub fn visuals(&self) -> impl Iterator<Item = &EventVisual> {
        self.events.iter().flat_map(|e| e.def.visuals.iter())
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Advance every event by `dt` seconds
    pub fn update(&mut self, dt: f32, registry: &EventRegistry) -> EventStep {
        let mut step = EventStep::default();
        let mut successors = Vec::new();
        let mut retired = Vec::new();

        for (index, event) in self.events.iter_mut().enumerate() {
            event.remaining -= dt;
            if event.remaining > 0.0 {
                continue;
            }

            if event.budget > 0 {
                event.budget -= 1;
                event.remaining = event.def.cooldown;
                log::debug!("Event {} fired ({} left)", event.name(), event.budget);
                step.triggers.extend(event.def.triggers.iter().cloned());
            } else {
                log::info!("Event {} finished", event.name());
                step.triggers.extend(event.def.on_exit.iter().cloned());
                if let Some(next) = &event.def.next {
                    match registry.instantiate(next) {
                        Ok(successor) => successors.push(successor),
                        Err(e) => {
                            log::error!("Event {} cannot chain: {e}", event.name());
                            step.errors.push(e);
                        }
                    }
                }
                retired.push(index);
            }
        }

        let mut index = 0;
        self.events.retain(|_| {
            let keep = !retired.contains(&index);
            index += 1;
            keep
        });
        for successor in successors {
            log::info!("Chaining into {}", successor.name());
            self.add(successor);
        }
        step
    }
}

/// Built-in events
pub fn event_catalog() -> Vec<EventDef> {
    vec![
        EventDef {
            name: "Swarm".into(),
            weight: 3,
            cooldown: 4.0,
            delay: 0.0,
            activations: 3,
            triggers: vec![EventTrigger::SpawnEnemies { count: 8 }],
            visuals: vec![EventVisual::Banner("Swarm incoming".into())],
            on_exit: Vec::new(),
            next: None,
        },
        EventDef {
            name: "Walls".into(),
            weight: 2,
            cooldown: 12.0,
            delay: 0.0,
            activations: 1,
            triggers: vec![EventTrigger::SpawnWalls { count: 3 }],
            visuals: Vec::new(),
            on_exit: Vec::new(),
            next: None,
        },
        EventDef {
            name: "Black Hole".into(),
            weight: 2,
            cooldown: 10.0,
            delay: 0.0,
            activations: 1,
            triggers: vec![EventTrigger::SpawnBlackHole],
            visuals: vec![EventVisual::ScreenTint(0x1a0033)],
            on_exit: Vec::new(),
            next: None,
        },
        EventDef {
            name: "Boss Warning".into(),
            weight: 1,
            cooldown: 3.0,
            delay: 0.0,
            activations: 1,
            triggers: Vec::new(),
            visuals: vec![
                EventVisual::Banner("WARNING".into()),
                EventVisual::ScreenTint(0x660000),
            ],
            on_exit: Vec::new(),
            next: Some("Boss Fight".into()),
        },
        EventDef {
            name: "Boss Fight".into(),
            weight: 0,
            cooldown: 30.0,
            delay: 0.0,
            activations: 1,
            triggers: vec![EventTrigger::SpawnBoss],
            visuals: vec![EventVisual::Shake(4.0)],
            on_exit: Vec::new(),
            next: Some("After Battle".into()),
        },
        EventDef {
            name: "After Battle".into(),
            weight: 0,
            cooldown: 1.0,
            delay: 0.0,
            activations: 1,
            triggers: vec![
                EventTrigger::DropItems { count: 3 },
                EventTrigger::HealPlayer { amount: 30.0 },
            ],
            visuals: vec![EventVisual::Banner("Victory".into())],
            on_exit: Vec::new(),
            next: None,
        },
    ]
}
