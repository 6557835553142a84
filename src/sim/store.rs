//! Owned, insertion-ordered collection of one entity kind
//!
//! Removal is always deferred: entities are flagged during a pass and the
//! store is compacted once the pass is over, so indices stay valid while
//! collision resolution is iterating.

use super::entity::{Entity, UpdateCtx};

#[derive(Debug, Clone)]
pub struct EntityStore<T> {
    items: Vec<T>,
}

impl<T> Default for EntityStore<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Entity> EntityStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, entity: T) {
        self.items.push(entity);
    }

    /// Step every live entity, then drop the ones flagged for removal.
    ///
    /// An entity whose update fails is logged and dropped; the rest of the
    /// store still advances.
    pub fn update(&mut self, ctx: &UpdateCtx) {
        for entity in self.items.iter_mut() {
            if entity.is_expired() {
                continue;
            }
            entity.body_mut().snapshot();
            if let Err(e) = entity.update(ctx) {
                log::warn!("Skipping entity {}: {e}", entity.body().id);
                entity.body_mut().removed = true;
            }
        }
        self.compact();
    }

    /// Remove everything flagged during the last pass
    pub fn compact(&mut self) {
        self.items.retain(|e| !e.is_expired());
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Entities not flagged for removal
    pub fn live(&self) -> impl Iterator<Item = &T> {
        self.items.iter().filter(|e| !e.is_expired())
    }

    pub fn live_count(&self) -> usize {
        self.live().count()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.items.get_mut(index)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<'a, T: Entity> IntoIterator for &'a EntityStore<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;
    use crate::sim::entity::Body;
    use glam::Vec2;

    /// Test entity: counts down and fails when told to
    struct Countdown {
        body: Body,
        left: u32,
        fail: bool,
    }

    impl Entity for Countdown {
        fn body(&self) -> &Body {
            &self.body
        }
        fn body_mut(&mut self) -> &mut Body {
            &mut self.body
        }
        fn update(&mut self, _ctx: &UpdateCtx) -> Result<(), SimError> {
            if self.fail {
                return Err(SimError::Degenerate {
                    id: self.body.id,
                    reason: "test",
                });
            }
            self.body.pos.x += 1.0;
            self.left = self.left.saturating_sub(1);
            if self.left == 0 {
                self.body.removed = true;
            }
            Ok(())
        }
    }

    fn countdown(id: u32, left: u32, fail: bool) -> Countdown {
        Countdown {
            body: Body::new(id, Vec2::ZERO, 1.0, 0),
            left,
            fail,
        }
    }

    fn ctx() -> UpdateCtx {
        UpdateCtx {
            player_pos: Vec2::ZERO,
            player_radius: 1.0,
            player_level: 1,
            arena: Vec2::splat(100.0),
            tick: 0,
        }
    }

    #[test]
    fn test_update_compacts_expired_in_order() {
        let mut store = EntityStore::new();
        store.add(countdown(1, 1, false));
        store.add(countdown(2, 3, false));
        store.add(countdown(3, 1, false));
        store.update(&ctx());
        let ids: Vec<u32> = store.iter().map(|e| e.body.id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn test_failing_entity_is_isolated() {
        let mut store = EntityStore::new();
        store.add(countdown(1, 5, false));
        store.add(countdown(2, 5, true));
        store.add(countdown(3, 5, false));
        store.update(&ctx());
        assert_eq!(store.len(), 2);
        assert!(store.iter().all(|e| e.body.pos.x == 1.0));
    }

    #[test]
    fn test_flagged_entities_stay_until_compact() {
        let mut store = EntityStore::new();
        store.add(countdown(1, 5, false));
        store.add(countdown(2, 5, false));
        store.get_mut(0).unwrap().body.removed = true;
        assert_eq!(store.len(), 2);
        assert_eq!(store.live_count(), 1);
        store.compact();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_update_snapshots_previous_position() {
        let mut store = EntityStore::new();
        store.add(countdown(1, 5, false));
        store.update(&ctx());
        let e = store.iter().next().unwrap();
        assert_eq!(e.body.prev_pos.x, 0.0);
        assert_eq!(e.body.pos.x, 1.0);
    }
}
