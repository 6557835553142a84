//! Weighted random selection
//!
//! Each index is repeated `weight` times in a flat table and one slot is
//! drawn uniformly. Weights here are small (tens at most), so the table
//! stays tiny.

use rand::Rng;

use crate::error::SimError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightTable {
    slots: Vec<usize>,
}

impl WeightTable {
    /// Build the flattened table. Fails if no weight is positive.
    pub fn new(weights: &[u32]) -> Result<Self, SimError> {
        let slots: Vec<usize> = weights
            .iter()
            .enumerate()
            .flat_map(|(i, &w)| std::iter::repeat_n(i, w as usize))
            .collect();
        if slots.is_empty() {
            return Err(SimError::EmptyWeights);
        }
        Ok(Self { slots })
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        self.slots[rng.random_range(0..self.slots.len())]
    }

    /// Sum of all weights
    pub fn total(&self) -> usize {
        self.slots.len()
    }
}

/// One-off weighted pick over `weights`
pub fn pick_weighted<R: Rng + ?Sized>(weights: &[u32], rng: &mut R) -> Result<usize, SimError> {
    Ok(WeightTable::new(weights)?.sample(rng))
}

/// Weighted pick over items, returning a reference to the chosen one
pub fn pick_by<'a, T, R, F>(items: &'a [T], rng: &mut R, weight: F) -> Result<&'a T, SimError>
where
    R: Rng + ?Sized,
    F: Fn(&T) -> u32,
{
    let weights: Vec<u32> = items.iter().map(weight).collect();
    let idx = pick_weighted(&weights, rng)?;
    Ok(&items[idx])
}
