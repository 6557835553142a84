//! Level-up rewards: bonus definitions, the offerable pool, offer
//! generation, and applying a chosen bonus to the player.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::ability::{AbilityKind, HeldAbility};
use super::player::{Player, StatKey};
use super::weighted::{WeightTable, pick_weighted};
use crate::error::SimError;

/// Number of bonuses offered per level-up
pub const OFFER_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BonusKind {
    Attribute,
    /// Grants a new ability
    Ability(AbilityKind),
    /// Improves an owned ability
    Upgrade(AbilityKind),
}

/// Extra work a modifier does after its stat delta lands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SideEffect {
    /// Keep the life fraction when max life changes
    HealProportional,
    /// Let a new shot cadence apply to the running timer
    RestartShootTimer,
    RestartAbilityTimer(AbilityKind),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    pub stat: StatKey,
    /// Amount per rarity tier
    pub amounts: Vec<f32>,
    #[serde(default)]
    pub effects: Vec<SideEffect>,
}

impl Modifier {
    fn new(stat: StatKey, amounts: &[f32]) -> Self {
        Self {
            stat,
            amounts: amounts.to_vec(),
            effects: Vec::new(),
        }
    }

    fn with(mut self, effect: SideEffect) -> Self {
        self.effects.push(effect);
        self
    }

    /// Amount for `tier`; the last tier covers anything past the end
    pub fn amount(&self, tier: Option<usize>) -> f32 {
        let idx = tier.unwrap_or(0).min(self.amounts.len().saturating_sub(1));
        self.amounts.get(idx).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub fn from_tier(tier: usize) -> Self {
        match tier {
            0 => Rarity::Common,
            1 => Rarity::Rare,
            2 => Rarity::Epic,
            _ => Rarity::Legendary,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusDef {
    pub name: String,
    pub kind: BonusKind,
    /// Offer weight; 0 keeps it out of offers
    pub weight: u32,
    pub modifiers: Vec<Modifier>,
    /// Weight per rarity tier (attributes and upgrades)
    #[serde(default)]
    pub tier_weights: Vec<u32>,
    /// Upgrade bonuses injected into the pool once this ability is owned
    #[serde(default)]
    pub unlocks: Vec<BonusDef>,
}

/// A rolled bonus shown on the level-up screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusOffer {
    pub def: BonusDef,
    pub tier: Option<usize>,
}

impl BonusOffer {
    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn rarity(&self) -> Option<Rarity> {
        self.tier.map(Rarity::from_tier)
    }
}

/// Bonuses currently eligible to be offered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusPool {
    pub defs: Vec<BonusDef>,
}

impl Default for BonusPool {
    fn default() -> Self {
        Self {
            defs: bonus_catalog(),
        }
    }
}

impl BonusPool {
    pub fn contains(&self, name: &str) -> bool {
        self.defs.iter().any(|d| d.name == name)
    }

    pub fn remove(&mut self, name: &str) -> Option<BonusDef> {
        let idx = self.defs.iter().position(|d| d.name == name)?;
        Some(self.defs.remove(idx))
    }

    /// Add definitions not already present (by name)
    pub fn extend(&mut self, defs: impl IntoIterator<Item = BonusDef>) {
        for def in defs {
            if !self.contains(&def.name) {
                self.defs.push(def);
            }
        }
    }

    fn offerable(&self, player: &Player) -> Vec<&BonusDef> {
        self.defs
            .iter()
            .filter(|d| d.weight > 0)
            .filter(|d| match d.kind {
                BonusKind::Attribute => true,
                BonusKind::Ability(kind) => !player.has_ability(kind),
                BonusKind::Upgrade(kind) => player.has_ability(kind),
            })
            .collect()
    }
}

/// Draw up to `OFFER_COUNT` bonuses, unique by name, weighted by
/// definition weight; attributes and upgrades roll a rarity tier.
pub fn generate_offers<R: Rng + ?Sized>(
    pool: &BonusPool,
    player: &Player,
    rng: &mut R,
) -> Result<Vec<BonusOffer>, SimError> {
    let mut candidates = pool.offerable(player);
    let mut offers = Vec::with_capacity(OFFER_COUNT);

    while offers.len() < OFFER_COUNT && !candidates.is_empty() {
        let weights: Vec<u32> = candidates.iter().map(|d| d.weight).collect();
        let idx = WeightTable::new(&weights)?.sample(rng);
        let def = candidates.swap_remove(idx);
        // Same name could appear twice if content duplicates it
        candidates.retain(|d| d.name != def.name);

        let tier = match def.kind {
            BonusKind::Ability(_) => None,
            _ if def.tier_weights.is_empty() => Some(0),
            _ => Some(pick_weighted(&def.tier_weights, rng)?),
        };
        offers.push(BonusOffer {
            def: def.clone(),
            tier,
        });
    }

    Ok(offers)
}

/// Apply a chosen bonus. Nothing is changed if any modifier targets a stat
/// the player does not have.
pub fn apply_bonus(player: &mut Player, pool: &mut BonusPool, offer: &BonusOffer) -> Result<(), SimError> {
    if let Some(bad) = offer.def.modifiers.iter().find(|m| !player.has_stat(m.stat)) {
        return Err(SimError::UnknownStat(format!("{:?}", bad.stat)));
    }

    for modifier in &offer.def.modifiers {
        let amount = modifier.amount(offer.tier);
        let life_fraction = player.life / player.max_life.max(1.0);
        player.apply_stat(modifier.stat, amount)?;

        for effect in &modifier.effects {
            match *effect {
                SideEffect::HealProportional => {
                    player.life = (life_fraction * player.max_life).min(player.max_life);
                }
                SideEffect::RestartShootTimer => {
                    player.shoot_timer = player.shoot_timer.min(player.effective_shoot_cooldown());
                }
                SideEffect::RestartAbilityTimer(kind) => {
                    if let Some(held) = player.ability_mut(kind) {
                        held.restart();
                    }
                }
            }
        }
    }

    if let BonusKind::Ability(kind) = offer.def.kind {
        player.abilities.push(HeldAbility::new(kind));
        // Base ability leaves the pool; its upgrades take its place
        pool.remove(&offer.def.name);
        pool.extend(offer.def.unlocks.iter().cloned());
    }

    Ok(())
}

fn attribute(name: &str, tiers: &[u32], modifiers: Vec<Modifier>) -> BonusDef {
    BonusDef {
        name: name.into(),
        kind: BonusKind::Attribute,
        weight: 5,
        modifiers,
        tier_weights: tiers.to_vec(),
        unlocks: Vec::new(),
    }
}

fn upgrade(name: &str, kind: AbilityKind, modifiers: Vec<Modifier>) -> BonusDef {
    BonusDef {
        name: name.into(),
        kind: BonusKind::Upgrade(kind),
        weight: 4,
        modifiers,
        tier_weights: vec![9, 6, 4],
        unlocks: Vec::new(),
    }
}

fn ability(kind: AbilityKind, unlocks: Vec<BonusDef>) -> BonusDef {
    BonusDef {
        name: kind.name().into(),
        kind: BonusKind::Ability(kind),
        weight: 2,
        modifiers: Vec::new(),
        tier_weights: Vec::new(),
        unlocks,
    }
}

/// Starting pool
pub fn bonus_catalog() -> Vec<BonusDef> {
    use AbilityKind::*;
    use StatKey::*;

    let four = [9, 6, 4, 2];
    let three = [9, 6, 4];

    vec![
        attribute(
            "Vitality",
            &four,
            vec![Modifier::new(MaxLife, &[10.0, 20.0, 30.0, 50.0]).with(SideEffect::HealProportional)],
        ),
        attribute("Power", &four, vec![Modifier::new(Damage, &[2.0, 4.0, 6.0, 10.0])]),
        attribute("Precision", &four, vec![Modifier::new(CritChance, &[3.0, 5.0, 8.0, 12.0])]),
        attribute("Brutality", &three, vec![Modifier::new(CritMultiplier, &[0.25, 0.5, 0.75])]),
        attribute(
            "Rapid Fire",
            &four,
            vec![Modifier::new(ShootCooldown, &[-1.0, -2.0, -3.0, -4.0]).with(SideEffect::RestartShootTimer)],
        ),
        attribute("Velocity", &three, vec![Modifier::new(BulletSpeed, &[1.0, 2.0, 3.0])]),
        attribute(
            "Agility",
            &three,
            vec![
                Modifier::new(MaxSpeed, &[0.5, 1.0, 1.5]),
                Modifier::new(Acceleration, &[0.05, 0.1, 0.15]),
            ],
        ),
        attribute("Wisdom", &three, vec![Modifier::new(XpMultiplier, &[0.1, 0.2, 0.3])]),
        attribute("Composure", &three, vec![Modifier::new(MaxHeat, &[10.0, 20.0, 30.0])]),
        ability(
            Kamehameha,
            vec![
                upgrade("Kamehameha Power", Kamehameha, vec![Modifier::new(AbilityDamage(Kamehameha), &[5.0, 10.0, 20.0])]),
                upgrade(
                    "Kamehameha Focus",
                    Kamehameha,
                    vec![
                        Modifier::new(AbilityCooldown(Kamehameha), &[-20.0, -40.0, -60.0])
                            .with(SideEffect::RestartAbilityTimer(Kamehameha)),
                    ],
                ),
            ],
        ),
        ability(
            SolarFlare,
            vec![
                upgrade("Solar Flare Reach", SolarFlare, vec![Modifier::new(AbilitySize(SolarFlare), &[15.0, 30.0, 45.0])]),
                upgrade(
                    "Solar Flare Charge",
                    SolarFlare,
                    vec![
                        Modifier::new(AbilityCooldown(SolarFlare), &[-30.0, -50.0, -80.0])
                            .with(SideEffect::RestartAbilityTimer(SolarFlare)),
                    ],
                ),
            ],
        ),
        ability(
            Slash,
            vec![
                upgrade("Slash Edge", Slash, vec![Modifier::new(AbilityDamage(Slash), &[4.0, 8.0, 12.0])]),
                upgrade("Slash Reach", Slash, vec![Modifier::new(AbilitySize(Slash), &[10.0, 20.0, 30.0])]),
            ],
        ),
        ability(
            Vortex,
            vec![
                upgrade("Vortex Size", Vortex, vec![Modifier::new(AbilitySize(Vortex), &[10.0, 20.0, 30.0])]),
                upgrade(
                    "Vortex Frequency",
                    Vortex,
                    vec![
                        Modifier::new(AbilityCooldown(Vortex), &[-40.0, -80.0, -120.0])
                            .with(SideEffect::RestartAbilityTimer(Vortex)),
                    ],
                ),
            ],
        ),
        ability(
            Turret,
            vec![
                upgrade("Turret Caliber", Turret, vec![Modifier::new(AbilityDamage(Turret), &[2.0, 4.0, 6.0])]),
                upgrade(
                    "Turret Deployment",
                    Turret,
                    vec![
                        Modifier::new(AbilityCooldown(Turret), &[-60.0, -100.0, -150.0])
                            .with(SideEffect::RestartAbilityTimer(Turret)),
                    ],
                ),
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::Tuning;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn player() -> Player {
        Player::new(1, &Tuning::default())
    }

    fn offer_named(pool: &BonusPool, name: &str, tier: Option<usize>) -> BonusOffer {
        BonusOffer {
            def: pool.defs.iter().find(|d| d.name == name).unwrap().clone(),
            tier,
        }
    }

    #[test]
    fn test_offers_are_unique_and_three() {
        let pool = BonusPool::default();
        let p = player();
        let mut rng = Pcg32::seed_from_u64(11);
        for _ in 0..200 {
            let offers = generate_offers(&pool, &p, &mut rng).unwrap();
            assert_eq!(offers.len(), OFFER_COUNT);
            let mut names: Vec<&str> = offers.iter().map(|o| o.name()).collect();
            names.sort();
            names.dedup();
            assert_eq!(names.len(), OFFER_COUNT);
        }
    }

    #[test]
    fn test_abilities_have_no_tier() {
        let pool = BonusPool::default();
        let p = player();
        let mut rng = Pcg32::seed_from_u64(3);
        for _ in 0..200 {
            for offer in generate_offers(&pool, &p, &mut rng).unwrap() {
                match offer.def.kind {
                    BonusKind::Ability(_) => assert_eq!(offer.tier, None),
                    _ => {
                        let tier = offer.tier.unwrap();
                        assert!(tier < offer.def.tier_weights.len());
                    }
                }
            }
        }
    }

    #[test]
    fn test_small_pool_offers_what_it_has() {
        let mut pool = BonusPool::default();
        pool.defs.truncate(2);
        let offers = generate_offers(&pool, &player(), &mut Pcg32::seed_from_u64(1)).unwrap();
        assert_eq!(offers.len(), 2);

        pool.defs.clear();
        let offers = generate_offers(&pool, &player(), &mut Pcg32::seed_from_u64(1)).unwrap();
        assert!(offers.is_empty());
    }

    #[test]
    fn test_tiered_amount_applied() {
        let mut pool = BonusPool::default();
        let mut p = player();
        let base = p.damage;
        let offer = offer_named(&pool, "Power", Some(2));
        apply_bonus(&mut p, &mut pool, &offer).unwrap();
        assert_eq!(p.damage, base + 6.0);
    }

    #[test]
    fn test_max_life_increase_heals_proportionally() {
        let mut pool = BonusPool::default();
        let mut p = player();
        p.life = 50.0;
        let offer = offer_named(&pool, "Vitality", Some(3));
        apply_bonus(&mut p, &mut pool, &offer).unwrap();
        assert_eq!(p.max_life, 150.0);
        assert_eq!(p.life, 75.0);
    }

    #[test]
    fn test_rapid_fire_restarts_shoot_timer() {
        let mut pool = BonusPool::default();
        let mut p = player();
        p.shoot_timer = p.shoot_cooldown;
        let offer = offer_named(&pool, "Rapid Fire", Some(3));
        apply_bonus(&mut p, &mut pool, &offer).unwrap();
        assert_eq!(p.shoot_cooldown, 11.0);
        assert_eq!(p.shoot_timer, 11.0);
    }

    #[test]
    fn test_ability_swaps_base_for_upgrades() {
        let mut pool = BonusPool::default();
        let mut p = player();
        let offer = offer_named(&pool, "Slash", None);
        let unlocks: Vec<String> = offer.def.unlocks.iter().map(|d| d.name.clone()).collect();

        apply_bonus(&mut p, &mut pool, &offer).unwrap();

        assert!(p.has_ability(AbilityKind::Slash));
        assert!(!pool.contains("Slash"));
        for name in &unlocks {
            assert!(pool.contains(name), "{name} should be unlocked");
        }

        let mut rng = Pcg32::seed_from_u64(9);
        for _ in 0..500 {
            for offer in generate_offers(&pool, &p, &mut rng).unwrap() {
                assert_ne!(offer.def.kind, BonusKind::Ability(AbilityKind::Slash));
            }
        }
    }

    #[test]
    fn test_owned_ability_never_reoffered_even_if_still_pooled() {
        let pool = BonusPool::default();
        let mut p = player();
        p.abilities.push(HeldAbility::new(AbilityKind::Vortex));
        let mut rng = Pcg32::seed_from_u64(21);
        for _ in 0..500 {
            for offer in generate_offers(&pool, &p, &mut rng).unwrap() {
                assert_ne!(offer.def.kind, BonusKind::Ability(AbilityKind::Vortex));
            }
        }
    }

    #[test]
    fn test_upgrade_for_unowned_ability_rejected_without_changes() {
        let mut pool = BonusPool::default();
        pool.extend(bonus_catalog().into_iter().flat_map(|d| d.unlocks));
        let mut p = player();
        let before = p.clone();
        let offer = offer_named(&pool, "Slash Edge", Some(0));
        let err = apply_bonus(&mut p, &mut pool, &offer).unwrap_err();
        assert!(matches!(err, SimError::UnknownStat(_)));
        assert_eq!(p.damage, before.damage);
        assert!(p.abilities.is_empty());
    }

    #[test]
    fn test_upgrades_hidden_until_ability_owned() {
        let mut pool = BonusPool::default();
        pool.extend(bonus_catalog().into_iter().flat_map(|d| d.unlocks));
        let p = player();
        let mut rng = Pcg32::seed_from_u64(2);
        for _ in 0..300 {
            for offer in generate_offers(&pool, &p, &mut rng).unwrap() {
                assert!(!matches!(offer.def.kind, BonusKind::Upgrade(_)));
            }
        }
    }

    #[test]
    fn test_modifier_amount_clamps_to_last_tier() {
        let m = Modifier::new(StatKey::Damage, &[1.0, 2.0]);
        assert_eq!(m.amount(None), 1.0);
        assert_eq!(m.amount(Some(5)), 2.0);
        assert_eq!(Rarity::from_tier(3), Rarity::Legendary);
    }
}
