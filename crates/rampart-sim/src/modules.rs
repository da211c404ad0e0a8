//! Custom tower composition from a multiset of modules.
//!
//! Everything here is a pure function of the module multiset: the input is
//! sorted into canonical order before any arithmetic, so selection order
//! never changes stats, name or cost.

use std::collections::{BTreeMap, BTreeSet};

use rampart_core::components::{Payload, TowerStats};
use rampart_core::constants::*;
use rampart_core::enums::{ModuleKind, SecondaryEffect};
use rampart_core::error::Rejection;
use rampart_core::profiles::{module_name, module_profile};

/// Chain range granted by arc modules.
const ARC_CHAIN_RANGE: f64 = 1.6;
/// Slow applied per cryo module, and its ceiling.
const CRYO_SLOW_PER_MODULE: f64 = 0.15;
const CRYO_SLOW_CAP: f64 = 0.6;

/// Result of composing a module multiset.
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    /// Modules in canonical order.
    pub modules: Vec<ModuleKind>,
    pub stats: TowerStats,
    pub effects: BTreeSet<SecondaryEffect>,
    pub cost: u32,
    pub name: String,
}

/// Compose a custom tower from 2 to 5 modules.
pub fn compose(modules: &[ModuleKind]) -> Result<Composition, Rejection> {
    if !(MIN_MODULES..=MAX_MODULES).contains(&modules.len()) {
        return Err(Rejection::InvalidModuleCount(modules.len()));
    }
    let mut sorted = modules.to_vec();
    sorted.sort();

    let mut counts: BTreeMap<ModuleKind, u32> = BTreeMap::new();
    for &module in &sorted {
        *counts.entry(module).or_default() += 1;
    }

    let mut damage = CUSTOM_BASE_DAMAGE;
    let mut range = CUSTOM_BASE_RANGE;
    let mut rate = CUSTOM_BASE_RATE;
    let mut module_cost = 0u32;
    for &module in &sorted {
        let profile = module_profile(module);
        damage *= profile.damage_mult;
        range += profile.range_delta;
        rate += profile.rate_delta;
        module_cost += profile.cost;
    }
    let range = range.max(1.0);
    let rate = rate.max(MIN_TOWER_COOLDOWN);

    let payload = payload_for(&counts);
    let effects = effects_of(&payload);

    let duplicate_premium: f64 = counts
        .values()
        .filter(|&&c| c > 1)
        .map(|&c| (c * c) as f64 * CUSTOM_DUPLICATE_PREMIUM)
        .sum();
    let synergy_premium = (CUSTOM_SYNERGY_PREMIUM
        * (effects.len() as u32 + payload.chain_count + payload.pierce) as f64)
        .round();
    let tier = if sorted.len() >= 3 {
        1.0 + (sorted.len() - 2) as f64 * CUSTOM_TIER_STEP
    } else {
        1.0
    };
    let cost = ((CUSTOM_BASE_COST + module_cost as f64 + duplicate_premium + synergy_premium)
        * tier)
        .round() as u32;

    let ranked = ranked_kinds(&counts);
    let dominant = ranked.first().copied().unwrap_or_default();
    let name = build_name(&ranked, sorted.len());

    Ok(Composition {
        stats: TowerStats {
            damage,
            range,
            rate,
            projectile: module_profile(dominant).projectile,
            payload,
        },
        modules: sorted,
        effects,
        cost,
        name,
    })
}

fn payload_for(counts: &BTreeMap<ModuleKind, u32>) -> Payload {
    let count = |kind: ModuleKind| counts.get(&kind).copied().unwrap_or(0);
    let mut payload = Payload::default();

    // Count thresholds.
    let kinetic = count(ModuleKind::Kinetic);
    if kinetic >= 2 {
        payload.pierce = kinetic - 1;
    }
    let cryo = count(ModuleKind::Cryo);
    if cryo >= 2 {
        payload.freeze_chance = 0.12 + 0.06 * (cryo - 2) as f64;
    }
    if cryo > 0 {
        payload.slow = (CRYO_SLOW_PER_MODULE * cryo as f64).min(CRYO_SLOW_CAP);
    }
    let arc = count(ModuleKind::Arc);
    if arc >= 2 {
        payload.chain_count = arc - 1;
    }
    let explosive = count(ModuleKind::Explosive);
    if explosive >= 2 {
        payload.aoe_radius = 1.0 + 0.25 * (explosive - 2) as f64;
    }
    if count(ModuleKind::Beam) >= 2 {
        payload.pulse = true;
    }

    // Pair signatures over the distinct kinds present.
    let kinds: Vec<ModuleKind> = counts.keys().copied().collect();
    for (i, &a) in kinds.iter().enumerate() {
        for &b in &kinds[i + 1..] {
            match (a, b) {
                (ModuleKind::Kinetic, ModuleKind::Cryo) => payload.shatter = true,
                (ModuleKind::Kinetic, ModuleKind::Explosive) => payload.pierce += 1,
                (ModuleKind::Cryo, ModuleKind::Arc) => payload.chain_count += 1,
                (ModuleKind::Cryo, ModuleKind::Beam) => payload.freeze_chance += 0.08,
                (ModuleKind::Arc, ModuleKind::Explosive) => {
                    payload.aoe_radius = payload.aoe_radius.max(0.8)
                }
                (ModuleKind::Arc, ModuleKind::Beam) => payload.shock = true,
                _ => {}
            }
        }
    }

    if payload.chain_count > 0 {
        payload.chain_range = ARC_CHAIN_RANGE;
    }
    payload
}

fn effects_of(payload: &Payload) -> BTreeSet<SecondaryEffect> {
    let mut effects = BTreeSet::new();
    if payload.freeze_chance > 0.0 {
        effects.insert(SecondaryEffect::FreezeChance);
    }
    if payload.chain_count > 0 {
        effects.insert(SecondaryEffect::Chain);
    }
    if payload.aoe_radius > 0.0 {
        effects.insert(SecondaryEffect::Aoe);
    }
    if payload.pierce > 0 {
        effects.insert(SecondaryEffect::Pierce);
    }
    if payload.shock {
        effects.insert(SecondaryEffect::Shock);
    }
    if payload.shatter {
        effects.insert(SecondaryEffect::Shatter);
    }
    if payload.pulse {
        effects.insert(SecondaryEffect::Pulse);
    }
    effects
}

/// Distinct kinds, most numerous first, ties in canonical order.
fn ranked_kinds(counts: &BTreeMap<ModuleKind, u32>) -> Vec<ModuleKind> {
    let mut ranked: Vec<(ModuleKind, u32)> = counts.iter().map(|(&k, &c)| (k, c)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.into_iter().map(|(kind, _)| kind).collect()
}

fn build_name(ranked: &[ModuleKind], module_count: usize) -> String {
    let stem = ranked
        .iter()
        .take(2)
        .map(|&kind| module_name(kind))
        .collect::<Vec<_>>()
        .join("-");
    let suffix = match module_count {
        2 => "Duo",
        3 => "Trio",
        4 => "Quad",
        _ => "Penta",
    };
    format!("{stem} {suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ModuleKind::*;

    #[test]
    fn rejects_bad_module_counts() {
        assert_eq!(compose(&[Kinetic]), Err(Rejection::InvalidModuleCount(1)));
        assert_eq!(
            compose(&[Kinetic; 6]),
            Err(Rejection::InvalidModuleCount(6))
        );
    }

    #[test]
    fn double_kinetic() {
        let c = compose(&[Kinetic, Kinetic]).unwrap();
        assert_eq!(c.cost, 132);
        assert_eq!(c.name, "Kinetic Duo");
        assert_eq!(c.stats.payload.pierce, 1);
        assert!((c.stats.range - 6.0).abs() < 1e-9);
        assert!((c.stats.rate - 0.6).abs() < 1e-9);
        assert!((c.stats.damage - 12.0 * 1.15 * 1.15).abs() < 1e-9);
    }

    #[test]
    fn mixed_trio_gains_pair_effects() {
        let c = compose(&[Arc, Kinetic, Cryo]).unwrap();
        assert_eq!(c.cost, 160);
        assert_eq!(c.name, "Kinetic-Cryo Trio");
        assert!(c.stats.payload.shatter);
        assert_eq!(c.stats.payload.chain_count, 1);
        assert_eq!(c.stats.payload.chain_range, ARC_CHAIN_RANGE);
        assert!((c.stats.payload.slow - 0.15).abs() < 1e-9);
        assert_eq!(
            c.effects,
            BTreeSet::from([SecondaryEffect::Chain, SecondaryEffect::Shatter])
        );
        assert_eq!(c.modules, vec![Kinetic, Cryo, Arc]);
    }

    #[test]
    fn dominant_module_picks_projectile() {
        let c = compose(&[Beam, Explosive, Explosive]).unwrap();
        assert_eq!(c.name, "Blast-Beam Trio");
        assert_eq!(c.stats.projectile, module_profile(Explosive).projectile);
        assert_eq!(c.stats.payload.aoe_radius, 1.0);
    }

    #[test]
    fn selection_order_is_irrelevant() {
        let a = compose(&[Beam, Arc, Cryo, Beam, Kinetic]).unwrap();
        let b = compose(&[Kinetic, Beam, Beam, Cryo, Arc]).unwrap();
        assert_eq!(a, b);
        assert!(a.stats.payload.pulse && a.stats.payload.shock);
    }
}
