//! Keep/evolve/release classification over one snapshot's creatures.
//!
//! Groups are ranked strongest-first; everything past the minimum-keep
//! cutoff is a candidate for release and, independently, for evolution.
//! The control loop decides ordering between the two passes.

use std::collections::HashMap;

use crate::config::TriageConfig;
use crate::creature::{CapturedCreature, EvolutionTable, SpeciesId};
use crate::inventory::ResourceLedger;

/// One species' creatures, ranked strongest-first.
#[derive(Debug, Clone)]
pub struct SpeciesGroup {
    pub species: SpeciesId,
    /// Sorted descending by (combat power, genetic stats).
    pub ranked: Vec<CapturedCreature>,
}

impl SpeciesGroup {
    /// Members past the minimum-keep cutoff, strongest first.
    pub fn surplus(&self, min_keep: usize) -> &[CapturedCreature] {
        &self.ranked[min_keep.min(self.ranked.len())..]
    }
}

/// Group non-egg creatures by species and rank each group.
///
/// Groups come back ordered by species id so passes over them are
/// deterministic.
pub fn ranked_groups(creatures: &[CapturedCreature]) -> Vec<SpeciesGroup> {
    let mut by_species: HashMap<SpeciesId, Vec<CapturedCreature>> = HashMap::new();
    for creature in creatures {
        if creature.is_egg {
            continue;
        }
        by_species
            .entry(creature.species)
            .or_default()
            .push(creature.clone());
    }

    let mut groups: Vec<SpeciesGroup> = by_species
        .into_iter()
        .map(|(species, mut ranked)| {
            ranked.sort_by(|a, b| b.rank_key().cmp(&a.rank_key()));
            SpeciesGroup { species, ranked }
        })
        .collect();
    groups.sort_by_key(|g| g.species);
    groups
}

/// Whether a surplus creature should be offered for release.
///
/// Favorites and keep-listed species are never released. Otherwise a
/// creature goes if its species is on the always-release list, or if it is
/// weak on both axes: quality under the quality floor AND power under the
/// power floor.
pub fn is_release_candidate(creature: &CapturedCreature, config: &TriageConfig) -> bool {
    if creature.favorite || config.keep_species.contains(&creature.species) {
        return false;
    }
    if config.always_release_species.contains(&creature.species) {
        return true;
    }
    creature.quality() < config.quality_floor && creature.combat_power < config.power_floor
}

/// Whether a surplus creature can be evolved right now.
///
/// The candy balance must STRICTLY exceed the rule's cost; an exact balance
/// is not enough.
pub fn is_evolve_candidate(
    creature: &CapturedCreature,
    config: &TriageConfig,
    evolutions: &EvolutionTable,
    ledger: &ResourceLedger,
) -> bool {
    if creature.favorite || config.keep_species.contains(&creature.species) {
        return false;
    }
    let Some(rule) = evolutions.get(creature.species) else {
        return false;
    };
    ledger.candy_count(rule.family) > rule.candy_cost
}
