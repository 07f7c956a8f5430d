//! Owned creatures and evolution rules.

use std::collections::HashMap;

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::api::CreatureRecord;

/// Identifies a creature species.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct SpeciesId(pub u16);

/// Identifies a creature family for candy accounting.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct FamilyId(pub u16);

/// Unique identifier of one owned creature instance.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct CreatureId(pub u64);

/// Three genetic stats of 0-15 each.
const QUALITY_DENOMINATOR: f64 = 45.0;

/// View over one creature entry of an inventory snapshot.
///
/// Only valid for the lifetime of the snapshot it was parsed from: two
/// snapshots may describe the same creature through different views, so all
/// decisions about an instance must be made within one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedCreature {
    pub id: CreatureId,
    pub species: SpeciesId,
    pub combat_power: u32,
    pub attack: u8,
    pub defense: u8,
    pub stamina: u8,
    pub favorite: bool,
    pub is_egg: bool,
}

impl CapturedCreature {
    pub fn from_record(record: &CreatureRecord) -> Self {
        Self {
            id: record.id,
            species: record.species,
            combat_power: record.combat_power,
            attack: record.attack,
            defense: record.defense,
            stamina: record.stamina,
            favorite: record.favorite,
            is_egg: record.is_egg,
        }
    }

    /// Sum of the three genetic stats, 0-45.
    pub fn stat_total(&self) -> u16 {
        self.attack as u16 + self.defense as u16 + self.stamina as u16
    }

    /// Genetic quality as a 0-100 percentage.
    pub fn quality(&self) -> f64 {
        f64::from(self.stat_total()) / QUALITY_DENOMINATOR * 100.0
    }

    /// Ranking key: combat power first, genetic stats as tie-break.
    pub fn rank_key(&self) -> (u32, u16) {
        (self.combat_power, self.stat_total())
    }
}

/// One evolution rule: the candy cost and the family whose candy pays it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvolutionRule {
    pub candy_cost: u32,
    pub family: FamilyId,
}

/// Species-to-evolution-rule lookup.
///
/// Static configuration data sourced externally; the core only reads it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvolutionTable {
    rules: HashMap<SpeciesId, EvolutionRule>,
}

impl EvolutionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(species, candy cost, family)` entries.
    pub fn from_entries(entries: &[(u16, u32, u16)]) -> Self {
        let mut table = Self::new();
        for &(species, candy_cost, family) in entries {
            table.insert(
                SpeciesId(species),
                EvolutionRule {
                    candy_cost,
                    family: FamilyId(family),
                },
            );
        }
        table
    }

    pub fn insert(&mut self, species: SpeciesId, rule: EvolutionRule) {
        self.rules.insert(species, rule);
    }

    pub fn get(&self, species: SpeciesId) -> Option<&EvolutionRule> {
        self.rules.get(&species)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Flat form used on the wire and in config files. JSON maps need string
/// keys, so the table serializes as a list of entries.
#[derive(Serialize, Deserialize)]
struct EvolutionEntry {
    species: u16,
    candy_cost: u32,
    family: u16,
}

impl Serialize for EvolutionTable {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut entries: Vec<EvolutionEntry> = self
            .rules
            .iter()
            .map(|(species, rule)| EvolutionEntry {
                species: species.0,
                candy_cost: rule.candy_cost,
                family: rule.family.0,
            })
            .collect();
        entries.sort_by_key(|e| e.species);
        entries.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for EvolutionTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let entries = Vec::<EvolutionEntry>::deserialize(deserializer)?;
        let mut table = EvolutionTable::new();
        for entry in entries {
            table.insert(
                SpeciesId(entry.species),
                EvolutionRule {
                    candy_cost: entry.candy_cost,
                    family: FamilyId(entry.family),
                },
            );
        }
        Ok(table)
    }
}
