//! Raw inventory snapshots as returned by the remote service.

use serde::{Deserialize, Serialize};

use crate::creature::{CreatureId, FamilyId, SpeciesId};

/// Wholesale snapshot of the player's inventory.
///
/// Produced fresh by every inventory refresh and replaces the previous one
/// outright; snapshots are never merged incrementally, so local state can
/// not drift from server truth between refreshes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    pub items: Vec<ItemRecord>,
    pub creatures: Vec<CreatureRecord>,
    pub candies: Vec<CandyRecord>,
    pub incubators: Vec<IncubatorRecord>,
}

impl InventorySnapshot {
    /// Number of non-egg creatures in the bag.
    pub fn creature_count(&self) -> usize {
        self.creatures.iter().filter(|c| !c.is_egg).count()
    }

    /// Number of eggs waiting to hatch.
    pub fn egg_count(&self) -> usize {
        self.creatures.iter().filter(|c| c.is_egg).count()
    }
}

/// A counted stack of one item type, identified by its raw numeric id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub item_id: u16,
    pub count: u32,
}

/// One owned creature, eggs included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatureRecord {
    pub id: CreatureId,
    pub species: SpeciesId,
    pub combat_power: u32,
    pub attack: u8,
    pub defense: u8,
    pub stamina: u8,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default)]
    pub is_egg: bool,
}

/// Candy balance for one creature family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandyRecord {
    pub family: FamilyId,
    pub count: u32,
}

/// An incubator and the egg loaded into it, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncubatorRecord {
    pub incubator_id: String,
    pub egg: Option<CreatureId>,
    pub target_km: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creature_and_egg_counts() {
        let snapshot = InventorySnapshot {
            creatures: vec![
                CreatureRecord {
                    id: CreatureId(1),
                    species: SpeciesId(4),
                    combat_power: 10,
                    attack: 1,
                    defense: 1,
                    stamina: 1,
                    favorite: false,
                    is_egg: false,
                },
                CreatureRecord {
                    id: CreatureId(2),
                    species: SpeciesId(0),
                    combat_power: 0,
                    attack: 0,
                    defense: 0,
                    stamina: 0,
                    favorite: false,
                    is_egg: true,
                },
            ],
            ..Default::default()
        };
        assert_eq!(snapshot.creature_count(), 1);
        assert_eq!(snapshot.egg_count(), 1);
    }
}
