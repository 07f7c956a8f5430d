//! Deterministic offline transport.
//!
//! Stands in for the remote service so the whole loop can be exercised end
//! to end without the proprietary wire protocol: a seeded world of
//! landmarks and spawns around the start position, plus a server-side
//! inventory that honors every action. Same seed, same world.

use std::collections::HashMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use rover_core::api::{
    ActionRequest, ActionResponse, BatchResponse, CandyRecord, CaptureProbabilities,
    CreatureRecord, Currency, EncounterStart, EncounterStatus, EvolveResult, IncubatorRecord,
    InventorySnapshot, ItemRecord, LandmarkSearchResult, MapView, PlayerStatus, RecycleResult,
    SearchStatus, SimpleResult, ThrowResult, ThrowStatus, Transport, TransportError, WildCreature,
};
use rover_core::creature::{CreatureId, FamilyId, SpeciesId};
use rover_core::geo::Coord;
use rover_core::inventory::CaptureDevice;
use rover_core::landmark::{Landmark, LureInfo};
use rover_core::LANDMARK_INTERACT_RANGE_M;

/// Meters per degree of latitude, near enough everywhere.
const M_PER_DEG_LAT: f64 = 111_320.0;

/// Creature bag size; encounters report a full bag beyond this.
const BAG_CAPACITY: usize = 50;

/// Item bag size; landmarks stop handing out items beyond this.
const ITEM_CAPACITY: u32 = 350;

/// How many landmarks the seeded world contains.
const WORLD_LANDMARKS: usize = 10;

pub struct SimTransport {
    rng: ChaCha8Rng,
    logged_in: bool,
    username: String,
    /// Seeded lazily around the first position the bot submits from.
    landmarks: Option<Vec<Landmark>>,
    items: HashMap<u16, u32>,
    creatures: Vec<CreatureRecord>,
    candies: HashMap<u16, u32>,
    dust: i64,
    next_creature_id: u64,
    next_encounter_id: u64,
    /// Encounter id → species, for spawns the bot may engage.
    active: HashMap<u64, SpeciesId>,
}

impl SimTransport {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            logged_in: false,
            username: String::new(),
            landmarks: None,
            items: HashMap::from([
                (1, 30),
                (2, 10),
                (3, 5),
                (101, 12),
                (201, 3),
                (701, 8),
            ]),
            creatures: Vec::new(),
            candies: HashMap::new(),
            dust: 500,
            next_creature_id: 1,
            next_encounter_id: 1,
            active: HashMap::new(),
        }
    }

    /// The simulated login handshake; always succeeds.
    pub fn login(&mut self, username: &str) -> Result<(), TransportError> {
        self.username = username.to_string();
        self.logged_in = true;
        Ok(())
    }

    fn offset(&mut self, around: &Coord, max_m: f64) -> Coord {
        let dist = self.rng.gen_range(0.0..max_m);
        let bearing = self.rng.gen_range(0.0..std::f64::consts::TAU);
        let dlat = dist * bearing.cos() / M_PER_DEG_LAT;
        let dlng = dist * bearing.sin() / (M_PER_DEG_LAT * around.lat.to_radians().cos());
        Coord::new(around.lat + dlat, around.lng + dlng)
    }

    fn ensure_world(&mut self, around: &Coord) {
        if self.landmarks.is_some() {
            return;
        }
        let mut landmarks = Vec::with_capacity(WORLD_LANDMARKS);
        for n in 0..WORLD_LANDMARKS {
            let position = self.offset(around, 1_200.0);
            let lure = if self.rng.gen_ratio(1, 4) {
                let encounter_id = self.next_encounter_id;
                self.next_encounter_id += 1;
                let species = SpeciesId(self.rng.gen_range(1..=40));
                self.active.insert(encounter_id, species);
                Some(LureInfo {
                    encounter_id,
                    active_species: species,
                })
            } else {
                None
            };
            landmarks.push(Landmark {
                id: format!("waypost-{n}"),
                position,
                lure,
            });
        }
        debug!(count = landmarks.len(), "seeded world landmarks");
        self.landmarks = Some(landmarks);
    }

    fn snapshot(&self) -> InventorySnapshot {
        let mut items: Vec<ItemRecord> = self
            .items
            .iter()
            .map(|(&item_id, &count)| ItemRecord { item_id, count })
            .collect();
        items.sort_by_key(|r| r.item_id);
        let mut candies: Vec<CandyRecord> = self
            .candies
            .iter()
            .map(|(&family, &count)| CandyRecord {
                family: FamilyId(family),
                count,
            })
            .collect();
        candies.sort_by_key(|r| r.family);
        InventorySnapshot {
            items,
            creatures: self.creatures.clone(),
            candies,
            incubators: vec![IncubatorRecord {
                incubator_id: "incubator-0".into(),
                egg: None,
                target_km: 5.0,
            }],
        }
    }

    fn spawn_creatures(&mut self, position: &Coord) -> Vec<WildCreature> {
        let count = self.rng.gen_range(0..=2);
        (0..count)
            .map(|n| {
                let encounter_id = self.next_encounter_id;
                self.next_encounter_id += 1;
                let species = SpeciesId(self.rng.gen_range(1..=40));
                self.active.insert(encounter_id, species);
                let spawn_position = self.offset(position, 80.0);
                WildCreature {
                    encounter_id,
                    spawn_point_id: format!("spawn-{encounter_id}-{n}"),
                    species,
                    position: spawn_position,
                }
            })
            .collect()
    }

    fn grant_capture(&mut self, encounter_id: u64) {
        let species = self
            .active
            .remove(&encounter_id)
            .unwrap_or(SpeciesId(self.rng.gen_range(1..=40)));
        let record = CreatureRecord {
            id: CreatureId(self.next_creature_id),
            species,
            combat_power: self.rng.gen_range(10..600),
            attack: self.rng.gen_range(0..=15),
            defense: self.rng.gen_range(0..=15),
            stamina: self.rng.gen_range(0..=15),
            favorite: false,
            is_egg: false,
        };
        self.next_creature_id += 1;
        self.creatures.push(record);
        *self.candies.entry(species.0).or_insert(0) += 3;
        self.dust += 100;
    }

    fn handle(&mut self, position: &Coord, request: &ActionRequest) -> ActionResponse {
        match request {
            ActionRequest::GetPlayer => ActionResponse::Player(PlayerStatus {
                username: self.username.clone(),
                currencies: vec![Currency {
                    name: "DUST".into(),
                    amount: self.dust,
                }],
            }),
            ActionRequest::GetInventory => ActionResponse::Inventory(self.snapshot()),
            ActionRequest::GetMapObjects => {
                self.ensure_world(position);
                let catchable = self.spawn_creatures(position);
                ActionResponse::MapObjects(MapView {
                    landmarks: self.landmarks.clone().unwrap_or_default(),
                    catchable,
                })
            }
            ActionRequest::SearchLandmark { landmark_id, .. } => {
                let landmark = self
                    .landmarks
                    .as_ref()
                    .and_then(|all| all.iter().find(|lm| lm.id == *landmark_id))
                    .cloned();
                let status = match landmark {
                    None => SearchStatus::Other(0),
                    Some(lm) if position.distance_m(&lm.position) > LANDMARK_INTERACT_RANGE_M => {
                        SearchStatus::OutOfRange
                    }
                    Some(_) if self.items.values().sum::<u32>() >= ITEM_CAPACITY => {
                        SearchStatus::InventoryFull
                    }
                    Some(_) => SearchStatus::Success,
                };
                let awarded_items = if status == SearchStatus::Success {
                    let device_count = self.rng.gen_range(2..=4);
                    *self.items.entry(1).or_insert(0) += device_count;
                    vec![ItemRecord {
                        item_id: 1,
                        count: device_count,
                    }]
                } else {
                    Vec::new()
                };
                ActionResponse::LandmarkSearch(LandmarkSearchResult {
                    status,
                    awarded_items,
                    experience: if status == SearchStatus::Success { 50 } else { 0 },
                })
            }
            ActionRequest::StartEncounter { .. } | ActionRequest::StartLureEncounter { .. } => {
                let status = if self.creatures.len() >= BAG_CAPACITY {
                    EncounterStatus::BagFull
                } else {
                    EncounterStatus::Ready
                };
                let basic = self.rng.gen_range(0.15..0.55);
                ActionResponse::EncounterStart(EncounterStart {
                    status,
                    probabilities: CaptureProbabilities {
                        basic,
                        good: (basic + 0.15).min(0.95),
                        ultra: (basic + 0.30).min(0.95),
                    },
                })
            }
            ActionRequest::ThrowCapture {
                encounter_id,
                device,
                ..
            } => {
                let hold_chance = match device {
                    CaptureDevice::Basic => 0.35,
                    CaptureDevice::Good => 0.55,
                    CaptureDevice::Ultra => 0.75,
                    CaptureDevice::Premier => 1.0,
                };
                let status = if self.rng.gen_bool(hold_chance) {
                    self.grant_capture(*encounter_id);
                    ThrowStatus::Captured
                } else if self.rng.gen_ratio(1, 6) {
                    self.active.remove(encounter_id);
                    ThrowStatus::Fled
                } else {
                    ThrowStatus::Escaped
                };
                ActionResponse::Throw(ThrowResult { status })
            }
            ActionRequest::ReleaseCreature { creature_id } => {
                let before = self.creatures.len();
                let mut family = None;
                self.creatures.retain(|c| {
                    if c.id == *creature_id {
                        family = Some(c.species.0);
                        false
                    } else {
                        true
                    }
                });
                if let Some(family) = family {
                    *self.candies.entry(family).or_insert(0) += 1;
                }
                ActionResponse::Release(SimpleResult {
                    success: self.creatures.len() < before,
                    code: 1,
                })
            }
            ActionRequest::EvolveCreature { creature_id } => {
                let Some(index) = self.creatures.iter().position(|c| c.id == *creature_id) else {
                    return ActionResponse::Evolve(EvolveResult {
                        success: false,
                        evolved: None,
                    });
                };
                let species = self.creatures[index].species.0;
                let Some(&(_, cost, family)) = rover_data::DEFAULT_EVOLUTIONS
                    .iter()
                    .find(|(s, _, _)| *s == species)
                else {
                    return ActionResponse::Evolve(EvolveResult {
                        success: false,
                        evolved: None,
                    });
                };
                if self.candies.get(&family).copied().unwrap_or(0) <= cost {
                    return ActionResponse::Evolve(EvolveResult {
                        success: false,
                        evolved: None,
                    });
                }
                *self.candies.entry(family).or_insert(0) -= cost;
                let mut evolved = self.creatures[index].clone();
                evolved.id = CreatureId(self.next_creature_id);
                self.next_creature_id += 1;
                evolved.species = SpeciesId(species + 1);
                evolved.combat_power = evolved.combat_power * 2;
                self.creatures[index] = evolved.clone();
                ActionResponse::Evolve(EvolveResult {
                    success: true,
                    evolved: Some(evolved),
                })
            }
            ActionRequest::RecycleItem { item_id, count } => {
                let entry = self.items.entry(*item_id).or_insert(0);
                *entry = entry.saturating_sub(*count);
                ActionResponse::Recycle(RecycleResult {
                    success: true,
                    new_count: *entry,
                })
            }
        }
    }
}

impl Transport for SimTransport {
    fn submit(
        &mut self,
        position: &Coord,
        batch: &[ActionRequest],
    ) -> Result<BatchResponse, TransportError> {
        if !self.logged_in {
            return Err(TransportError::SessionExpired);
        }
        // Occasional transient outage, to keep callers honest.
        if self.rng.gen_ratio(1, 40) {
            return Err(TransportError::ServerBusy("simulated outage".into()));
        }
        Ok(batch
            .iter()
            .map(|request| (request.kind(), self.handle(position, request)))
            .collect())
    }

    fn is_logged_in(&self) -> bool {
        self.logged_in
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rover_core::bot::{Bot, SpeciesNames};
    use rover_core::config::{BotConfig, PacingConfig};
    use rover_core::creature::EvolutionTable;
    use rover_core::geo::DirectRouter;

    fn species_names() -> SpeciesNames {
        rover_data::SPECIES_NAMES
            .iter()
            .map(|&(id, name)| (SpeciesId(id), name.to_string()))
            .collect()
    }

    #[test]
    fn test_same_seed_same_world() {
        let origin = Coord::new(48.8584, 2.2945);
        let mut a = SimTransport::new(11);
        let mut b = SimTransport::new(11);
        a.ensure_world(&origin);
        b.ensure_world(&origin);
        assert_eq!(a.landmarks, b.landmarks);
    }

    #[test]
    fn test_throw_captured_grows_the_bag() {
        let mut sim = SimTransport::new(3);
        sim.login("tester").unwrap();
        // Premier always holds.
        let response = sim.handle(
            &Coord::new(0.0, 0.0),
            &ActionRequest::ThrowCapture {
                encounter_id: 999,
                spawn_point_id: "sp".into(),
                device: CaptureDevice::Premier,
            },
        );
        let ActionResponse::Throw(result) = response else {
            panic!("wrong response kind");
        };
        assert_eq!(result.status, ThrowStatus::Captured);
        assert_eq!(sim.creatures.len(), 1);
    }

    #[test]
    fn test_full_run_against_simulator() {
        let mut transport = SimTransport::new(7);
        transport.login("tester").unwrap();

        let mut config = BotConfig::default();
        config.pacing = PacingConfig::zero();
        config.max_cycles = Some(2);
        config.evolutions = EvolutionTable::from_entries(rover_data::DEFAULT_EVOLUTIONS);
        config.triage.quality_floor = 80.0;
        config.triage.power_floor = 300;

        let mut bot = Bot::new(
            transport,
            DirectRouter,
            config,
            species_names(),
            Coord::new(48.8584, 2.2945),
        );
        bot.run().unwrap();
    }
}
