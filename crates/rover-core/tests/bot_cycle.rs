//! Full-cycle tests of the control loop against a scripted transport.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use rover_core::api::{
    ActionKind, ActionRequest, ActionResponse, BatchResponse, CandyRecord, CaptureProbabilities,
    CreatureRecord, Currency, EncounterStart, EncounterStatus, InventorySnapshot, ItemRecord,
    LandmarkSearchResult, MapView, PlayerStatus, SearchStatus, ThrowResult, ThrowStatus,
    Transport, TransportError, WildCreature,
};
use rover_core::bot::{Bot, SpeciesNames};
use rover_core::config::{BotConfig, PacingConfig};
use rover_core::creature::{CreatureId, FamilyId, SpeciesId};
use rover_core::error::BotError;
use rover_core::geo::{Coord, DirectRouter};
use rover_core::landmark::Landmark;

/// Calls are recorded in submission order; shared so tests can assert after
/// the bot has consumed the transport.
type CallLog = Rc<RefCell<Vec<ActionKind>>>;

struct Scripted {
    calls: CallLog,
    /// `None` simulates a heartbeat response missing its player block.
    player: Option<PlayerStatus>,
    /// Popped per GetInventory; the last entry repeats.
    inventories: VecDeque<InventorySnapshot>,
    /// Popped per GetMapObjects; the last entry repeats.
    map_views: VecDeque<MapView>,
    encounter_status: EncounterStatus,
    throw_status: ThrowStatus,
    /// Fail this many leading submissions with ServerBusy.
    busy_submissions: u32,
}

impl Scripted {
    fn new(calls: CallLog) -> Self {
        Self {
            calls,
            player: Some(PlayerStatus {
                username: "scripted".into(),
                currencies: vec![Currency {
                    name: "DUST".into(),
                    amount: 100,
                }],
            }),
            inventories: VecDeque::new(),
            map_views: VecDeque::new(),
            encounter_status: EncounterStatus::Ready,
            throw_status: ThrowStatus::Captured,
            busy_submissions: 0,
        }
    }

    fn next_inventory(&mut self) -> InventorySnapshot {
        if self.inventories.len() > 1 {
            self.inventories.pop_front().unwrap()
        } else {
            self.inventories.front().cloned().unwrap_or_default()
        }
    }

    fn next_map_view(&mut self) -> MapView {
        if self.map_views.len() > 1 {
            self.map_views.pop_front().unwrap()
        } else {
            self.map_views.front().cloned().unwrap_or_default()
        }
    }
}

impl Transport for Scripted {
    fn submit(
        &mut self,
        _position: &Coord,
        batch: &[ActionRequest],
    ) -> Result<BatchResponse, TransportError> {
        if self.busy_submissions > 0 {
            self.busy_submissions -= 1;
            return Err(TransportError::ServerBusy("scripted outage".into()));
        }
        let mut responses = BatchResponse::new();
        for request in batch {
            self.calls.borrow_mut().push(request.kind());
            match request {
                ActionRequest::GetPlayer => {
                    if let Some(player) = &self.player {
                        responses
                            .insert(ActionKind::GetPlayer, ActionResponse::Player(player.clone()));
                    }
                }
                ActionRequest::GetInventory => {
                    let snapshot = self.next_inventory();
                    responses
                        .insert(ActionKind::GetInventory, ActionResponse::Inventory(snapshot));
                }
                ActionRequest::GetMapObjects => {
                    let view = self.next_map_view();
                    responses.insert(ActionKind::GetMapObjects, ActionResponse::MapObjects(view));
                }
                ActionRequest::SearchLandmark { .. } => {
                    responses.insert(
                        ActionKind::SearchLandmark,
                        ActionResponse::LandmarkSearch(LandmarkSearchResult {
                            status: SearchStatus::Success,
                            awarded_items: vec![ItemRecord {
                                item_id: 1,
                                count: 3,
                            }],
                            experience: 50,
                        }),
                    );
                }
                ActionRequest::StartEncounter { .. } | ActionRequest::StartLureEncounter { .. } => {
                    responses.insert(
                        request.kind(),
                        ActionResponse::EncounterStart(EncounterStart {
                            status: self.encounter_status,
                            probabilities: CaptureProbabilities {
                                basic: 0.5,
                                good: 0.6,
                                ultra: 0.7,
                            },
                        }),
                    );
                }
                ActionRequest::ThrowCapture { .. } => {
                    responses.insert(
                        ActionKind::ThrowCapture,
                        ActionResponse::Throw(ThrowResult {
                            status: self.throw_status,
                        }),
                    );
                }
                ActionRequest::ReleaseCreature { .. } => {
                    responses.insert(
                        ActionKind::ReleaseCreature,
                        ActionResponse::Release(rover_core::api::SimpleResult {
                            success: true,
                            code: 1,
                        }),
                    );
                }
                ActionRequest::EvolveCreature { .. } => {
                    responses.insert(
                        ActionKind::EvolveCreature,
                        ActionResponse::Evolve(rover_core::api::EvolveResult {
                            success: true,
                            evolved: None,
                        }),
                    );
                }
                ActionRequest::RecycleItem { .. } => {
                    responses.insert(
                        ActionKind::RecycleItem,
                        ActionResponse::Recycle(rover_core::api::RecycleResult {
                            success: true,
                            new_count: 0,
                        }),
                    );
                }
            }
        }
        Ok(responses)
    }

    fn is_logged_in(&self) -> bool {
        true
    }
}

fn quiet_config() -> BotConfig {
    BotConfig {
        max_cycles: Some(1),
        pacing: PacingConfig::zero(),
        ..Default::default()
    }
}

fn devices_snapshot(basic: u32) -> InventorySnapshot {
    InventorySnapshot {
        items: vec![ItemRecord {
            item_id: 1,
            count: basic,
        }],
        ..Default::default()
    }
}

fn make_creature(id: u64, species: u16, power: u32, stat: u8) -> CreatureRecord {
    CreatureRecord {
        id: CreatureId(id),
        species: SpeciesId(species),
        combat_power: power,
        attack: stat,
        defense: stat,
        stamina: stat,
        favorite: false,
        is_egg: false,
    }
}

/// Start position and a landmark about 150 m north of it.
fn start_and_landmark() -> (Coord, Landmark) {
    let start = Coord::new(48.8584, 2.2945);
    let landmark = Landmark {
        id: "waypost-1".into(),
        position: Coord::new(48.85975, 2.2945),
        lure: None,
    };
    (start, landmark)
}

fn count(calls: &CallLog, kind: ActionKind) -> usize {
    calls.borrow().iter().filter(|k| **k == kind).count()
}

#[test]
fn test_single_device_then_depletion_without_transport_contact() {
    let calls: CallLog = Rc::default();
    let mut transport = Scripted::new(Rc::clone(&calls));
    transport.inventories.push_back(devices_snapshot(1));

    let (start, landmark) = start_and_landmark();
    let near = Coord::new(48.85976, 2.2946);
    transport.map_views.push_back(MapView {
        landmarks: vec![landmark],
        catchable: vec![
            WildCreature {
                encounter_id: 1,
                spawn_point_id: "sp-1".into(),
                species: SpeciesId(16),
                position: near,
            },
            WildCreature {
                encounter_id: 2,
                spawn_point_id: "sp-2".into(),
                species: SpeciesId(19),
                position: near,
            },
        ],
    });

    let mut bot = Bot::new(
        transport,
        DirectRouter,
        quiet_config(),
        SpeciesNames::new(),
        start,
    );
    bot.run().unwrap();

    // One device, two creatures: exactly one encounter reaches the server,
    // the second is skipped as depleted before any call is made.
    assert_eq!(bot.captured_total(), 1);
    assert_eq!(count(&calls, ActionKind::StartEncounter), 1);
    assert_eq!(count(&calls, ActionKind::ThrowCapture), 1);
    assert!(!bot.ledger().can_attempt_capture());
}

#[test]
fn test_missing_player_block_is_session_expiry() {
    let calls: CallLog = Rc::default();
    let mut transport = Scripted::new(Rc::clone(&calls));
    transport.player = None;

    let (start, _) = start_and_landmark();
    let mut bot = Bot::new(
        transport,
        DirectRouter,
        quiet_config(),
        SpeciesNames::new(),
        start,
    );
    let err = bot.run().unwrap_err();
    assert!(matches!(err, BotError::SessionExpired { .. }));
}

#[test]
fn test_server_busy_heartbeat_does_not_kill_the_cycle() {
    let calls: CallLog = Rc::default();
    let mut transport = Scripted::new(Rc::clone(&calls));
    transport.busy_submissions = 1;

    let (start, _) = start_and_landmark();
    let mut bot = Bot::new(
        transport,
        DirectRouter,
        quiet_config(),
        SpeciesNames::new(),
        start,
    );
    // The abandoned heartbeat leaves the ledger empty; the cycle still
    // completes and the loop exits on its budget.
    bot.run().unwrap();
    assert_eq!(bot.captured_total(), 0);
}

#[test]
fn test_bag_full_releases_and_retries_exactly_once() {
    let calls: CallLog = Rc::default();
    let mut transport = Scripted::new(Rc::clone(&calls));
    transport.encounter_status = EncounterStatus::BagFull;

    // Heartbeat snapshot: devices only. Bag-relief snapshot: a strong and a
    // weak creature of one species; the weak one fails both floors.
    transport.inventories.push_back(devices_snapshot(5));
    let mut bag = devices_snapshot(5);
    bag.creatures = vec![make_creature(1, 7, 100, 12), make_creature(2, 7, 10, 1)];
    transport.inventories.push_back(bag);

    let (start, landmark) = start_and_landmark();
    let creature_view = MapView {
        landmarks: vec![landmark.clone()],
        catchable: vec![WildCreature {
            encounter_id: 9,
            spawn_point_id: "sp-9".into(),
            species: SpeciesId(7),
            position: landmark.position,
        }],
    };
    // First view plans the walk; the second feeds the one sweep that
    // engages; later views are empty so the creature is engaged once.
    transport.map_views.push_back(creature_view.clone());
    transport.map_views.push_back(creature_view);
    transport.map_views.push_back(MapView::default());

    let mut config = quiet_config();
    config.triage.quality_floor = 80.0;
    config.triage.power_floor = 80;

    let mut bot = Bot::new(
        transport,
        DirectRouter,
        config,
        SpeciesNames::new(),
        start,
    );
    bot.run().unwrap();

    assert_eq!(bot.captured_total(), 0);
    // Engage, bag-full, one relief pass, one retry, then give up.
    assert_eq!(count(&calls, ActionKind::StartEncounter), 2);
    assert_eq!(count(&calls, ActionKind::ReleaseCreature), 1);
    // Heartbeat refresh plus the bag-relief snapshot.
    assert_eq!(count(&calls, ActionKind::GetInventory), 2);
    assert_eq!(count(&calls, ActionKind::ThrowCapture), 0);
}

#[test]
fn test_cycle_spins_landmark_and_runs_triage() {
    let calls: CallLog = Rc::default();
    let mut transport = Scripted::new(Rc::clone(&calls));

    // Snapshot with devices, an evolvable surplus creature (candy strictly
    // above cost), and a releasable one.
    let mut snapshot = devices_snapshot(10);
    snapshot.creatures = vec![
        make_creature(1, 16, 200, 12),
        make_creature(2, 16, 150, 10),
        make_creature(3, 16, 10, 1),
    ];
    snapshot.candies = vec![CandyRecord {
        family: FamilyId(16),
        count: 13,
    }];
    transport.inventories.push_back(snapshot);

    let (start, landmark) = start_and_landmark();
    transport.map_views.push_back(MapView {
        landmarks: vec![landmark],
        catchable: vec![],
    });

    let mut config = quiet_config();
    config.triage.quality_floor = 80.0;
    config.triage.power_floor = 80;
    config.evolutions = rover_core::creature::EvolutionTable::from_entries(&[(16, 12, 16)]);

    let mut bot = Bot::new(
        transport,
        DirectRouter,
        config,
        SpeciesNames::new(),
        start,
    );
    bot.run().unwrap();

    // The strongest is kept; the next evolves (13 > 12); after the local
    // candy deduction the third is no longer eligible and is released.
    assert_eq!(count(&calls, ActionKind::EvolveCreature), 1);
    assert_eq!(count(&calls, ActionKind::ReleaseCreature), 1);
    assert_eq!(count(&calls, ActionKind::SearchLandmark), 1);
}
