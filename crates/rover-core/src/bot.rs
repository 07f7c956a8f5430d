//! The top-level control loop.
//!
//! One cycle: heartbeat (with a periodic inventory refresh and the triage
//! passes), movement toward landmarks, landmark interaction, and capture
//! sweeps, all strictly sequential against a single transport. The ledger
//! is only touched between a decision and its outbound action, so it never
//! runs optimistic relative to the server.

use std::collections::HashMap;
use std::thread;
use std::time::{Duration, Instant};

use rand::Rng;
use tracing::{debug, info, warn};

use crate::api::{
    submit_single, ActionKind, ActionRequest, ActionResponse, InventorySnapshot, MapView,
    SearchStatus, Transport, TransportError,
};
use crate::config::BotConfig;
use crate::consts::{LANDMARK_INTERACT_RANGE_M, VISIT_ALL_MAX_LANDMARKS};
use crate::creature::{CapturedCreature, SpeciesId};
use crate::dump::SnapshotDump;
use crate::encounter::{EncounterController, EncounterOutcome, EncounterTarget};
use crate::error::BotError;
use crate::geo::{self, Coord, Router};
use crate::inventory::{recycle_plan, ResourceLedger};
use crate::landmark::{Landmark, VisitedLandmarks};
use crate::triage::{self, SpeciesGroup};

/// Display names for species, used for log context.
pub type SpeciesNames = HashMap<SpeciesId, String>;

/// The bot: owns the ledger and visited-landmark memory, borrows nothing
/// ambient, and drives everything through one transport.
pub struct Bot<T: Transport, R: Router> {
    transport: T,
    router: R,
    config: BotConfig,
    names: SpeciesNames,
    position: Coord,
    origin: Coord,
    ledger: ResourceLedger,
    visited: VisitedLandmarks,
    heartbeat_seq: u64,
    captured_total: u64,
    failure_streak: u32,
    cycles_run: u64,
    dump: Option<SnapshotDump>,
}

impl<T: Transport, R: Router> Bot<T, R> {
    /// Build a bot at a starting position. The transport must already hold
    /// a valid session; [`run`](Self::run) refuses to start otherwise.
    pub fn new(
        transport: T,
        router: R,
        config: BotConfig,
        names: SpeciesNames,
        start: Coord,
    ) -> Self {
        let visited = VisitedLandmarks::new(Duration::from_secs(config.visited_expiry_secs));
        Self {
            transport,
            router,
            config,
            names,
            position: start,
            origin: start,
            ledger: ResourceLedger::default(),
            visited,
            heartbeat_seq: 0,
            captured_total: 0,
            failure_streak: 0,
            cycles_run: 0,
            dump: None,
        }
    }

    /// Dump the raw snapshot to disk after every inventory refresh.
    pub fn with_dump(mut self, dump: SnapshotDump) -> Self {
        self.dump = Some(dump);
        self
    }

    pub fn position(&self) -> &Coord {
        &self.position
    }

    pub fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    pub fn captured_total(&self) -> u64 {
        self.captured_total
    }

    /// Run cycles until the session dies or the cycle budget is spent.
    ///
    /// The only error that comes out of here is session loss; the caller
    /// re-logins and restarts.
    pub fn run(&mut self) -> Result<(), BotError> {
        if !self.transport.is_logged_in() {
            return Err(BotError::SessionExpired {
                reason: "transport is not logged in".into(),
            });
        }
        info!(
            lat = self.position.lat,
            lng = self.position.lng,
            "control loop starting"
        );

        loop {
            self.heartbeat()?;
            self.pause(self.config.pacing.cycle_pause_ms);

            let moved = if self.config.visit_all_landmarks {
                self.visit_all_landmarks()?
            } else {
                self.visit_nearest_landmark()?
            };
            if !moved {
                debug!("no landmark to visit this cycle");
            }

            self.cycles_run += 1;
            if let Some(max) = self.config.max_cycles {
                if self.cycles_run >= max {
                    info!(cycles = self.cycles_run, "cycle budget spent, stopping");
                    return Ok(());
                }
            }
        }
    }

    /// One heartbeat: player status, plus an inventory refresh every Nth.
    ///
    /// A busy server abandons the heartbeat for this cycle. A response
    /// without the player block means the session is gone.
    fn heartbeat(&mut self) -> Result<(), BotError> {
        if !self.transport.is_logged_in() {
            return Err(BotError::SessionExpired {
                reason: "transport lost its session".into(),
            });
        }

        let refresh = self.heartbeat_seq % self.config.inventory_refresh_period == 0;
        self.heartbeat_seq += 1;

        let mut batch = vec![ActionRequest::GetPlayer];
        if refresh {
            batch.push(ActionRequest::GetInventory);
        }

        let mut responses = match self.transport.submit(&self.position, &batch) {
            Ok(responses) => responses,
            Err(TransportError::ServerBusy(reason)) => {
                warn!(%reason, "heartbeat abandoned, server busy");
                return Ok(());
            }
            Err(TransportError::SessionExpired) => {
                return Err(BotError::SessionExpired {
                    reason: "heartbeat rejected by transport".into(),
                });
            }
        };

        let Some(ActionResponse::Player(player)) = responses.remove(&ActionKind::GetPlayer) else {
            return Err(BotError::SessionExpired {
                reason: "heartbeat response missing player block".into(),
            });
        };
        let currencies: Vec<String> = player
            .currencies
            .iter()
            .map(|c| format!("{}: {}", c.name, c.amount))
            .collect();
        info!(
            username = %player.username,
            currencies = %currencies.join(", "),
            captured = self.captured_total,
            "heartbeat"
        );

        if refresh {
            match responses.remove(&ActionKind::GetInventory) {
                Some(ActionResponse::Inventory(snapshot)) => self.refresh_inventory(snapshot)?,
                _ => warn!("inventory block missing, ledger not refreshed this cycle"),
            }
        }
        Ok(())
    }

    /// Replace the ledger from a fresh snapshot, dump it, and run the
    /// recycle, evolve, and release passes in that order. Evolution goes
    /// first since it changes identity and must happen on current stock.
    fn refresh_inventory(&mut self, snapshot: InventorySnapshot) -> Result<(), BotError> {
        self.ledger = ResourceLedger::from_snapshot(&snapshot);
        debug!(
            devices = self.ledger.total_devices(),
            creatures = snapshot.creature_count(),
            eggs = snapshot.egg_count(),
            incubators = snapshot.incubators.len(),
            "inventory refreshed"
        );

        if let Some(dump) = &self.dump {
            match dump.write(&self.position, &snapshot) {
                Ok(path) => debug!(path = %path.display(), "snapshot dumped"),
                Err(err) => warn!(%err, "snapshot dump failed"),
            }
        }

        self.recycle_pass(&snapshot)?;

        let creatures: Vec<CapturedCreature> = snapshot
            .creatures
            .iter()
            .map(CapturedCreature::from_record)
            .collect();
        let groups = triage::ranked_groups(&creatures);
        self.evolve_pass(&groups)?;
        self.release_pass(&groups)?;
        Ok(())
    }

    /// Recycle consumable stacks above their keep-counts, then re-sync the
    /// ledger so the freed slots are visible immediately.
    fn recycle_pass(&mut self, snapshot: &InventorySnapshot) -> Result<(), BotError> {
        let plan = recycle_plan(snapshot, &self.config.recycle_keep);
        if plan.is_empty() {
            return Ok(());
        }

        for entry in plan {
            info!(kind = %entry.kind, surplus = entry.surplus, "recycling surplus items");
            let request = ActionRequest::RecycleItem {
                item_id: entry.item_id,
                count: entry.surplus,
            };
            match submit_single(&mut self.transport, &self.position, request)? {
                Some(ActionResponse::Recycle(result)) if result.success => {
                    debug!(kind = %entry.kind, new_count = result.new_count, "recycled");
                }
                Some(ActionResponse::Recycle(_)) => {
                    warn!(kind = %entry.kind, "recycle rejected by server");
                }
                _ => {}
            }
            self.pause(self.config.pacing.action_pause_ms);
        }
        self.refresh_ledger_only()
    }

    /// Fetch a fresh snapshot and rebuild the ledger, nothing else.
    fn refresh_ledger_only(&mut self) -> Result<(), BotError> {
        if let Some(ActionResponse::Inventory(snapshot)) =
            submit_single(&mut self.transport, &self.position, ActionRequest::GetInventory)?
        {
            self.ledger = ResourceLedger::from_snapshot(&snapshot);
        }
        Ok(())
    }

    /// Evolve surplus creatures front-to-back per ranked species group.
    ///
    /// The first member of a species that fails eligibility ends that
    /// species: weaker members cannot qualify either, since eligibility
    /// depends only on the candy balance.
    fn evolve_pass(&mut self, groups: &[SpeciesGroup]) -> Result<(), BotError> {
        for group in groups {
            for creature in group.surplus(self.config.triage.min_keep_per_species) {
                if !triage::is_evolve_candidate(
                    creature,
                    &self.config.triage,
                    &self.config.evolutions,
                    &self.ledger,
                ) {
                    break;
                }
                let name = species_label(&self.names, creature.species);
                info!(species = %name, power = creature.combat_power, "evolving");

                let request = ActionRequest::EvolveCreature {
                    creature_id: creature.id,
                };
                match submit_single(&mut self.transport, &self.position, request)? {
                    Some(ActionResponse::Evolve(result)) if result.success => {
                        if let Some(rule) = self.config.evolutions.get(creature.species) {
                            self.ledger.spend_candy(rule.family, rule.candy_cost);
                        }
                        let evolved = result
                            .evolved
                            .map(|r| species_label(&self.names, r.species))
                            .unwrap_or_else(|| "?".into());
                        info!(species = %name, into = %evolved, "evolved");
                    }
                    _ => {
                        warn!(species = %name, "evolution failed, moving to next species");
                        break;
                    }
                }
                self.pause(self.config.pacing.action_pause_ms);
            }
        }
        Ok(())
    }

    /// Release surplus creatures that fail both floors (or are on the
    /// always-release list), favorites and keep-listed species excepted.
    fn release_pass(&mut self, groups: &[SpeciesGroup]) -> Result<(), BotError> {
        for group in groups {
            for creature in group.surplus(self.config.triage.min_keep_per_species) {
                if !triage::is_release_candidate(creature, &self.config.triage) {
                    continue;
                }
                let name = species_label(&self.names, creature.species);
                info!(
                    species = %name,
                    power = creature.combat_power,
                    quality = creature.quality(),
                    "releasing"
                );

                let request = ActionRequest::ReleaseCreature {
                    creature_id: creature.id,
                };
                match submit_single(&mut self.transport, &self.position, request)? {
                    Some(ActionResponse::Release(result)) if result.success => {
                        debug!(species = %name, "released");
                    }
                    _ => warn!(species = %name, "release failed"),
                }
                self.pause(self.config.pacing.action_pause_ms);
            }
        }
        Ok(())
    }

    fn map_view(&mut self) -> Result<Option<MapView>, BotError> {
        match submit_single(&mut self.transport, &self.position, ActionRequest::GetMapObjects)? {
            Some(ActionResponse::MapObjects(view)) => Ok(Some(view)),
            _ => Ok(None),
        }
    }

    /// Unvisited landmarks in range, nearest first, with distances.
    fn landmark_candidates(&self, view: &MapView) -> Vec<(Landmark, f64)> {
        let now = Instant::now();
        let mut candidates: Vec<(Landmark, f64)> = view
            .landmarks
            .iter()
            .filter(|lm| !self.visited.contains(&lm.id, now))
            .filter(|lm| match self.config.stay_within_radius_m {
                Some(radius) => self.origin.distance_m(&lm.position) <= radius,
                None => true,
            })
            .map(|lm| (lm.clone(), self.position.distance_m(&lm.position)))
            .collect();
        candidates.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        candidates
    }

    /// Walk to the nearest unvisited landmark and interact with it.
    fn visit_nearest_landmark(&mut self) -> Result<bool, BotError> {
        let Some(view) = self.map_view()? else {
            return Ok(false);
        };
        let Some((landmark, distance)) = self.landmark_candidates(&view).into_iter().next() else {
            warn!("no landmark to walk to");
            return Ok(false);
        };
        info!(
            id = %landmark.id,
            lat = landmark.position.lat,
            lng = landmark.position.lng,
            distance_m = distance,
            "walking to landmark"
        );
        self.walk_to(landmark.position, &[])?;
        let arrival_distance = self.position.distance_m(&landmark.position);
        self.interact_landmark(&landmark, arrival_distance)?;
        self.capture_sweep()?;
        Ok(true)
    }

    /// Chain through up to 20 nearby landmarks, spinning along the way.
    fn visit_all_landmarks(&mut self) -> Result<bool, BotError> {
        let Some(view) = self.map_view()? else {
            return Ok(false);
        };
        let mut candidates = self.landmark_candidates(&view);
        candidates.truncate(VISIT_ALL_MAX_LANDMARKS);
        let Some((destination, _)) = candidates.pop() else {
            warn!("no landmark to walk to");
            return Ok(false);
        };
        let via: Vec<Coord> = candidates.iter().map(|(lm, _)| lm.position).collect();
        info!(
            id = %destination.id,
            chained = via.len() + 1,
            "chaining through landmarks"
        );
        self.walk_to(destination.position, &via)?;
        let arrival_distance = self.position.distance_m(&destination.position);
        self.interact_landmark(&destination, arrival_distance)?;
        self.capture_sweep()?;
        Ok(true)
    }

    /// Walk in fixed-size steps, heartbeating and sweeping at each step.
    fn walk_to(&mut self, destination: Coord, via: &[Coord]) -> Result<(), BotError> {
        let legs = self.router.route(&self.position, &destination, via);
        for leg in legs {
            let steps = geo::step_increments(&self.position, &leg, self.config.step_size_m);
            for step in steps {
                self.position = step;
                self.heartbeat()?;
                if self.config.visit_all_landmarks {
                    self.spin_in_range()?;
                }
                self.pause(self.config.pacing.step_pause_ms);
                self.capture_sweep()?;
            }
        }
        Ok(())
    }

    /// Spin the nearest landmark if it is already within reach.
    fn spin_in_range(&mut self) -> Result<(), BotError> {
        let Some(view) = self.map_view()? else {
            return Ok(());
        };
        if let Some((landmark, distance)) = self.landmark_candidates(&view).into_iter().next() {
            if distance <= LANDMARK_INTERACT_RANGE_M {
                self.interact_landmark(&landmark, distance)?;
            }
        }
        Ok(())
    }

    /// Spin a landmark and interpret the result code. Success and a full
    /// item bag both count as visited; out-of-range and unknown codes leave
    /// the landmark eligible.
    fn interact_landmark(&mut self, landmark: &Landmark, distance_m: f64) -> Result<(), BotError> {
        let request = ActionRequest::SearchLandmark {
            landmark_id: landmark.id.clone(),
            position: landmark.position,
        };
        let response = submit_single(&mut self.transport, &self.position, request)?;
        let Some(ActionResponse::LandmarkSearch(result)) = response else {
            return Ok(());
        };

        match result.status {
            SearchStatus::Success => {
                info!(
                    id = %landmark.id,
                    items = result.awarded_items.len(),
                    experience = result.experience,
                    "landmark spun"
                );
                self.visited.insert(&landmark.id, Instant::now());
            }
            SearchStatus::InventoryFull => {
                info!(id = %landmark.id, "landmark spun but the item bag is full");
                self.visited.insert(&landmark.id, Instant::now());
            }
            SearchStatus::OutOfRange => {
                warn!(id = %landmark.id, distance_m, "landmark out of range");
            }
            SearchStatus::Other(code) => {
                warn!(id = %landmark.id, code, "landmark interaction failed");
            }
        }

        if let Some(lure) = landmark.lure {
            let name = species_label(&self.names, lure.active_species);
            info!(id = %landmark.id, species = %name, "landmark has an active lure");
            let target = EncounterTarget::Lure {
                encounter_id: lure.encounter_id,
                landmark_id: landmark.id.clone(),
                species: lure.active_species,
            };
            self.attempt_encounter(&target)?;
        }
        Ok(())
    }

    /// Engage every capturable creature nearby, nearest first. Skipped
    /// entirely when the ledger has no capture stock.
    fn capture_sweep(&mut self) -> Result<(), BotError> {
        if !self.ledger.can_attempt_capture() {
            debug!("no capture stock, skipping sweep");
            return Ok(());
        }
        let Some(view) = self.map_view()? else {
            return Ok(());
        };
        if view.catchable.is_empty() {
            debug!("no creatures nearby");
            return Ok(());
        }

        let mut targets = view.catchable;
        targets.sort_by(|a, b| {
            let da = self.position.distance_m(&a.position);
            let db = self.position.distance_m(&b.position);
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        });
        let nearby: Vec<String> = targets
            .iter()
            .map(|w| species_label(&self.names, w.species))
            .collect();
        info!(creatures = %nearby.join(", "), "creatures nearby");

        for wild in targets {
            if !self.ledger.can_attempt_capture() {
                debug!("capture stock exhausted mid-sweep");
                break;
            }
            let target = EncounterTarget::Wild {
                encounter_id: wild.encounter_id,
                spawn_point_id: wild.spawn_point_id.clone(),
                species: wild.species,
            };
            self.attempt_encounter(&target)?;
            self.pause_between_encounters();
        }
        Ok(())
    }

    /// One encounter, with the one-shot bag-full triage and retry.
    fn attempt_encounter(&mut self, target: &EncounterTarget) -> Result<EncounterOutcome, BotError> {
        let name = species_label(&self.names, target.species());
        info!(species = %name, "engaging creature");

        let mut outcome = self.engage_once(target)?;
        if outcome == EncounterOutcome::BagFull {
            info!(species = %name, "creature bag full, releasing surplus and retrying once");
            self.bag_relief_pass()?;
            outcome = self.engage_once(target)?;
            if outcome == EncounterOutcome::BagFull {
                warn!(species = %name, "bag still full after release pass, giving up");
            }
        }

        match outcome {
            EncounterOutcome::Success => {
                self.captured_total += 1;
                self.failure_streak = 0;
                info!(species = %name, total = self.captured_total, "captured");
            }
            EncounterOutcome::DeviceDepleted => {
                debug!(species = %name, "no devices left to throw");
            }
            other => {
                self.failure_streak += 1;
                info!(species = %name, outcome = ?other, "capture failed");
                if self.failure_streak >= self.config.failure_warn_limit {
                    warn!(
                        streak = self.failure_streak,
                        "captures keep failing; the account may be soft-banned"
                    );
                    self.failure_streak = 0;
                }
            }
        }
        Ok(outcome)
    }

    fn engage_once(&mut self, target: &EncounterTarget) -> Result<EncounterOutcome, BotError> {
        let position = self.position;
        let mut controller = EncounterController::new(
            &mut self.transport,
            &mut self.ledger,
            &self.config.policy,
            self.config.use_premier,
            self.config.throw_retry_limit,
        );
        controller.engage(&position, target)
    }

    /// Free bag space: fresh snapshot, then the release pass only.
    fn bag_relief_pass(&mut self) -> Result<(), BotError> {
        let response =
            submit_single(&mut self.transport, &self.position, ActionRequest::GetInventory)?;
        let Some(ActionResponse::Inventory(snapshot)) = response else {
            return Ok(());
        };
        self.ledger = ResourceLedger::from_snapshot(&snapshot);
        let creatures: Vec<CapturedCreature> = snapshot
            .creatures
            .iter()
            .map(CapturedCreature::from_record)
            .collect();
        let groups = triage::ranked_groups(&creatures);
        self.release_pass(&groups)
    }

    fn pause(&self, ms: u64) {
        if ms > 0 {
            thread::sleep(Duration::from_millis(ms));
        }
    }

    /// Jittered gap between consecutive encounters, to pace like a person.
    fn pause_between_encounters(&self) {
        let min = self.config.pacing.encounter_gap_min_ms;
        let max = self.config.pacing.encounter_gap_max_ms.max(min);
        if max == 0 {
            return;
        }
        let ms = if min == max {
            min
        } else {
            rand::thread_rng().gen_range(min..=max)
        };
        thread::sleep(Duration::from_millis(ms));
    }
}

fn species_label(names: &SpeciesNames, species: SpeciesId) -> String {
    names
        .get(&species)
        .cloned()
        .unwrap_or_else(|| format!("species #{}", species.0))
}
