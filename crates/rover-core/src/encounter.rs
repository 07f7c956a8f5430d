//! The per-encounter capture state machine.
//!
//! One encounter: start it, then throw devices until a terminal status or
//! the retry ceiling. Every throw pulls a fresh device through the policy;
//! the ledger deduction happens inside the selection, strictly before the
//! outbound throw.

use tracing::{debug, warn};

use crate::api::{
    submit_single, ActionRequest, ActionResponse, CaptureProbabilities, EncounterStatus,
    ThrowStatus, Transport,
};
use crate::creature::SpeciesId;
use crate::error::BotError;
use crate::geo::Coord;
use crate::inventory::policy::CapturePolicy;
use crate::inventory::ResourceLedger;

/// What is being engaged: a wild spawn or a lured creature at a landmark.
#[derive(Debug, Clone, PartialEq)]
pub enum EncounterTarget {
    Wild {
        encounter_id: u64,
        spawn_point_id: String,
        species: SpeciesId,
    },
    Lure {
        encounter_id: u64,
        landmark_id: String,
        species: SpeciesId,
    },
}

impl EncounterTarget {
    pub fn species(&self) -> SpeciesId {
        match self {
            EncounterTarget::Wild { species, .. } | EncounterTarget::Lure { species, .. } => {
                *species
            }
        }
    }

    fn start_request(&self) -> ActionRequest {
        match self {
            EncounterTarget::Wild {
                encounter_id,
                spawn_point_id,
                ..
            } => ActionRequest::StartEncounter {
                encounter_id: *encounter_id,
                spawn_point_id: spawn_point_id.clone(),
            },
            EncounterTarget::Lure {
                encounter_id,
                landmark_id,
                ..
            } => ActionRequest::StartLureEncounter {
                encounter_id: *encounter_id,
                landmark_id: landmark_id.clone(),
            },
        }
    }

    fn throw_request(&self, device: crate::inventory::CaptureDevice) -> ActionRequest {
        match self {
            EncounterTarget::Wild {
                encounter_id,
                spawn_point_id,
                ..
            } => ActionRequest::ThrowCapture {
                encounter_id: *encounter_id,
                spawn_point_id: spawn_point_id.clone(),
                device,
            },
            EncounterTarget::Lure {
                encounter_id,
                landmark_id,
                ..
            } => ActionRequest::ThrowCapture {
                encounter_id: *encounter_id,
                spawn_point_id: landmark_id.clone(),
                device,
            },
        }
    }
}

/// Terminal outcome of one encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncounterOutcome {
    /// The creature was captured.
    Success,
    /// The retry ceiling was reached without a capture.
    Missed,
    /// The creature fled, or the server errored the encounter.
    Fled,
    /// No device could be spent; when this happens on entry no server call
    /// is made at all.
    DeviceDepleted,
    /// The server refused the start because the creature bag is full. The
    /// caller owns the one-shot triage-and-retry.
    BagFull,
    /// The encounter could not be started or a response went missing.
    Unavailable,
}

/// Drives one capture interaction against the transport.
pub struct EncounterController<'a, T: Transport> {
    transport: &'a mut T,
    ledger: &'a mut ResourceLedger,
    policy: &'a CapturePolicy,
    use_premier: bool,
    throw_retry_limit: u32,
}

impl<'a, T: Transport> EncounterController<'a, T> {
    pub fn new(
        transport: &'a mut T,
        ledger: &'a mut ResourceLedger,
        policy: &'a CapturePolicy,
        use_premier: bool,
        throw_retry_limit: u32,
    ) -> Self {
        Self {
            transport,
            ledger,
            policy,
            use_premier,
            throw_retry_limit,
        }
    }

    /// Run the encounter to a terminal outcome.
    ///
    /// `ServerBusy` and malformed responses abandon the encounter as
    /// [`EncounterOutcome::Unavailable`]; only session loss propagates.
    pub fn engage(
        &mut self,
        position: &Coord,
        target: &EncounterTarget,
    ) -> Result<EncounterOutcome, BotError> {
        if !self.ledger.can_attempt_capture() {
            debug!("no devices in stock, encounter not started");
            return Ok(EncounterOutcome::DeviceDepleted);
        }

        let response = submit_single(self.transport, position, target.start_request())?;
        let Some(ActionResponse::EncounterStart(start)) = response else {
            return Ok(EncounterOutcome::Unavailable);
        };

        match start.status {
            EncounterStatus::BagFull => Ok(EncounterOutcome::BagFull),
            EncounterStatus::Unavailable => Ok(EncounterOutcome::Unavailable),
            EncounterStatus::Ready => self.throw_sequence(position, target, &start.probabilities),
        }
    }

    fn throw_sequence(
        &mut self,
        position: &Coord,
        target: &EncounterTarget,
        probabilities: &CaptureProbabilities,
    ) -> Result<EncounterOutcome, BotError> {
        for attempt in 1..=self.throw_retry_limit {
            let Some(device) =
                self.policy
                    .select_and_take(self.ledger, probabilities, self.use_premier)
            else {
                return Ok(EncounterOutcome::DeviceDepleted);
            };
            debug!(%device, attempt, "throwing capture device");

            let response = submit_single(self.transport, position, target.throw_request(device))?;
            let Some(ActionResponse::Throw(result)) = response else {
                // The device is spent; without a result the safe move is to
                // treat the throw as lost and stop.
                warn!(%device, "throw result missing, abandoning encounter");
                return Ok(EncounterOutcome::Missed);
            };

            match result.status {
                ThrowStatus::Captured => return Ok(EncounterOutcome::Success),
                ThrowStatus::Fled | ThrowStatus::Error => return Ok(EncounterOutcome::Fled),
                ThrowStatus::Escaped => {}
            }
        }
        Ok(EncounterOutcome::Missed)
    }
}
