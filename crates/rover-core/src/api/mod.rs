//! Typed actions and the transport boundary.
//!
//! The remote service is driven through a closed set of action requests,
//! batched into a single submission; responses come back keyed by action
//! kind. Request signing, session refresh, and wire encoding all live
//! behind [`Transport`].

mod snapshot;

pub use snapshot::{CandyRecord, CreatureRecord, IncubatorRecord, InventorySnapshot, ItemRecord};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};
use thiserror::Error;
use tracing::warn;

use crate::creature::{CreatureId, SpeciesId};
use crate::error::BotError;
use crate::geo::Coord;
use crate::inventory::CaptureDevice;
use crate::landmark::Landmark;

/// Transport-level faults.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Transient server-side failure; the call is abandoned for this cycle.
    #[error("server busy or offline: {0}")]
    ServerBusy(String),

    /// Authentication is no longer valid.
    #[error("session expired")]
    SessionExpired,
}

/// One typed request to the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActionRequest {
    GetPlayer,
    GetInventory,
    GetMapObjects,
    SearchLandmark {
        landmark_id: String,
        position: Coord,
    },
    StartEncounter {
        encounter_id: u64,
        spawn_point_id: String,
    },
    StartLureEncounter {
        encounter_id: u64,
        landmark_id: String,
    },
    ThrowCapture {
        encounter_id: u64,
        spawn_point_id: String,
        device: CaptureDevice,
    },
    ReleaseCreature {
        creature_id: CreatureId,
    },
    EvolveCreature {
        creature_id: CreatureId,
    },
    RecycleItem {
        item_id: u16,
        count: u32,
    },
}

impl ActionRequest {
    /// The kind under which this action's response is keyed.
    pub fn kind(&self) -> ActionKind {
        match self {
            ActionRequest::GetPlayer => ActionKind::GetPlayer,
            ActionRequest::GetInventory => ActionKind::GetInventory,
            ActionRequest::GetMapObjects => ActionKind::GetMapObjects,
            ActionRequest::SearchLandmark { .. } => ActionKind::SearchLandmark,
            ActionRequest::StartEncounter { .. } => ActionKind::StartEncounter,
            ActionRequest::StartLureEncounter { .. } => ActionKind::StartLureEncounter,
            ActionRequest::ThrowCapture { .. } => ActionKind::ThrowCapture,
            ActionRequest::ReleaseCreature { .. } => ActionKind::ReleaseCreature,
            ActionRequest::EvolveCreature { .. } => ActionKind::EvolveCreature,
            ActionRequest::RecycleItem { .. } => ActionKind::RecycleItem,
        }
    }
}

/// Response-map key for each action variant.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize,
)]
pub enum ActionKind {
    GetPlayer,
    GetInventory,
    GetMapObjects,
    SearchLandmark,
    StartEncounter,
    StartLureEncounter,
    ThrowCapture,
    ReleaseCreature,
    EvolveCreature,
    RecycleItem,
}

/// Structured result of one action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ActionResponse {
    Player(PlayerStatus),
    Inventory(InventorySnapshot),
    MapObjects(MapView),
    LandmarkSearch(LandmarkSearchResult),
    EncounterStart(EncounterStart),
    Throw(ThrowResult),
    Release(SimpleResult),
    Evolve(EvolveResult),
    Recycle(RecycleResult),
}

/// All responses from one batched submission, keyed by action kind.
pub type BatchResponse = HashMap<ActionKind, ActionResponse>;

/// Boundary to the remote service.
///
/// Actions batched into one submission execute server-side in batch order.
/// Implementations own authentication; the core only observes
/// [`TransportError`] faults and the logged-in predicate.
pub trait Transport {
    fn submit(
        &mut self,
        position: &Coord,
        batch: &[ActionRequest],
    ) -> Result<BatchResponse, TransportError>;

    fn is_logged_in(&self) -> bool;
}

/// Submit a single action and pull out its response.
///
/// `ServerBusy` is logged and swallowed (`None`), as is a response missing
/// the expected block; only session loss is returned as an error.
pub fn submit_single<T: Transport>(
    transport: &mut T,
    position: &Coord,
    request: ActionRequest,
) -> Result<Option<ActionResponse>, BotError> {
    let kind = request.kind();
    match transport.submit(position, std::slice::from_ref(&request)) {
        Ok(mut batch) => {
            let response = batch.remove(&kind);
            if response.is_none() {
                warn!(action = %kind, "response missing expected block, skipping");
            }
            Ok(response)
        }
        Err(TransportError::ServerBusy(reason)) => {
            warn!(action = %kind, %reason, "server busy, abandoning call");
            Ok(None)
        }
        Err(TransportError::SessionExpired) => Err(BotError::SessionExpired {
            reason: format!("transport rejected {kind}"),
        }),
    }
}

/// Player block of a heartbeat response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStatus {
    pub username: String,
    pub currencies: Vec<Currency>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    pub name: String,
    pub amount: i64,
}

/// Nearby world state: landmarks and catchable creatures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapView {
    pub landmarks: Vec<Landmark>,
    pub catchable: Vec<WildCreature>,
}

/// A creature that can currently be engaged on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WildCreature {
    pub encounter_id: u64,
    pub spawn_point_id: String,
    pub species: SpeciesId,
    pub position: Coord,
}

/// Landmark interaction result codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum SearchStatus {
    Success,
    OutOfRange,
    InventoryFull,
    Other(i32),
}

impl Default for SearchStatus {
    fn default() -> Self {
        SearchStatus::Other(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkSearchResult {
    pub status: SearchStatus,
    /// Items handed out by the landmark; they show up in the next snapshot.
    pub awarded_items: Vec<ItemRecord>,
    pub experience: u32,
}

/// Encounter start status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum EncounterStatus {
    /// The creature is contestable; throws may begin.
    Ready,
    /// The creature bag is full; the server refused the encounter.
    BagFull,
    /// The encounter could not be started for any other reason.
    Unavailable,
}

/// Opening response of an encounter, carrying the per-tier
/// capture-probability estimates the policies consume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EncounterStart {
    pub status: EncounterStatus,
    pub probabilities: CaptureProbabilities,
}

/// Capture-probability estimates per device tier, 0.0-1.0.
///
/// Supplied by the server per encounter; the core never computes these.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptureProbabilities {
    pub basic: f64,
    pub good: f64,
    pub ultra: f64,
}

impl CaptureProbabilities {
    /// Estimate for a device tier; Premier throws are treated as certain.
    pub fn for_device(&self, device: CaptureDevice) -> f64 {
        match device {
            CaptureDevice::Basic => self.basic,
            CaptureDevice::Good => self.good,
            CaptureDevice::Ultra => self.ultra,
            CaptureDevice::Premier => 1.0,
        }
    }
}

/// Result of one capture throw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum ThrowStatus {
    /// The creature stayed in the device.
    Captured,
    /// It broke free; the encounter continues.
    Escaped,
    /// It fled the encounter entirely.
    Fled,
    /// Server-side error; the encounter is over.
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrowResult {
    pub status: ThrowStatus,
}

/// Generic success/failure result carrying the raw server code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleResult {
    pub success: bool,
    pub code: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolveResult {
    pub success: bool,
    pub evolved: Option<CreatureRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecycleResult {
    pub success: bool,
    pub new_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_every_request_maps_to_a_distinct_kind() {
        let requests = [
            ActionRequest::GetPlayer,
            ActionRequest::GetInventory,
            ActionRequest::GetMapObjects,
            ActionRequest::SearchLandmark {
                landmark_id: "lm".into(),
                position: Coord::default(),
            },
            ActionRequest::StartEncounter {
                encounter_id: 1,
                spawn_point_id: "sp".into(),
            },
            ActionRequest::StartLureEncounter {
                encounter_id: 1,
                landmark_id: "lm".into(),
            },
            ActionRequest::ThrowCapture {
                encounter_id: 1,
                spawn_point_id: "sp".into(),
                device: CaptureDevice::Basic,
            },
            ActionRequest::ReleaseCreature {
                creature_id: CreatureId(1),
            },
            ActionRequest::EvolveCreature {
                creature_id: CreatureId(1),
            },
            ActionRequest::RecycleItem {
                item_id: 101,
                count: 5,
            },
        ];
        let kinds: Vec<ActionKind> = requests.iter().map(|r| r.kind()).collect();
        for kind in ActionKind::iter() {
            assert_eq!(kinds.iter().filter(|k| **k == kind).count(), 1, "{kind}");
        }
    }

    #[test]
    fn test_probabilities_premier_is_certain() {
        let probs = CaptureProbabilities {
            basic: 0.2,
            good: 0.4,
            ultra: 0.6,
        };
        assert_eq!(probs.for_device(CaptureDevice::Basic), 0.2);
        assert_eq!(probs.for_device(CaptureDevice::Premier), 1.0);
    }
}
