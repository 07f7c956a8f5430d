//! The resource ledger: capture devices, consumables, and candies.

pub mod policy;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};
use thiserror::Error;
use tracing::debug;

use crate::api::InventorySnapshot;
use crate::creature::FamilyId;

/// Capture device tiers, weakest first. The declaration order is the
/// strength order used for tie-breaking and fallback.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumIter,
    Serialize,
    Deserialize,
)]
pub enum CaptureDevice {
    Basic,
    Good,
    Ultra,
    Premier,
}

impl CaptureDevice {
    /// All tiers, weakest to strongest.
    pub const ORDERED: [CaptureDevice; 4] = [
        CaptureDevice::Basic,
        CaptureDevice::Good,
        CaptureDevice::Ultra,
        CaptureDevice::Premier,
    ];

    /// The three tiers the server supplies probability estimates for.
    pub const THRESHOLD_TIERS: [CaptureDevice; 3] = [
        CaptureDevice::Basic,
        CaptureDevice::Good,
        CaptureDevice::Ultra,
    ];

    /// Raw item identifier on the wire.
    pub fn item_id(&self) -> u16 {
        match self {
            CaptureDevice::Basic => 1,
            CaptureDevice::Good => 2,
            CaptureDevice::Ultra => 3,
            CaptureDevice::Premier => 4,
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

/// Consumables the ledger tracks and the recycler can discard.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize,
)]
pub enum ConsumableKind {
    Tonic,
    SuperTonic,
    HyperTonic,
    MaxTonic,
    Revive,
    MaxRevive,
    Bait,
    SweetBait,
    SourBait,
    Incubator,
}

/// Semantic kind of an inventory item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Device(CaptureDevice),
    Consumable(ConsumableKind),
    Currency,
    Unknown,
}

impl ItemKind {
    /// Map a raw numeric item identifier to its semantic kind.
    pub fn from_item_id(item_id: u16) -> ItemKind {
        match item_id {
            1 => ItemKind::Device(CaptureDevice::Basic),
            2 => ItemKind::Device(CaptureDevice::Good),
            3 => ItemKind::Device(CaptureDevice::Ultra),
            4 => ItemKind::Device(CaptureDevice::Premier),
            100 => ItemKind::Currency,
            101 => ItemKind::Consumable(ConsumableKind::Tonic),
            102 => ItemKind::Consumable(ConsumableKind::SuperTonic),
            103 => ItemKind::Consumable(ConsumableKind::HyperTonic),
            104 => ItemKind::Consumable(ConsumableKind::MaxTonic),
            201 => ItemKind::Consumable(ConsumableKind::Revive),
            202 => ItemKind::Consumable(ConsumableKind::MaxRevive),
            701 => ItemKind::Consumable(ConsumableKind::Bait),
            702 => ItemKind::Consumable(ConsumableKind::SweetBait),
            703 => ItemKind::Consumable(ConsumableKind::SourBait),
            902 => ItemKind::Consumable(ConsumableKind::Incubator),
            _ => ItemKind::Unknown,
        }
    }
}

impl ConsumableKind {
    /// Raw item identifier on the wire.
    pub fn item_id(&self) -> u16 {
        match self {
            ConsumableKind::Tonic => 101,
            ConsumableKind::SuperTonic => 102,
            ConsumableKind::HyperTonic => 103,
            ConsumableKind::MaxTonic => 104,
            ConsumableKind::Revive => 201,
            ConsumableKind::MaxRevive => 202,
            ConsumableKind::Bait => 701,
            ConsumableKind::SweetBait => 702,
            ConsumableKind::SourBait => 703,
            ConsumableKind::Incubator => 902,
        }
    }
}

/// Attempt to spend a device tier that is out of stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no {0} devices left")]
pub struct DepletionError(pub CaptureDevice);

/// Counts of depletable resources, derived from one inventory snapshot.
///
/// The ledger is the single source of truth between snapshots: it is only
/// mutated through [`take_device`](Self::take_device),
/// [`spend_consumable`](Self::spend_consumable), and
/// [`spend_candy`](Self::spend_candy), and is replaced wholesale by the
/// next snapshot. Counts never go below zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceLedger {
    devices: [u32; 4],
    consumables: HashMap<ConsumableKind, u32>,
    candies: HashMap<FamilyId, u32>,
}

impl ResourceLedger {
    /// Derive a fresh ledger from a snapshot.
    pub fn from_snapshot(snapshot: &InventorySnapshot) -> Self {
        let mut ledger = Self::default();
        for record in &snapshot.items {
            match ItemKind::from_item_id(record.item_id) {
                ItemKind::Device(device) => ledger.devices[device.index()] += record.count,
                ItemKind::Consumable(kind) => {
                    *ledger.consumables.entry(kind).or_insert(0) += record.count;
                }
                ItemKind::Currency => {}
                ItemKind::Unknown => {
                    debug!(item_id = record.item_id, count = record.count, "unknown item kind");
                }
            }
        }
        for candy in &snapshot.candies {
            *ledger.candies.entry(candy.family).or_insert(0) += candy.count;
        }
        ledger
    }

    pub fn device_count(&self, device: CaptureDevice) -> u32 {
        self.devices[device.index()]
    }

    pub fn consumable_count(&self, kind: ConsumableKind) -> u32 {
        self.consumables.get(&kind).copied().unwrap_or(0)
    }

    pub fn candy_count(&self, family: FamilyId) -> u32 {
        self.candies.get(&family).copied().unwrap_or(0)
    }

    /// Total devices across all tiers.
    pub fn total_devices(&self) -> u32 {
        self.devices.iter().sum()
    }

    /// True iff at least one device of any tier is in stock.
    pub fn can_attempt_capture(&self) -> bool {
        self.total_devices() > 0
    }

    /// Deduct one device of the given tier.
    ///
    /// Fails with [`DepletionError`] instead of ever going negative.
    pub fn take_device(&mut self, device: CaptureDevice) -> Result<CaptureDevice, DepletionError> {
        let count = &mut self.devices[device.index()];
        if *count == 0 {
            return Err(DepletionError(device));
        }
        *count -= 1;
        Ok(device)
    }

    /// Deduct one consumable.
    ///
    /// A deduction at zero is treated as a spend that was already applied
    /// by an earlier snapshot rather than an error, and is ignored.
    pub fn spend_consumable(&mut self, kind: ConsumableKind) {
        match self.consumables.get_mut(&kind) {
            Some(count) if *count > 0 => *count -= 1,
            _ => debug!(%kind, "consumable spend at zero, assuming already applied"),
        }
    }

    /// Deduct candy from a family balance, saturating at zero.
    pub fn spend_candy(&mut self, family: FamilyId, amount: u32) {
        let count = self.candies.entry(family).or_insert(0);
        *count = count.saturating_sub(amount);
    }

    /// Deterministic fallback choice when no policy tier qualifies:
    /// Premier (only when preferred) → Ultra → Good → Basic.
    pub fn best_available_device(&self, prefer_premier: bool) -> Option<CaptureDevice> {
        if prefer_premier && self.device_count(CaptureDevice::Premier) > 0 {
            return Some(CaptureDevice::Premier);
        }
        [CaptureDevice::Ultra, CaptureDevice::Good, CaptureDevice::Basic]
            .into_iter()
            .find(|&device| self.device_count(device) > 0)
    }
}

/// One entry of a recycle plan: surplus above the configured keep-count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecycleEntry {
    pub kind: ConsumableKind,
    pub item_id: u16,
    pub surplus: u32,
}

/// Compute which consumable stacks exceed their keep-counts.
///
/// Only kinds present in `keep` are ever recycled; everything else is kept
/// in full.
pub fn recycle_plan(
    snapshot: &InventorySnapshot,
    keep: &HashMap<ConsumableKind, u32>,
) -> Vec<RecycleEntry> {
    let mut plan = Vec::new();
    for record in &snapshot.items {
        let ItemKind::Consumable(kind) = ItemKind::from_item_id(record.item_id) else {
            continue;
        };
        let Some(&keep_count) = keep.get(&kind) else {
            continue;
        };
        if record.count > keep_count {
            plan.push(RecycleEntry {
                kind,
                item_id: record.item_id,
                surplus: record.count - keep_count,
            });
        }
    }
    plan
}
