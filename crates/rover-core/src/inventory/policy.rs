//! Per-throw capture-device selection policies.

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::{CaptureDevice, ResourceLedger};
use crate::api::CaptureProbabilities;

/// Which selection rule turns probability estimates into a device choice.
///
/// Both variants pick from the three estimated tiers and treat Premier as a
/// reserve that the caller enables separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CapturePolicy {
    /// Walk tiers weakest to strongest; the first stocked tier whose
    /// estimate exceeds its own absolute threshold wins. When no tier
    /// clears, escalate to the strongest stocked device.
    ThresholdAscending { thresholds: [f64; 3] },

    /// Walk tiers weakest to strongest against percentage ceilings to find
    /// the priority ceiling tier, then spend the weakest stocked tier at or
    /// below it, falling back upward, Premier last and only when enabled.
    ThresholdDescending { ceilings_pct: [f64; 3] },
}

impl Default for CapturePolicy {
    fn default() -> Self {
        CapturePolicy::ThresholdAscending {
            thresholds: [0.30, 0.30, 0.30],
        }
    }
}

impl CapturePolicy {
    /// Choose and deduct the device for the next throw.
    ///
    /// Selection and deduction are one operation so callers can never act
    /// on a tier that was not spent. Returns `None` when the ledger has no
    /// devices, or when the only stock left is a disabled Premier reserve;
    /// callers must treat `None` as depletion.
    pub fn select_and_take(
        &self,
        ledger: &mut ResourceLedger,
        probabilities: &CaptureProbabilities,
        use_premier: bool,
    ) -> Option<CaptureDevice> {
        if !ledger.can_attempt_capture() {
            return None;
        }
        let chosen = match self {
            CapturePolicy::ThresholdAscending { thresholds } => {
                select_ascending(ledger, probabilities, thresholds, use_premier)
            }
            CapturePolicy::ThresholdDescending { ceilings_pct } => {
                select_descending(ledger, probabilities, ceilings_pct, use_premier)
            }
        }?;
        trace!(device = %chosen, "device selected");
        ledger.take_device(chosen).ok()
    }
}

fn select_ascending(
    ledger: &ResourceLedger,
    probabilities: &CaptureProbabilities,
    thresholds: &[f64; 3],
    use_premier: bool,
) -> Option<CaptureDevice> {
    for (device, threshold) in CaptureDevice::THRESHOLD_TIERS.iter().zip(thresholds) {
        if ledger.device_count(*device) > 0 && probabilities.for_device(*device) > *threshold {
            return Some(*device);
        }
    }
    ledger.best_available_device(use_premier)
}

fn select_descending(
    ledger: &ResourceLedger,
    probabilities: &CaptureProbabilities,
    ceilings_pct: &[f64; 3],
    use_premier: bool,
) -> Option<CaptureDevice> {
    // The priority ceiling: first tier whose estimate reaches its ceiling.
    let ceiling = CaptureDevice::THRESHOLD_TIERS
        .iter()
        .zip(ceilings_pct)
        .find(|(device, ceiling)| probabilities.for_device(**device) * 100.0 >= **ceiling)
        .map(|(device, _)| *device);

    let Some(ceiling) = ceiling else {
        // Nothing clears any ceiling: spend the strongest device we have.
        return ledger.best_available_device(use_premier);
    };

    // Weakest stocked tier at or below the ceiling, then upward.
    for device in CaptureDevice::THRESHOLD_TIERS {
        if device <= ceiling && ledger.device_count(device) > 0 {
            return Some(device);
        }
    }
    for device in CaptureDevice::THRESHOLD_TIERS {
        if device > ceiling && ledger.device_count(device) > 0 {
            return Some(device);
        }
    }
    if use_premier && ledger.device_count(CaptureDevice::Premier) > 0 {
        return Some(CaptureDevice::Premier);
    }
    None
}
