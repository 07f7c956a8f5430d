//! The bot's configuration surface.
//!
//! Consumed, not owned: loading from files and argument merging live with
//! the caller. Every field has a default so partial configs stay valid.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::creature::{EvolutionTable, SpeciesId};
use crate::inventory::policy::CapturePolicy;
use crate::inventory::ConsumableKind;

/// Everything tunable about a bot run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Device-selection policy for capture throws.
    pub policy: CapturePolicy,

    /// Allow Premier devices to be spent at all.
    pub use_premier: bool,

    /// Keep/evolve/release thresholds.
    pub triage: TriageConfig,

    /// Species-to-evolution-rule table.
    pub evolutions: EvolutionTable,

    /// Consumable keep-counts; stacks above these get recycled. Kinds not
    /// listed are never recycled.
    pub recycle_keep: HashMap<ConsumableKind, u32>,

    /// Distance of one movement step, in meters.
    pub step_size_m: f64,

    /// How long a spun landmark stays in the visited set, in seconds.
    pub visited_expiry_secs: u64,

    /// Maximum throws per encounter.
    pub throw_retry_limit: u32,

    /// Consecutive capture failures before a soft-ban warning.
    pub failure_warn_limit: u32,

    /// Every Nth heartbeat forces a full inventory refresh.
    pub inventory_refresh_period: u64,

    /// Keep the walk within this radius of the starting position.
    pub stay_within_radius_m: Option<f64>,

    /// Chain through up to 20 nearby landmarks instead of nearest-first.
    pub visit_all_landmarks: bool,

    /// Stop after this many cycles; `None` runs until the session dies.
    pub max_cycles: Option<u64>,

    /// Delays between actions.
    pub pacing: PacingConfig,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            policy: CapturePolicy::default(),
            use_premier: false,
            triage: TriageConfig::default(),
            evolutions: EvolutionTable::default(),
            recycle_keep: default_recycle_keep(),
            step_size_m: DEFAULT_STEP_SIZE_M,
            visited_expiry_secs: DEFAULT_VISITED_EXPIRY_SECS,
            throw_retry_limit: DEFAULT_THROW_RETRY_LIMIT,
            failure_warn_limit: DEFAULT_FAILURE_WARN_LIMIT,
            inventory_refresh_period: DEFAULT_INVENTORY_REFRESH_PERIOD,
            stay_within_radius_m: None,
            visit_all_landmarks: false,
            max_cycles: None,
            pacing: PacingConfig::default(),
        }
    }
}

/// Default consumable keep-counts: healing items are mostly discarded,
/// top-tier ones and a few baits are held back.
fn default_recycle_keep() -> HashMap<ConsumableKind, u32> {
    HashMap::from([
        (ConsumableKind::Tonic, 0),
        (ConsumableKind::SuperTonic, 0),
        (ConsumableKind::HyperTonic, 0),
        (ConsumableKind::MaxTonic, 50),
        (ConsumableKind::Revive, 15),
        (ConsumableKind::MaxRevive, 20),
        (ConsumableKind::Bait, 5),
        (ConsumableKind::SweetBait, 0),
        (ConsumableKind::SourBait, 0),
    ])
}

/// Keep/evolve/release thresholds for creature triage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageConfig {
    /// Strongest members of each species kept unconditionally.
    pub min_keep_per_species: usize,

    /// Genetic-quality floor, 0-100. Releasing requires failing this floor
    /// and the power floor together.
    pub quality_floor: f64,

    /// Combat-power floor.
    pub power_floor: u32,

    /// Species never released or evolved.
    pub keep_species: HashSet<SpeciesId>,

    /// Species always offered for release; favorites stay protected.
    pub always_release_species: HashSet<SpeciesId>,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            min_keep_per_species: 1,
            quality_floor: 0.0,
            power_floor: 0,
            keep_species: HashSet::new(),
            always_release_species: HashSet::new(),
        }
    }
}

/// Delays between consecutive game actions, in milliseconds.
///
/// All zeroes disables pacing, which tests rely on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    pub cycle_pause_ms: u64,
    pub step_pause_ms: u64,
    pub action_pause_ms: u64,
    pub encounter_gap_min_ms: u64,
    pub encounter_gap_max_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            cycle_pause_ms: 1_000,
            step_pause_ms: 1_000,
            action_pause_ms: 2_000,
            encounter_gap_min_ms: 4_000,
            encounter_gap_max_ms: 8_000,
        }
    }
}

impl PacingConfig {
    /// No delays at all; for tests and simulations.
    pub fn zero() -> Self {
        Self {
            cycle_pause_ms: 0,
            step_pause_ms: 0,
            action_pause_ms: 0,
            encounter_gap_min_ms: 0,
            encounter_gap_max_ms: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_knobs() {
        let config = BotConfig::default();
        assert_eq!(config.step_size_m, 200.0);
        assert_eq!(config.visited_expiry_secs, 600);
        assert_eq!(config.throw_retry_limit, 5);
        assert_eq!(config.failure_warn_limit, 10);
        assert_eq!(config.inventory_refresh_period, 10);
        assert_eq!(config.triage.min_keep_per_species, 1);
        assert!(!config.use_premier);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: BotConfig = serde_json::from_str(
            r#"{
                "step_size_m": 150.0,
                "policy": { "mode": "threshold_descending", "ceilings_pct": [35.0, 45.0, 55.0] },
                "triage": { "quality_floor": 80.0, "power_floor": 400 }
            }"#,
        )
        .unwrap();
        assert_eq!(config.step_size_m, 150.0);
        assert_eq!(config.triage.quality_floor, 80.0);
        assert_eq!(config.triage.min_keep_per_species, 1);
        assert_eq!(config.throw_retry_limit, 5);
        assert!(matches!(
            config.policy,
            CapturePolicy::ThresholdDescending { .. }
        ));
    }

    #[test]
    fn test_config_round_trip() {
        let mut config = BotConfig::default();
        config.triage.keep_species.insert(SpeciesId(25));
        config.max_cycles = Some(3);
        let json = serde_json::to_string(&config).unwrap();
        let back: BotConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
