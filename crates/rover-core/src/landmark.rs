//! Landmarks and the visited-landmark memory.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::consts::VISITED_LANDMARK_CAP;
use crate::creature::SpeciesId;
use crate::geo::Coord;

/// A point of interest on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub id: String,
    pub position: Coord,
    /// Active lure, when a module is attached.
    pub lure: Option<LureInfo>,
}

/// Time-limited lure data referencing the creature waiting at a landmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LureInfo {
    pub encounter_id: u64,
    pub active_species: SpeciesId,
}

/// Recently visited landmarks, keyed by id.
///
/// Entries expire after the configured window and the set is capped, so
/// memory stays bounded and skipped landmarks become eligible again once
/// the window elapses. Expiry is evaluated against a caller-supplied
/// instant so the clock stays testable.
#[derive(Debug)]
pub struct VisitedLandmarks {
    window: Duration,
    cap: usize,
    entries: HashMap<String, Instant>,
}

impl VisitedLandmarks {
    pub fn new(window: Duration) -> Self {
        Self::with_cap(window, VISITED_LANDMARK_CAP)
    }

    pub fn with_cap(window: Duration, cap: usize) -> Self {
        Self {
            window,
            cap,
            entries: HashMap::new(),
        }
    }

    /// Record a visit at `now`.
    pub fn insert(&mut self, id: &str, now: Instant) {
        self.prune(now);
        if self.entries.len() >= self.cap && !self.entries.contains_key(id) {
            // Still at capacity after pruning: forget the oldest visit.
            if let Some(oldest) = self
                .entries
                .iter()
                .min_by_key(|(_, at)| **at)
                .map(|(id, _)| id.clone())
            {
                self.entries.remove(&oldest);
            }
        }
        self.entries.insert(id.to_string(), now);
    }

    /// Whether `id` was visited within the window, as of `now`.
    pub fn contains(&self, id: &str, now: Instant) -> bool {
        self.entries
            .get(id)
            .is_some_and(|at| now.saturating_duration_since(*at) < self.window)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn prune(&mut self, now: Instant) {
        let window = self.window;
        self.entries
            .retain(|_, at| now.saturating_duration_since(*at) < window);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_expires_after_window() {
        let mut visited = VisitedLandmarks::new(Duration::from_secs(600));
        let t0 = Instant::now();
        visited.insert("fort-1", t0);

        assert!(visited.contains("fort-1", t0));
        assert!(visited.contains("fort-1", t0 + Duration::from_secs(599)));
        assert!(!visited.contains("fort-1", t0 + Duration::from_secs(601)));
        assert!(!visited.contains("fort-2", t0));
    }

    #[test]
    fn test_insert_prunes_expired_entries() {
        let mut visited = VisitedLandmarks::new(Duration::from_secs(600));
        let t0 = Instant::now();
        visited.insert("fort-1", t0);
        visited.insert("fort-2", t0 + Duration::from_secs(700));
        assert_eq!(visited.len(), 1);
    }

    #[test]
    fn test_cap_evicts_oldest() {
        let mut visited = VisitedLandmarks::with_cap(Duration::from_secs(600), 2);
        let t0 = Instant::now();
        visited.insert("a", t0);
        visited.insert("b", t0 + Duration::from_secs(1));
        visited.insert("c", t0 + Duration::from_secs(2));

        assert_eq!(visited.len(), 2);
        assert!(!visited.contains("a", t0 + Duration::from_secs(2)));
        assert!(visited.contains("b", t0 + Duration::from_secs(2)));
        assert!(visited.contains("c", t0 + Duration::from_secs(2)));
    }
}
