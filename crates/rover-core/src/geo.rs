//! Positions, distances, and walking routes.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A geographic position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coord {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub alt: f64,
}

impl Coord {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng, alt: 0.0 }
    }

    /// Great-circle distance to `other`, in meters.
    pub fn distance_m(&self, other: &Coord) -> f64 {
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let dlat = (other.lat - self.lat).to_radians();
        let dlng = (other.lng - self.lng).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_M * c
    }
}

/// Intermediate positions from `from` to `to` in steps of `step_m` meters.
///
/// Interpolates linearly in latitude/longitude, which is accurate enough at
/// walking scales. The final element is always `to`; coincident points
/// produce an empty sequence.
pub fn step_increments(from: &Coord, to: &Coord, step_m: f64) -> Vec<Coord> {
    let total = from.distance_m(to);
    if total < 1e-6 {
        return Vec::new();
    }

    let mut points = Vec::new();
    if step_m > 0.0 {
        let mut walked = step_m;
        while walked < total {
            let t = walked / total;
            points.push(Coord {
                lat: from.lat + (to.lat - from.lat) * t,
                lng: from.lng + (to.lng - from.lng) * t,
                alt: from.alt + (to.alt - from.alt) * t,
            });
            walked += step_m;
        }
    }
    points.push(*to);
    points
}

/// Produces the intermediate leg endpoints for a walk.
///
/// Implementations may consult an external routing service; the core only
/// requires a finite, ordered sequence ending at the destination.
pub trait Router {
    fn route(&self, from: &Coord, to: &Coord, via: &[Coord]) -> Vec<Coord>;
}

/// Walks straight lines through the via points to the destination.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectRouter;

impl Router for DirectRouter {
    fn route(&self, _from: &Coord, to: &Coord, via: &[Coord]) -> Vec<Coord> {
        let mut legs = via.to_vec();
        legs.push(*to);
        legs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_zero_for_same_point() {
        let p = Coord::new(48.8584, 2.2945);
        assert!(p.distance_m(&p) < 1e-6);
    }

    #[test]
    fn test_distance_known_pair() {
        // Eiffel Tower to Arc de Triomphe, roughly 1.7 km.
        let a = Coord::new(48.8584, 2.2945);
        let b = Coord::new(48.8738, 2.2950);
        let d = a.distance_m(&b);
        assert!(d > 1_500.0 && d < 1_900.0, "got {d}");
    }

    #[test]
    fn test_step_increments_end_at_destination() {
        let from = Coord::new(48.8584, 2.2945);
        let to = Coord::new(48.8738, 2.2950);
        let steps = step_increments(&from, &to, 200.0);
        assert!(!steps.is_empty());
        let last = steps.last().unwrap();
        assert_eq!((last.lat, last.lng), (to.lat, to.lng));
        // ~1.7 km at 200 m per step
        assert!(steps.len() >= 8 && steps.len() <= 10, "got {}", steps.len());
    }

    #[test]
    fn test_step_increments_empty_when_coincident() {
        let p = Coord::new(10.0, 10.0);
        assert!(step_increments(&p, &p, 200.0).is_empty());
    }

    #[test]
    fn test_direct_router_appends_destination() {
        let from = Coord::new(0.0, 0.0);
        let to = Coord::new(1.0, 1.0);
        let via = [Coord::new(0.5, 0.5)];
        let legs = DirectRouter.route(&from, &to, &via);
        assert_eq!(legs.len(), 2);
        assert_eq!(legs[1].lat, 1.0);
    }
}
