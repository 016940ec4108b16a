use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{path_length_km, Coordinates};

/// Used to estimate a duration when the directions service gave none.
pub const AVERAGE_CYCLING_SPEED_KMH: f64 = 15.0;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Route {
    pub token: Uuid,
    pub origin: Coordinates,
    pub destination: Coordinates,
    pub path: Vec<Coordinates>,
    /// kilometres
    pub distance: f64,
    /// minutes
    pub duration: f64,
}

impl Route {
    pub fn new(
        origin: Coordinates,
        destination: Coordinates,
        path: Vec<Coordinates>,
        distance: f64,
        duration: f64,
    ) -> Self {
        Self {
            token: Uuid::new_v4(),
            origin,
            destination,
            path,
            distance,
            duration,
        }
    }

    pub fn from_path(origin: Coordinates, destination: Coordinates, path: Vec<Coordinates>) -> Self {
        let distance = path_length_km(&path);
        let duration = distance / AVERAGE_CYCLING_SPEED_KMH * 60.0;

        Self::new(origin, destination, path, distance, duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_path_measures_the_polyline() {
        let path = vec![
            Coordinates::from_lng_lat([0.0, 0.0]),
            Coordinates::from_lng_lat([0.0, 0.001]),
            Coordinates::from_lng_lat([0.0, 0.002]),
        ];
        let route = Route::from_path(path[0], path[2], path.clone());

        assert!((route.distance - 0.2224).abs() < 1e-3);
        assert!((route.duration - route.distance * 4.0).abs() < 1e-9);
        assert_eq!(route.path.len(), 3);
    }
}
