use geo_types::{Geometry, Point};
use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Builds coordinates from a GeoJSON style `[lng, lat]` pair.
    pub fn from_lng_lat([lng, lat]: [f64; 2]) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }

    /// Great-circle distance in kilometres.
    pub fn haversine_km(&self, other: &Coordinates) -> f64 {
        let phi1 = self.lat.to_radians();
        let phi2 = other.lat.to_radians();
        let d_phi = (other.lat - self.lat).to_radians();
        let d_lambda = (other.lng - self.lng).to_radians();

        let x = (d_phi / 2.0).sin().powi(2);
        let y = phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);

        2.0 * EARTH_RADIUS_KM * (x + y).sqrt().min(1.0).asin()
    }

    pub fn haversine_m(&self, other: &Coordinates) -> f64 {
        self.haversine_km(other) * 1000.0
    }
}

impl From<Coordinates> for Point<f64> {
    fn from(coordinates: Coordinates) -> Self {
        Point::new(coordinates.lng, coordinates.lat)
    }
}

impl From<Coordinates> for Geometry<f64> {
    fn from(coordinates: Coordinates) -> Self {
        Geometry::Point(coordinates.into())
    }
}

/// Sum of the haversine lengths of consecutive segments, in kilometres.
pub fn path_length_km(path: &[Coordinates]) -> f64 {
    path.windows(2).map(|w| w[0].haversine_km(&w[1])).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_point_is_zero() {
        let a = Coordinates::new(12.97, 77.59);
        assert_eq!(a.haversine_km(&a), 0.0);
    }

    #[test]
    fn antipodes_are_half_the_circumference() {
        let a = Coordinates::new(0.0, 0.0);
        let b = Coordinates::new(0.0, 180.0);
        let c = Coordinates::new(-45.123456789, -179.987654321);
        let d = Coordinates::new(45.123456789, 0.012345679);

        let half = std::f64::consts::PI * EARTH_RADIUS_KM;
        assert!((a.haversine_km(&b) - half).abs() < 1e-6);
        assert!(c.haversine_km(&d).is_finite());
        assert!(c.haversine_km(&d) <= half + 1e-9);
    }

    #[test]
    fn one_thousandth_degree_of_latitude() {
        let a = Coordinates::from_lng_lat([0.0, 0.0]);
        let b = Coordinates::from_lng_lat([0.0, 0.001]);

        assert!((a.haversine_km(&b) - 0.1112).abs() < 1e-3);
        assert!((a.haversine_m(&b) - 111.19).abs() < 0.1);
    }

    #[test]
    fn path_length_sums_segments() {
        let path = vec![
            Coordinates::from_lng_lat([0.0, 0.0]),
            Coordinates::from_lng_lat([0.0, 0.001]),
            Coordinates::from_lng_lat([0.0, 0.002]),
        ];

        assert!((path_length_km(&path) - 0.2224).abs() < 1e-3);
        assert_eq!(path_length_km(&path[..1]), 0.0);
        assert_eq!(path_length_km(&[]), 0.0);
    }

    #[test]
    fn point_is_lng_lat() {
        let point: Point<f64> = Coordinates::new(1.0, 2.0).into();
        assert_eq!(point.x(), 2.0);
        assert_eq!(point.y(), 1.0);
    }

    #[test]
    fn validity() {
        assert!(Coordinates::new(45.0, 120.0).is_valid());
        assert!(!Coordinates::new(91.0, 0.0).is_valid());
        assert!(!Coordinates::new(0.0, -181.0).is_valid());
    }
}
